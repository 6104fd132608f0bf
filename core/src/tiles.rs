//! Tile ids, cell flags and the per-tile lookup tables.
//!
//! A cell packs a tile id (low 10 bits) with flag bits. The tables in
//! this module are the only place that knows which id means what; the
//! rest of the engine asks through the predicates below.

use crate::types::Cell;

// ── Flags ──────────────────────────────────────────────────────────

pub const PWRBIT: Cell = 0x8000;
pub const CONDBIT: Cell = 0x4000;
pub const BURNBIT: Cell = 0x2000;
pub const BULLBIT: Cell = 0x1000;
pub const ANIMBIT: Cell = 0x0800;
pub const ZONEBIT: Cell = 0x0400;
pub const ALLBITS: Cell = 0xfc00;
pub const LOMASK: Cell = 0x03ff;

// ── Terrain ────────────────────────────────────────────────────────

pub const DIRT: u16 = 0;
pub const RIVER: u16 = 2;
pub const REDGE: u16 = 3;
pub const CHANNEL: u16 = 4;
pub const FIRSTRIVEDGE: u16 = 5;
pub const LASTRIVEDGE: u16 = 20;
pub const TREEBASE: u16 = 21;
pub const WOODS: u16 = 37;
pub const WOODS5: u16 = 43;
pub const RUBBLE: u16 = 44;
pub const LASTRUBBLE: u16 = 47;
pub const FLOOD: u16 = 48;
pub const LASTFLOOD: u16 = 51;
pub const RADTILE: u16 = 52;
pub const FIRE: u16 = 56;
pub const LASTFIRE: u16 = 63;

// ── Transport ──────────────────────────────────────────────────────

pub const ROADBASE: u16 = 64;
pub const HBRIDGE: u16 = 64;
pub const VBRIDGE: u16 = 65;
pub const ROADS: u16 = 66;
pub const ROADS2: u16 = 67;
pub const INTERSECTION: u16 = 76;
pub const HROADPOWER: u16 = 77;
pub const VROADPOWER: u16 = 78;
pub const LTRFBASE: u16 = 80;
pub const HTRFBASE: u16 = 144;
pub const LASTROAD: u16 = 206;
pub const POWERBASE: u16 = 208;
pub const HPOWER: u16 = 208;
pub const VPOWER: u16 = 209;
pub const LHPOWER: u16 = 210;
pub const LVPOWER: u16 = 211;
pub const RAILHPOWERV: u16 = 221;
pub const RAILVPOWERH: u16 = 222;
pub const LASTPOWER: u16 = 222;
pub const RAILBASE: u16 = 224;
pub const HRAIL: u16 = 224;
pub const VRAIL: u16 = 225;
pub const LHRAIL: u16 = 226;
pub const LVRAIL: u16 = 227;
pub const HRAILROAD: u16 = 237;
pub const VRAILROAD: u16 = 238;
pub const LASTRAIL: u16 = 238;

// ── Zones ──────────────────────────────────────────────────────────

pub const RESBASE: u16 = 240;
pub const FREEZ: u16 = 244;
pub const HOUSE: u16 = 249;
pub const LHTHR: u16 = 249;
pub const HHTHR: u16 = 260;
pub const RZB: u16 = 265;
pub const HOSPITALBASE: u16 = 405;
pub const HOSPITAL: u16 = 409;
pub const CHURCHBASE: u16 = 414;
pub const CHURCH: u16 = 418;
pub const COMBASE: u16 = 423;
pub const COMCLR: u16 = 427;
pub const CZB: u16 = 436;
pub const INDBASE: u16 = 612;
pub const INDCLR: u16 = 616;
pub const LASTIND: u16 = 620;
pub const IZB: u16 = 625;
pub const PORTBASE: u16 = 693;
pub const PORT: u16 = 698;
pub const LASTPORT: u16 = 708;
pub const AIRPORTBASE: u16 = 709;
pub const RADAR: u16 = 711;
pub const AIRPORT: u16 = 716;
pub const COALBASE: u16 = 745;
pub const POWERPLANT: u16 = 750;
pub const LASTPOWERPLANT: u16 = 760;
pub const FIRESTBASE: u16 = 761;
pub const FIRESTATION: u16 = 765;
pub const POLICESTBASE: u16 = 770;
pub const POLICESTATION: u16 = 774;
pub const STADIUMBASE: u16 = 779;
pub const STADIUM: u16 = 784;
pub const FULLSTADIUMBASE: u16 = 795;
pub const FULLSTADIUM: u16 = 800;
pub const NUCLEARBASE: u16 = 811;
pub const NUCLEAR: u16 = 816;
pub const LASTZONE: u16 = 826;

// ── Animation variants ─────────────────────────────────────────────

pub const RADAR_ANIM: u16 = 832;
pub const COALSMOKE1: u16 = 836;
pub const COALSMOKE2: u16 = 837;
pub const NUKESWIRL: u16 = 840;
pub const FOOTBALLGAME1: u16 = 844;
pub const FOOTBALLGAME2: u16 = 845;
pub const TINYEXP: u16 = 860;
pub const LASTTINYEXP: u16 = 867;
pub const TILE_COUNT: u16 = 868;

/// Number of land-value tiers encoded in zone ids.
pub const LAND_VALUE_TIERS: u16 = 4;

/// Static member / animated variant pairs swapped on power transitions.
const POWER_VARIANTS: &[(u16, u16)] = &[
    (RADAR, RADAR_ANIM),
    (COALBASE + 2, COALSMOKE1),
    (COALBASE + 3, COALSMOKE2),
    (NUCLEARBASE + 6, NUKESWIRL),
];

// ── Cell helpers ───────────────────────────────────────────────────

#[inline]
pub fn tile_of(cell: Cell) -> u16 {
    cell & LOMASK
}

/// A tile id combined with the flags it carries when freshly placed.
pub fn cell(tile: u16) -> Cell {
    let tile = tile & LOMASK;
    tile | default_flags(tile)
}

/// Default flag set for a tile id.
pub fn default_flags(tile: u16) -> Cell {
    match tile {
        DIRT..=CHANNEL => 0,
        FIRSTRIVEDGE..=LASTRIVEDGE => BULLBIT,
        TREEBASE..=WOODS5 => BURNBIT | BULLBIT,
        RUBBLE..=LASTRUBBLE => BULLBIT,
        FLOOD..=LASTFLOOD => ANIMBIT,
        RADTILE..=55 => 0,
        FIRE..=LASTFIRE => ANIMBIT,
        HBRIDGE | VBRIDGE => BULLBIT,
        ROADBASE..=LASTROAD => {
            let variant = (tile - ROADBASE) & 15;
            let powered_road = variant == HROADPOWER - ROADBASE || variant == VROADPOWER - ROADBASE;
            let anim = if tile >= LTRFBASE { ANIMBIT } else { 0 };
            BULLBIT | BURNBIT | anim | if powered_road { CONDBIT } else { 0 }
        }
        207 => 0,
        POWERBASE..=LASTPOWER => CONDBIT | BURNBIT | BULLBIT,
        223 => 0,
        RAILBASE..=LASTRAIL => BURNBIT | BULLBIT,
        239 => 0,
        RESBASE..=LASTZONE => {
            let base = CONDBIT | BURNBIT | BULLBIT;
            if is_zone_center_id(tile) {
                base | ZONEBIT
            } else {
                base
            }
        }
        RADAR_ANIM | COALSMOKE1 | COALSMOKE2 | NUKESWIRL | FOOTBALLGAME1 | FOOTBALLGAME2 => {
            CONDBIT | BURNBIT | ANIMBIT
        }
        TINYEXP..=LASTTINYEXP => ANIMBIT | BULLBIT,
        _ => 0,
    }
}

/// Zone-center ids carry behavior.
pub fn is_zone_center_id(tile: u16) -> bool {
    match tile {
        FREEZ | HOSPITAL | CHURCH | COMCLR | INDCLR | PORT | AIRPORT | POWERPLANT
        | FIRESTATION | POLICESTATION | STADIUM | FULLSTADIUM | NUCLEAR => true,
        t if (RZB..RZB + 16 * 9).contains(&t) => (t - RZB) % 9 == 0,
        t if (CZB..CZB + 20 * 9).contains(&t) => (t - CZB) % 9 == 0,
        t if (IZB..IZB + 8 * 9).contains(&t) => (t - IZB) % 9 == 0,
        _ => false,
    }
}

// ── Predicates on raw cells ────────────────────────────────────────

pub fn is_zone_center(cell: Cell) -> bool {
    cell & ZONEBIT != 0
}

pub fn is_conductive(cell: Cell) -> bool {
    cell & CONDBIT != 0
}

pub fn is_combustible(cell: Cell) -> bool {
    cell & BURNBIT != 0
}

pub fn is_bulldozable(cell: Cell) -> bool {
    cell & BULLBIT != 0
}

pub fn is_animated(cell: Cell) -> bool {
    cell & ANIMBIT != 0
}

// ── Predicates on tile ids ─────────────────────────────────────────

/// Rubble, flood, radioactivity or fire: nothing is rebuilt over these.
pub fn is_indestructible(tile: u16) -> bool {
    (RUBBLE..ROADBASE).contains(&tile)
}

/// Flood, radioactivity or fire: blocks zone placement.
pub fn blocks_zone_plop(tile: u16) -> bool {
    (FLOOD..ROADBASE).contains(&tile)
}

/// Tiles a vehicle may drive on (roads and rails, not plain power lines).
pub fn is_drivable(tile: u16) -> bool {
    if !(ROADBASE..=LASTRAIL).contains(&tile) {
        return false;
    }
    !(POWERBASE..LASTPOWER).contains(&tile)
}

pub fn is_road(tile: u16) -> bool {
    (ROADBASE..=LASTROAD).contains(&tile)
}

pub fn is_rail(tile: u16) -> bool {
    (RAILBASE..=LASTRAIL).contains(&tile) || tile == RAILHPOWERV || tile == RAILVPOWERH
}

pub fn is_bridge(tile: u16) -> bool {
    tile == HBRIDGE || tile == VBRIDGE
}

pub fn is_river_edge(tile: u16) -> bool {
    (FIRSTRIVEDGE..=LASTRIVEDGE).contains(&tile)
}

pub fn is_water(tile: u16) -> bool {
    (RIVER..=LASTRIVEDGE).contains(&tile)
}

pub fn is_tree(tile: u16) -> bool {
    (TREEBASE..=WOODS5).contains(&tile)
}

pub fn is_fire(tile: u16) -> bool {
    (FIRE..=LASTFIRE).contains(&tile)
}

pub fn is_flood(tile: u16) -> bool {
    (FLOOD..=LASTFLOOD).contains(&tile)
}

pub fn is_rubble(tile: u16) -> bool {
    (RUBBLE..=LASTRUBBLE).contains(&tile)
}

/// Anything built by the city (roads and up).
pub fn is_constructed(tile: u16) -> bool {
    tile >= ROADBASE
}

/// Single houses of an empty residential lot.
pub fn is_house(tile: u16) -> bool {
    (LHTHR..=HHTHR).contains(&tile)
}

/// Bare member tiles of an empty residential lot.
pub fn is_residential_clear(tile: u16) -> bool {
    (RESBASE..=RESBASE + 8).contains(&tile)
}

/// A non-center zone member that an earthquake may knock down.
pub fn is_vulnerable(cell: Cell) -> bool {
    let tile = tile_of(cell);
    (RESBASE..=LASTZONE).contains(&tile) && !is_zone_center(cell)
}

/// What arson may set on fire.
pub fn is_arsonable(cell: Cell) -> bool {
    let tile = tile_of(cell);
    !is_zone_center(cell) && (LHTHR..=LASTZONE).contains(&tile)
}

/// Pollution emitted by one tile.
pub fn pollution_value(tile: u16) -> i32 {
    if tile < POWERBASE {
        if tile >= HTRFBASE {
            return 75;
        }
        if tile >= LTRFBASE {
            return 50;
        }
        if tile < ROADBASE {
            if tile >= FIRE {
                return 90;
            }
            if tile >= RADTILE {
                return 255;
            }
        }
        return 0;
    }
    if tile <= LASTIND {
        return 0;
    }
    if tile < PORTBASE {
        return 50;
    }
    if tile <= LASTPOWERPLANT {
        return 100;
    }
    0
}

/// Side length of the footprint centered on a zone-center tile.
pub fn zone_size(center: u16) -> i32 {
    match center {
        AIRPORT => 6,
        PORT | POWERPLANT | STADIUM | FULLSTADIUM | NUCLEAR => 4,
        _ => 3,
    }
}

/// Id of the top-left member of the footprint centered on `center`.
pub fn zone_base(center: u16) -> u16 {
    let size = zone_size(center) as u16;
    center - (size + 1)
}

/// Animated variant of a static member, used when the zone gains power.
pub fn on_power(tile: u16) -> Option<u16> {
    POWER_VARIANTS
        .iter()
        .find(|(still, _)| *still == tile)
        .map(|(_, anim)| *anim)
}

/// Static member for an animated variant, used when the zone loses power.
pub fn on_shutdown(tile: u16) -> Option<u16> {
    POWER_VARIANTS
        .iter()
        .find(|(_, anim)| *anim == tile)
        .map(|(still, _)| *still)
}

/// Zone-center tiles drive a closed set of behaviors; every other tile
/// with a behavior is handled by the terrain scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileBehavior {
    Fire,
    Flood,
    Radioactive,
    Road,
    Rail,
    Explosion,
    Residential,
    HospitalChurch,
    Commercial,
    Industrial,
    CoalPower,
    NuclearPower,
    FireStation,
    PoliceStation,
    StadiumEmpty,
    StadiumFull,
    Airport,
    Seaport,
}

impl TileBehavior {
    /// Behavior for a raw cell, or `None` when the tile is inert.
    pub fn of(cell: Cell) -> Option<Self> {
        let tile = tile_of(cell);
        if is_zone_center(cell) {
            return Self::of_zone_center(tile);
        }
        match tile {
            FIRE..=LASTFIRE => Some(Self::Fire),
            FLOOD..=LASTFLOOD => Some(Self::Flood),
            RADTILE => Some(Self::Radioactive),
            ROADBASE..=LASTROAD => Some(Self::Road),
            RAILHPOWERV | RAILVPOWERH => Some(Self::Rail),
            RAILBASE..=LASTRAIL => Some(Self::Rail),
            TINYEXP..=LASTTINYEXP => Some(Self::Explosion),
            _ => None,
        }
    }

    fn of_zone_center(tile: u16) -> Option<Self> {
        match tile {
            HOSPITAL | CHURCH => Some(Self::HospitalChurch),
            FREEZ => Some(Self::Residential),
            t if (RZB..HOSPITALBASE).contains(&t) => Some(Self::Residential),
            COMCLR => Some(Self::Commercial),
            t if (CZB..INDBASE).contains(&t) => Some(Self::Commercial),
            INDCLR => Some(Self::Industrial),
            t if (IZB..PORTBASE).contains(&t) => Some(Self::Industrial),
            PORT => Some(Self::Seaport),
            AIRPORT => Some(Self::Airport),
            POWERPLANT => Some(Self::CoalPower),
            FIRESTATION => Some(Self::FireStation),
            POLICESTATION => Some(Self::PoliceStation),
            STADIUM => Some(Self::StadiumEmpty),
            FULLSTADIUM => Some(Self::StadiumFull),
            NUCLEAR => Some(Self::NuclearPower),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zone_center_sits_at_offset_one_one() {
        for center in [FREEZ, HOSPITAL, CHURCH, COMCLR, INDCLR, FIRESTATION, POLICESTATION] {
            assert_eq!(zone_base(center) + 4, center);
        }
        for center in [PORT, POWERPLANT, STADIUM, FULLSTADIUM, NUCLEAR] {
            assert_eq!(zone_base(center) + 5, center);
        }
        assert_eq!(zone_base(AIRPORT), AIRPORTBASE);
    }

    #[test]
    fn density_zone_centers_have_behaviors() {
        for k in 0..16 {
            let c = cell(RZB + k * 9);
            assert!(is_zone_center(c));
            assert_eq!(TileBehavior::of(c), Some(TileBehavior::Residential));
        }
        for k in 0..20 {
            assert_eq!(TileBehavior::of(cell(CZB + k * 9)), Some(TileBehavior::Commercial));
        }
        for k in 0..8 {
            assert_eq!(TileBehavior::of(cell(IZB + k * 9)), Some(TileBehavior::Industrial));
        }
        assert!(!is_zone_center(cell(HOUSE)));
    }

    #[test]
    fn power_lines_are_not_drivable_but_rail_crossing_is() {
        assert!(is_drivable(ROADS));
        assert!(is_drivable(HRAIL));
        assert!(!is_drivable(HPOWER));
        assert!(!is_drivable(RAILHPOWERV));
        assert!(is_drivable(RAILVPOWERH));
        assert!(is_conductive(cell(HROADPOWER)));
        assert!(!is_conductive(cell(ROADS)));
    }

    #[test]
    fn pollution_table_matches_tile_classes() {
        assert_eq!(pollution_value(DIRT), 0);
        assert_eq!(pollution_value(FIRE + 2), 90);
        assert_eq!(pollution_value(RADTILE), 255);
        assert_eq!(pollution_value(HTRFBASE + 1), 75);
        assert_eq!(pollution_value(LTRFBASE + 1), 50);
        assert_eq!(pollution_value(IZB), 50);
        assert_eq!(pollution_value(POWERPLANT), 100);
        assert_eq!(pollution_value(NUCLEAR), 0);
    }
}
