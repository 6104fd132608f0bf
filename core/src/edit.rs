//! Editing primitives: zones, roads, rails, power lines, bulldozing and
//! terrain fill.
//!
//! RULE: Every edit validates bounds and funds before it touches the
//! grid. A refused edit leaves the world unchanged.
//!
//! RULE: After a transport tile changes, the tile and its four
//! neighbours are re-connected so lines pick the right bend, tee or
//! crossing variant.

use crate::{
    error::{SimError, SimResult},
    tiles::{
        self, AIRPORT, CHANNEL, COMCLR, DIRT, FIRESTATION, FREEZ, HBRIDGE, HPOWER, HRAIL,
        HRAILROAD, HROADPOWER, INDCLR, LHPOWER, LHRAIL, LVPOWER, LVRAIL, NUCLEAR,
        POLICESTATION, PORT, POWERPLANT, RAILHPOWERV, RAILVPOWERH, RIVER, ROADBASE, ROADS,
        ROADS2, RUBBLE, STADIUM, VBRIDGE, VPOWER, VRAIL, VRAILROAD, VROADPOWER,
    },
    types::{Direction, Position},
    world::WorldState,
    zone::{footprint, zone_plop},
};
use serde::{Deserialize, Serialize};

const ROAD_COST: i64 = 10;
const BRIDGE_COST: i64 = 50;
const RAIL_COST: i64 = 20;
const TUNNEL_COST: i64 = 100;
const WIRE_COST: i64 = 5;
const UNDERWATER_WIRE_COST: i64 = 25;
const BULLDOZE_COST: i64 = 1;

/// Line variant offset per neighbour mask (N=1, E=2, S=4, W=8), shared
/// by roads, rails and power lines.
const CONNECT_OFFSETS: [u16; 16] = [0, 1, 0, 2, 1, 1, 3, 7, 0, 5, 0, 6, 4, 9, 8, 10];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneKind {
    Residential,
    Commercial,
    Industrial,
    FireStation,
    PoliceStation,
    Stadium,
    Seaport,
    CoalPlant,
    NuclearPlant,
    Airport,
}

impl ZoneKind {
    pub fn center(self) -> u16 {
        match self {
            Self::Residential   => FREEZ,
            Self::Commercial    => COMCLR,
            Self::Industrial    => INDCLR,
            Self::FireStation   => FIRESTATION,
            Self::PoliceStation => POLICESTATION,
            Self::Stadium       => STADIUM,
            Self::Seaport       => PORT,
            Self::CoalPlant     => POWERPLANT,
            Self::NuclearPlant  => NUCLEAR,
            Self::Airport       => AIRPORT,
        }
    }

    pub fn cost(self) -> i64 {
        match self {
            Self::Residential | Self::Commercial | Self::Industrial => 100,
            Self::FireStation | Self::PoliceStation => 500,
            Self::Stadium => 5_000,
            Self::Seaport | Self::CoalPlant => 3_000,
            Self::NuclearPlant => 5_000,
            Self::Airport => 10_000,
        }
    }
}

fn check_bounds(world: &WorldState, pos: Position) -> SimResult<()> {
    if world.test_bounds(pos.x, pos.y) {
        Ok(())
    } else {
        Err(SimError::OutOfBounds { x: pos.x, y: pos.y })
    }
}

fn refuse(reason: impl Into<String>) -> SimError {
    SimError::InvalidCommand { reason: reason.into() }
}

fn charge(world: &mut WorldState, cost: i64) -> SimResult<()> {
    if world.budget.funds < cost {
        return Err(refuse(format!(
            "insufficient funds: need {cost}, have {}",
            world.budget.funds
        )));
    }
    world.spend(cost);
    Ok(())
}

/// Ground a new structure may be built on without bulldozing first.
fn is_clear(tile: u16) -> bool {
    tile == DIRT || tiles::is_tree(tile) || tiles::is_rubble(tile)
}

fn is_open_water(tile: u16) -> bool {
    (RIVER..=CHANNEL).contains(&tile)
}

// ── Zones ──────────────────────────────────────────────────────────

/// Build a zone whose center lands on `pos`. Every footprint tile must
/// be inside the map and clear.
pub fn place_zone(world: &mut WorldState, pos: Position, kind: ZoneKind) -> SimResult<()> {
    let center = kind.center();
    for (_, p) in footprint(pos, center) {
        check_bounds(world, p)?;
        if !is_clear(world.get_tile(p.x, p.y)) {
            return Err(refuse(format!("{kind:?} footprint at ({}, {}) is not clear", p.x, p.y)));
        }
    }
    charge(world, kind.cost())?;
    if !zone_plop(world, pos, center) {
        return Err(refuse(format!("{kind:?} cannot be placed at ({}, {})", pos.x, pos.y)));
    }
    Ok(())
}

// ── Transport lines ────────────────────────────────────────────────

pub fn lay_road(world: &mut WorldState, pos: Position) -> SimResult<()> {
    check_bounds(world, pos)?;
    let tile = world.get_tile(pos.x, pos.y);
    let (placed, cost) = match tile {
        t if is_clear(t) => (ROADS, ROAD_COST),
        t if is_open_water(t) => {
            let horizontal = [Direction::East, Direction::West]
                .iter()
                .any(|&d| connects_road(world, pos.step(d)));
            (if horizontal { HBRIDGE } else { VBRIDGE }, BRIDGE_COST)
        }
        LHPOWER => (VROADPOWER, ROAD_COST),
        LVPOWER => (HROADPOWER, ROAD_COST),
        LHRAIL => (HRAILROAD, ROAD_COST),
        LVRAIL => (VRAILROAD, ROAD_COST),
        t if tiles::is_road(t) => return Ok(()),
        t => return Err(refuse(format!("cannot lay road over tile {t}"))),
    };
    charge(world, cost)?;
    world.place(pos.x, pos.y, placed);
    reconnect_around(world, pos);
    Ok(())
}

pub fn lay_rail(world: &mut WorldState, pos: Position) -> SimResult<()> {
    check_bounds(world, pos)?;
    let tile = world.get_tile(pos.x, pos.y);
    let (placed, cost) = match tile {
        t if is_clear(t) => (LHRAIL, RAIL_COST),
        t if is_open_water(t) => (HRAIL, TUNNEL_COST),
        LHPOWER => (RAILVPOWERH, RAIL_COST),
        LVPOWER => (RAILHPOWERV, RAIL_COST),
        ROADS => (VRAILROAD, RAIL_COST),
        ROADS2 => (HRAILROAD, RAIL_COST),
        t if is_plain_rail(t) => return Ok(()),
        t => return Err(refuse(format!("cannot lay rail over tile {t}"))),
    };
    charge(world, cost)?;
    world.place(pos.x, pos.y, placed);
    reconnect_around(world, pos);
    Ok(())
}

pub fn lay_wire(world: &mut WorldState, pos: Position) -> SimResult<()> {
    check_bounds(world, pos)?;
    let tile = world.get_tile(pos.x, pos.y);
    let (placed, cost) = match tile {
        t if is_clear(t) => (LHPOWER, WIRE_COST),
        t if is_open_water(t) => (HPOWER, UNDERWATER_WIRE_COST),
        ROADS => (HROADPOWER, WIRE_COST),
        ROADS2 => (VROADPOWER, WIRE_COST),
        LHRAIL => (RAILHPOWERV, WIRE_COST),
        LVRAIL => (RAILVPOWERH, WIRE_COST),
        t if is_plain_wire(t) => return Ok(()),
        t => return Err(refuse(format!("cannot lay power line over tile {t}"))),
    };
    charge(world, cost)?;
    world.place(pos.x, pos.y, placed);
    reconnect_around(world, pos);
    Ok(())
}

/// Lay a line horizontally from `from` to `to.x`, then vertically to
/// `to.y`. Stops at the first refused tile.
pub fn lay_line(
    world: &mut WorldState,
    from: Position,
    to: Position,
    lay: fn(&mut WorldState, Position) -> SimResult<()>,
) -> SimResult<()> {
    let step_x = (to.x - from.x).signum();
    let mut x = from.x;
    loop {
        lay(world, Position::new(x, from.y))?;
        if x == to.x {
            break;
        }
        x += step_x;
    }
    let step_y = (to.y - from.y).signum();
    let mut y = from.y;
    while y != to.y {
        y += step_y;
        lay(world, Position::new(to.x, y))?;
    }
    Ok(())
}

// ── Connection fix-up ──────────────────────────────────────────────

fn is_plain_road(tile: u16) -> bool {
    tiles::is_road(tile) && (2..=12).contains(&((tile - ROADBASE) & 15))
}

fn is_plain_rail(tile: u16) -> bool {
    (LHRAIL..=LHRAIL + 10).contains(&tile)
}

fn is_plain_wire(tile: u16) -> bool {
    (LHPOWER..=LHPOWER + 10).contains(&tile)
}

fn connects_road(world: &WorldState, p: Position) -> bool {
    world.test_bounds(p.x, p.y) && {
        let t = world.get_tile(p.x, p.y);
        tiles::is_road(t) || t == HRAILROAD || t == VRAILROAD
    }
}

fn connects_rail(world: &WorldState, p: Position) -> bool {
    world.test_bounds(p.x, p.y) && tiles::is_rail(world.get_tile(p.x, p.y))
}

fn connects_wire(world: &WorldState, p: Position) -> bool {
    world.test_bounds(p.x, p.y) && tiles::is_conductive(world.get_cell(p.x, p.y))
}

fn neighbour_mask(world: &WorldState, pos: Position, connects: fn(&WorldState, Position) -> bool) -> usize {
    Direction::ALL
        .iter()
        .enumerate()
        .filter(|&(_, &d)| connects(world, pos.step(d)))
        .fold(0, |mask, (bit, _)| mask | (1 << bit))
}

/// Pick the bend or tee variant of a plain line tile from its
/// neighbours. Crossings, bridges and zone tiles are left alone.
fn reconnect(world: &mut WorldState, pos: Position) {
    if !world.test_bounds(pos.x, pos.y) {
        return;
    }
    let tile = world.get_tile(pos.x, pos.y);
    let updated = if is_plain_road(tile) {
        let density_base = tile - ((tile - ROADBASE) & 15);
        let mask = neighbour_mask(world, pos, connects_road);
        density_base + 2 + CONNECT_OFFSETS[mask]
    } else if is_plain_rail(tile) {
        LHRAIL + CONNECT_OFFSETS[neighbour_mask(world, pos, connects_rail)]
    } else if is_plain_wire(tile) {
        LHPOWER + CONNECT_OFFSETS[neighbour_mask(world, pos, connects_wire)]
    } else {
        return;
    };
    if updated != tile {
        world.set_tile_keep_flags(pos.x, pos.y, updated);
    }
}

fn reconnect_around(world: &mut WorldState, pos: Position) {
    reconnect(world, pos);
    for d in Direction::ALL {
        reconnect(world, pos.step(d));
    }
}

// ── Bulldozer ──────────────────────────────────────────────────────

/// Zone center whose footprint covers `pos`, searching outward.
fn owning_zone_center(world: &WorldState, pos: Position) -> Option<(Position, u16)> {
    for dy in -2..=2 {
        for dx in -2..=2 {
            let c = pos.offset(dx, dy);
            if !world.test_bounds(c.x, c.y) || !tiles::is_zone_center(world.get_cell(c.x, c.y)) {
                continue;
            }
            let center = world.get_tile(c.x, c.y);
            if footprint(c, center).any(|(_, p)| p == pos) {
                return Some((c, center));
            }
        }
    }
    None
}

/// Clear one tile, or the whole zone the tile belongs to. Bridges and
/// underwater lines go back to river.
pub fn bulldoze(world: &mut WorldState, pos: Position) -> SimResult<()> {
    check_bounds(world, pos)?;
    let cell = world.get_cell(pos.x, pos.y);
    let tile = tiles::tile_of(cell);
    if tile == DIRT {
        return Ok(());
    }
    if !tiles::is_bulldozable(cell) {
        return Err(refuse(format!("tile {tile} at ({}, {}) cannot be bulldozed", pos.x, pos.y)));
    }

    if let Some((center_pos, center)) = owning_zone_center(world, pos) {
        charge(world, BULLDOZE_COST)?;
        let cells: Vec<Position> = footprint(center_pos, center).map(|(_, p)| p).collect();
        for p in cells {
            world.place(p.x, p.y, DIRT);
        }
        return Ok(());
    }

    charge(world, BULLDOZE_COST)?;
    let cleared = if tiles::is_bridge(tile) || matches!(tile, HPOWER | VPOWER | HRAIL | VRAIL) {
        RIVER
    } else {
        DIRT
    };
    world.place(pos.x, pos.y, cleared);
    reconnect_around(world, pos);
    Ok(())
}

// ── Terrain ────────────────────────────────────────────────────────

/// Fill the rectangle between two corners with a terrain tile (dirt,
/// water or trees). Free of charge; used to lay out a map.
pub fn fill_terrain(world: &mut WorldState, from: Position, to: Position, tile: u16) -> SimResult<()> {
    if tile >= RUBBLE {
        return Err(refuse(format!("tile {tile} is not terrain")));
    }
    check_bounds(world, from)?;
    check_bounds(world, to)?;
    for y in from.y.min(to.y)..=from.y.max(to.y) {
        for x in from.x.min(to.x)..=from.x.max(to.x) {
            world.place(x, y, tile);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiles::RESBASE;

    fn world() -> WorldState {
        WorldState::new(32, 32)
    }

    #[test]
    fn zone_costs_funds_and_needs_clear_ground() {
        let mut w = world();
        let funds = w.budget.funds;
        place_zone(&mut w, Position::new(5, 5), ZoneKind::Residential).unwrap();
        assert_eq!(w.get_tile(5, 5), FREEZ);
        assert_eq!(w.get_tile(4, 4), RESBASE);
        assert_eq!(w.budget.funds, funds - 100);

        let err = place_zone(&mut w, Position::new(6, 6), ZoneKind::Commercial);
        assert!(matches!(err, Err(SimError::InvalidCommand { .. })));
        assert_eq!(w.budget.funds, funds - 100);
    }

    #[test]
    fn zone_off_the_edge_is_out_of_bounds() {
        let mut w = world();
        let err = place_zone(&mut w, Position::new(0, 0), ZoneKind::Industrial);
        assert!(matches!(err, Err(SimError::OutOfBounds { x: -1, y: -1 })));
    }

    #[test]
    fn road_line_bends_and_tees() {
        let mut w = world();
        lay_line(&mut w, Position::new(2, 2), Position::new(6, 2), lay_road).unwrap();
        assert_eq!(w.get_tile(4, 2), ROADS);
        lay_road(&mut w, Position::new(4, 3)).unwrap();
        // East, south and west neighbours make a tee.
        assert_eq!(w.get_tile(4, 2), ROADS + CONNECT_OFFSETS[2 | 4 | 8]);
        assert_eq!(w.get_tile(4, 3), ROADS2);
    }

    #[test]
    fn crossings_and_bridges() {
        let mut w = world();
        lay_wire(&mut w, Position::new(3, 3)).unwrap();
        lay_road(&mut w, Position::new(3, 3)).unwrap();
        assert_eq!(w.get_tile(3, 3), VROADPOWER);
        assert!(tiles::is_conductive(w.get_cell(3, 3)));

        w.place(10, 10, RIVER);
        lay_road(&mut w, Position::new(9, 10)).unwrap();
        lay_road(&mut w, Position::new(10, 10)).unwrap();
        assert_eq!(w.get_tile(10, 10), HBRIDGE);
        bulldoze(&mut w, Position::new(10, 10)).unwrap();
        assert_eq!(w.get_tile(10, 10), RIVER);

        w.place(12, 12, RIVER);
        lay_wire(&mut w, Position::new(12, 12)).unwrap();
        assert_eq!(w.get_tile(12, 12), HPOWER);
        assert_eq!(w.get_tile(11, 12), DIRT);
    }

    #[test]
    fn bulldozing_a_member_clears_the_whole_zone() {
        let mut w = world();
        place_zone(&mut w, Position::new(8, 8), ZoneKind::CoalPlant).unwrap();
        bulldoze(&mut w, Position::new(10, 10)).unwrap();
        for (_, p) in footprint(Position::new(8, 8), POWERPLANT) {
            assert_eq!(w.get_tile(p.x, p.y), DIRT);
        }
    }

    #[test]
    fn broke_city_cannot_build() {
        let mut w = world();
        w.budget.funds = 5;
        assert!(lay_road(&mut w, Position::new(1, 1)).is_err());
        assert_eq!(w.get_tile(1, 1), DIRT);
        lay_wire(&mut w, Position::new(1, 1)).unwrap();
        assert_eq!(w.budget.funds, 0);
    }
}
