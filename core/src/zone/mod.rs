//! Zone behavior engine: the row-band scan of phases 1–8.
//!
//! RULE: Every tile with a behavior is visited once per week. Zone
//! centers update power and census and run their land-use behavior;
//! fire, flood, radiation, roads, rails and explosion leftovers run
//! their terrain behavior.
//!
//! RULE: A zone never grows or declines piecemeal. Every change of
//! density rewrites the whole footprint through `zone_plop`.

mod commercial;
mod industrial;
mod residential;
mod special;
mod terrain;

pub use commercial::desirability as commercial_desirability;
pub use industrial::desirability as industrial_desirability;
pub use residential::{desirability as residential_desirability, land_value_tier};

use crate::{
    clock::{Phase, SCAN_BANDS},
    error::SimResult,
    event::SimEvent,
    subsystem::{SimContext, SimSubsystem},
    tiles::{
        self, TileBehavior, COMBASE, COMCLR, CZB, FREEZ, INDBASE, INDCLR, IZB, NUCLEAR,
        PORTBASE, POWERPLANT, ROADBASE, RZB,
    },
    types::Position,
    world::WorldState,
};
use std::ops::Range;

/// Growth-rate penalty applied where a zone burns or is destroyed.
const KILLED_ZONE_GROWTH: i32 = -20;

pub struct ZoneSubsystem;

impl ZoneSubsystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ZoneSubsystem {
    fn default() -> Self { Self::new() }
}

impl SimSubsystem for ZoneSubsystem {
    fn name(&self) -> &'static str { "zone" }

    fn update(&mut self, phase: Phase, ctx: &mut SimContext<'_>) -> SimResult<Vec<SimEvent>> {
        if let Phase::ZoneScan(band) = phase {
            scan_band(ctx, band);
        }
        Ok(vec![])
    }

    fn as_any(&self) -> &dyn std::any::Any { self }
}

// ── Scan ───────────────────────────────────────────────────────────

/// Rows covered by one of the eight scan bands. The last band absorbs
/// the remainder.
pub fn band_rows(height: i32, band: u8) -> Range<i32> {
    let bands = SCAN_BANDS as i32;
    let b = band as i32;
    let start = b * height / bands;
    let end = if b == bands - 1 { height } else { (b + 1) * height / bands };
    start..end
}

pub fn scan_band(ctx: &mut SimContext<'_>, band: u8) {
    let width = ctx.world.width();
    for y in band_rows(ctx.world.height(), band) {
        for x in 0..width {
            let cell = ctx.world.get_cell(x, y);
            if let Some(behavior) = TileBehavior::of(cell) {
                dispatch(ctx, Position::new(x, y), behavior);
            }
        }
    }
}

fn dispatch(ctx: &mut SimContext<'_>, pos: Position, behavior: TileBehavior) {
    use TileBehavior::*;
    match behavior {
        Fire => terrain::fire(ctx, pos),
        Flood => terrain::flood(ctx, pos),
        Radioactive => terrain::radioactive(ctx, pos),
        Road => terrain::road(ctx, pos),
        Rail => terrain::rail(ctx, pos),
        Explosion => terrain::explosion(ctx, pos),
        _ => run_zone(ctx, pos, behavior),
    }
}

fn run_zone(ctx: &mut SimContext<'_>, pos: Position, behavior: TileBehavior) {
    let powered = set_zone_power(ctx.world, pos);
    if powered {
        ctx.world.census.powered_zones += 1;
    } else {
        ctx.world.census.unpowered_zones += 1;
    }

    use TileBehavior::*;
    match behavior {
        Residential => residential::run(ctx, pos, powered),
        Commercial => commercial::run(ctx, pos, powered),
        Industrial => industrial::run(ctx, pos, powered),
        HospitalChurch => special::hospital_church(ctx, pos),
        CoalPower => special::coal_plant(ctx, pos),
        NuclearPower => special::nuclear_plant(ctx, pos),
        FireStation => special::fire_station(ctx, pos, powered),
        PoliceStation => special::police_station(ctx, pos, powered),
        StadiumEmpty => special::stadium(ctx, pos, powered),
        StadiumFull => special::full_stadium(ctx, pos),
        Airport => special::airport(ctx, pos, powered),
        Seaport => special::seaport(ctx, pos, powered),
        Fire | Flood | Radioactive | Road | Rail | Explosion => {
            unreachable!("terrain behavior {behavior:?} dispatched as a zone")
        }
    }
}

// ── Footprints ─────────────────────────────────────────────────────

/// `(member index, position)` of every cell of the footprint centered
/// at `pos`, row-major from the top-left member.
pub fn footprint(pos: Position, center: u16) -> impl Iterator<Item = (u16, Position)> {
    let size = tiles::zone_size(center);
    (0..size).flat_map(move |dy| {
        (0..size).map(move |dx| ((dy * size + dx) as u16, pos.offset(dx - 1, dy - 1)))
    })
}

/// Refresh the zone center's power bit from the power map. Plants are
/// always powered. A transition swaps animated members in or out.
pub fn set_zone_power(world: &mut WorldState, pos: Position) -> bool {
    let tile = world.get_tile(pos.x, pos.y);
    let powered = tile == NUCLEAR || tile == POWERPLANT || world.has_power(pos.x, pos.y);
    if powered != world.is_tile_powered(pos.x, pos.y) {
        world.set_tile_power(pos.x, pos.y, powered);
        for (_, p) in footprint(pos, tile) {
            let member = world.get_tile(p.x, p.y);
            let swapped = if powered { tiles::on_power(member) } else { tiles::on_shutdown(member) };
            if let Some(t) = swapped {
                world.place(p.x, p.y, t);
            }
        }
    }
    powered
}

/// Rewrite the footprint around `pos` as the zone centered on `center`.
/// Refused when any member cell is off the map or on fire, flood or
/// radiation.
pub fn zone_plop(world: &mut WorldState, pos: Position, center: u16) -> bool {
    let cells: Vec<(u16, Position)> = footprint(pos, center).collect();
    let blocked = cells.iter().any(|(_, p)| {
        !world.test_bounds(p.x, p.y) || tiles::blocks_zone_plop(world.get_tile(p.x, p.y))
    });
    if blocked {
        return false;
    }
    let base = tiles::zone_base(center);
    for (i, p) in cells {
        world.place(p.x, p.y, base + i);
    }
    set_zone_power(world, pos);
    true
}

/// Restore damaged members of a footprint. Centers, animated members and
/// rubble, flood, radiation or fire are left alone.
pub fn repair_zone(world: &mut WorldState, pos: Position, center: u16) {
    let base = tiles::zone_base(center);
    for (i, p) in footprint(pos, center) {
        if !world.test_bounds(p.x, p.y) {
            continue;
        }
        let cell = world.get_cell(p.x, p.y);
        if tiles::is_zone_center(cell) || tiles::is_animated(cell) {
            continue;
        }
        if !tiles::is_indestructible(tiles::tile_of(cell)) {
            world.place(p.x, p.y, base + i);
        }
    }
}

/// A zone center was burnt or destroyed: record the loss on the growth
/// map and leave the remaining members bulldozable.
pub fn kill_zone(world: &mut WorldState, pos: Position, center: u16) {
    world.growth_rate.world_add(pos.x, pos.y, KILLED_ZONE_GROWTH);
    for (_, p) in footprint(pos, center) {
        if !world.test_bounds(p.x, p.y) {
            continue;
        }
        let cell = world.get_cell(p.x, p.y);
        if tiles::tile_of(cell) >= ROADBASE {
            world.set_tile(p.x, p.y, cell | tiles::BULLBIT);
        }
    }
}

// ── Populations ────────────────────────────────────────────────────

/// Houses standing on an empty residential lot.
pub fn free_population(world: &WorldState, pos: Position) -> i32 {
    let mut count = 0;
    for dy in -1..=1 {
        for dx in -1..=1 {
            let p = pos.offset(dx, dy);
            if world.test_bounds(p.x, p.y) && tiles::is_house(world.get_tile(p.x, p.y)) {
                count += 1;
            }
        }
    }
    count
}

/// Residents of a residential density zone.
pub fn residential_population(tile: u16) -> i32 {
    (((tile as i32 - RZB as i32) / 9) % 4) * 8 + 16
}

pub fn commercial_population(tile: u16) -> i32 {
    if tile == COMCLR {
        return 0;
    }
    ((tile as i32 - CZB as i32) / 9) % 5 + 1
}

pub fn industrial_population(tile: u16) -> i32 {
    if tile == INDCLR {
        return 0;
    }
    ((tile as i32 - IZB as i32) / 9) % 4 + 1
}

/// Population density weight of a zone center, used by the density scan.
pub fn zone_density(world: &WorldState, pos: Position, tile: u16) -> i32 {
    if tile == FREEZ {
        return free_population(world, pos);
    }
    if tile < COMBASE {
        return residential_population(tile);
    }
    if tile < INDBASE {
        return commercial_population(tile) * 8;
    }
    if tile < PORTBASE {
        return industrial_population(tile) * 8;
    }
    0
}
