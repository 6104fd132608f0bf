//! Map scans: decay (phase 10), land value and pollution (12), crime
//! (13), population density (14) and fire coverage (15).
//!
//! RULE: Each derived map is rebuilt only by its own scan, from the tile
//! grid and from maps rebuilt earlier in the week.
//!
//! RULE: Hot spots keep the first maximum found unless a later equal
//! value wins a 1-in-4 draw. Scan order is part of the output.

use crate::{
    clock::Phase,
    error::SimResult,
    event::{OverlayKind, SimEvent},
    map::MapLayer,
    rng::CityRng,
    subsystem::{SimContext, SimSubsystem},
    tiles::{self, DIRT, ROADBASE, RUBBLE},
    types::Position,
    world::WorldState,
    zone::zone_density,
};

const MAX_GROWTH_RATE: i32 = 200;
const TERRAIN_TREE_BONUS: i32 = 15;
const MAX_LAND_VALUE: i32 = 250;
const CRIME_LAND_VALUE_PENALTY: i32 = 20;
const MAX_CRIME: i32 = 250;

fn overlays(kinds: &[OverlayKind]) -> Vec<SimEvent> {
    kinds.iter().map(|&overlay| SimEvent::OverlayChanged { overlay }).collect()
}

/// Track the maximum of a scan, with the 1-in-4 tie rule.
fn track_max(rng: &mut CityRng, value: i32, best: &mut i32, at: &mut Position, pos: Position) {
    if value > *best || (value == *best && rng.below(4) == 0) {
        *best = value;
        *at = pos;
    }
}

// ── Phase 10 ───────────────────────────────────────────────────────

/// Pull every growth-rate entry one step toward zero.
pub fn decay_growth_rate(world: &mut WorldState) {
    for v in world.growth_rate.values_mut() {
        if *v > 0 {
            *v -= 1;
        } else if *v < 0 {
            *v += 1;
        }
        *v = (*v).clamp(-MAX_GROWTH_RATE, MAX_GROWTH_RATE);
    }
}

/// Traffic fades quickly once the trips stop.
pub fn decay_traffic(world: &mut WorldState) {
    for v in world.traffic_density.values_mut() {
        *v = match *v {
            t if t > 200 => t - 34,
            t if t > 24 => t - 24,
            _ => 0,
        };
    }
}

// ── Phase 12 ───────────────────────────────────────────────────────

/// Rebuild pollution, land value and terrain from the tile grid.
pub fn pollution_terrain_land_value_scan(world: &mut WorldState, rng: &mut CityRng) {
    let mut trees = world.terrain.blank();
    let mut raw_pollution = world.pollution.blank();
    let mut new_land_value = world.land_value.blank();
    let (half_w, half_h) = (world.land_value.width() as i32, world.land_value.height() as i32);
    let mut lv_total = 0i64;
    let mut lv_count = 0i64;

    for hx in 0..half_w {
        for hy in 0..half_h {
            let mut level = 0;
            let mut developed = false;
            for mx in 2 * hx..2 * hx + 2 {
                for my in 2 * hy..2 * hy + 2 {
                    let tile = world.get_tile(mx, my);
                    if tile == DIRT {
                        continue;
                    }
                    if tile < RUBBLE {
                        let t = trees.get(hx / 2, hy / 2);
                        trees.set(hx / 2, hy / 2, t + TERRAIN_TREE_BONUS);
                        continue;
                    }
                    level += tiles::pollution_value(tile);
                    if tile >= ROADBASE {
                        developed = true;
                    }
                }
            }
            raw_pollution.set(hx, hy, level.min(255));

            if developed {
                let mut value = (34 - world.distance_to_center(hx, hy) / 2) * 4;
                value += world.terrain.get(hx / 2, hy / 2);
                value -= world.pollution.get(hx, hy);
                if world.crime.get(hx, hy) > 190 {
                    value -= CRIME_LAND_VALUE_PENALTY;
                }
                let value = value.clamp(1, MAX_LAND_VALUE);
                new_land_value.set(hx, hy, value);
                lv_total += value as i64;
                lv_count += 1;
            }
        }
    }

    world.land_value = new_land_value;
    world.scan.land_value_avg = if lv_count > 0 { (lv_total / lv_count) as i32 } else { 0 };

    world.pollution = raw_pollution.smoothed().smoothed();
    let mut p_total = 0i64;
    let mut p_count = 0i64;
    let mut p_max = 0;
    let mut p_at = world.scan.pollution_max;
    for (x, y) in world.pollution.coords() {
        let z = world.pollution.get(x, y);
        if z == 0 {
            continue;
        }
        p_total += z as i64;
        p_count += 1;
        track_max(rng, z, &mut p_max, &mut p_at, Position::new(2 * x, 2 * y));
    }
    world.scan.pollution_avg = if p_count > 0 { (p_total / p_count) as i32 } else { 0 };
    world.scan.pollution_max = p_at;

    world.terrain = trees.smoothed_terrain();
}

// ── Phase 13 ───────────────────────────────────────────────────────

pub fn crime_scan(world: &mut WorldState, rng: &mut CityRng) {
    world.police_coverage = smoothed_coverage(&world.police_station_map);

    let mut total = 0i64;
    let mut count = 0i64;
    let mut best = 0;
    let mut at = world.scan.crime_max;
    let (half_w, half_h) = (world.crime.width() as i32, world.crime.height() as i32);
    for hy in 0..half_h {
        for hx in 0..half_w {
            let value = world.land_value.get(hx, hy);
            if value == 0 {
                world.crime.set(hx, hy, 0);
                continue;
            }
            count += 1;
            let mut z = (128 - value + world.pop_density.get(hx, hy)).min(300);
            z -= world.police_coverage.get(hx / 4, hy / 4);
            let z = z.clamp(0, MAX_CRIME);
            world.crime.set(hx, hy, z);
            total += z as i64;
            track_max(rng, z, &mut best, &mut at, Position::new(2 * hx, 2 * hy));
        }
    }
    world.scan.crime_avg = if count > 0 { (total / count) as i32 } else { 0 };
    world.scan.crime_max = at;
}

/// Three passes of the coverage smoothing.
fn smoothed_coverage(station_map: &MapLayer<i32>) -> MapLayer<i32> {
    station_map
        .smoothed_coverage()
        .smoothed_coverage()
        .smoothed_coverage()
}

// ── Phase 14 ───────────────────────────────────────────────────────

pub fn population_density_scan(world: &mut WorldState) {
    let mut tem = world.pop_density.blank();
    let (mut x_total, mut y_total, mut zones) = (0i64, 0i64, 0i64);
    for x in 0..world.width() {
        for y in 0..world.height() {
            let cell = world.get_cell(x, y);
            if !tiles::is_zone_center(cell) {
                continue;
            }
            let pos = Position::new(x, y);
            let density = (zone_density(world, pos, tiles::tile_of(cell)) * 8).min(254);
            tem.world_set(x, y, density);
            x_total += x as i64;
            y_total += y as i64;
            zones += 1;
        }
    }

    let smoothed = tem.smoothed().smoothed().smoothed();
    for (x, y) in smoothed.coords() {
        world.pop_density.set(x, y, smoothed.get(x, y) * 2);
    }

    for (ex, ey) in world.com_rate.coords() {
        let z = 64 - world.distance_to_center(ex * 4, ey * 4) * 4;
        world.com_rate.set(ex, ey, z);
    }

    world.scan.city_center = if zones > 0 {
        Position::new((x_total / zones) as i32, (y_total / zones) as i32)
    } else {
        Position::new((world.width() + 1) / 2, (world.height() + 1) / 2)
    };
}

// ── Phase 15 ───────────────────────────────────────────────────────

pub fn fire_analysis(world: &mut WorldState) {
    world.fire_coverage = smoothed_coverage(&world.fire_station_map);
}

pub struct ScanSubsystem;

impl ScanSubsystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ScanSubsystem {
    fn default() -> Self { Self::new() }
}

impl SimSubsystem for ScanSubsystem {
    fn name(&self) -> &'static str { "scan" }

    fn update(&mut self, phase: Phase, ctx: &mut SimContext<'_>) -> SimResult<Vec<SimEvent>> {
        let events = match phase {
            Phase::Decay => {
                if ctx.clock.sim_cycle % 5 == 0 {
                    decay_growth_rate(ctx.world);
                }
                decay_traffic(ctx.world);
                overlays(&[OverlayKind::GrowthRate, OverlayKind::Traffic])
            }
            Phase::PollutionScan => {
                pollution_terrain_land_value_scan(ctx.world, ctx.rng);
                overlays(&[OverlayKind::LandValue, OverlayKind::Pollution])
            }
            Phase::CrimeScan => {
                crime_scan(ctx.world, ctx.rng);
                overlays(&[OverlayKind::Crime, OverlayKind::PoliceCoverage])
            }
            Phase::PopulationScan => {
                population_density_scan(ctx.world);
                overlays(&[OverlayKind::PopulationDensity])
            }
            Phase::FireScan => {
                fire_analysis(ctx.world);
                overlays(&[OverlayKind::FireCoverage])
            }
            _ => vec![],
        };
        Ok(events)
    }

    fn as_any(&self) -> &dyn std::any::Any { self }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiles::{HTRFBASE, ROADS, WOODS};

    #[test]
    fn traffic_decay_steps() {
        let mut world = WorldState::new(16, 16);
        world.traffic_density.set(0, 0, 240);
        world.traffic_density.set(1, 0, 100);
        world.traffic_density.set(2, 0, 20);
        decay_traffic(&mut world);
        assert_eq!(world.traffic_density.get(0, 0), 206);
        assert_eq!(world.traffic_density.get(1, 0), 76);
        assert_eq!(world.traffic_density.get(2, 0), 0);
    }

    #[test]
    fn growth_rate_moves_toward_zero() {
        let mut world = WorldState::new(16, 16);
        world.growth_rate.set(0, 0, 5);
        world.growth_rate.set(1, 0, -300);
        decay_growth_rate(&mut world);
        assert_eq!(world.growth_rate.get(0, 0), 4);
        assert_eq!(world.growth_rate.get(1, 0), -200);
    }

    #[test]
    fn roads_get_land_value_and_traffic_pollutes() {
        let mut world = WorldState::new(32, 32);
        let mut rng = CityRng::new(3);
        world.place(16, 16, ROADS);
        world.place(4, 4, HTRFBASE);
        world.place(20, 20, WOODS);
        pollution_terrain_land_value_scan(&mut world, &mut rng);
        assert!(world.land_value.world_get(16, 16) >= 1);
        assert_eq!(world.land_value.world_get(20, 20), 0);
        assert!(world.pollution.world_get(4, 4) > 0);
        assert!(world.scan.pollution_avg > 0);
        assert_eq!(world.scan.pollution_max.x % 2, 0);
    }

    #[test]
    fn empty_map_center_is_the_middle() {
        let mut world = WorldState::new(121, 99);
        population_density_scan(&mut world);
        assert_eq!(world.scan.city_center, Position::new(61, 50));
    }
}
