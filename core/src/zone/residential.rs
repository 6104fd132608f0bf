//! Residential zones: empty lots fill up with single houses, then turn
//! into density zones; decline walks the same ladder backwards.

use super::{free_population, residential_population, zone_plop};
use crate::{
    subsystem::SimContext,
    rng::CityRng,
    tiles::{self, CHURCH, DIRT, FREEZ, HOSPITAL, HOUSE, RESBASE, RZB},
    traffic::{make_traffic, TrafficResult, TripOrigin},
    types::{Direction, Position},
    world::WorldState,
};

const GROWTH_THRESHOLD: i32 = 26380;
const UNPOWERED_SCORE: i32 = -500;
const MAX_HOUSES: i32 = 8;
const DENSE_NEIGHBOURHOOD: i32 = 64;
const POLLUTION_LIMIT: i32 = 128;

/// Member ids restored when a house disappears, by x-major cell order.
const CLEARED_MEMBER: [u16; 9] = [0, 3, 6, 1, 4, 7, 2, 5, 8];

/// Neighbour offsets tried when building a house, index 0 unused.
const LOT_OFFSETS: [(i32, i32); 9] = [
    (0, 0),
    (-1, -1), (0, -1), (1, -1),
    (-1, 0), (1, 0),
    (-1, 1), (0, 1), (1, 1),
];

pub(super) fn run(ctx: &mut SimContext<'_>, pos: Position, powered: bool) {
    let world = &mut *ctx.world;
    let rng = &mut *ctx.rng;

    world.census.res_zones += 1;
    let tile = world.get_tile(pos.x, pos.y);
    let pop = if tile == FREEZ {
        free_population(world, pos)
    } else {
        residential_population(tile)
    };
    world.census.res_pop += pop;

    let traffic = if pop > rng.below(36) {
        make_traffic(world, rng, pos, TripOrigin::Residential)
    } else {
        TrafficResult::Reached
    };

    if traffic == TrafficResult::NoRoad {
        let value = land_value_tier(world, pos);
        decline(world, rng, pos, pop, value);
        return;
    }

    if tile == FREEZ || rng.below(8) == 0 {
        let score = desirability(world, pos, powered, traffic);

        if score > -350 && score - GROWTH_THRESHOLD > rng.random16_signed() {
            if pop == 0 && rng.below(4) == 0 {
                make_hospital(world, pos);
                return;
            }
            let value = land_value_tier(world, pos);
            grow(world, rng, pos, tile, pop, value);
            return;
        }

        if score < 350 && score + GROWTH_THRESHOLD < rng.random16_signed() {
            let value = land_value_tier(world, pos);
            decline(world, rng, pos, pop, value);
        }
    }
}

/// Valve plus local attractiveness of a residential zone.
pub fn desirability(world: &WorldState, pos: Position, powered: bool, traffic: TrafficResult) -> i32 {
    if !powered {
        return UNPOWERED_SCORE;
    }
    let local = if traffic == TrafficResult::NoRoad {
        -3000
    } else {
        let value = world.land_value.world_get(pos.x, pos.y) - world.pollution.world_get(pos.x, pos.y);
        (value * 32).clamp(0, 6000) - 3000
    };
    world.valves.res + local
}

/// Land-value tier 0..=3 of a zone, from land value net of pollution.
pub fn land_value_tier(world: &WorldState, pos: Position) -> u16 {
    let value = world.land_value.world_get(pos.x, pos.y) - world.pollution.world_get(pos.x, pos.y);
    match value {
        v if v < 30 => 0,
        v if v < 80 => 1,
        v if v < 150 => 2,
        _ => 3,
    }
}

fn plop(world: &mut WorldState, pos: Position, density: i32, value: u16) {
    let center = (value * 4 + density as u16) * 9 + RZB;
    zone_plop(world, pos, center);
}

fn grow(world: &mut WorldState, rng: &mut CityRng, pos: Position, tile: u16, pop: i32, value: u16) {
    if world.pollution.world_get(pos.x, pos.y) > POLLUTION_LIMIT {
        return;
    }
    if tile == FREEZ {
        if pop < MAX_HOUSES {
            build_house(world, rng, pos, value);
            world.adjust_growth(pos, 1);
        } else if world.pop_density.world_get(pos.x, pos.y) > DENSE_NEIGHBOURHOOD {
            plop(world, pos, 0, value);
            world.adjust_growth(pos, 8);
        }
        return;
    }
    if pop < 40 {
        plop(world, pos, pop / 8 - 1, value);
        world.adjust_growth(pos, 8);
    }
}

fn decline(world: &mut WorldState, rng: &mut CityRng, pos: Position, pop: i32, value: u16) {
    if pop == 0 {
        return;
    }
    if pop > 16 {
        plop(world, pos, (pop - 24) / 8, value);
        world.adjust_growth(pos, -8);
        return;
    }
    if pop == 16 {
        let powered = world.is_tile_powered(pos.x, pos.y);
        world.set_tile(pos.x, pos.y, tiles::cell(FREEZ));
        world.set_tile_power(pos.x, pos.y, powered);
        for dx in -1..=1 {
            for dy in -1..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let p = pos.offset(dx, dy);
                if world.test_bounds(p.x, p.y) {
                    let house = HOUSE + value * 3 + rng.below(3) as u16;
                    world.place(p.x, p.y, house);
                }
            }
        }
        world.adjust_growth(pos, -8);
        return;
    }

    world.adjust_growth(pos, -1);
    let mut z = 0;
    for dx in -1..=1 {
        for dy in -1..=1 {
            let p = pos.offset(dx, dy);
            if world.test_bounds(p.x, p.y) && tiles::is_house(world.get_tile(p.x, p.y)) {
                world.place(p.x, p.y, RESBASE + CLEARED_MEMBER[z]);
                return;
            }
            z += 1;
        }
    }
}

/// Put a house on the best free lot around an empty residential center.
fn build_house(world: &mut WorldState, rng: &mut CityRng, pos: Position, value: u16) {
    let mut best = 0;
    let mut best_score = 0;
    for (z, &(dx, dy)) in LOT_OFFSETS.iter().enumerate().skip(1) {
        let p = pos.offset(dx, dy);
        if !world.test_bounds(p.x, p.y) {
            continue;
        }
        let score = eval_lot(world, p);
        if score != 0 {
            if score > best_score {
                best_score = score;
                best = z;
            }
            if score == best_score && rng.below(8) == 0 {
                best = z;
            }
        }
    }
    if best != 0 {
        let (dx, dy) = LOT_OFFSETS[best];
        let house = HOUSE + value * 3 + rng.below(3) as u16;
        world.place(pos.x + dx, pos.y + dy, house);
    }
}

/// -1 for an unusable lot, else 1 plus one per adjacent road or rail.
fn eval_lot(world: &WorldState, p: Position) -> i32 {
    let tile = world.get_tile(p.x, p.y);
    if tile != DIRT && !tiles::is_residential_clear(tile) {
        return -1;
    }
    let mut score = 1;
    for dir in Direction::ALL {
        let n = p.step(dir);
        if world.test_bounds(n.x, n.y) {
            let t = world.get_tile(n.x, n.y);
            if tiles::is_road(t) || tiles::is_rail(t) {
                score += 1;
            }
        }
    }
    score
}

fn make_hospital(world: &mut WorldState, pos: Position) {
    if world.need_hospital > 0 {
        zone_plop(world, pos, HOSPITAL);
        world.need_hospital = 0;
        return;
    }
    if world.need_church > 0 {
        zone_plop(world, pos, CHURCH);
        world.need_church = 0;
    }
}
