//! Industrial zones. Land value plays no part; the density tier is a
//! coin flip.

use super::{industrial_population, zone_plop};
use crate::{
    subsystem::SimContext,
    tiles::{INDCLR, IZB},
    traffic::{make_traffic, TrafficResult, TripOrigin},
    types::Position,
    world::WorldState,
};

const GROWTH_THRESHOLD: i32 = 26380;
const MAX_DENSITY: i32 = 4;

pub(super) fn run(ctx: &mut SimContext<'_>, pos: Position, powered: bool) {
    let world = &mut *ctx.world;
    let rng = &mut *ctx.rng;

    world.census.ind_zones += 1;
    let tile = world.get_tile(pos.x, pos.y);
    let pop = industrial_population(tile);
    world.census.ind_pop += pop;

    let traffic = if pop > rng.below(6) {
        make_traffic(world, rng, pos, TripOrigin::Industrial)
    } else {
        TrafficResult::Reached
    };

    if traffic == TrafficResult::NoRoad {
        let value = rng.below(2) as u16;
        decline(world, pos, pop, value);
        return;
    }

    if rng.below(8) != 0 {
        return;
    }
    let score = desirability(world, powered, traffic);

    if score > -350 && score - GROWTH_THRESHOLD > rng.random16_signed() {
        let value = rng.below(2) as u16;
        grow(world, pos, pop, value);
        return;
    }

    if score < 350 && score + GROWTH_THRESHOLD < rng.random16_signed() {
        let value = rng.below(2) as u16;
        decline(world, pos, pop, value);
    }
}

pub fn desirability(world: &WorldState, powered: bool, traffic: TrafficResult) -> i32 {
    if !powered {
        return -500;
    }
    let local = if traffic == TrafficResult::NoRoad { -1000 } else { 0 };
    world.valves.ind + local
}

fn plop(world: &mut WorldState, pos: Position, density: i32, value: u16) {
    let center = (value * 4 + density as u16) * 9 + IZB;
    zone_plop(world, pos, center);
}

fn grow(world: &mut WorldState, pos: Position, pop: i32, value: u16) {
    if pop < MAX_DENSITY {
        plop(world, pos, pop, value);
        world.adjust_growth(pos, 8);
    }
}

fn decline(world: &mut WorldState, pos: Position, pop: i32, value: u16) {
    if pop > 1 {
        plop(world, pos, pop - 2, value);
        world.adjust_growth(pos, -8);
    } else if pop == 1 {
        zone_plop(world, pos, INDCLR);
        world.adjust_growth(pos, -8);
    }
}
