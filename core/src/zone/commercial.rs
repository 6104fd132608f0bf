//! Commercial zones: growth follows the commercial-rate map and is
//! capped by land value.

use super::{commercial_population, land_value_tier, zone_plop};
use crate::{
    subsystem::SimContext,
    tiles::{COMCLR, CZB},
    traffic::{make_traffic, TrafficResult, TripOrigin},
    types::Position,
    world::WorldState,
};

const GROWTH_THRESHOLD: i32 = 26380;
const MAX_DENSITY: i32 = 5;

pub(super) fn run(ctx: &mut SimContext<'_>, pos: Position, powered: bool) {
    let world = &mut *ctx.world;
    let rng = &mut *ctx.rng;

    world.census.com_zones += 1;
    let tile = world.get_tile(pos.x, pos.y);
    let pop = commercial_population(tile);
    world.census.com_pop += pop;

    let traffic = if pop > rng.below(6) {
        make_traffic(world, rng, pos, TripOrigin::Commercial)
    } else {
        TrafficResult::Reached
    };

    if traffic == TrafficResult::NoRoad {
        let value = land_value_tier(world, pos);
        decline(world, pos, pop, value);
        return;
    }

    if rng.below(8) != 0 {
        return;
    }
    let score = desirability(world, pos, powered, traffic);

    if traffic != TrafficResult::Exhausted
        && score > -350
        && score - GROWTH_THRESHOLD > rng.random16_signed()
    {
        let value = land_value_tier(world, pos);
        grow(world, pos, pop, value);
        return;
    }

    if score < 350 && score + GROWTH_THRESHOLD < rng.random16_signed() {
        let value = land_value_tier(world, pos);
        decline(world, pos, pop, value);
    }
}

pub fn desirability(world: &WorldState, pos: Position, powered: bool, traffic: TrafficResult) -> i32 {
    if !powered {
        return -500;
    }
    let local = if traffic == TrafficResult::NoRoad {
        -3000
    } else {
        world.com_rate.world_get(pos.x, pos.y)
    };
    world.valves.com + local
}

fn plop(world: &mut WorldState, pos: Position, density: i32, value: u16) {
    let center = (value * 5 + density as u16) * 9 + CZB;
    zone_plop(world, pos, center);
}

fn grow(world: &mut WorldState, pos: Position, pop: i32, value: u16) {
    if pop > world.land_value.world_get(pos.x, pos.y) / 32 {
        return;
    }
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
        zone_plop(world, pos, COMCLR);
        world.adjust_growth(pos, -8);
    }
}
