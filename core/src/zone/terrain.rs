//! Terrain tile behaviors visited by the row-band scan: fire, flood,
//! radiation, roads, rails and explosion leftovers.

use super::kill_zone;
use crate::{
    rng::CityRng,
    sprite_subsystem::{generate_train, make_explosion, SpriteKind},
    subsystem::SimContext,
    tiles::{
        self, DIRT, FIRE, FLOOD, HTRFBASE, IZB, LTRFBASE, RIVER, ROADBASE, RUBBLE, WOODS5,
    },
    types::{Direction, Position},
    world::WorldState,
};

/// Base ids of the plain, light-traffic and heavy-traffic road sets.
const ROAD_DENSITY_BASE: [u16; 3] = [ROADBASE, LTRFBASE, HTRFBASE];
const DETERIORATION_EFFECT: i32 = 30;
const TRAIN_MIN_POPULATION: i32 = 20;

pub(super) fn fire(ctx: &mut SimContext<'_>, pos: Position) {
    let world = &mut *ctx.world;
    let rng = &mut *ctx.rng;
    world.census.fire_pop += 1;
    if rng.below(4) != 0 {
        return;
    }

    for dir in Direction::ALL {
        if rng.below(8) != 0 {
            continue;
        }
        let n = pos.step(dir);
        if !world.test_bounds(n.x, n.y) {
            continue;
        }
        let cell = world.get_cell(n.x, n.y);
        if !tiles::is_combustible(cell) {
            continue;
        }
        if tiles::is_zone_center(cell) {
            let tile = tiles::tile_of(cell);
            kill_zone(world, n, tile);
            if tile > IZB {
                make_explosion(world, n);
            }
        }
        let fire = FIRE + rng.below(4) as u16;
        world.place(n.x, n.y, fire);
    }

    let coverage = world.fire_coverage.world_get(pos.x, pos.y);
    let rate = match coverage {
        c if c > 100 => 1,
        c if c > 20 => 2,
        0 => 10,
        _ => 3,
    };
    if rng.below(rate + 1) == 0 {
        let rubble = RUBBLE + rng.below(4) as u16;
        world.place(pos.x, pos.y, rubble);
    }
}

pub(super) fn flood(ctx: &mut SimContext<'_>, pos: Position) {
    let world = &mut *ctx.world;
    let rng = &mut *ctx.rng;
    if world.flood_count == 0 {
        if rng.below(16) == 0 {
            world.place(pos.x, pos.y, DIRT);
        }
        return;
    }
    for dir in Direction::ALL {
        if rng.below(8) != 0 {
            continue;
        }
        let n = pos.step(dir);
        if !world.test_bounds(n.x, n.y) {
            continue;
        }
        let cell = world.get_cell(n.x, n.y);
        let tile = tiles::tile_of(cell);
        if tiles::is_combustible(cell) || tile == DIRT || (WOODS5..FLOOD).contains(&tile) {
            if tiles::is_zone_center(cell) {
                kill_zone(world, n, tile);
            }
            let water = FLOOD + rng.below(3) as u16;
            world.place(n.x, n.y, water);
        }
    }
}

pub(super) fn radioactive(ctx: &mut SimContext<'_>, pos: Position) {
    if ctx.rng.below(4096) == 0 {
        ctx.world.place(pos.x, pos.y, DIRT);
    }
}

/// Unfunded transport decays: roads crumble and bridges fall into the
/// river. Returns true when the tile was destroyed.
fn deteriorate(ctx: &mut SimContext<'_>, pos: Position) -> bool {
    let world = &mut *ctx.world;
    let rng = &mut *ctx.rng;
    let cell = world.get_cell(pos.x, pos.y);
    let effect = world.budget.road_effect;
    if effect < DETERIORATION_EFFECT
        && rng.below(512) == 0
        && !tiles::is_conductive(cell)
        && effect < rng.below(32)
    {
        let tile = tiles::tile_of(cell);
        if tiles::is_road(tile) && ((tile - ROADBASE) & 15) < 2 {
            world.place(pos.x, pos.y, RIVER);
        } else {
            let rubble = RUBBLE + rng.below(4) as u16;
            world.place(pos.x, pos.y, rubble);
        }
        return true;
    }
    false
}

pub(super) fn road(ctx: &mut SimContext<'_>, pos: Position) {
    ctx.world.census.road_total += 1;
    if deteriorate(ctx, pos) {
        return;
    }

    let world = &mut *ctx.world;
    let cell = world.get_cell(pos.x, pos.y);
    // Bridges weigh five plain road tiles.
    if !tiles::is_combustible(cell) {
        world.census.road_total += 4;
        return;
    }

    let tile = tiles::tile_of(cell);
    let current = if tile < LTRFBASE {
        0
    } else if tile < HTRFBASE {
        1
    } else {
        world.census.road_total += 1;
        2
    };
    let mut wanted = (world.traffic_density.world_get(pos.x, pos.y) >> 6) as usize;
    if wanted > 1 {
        wanted -= 1;
    }
    if wanted != current {
        let variant = (tile - ROADBASE) & 15;
        world.place(pos.x, pos.y, variant + ROAD_DENSITY_BASE[wanted]);
    }
}

pub(super) fn rail(ctx: &mut SimContext<'_>, pos: Position) {
    ctx.world.census.rail_total += 1;
    spawn_train(ctx.world, ctx.rng, pos);
    deteriorate(ctx, pos);
}

fn spawn_train(world: &mut WorldState, rng: &mut CityRng, pos: Position) {
    if world.total_pop > TRAIN_MIN_POPULATION
        && !world.has_sprite(SpriteKind::Train)
        && rng.below(26) == 0
    {
        generate_train(world, pos);
    }
}

pub(super) fn explosion(ctx: &mut SimContext<'_>, pos: Position) {
    let rubble = RUBBLE + ctx.rng.below(4) as u16;
    ctx.world.place(pos.x, pos.y, rubble);
}
