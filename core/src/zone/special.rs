//! Service and infrastructure zones: plants, stations, stadiums,
//! transport hubs, hospitals and churches.

use super::{footprint, repair_zone, zone_plop};
use crate::{
    disaster_subsystem::meltdown,
    sprite_subsystem::{generate_copter, generate_plane, generate_ship, SpriteKind},
    subsystem::SimContext,
    tiles::{
        self, AIRPORT, CHURCH, FIRESTATION, FOOTBALLGAME1, FOOTBALLGAME2, FREEZ, FULLSTADIUM,
        HOSPITAL, NUCLEAR, POLICESTATION, PORT, POWERPLANT, STADIUM,
    },
    traffic::find_perimeter_road,
    types::Position,
    world::WorldState,
};

/// Whether this is a repair week for a zone repaired every `period` weeks.
fn due(ctx: &SimContext<'_>, period: u64) -> bool {
    ctx.clock.city_time % period == 0
}

pub(super) fn coal_plant(ctx: &mut SimContext<'_>, pos: Position) {
    ctx.world.census.coal_plants += 1;
    if due(ctx, 8) {
        repair_zone(ctx.world, pos, POWERPLANT);
    }
    ctx.world.power_plants.push(pos);
}

pub(super) fn nuclear_plant(ctx: &mut SimContext<'_>, pos: Position) {
    let world = &mut *ctx.world;
    if world.settings.disasters_enabled
        && ctx.rng.below(world.settings.level.meltdown_chance() + 1) == 0
    {
        meltdown(world, ctx.rng, pos);
        return;
    }
    world.census.nuclear_plants += 1;
    if ctx.clock.city_time % 8 == 0 {
        repair_zone(world, pos, NUCLEAR);
    }
    world.power_plants.push(pos);
}

pub(super) fn fire_station(ctx: &mut SimContext<'_>, pos: Position, powered: bool) {
    ctx.world.census.fire_stations += 1;
    if due(ctx, 8) {
        repair_zone(ctx.world, pos, FIRESTATION);
    }
    let effect = station_effect(ctx.world, pos, ctx.world.budget.fire_effect, powered);
    ctx.world.fire_station_map.world_add(pos.x, pos.y, effect);
}

pub(super) fn police_station(ctx: &mut SimContext<'_>, pos: Position, powered: bool) {
    ctx.world.census.police_stations += 1;
    if due(ctx, 8) {
        repair_zone(ctx.world, pos, POLICESTATION);
    }
    let effect = station_effect(ctx.world, pos, ctx.world.budget.police_effect, powered);
    ctx.world.police_station_map.world_add(pos.x, pos.y, effect);
}

/// Funded effect, halved without power and halved again without a road.
fn station_effect(world: &WorldState, pos: Position, funded: i32, powered: bool) -> i32 {
    let mut z = if powered { funded } else { funded / 2 };
    if find_perimeter_road(world, pos).is_none() {
        z /= 2;
    }
    z
}

pub(super) fn stadium(ctx: &mut SimContext<'_>, pos: Position, powered: bool) {
    ctx.world.census.stadiums += 1;
    if due(ctx, 16) {
        repair_zone(ctx.world, pos, STADIUM);
    }
    if powered && (ctx.clock.city_time + pos.x as u64 + pos.y as u64) % 32 == 0 {
        draw_stadium(ctx.world, pos, FULLSTADIUM);
        ctx.world.place(pos.x + 1, pos.y, FOOTBALLGAME1);
        ctx.world.place(pos.x + 1, pos.y + 1, FOOTBALLGAME2);
    }
}

pub(super) fn full_stadium(ctx: &mut SimContext<'_>, pos: Position) {
    ctx.world.census.stadiums += 1;
    if (ctx.clock.city_time + pos.x as u64 + pos.y as u64) % 8 == 0 {
        draw_stadium(ctx.world, pos, STADIUM);
    }
}

/// Redraw the stadium footprint as `center`, keeping the center's power.
fn draw_stadium(world: &mut WorldState, pos: Position, center: u16) {
    let powered = world.is_tile_powered(pos.x, pos.y);
    let base = tiles::zone_base(center);
    for (i, p) in footprint(pos, center) {
        world.place(p.x, p.y, base + i);
    }
    world.set_tile_power(pos.x, pos.y, powered);
}

pub(super) fn airport(ctx: &mut SimContext<'_>, pos: Position, powered: bool) {
    ctx.world.census.airports += 1;
    if due(ctx, 8) {
        repair_zone(ctx.world, pos, AIRPORT);
    }
    if !powered {
        return;
    }
    if ctx.rng.below(6) == 0 {
        generate_plane(ctx.world, ctx.rng, pos);
        return;
    }
    if ctx.rng.below(13) == 0 {
        generate_copter(ctx.world, pos);
    }
}

pub(super) fn seaport(ctx: &mut SimContext<'_>, pos: Position, powered: bool) {
    ctx.world.census.seaports += 1;
    if due(ctx, 16) {
        repair_zone(ctx.world, pos, PORT);
    }
    if powered && !ctx.world.has_sprite(SpriteKind::Ship) {
        generate_ship(ctx.world);
    }
}

pub(super) fn hospital_church(ctx: &mut SimContext<'_>, pos: Position) {
    let world = &mut *ctx.world;
    let tile = world.get_tile(pos.x, pos.y);
    let need = if tile == HOSPITAL {
        world.census.hospitals += 1;
        world.need_hospital
    } else {
        world.census.churches += 1;
        world.need_church
    };
    let center = if tile == HOSPITAL { HOSPITAL } else { CHURCH };
    if ctx.clock.city_time % 16 == 0 {
        repair_zone(world, pos, center);
    }
    if need == -1 && ctx.rng.below(21) == 0 {
        zone_plop(world, pos, FREEZ);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{clock::SimClock, rng::CityRng};

    #[test]
    fn airport_skips_the_copter_roll_after_a_takeoff() {
        let clock = SimClock::new("airport".into());
        let pos = Position::new(10, 10);
        let mut takeoffs = 0;

        for seed in 0..64 {
            let mut world = WorldState::new(32, 32);
            assert!(zone_plop(&mut world, pos, AIRPORT));
            // A plane already aloft makes the takeoff itself draw nothing.
            world.add_sprite(SpriteKind::Airplane, pos, pos);

            let mut expected = CityRng::new(seed);
            let draws = if expected.below(6) == 0 { 1 } else { 2 };
            if draws == 2 {
                expected.below(13);
            } else {
                takeoffs += 1;
            }

            let mut rng = CityRng::new(seed);
            let mut ctx = SimContext { clock: &clock, world: &mut world, rng: &mut rng };
            airport(&mut ctx, pos, true);

            assert_eq!(rng.next_u64(), expected.next_u64(), "seed {seed}: {draws} draws expected");
            if draws == 1 {
                assert!(!world.has_sprite(SpriteKind::Helicopter));
            }
        }
        assert!(takeoffs > 0);
    }
}
