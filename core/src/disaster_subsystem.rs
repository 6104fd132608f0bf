//! Disasters: the phase-15 random roll, scenario countdowns and the
//! disaster primitives the player can also trigger directly.
//!
//! RULE: With disasters disabled only scenario disasters and explicit
//! triggers happen. The flood countdown still runs down.

use crate::{
    clock::Phase,
    config::ScenarioDisaster,
    error::SimResult,
    event::{MessageKind, SimEvent, SoundKind},
    rng::CityRng,
    sprite_subsystem::{make_explosion, SpriteKind, MONSTER_LIFETIME, TORNADO_LIFETIME},
    subsystem::{SimContext, SimSubsystem},
    tiles::{self, DIRT, FIRE, FLOOD, NUCLEAR, RADTILE, RIVER, RUBBLE},
    types::{Direction, Position},
    world::WorldState,
};
use serde::{Deserialize, Serialize};

/// Phase-15 invocations a fresh flood keeps spreading.
pub const FLOOD_DURATION: i32 = 30;
const FLOOD_TRIES: u32 = 300;
const MONSTER_TRIES: u32 = 300;
const MELTDOWN_FALLOUT: u32 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisasterKind {
    Fire,
    Flood,
    Tornado,
    Earthquake,
    Monster,
    Meltdown,
}

fn report(world: &mut WorldState, message: MessageKind, location: Option<Position>) {
    world.notify(SimEvent::CityMessage { message, location });
}

fn random_tile(world: &WorldState, rng: &mut CityRng) -> Position {
    Position::new(rng.below(world.width()), rng.below(world.height()))
}

/// Arson on a random tile. Only non-center zone members and houses burn.
pub fn set_fire(world: &mut WorldState, rng: &mut CityRng) -> Option<Position> {
    let pos = random_tile(world, rng);
    if !tiles::is_arsonable(world.get_cell(pos.x, pos.y)) {
        return None;
    }
    let fire = FIRE + rng.below(8) as u16;
    world.place(pos.x, pos.y, fire);
    log::info!("fire at ({}, {})", pos.x, pos.y);
    world.notify(SimEvent::CitySound { sound: SoundKind::Siren, location: pos });
    report(world, MessageKind::FireReported, Some(pos));
    Some(pos)
}

/// Flood a tile next to a river bank and start the spread countdown.
pub fn make_flood(world: &mut WorldState, rng: &mut CityRng) -> Option<Position> {
    for _ in 0..FLOOD_TRIES {
        let pos = random_tile(world, rng);
        if !tiles::is_river_edge(world.get_tile(pos.x, pos.y)) {
            continue;
        }
        for dir in Direction::ALL {
            let n = pos.step(dir);
            if !world.test_bounds(n.x, n.y) {
                continue;
            }
            let cell = world.get_cell(n.x, n.y);
            let floodable = tiles::tile_of(cell) == DIRT
                || (tiles::is_bulldozable(cell) && tiles::is_combustible(cell));
            if floodable {
                world.place(n.x, n.y, FLOOD);
                world.flood_count = FLOOD_DURATION;
                log::info!("flood at ({}, {})", n.x, n.y);
                report(world, MessageKind::FloodReported, Some(n));
                return Some(n);
            }
        }
    }
    None
}

/// Shake the city: sample random tiles and knock down zone members.
pub fn earthquake(world: &mut WorldState, rng: &mut CityRng) -> u32 {
    let center = world.scan.city_center;
    world.notify(SimEvent::CitySound { sound: SoundKind::Rumble, location: center });
    world.notify(SimEvent::EarthquakeStarted);
    report(world, MessageKind::EarthquakeReported, Some(center));

    let samples = rng.below(701) + 300;
    let mut damaged = 0;
    for _ in 0..samples {
        let pos = random_tile(world, rng);
        if !tiles::is_vulnerable(world.get_cell(pos.x, pos.y)) {
            continue;
        }
        let tile = if rng.below(4) != 0 {
            RUBBLE + rng.below(4) as u16
        } else {
            FIRE + rng.below(8) as u16
        };
        world.place(pos.x, pos.y, tile);
        damaged += 1;
    }
    log::info!("earthquake: {samples} samples, {damaged} tiles damaged");
    damaged
}

/// Spawn a tornado, or keep the current one going.
pub fn tornado(world: &mut WorldState, rng: &mut CityRng) -> Position {
    if let Some(t) = world.sprite_mut(SpriteKind::Tornado) {
        t.count = TORNADO_LIFETIME;
        return t.pos;
    }
    let x = rng.below(world.width() - 19) + 10;
    let y = rng.below(world.height() - 19) + 10;
    let pos = Position::new(x, y);
    world.add_sprite(SpriteKind::Tornado, pos, pos);
    log::info!("tornado at ({x}, {y})");
    report(world, MessageKind::TornadoReported, Some(pos));
    pos
}

/// Release the monster near the most polluted spot, or send the one
/// already roaming back there.
pub fn monster(world: &mut WorldState, rng: &mut CityRng) -> Position {
    let target = world.scan.pollution_max;
    if let Some(m) = world.sprite_mut(SpriteKind::Monster) {
        m.count = MONSTER_LIFETIME;
        m.dest = target;
        return m.pos;
    }
    let mut spawn = None;
    for _ in 0..MONSTER_TRIES {
        let x = target.x + rng.below(41) - 20;
        let y = target.y + rng.below(31) - 15;
        if world.test_bounds(x, y) && world.get_tile(x, y) == RIVER {
            spawn = Some(Position::new(x, y));
            break;
        }
    }
    let pos = spawn.unwrap_or_else(|| Position::new(world.width() / 2, world.height() / 2));
    world.add_sprite(SpriteKind::Monster, pos, target);
    world.notify(SimEvent::CitySound { sound: SoundKind::MonsterRoar, location: pos });
    log::info!("monster at ({}, {})", pos.x, pos.y);
    report(world, MessageKind::MonsterReported, Some(pos));
    pos
}

/// Nuclear meltdown of the plant centered at `pos`.
pub fn meltdown(world: &mut WorldState, rng: &mut CityRng, pos: Position) {
    for (dx, dy) in [(-1, -1), (-1, 2), (2, -1), (2, 2)] {
        make_explosion(world, pos.offset(dx, dy));
    }
    for x in pos.x - 1..pos.x + 3 {
        for y in pos.y - 1..pos.y + 3 {
            let fire = FIRE + rng.below(4) as u16;
            world.place(x, y, fire);
        }
    }
    for _ in 0..MELTDOWN_FALLOUT {
        let x = pos.x - 20 + rng.below(41);
        let y = pos.y - 15 + rng.below(31);
        if !world.test_bounds(x, y) {
            continue;
        }
        let cell = world.get_cell(x, y);
        if tiles::is_zone_center(cell) {
            continue;
        }
        if tiles::is_combustible(cell) || tiles::tile_of(cell) == DIRT {
            world.place(x, y, RADTILE);
        }
    }
    log::info!("meltdown at ({}, {})", pos.x, pos.y);
    report(world, MessageKind::MeltdownReported, Some(pos));
}

/// First nuclear plant center in scan order.
pub fn find_nuclear_plant(world: &WorldState) -> Option<Position> {
    (0..world.height())
        .flat_map(|y| (0..world.width()).map(move |x| Position::new(x, y)))
        .find(|p| {
            let cell = world.get_cell(p.x, p.y);
            tiles::is_zone_center(cell) && tiles::tile_of(cell) == NUCLEAR
        })
}

/// A bomb on a random tile.
fn drop_firebomb(world: &mut WorldState, rng: &mut CityRng) {
    let pos = random_tile(world, rng);
    make_explosion(world, pos);
}

/// Advance the scenario countdown and strike when it is due.
fn scenario_disaster(world: &mut WorldState, rng: &mut CityRng) {
    let Some((disaster, wait)) = world
        .settings
        .scenario
        .as_ref()
        .map(|s| (s.disaster, s.wait))
    else {
        return;
    };
    if wait == 0 {
        return;
    }
    match disaster {
        ScenarioDisaster::Earthquake if wait == 1 => {
            earthquake(world, rng);
        }
        ScenarioDisaster::Firebombs => drop_firebomb(world, rng),
        ScenarioDisaster::Monster if wait == 1 => {
            monster(world, rng);
        }
        ScenarioDisaster::Meltdown if wait == 1 => {
            if let Some(pos) = find_nuclear_plant(world) {
                meltdown(world, rng, pos);
            }
        }
        ScenarioDisaster::Flood if wait % 24 == 0 => {
            make_flood(world, rng);
        }
        _ => {}
    }
    if let Some(s) = world.settings.scenario.as_mut() {
        s.wait -= 1;
    }
}

/// Run a disaster of the given kind right now.
pub fn trigger(world: &mut WorldState, rng: &mut CityRng, kind: DisasterKind) -> bool {
    match kind {
        DisasterKind::Fire => set_fire(world, rng).is_some(),
        DisasterKind::Flood => make_flood(world, rng).is_some(),
        DisasterKind::Tornado => {
            tornado(world, rng);
            true
        }
        DisasterKind::Earthquake => {
            earthquake(world, rng);
            true
        }
        DisasterKind::Monster => {
            monster(world, rng);
            true
        }
        DisasterKind::Meltdown => match find_nuclear_plant(world) {
            Some(pos) => {
                meltdown(world, rng, pos);
                true
            }
            None => false,
        },
    }
}

pub struct DisasterSubsystem;

impl DisasterSubsystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DisasterSubsystem {
    fn default() -> Self { Self::new() }
}

impl SimSubsystem for DisasterSubsystem {
    fn name(&self) -> &'static str { "disaster" }

    fn update(&mut self, phase: Phase, ctx: &mut SimContext<'_>) -> SimResult<Vec<SimEvent>> {
        if phase != Phase::FireScan {
            return Ok(vec![]);
        }
        let world = &mut *ctx.world;
        let rng = &mut *ctx.rng;

        if world.flood_count > 0 {
            world.flood_count -= 1;
        }
        scenario_disaster(world, rng);

        if !world.settings.disasters_enabled {
            return Ok(vec![]);
        }
        if rng.random(world.settings.level.disaster_chance()) != 0 {
            return Ok(vec![]);
        }
        match rng.below(9) {
            0 | 1 => {
                set_fire(world, rng);
            }
            2 | 3 => {
                make_flood(world, rng);
            }
            5 => {
                tornado(world, rng);
            }
            6 => {
                earthquake(world, rng);
            }
            7 | 8 if world.scan.pollution_avg > 60 => {
                monster(world, rng);
            }
            _ => {}
        }
        Ok(vec![])
    }

    fn as_any(&self) -> &dyn std::any::Any { self }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zone::zone_plop;

    #[test]
    fn meltdown_burns_the_plant_and_spreads_fallout() {
        let mut world = WorldState::new(64, 64);
        let mut rng = CityRng::new(2);
        let pos = Position::new(30, 30);
        assert!(zone_plop(&mut world, pos, NUCLEAR));
        assert_eq!(find_nuclear_plant(&world), Some(pos));
        meltdown(&mut world, &mut rng, pos);
        for x in 29..33 {
            for y in 29..33 {
                assert!(tiles::is_fire(world.get_tile(x, y)));
            }
        }
        let fallout = (0..64)
            .flat_map(|y| (0..64).map(move |x| (x, y)))
            .filter(|&(x, y)| world.get_tile(x, y) == RADTILE)
            .count();
        assert!(fallout > 0);
        assert_eq!(world.sprites.iter().filter(|s| s.kind == SpriteKind::Explosion).count(), 4);
        assert_eq!(find_nuclear_plant(&world), None);
    }

    #[test]
    fn existing_tornado_is_renewed_not_duplicated() {
        let mut world = WorldState::new(64, 64);
        let mut rng = CityRng::new(8);
        let first = tornado(&mut world, &mut rng);
        if let Some(t) = world.sprite_mut(SpriteKind::Tornado) {
            t.count = 3;
        }
        let again = tornado(&mut world, &mut rng);
        assert_eq!(first, again);
        assert_eq!(world.sprites.len(), 1);
        assert_eq!(world.sprites[0].count, TORNADO_LIFETIME);
    }

    #[test]
    fn meltdown_trigger_needs_a_plant() {
        let mut world = WorldState::new(32, 32);
        let mut rng = CityRng::new(1);
        assert!(!trigger(&mut world, &mut rng, DisasterKind::Meltdown));
    }
}
