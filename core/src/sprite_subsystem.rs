//! Moving objects: trains, helicopters, airplanes, ships, the monster,
//! tornadoes and explosions.
//!
//! RULE: Sprites move on the tile grid, one step per engine invocation.
//! Sprites created during a step first move on the next one.
//!
//! RULE: Only the monster and tornadoes destroy tiles; explosions start
//! fires when they finish. Everything else is scenery.

use crate::{
    clock::Phase,
    error::SimResult,
    event::{SimEvent, SoundKind},
    rng::CityRng,
    subsystem::{SimContext, SimSubsystem},
    tiles::{self, CHANNEL, DIRT, FIRE, RIVER, RZB, TINYEXP, TREEBASE},
    types::{Direction, Position},
    world::WorldState,
    zone::kill_zone,
};
use serde::{Deserialize, Serialize};

pub const MONSTER_LIFETIME: i32 = 1000;
pub const TORNADO_LIFETIME: i32 = 200;
const HELICOPTER_LIFETIME: i32 = 1500;
const AIRPLANE_LIFETIME: i32 = 200;
/// Steps an explosion animates before it sets its surroundings alight.
const EXPLOSION_FRAMES: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpriteKind {
    Train,
    Helicopter,
    Airplane,
    Ship,
    Monster,
    Tornado,
    Explosion,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sprite {
    pub id: u32,
    pub kind: SpriteKind,
    pub pos: Position,
    pub dest: Position,
    /// Remaining lifetime in steps; 0 means unlimited for trains and ships.
    pub count: i32,
    pub dir: Option<Direction>,
    pub frame: u32,
}

impl Sprite {
    pub fn new(id: u32, kind: SpriteKind, pos: Position, dest: Position) -> Self {
        let count = match kind {
            SpriteKind::Monster => MONSTER_LIFETIME,
            SpriteKind::Tornado => TORNADO_LIFETIME,
            SpriteKind::Helicopter => HELICOPTER_LIFETIME,
            SpriteKind::Airplane => AIRPLANE_LIFETIME,
            SpriteKind::Train | SpriteKind::Ship | SpriteKind::Explosion => 0,
        };
        Self { id, kind, pos, dest, count, dir: None, frame: 0 }
    }
}

// ── Spawning ───────────────────────────────────────────────────────

pub fn generate_train(world: &mut WorldState, pos: Position) {
    if world.has_sprite(SpriteKind::Train) {
        return;
    }
    world.add_sprite(SpriteKind::Train, pos, pos);
    world.notify(SimEvent::CitySound { sound: SoundKind::TrainHorn, location: pos });
}

/// Airplane taking off from an airport toward a random point.
pub fn generate_plane(world: &mut WorldState, rng: &mut CityRng, pos: Position) {
    if world.has_sprite(SpriteKind::Airplane) {
        return;
    }
    let dest = Position::new(rng.below(world.width()), rng.below(world.height()));
    world.add_sprite(SpriteKind::Airplane, pos, dest);
}

/// Traffic helicopter, sent to the busiest road seen so far.
pub fn generate_copter(world: &mut WorldState, pos: Position) {
    if world.has_sprite(SpriteKind::Helicopter) {
        return;
    }
    let dest = world.scan.traffic_max;
    world.add_sprite(SpriteKind::Helicopter, pos, dest);
}

/// Ship entering from the first navigable tile on the map edge.
pub fn generate_ship(world: &mut WorldState) {
    if world.has_sprite(SpriteKind::Ship) {
        return;
    }
    let (w, h) = (world.width(), world.height());
    let edge = (0..w)
        .map(|x| Position::new(x, 0))
        .chain((0..w).map(|x| Position::new(x, h - 1)))
        .chain((0..h).map(|y| Position::new(0, y)))
        .chain((0..h).map(|y| Position::new(w - 1, y)))
        .find(|p| navigable(world.get_tile(p.x, p.y)));
    if let Some(pos) = edge {
        world.add_sprite(SpriteKind::Ship, pos, pos);
    }
}

pub fn make_explosion(world: &mut WorldState, pos: Position) {
    if !world.test_bounds(pos.x, pos.y) {
        return;
    }
    world.add_sprite(SpriteKind::Explosion, pos, pos);
    world.notify(SimEvent::CitySound { sound: SoundKind::Explosion, location: pos });
}

// ── Tile effects ───────────────────────────────────────────────────

fn navigable(tile: u16) -> bool {
    (RIVER..=CHANNEL).contains(&tile)
}

/// What a tornado or the monster does to the tile it crosses.
pub fn destroy_tile(world: &mut WorldState, pos: Position) {
    if !world.test_bounds(pos.x, pos.y) {
        return;
    }
    let cell = world.get_cell(pos.x, pos.y);
    let tile = tiles::tile_of(cell);
    if tile < TREEBASE {
        return;
    }
    if !tiles::is_combustible(cell) {
        if tiles::is_bridge(tile) {
            world.place(pos.x, pos.y, RIVER);
        }
        return;
    }
    if tiles::is_zone_center(cell) {
        kill_zone(world, pos, tile);
        if tile > RZB {
            make_explosion(world, pos);
        }
    }
    world.place(pos.x, pos.y, TINYEXP);
}

/// Set a tile alight unless it is a zone center or cannot burn.
pub fn start_fire(world: &mut WorldState, rng: &mut CityRng, pos: Position) {
    if !world.test_bounds(pos.x, pos.y) {
        return;
    }
    let cell = world.get_cell(pos.x, pos.y);
    let tile = tiles::tile_of(cell);
    if !tiles::is_combustible(cell) && tile != DIRT {
        return;
    }
    if tiles::is_zone_center(cell) {
        return;
    }
    let fire = FIRE + rng.below(4) as u16;
    world.place(pos.x, pos.y, fire);
}

// ── Movement ───────────────────────────────────────────────────────

/// One grid step toward `dest`, along the longer axis first.
fn heading(from: Position, dest: Position) -> Option<Direction> {
    let (dx, dy) = (dest.x - from.x, dest.y - from.y);
    if dx == 0 && dy == 0 {
        return None;
    }
    Some(if dx.abs() >= dy.abs() {
        if dx > 0 { Direction::East } else { Direction::West }
    } else if dy > 0 {
        Direction::South
    } else {
        Direction::North
    })
}

/// Pick a direction whose target satisfies `ok`, from a random start,
/// avoiding a U-turn unless it is the only way.
fn wander(
    world: &WorldState,
    rng: &mut CityRng,
    sprite: &Sprite,
    ok: impl Fn(u16) -> bool,
) -> Option<Direction> {
    let back = sprite.dir.map(Direction::reverse);
    let first = rng.below(4) as u32;
    let fits = |d: Direction| {
        let n = sprite.pos.step(d);
        world.test_bounds(n.x, n.y) && ok(world.get_tile(n.x, n.y))
    };
    if let Some(d) = sprite.dir.filter(|&d| fits(d)) {
        if rng.below(4) != 0 {
            return Some(d);
        }
    }
    (first..first + 4)
        .map(Direction::from_index)
        .filter(|&d| Some(d) != back)
        .find(|&d| fits(d))
        .or_else(|| back.filter(|&d| fits(d)))
}

/// Advance one sprite. Returns false when it leaves the game.
fn step(world: &mut WorldState, rng: &mut CityRng, sprite: &mut Sprite) -> bool {
    match sprite.kind {
        SpriteKind::Train => {
            if !tiles::is_rail(world.get_tile(sprite.pos.x, sprite.pos.y)) {
                return false;
            }
            match wander(world, rng, sprite, tiles::is_rail) {
                Some(d) => {
                    sprite.dir = Some(d);
                    sprite.pos = sprite.pos.step(d);
                    true
                }
                None => false,
            }
        }
        SpriteKind::Ship => match wander(world, rng, sprite, navigable) {
            Some(d) => {
                sprite.dir = Some(d);
                sprite.pos = sprite.pos.step(d);
                true
            }
            None => false,
        },
        SpriteKind::Helicopter => {
            if let Some(d) = heading(sprite.pos, sprite.dest) {
                sprite.pos = sprite.pos.step(d);
            }
            sprite.count -= 1;
            sprite.count > 0
        }
        SpriteKind::Airplane => {
            match heading(sprite.pos, sprite.dest) {
                Some(d) => sprite.pos = sprite.pos.step(d),
                None => {
                    sprite.dest = Position::new(rng.below(world.width()), rng.below(world.height()));
                }
            }
            sprite.count -= 1;
            sprite.count > 0
        }
        SpriteKind::Monster => {
            sprite.count -= 1;
            if sprite.count <= 0 {
                return false;
            }
            match heading(sprite.pos, sprite.dest) {
                Some(d) => {
                    sprite.dir = Some(d);
                    sprite.pos = sprite.pos.step(d);
                }
                None => {
                    sprite.dest = Position::new(rng.below(world.width()), rng.below(world.height()));
                }
            }
            destroy_tile(world, sprite.pos);
            true
        }
        SpriteKind::Tornado => {
            sprite.count -= 1;
            let d = Direction::from_index(rng.below(4) as u32);
            sprite.dir = Some(d);
            sprite.pos = sprite.pos.step(d);
            if !world.test_bounds(sprite.pos.x, sprite.pos.y) {
                return false;
            }
            destroy_tile(world, sprite.pos);
            sprite.count > 0
        }
        SpriteKind::Explosion => {
            sprite.frame += 1;
            if sprite.frame < EXPLOSION_FRAMES {
                return true;
            }
            let p = sprite.pos;
            for (dx, dy) in [(0, 0), (-1, -1), (1, -1), (-1, 1), (1, 1)] {
                start_fire(world, rng, p.offset(dx, dy));
            }
            false
        }
    }
}

/// Move every sprite once and drop the ones that finished.
pub fn move_sprites(world: &mut WorldState, rng: &mut CityRng) -> Vec<SimEvent> {
    let mut sprites = std::mem::take(&mut world.sprites);
    let mut events = Vec::new();
    sprites.retain_mut(|sprite| {
        let before = sprite.pos;
        let alive = step(world, rng, sprite);
        if alive && sprite.pos != before {
            events.push(SimEvent::SpriteMoved {
                sprite_id: sprite.id,
                kind: sprite.kind,
                x: sprite.pos.x,
                y: sprite.pos.y,
            });
        }
        alive
    });
    sprites.append(&mut world.sprites);
    world.sprites = sprites;
    events
}

pub struct SpriteSubsystem;

impl SpriteSubsystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SpriteSubsystem {
    fn default() -> Self { Self::new() }
}

impl SimSubsystem for SpriteSubsystem {
    fn name(&self) -> &'static str { "sprite" }

    fn update(&mut self, _phase: Phase, ctx: &mut SimContext<'_>) -> SimResult<Vec<SimEvent>> {
        if ctx.world.sprites.is_empty() {
            return Ok(vec![]);
        }
        Ok(move_sprites(ctx.world, ctx.rng))
    }

    fn as_any(&self) -> &dyn std::any::Any { self }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiles::{HRAIL, ROADS, RUBBLE};

    #[test]
    fn destroy_tile_spares_bare_ground_and_drowns_bridges() {
        let mut world = WorldState::new(16, 16);
        destroy_tile(&mut world, Position::new(2, 2));
        assert_eq!(world.get_tile(2, 2), DIRT);
        world.place(3, 3, tiles::HBRIDGE);
        destroy_tile(&mut world, Position::new(3, 3));
        assert_eq!(world.get_tile(3, 3), RIVER);
        world.place(4, 4, ROADS);
        destroy_tile(&mut world, Position::new(4, 4));
        assert_eq!(world.get_tile(4, 4), TINYEXP);
    }

    #[test]
    fn fires_skip_rubble_and_zone_centers() {
        let mut world = WorldState::new(16, 16);
        let mut rng = CityRng::new(1);
        world.place(5, 5, RUBBLE);
        start_fire(&mut world, &mut rng, Position::new(5, 5));
        assert_eq!(world.get_tile(5, 5), RUBBLE);
        start_fire(&mut world, &mut rng, Position::new(6, 6));
        assert!(tiles::is_fire(world.get_tile(6, 6)));
    }

    #[test]
    fn explosion_burns_out_after_its_frames() {
        let mut world = WorldState::new(16, 16);
        let mut rng = CityRng::new(9);
        make_explosion(&mut world, Position::new(8, 8));
        for _ in 0..EXPLOSION_FRAMES - 1 {
            move_sprites(&mut world, &mut rng);
        }
        assert_eq!(world.sprites.len(), 1);
        move_sprites(&mut world, &mut rng);
        assert!(world.sprites.is_empty());
        assert!(tiles::is_fire(world.get_tile(8, 8)));
        assert!(tiles::is_fire(world.get_tile(7, 7)));
    }

    #[test]
    fn train_leaves_when_its_track_is_gone() {
        let mut world = WorldState::new(16, 16);
        let mut rng = CityRng::new(4);
        for x in 2..10 {
            world.place(x, 5, HRAIL);
        }
        generate_train(&mut world, Position::new(5, 5));
        move_sprites(&mut world, &mut rng);
        let train = world.sprite(SpriteKind::Train).map(|s| s.pos);
        assert!(matches!(train, Some(p) if p.y == 5 && (p.x == 4 || p.x == 6)));
        world.place(train.map_or(0, |p| p.x), 5, DIRT);
        move_sprites(&mut world, &mut rng);
        assert!(!world.has_sprite(SpriteKind::Train));
    }
}
