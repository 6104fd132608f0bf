//! Traffic generation: a bounded random walk from a zone over the road
//! and rail network, looking for a destination of the complementary
//! land use.
//!
//! RULE: A walk takes at most `MAX_TRAFFIC_DISTANCE` forward steps.
//! A failed walk leaves the traffic map untouched.

use crate::{
    rng::CityRng,
    sprite_subsystem::SpriteKind,
    tiles::{self, COMBASE, LHTHR, NUCLEAR, PORT},
    types::{Direction, Position},
    world::WorldState,
};
use serde::{Deserialize, Serialize};

pub const MAX_TRAFFIC_DISTANCE: i32 = 30;
pub const TRAFFIC_INCREMENT: i32 = 50;
pub const MAX_TRAFFIC_DENSITY: i32 = 240;

/// Perimeter of a 3×3 zone, clockwise from the tile above its top-left.
const PERIMETER: [(i32, i32); 12] = [
    (-1, -2), (0, -2), (1, -2),
    (2, -1), (2, 0), (2, 1),
    (1, 2), (0, 2), (-1, 2),
    (-2, 1), (-2, 0), (-2, -1),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrafficResult {
    Reached,
    Exhausted,
    NoRoad,
}

impl TrafficResult {
    pub fn code(self) -> i32 {
        match self {
            Self::Reached => 1,
            Self::Exhausted => 0,
            Self::NoRoad => -1,
        }
    }
}

/// Land use a trip starts from; decides which tiles count as arrival.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TripOrigin {
    Residential,
    Commercial,
    Industrial,
}

impl TripOrigin {
    fn destination(self) -> (u16, u16) {
        match self {
            Self::Residential => (COMBASE, NUCLEAR),
            Self::Commercial => (LHTHR, PORT),
            Self::Industrial => (LHTHR, COMBASE),
        }
    }
}

fn drivable(world: &WorldState, p: Position) -> bool {
    world.test_bounds(p.x, p.y) && tiles::is_drivable(world.get_tile(p.x, p.y))
}

/// First road or rail tile on the zone perimeter.
pub fn find_perimeter_road(world: &WorldState, center: Position) -> Option<Position> {
    PERIMETER
        .iter()
        .map(|&(dx, dy)| center.offset(dx, dy))
        .find(|&p| drivable(world, p))
}

/// Send one trip out of the zone centered at `center`.
pub fn make_traffic(
    world: &mut WorldState,
    rng: &mut CityRng,
    center: Position,
    origin: TripOrigin,
) -> TrafficResult {
    let Some(start) = find_perimeter_road(world, center) else {
        return TrafficResult::NoRoad;
    };
    match drive(world, rng, start, origin) {
        Some(mut route) => {
            while let Some(p) = route.pop() {
                let tile = world.get_tile(p.x, p.y);
                if tiles::is_road(tile) || tiles::is_rail(tile) {
                    add_traffic(world, rng, p);
                }
            }
            TrafficResult::Reached
        }
        None => TrafficResult::Exhausted,
    }
}

/// The walk itself. Returns the backtrack stack on arrival.
fn drive(
    world: &WorldState,
    rng: &mut CityRng,
    start: Position,
    origin: TripOrigin,
) -> Option<Vec<Position>> {
    let mut pos = start;
    let mut back: Option<Direction> = None;
    let mut route: Vec<Position> = Vec::new();
    let mut step = 0;
    while step < MAX_TRAFFIC_DISTANCE {
        match try_go(world, rng, pos, back) {
            Some(dir) => {
                pos = pos.step(dir);
                back = Some(dir.reverse());
                if step % 2 == 1 {
                    route.push(pos);
                }
                if arrived(world, pos, origin) {
                    return Some(route);
                }
            }
            None => {
                route.pop()?;
                step += 3;
            }
        }
        step += 1;
    }
    None
}

/// Pick a drivable direction, scanning from a random start and never
/// turning straight back.
fn try_go(
    world: &WorldState,
    rng: &mut CityRng,
    pos: Position,
    back: Option<Direction>,
) -> Option<Direction> {
    let first = (rng.random16() & 3) as u32;
    (first..first + 4)
        .map(Direction::from_index)
        .filter(|&d| Some(d) != back)
        .find(|&d| drivable(world, pos.step(d)))
}

fn arrived(world: &WorldState, pos: Position, origin: TripOrigin) -> bool {
    let (low, high) = origin.destination();
    Direction::ALL.iter().any(|&d| {
        let n = pos.step(d);
        if !world.test_bounds(n.x, n.y) {
            return false;
        }
        let tile = world.get_tile(n.x, n.y);
        tile >= low && tile <= high
    })
}

fn add_traffic(world: &mut WorldState, rng: &mut CityRng, p: Position) {
    let z = (world.traffic_density.world_get(p.x, p.y) + TRAFFIC_INCREMENT).min(MAX_TRAFFIC_DENSITY);
    if z == MAX_TRAFFIC_DENSITY && rng.below(5) == 0 {
        world.scan.traffic_max = p;
        if let Some(copter) = world.sprite_mut(SpriteKind::Helicopter) {
            copter.dest = p;
        }
    }
    world.traffic_density.world_set(p.x, p.y, z);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiles::{HRAIL, HPOWER, ROADS};

    #[test]
    fn perimeter_skips_power_lines() {
        let mut world = WorldState::new(16, 16);
        let center = Position::new(8, 8);
        world.place(7, 6, HPOWER);
        assert_eq!(find_perimeter_road(&world, center), None);
        world.place(10, 9, HRAIL);
        assert_eq!(find_perimeter_road(&world, center), Some(Position::new(10, 9)));
        world.place(6, 7, ROADS);
        assert_eq!(find_perimeter_road(&world, center), Some(Position::new(10, 9)));
    }

    #[test]
    fn codes_match_the_walk_outcomes() {
        assert_eq!(TrafficResult::Reached.code(), 1);
        assert_eq!(TrafficResult::Exhausted.code(), 0);
        assert_eq!(TrafficResult::NoRoad.code(), -1);
    }
}
