//! Power distribution: a directed walk from every registered plant over
//! conductive tiles, bounded by the city's generating capacity.
//!
//! RULE: Plants are taken from the registry in LIFO order and a walk
//! re-pushes its current cell whenever it has a second way to go. This
//! order decides which zones stay dark under undersupply and must not
//! change.

use crate::{
    clock::Phase,
    error::SimResult,
    event::{MessageKind, OverlayKind, SimEvent},
    subsystem::{SimContext, SimSubsystem},
    tiles::{self, NUCLEAR, POWERPLANT},
    types::{Direction, Position},
    world::WorldState,
};

pub const COAL_CAPACITY: u32 = 700;
pub const NUCLEAR_CAPACITY: u32 = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerScanOutcome {
    pub visited: u32,
    pub capacity: u32,
    pub brownout: bool,
}

/// A neighbour the walk may continue into.
fn can_conduct(world: &WorldState, p: Position) -> bool {
    if !world.test_bounds(p.x, p.y) {
        return false;
    }
    let cell = world.get_cell(p.x, p.y);
    let tile = tiles::tile_of(cell);
    tiles::is_conductive(cell) && tile != NUCLEAR && tile != POWERPLANT && !world.has_power(p.x, p.y)
}

/// Recompute the power map from the plant registry, consuming it.
pub fn power_scan(world: &mut WorldState) -> PowerScanOutcome {
    world.power_map.clear();
    let capacity = world.census.coal_plants.max(0) as u32 * COAL_CAPACITY
        + world.census.nuclear_plants.max(0) as u32 * NUCLEAR_CAPACITY;
    let mut visited = 0u32;

    while let Some(mut pos) = world.power_plants.pop() {
        let mut heading: Option<Direction> = None;
        loop {
            visited += 1;
            if visited > capacity {
                return PowerScanOutcome { visited: capacity, capacity, brownout: true };
            }
            if let Some(dir) = heading {
                pos = pos.step(dir);
            }
            world.power_map.set(pos.x, pos.y, true);

            let mut candidates = 0;
            for dir in Direction::ALL {
                if candidates >= 2 {
                    break;
                }
                if can_conduct(world, pos.step(dir)) {
                    candidates += 1;
                    heading = Some(dir);
                }
            }
            if candidates > 1 {
                world.power_plants.push(pos);
            }
            if candidates == 0 {
                break;
            }
        }
    }
    PowerScanOutcome { visited, capacity, brownout: false }
}

pub struct PowerSubsystem;

impl PowerSubsystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PowerSubsystem {
    fn default() -> Self { Self::new() }
}

impl SimSubsystem for PowerSubsystem {
    fn name(&self) -> &'static str { "power" }

    fn update(&mut self, phase: Phase, ctx: &mut SimContext<'_>) -> SimResult<Vec<SimEvent>> {
        if phase != Phase::Power {
            return Ok(vec![]);
        }
        let outcome = power_scan(ctx.world);
        let mut events = Vec::new();
        if outcome.brownout {
            log::warn!(
                "week={} brownout: demand exceeds {} units of capacity",
                ctx.clock.city_time,
                outcome.capacity
            );
            events.push(SimEvent::CityMessage { message: MessageKind::NotEnoughPower, location: None });
        } else {
            log::debug!(
                "week={} power scan: {}/{} units used",
                ctx.clock.city_time,
                outcome.visited,
                outcome.capacity
            );
        }
        events.push(SimEvent::OverlayChanged { overlay: OverlayKind::Power });
        Ok(events)
    }

    fn as_any(&self) -> &dyn std::any::Any { self }
}
