//! Advisory messages: population milestones every month and one
//! rotating city check per week on a 64-week cycle.
//!
//! RULE: The stadium, seaport and airport checks own the demand cap
//! flags. They are recomputed only on their own week of the cycle.

use crate::{
    clock::{Phase, WEEKS_PER_MONTH},
    error::SimResult,
    event::{MessageKind, SimEvent},
    subsystem::{SimContext, SimSubsystem},
    types::Position,
    world::WorldState,
};

const MESSAGE_CYCLE: u64 = 64;

/// Population thresholds, largest first.
const MILESTONES: [(i64, MessageKind); 5] = [
    (500_000, MessageKind::ReachedMegalopolis),
    (100_000, MessageKind::ReachedMetropolis),
    (50_000, MessageKind::ReachedCapital),
    (10_000, MessageKind::ReachedCity),
    (2_000, MessageKind::ReachedTown),
];

/// Milestone crossed since the last monthly check, if any.
pub fn check_growth(world: &mut WorldState) -> Option<MessageKind> {
    let new_pop = world.census.city_population();
    let last = world.last_city_pop;
    world.last_city_pop = new_pop;
    if last == 0 {
        return None;
    }
    MILESTONES
        .iter()
        .find(|(threshold, _)| last < *threshold && new_pop >= *threshold)
        .map(|&(_, message)| message)
}

/// The advisory due this week of the 64-week cycle, with its location.
pub fn send_messages(world: &mut WorldState, city_time: u64) -> Option<(MessageKind, Option<Position>)> {
    let c = &world.census;
    let zones = c.zone_total();
    let total_pop = world.total_pop;
    let budget = &world.budget;

    let due = |cond: bool, message: MessageKind| -> Option<(MessageKind, Option<Position>)> {
        cond.then_some((message, None))
    };
    match city_time % MESSAGE_CYCLE {
        1 => due(zones / 4 >= c.res_zones, MessageKind::NeedResidential),
        5 => due(zones / 8 >= c.com_zones, MessageKind::NeedCommercial),
        10 => due(zones / 8 >= c.ind_zones, MessageKind::NeedIndustrial),
        14 => due(zones > 10 && zones * 2 > c.road_total, MessageKind::NeedRoads),
        18 => due(zones > 50 && zones > c.rail_total, MessageKind::NeedRails),
        22 => due(
            zones > 10 && c.coal_plants + c.nuclear_plants == 0,
            MessageKind::NeedPower,
        ),
        26 => {
            let capped = c.res_pop > 500 && c.stadiums == 0;
            world.caps.res = capped;
            capped.then_some((MessageKind::NeedStadium, None))
        }
        28 => {
            let capped = c.ind_pop > 70 && c.seaports == 0;
            world.caps.ind = capped;
            capped.then_some((MessageKind::NeedSeaport, None))
        }
        30 => {
            let capped = c.com_pop > 100 && c.airports == 0;
            world.caps.com = capped;
            capped.then_some((MessageKind::NeedAirport, None))
        }
        32 => {
            let total = c.powered_zones + c.unpowered_zones;
            let short = total > 0 && (c.powered_zones as f64 / total as f64) < 0.7;
            due(short, MessageKind::Blackouts)
        }
        35 => (world.scan.pollution_avg > 60)
            .then_some((MessageKind::HighPollution, Some(world.scan.pollution_max))),
        42 => (world.scan.crime_avg > 100)
            .then_some((MessageKind::HighCrime, Some(world.scan.crime_max))),
        45 => due(total_pop > 60 && c.fire_stations == 0, MessageKind::NeedFireStation),
        48 => due(total_pop > 60 && c.police_stations == 0, MessageKind::NeedPoliceStation),
        51 => due(budget.tax_rate > 12, MessageKind::HighTaxes),
        54 => due(
            budget.road_effect < 20 && c.road_total > 30,
            MessageKind::RoadsNeedFunding,
        ),
        57 => due(budget.fire_effect < 700 && total_pop > 20, MessageKind::FireNeedsFunding),
        60 => due(
            budget.police_effect < 700 && total_pop > 20,
            MessageKind::PoliceNeedsFunding,
        ),
        63 => (world.evaluation.traffic_avg > 60)
            .then_some((MessageKind::TrafficJams, Some(world.scan.traffic_max))),
        _ => None,
    }
}

pub struct MessageSubsystem;

impl MessageSubsystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MessageSubsystem {
    fn default() -> Self { Self::new() }
}

impl SimSubsystem for MessageSubsystem {
    fn name(&self) -> &'static str { "message" }

    fn update(&mut self, phase: Phase, ctx: &mut SimContext<'_>) -> SimResult<Vec<SimEvent>> {
        if phase != Phase::Decay {
            return Ok(vec![]);
        }
        let city_time = ctx.clock.city_time;
        let mut events = Vec::new();

        if city_time % WEEKS_PER_MONTH == 0 {
            if let Some(message) = check_growth(ctx.world) {
                log::info!(
                    "week={city_time} milestone {message:?}: population {}",
                    ctx.world.last_city_pop
                );
                events.push(SimEvent::CityMessage { message, location: None });
            }
        }
        if let Some((message, location)) = send_messages(ctx.world, city_time) {
            events.push(SimEvent::CityMessage { message, location });
        }
        Ok(events)
    }

    fn as_any(&self) -> &dyn std::any::Any { self }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_check_only_records_population() {
        let mut world = WorldState::new(16, 16);
        world.census.res_pop = 200;
        assert_eq!(check_growth(&mut world), None);
        assert_eq!(world.last_city_pop, 4_000);
        world.census.res_pop = 150;
        assert_eq!(check_growth(&mut world), None);
        world.last_city_pop = 1_900;
        world.census.res_pop = 100;
        assert_eq!(check_growth(&mut world), Some(MessageKind::ReachedTown));
    }

    #[test]
    fn stadium_check_sets_and_clears_the_residential_cap() {
        let mut world = WorldState::new(16, 16);
        world.census.res_pop = 600;
        assert_eq!(send_messages(&mut world, 26), Some((MessageKind::NeedStadium, None)));
        assert!(world.caps.res);
        world.census.stadiums = 1;
        assert_eq!(send_messages(&mut world, 64 + 26), None);
        assert!(!world.caps.res);
    }

    #[test]
    fn empty_city_asks_for_residents_first() {
        let mut world = WorldState::new(16, 16);
        assert_eq!(send_messages(&mut world, 1), Some((MessageKind::NeedResidential, None)));
        assert_eq!(send_messages(&mut world, 2), None);
    }
}
