//! Census: resets the zone-scan counters at the start of every week and
//! rolls them into the history buffers every 4 and every 48 weeks.

use crate::{
    clock::{Phase, WEEKS_PER_MONTH, WEEKS_PER_YEAR},
    error::SimResult,
    event::SimEvent,
    subsystem::{SimContext, SimSubsystem},
    world::{Census, WorldState, HISTORY_LEN, HISTORY_SHORT},
};

pub struct CensusSubsystem;

impl CensusSubsystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CensusSubsystem {
    fn default() -> Self { Self::new() }
}

/// Zero every counter the zone scan accumulates, along with the
/// station maps and the plant registry it rebuilds.
pub fn clear_census(world: &mut WorldState) {
    world.census = Census::default();
    world.power_plants.clear();
    world.fire_station_map.clear();
    world.police_station_map.clear();
}

/// Short-range census: shift the first half of every series by one.
pub fn take_census(world: &mut WorldState) {
    let h = &mut world.history;
    let (mut res_max, mut com_max, mut ind_max) = (0, 0, 0);
    for i in (0..HISTORY_SHORT - 1).rev() {
        res_max = res_max.max(h.res[i]);
        com_max = com_max.max(h.com[i]);
        ind_max = ind_max.max(h.ind[i]);
        h.res[i + 1] = h.res[i];
        h.com[i + 1] = h.com[i];
        h.ind[i + 1] = h.ind[i];
        h.crime[i + 1] = h.crime[i];
        h.pollution[i + 1] = h.pollution[i];
        h.money[i + 1] = h.money[i];
    }
    h.res_max = res_max;
    h.com_max = com_max;
    h.ind_max = ind_max;

    let census = &world.census;
    h.res[0] = census.res_pop / 8;
    h.com[0] = census.com_pop;
    h.ind[0] = census.ind_pop;

    world.crime_ramp += (world.scan.crime_avg - world.crime_ramp) / 4;
    h.crime[0] = world.crime_ramp.min(255);
    world.pollution_ramp += (world.scan.pollution_avg - world.pollution_ramp) / 4;
    h.pollution[0] = world.pollution_ramp.min(255);

    let money = world.budget.cash_flow / 20 + 128;
    h.money[0] = money.clamp(0, 255) as i32;

    let wanted = census.res_pop / 256;
    world.need_hospital = (wanted - census.hospitals).signum();
    world.need_church = (wanted - census.churches).signum();
}

/// Long-range census: shift the second half and copy the current values.
pub fn take_long_census(world: &mut WorldState) {
    let h = &mut world.history;
    for i in (HISTORY_SHORT..HISTORY_LEN - 1).rev() {
        h.res[i + 1] = h.res[i];
        h.com[i + 1] = h.com[i];
        h.ind[i + 1] = h.ind[i];
        h.crime[i + 1] = h.crime[i];
        h.pollution[i + 1] = h.pollution[i];
        h.money[i + 1] = h.money[i];
    }
    let census = &world.census;
    h.res[HISTORY_SHORT] = census.res_pop / 8;
    h.com[HISTORY_SHORT] = census.com_pop;
    h.ind[HISTORY_SHORT] = census.ind_pop;
    h.crime[HISTORY_SHORT] = h.crime[0];
    h.pollution[HISTORY_SHORT] = h.pollution[0];
    h.money[HISTORY_SHORT] = h.money[0];
}

impl SimSubsystem for CensusSubsystem {
    fn name(&self) -> &'static str { "census" }

    fn update(&mut self, phase: Phase, ctx: &mut SimContext<'_>) -> SimResult<Vec<SimEvent>> {
        match phase {
            Phase::WeekStart => {
                clear_census(ctx.world);
                Ok(vec![])
            }
            Phase::Finance => {
                let city_time = ctx.clock.city_time;
                if city_time % WEEKS_PER_MONTH != 0 {
                    return Ok(vec![]);
                }
                take_census(ctx.world);
                if city_time % WEEKS_PER_YEAR == 0 {
                    take_long_census(ctx.world);
                }
                let c = &ctx.world.census;
                log::debug!(
                    "week={city_time} census: res={} com={} ind={} zones={} powered={}/{}",
                    c.res_pop,
                    c.com_pop,
                    c.ind_pop,
                    c.zone_total(),
                    c.powered_zones,
                    c.powered_zones + c.unpowered_zones
                );
                Ok(vec![SimEvent::CensusChanged {
                    city_time,
                    res_pop: c.res_pop,
                    com_pop: c.com_pop,
                    ind_pop: c.ind_pop,
                }])
            }
            _ => Ok(vec![]),
        }
    }

    fn as_any(&self) -> &dyn std::any::Any { self }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn census_shifts_history_and_sets_needs() {
        let mut world = WorldState::new(16, 16);
        world.census.res_pop = 800;
        world.census.com_pop = 12;
        world.census.hospitals = 5;
        world.history.res[0] = 40;
        take_census(&mut world);
        assert_eq!(world.history.res[0], 100);
        assert_eq!(world.history.res[1], 40);
        assert_eq!(world.history.com[0], 12);
        assert_eq!(world.history.money[0], 128);
        assert_eq!(world.need_hospital, -1);
        assert_eq!(world.need_church, 1);
    }

    #[test]
    fn long_census_copies_short_values() {
        let mut world = WorldState::new(16, 16);
        world.census.ind_pop = 9;
        world.history.crime[0] = 77;
        take_long_census(&mut world);
        assert_eq!(world.history.ind[HISTORY_SHORT], 9);
        assert_eq!(world.history.crime[HISTORY_SHORT], 77);
    }
}
