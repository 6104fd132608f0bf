//! Demand valves: the residential, commercial and industrial demand
//! signals, recomputed every other week from the census history.

use crate::{
    clock::Phase,
    config::GameLevel,
    error::SimResult,
    event::SimEvent,
    subsystem::{SimContext, SimSubsystem},
    world::{Valves, WorldState},
};

pub const RES_VALVE_RANGE: i32 = 2000;
pub const COM_VALVE_RANGE: i32 = 1500;
pub const IND_VALVE_RANGE: i32 = 1500;

const BIRTH_RATE: f64 = 0.02;
const MAX_LABOR_BASE: f64 = 1.3;
const MAX_RATIO: f64 = 2.0;

/// Demand bias per effective tax rate (tax rate plus difficulty index).
const TAX_TABLE: [i32; 21] = [
    200, 150, 120, 100, 80, 50, 30, 0, -10, -40, -100, -150, -200, -250, -300, -350, -400,
    -450, -500, -550, -600,
];

pub struct DemandSubsystem;

impl DemandSubsystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DemandSubsystem {
    fn default() -> Self { Self::new() }
}

/// Push the valves toward projected demand. Also refreshes the
/// normalized total population used by taxes and advisories.
pub fn set_valves(world: &mut WorldState) -> Valves {
    let census = &world.census;
    let history = &world.history;
    let level: GameLevel = world.settings.level;

    let norm_res = census.res_pop as f64 / 8.0;
    let com = census.com_pop as f64;
    let ind = census.ind_pop as f64;
    world.total_pop = (norm_res + com + ind) as i32;

    let jobs = (history.com[1] + history.ind[1]) as f64;
    let employment = if norm_res != 0.0 { jobs / norm_res } else { 1.0 };
    let migration = norm_res * (employment - 1.0);
    let births = norm_res * BIRTH_RATE;
    let projected_res = norm_res + migration + births;

    let labor_base = if jobs != 0.0 { history.res[1] as f64 / jobs } else { 1.0 };
    let labor_base = labor_base.clamp(0.0, MAX_LABOR_BASE);

    let internal_market = (norm_res + com + ind) / 3.7;
    let projected_com = internal_market * labor_base;
    let projected_ind = (ind * labor_base * level.industry_market()).max(5.0);

    let res_ratio = if norm_res != 0.0 { projected_res / norm_res } else { 1.3 };
    let com_ratio = if com != 0.0 { projected_com / com } else { projected_com };
    let ind_ratio = if ind != 0.0 { projected_ind / ind } else { projected_ind };

    let tax_index = (world.budget.tax_rate + level.index()).clamp(0, 20) as usize;
    let bias = TAX_TABLE[tax_index] as f64;
    let velocity = |ratio: f64| ((ratio.min(MAX_RATIO) - 1.0) * 600.0 + bias) as i32;

    let valves = &mut world.valves;
    valves.res = (valves.res + velocity(res_ratio)).clamp(-RES_VALVE_RANGE, RES_VALVE_RANGE);
    valves.com = (valves.com + velocity(com_ratio)).clamp(-COM_VALVE_RANGE, COM_VALVE_RANGE);
    valves.ind = (valves.ind + velocity(ind_ratio)).clamp(-IND_VALVE_RANGE, IND_VALVE_RANGE);

    if world.caps.res {
        valves.res = valves.res.min(0);
    }
    if world.caps.com {
        valves.com = valves.com.min(0);
    }
    if world.caps.ind {
        valves.ind = valves.ind.min(0);
    }
    *valves
}

impl SimSubsystem for DemandSubsystem {
    fn name(&self) -> &'static str { "demand" }

    fn update(&mut self, phase: Phase, ctx: &mut SimContext<'_>) -> SimResult<Vec<SimEvent>> {
        if phase != Phase::WeekStart || ctx.clock.sim_cycle % 2 != 0 {
            return Ok(vec![]);
        }
        let v = set_valves(ctx.world);
        log::debug!(
            "week={} valves: res={} com={} ind={}",
            ctx.clock.city_time,
            v.res,
            v.com,
            v.ind
        );
        Ok(vec![SimEvent::DemandChanged { res: v.res, com: v.com, ind: v.ind }])
    }

    fn as_any(&self) -> &dyn std::any::Any { self }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_city_wants_residents() {
        let mut world = WorldState::new(32, 32);
        let v = set_valves(&mut world);
        // res ratio 1.3 → +180, plus the tax bias at rate 7 + medium (-10).
        assert_eq!(v.res, 170);
        // com ratio is the projected population itself: 0 → -600 - 10.
        assert_eq!(v.com, -610);
        // ind ratio floors at 5, capped to 2 → +600 - 10.
        assert_eq!(v.ind, 590);
    }

    #[test]
    fn valves_stay_clamped_and_capped() {
        let mut world = WorldState::new(32, 32);
        world.caps.ind = true;
        for _ in 0..50 {
            set_valves(&mut world);
        }
        assert!(world.valves.res <= RES_VALVE_RANGE);
        assert!(world.valves.com >= -COM_VALVE_RANGE);
        assert_eq!(world.valves.ind, 0);
    }
}
