//! City snapshot: the clock plus the summary numbers a host needs to
//! show a saved city without replaying the event log.
//!
//! A snapshot is taken at the finance phase every SNAPSHOT_INTERVAL_WEEKS.

use crate::{
    budget_subsystem::BudgetState,
    clock::{SimClock, WEEKS_PER_YEAR},
    evaluation_subsystem::{CityClass, Problem},
    types::{RunId, Tick},
    world::{Census, Valves, WorldState},
};
use serde::{Deserialize, Serialize};

pub const SNAPSHOT_INTERVAL_WEEKS: u64 = WEEKS_PER_YEAR;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetSummary {
    pub funds: i64,
    pub tax_rate: i32,
    pub cash_flow: i64,
    pub road_percent: f64,
    pub fire_percent: f64,
    pub police_percent: f64,
    pub auto_budget: bool,
}

impl From<&BudgetState> for BudgetSummary {
    fn from(b: &BudgetState) -> Self {
        Self {
            funds: b.funds,
            tax_rate: b.tax_rate,
            cash_flow: b.cash_flow,
            road_percent: b.road_percent,
            fire_percent: b.fire_percent,
            police_percent: b.police_percent,
            auto_budget: b.auto_budget,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationSummary {
    pub score: i32,
    pub delta_score: i32,
    pub class: CityClass,
    pub city_pop: i64,
    pub approval: u32,
    pub problems: Vec<(Problem, u32)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitySnapshot {
    pub run_id: RunId,
    pub tick: Tick,
    pub clock: SimClock,
    pub census: Census,
    pub valves: Valves,
    pub budget: BudgetSummary,
    pub evaluation: EvaluationSummary,
}

impl CitySnapshot {
    pub fn capture(clock: &SimClock, world: &WorldState) -> Self {
        let e = &world.evaluation;
        Self {
            run_id: clock.run_id.clone(),
            tick: clock.current_tick,
            clock: clock.clone(),
            census: world.census.clone(),
            valves: world.valves,
            budget: BudgetSummary::from(&world.budget),
            evaluation: EvaluationSummary {
                score: e.score,
                delta_score: e.delta_score,
                class: e.class,
                city_pop: e.city_pop,
                approval: e.yes,
                problems: e.problems.clone(),
            },
        }
    }

    /// Whether the finance phase of `city_time` should be snapshotted.
    pub fn is_due(city_time: u64) -> bool {
        city_time > 0 && city_time % SNAPSHOT_INTERVAL_WEEKS == 0
    }
}
