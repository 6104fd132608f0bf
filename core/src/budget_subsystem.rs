//! Municipal finance: tax income, priority-ordered funding of roads,
//! fire and police, and the yearly settlement of the treasury.
//!
//! RULE: Roads are funded first, then fire, then police. The first
//! service that cannot be paid in full takes whatever is left and every
//! service after it gets nothing.
//!
//! RULE: Shortfalls are outcomes, not errors. Funds and percentages
//! are clamped, never rejected.

use crate::{
    clock::{Phase, WEEKS_PER_YEAR},
    config::{GameLevel, SimConfig},
    error::SimResult,
    event::SimEvent,
    subsystem::{SimContext, SimSubsystem},
    world::WorldState,
};
use serde::{Deserialize, Serialize};

pub const FIRE_STATION_MAINTENANCE: i64 = 100;
pub const POLICE_STATION_MAINTENANCE: i64 = 100;
pub const MAX_ROAD_EFFECT: i32 = 32;
pub const MAX_SERVICE_EFFECT: i32 = 1000;
/// Financial history records kept, most recent first.
pub const FINANCIAL_HISTORY_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialRecord {
    pub city_time: u64,
    pub tax_income: i64,
    pub operating_expenses: i64,
    pub total_funds: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetState {
    pub funds: i64,
    pub tax_rate: i32,
    pub road_percent: f64,
    pub fire_percent: f64,
    pub police_percent: f64,
    pub auto_budget: bool,
    /// Tax income accumulated since the last settlement.
    pub tax_fund: i64,
    /// Funding paid out since the last settlement, as negative totals.
    pub road_escrow: i64,
    pub fire_escrow: i64,
    pub police_escrow: i64,
    pub road_effect: i32,
    pub fire_effect: i32,
    pub police_effect: i32,
    /// Revenue minus expenses of the last settlement.
    pub cash_flow: i64,
    pub history: Vec<FinancialRecord>,
}

impl BudgetState {
    pub fn from_config(config: &SimConfig) -> Self {
        Self {
            funds: config.initial_funds(),
            tax_rate: config.tax_rate.clamp(0, 20),
            road_percent: config.road_percent.clamp(0.0, 1.0),
            fire_percent: config.fire_percent.clamp(0.0, 1.0),
            police_percent: config.police_percent.clamp(0.0, 1.0),
            auto_budget: config.auto_budget,
            tax_fund: 0,
            road_escrow: 0,
            fire_escrow: 0,
            police_escrow: 0,
            road_effect: MAX_ROAD_EFFECT,
            fire_effect: MAX_SERVICE_EFFECT,
            police_effect: MAX_SERVICE_EFFECT,
            cash_flow: 0,
            history: Vec::new(),
        }
    }
}

/// What the budget is computed from: the census of the current week.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BudgetInputs {
    pub total_pop: i32,
    pub land_value_avg: i32,
    pub road_tiles: i32,
    pub rail_tiles: i32,
    pub fire_stations: i32,
    pub police_stations: i32,
    pub level: GameLevel,
}

impl BudgetInputs {
    pub fn from_world(world: &WorldState) -> Self {
        Self {
            total_pop: world.total_pop,
            land_value_avg: world.scan.land_value_avg,
            road_tiles: world.census.road_total,
            rail_tiles: world.census.rail_total,
            fire_stations: world.census.fire_stations,
            police_stations: world.census.police_stations,
            level: world.settings.level,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetNumbers {
    pub tax_rate: i32,
    pub tax_income: i64,
    pub previous_balance: i64,
    pub road_request: i64,
    pub fire_request: i64,
    pub police_request: i64,
    pub road_funded: i64,
    pub fire_funded: i64,
    pub police_funded: i64,
    pub road_percent: f64,
    pub fire_percent: f64,
    pub police_percent: f64,
    pub operating_expenses: i64,
    pub new_balance: i64,
}

/// Compute income, requests and the priority-ordered allocation.
pub fn generate_budget(budget: &BudgetState, inputs: &BudgetInputs) -> BudgetNumbers {
    let tax_rate = budget.tax_rate.max(0);
    let road_percent = budget.road_percent.clamp(0.0, 1.0);
    let fire_percent = budget.fire_percent.clamp(0.0, 1.0);
    let police_percent = budget.police_percent.clamp(0.0, 1.0);

    let tax_income = (inputs.total_pop as f64 * inputs.land_value_avg as f64 / 120.0
        * tax_rate as f64
        * inputs.level.tax_multiplier())
    .round() as i64;
    let road_request = ((inputs.road_tiles as f64 + inputs.rail_tiles as f64 * 2.0)
        * inputs.level.road_cost_multiplier())
    .round() as i64;
    let fire_request = FIRE_STATION_MAINTENANCE * inputs.fire_stations as i64;
    let police_request = POLICE_STATION_MAINTENANCE * inputs.police_stations as i64;

    let mut n = BudgetNumbers {
        tax_rate,
        tax_income,
        previous_balance: budget.funds,
        road_request,
        fire_request,
        police_request,
        road_funded: (road_request as f64 * road_percent).round() as i64,
        fire_funded: (fire_request as f64 * fire_percent).round() as i64,
        police_funded: (police_request as f64 * police_percent).round() as i64,
        road_percent,
        fire_percent,
        police_percent,
        operating_expenses: 0,
        new_balance: 0,
    };

    let mut available = (budget.funds + tax_income).max(0);
    if available >= n.road_funded {
        available -= n.road_funded;
        if available >= n.fire_funded {
            available -= n.fire_funded;
            if available < n.police_funded {
                n.police_funded = available;
                n.police_percent = ratio(available, police_request);
            }
        } else {
            n.fire_funded = available;
            n.fire_percent = ratio(available, fire_request);
            n.police_funded = 0;
            n.police_percent = 0.0;
        }
    } else {
        n.road_funded = available;
        n.road_percent = ratio(available, road_request);
        n.fire_funded = 0;
        n.fire_percent = 0.0;
        n.police_funded = 0;
        n.police_percent = 0.0;
    }

    n.operating_expenses = n.road_funded + n.fire_funded + n.police_funded;
    n.new_balance = n.previous_balance + n.tax_income - n.operating_expenses;
    n
}

fn ratio(funded: i64, request: i64) -> f64 {
    if request == 0 {
        return 0.0;
    }
    funded as f64 / request as f64
}

fn effect(funded: i64, request: i64, full: i32) -> i32 {
    if request == 0 {
        return full;
    }
    (full as f64 * funded as f64 / request as f64).floor() as i32
}

/// Weekly accrual: bank this week's income, book this week's funding
/// and refresh the service effects the zone scan reads.
pub fn collect_tax_partial(world: &mut WorldState) -> BudgetNumbers {
    let inputs = BudgetInputs::from_world(world);
    let b = generate_budget(&world.budget, &inputs);
    let budget = &mut world.budget;
    budget.tax_fund += b.tax_income;
    budget.road_escrow -= b.road_funded;
    budget.fire_escrow -= b.fire_funded;
    budget.police_escrow -= b.police_funded;
    budget.road_effect = effect(b.road_funded, b.road_request, MAX_ROAD_EFFECT);
    budget.fire_effect = effect(b.fire_funded, b.fire_request, MAX_SERVICE_EFFECT);
    budget.police_effect = effect(b.police_funded, b.police_request, MAX_SERVICE_EFFECT);
    b
}

/// Yearly settlement: apply the averaged cash flow to the treasury.
pub fn collect_tax(world: &mut WorldState, city_time: u64) -> FinancialRecord {
    let weeks = WEEKS_PER_YEAR as i64;
    let revenue = world.budget.tax_fund / weeks;
    let expenses =
        -(world.budget.road_escrow + world.budget.fire_escrow + world.budget.police_escrow) / weeks;
    let cash_flow = revenue - expenses;
    world.budget.cash_flow = cash_flow;
    world.spend(-cash_flow);

    let budget = &mut world.budget;
    let record = FinancialRecord {
        city_time,
        tax_income: revenue,
        operating_expenses: expenses,
        total_funds: budget.funds,
    };
    budget.history.insert(0, record.clone());
    budget.history.truncate(FINANCIAL_HISTORY_LEN);

    budget.tax_fund = 0;
    budget.road_escrow = 0;
    budget.fire_escrow = 0;
    budget.police_escrow = 0;

    if budget.auto_budget {
        budget.road_percent = 1.0;
        budget.fire_percent = 1.0;
        budget.police_percent = 1.0;
    }
    record
}

pub struct BudgetSubsystem;

impl BudgetSubsystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BudgetSubsystem {
    fn default() -> Self { Self::new() }
}

impl SimSubsystem for BudgetSubsystem {
    fn name(&self) -> &'static str { "budget" }

    fn update(&mut self, phase: Phase, ctx: &mut SimContext<'_>) -> SimResult<Vec<SimEvent>> {
        if phase != Phase::Finance {
            return Ok(vec![]);
        }
        collect_tax_partial(ctx.world);

        let city_time = ctx.clock.city_time;
        if city_time % WEEKS_PER_YEAR != 0 {
            return Ok(vec![]);
        }
        let record = collect_tax(ctx.world, city_time);
        log::debug!(
            "week={city_time} budget: revenue={} expenses={} funds={}",
            record.tax_income,
            record.operating_expenses,
            record.total_funds
        );
        Ok(vec![SimEvent::TaxCollected {
            city_time,
            revenue: record.tax_income,
            expenses: record.operating_expenses,
            cash_flow: ctx.world.budget.cash_flow,
            funds: record.total_funds,
        }])
    }

    fn as_any(&self) -> &dyn std::any::Any { self }
}
