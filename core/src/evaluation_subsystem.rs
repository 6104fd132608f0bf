//! Yearly city evaluation: assessed value, population class, the
//! problem poll, the composite score and the approval poll.
//!
//! RULE: Problem ranking is a stable sort by votes, descending. Ties
//! keep the declaration order of `Problem`.

use crate::{
    clock::{Phase, WEEKS_PER_YEAR},
    error::SimResult,
    event::SimEvent,
    rng::CityRng,
    subsystem::{SimContext, SimSubsystem},
    world::WorldState,
};
use serde::{Deserialize, Serialize};

pub const NEUTRAL_SCORE: i32 = 500;
pub const MAX_SCORE: i32 = 1000;
const VOTE_DRAW: i32 = 300;
const MAX_VOTES: u32 = 100;
const MAX_VOTE_TRIALS: u32 = 600;
const MAX_REPORTED_PROBLEMS: usize = 4;
const APPROVAL_TRIALS: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Problem {
    Crime,
    Pollution,
    Housing,
    Taxes,
    Traffic,
    Unemployment,
    Fire,
}

impl Problem {
    pub const ALL: [Problem; 7] = [
        Self::Crime,
        Self::Pollution,
        Self::Housing,
        Self::Taxes,
        Self::Traffic,
        Self::Unemployment,
        Self::Fire,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CityClass {
    #[default]
    Village,
    Town,
    City,
    Capital,
    Metropolis,
    Megalopolis,
}

impl CityClass {
    pub fn for_population(pop: i64) -> Self {
        match pop {
            p if p > 500_000 => Self::Megalopolis,
            p if p > 100_000 => Self::Metropolis,
            p if p > 50_000 => Self::Capital,
            p if p > 10_000 => Self::City,
            p if p > 2_000 => Self::Town,
            _ => Self::Village,
        }
    }

    pub fn index(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationState {
    pub score: i32,
    pub delta_score: i32,
    pub class: CityClass,
    pub city_pop: i64,
    pub delta_pop: i64,
    pub assessed_value: i64,
    pub yes: u32,
    pub no: u32,
    /// Raw problem severities, in `Problem::ALL` order.
    pub problem_scores: [i32; 7],
    /// Reported problems with their votes, most votes first.
    pub problems: Vec<(Problem, u32)>,
    pub traffic_avg: i32,
}

impl Default for EvaluationState {
    fn default() -> Self {
        Self {
            score: NEUTRAL_SCORE,
            delta_score: 0,
            class: CityClass::Village,
            city_pop: 0,
            delta_pop: 0,
            assessed_value: 0,
            yes: 0,
            no: 0,
            problem_scores: [0; 7],
            problems: Vec::new(),
            traffic_avg: 0,
        }
    }
}

impl EvaluationState {
    /// Neutral state of a city nobody lives in.
    fn reset(&mut self) {
        self.yes = 0;
        self.no = 0;
        self.assessed_value = 0;
        self.class = CityClass::Village;
        self.score = NEUTRAL_SCORE;
        self.delta_score = 0;
        self.problems.clear();
    }
}

/// Run the full evaluation pipeline, or reset to neutral when the city
/// is empty.
pub fn evaluate_city(world: &mut WorldState, rng: &mut CityRng) {
    if world.total_pop == 0 {
        world.evaluation.reset();
        return;
    }
    world.evaluation.assessed_value = assessed_value(world);
    update_population(world);
    rank_problems(world, rng);
    let new_score = compute_score(world);
    let eval = &mut world.evaluation;
    let old = eval.score;
    eval.score = ((old as f64 + new_score) / 2.0).round() as i32;
    eval.delta_score = eval.score - old;
    vote(world, rng);
}

fn assessed_value(world: &WorldState) -> i64 {
    let c = &world.census;
    let weighted = c.road_total as i64 * 5
        + c.rail_total as i64 * 10
        + c.police_stations as i64 * 1000
        + c.fire_stations as i64 * 1000
        + c.hospitals as i64 * 400
        + c.stadiums as i64 * 3000
        + c.seaports as i64 * 5000
        + c.airports as i64 * 10000
        + c.coal_plants as i64 * 3000
        + c.nuclear_plants as i64 * 6000;
    weighted * 1000
}

fn update_population(world: &mut WorldState) {
    let pop = world.census.city_population();
    let eval = &mut world.evaluation;
    eval.delta_pop = pop - eval.city_pop;
    eval.city_pop = pop;
    eval.class = CityClass::for_population(pop);
}

/// Mean traffic density over land-valued cells, scaled by 2.4.
pub fn traffic_average(world: &WorldState) -> i32 {
    let mut total = 0i64;
    let mut count = 1i64;
    for (x, y) in world.land_value.coords() {
        if world.land_value.get(x, y) != 0 {
            total += world.traffic_density.get(x, y) as i64;
            count += 1;
        }
    }
    (total as f64 / count as f64 * 2.4).round() as i32
}

pub fn unemployment(world: &WorldState) -> i32 {
    let jobs = (world.census.com_pop + world.census.ind_pop) * 8;
    if jobs == 0 {
        return 0;
    }
    let r = world.census.res_pop as f64 / jobs as f64;
    (((r - 1.0) * 255.0).floor() as i32).min(255)
}

pub fn fire_severity(world: &WorldState) -> i32 {
    (world.census.fire_pop * 5).min(255)
}

fn rank_problems(world: &mut WorldState, rng: &mut CityRng) {
    let traffic = traffic_average(world);
    world.evaluation.traffic_avg = traffic;
    let scores = [
        world.scan.crime_avg,
        world.scan.pollution_avg,
        (world.scan.land_value_avg as f64 * 0.7).round() as i32,
        world.budget.tax_rate * 10,
        traffic,
        unemployment(world),
        fire_severity(world),
    ];
    world.evaluation.problem_scores = scores;

    let votes = vote_problems(&scores, rng);
    let mut ranked: Vec<(Problem, u32)> =
        Problem::ALL.iter().copied().zip(votes.iter().copied()).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    world.evaluation.problems = ranked
        .into_iter()
        .take_while(|(_, v)| *v != 0)
        .take(MAX_REPORTED_PROBLEMS)
        .collect();
}

/// Round-robin poll: each trial asks the next problem in turn.
pub fn vote_problems(scores: &[i32; 7], rng: &mut CityRng) -> [u32; 7] {
    let mut votes = [0u32; 7];
    let mut cast = 0;
    let mut problem = 0;
    let mut trials = 0;
    while cast < MAX_VOTES && trials < MAX_VOTE_TRIALS {
        if rng.random(VOTE_DRAW) < scores[problem] {
            votes[problem] += 1;
            cast += 1;
        }
        problem = (problem + 1) % scores.len();
        trials += 1;
    }
    votes
}

fn compute_score(world: &WorldState) -> f64 {
    let eval = &world.evaluation;
    let budget = &world.budget;

    let sum: i32 = eval.problem_scores.iter().sum();
    let pressure = (sum / 3).min(256);
    let mut z = (1000.0 - 4.0 * pressure as f64).clamp(0.0, 1000.0);

    for capped in [world.caps.res, world.caps.com, world.caps.ind] {
        if capped {
            z *= 0.85;
        }
    }
    if budget.road_effect < 32 {
        z -= (32 - budget.road_effect) as f64;
    }
    if budget.police_effect < 1000 {
        z *= 0.9 + budget.police_effect as f64 / 10000.1;
    }
    if budget.fire_effect < 1000 {
        z *= 0.9 + budget.fire_effect as f64 / 10000.1;
    }
    for valve in [world.valves.res, world.valves.com, world.valves.ind] {
        if valve < -1000 {
            z *= 0.85;
        }
    }

    z *= growth_multiplier(eval.city_pop, eval.delta_pop);
    z -= fire_severity(world) as f64;
    z -= budget.tax_rate as f64;

    let zones = world.census.powered_zones + world.census.unpowered_zones;
    if zones != 0 {
        z *= world.census.powered_zones as f64 / zones as f64;
    }
    z.clamp(0.0, MAX_SCORE as f64)
}

/// Score multiplier for population change since the last evaluation.
pub fn growth_multiplier(pop: i64, delta: i64) -> f64 {
    if (pop == 0 && delta == 0) || delta == pop {
        1.0
    } else if delta > 0 {
        delta as f64 / pop as f64 + 1.0
    } else if delta < 0 {
        0.95 + delta as f64 / (pop - delta) as f64
    } else {
        1.0
    }
}

fn vote(world: &mut WorldState, rng: &mut CityRng) {
    let score = world.evaluation.score;
    let yes = (0..APPROVAL_TRIALS)
        .filter(|_| rng.random(MAX_SCORE) < score)
        .count() as u32;
    world.evaluation.yes = yes;
    world.evaluation.no = APPROVAL_TRIALS - yes;
}

pub struct EvaluationSubsystem;

impl EvaluationSubsystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for EvaluationSubsystem {
    fn default() -> Self { Self::new() }
}

impl SimSubsystem for EvaluationSubsystem {
    fn name(&self) -> &'static str { "evaluation" }

    fn update(&mut self, phase: Phase, ctx: &mut SimContext<'_>) -> SimResult<Vec<SimEvent>> {
        let city_time = ctx.clock.city_time;
        if phase != Phase::Finance || city_time % WEEKS_PER_YEAR != 0 {
            return Ok(vec![]);
        }
        evaluate_city(ctx.world, ctx.rng);
        let e = &ctx.world.evaluation;
        log::debug!(
            "week={city_time} evaluation: score={} class={:?} approval={}% problems={:?}",
            e.score,
            e.class,
            e.yes,
            e.problems
        );
        Ok(vec![SimEvent::EvaluationChanged {
            city_time,
            score: e.score,
            delta_score: e.delta_score,
            population: e.city_pop,
            class: e.class.index(),
            approval: e.yes,
        }])
    }

    fn as_any(&self) -> &dyn std::any::Any { self }
}
