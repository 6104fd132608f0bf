//! Budget allocation, tax accrual and the yearly settlement.

use citysim_core::{
    budget_subsystem::{collect_tax, generate_budget, BudgetInputs},
    config::GameLevel,
    engine::SimEngine,
    world::WorldState,
};

fn inputs(road_tiles: i32, fire: i32, police: i32) -> BudgetInputs {
    BudgetInputs {
        total_pop: 0,
        land_value_avg: 0,
        road_tiles,
        rail_tiles: 0,
        fire_stations: fire,
        police_stations: police,
        level: GameLevel::Medium,
    }
}

#[test]
fn shortfall_cascades_road_then_fire_then_police() {
    let mut world = WorldState::new(32, 32);
    world.budget.funds = 600;

    let n = generate_budget(&world.budget, &inputs(500, 5, 5));

    assert_eq!(n.road_request, 450);
    assert_eq!(n.road_funded, 450);
    assert_eq!(n.fire_funded, 150);
    assert!((n.fire_percent - 0.3).abs() < 1e-9);
    assert_eq!(n.police_funded, 0);
    assert_eq!(n.police_percent, 0.0);
    assert_eq!(n.new_balance, 0);
}

#[test]
fn roads_take_whatever_is_left_when_broke() {
    let mut world = WorldState::new(32, 32);
    world.budget.funds = 300;

    let n = generate_budget(&world.budget, &inputs(1000, 0, 0));

    assert_eq!(n.road_request, 900);
    assert_eq!(n.road_funded, 300);
    assert!((n.road_percent - 1.0 / 3.0).abs() < 1e-9);
    assert_eq!(n.operating_expenses, 300);
}

#[test]
fn tax_income_scales_with_population_land_value_and_rate() {
    let world = WorldState::new(32, 32);
    let mut i = inputs(0, 0, 0);
    i.total_pop = 1000;
    i.land_value_avg = 120;

    let n = generate_budget(&world.budget, &i);

    assert_eq!(n.tax_rate, 7);
    assert_eq!(n.tax_income, 8400);
}

#[test]
fn settlement_averages_the_year_and_resets_escrow() {
    let mut world = WorldState::new(32, 32);
    let start = world.budget.funds;
    world.budget.tax_fund = 4800;
    world.budget.road_escrow = -480;
    world.budget.road_percent = 0.5;

    let record = collect_tax(&mut world, 48);

    assert_eq!(record.tax_income, 100);
    assert_eq!(record.operating_expenses, 10);
    assert_eq!(world.budget.cash_flow, 90);
    assert_eq!(world.budget.funds, start + 90);
    assert_eq!(record.total_funds, start + 90);
    assert_eq!(world.budget.tax_fund, 0);
    assert_eq!(world.budget.road_escrow, 0);
    assert_eq!(world.budget.road_percent, 1.0, "auto budget restores full funding");
    assert_eq!(world.budget.history.first(), Some(&record));
}

#[test]
fn one_year_of_ticks_writes_one_financial_record() {
    let mut engine = SimEngine::build_test("budget-year".into(), 11).unwrap();
    engine.run_ticks(48 * 16).unwrap();

    let store = engine.store();
    assert_eq!(store.financial_record_count("budget-year").unwrap(), 1);
    assert_eq!(store.event_count("budget-year", "tax_collected").unwrap(), 1);
    let history = store.financial_history("budget-year").unwrap();
    assert_eq!(history[0].city_time, 48);
}

#[test]
fn allocation_never_exceeds_what_the_city_can_pay() {
    let funds_cases = [-5000, -1, 0, 150, 600, 10_000];
    let road_cases = [0, 100, 1000];
    let station_cases = [0, 3];
    let pop_cases = [0, 500];
    let percents = [0.0, 0.25, 0.5, 1.0];

    for funds in funds_cases {
        for roads in road_cases {
            for stations in station_cases {
                for pop in pop_cases {
                    for road_pct in percents {
                        for fire_pct in percents {
                            for police_pct in percents {
                                let mut world = WorldState::new(32, 32);
                                world.budget.funds = funds;
                                world.budget.road_percent = road_pct;
                                world.budget.fire_percent = fire_pct;
                                world.budget.police_percent = police_pct;
                                let mut i = inputs(roads, stations, stations);
                                i.total_pop = pop;
                                i.land_value_avg = 60;

                                let n = generate_budget(&world.budget, &i);

                                let case = format!(
                                    "funds={funds} roads={roads} stations={stations} pop={pop} \
                                     pct=({road_pct}, {fire_pct}, {police_pct})"
                                );
                                let funded = n.road_funded + n.fire_funded + n.police_funded;
                                let available = n.previous_balance + n.tax_income;
                                assert!(funded <= available.max(0), "{case}");
                                if available <= 0 {
                                    assert_eq!(funded, 0, "{case}");
                                }
                                for (got, request, pct) in [
                                    (n.road_funded, n.road_request, n.road_percent),
                                    (n.fire_funded, n.fire_request, n.fire_percent),
                                    (n.police_funded, n.police_request, n.police_percent),
                                ] {
                                    assert!((0..=request).contains(&got), "{case}");
                                    assert!((0.0..=1.0).contains(&pct), "{case}");
                                }
                                assert_eq!(n.operating_expenses, funded, "{case}");
                            }
                        }
                    }
                }
            }
        }
    }
}
