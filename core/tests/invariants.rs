//! Range invariants that must hold after every simulated week of a
//! populated, powered city.

use citysim_core::{
    clock::{PHASES_PER_WEEK, WEEKS_PER_YEAR},
    config::SimConfig,
    edit::{self, ZoneKind},
    engine::{SimEngine, ENGINE_VERSION},
    error::SimResult,
    store::SimStore,
    types::Position,
    world::WorldState,
};

const YEARS: u64 = 3;
const ROAD_ROWS: [i32; 4] = [20, 28, 36, 44];
const ZONES_PER_ROW: i32 = 30;

/// Four main roads lined with zones on both sides, fed by a coal and a
/// nuclear plant through a trunk line west of the zones.
fn lay_out(world: &mut WorldState) -> SimResult<()> {
    let kinds = [
        ZoneKind::Residential,
        ZoneKind::Residential,
        ZoneKind::Commercial,
        ZoneKind::Industrial,
    ];
    for &y in &ROAD_ROWS {
        edit::lay_line(world, Position::new(10, y), Position::new(99, y), edit::lay_road)?;
        for i in 0..ZONES_PER_ROW {
            let x = 11 + 3 * i;
            let kind = kinds[i as usize % kinds.len()];
            edit::place_zone(world, Position::new(x, y - 2), kind)?;
            edit::place_zone(world, Position::new(x, y + 2), kind)?;
        }
    }
    edit::place_zone(world, Position::new(6, 15), ZoneKind::CoalPlant)?;
    edit::place_zone(world, Position::new(6, 30), ZoneKind::NuclearPlant)?;
    edit::lay_line(world, Position::new(9, 14), Position::new(9, 48), edit::lay_wire)?;
    Ok(())
}

fn build_city(seed: u64) -> SimEngine {
    let run_id = format!("invariants-{seed}");
    let config = SimConfig {
        starting_funds: Some(100_000),
        ..SimConfig::default_test()
    };
    let store = SimStore::in_memory().unwrap();
    store.migrate().unwrap();
    store.insert_run(&run_id, seed, ENGINE_VERSION).unwrap();
    let mut engine = SimEngine::build(run_id, seed, store, &config);
    engine.edit(lay_out).unwrap().expect("layout");
    engine
}

fn assert_ranges(world: &WorldState, week: u64) {
    for (x, y) in world.crime.coords() {
        let v = world.crime.get(x, y);
        assert!((0..=250).contains(&v), "week {week}: crime {v} at ({x}, {y})");
    }
    for (x, y) in world.pollution.coords() {
        let v = world.pollution.get(x, y);
        assert!((0..=255).contains(&v), "week {week}: pollution {v} at ({x}, {y})");
    }
    let valves = world.valves;
    assert!((-2000..=2000).contains(&valves.res), "week {week}: {valves:?}");
    assert!((-1500..=1500).contains(&valves.com), "week {week}: {valves:?}");
    assert!((-1500..=1500).contains(&valves.ind), "week {week}: {valves:?}");
    let e = &world.evaluation;
    assert!((0..=1000).contains(&e.score), "week {week}: score {}", e.score);
    assert!(e.problems.len() <= 4, "week {week}: {:?}", e.problems);
}

#[test]
fn populated_city_stays_in_range_every_week() {
    for seed in 1..=3 {
        let mut engine = build_city(seed);

        for week in 1..=YEARS * WEEKS_PER_YEAR {
            engine.run_ticks(PHASES_PER_WEEK).unwrap();
            assert_ranges(engine.world(), week);
        }

        let world = engine.world();
        assert!(world.census.powered_zones > 0, "seed {seed}: the grid never came up");
        assert!(world.census.city_population() > 0, "seed {seed}: nobody moved in");
    }
}
