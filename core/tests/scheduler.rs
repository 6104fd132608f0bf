//! Clock, pause semantics, snapshots, listeners and player commands.

use citysim_core::{
    clock::SimSpeed,
    command::PlayerCommand,
    error::SimError,
    edit,
    engine::SimEngine,
    event::{CityListener, SimEvent},
    snapshot::CitySnapshot,
    types::Position,
};
use std::sync::{Arc, Mutex};

struct Recorder(Arc<Mutex<Vec<String>>>);

impl CityListener for Recorder {
    fn on_event(&mut self, event: &SimEvent) {
        self.0.lock().unwrap().push(event.type_name().to_string());
    }
}

#[test]
fn city_time_advances_on_week_start() {
    let mut engine = SimEngine::build_test("sched-time".into(), 1).unwrap();
    assert_eq!(engine.clock.city_time, 0);

    engine.tick().unwrap();
    assert_eq!(engine.clock.current_tick, 1);
    assert_eq!(engine.clock.city_time, 1);

    engine.run_ticks(15).unwrap();
    assert_eq!(engine.clock.city_time, 1);
    engine.run_ticks(1).unwrap();
    assert_eq!(engine.clock.city_time, 2);
}

#[test]
#[should_panic(expected = "tick() called on paused engine")]
fn ticking_a_paused_engine_panics() {
    let mut engine = SimEngine::build_test("sched-panic".into(), 1).unwrap();
    engine.apply_command(PlayerCommand::Pause).unwrap();
    let _ = engine.tick();
}

#[test]
fn run_ticks_is_a_no_op_while_paused() {
    let mut engine = SimEngine::build_test("sched-pause".into(), 1).unwrap();
    engine.apply_command(PlayerCommand::Pause).unwrap();
    engine.run_ticks(100).unwrap();
    assert_eq!(engine.clock.current_tick, 0);

    engine.apply_command(PlayerCommand::Resume).unwrap();
    engine.run_ticks(3).unwrap();
    assert_eq!(engine.clock.current_tick, 3);
}

#[test]
fn run_initialized_is_logged_once() {
    let mut engine = SimEngine::build_test("sched-init".into(), 77).unwrap();
    engine.run_ticks(2).unwrap();
    engine.run_ticks(2).unwrap();

    assert_eq!(engine.store().event_count("sched-init", "run_initialized").unwrap(), 1);
    let first = &engine.store_events_for_tick("sched-init", 0).unwrap()[0];
    assert_eq!(first.event_type, "run_initialized");
    assert!(first.payload.contains("77"));
}

#[test]
fn snapshot_lands_on_the_first_year_end() {
    let mut engine = SimEngine::build_test("sched-snap".into(), 1).unwrap();
    engine.run_ticks(761).unwrap();
    assert_eq!(engine.store().latest_snapshot_before("sched-snap", 10_000).unwrap(), None);

    engine.run_ticks(1).unwrap();
    let (tick, json) = engine
        .store()
        .latest_snapshot_before("sched-snap", 10_000)
        .unwrap()
        .expect("snapshot after the year-end finance phase");
    assert_eq!(tick, 762);
    let snapshot: CitySnapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(snapshot.clock.city_time, 48);
    assert_eq!(snapshot.tick, 762);
}

#[test]
fn listeners_hear_ticks_and_edits() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut engine = SimEngine::build_test("sched-listen".into(), 1).unwrap();
    engine.register_listener(Box::new(Recorder(seen.clone())));

    engine
        .edit(|w| edit::lay_road(w, Position::new(5, 5)))
        .unwrap()
        .unwrap();
    // Demand is refreshed every second week.
    engine.run_ticks(17).unwrap();

    let seen = seen.lock().unwrap();
    assert!(seen.iter().any(|t| t == "tile_changed"));
    assert!(seen.iter().any(|t| t == "funds_changed"));
    assert!(seen.iter().any(|t| t == "run_initialized"));
    assert!(seen.iter().any(|t| t == "demand_changed"));
}

#[test]
fn commands_are_clamped_and_logged() {
    let mut engine = SimEngine::build_test("sched-cmd".into(), 1).unwrap();

    engine.apply_command(PlayerCommand::SetTaxRate { rate: 55 }).unwrap();
    assert_eq!(engine.world().budget.tax_rate, 20);

    engine
        .apply_command(PlayerCommand::SetFunding { road: 1.5, fire: -0.2, police: 0.5 })
        .unwrap();
    let budget = &engine.world().budget;
    assert_eq!(budget.road_percent, 1.0);
    assert_eq!(budget.fire_percent, 0.0);
    assert_eq!(budget.police_percent, 0.5);

    let funds = engine.world().budget.funds;
    engine.apply_command(PlayerCommand::Spend { amount: 250 }).unwrap();
    assert_eq!(engine.world().budget.funds, funds - 250);

    let events = engine
        .apply_command(PlayerCommand::SetDisasters { enabled: true })
        .unwrap();
    assert!(engine.world().settings.disasters_enabled);
    assert!(events
        .iter()
        .any(|e| matches!(e, SimEvent::OptionsChanged { disasters_enabled: true, .. })));

    assert_eq!(
        engine.store().event_count("sched-cmd", "player_command_received").unwrap(),
        4
    );
}

#[test]
fn frames_follow_the_selected_speed() {
    let mut engine = SimEngine::build_test("sched-frame".into(), 1).unwrap();

    engine.run_frame().unwrap();
    assert_eq!(engine.clock.current_tick, 2);

    engine.apply_command(PlayerCommand::SetSpeed { speed: SimSpeed::Fast }).unwrap();
    engine.run_frame().unwrap();
    assert_eq!(engine.clock.current_tick, 10);

    engine.apply_command(PlayerCommand::SetSpeed { speed: SimSpeed::Slow }).unwrap();
    engine.run_frame().unwrap();
    assert_eq!(engine.clock.current_tick, 11);
}

#[test]
fn negative_spend_is_refused() {
    let mut engine = SimEngine::build_test("sched-credit".into(), 1).unwrap();
    let funds = engine.world().budget.funds;

    let result = engine.apply_command(PlayerCommand::Spend { amount: -5000 });

    assert!(matches!(result, Err(SimError::InvalidCommand { .. })));
    assert_eq!(engine.world().budget.funds, funds);
    assert_eq!(
        engine.store().event_count("sched-credit", "funds_changed").unwrap(),
        0
    );
}
