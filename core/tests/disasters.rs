//! Player-triggered and scenario disasters.

use citysim_core::{
    command::PlayerCommand,
    config::{ScenarioConfig, ScenarioDisaster, SimConfig},
    disaster_subsystem::{find_nuclear_plant, DisasterKind},
    edit::{self, ZoneKind},
    engine::{SimEngine, ENGINE_VERSION},
    error::SimError,
    event::{MessageKind, SimEvent},
    sprite_subsystem::SpriteKind,
    store::SimStore,
    types::Position,
};

#[test]
fn meltdown_without_a_plant_is_refused() {
    let mut engine = SimEngine::build_test("dis-none".into(), 1).unwrap();
    let result = engine.apply_command(PlayerCommand::TriggerDisaster { kind: DisasterKind::Meltdown });
    assert!(matches!(result, Err(SimError::InvalidCommand { .. })));
}

#[test]
fn meltdown_destroys_the_plant() {
    let mut engine = SimEngine::build_test("dis-melt".into(), 1).unwrap();
    engine
        .edit(|w| edit::place_zone(w, Position::new(50, 50), ZoneKind::NuclearPlant))
        .unwrap()
        .unwrap();
    assert!(find_nuclear_plant(engine.world()).is_some());

    let events = engine
        .apply_command(PlayerCommand::TriggerDisaster { kind: DisasterKind::Meltdown })
        .unwrap();

    assert!(find_nuclear_plant(engine.world()).is_none());
    assert!(events.iter().any(|e| matches!(
        e,
        SimEvent::CityMessage { message: MessageKind::MeltdownReported, .. }
    )));
}

#[test]
fn tornado_spawns_a_sprite() {
    let mut engine = SimEngine::build_test("dis-tornado".into(), 1).unwrap();
    engine
        .apply_command(PlayerCommand::TriggerDisaster { kind: DisasterKind::Tornado })
        .unwrap();
    assert!(engine.world().has_sprite(SpriteKind::Tornado));
}

#[test]
fn earthquake_is_announced() {
    let mut engine = SimEngine::build_test("dis-quake".into(), 1).unwrap();
    let events = engine
        .apply_command(PlayerCommand::TriggerDisaster { kind: DisasterKind::Earthquake })
        .unwrap();
    assert!(events.contains(&SimEvent::EarthquakeStarted));
}

#[test]
fn scenario_earthquake_strikes_when_the_countdown_ends() {
    let config = SimConfig {
        scenario: Some(ScenarioConfig {
            name: "quake".into(),
            disaster: ScenarioDisaster::Earthquake,
            wait: 2,
        }),
        ..SimConfig::default_test()
    };
    let store = SimStore::in_memory().unwrap();
    store.migrate().unwrap();
    store.insert_run("dis-scenario", 1, ENGINE_VERSION).unwrap();
    let mut engine = SimEngine::build("dis-scenario".into(), 1, store, &config);

    engine.run_ticks(16).unwrap();
    assert_eq!(engine.store().event_count("dis-scenario", "earthquake_started").unwrap(), 0);

    engine.run_ticks(16).unwrap();
    assert_eq!(engine.store().event_count("dis-scenario", "earthquake_started").unwrap(), 1);

    engine.run_ticks(64).unwrap();
    assert_eq!(engine.store().event_count("dis-scenario", "earthquake_started").unwrap(), 1);
}
