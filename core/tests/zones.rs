//! Zone scan: power, census and desirability of zone centers.

use citysim_core::{
    edit::{self, ZoneKind},
    engine::SimEngine,
    tiles::{FREEZ, ROADS},
    traffic::TrafficResult,
    types::Position,
    world::WorldState,
    zone::{self, commercial_desirability, industrial_desirability, residential_desirability},
};

#[test]
fn unpowered_zones_are_undesirable() {
    let mut world = WorldState::new(32, 32);
    world.valves.res = 2000;
    world.valves.com = 2000;
    world.valves.ind = 2000;
    let pos = Position::new(10, 10);

    assert_eq!(residential_desirability(&world, pos, false, TrafficResult::Reached), -500);
    assert_eq!(commercial_desirability(&world, pos, false, TrafficResult::Reached), -500);
    assert_eq!(industrial_desirability(&world, false, TrafficResult::Reached), -500);
    assert_eq!(industrial_desirability(&world, true, TrafficResult::NoRoad), 1000);
}

#[test]
fn one_week_counts_an_unpowered_zone() {
    let mut engine = SimEngine::build_test("zones-dark".into(), 4).unwrap();
    engine
        .edit(|w| edit::place_zone(w, Position::new(40, 40), ZoneKind::Residential))
        .unwrap()
        .unwrap();

    // Week start plus the eight row bands.
    engine.run_ticks(9).unwrap();

    let census = &engine.world().census;
    assert_eq!(census.res_zones, 1);
    assert_eq!(census.unpowered_zones, 1);
    assert_eq!(census.powered_zones, 0);
}

#[test]
fn bands_cover_every_row_once() {
    let height = 100;
    let mut rows: Vec<i32> = (0..8).flat_map(|b| zone::band_rows(height, b)).collect();
    rows.dedup();
    assert_eq!(rows, (0..height).collect::<Vec<_>>());
}

#[test]
fn placed_zone_is_a_powerless_empty_lot() {
    let mut world = WorldState::new(32, 32);
    edit::place_zone(&mut world, Position::new(10, 10), ZoneKind::Residential).unwrap();

    assert_eq!(world.get_tile(10, 10), FREEZ);
    assert!(!world.is_tile_powered(10, 10));
    assert!(edit::place_zone(&mut world, Position::new(11, 11), ZoneKind::Commercial).is_err());
}

#[test]
fn zone_needs_clear_ground() {
    let mut world = WorldState::new(32, 32);
    world.place(20, 20, ROADS);
    let funds = world.budget.funds;

    assert!(edit::place_zone(&mut world, Position::new(20, 21), ZoneKind::Industrial).is_err());
    assert_eq!(world.budget.funds, funds, "refused edits are free");
}
