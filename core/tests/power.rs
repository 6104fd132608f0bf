//! Power distribution: plant registry, capacity and brownouts.

use citysim_core::{
    engine::SimEngine,
    power_subsystem::{power_scan, COAL_CAPACITY},
    tiles::LHPOWER,
    types::Position,
    world::WorldState,
};

fn wire_row(world: &mut WorldState, y: i32, last_x: i32) {
    for x in 1..=last_x {
        world.place(x, y, LHPOWER);
    }
}

#[test]
fn short_line_is_fully_powered() {
    let mut world = WorldState::new(32, 16);
    world.census.coal_plants = 1;
    for x in 6..=15 {
        world.place(x, 5, LHPOWER);
    }
    world.power_plants.push(Position::new(5, 5));

    let outcome = power_scan(&mut world);

    assert!(!outcome.brownout);
    assert_eq!(outcome.visited, 11);
    assert_eq!(outcome.capacity, COAL_CAPACITY);
    assert!(world.has_power(15, 5));
    assert!(!world.has_power(16, 5));
    assert!(world.power_plants.is_empty(), "the scan consumes the registry");
}

#[test]
fn undersupply_darkens_the_plant_registered_first() {
    let mut world = WorldState::new(400, 16);
    wire_row(&mut world, 2, 350);
    wire_row(&mut world, 8, 350);
    world.census.coal_plants = 1;
    // LIFO: the plant pushed last is walked first.
    world.power_plants.push(Position::new(0, 2));
    world.power_plants.push(Position::new(0, 8));

    let outcome = power_scan(&mut world);

    assert!(outcome.brownout);
    assert_eq!(outcome.visited, COAL_CAPACITY);
    assert!(world.has_power(350, 8), "second plant's line is fully fed");
    assert!(world.has_power(348, 2));
    assert!(!world.has_power(349, 2), "capacity runs out one short of x=349");
}

#[test]
fn plant_powers_adjacent_zone_within_two_weeks() {
    use citysim_core::edit::{self, ZoneKind};

    let mut engine = SimEngine::build_test("power-zone".into(), 5).unwrap();
    engine
        .edit(|w| {
            edit::place_zone(w, Position::new(10, 10), ZoneKind::CoalPlant)?;
            edit::place_zone(w, Position::new(14, 10), ZoneKind::Residential)
        })
        .unwrap()
        .unwrap();

    engine.run_ticks(25).unwrap();

    let world = engine.world();
    assert!(world.has_power(14, 10));
    assert!(world.is_tile_powered(14, 10), "zone scan copied the power bit");
}
