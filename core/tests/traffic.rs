//! Trip generation over the road network.

use citysim_core::{
    edit::{self, ZoneKind},
    rng::CityRng,
    traffic::{make_traffic, TrafficResult, TripOrigin, MAX_TRAFFIC_DISTANCE},
    types::Position,
    world::WorldState,
};

const HOME: Position = Position::new(10, 10);

fn town() -> WorldState {
    let mut world = WorldState::new(32, 32);
    edit::place_zone(&mut world, HOME, ZoneKind::Residential).unwrap();
    edit::lay_line(&mut world, Position::new(11, 12), Position::new(20, 12), edit::lay_road)
        .unwrap();
    world
}

#[test]
fn trip_to_shops_marks_every_second_step() {
    let mut world = town();
    edit::place_zone(&mut world, Position::new(18, 14), ZoneKind::Commercial).unwrap();
    let mut rng = CityRng::new(1);

    let result = make_traffic(&mut world, &mut rng, HOME, TripOrigin::Residential);

    assert_eq!(result, TrafficResult::Reached);
    for x in [13, 15, 17] {
        assert_eq!(world.traffic_density.world_get(x, 12), 50, "x={x}");
    }
    assert_eq!(world.traffic_density.world_get(11, 12), 0);
}

#[test]
fn dead_end_exhausts_without_touching_the_map() {
    let mut world = town();
    let mut rng = CityRng::new(1);

    let result = make_traffic(&mut world, &mut rng, HOME, TripOrigin::Residential);

    assert_eq!(result, TrafficResult::Exhausted);
    assert!(world.traffic_density.values().iter().all(|&v| v == 0));
}

#[test]
fn zone_without_road_reports_no_road() {
    let mut world = WorldState::new(32, 32);
    edit::place_zone(&mut world, HOME, ZoneKind::Residential).unwrap();
    let mut rng = CityRng::new(1);

    let result = make_traffic(&mut world, &mut rng, HOME, TripOrigin::Residential);

    assert_eq!(result, TrafficResult::NoRoad);
    assert_eq!(result.code(), -1);
    assert!(world.traffic_density.values().iter().all(|&v| v == 0));
}

/// A long straight road east of `HOME` with shops whose first tile sits
/// under road tile `start + reach`.
fn shops_at_reach(reach: i32) -> WorldState {
    let mut world = WorldState::new(80, 32);
    edit::place_zone(&mut world, HOME, ZoneKind::Residential).unwrap();
    edit::lay_line(&mut world, Position::new(11, 12), Position::new(70, 12), edit::lay_road)
        .unwrap();
    // Footprint spans center.x - 1 ..= center.x + 1, one row below the road.
    let center_x = 11 + reach + 1;
    edit::place_zone(&mut world, Position::new(center_x, 14), ZoneKind::Commercial).unwrap();
    world
}

#[test]
fn destination_on_the_last_allowed_step_is_reached() {
    let mut world = shops_at_reach(MAX_TRAFFIC_DISTANCE);
    let mut rng = CityRng::new(4);

    let result = make_traffic(&mut world, &mut rng, HOME, TripOrigin::Residential);

    assert_eq!(result, TrafficResult::Reached);
}

#[test]
fn destination_one_step_past_the_limit_is_never_reached() {
    let mut world = shops_at_reach(MAX_TRAFFIC_DISTANCE + 1);
    let mut rng = CityRng::new(4);

    let result = make_traffic(&mut world, &mut rng, HOME, TripOrigin::Residential);

    assert_eq!(result, TrafficResult::Exhausted);
    assert!(world.traffic_density.values().iter().all(|&v| v == 0));
}

#[test]
fn endless_loop_gives_up_without_touching_the_map() {
    let mut world = WorldState::new(48, 40);
    edit::place_zone(&mut world, HOME, ZoneKind::Residential).unwrap();
    let corners = [
        Position::new(11, 12),
        Position::new(30, 12),
        Position::new(30, 24),
        Position::new(11, 24),
        Position::new(11, 12),
    ];
    for pair in corners.windows(2) {
        edit::lay_line(&mut world, pair[0], pair[1], edit::lay_road).unwrap();
    }

    for seed in 0..8 {
        let mut rng = CityRng::new(seed);
        let result = make_traffic(&mut world, &mut rng, HOME, TripOrigin::Residential);
        assert_eq!(result, TrafficResult::Exhausted, "seed {seed}");
    }
    assert!(world.traffic_density.values().iter().all(|&v| v == 0));
}
