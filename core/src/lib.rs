//! citysim-core: a deterministic tile-grid city simulation.
//!
//! The engine owns the world, the clock and the random stream; hosts
//! drive it one sub-phase at a time and edit the map between calls.

pub mod budget_subsystem;
pub mod census_subsystem;
pub mod clock;
pub mod command;
pub mod config;
pub mod demand_subsystem;
pub mod disaster_subsystem;
pub mod edit;
pub mod engine;
pub mod error;
pub mod evaluation_subsystem;
pub mod event;
pub mod map;
pub mod message_subsystem;
pub mod power_subsystem;
pub mod rng;
pub mod scan_subsystem;
pub mod snapshot;
pub mod sprite_subsystem;
pub mod store;
pub mod subsystem;
pub mod tiles;
pub mod traffic;
pub mod types;
pub mod world;
pub mod zone;
