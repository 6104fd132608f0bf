//! Subsystem trait and scheduling slots.
//!
//! RULE: Every subsystem implements SimSubsystem.
//! The engine calls update() on each registered subsystem whose slot
//! runs in the current phase, in registration order.
//! Execution order is fixed and documented in engine.rs.

use crate::{
    clock::{Phase, SimClock},
    error::SimResult,
    event::SimEvent,
    rng::CityRng,
    world::WorldState,
};
use std::any::Any;

/// Everything a subsystem may touch during one phase.
pub struct SimContext<'a> {
    pub clock: &'a SimClock,
    pub world: &'a mut WorldState,
    pub rng: &'a mut CityRng,
}

/// The contract every subsystem must fulfill.
pub trait SimSubsystem: Send {
    /// Unique stable name for this subsystem.
    fn name(&self) -> &'static str;

    /// Called by the engine for each phase the subsystem's slot runs in.
    ///
    /// Returns the subsystem's own summary events. Notifications raised
    /// deeper down (tile changes, messages) are queued on the world.
    fn update(&mut self, phase: Phase, ctx: &mut SimContext<'_>) -> SimResult<Vec<SimEvent>>;

    /// For downcasting in tests and tooling only.
    /// Production sim code never uses this.
    fn as_any(&self) -> &dyn Any;
}

/// Which phases a registered subsystem is invoked in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubsystemSlot {
    Demand,
    Census,
    Zone,
    Budget,
    Evaluation,
    Scan,
    Message,
    Power,
    Disaster,
    Sprite,
}

impl SubsystemSlot {
    pub fn runs_in(self, phase: Phase) -> bool {
        match self {
            Self::Demand     => phase == Phase::WeekStart,
            Self::Census     => matches!(phase, Phase::WeekStart | Phase::Finance),
            Self::Zone       => matches!(phase, Phase::ZoneScan(_)),
            Self::Budget     => phase == Phase::Finance,
            Self::Evaluation => phase == Phase::Finance,
            Self::Scan       => matches!(
                phase,
                Phase::Decay
                    | Phase::PollutionScan
                    | Phase::CrimeScan
                    | Phase::PopulationScan
                    | Phase::FireScan
            ),
            Self::Message    => phase == Phase::Decay,
            Self::Power      => phase == Phase::Power,
            Self::Disaster   => phase == Phase::FireScan,
            Self::Sprite     => true,
        }
    }
}
