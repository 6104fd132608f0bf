//! Notifications: everything the engine tells the outside world.
//!
//! RULE: Notifications are one-directional and fire-and-forget.
//! Listeners see every event in emission order; the store persists
//! all of them except per-tile and per-sprite chatter.

use crate::{
    config::GameLevel,
    sprite_subsystem::SpriteKind,
    types::{Position, RunId, Tick},
};
use serde::{Deserialize, Serialize};

/// Every event emitted during simulation.
/// Variants are added over time, never removed or reordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimEvent {
    // ── Engine events ──────────────────────────────
    RunInitialized {
        run_id: RunId,
        seed: u64,
    },
    PlayerCommandReceived {
        tick: Tick,
        command_type: String,
    },

    // ── Map events ─────────────────────────────────
    TileChanged {
        x: i32,
        y: i32,
    },
    MapChanged,
    OverlayChanged {
        overlay: OverlayKind,
    },
    SpriteMoved {
        sprite_id: u32,
        kind: SpriteKind,
        x: i32,
        y: i32,
    },

    // ── City state events ──────────────────────────
    CensusChanged {
        city_time: u64,
        res_pop: i32,
        com_pop: i32,
        ind_pop: i32,
    },
    DemandChanged {
        res: i32,
        com: i32,
        ind: i32,
    },
    EvaluationChanged {
        city_time: u64,
        score: i32,
        delta_score: i32,
        population: i64,
        class: u8,
        approval: u32,
    },
    FundsChanged {
        funds: i64,
    },
    TaxCollected {
        city_time: u64,
        revenue: i64,
        expenses: i64,
        cash_flow: i64,
        funds: i64,
    },
    OptionsChanged {
        level: GameLevel,
        disasters_enabled: bool,
        auto_budget: bool,
    },

    // ── Messages and sounds ────────────────────────
    CityMessage {
        message: MessageKind,
        location: Option<Position>,
    },
    CitySound {
        sound: SoundKind,
        location: Position,
    },
    EarthquakeStarted,
}

impl SimEvent {
    /// Stable name used for the event_type column in event_log.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::RunInitialized { .. }        => "run_initialized",
            Self::PlayerCommandReceived { .. } => "player_command_received",
            Self::TileChanged { .. }           => "tile_changed",
            Self::MapChanged                   => "map_changed",
            Self::OverlayChanged { .. }        => "overlay_changed",
            Self::SpriteMoved { .. }           => "sprite_moved",
            Self::CensusChanged { .. }         => "census_changed",
            Self::DemandChanged { .. }         => "demand_changed",
            Self::EvaluationChanged { .. }     => "evaluation_changed",
            Self::FundsChanged { .. }          => "funds_changed",
            Self::TaxCollected { .. }          => "tax_collected",
            Self::OptionsChanged { .. }        => "options_changed",
            Self::CityMessage { .. }           => "city_message",
            Self::CitySound { .. }             => "city_sound",
            Self::EarthquakeStarted            => "earthquake_started",
        }
    }

    /// Whether the event belongs in the persisted run log.
    pub fn is_logged(&self) -> bool {
        !matches!(self, Self::TileChanged { .. } | Self::SpriteMoved { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayKind {
    Power,
    Traffic,
    LandValue,
    Pollution,
    Crime,
    PopulationDensity,
    GrowthRate,
    FireCoverage,
    PoliceCoverage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    NeedResidential,
    NeedCommercial,
    NeedIndustrial,
    NeedRoads,
    NeedRails,
    NeedPower,
    NeedStadium,
    NeedSeaport,
    NeedAirport,
    Blackouts,
    HighPollution,
    HighCrime,
    NeedFireStation,
    NeedPoliceStation,
    HighTaxes,
    RoadsNeedFunding,
    FireNeedsFunding,
    PoliceNeedsFunding,
    TrafficJams,
    NotEnoughPower,
    FireReported,
    FloodReported,
    TornadoReported,
    EarthquakeReported,
    MonsterReported,
    MeltdownReported,
    ExplosionReported,
    ReachedTown,
    ReachedCity,
    ReachedCapital,
    ReachedMetropolis,
    ReachedMegalopolis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundKind {
    Explosion,
    Rumble,
    Siren,
    MonsterRoar,
    TrainHorn,
}

/// Receives every notification the engine emits.
/// Registered listeners run synchronously, in registration order.
pub trait CityListener: Send {
    fn on_event(&mut self, event: &SimEvent);
}

/// The event log entry as persisted to SQLite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id: Option<i64>,
    pub run_id: RunId,
    pub tick: Tick,
    pub subsystem: String,
    pub event_type: String,
    pub payload: String, // JSON-serialized SimEvent
}
