use crate::{
    clock::SimSpeed,
    disaster_subsystem::DisasterKind,
    types::{RunId, Tick},
};
use serde::{Deserialize, Serialize};

pub const MAX_TAX_RATE: i32 = 20;

/// All player-issued commands.
/// Variants are added over time, never removed or reordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum PlayerCommand {
    // ── Clock control ─────────────────────────────
    Pause,
    Resume,
    SetSpeed { speed: SimSpeed },

    // ── Budget ────────────────────────────────────
    /// Clamped to 0..=20.
    SetTaxRate { rate: i32 },
    /// Funding fractions, each clamped to 0.0..=1.0.
    SetFunding { road: f64, fire: f64, police: f64 },
    SetAutoBudget { enabled: bool },
    Spend { amount: i64 },

    // ── Disasters ─────────────────────────────────
    SetDisasters { enabled: bool },
    TriggerDisaster { kind: DisasterKind },
}

impl PlayerCommand {
    /// Stable name used in the `PlayerCommandReceived` event.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Pause               => "pause",
            Self::Resume              => "resume",
            Self::SetSpeed { .. }     => "set_speed",
            Self::SetTaxRate { .. }   => "set_tax_rate",
            Self::SetFunding { .. }   => "set_funding",
            Self::SetAutoBudget { .. }=> "set_auto_budget",
            Self::Spend { .. }        => "spend",
            Self::SetDisasters { .. } => "set_disasters",
            Self::TriggerDisaster { .. } => "trigger_disaster",
        }
    }
}

/// A queued player command with its submission tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedCommand {
    pub run_id:     RunId,
    pub queued_at:  Tick,
    pub command_id: String,
    pub command:    PlayerCommand,
}

impl QueuedCommand {
    pub fn new(run_id: RunId, queued_at: Tick, command: PlayerCommand) -> Self {
        Self {
            run_id,
            queued_at,
            command_id: uuid::Uuid::new_v4().to_string(),
            command,
        }
    }
}
