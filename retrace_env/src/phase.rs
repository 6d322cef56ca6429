//! Host frame phases.

use serde::{Deserialize, Serialize};

/// One of the three mutually exclusive per-frame phases a host delivers.
///
/// The coordinator listens to exactly one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TickPhase {
    /// Fixed-rate step, before the variable frame update
    #[serde(alias = "fixed_update")]
    PreTick,

    /// Variable-rate frame update
    #[default]
    #[serde(alias = "update")]
    Tick,

    /// After all frame updates have run
    #[serde(alias = "late_update")]
    PostTick,
}

impl TickPhase {
    /// Returns all phases in delivery order.
    pub fn all() -> [TickPhase; 3] {
        [TickPhase::PreTick, TickPhase::Tick, TickPhase::PostTick]
    }

    /// Returns the phase name.
    pub fn name(&self) -> &'static str {
        match self {
            TickPhase::PreTick => "pre_tick",
            TickPhase::Tick => "tick",
            TickPhase::PostTick => "post_tick",
        }
    }
}

impl std::fmt::Display for TickPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for TickPhase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pre_tick" | "pretick" | "fixed_update" | "fixedupdate" => Ok(TickPhase::PreTick),
            "tick" | "update" => Ok(TickPhase::Tick),
            "post_tick" | "posttick" | "late_update" | "lateupdate" => Ok(TickPhase::PostTick),
            _ => Err(format!("Unknown tick phase: {}", s)),
        }
    }
}
