//! Turn cadence shared by the scheduler and the director.

use std::time::Duration;

use serde::Deserialize;

use crate::Stage;

/// Timing knobs for the move/hold turn rhythm.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TurnTiming {
    /// Delay between session start and the first move phase.
    pub startup_delay_ms: u64,
    /// Fixed length of every move phase.
    pub move_duration_ms: u64,
    /// Hold length at stage zero before any decay applies.
    pub base_hold_ms: u64,
    /// Shortest hold the decay may produce.
    pub hold_floor_ms: u64,
    /// Hold reduction applied per stage.
    pub hold_decay_per_stage_ms: u64,
}

impl Default for TurnTiming {
    fn default() -> Self {
        Self {
            startup_delay_ms: 1_000,
            move_duration_ms: 2_000,
            base_hold_ms: 1_500,
            hold_floor_ms: 300,
            hold_decay_per_stage_ms: 100,
        }
    }
}

impl TurnTiming {
    /// Delay before the first move phase.
    #[must_use]
    pub const fn startup_delay(&self) -> Duration {
        Duration::from_millis(self.startup_delay_ms)
    }

    /// Length of a move phase.
    #[must_use]
    pub const fn move_duration(&self) -> Duration {
        Duration::from_millis(self.move_duration_ms)
    }

    /// Hold length for the provided stage: `max(floor, base - stage * decay)`.
    #[must_use]
    pub fn hold_duration(&self, stage: Stage) -> Duration {
        let decay = u64::from(stage.get()).saturating_mul(self.hold_decay_per_stage_ms);
        let hold = self.base_hold_ms.saturating_sub(decay).max(self.hold_floor_ms);
        Duration::from_millis(hold)
    }

    /// Length of one full turn at the provided stage.
    #[must_use]
    pub fn turn_duration(&self, stage: Stage) -> Duration {
        self.move_duration().saturating_add(self.hold_duration(stage))
    }
}
