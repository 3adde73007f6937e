#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Combo and score engine.
//!
//! Each kill raises the combo before scoring it, so the multiplier rewards the
//! kill that extended the streak. A [`TimerKey::ComboDecay`] continuation is
//! re-armed on every kill; when it fires the streak is lost.

use koma_rush_core::{Command, ComboTuning, Event, SessionState, TimerKey};
use tracing::{debug, trace};

/// Points awarded for a kill at the given combo: `base + floor(base * combo * rate)`.
///
/// The rate is expressed in thousandths so the floor is exact for any rate
/// given to three decimals.
#[must_use]
pub fn kill_points(base: u32, combo: u32, rate_per_mille: u64) -> u64 {
    let bonus = u64::from(base)
        .saturating_mul(u64::from(combo))
        .saturating_mul(rate_per_mille)
        / 1_000;
    u64::from(base).saturating_add(bonus)
}

/// Pure system that turns kill events into score.
#[derive(Debug)]
pub struct Scoring {
    tuning: ComboTuning,
    rate_per_mille: u64,
    score: u64,
    combo: u32,
    best_combo: u32,
    kills: u32,
}

impl Scoring {
    /// Creates an engine with an empty score.
    #[must_use]
    pub fn new(tuning: ComboTuning) -> Self {
        let rate_per_mille = tuning.rate_per_mille();
        Self {
            tuning,
            rate_per_mille,
            score: 0,
            combo: 0,
            best_combo: 0,
            kills: 0,
        }
    }

    /// Accumulated score.
    #[must_use]
    pub fn score(&self) -> u64 {
        self.score
    }

    /// Current streak length.
    #[must_use]
    pub fn combo(&self) -> u32 {
        self.combo
    }

    /// Longest streak of the session.
    #[must_use]
    pub fn best_combo(&self) -> u32 {
        self.best_combo
    }

    /// Number of kills scored this session.
    #[must_use]
    pub fn kills(&self) -> u32 {
        self.kills
    }

    /// Consumes world events and emits combo-decay timer commands.
    pub fn handle(&mut self, events: &[Event], state: SessionState, out: &mut Vec<Command>) {
        for event in events {
            match event {
                Event::SessionRestarted => self.reset(),
                Event::AgentKilled { agent, score } if !state.is_ended() => {
                    let gained = self.register_kill(*score);
                    debug!(?agent, gained, combo = self.combo, total = self.score, "kill scored");
                    out.push(Command::ScheduleTimer {
                        timer: TimerKey::ComboDecay,
                        after: self.tuning.window(),
                    });
                }
                Event::TimerFired {
                    timer: TimerKey::ComboDecay,
                } => {
                    trace!(lost = self.combo, "combo decayed");
                    self.combo = 0;
                }
                _ => {}
            }
        }
    }

    fn register_kill(&mut self, base: u32) -> u64 {
        self.combo = self.combo.saturating_add(1);
        self.best_combo = self.best_combo.max(self.combo);
        self.kills = self.kills.saturating_add(1);
        let gained = kill_points(base, self.combo, self.rate_per_mille);
        self.score = self.score.saturating_add(gained);
        gained
    }

    fn reset(&mut self) {
        self.score = 0;
        self.combo = 0;
        self.best_combo = 0;
        self.kills = 0;
    }
}
