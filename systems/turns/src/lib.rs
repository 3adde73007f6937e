#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Timed state machine alternating move and hold phases.
//!
//! Every phase transition is a [`TimerKey::TurnPhase`] continuation armed
//! through the world, so ending or restarting the session invalidates the
//! pending transition for free.

use koma_rush_core::{
    AgentView, Command, Event, GridMapper, PixelPoint, SessionState, Stage, TimerKey, TurnTiming,
};
use koma_rush_system_movement::MovementResolver;
use tracing::{debug, info};

/// Phase the scheduler currently occupies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TurnPhase {
    /// Waiting for the startup delay to elapse.
    #[default]
    Idle,
    /// Agents are animating toward their resolved cells.
    Move,
    /// Agents stand still.
    Hold,
    /// The session ended; no further transitions happen.
    Terminated,
}

/// Immutable views the scheduler needs when a move phase begins.
#[derive(Clone, Copy, Debug)]
pub struct TurnViews<'a> {
    /// Every agent in the arena.
    pub agents: &'a AgentView,
    /// Pursuit point, or `None` when the player is inactive.
    pub target: Option<PixelPoint>,
    /// Grid layout of the session.
    pub mapper: &'a GridMapper,
    /// Stage used to derive the hold duration.
    pub stage: Stage,
}

/// Pure system that drives turns and invokes the movement resolver.
#[derive(Debug)]
pub struct TurnScheduler {
    timing: TurnTiming,
    phase: TurnPhase,
    completed: u32,
    resolver: MovementResolver,
}

impl TurnScheduler {
    /// Creates an idle scheduler using the provided timing knobs.
    #[must_use]
    pub fn new(timing: TurnTiming) -> Self {
        Self {
            timing,
            phase: TurnPhase::Idle,
            completed: 0,
            resolver: MovementResolver::new(),
        }
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    /// Number of full move and hold cycles completed since the session began.
    #[must_use]
    pub fn completed_turns(&self) -> u32 {
        self.completed
    }

    /// Consumes world events and emits turn commands.
    pub fn handle(
        &mut self,
        events: &[Event],
        state: SessionState,
        views: TurnViews<'_>,
        out: &mut Vec<Command>,
    ) {
        for event in events {
            match event {
                Event::SessionRestarted => {
                    self.phase = TurnPhase::Idle;
                    self.completed = 0;
                }
                Event::SessionStarted => {
                    if self.phase == TurnPhase::Idle {
                        out.push(Command::ScheduleTimer {
                            timer: TimerKey::TurnPhase,
                            after: self.timing.startup_delay(),
                        });
                    }
                }
                Event::SessionEnded { outcome } => {
                    if self.phase != TurnPhase::Terminated {
                        info!(?outcome, completed = self.completed, "turn scheduler terminated");
                    }
                    self.phase = TurnPhase::Terminated;
                }
                Event::TimerFired {
                    timer: TimerKey::TurnPhase,
                } if state.is_running() => self.advance_phase(views, out),
                _ => {}
            }
        }
    }

    fn advance_phase(&mut self, views: TurnViews<'_>, out: &mut Vec<Command>) {
        match self.phase {
            TurnPhase::Idle | TurnPhase::Hold => {
                if self.phase == TurnPhase::Hold {
                    self.completed = self.completed.saturating_add(1);
                }
                self.phase = TurnPhase::Move;
                out.push(Command::StartTurn);
                let moved = self
                    .resolver
                    .resolve(views.agents, views.target, views.mapper, out);
                debug!(moved, "move phase entered");
                out.push(Command::ScheduleTimer {
                    timer: TimerKey::TurnPhase,
                    after: self.timing.move_duration(),
                });
            }
            TurnPhase::Move => {
                self.phase = TurnPhase::Hold;
                out.push(Command::StopTurn);
                let hold = self.timing.hold_duration(views.stage);
                debug!(
                    stage = views.stage.get(),
                    hold_ms = hold.as_millis(),
                    "hold phase entered"
                );
                out.push(Command::ScheduleTimer {
                    timer: TimerKey::TurnPhase,
                    after: hold,
                });
            }
            TurnPhase::Terminated => {}
        }
    }
}
