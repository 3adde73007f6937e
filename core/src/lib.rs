#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Koma Rush engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters and systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! for systems to react to deterministically. Systems consume event streams,
//! query immutable snapshots, and respond exclusively with new command
//! batches.

use std::time::Duration;

mod config;
mod grid;
mod profile;
mod timing;

pub use config::{
    AgentColor, AttackPattern, ComboTuning, ConfigError, DirectorTuning, EnemyDefinition,
    EnemyKindId, GameConfig, PatternId, PlayerTuning, ProjectileSpec, SpawnDescriptor,
    WaveDefinition, WaveId,
};
pub use grid::{CellOffset, GridCell, GridConfig, GridMapper, PixelPoint};
pub use profile::{AiProfile, CandidateOffsets};
pub use timing::TurnTiming;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Moves a ready session into the running state.
    StartSession,
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Arms the continuation identified by `timer`, replacing any pending one.
    ScheduleTimer {
        /// Continuation to arm.
        timer: TimerKey,
        /// Delay measured from the current clock value.
        after: Duration,
    },
    /// Disarms the continuation identified by `timer`, if pending.
    CancelTimer {
        /// Continuation to disarm.
        timer: TimerKey,
    },
    /// Announces the start of a move phase.
    StartTurn,
    /// Announces the start of a hold phase; residual motion is cancelled.
    StopTurn,
    /// Creates an agent of the provided type.
    SpawnAgent {
        /// Catalog entry describing the agent.
        enemy: EnemyDefinition,
        /// Cell the agent appears in.
        cell: GridCell,
        /// Row the agent must reach before roaming freely.
        destination_row: i32,
    },
    /// Commits an agent to a destination cell and animates the transition.
    MoveAgent {
        /// Agent being moved.
        agent: AgentId,
        /// Destination cell.
        to: GridCell,
        /// Length of the animated transition.
        duration: Duration,
    },
    /// Applies damage reported by the collision collaborator.
    HitAgent {
        /// Agent that was hit.
        agent: AgentId,
        /// Health removed by the hit.
        damage: u32,
    },
    /// Reports that the player was hit.
    HitPlayer,
    /// Reports that the player collected a promotion.
    PromotePlayer,
    /// Updates the player's position, or marks it absent.
    SetPlayerPosition {
        /// New position, `None` when the player is not on screen.
        position: Option<PixelPoint>,
    },
    /// Ends the session with the provided outcome.
    EndSession {
        /// Reason the session ended.
        outcome: SessionOutcome,
    },
    /// Discards all session state and starts over.
    Restart,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// The session entered the running state.
    SessionStarted,
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// A scheduled continuation came due.
    TimerFired {
        /// Continuation that fired.
        timer: TimerKey,
    },
    /// A move phase began.
    TurnStarted {
        /// One-based turn counter.
        turn: u32,
    },
    /// A hold phase began.
    TurnStopped {
        /// Turn whose move phase just ended.
        turn: u32,
    },
    /// An agent entered the field.
    AgentSpawned {
        /// Identifier allocated to the agent.
        agent: AgentId,
        /// Catalog type of the agent.
        kind: EnemyKindId,
        /// Cell the agent occupies after spawning.
        cell: GridCell,
    },
    /// An agent was committed to a new cell.
    AgentMoved {
        /// Agent that moved.
        agent: AgentId,
        /// Cell occupied before the move.
        from: GridCell,
        /// Cell occupied after the move.
        to: GridCell,
        /// Length of the animated transition.
        duration: Duration,
    },
    /// An agent's health reached zero.
    AgentKilled {
        /// Agent that was killed.
        agent: AgentId,
        /// Base points awarded for the kill.
        score: u32,
    },
    /// A dying agent finished its exit and left the store.
    AgentRemoved {
        /// Agent that was removed.
        agent: AgentId,
    },
    /// An agent left the visible area and was removed.
    AgentEscaped {
        /// Agent that escaped.
        agent: AgentId,
    },
    /// The player's rank changed.
    PlayerRankChanged {
        /// Rank after the change.
        rank: u32,
    },
    /// The player was destroyed; game over follows after a delay.
    PlayerDestroyed,
    /// The session ended.
    SessionEnded {
        /// Reason the session ended.
        outcome: SessionOutcome,
    },
    /// All session state was discarded.
    SessionRestarted,
}

/// Continuations the world can hold pending, at most one per key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimerKey {
    /// Next turn phase transition.
    TurnPhase,
    /// Next wave spawn.
    Spawn,
    /// Next base difficulty increment.
    DifficultyStep,
    /// Combo reset.
    ComboDecay,
    /// End of the player's post-damage invincibility.
    PlayerRecovery,
    /// Transition to game over after the player was destroyed.
    GameOverDelay,
}

/// Reason a session ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SessionOutcome {
    /// The player was destroyed.
    GameOver,
    /// The difficulty cap was reached.
    GameClear,
}

/// Lifecycle of a play session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Created but not yet started.
    #[default]
    Ready,
    /// Accepting commands and advancing.
    Running,
    /// Terminated; only a restart revives it.
    Ended(SessionOutcome),
}

impl SessionState {
    /// Reports whether the session has terminated.
    #[must_use]
    pub const fn is_ended(&self) -> bool {
        matches!(self, Self::Ended(_))
    }

    /// Reports whether the session is running.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }
}

/// Integral difficulty index derived from player rank and elapsed time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Stage(u32);

impl Stage {
    /// Wraps a raw stage value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Combines the components: `player_rank + base_level + 1`.
    #[must_use]
    pub const fn from_parts(player_rank: u32, base_level: u32) -> Self {
        Self(player_rank.saturating_add(base_level).saturating_add(1))
    }

    /// Raw stage value.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Index-addressed identifier of an agent in the world's arena.
///
/// The generation distinguishes successive occupants of the same slot so a
/// stale identifier never resolves to a newer agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgentId {
    index: u32,
    generation: u32,
}

impl AgentId {
    /// Creates an identifier from its slot index and generation.
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index inside the arena.
    #[must_use]
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// Generation of the slot when the identifier was allocated.
    #[must_use]
    pub const fn generation(&self) -> u32 {
        self.generation
    }
}

/// Remaining health of an agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Health(u32);

impl Health {
    /// Creates a new health value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Raw health value.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Health after absorbing `damage`, saturating at zero.
    #[must_use]
    pub const fn saturating_sub(self, damage: u32) -> Self {
        Self(self.0.saturating_sub(damage))
    }

    /// Reports whether no health remains.
    #[must_use]
    pub const fn is_depleted(&self) -> bool {
        self.0 == 0
    }
}

/// Explicit lifecycle of an agent in the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Lifecycle {
    /// Participating in turns.
    Alive,
    /// Killed and playing its exit; no longer moves.
    Dying {
        /// Time left before removal.
        remaining: Duration,
    },
    /// Gone from the active set.
    Removed,
}

/// Immutable representation of a single agent's state used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct AgentSnapshot {
    /// Identifier of the agent.
    pub id: AgentId,
    /// Catalog type of the agent.
    pub kind: EnemyKindId,
    /// Cell the agent is committed to.
    pub cell: GridCell,
    /// Visible position, possibly mid-animation.
    pub position: PixelPoint,
    /// Row the agent must reach before roaming freely.
    pub destination_row: i32,
    /// Remaining health.
    pub health: Health,
    /// Base movement speed in logical units per second.
    pub speed: f32,
    /// Base points awarded for a kill.
    pub score: u32,
    /// Movement profile.
    pub profile: AiProfile,
    /// Display colour.
    pub color: AgentColor,
    /// Lifecycle state.
    pub lifecycle: Lifecycle,
}

impl AgentSnapshot {
    /// Reports whether the agent takes part in turns.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.lifecycle == Lifecycle::Alive
    }
}

/// Read-only snapshot describing all agents in the arena.
#[derive(Clone, Debug, Default)]
pub struct AgentView {
    snapshots: Vec<AgentSnapshot>,
}

impl AgentView {
    /// Creates a new agent view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<AgentSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &AgentSnapshot> {
        self.snapshots.iter()
    }

    /// Iterator over agents that take part in turns.
    pub fn active(&self) -> impl Iterator<Item = &AgentSnapshot> {
        self.snapshots.iter().filter(|snapshot| snapshot.is_active())
    }

    /// Number of captured snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<AgentSnapshot> {
        self.snapshots
    }
}
