#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative session state management for Koma Rush.
//!
//! The world owns the agent arena, the player, the pending continuations and
//! the session lifecycle. It is mutated exclusively through [`apply`].

use std::time::Duration;

use koma_rush_core::{
    Command, Event, GameConfig, GridCell, GridMapper, Lifecycle, PlayerTuning, SessionOutcome,
    SessionState, TimerKey,
};
use tracing::{debug, info, trace};

mod agents;
mod player;
mod timers;

use agents::{AgentStore, DYING_DURATION};
use player::{HitOutcome, Player};
use timers::TimerQueue;

/// Distance below the screen an agent must pass before it counts as escaped.
const ESCAPE_MARGIN: f32 = 50.0;

/// Represents the authoritative Koma Rush session state.
#[derive(Debug)]
pub struct World {
    mapper: GridMapper,
    player_tuning: PlayerTuning,
    agents: AgentStore,
    player: Player,
    timers: TimerQueue,
    state: SessionState,
    clock: Duration,
    turn: u32,
}

impl World {
    /// Creates a world laid out according to the provided configuration.
    #[must_use]
    pub fn new(config: &GameConfig) -> Self {
        let mapper = GridMapper::new(&config.grid);
        Self {
            player: Player::new(&mapper),
            mapper,
            player_tuning: config.player.clone(),
            agents: AgentStore::new(),
            timers: TimerQueue::new(),
            state: SessionState::Ready,
            clock: Duration::ZERO,
            turn: 0,
        }
    }

    fn reset(&mut self) {
        self.agents.clear();
        self.timers.clear();
        self.player = Player::new(&self.mapper);
        self.clock = Duration::ZERO;
        self.turn = 0;
    }

    fn end_session(&mut self, outcome: SessionOutcome, out_events: &mut Vec<Event>) {
        if self.state.is_ended() {
            return;
        }
        self.timers.clear();
        self.state = SessionState::Ended(outcome);
        info!(?outcome, turn = self.turn, "session ended");
        out_events.push(Event::SessionEnded { outcome });
    }

    fn advance(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        self.clock = self.clock.saturating_add(dt);
        out_events.push(Event::TimeAdvanced { dt });

        let escape_y = self.mapper.screen_height() + ESCAPE_MARGIN;
        let sweep = self.agents.advance(dt, escape_y);
        for agent in sweep.expired {
            out_events.push(Event::AgentRemoved { agent });
        }
        for agent in sweep.escaped {
            debug!(?agent, "agent escaped the field");
            out_events.push(Event::AgentEscaped { agent });
        }

        for timer in self.timers.drain_due(self.clock) {
            if self.state.is_ended() {
                break;
            }
            trace!(?timer, clock_ms = self.clock.as_millis(), "timer fired");
            out_events.push(Event::TimerFired { timer });
            match timer {
                TimerKey::PlayerRecovery => self.player.recover(),
                TimerKey::GameOverDelay => self.end_session(SessionOutcome::GameOver, out_events),
                TimerKey::TurnPhase
                | TimerKey::Spawn
                | TimerKey::DifficultyStep
                | TimerKey::ComboDecay => {}
            }
        }
    }

    fn first_free_cell_from(&self, cell: GridCell) -> GridCell {
        let mut candidate = cell;
        while self.agents.occupant(candidate).is_some() {
            candidate = candidate.above();
        }
        candidate
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Once the session has ended every command except [`Command::Restart`] and
/// [`Command::SetPlayerPosition`] is ignored, so continuations that arrive
/// after teardown cannot mutate agents.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    if world.state.is_ended()
        && !matches!(command, Command::Restart | Command::SetPlayerPosition { .. })
    {
        trace!(?command, "ignoring command after session end");
        return;
    }

    match command {
        Command::StartSession => {
            if world.state == SessionState::Ready {
                world.state = SessionState::Running;
                out_events.push(Event::SessionStarted);
            }
        }
        Command::Tick { dt } => world.advance(dt, out_events),
        Command::ScheduleTimer { timer, after } => {
            world.timers.arm(timer, world.clock.saturating_add(after));
        }
        Command::CancelTimer { timer } => {
            let _ = world.timers.cancel(timer);
        }
        Command::StartTurn => {
            world.turn = world.turn.saturating_add(1);
            out_events.push(Event::TurnStarted { turn: world.turn });
        }
        Command::StopTurn => {
            let mut cancelled = 0_usize;
            for agent in world.agents.iter_mut() {
                if agent.in_motion() {
                    cancelled += 1;
                }
                agent.finish_motion();
            }
            trace!(cancelled, "residual motion cancelled");
            out_events.push(Event::TurnStopped { turn: world.turn });
        }
        Command::SpawnAgent {
            enemy,
            cell,
            destination_row,
        } => {
            let cell = world.first_free_cell_from(cell);
            let agent = world
                .agents
                .spawn(&enemy, cell, destination_row, &world.mapper);
            debug!(?agent, kind = %enemy.id, ?cell, destination_row, "agent spawned");
            out_events.push(Event::AgentSpawned {
                agent,
                kind: enemy.id,
                cell,
            });
        }
        Command::MoveAgent {
            agent,
            to,
            duration,
        } => {
            let mapper = world.mapper;
            if let Some(state) = world.agents.get_mut(agent).filter(|state| state.is_alive()) {
                let from = state.cell;
                state.begin_motion(to, duration, &mapper);
                out_events.push(Event::AgentMoved {
                    agent,
                    from,
                    to,
                    duration,
                });
            }
        }
        Command::HitAgent { agent, damage } => {
            if let Some(state) = world.agents.get_mut(agent).filter(|state| state.is_alive()) {
                state.health = state.health.saturating_sub(damage);
                if state.health.is_depleted() {
                    state.lifecycle = Lifecycle::Dying {
                        remaining: DYING_DURATION,
                    };
                    debug!(?agent, score = state.score, "agent killed");
                    out_events.push(Event::AgentKilled {
                        agent,
                        score: state.score,
                    });
                }
            }
        }
        Command::HitPlayer => match world.player.hit() {
            HitOutcome::Ignored => {}
            HitOutcome::Demoted(rank) => {
                debug!(rank, "player demoted");
                world.timers.arm(
                    TimerKey::PlayerRecovery,
                    world
                        .clock
                        .saturating_add(world.player_tuning.invincibility()),
                );
                out_events.push(Event::PlayerRankChanged { rank });
            }
            HitOutcome::Destroyed => {
                info!("player destroyed");
                world.timers.arm(
                    TimerKey::GameOverDelay,
                    world
                        .clock
                        .saturating_add(world.player_tuning.game_over_delay()),
                );
                out_events.push(Event::PlayerDestroyed);
            }
        },
        Command::PromotePlayer => {
            if let Some(rank) = world.player.promote(world.player_tuning.max_rank) {
                debug!(rank, "player promoted");
                out_events.push(Event::PlayerRankChanged { rank });
            }
        }
        Command::SetPlayerPosition { position } => world.player.set_position(position),
        Command::EndSession { outcome } => world.end_session(outcome, out_events),
        Command::Restart => {
            world.reset();
            world.state = SessionState::Running;
            info!("session restarted");
            out_events.push(Event::SessionRestarted);
            out_events.push(Event::SessionStarted);
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use super::World;
    use koma_rush_core::{
        AgentId, AgentSnapshot, AgentView, GridMapper, PixelPoint, SessionState, TimerKey,
    };

    /// Captures a read-only view of every agent in the arena.
    #[must_use]
    pub fn agent_view(world: &World) -> AgentView {
        AgentView::from_snapshots(world.agents.iter().map(|agent| agent.snapshot()).collect())
    }

    /// Captures a single agent, if the identifier still resolves.
    #[must_use]
    pub fn agent(world: &World, id: AgentId) -> Option<AgentSnapshot> {
        world.agents.get(id).map(|agent| agent.snapshot())
    }

    /// Position the agents pursue, or `None` when the player is inactive.
    #[must_use]
    pub fn player_target(world: &World) -> Option<PixelPoint> {
        world.player.target()
    }

    /// Current player rank.
    #[must_use]
    pub fn player_rank(world: &World) -> u32 {
        world.player.rank()
    }

    /// Reports whether the player is inside its post-damage window.
    #[must_use]
    pub fn player_invincible(world: &World) -> bool {
        world.player.is_invincible()
    }

    /// Lifecycle state of the session.
    #[must_use]
    pub fn session_state(world: &World) -> SessionState {
        world.state
    }

    /// Mapper fixing the grid layout for the session.
    #[must_use]
    pub fn grid_mapper(world: &World) -> GridMapper {
        world.mapper
    }

    /// Number of move phases started so far.
    #[must_use]
    pub fn turn(world: &World) -> u32 {
        world.turn
    }

    /// Simulated time elapsed since the session (re)started.
    #[must_use]
    pub fn elapsed(world: &World) -> Duration {
        world.clock
    }

    /// Time remaining until the continuation fires, if it is pending.
    #[must_use]
    pub fn time_until(world: &World, timer: TimerKey) -> Option<Duration> {
        world
            .timers
            .deadline(timer)
            .map(|deadline| deadline.saturating_sub(world.clock))
    }
}
