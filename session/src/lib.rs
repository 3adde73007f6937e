#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Session orchestration for Koma Rush.
//!
//! A [`Session`] owns the authoritative world and every system. Each external
//! request is applied to the world, and the resulting events are pumped
//! through the systems until no further commands are produced.

use std::time::Duration;

use koma_rush_core::{
    AgentId, AgentView, Command, Event, GameConfig, PixelPoint, SessionOutcome, SessionState,
    Stage,
};
use koma_rush_system_director::Director;
use koma_rush_system_scoring::Scoring;
use koma_rush_system_turns::{TurnScheduler, TurnViews};
use koma_rush_world::{self as world, query, World};
use tracing::info;

mod loader;

pub use koma_rush_system_turns::TurnPhase;
pub use loader::{default_config, load_config, parse_config, LoadError, DEFAULT_CONFIG};

/// Running game session wiring the world to its systems.
#[derive(Debug)]
pub struct Session {
    world: World,
    turns: TurnScheduler,
    director: Director,
    scoring: Scoring,
    journal: Vec<Event>,
}

impl Session {
    /// Creates a session that has not started yet.
    #[must_use]
    pub fn new(config: GameConfig) -> Self {
        Self {
            world: World::new(&config),
            turns: TurnScheduler::new(config.turns.clone()),
            director: Director::new(&config),
            scoring: Scoring::new(config.combo.clone()),
            journal: Vec::new(),
        }
    }

    /// Starts the session clock.
    pub fn start(&mut self) {
        self.submit(Command::StartSession);
    }

    /// Advances simulated time.
    pub fn advance(&mut self, dt: Duration) {
        self.submit(Command::Tick { dt });
    }

    /// Reports that the player's fire hit an agent.
    pub fn report_hit(&mut self, agent: AgentId, damage: u32) {
        self.submit(Command::HitAgent { agent, damage });
    }

    /// Reports that an agent touched the player.
    pub fn report_player_hit(&mut self) {
        self.submit(Command::HitPlayer);
    }

    /// Raises the player's rank.
    pub fn promote_player(&mut self) {
        self.submit(Command::PromotePlayer);
    }

    /// Moves the player, or marks it inactive with `None`.
    pub fn set_player_position(&mut self, position: Option<PixelPoint>) {
        self.submit(Command::SetPlayerPosition { position });
    }

    /// Ends the session with the provided outcome.
    pub fn end(&mut self, outcome: SessionOutcome) {
        self.submit(Command::EndSession { outcome });
    }

    /// Discards all progress and starts over.
    pub fn restart(&mut self) {
        self.submit(Command::Restart);
    }

    /// Removes and returns every event recorded since the last call.
    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.journal)
    }

    /// Accumulated score.
    #[must_use]
    pub fn score(&self) -> u64 {
        self.scoring.score()
    }

    /// Current combo.
    #[must_use]
    pub fn combo(&self) -> u32 {
        self.scoring.combo()
    }

    /// Longest combo of the session.
    #[must_use]
    pub fn best_combo(&self) -> u32 {
        self.scoring.best_combo()
    }

    /// Kills scored this session.
    #[must_use]
    pub fn kills(&self) -> u32 {
        self.scoring.kills()
    }

    /// Current stage.
    #[must_use]
    pub fn stage(&self) -> Stage {
        self.director.stage(query::player_rank(&self.world))
    }

    /// Snapshot of every agent.
    #[must_use]
    pub fn agents(&self) -> AgentView {
        query::agent_view(&self.world)
    }

    /// Lifecycle state of the session.
    #[must_use]
    pub fn state(&self) -> SessionState {
        query::session_state(&self.world)
    }

    /// Phase of the turn scheduler.
    #[must_use]
    pub fn turn_phase(&self) -> TurnPhase {
        self.turns.phase()
    }

    /// Number of move phases started.
    #[must_use]
    pub fn turn(&self) -> u32 {
        query::turn(&self.world)
    }

    /// Player rank.
    #[must_use]
    pub fn player_rank(&self) -> u32 {
        query::player_rank(&self.world)
    }

    /// Simulated time since the session (re)started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        query::elapsed(&self.world)
    }

    /// Waves spawned so far.
    #[must_use]
    pub fn waves_spawned(&self) -> u32 {
        self.director.waves_spawned()
    }

    /// Read-only access to the authoritative world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    fn submit(&mut self, command: Command) {
        let mut events = Vec::new();
        world::apply(&mut self.world, command, &mut events);
        self.pump(events);
    }

    fn pump(&mut self, mut events: Vec<Event>) {
        let mut commands = Vec::new();
        while !events.is_empty() {
            self.log_outcome(&events);
            self.journal.extend(events.iter().cloned());

            let state = query::session_state(&self.world);
            let rank = query::player_rank(&self.world);
            self.scoring.handle(&events, state, &mut commands);
            self.director.handle(&events, state, rank, &mut commands);

            // Spawns land before the move phase resolves so newcomers are
            // part of the same reservation pass.
            let mut next = Vec::new();
            for command in commands.drain(..) {
                world::apply(&mut self.world, command, &mut next);
            }

            let state = query::session_state(&self.world);
            let agents = query::agent_view(&self.world);
            let mapper = query::grid_mapper(&self.world);
            self.turns.handle(
                &events,
                state,
                TurnViews {
                    agents: &agents,
                    target: query::player_target(&self.world),
                    mapper: &mapper,
                    stage: self.director.stage(rank),
                },
                &mut commands,
            );

            for command in commands.drain(..) {
                world::apply(&mut self.world, command, &mut next);
            }
            events = next;
        }
    }

    fn log_outcome(&self, events: &[Event]) {
        for event in events {
            if let Event::SessionEnded { outcome } = event {
                info!(
                    ?outcome,
                    score = self.scoring.score(),
                    best_combo = self.scoring.best_combo(),
                    turns = query::turn(&self.world),
                    "session finished"
                );
            }
        }
    }
}
