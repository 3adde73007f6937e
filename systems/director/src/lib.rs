#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave and difficulty director.
//!
//! The director raises a base difficulty level on a fixed cadence, derives
//! the stage from it and the player's rank, and spawns wave templates chosen
//! for that stage. Spawns are re-armed from the current turn length so waves
//! stay locked to the turn rhythm.

use koma_rush_core::{
    Command, DirectorTuning, EnemyDefinition, Event, GameConfig, GridCell, GridMapper,
    SessionOutcome, SessionState, Stage, TimerKey, TurnTiming, WaveDefinition,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

/// Pure system that escalates difficulty and emits spawn commands.
#[derive(Debug)]
pub struct Director {
    tuning: DirectorTuning,
    timing: TurnTiming,
    mapper: GridMapper,
    enemies: Vec<EnemyDefinition>,
    waves: Vec<WaveDefinition>,
    rng: ChaCha8Rng,
    base_level: u32,
    waves_spawned: u32,
    cleared: bool,
}

impl Director {
    /// Creates a director over the catalogs and tuning of the configuration.
    #[must_use]
    pub fn new(config: &GameConfig) -> Self {
        Self {
            tuning: config.director.clone(),
            timing: config.turns.clone(),
            mapper: GridMapper::new(&config.grid),
            enemies: config.enemies.clone(),
            waves: config.waves.clone(),
            rng: ChaCha8Rng::seed_from_u64(config.director.seed),
            base_level: 0,
            waves_spawned: 0,
            cleared: false,
        }
    }

    /// Difficulty level accumulated from elapsed time.
    #[must_use]
    pub fn base_level(&self) -> u32 {
        self.base_level
    }

    /// Stage for the provided player rank.
    #[must_use]
    pub fn stage(&self, player_rank: u32) -> Stage {
        Stage::from_parts(player_rank, self.base_level)
    }

    /// Number of waves spawned since the session began.
    #[must_use]
    pub fn waves_spawned(&self) -> u32 {
        self.waves_spawned
    }

    /// Consumes world events and emits spawn, timer, and completion commands.
    pub fn handle(
        &mut self,
        events: &[Event],
        state: SessionState,
        player_rank: u32,
        out: &mut Vec<Command>,
    ) {
        for event in events {
            match event {
                Event::SessionRestarted => self.reset(),
                Event::SessionStarted => {
                    out.push(Command::ScheduleTimer {
                        timer: TimerKey::Spawn,
                        after: self.tuning.first_spawn_delay(),
                    });
                    out.push(Command::ScheduleTimer {
                        timer: TimerKey::DifficultyStep,
                        after: self.tuning.difficulty_interval(),
                    });
                }
                Event::TimerFired { timer } if state.is_running() && !self.cleared => {
                    match timer {
                        TimerKey::DifficultyStep => self.step_difficulty(player_rank, out),
                        TimerKey::Spawn => self.spawn_next(player_rank, out),
                        _ => {}
                    }
                }
                _ => {}
            }
        }
    }

    fn reset(&mut self) {
        self.rng = ChaCha8Rng::seed_from_u64(self.tuning.seed);
        self.base_level = 0;
        self.waves_spawned = 0;
        self.cleared = false;
    }

    fn step_difficulty(&mut self, player_rank: u32, out: &mut Vec<Command>) {
        self.base_level = self.base_level.saturating_add(1);
        let stage = self.stage(player_rank);
        info!(
            base_level = self.base_level,
            stage = stage.get(),
            "difficulty raised"
        );
        if self.clear_if_capped(stage, out) {
            return;
        }
        out.push(Command::ScheduleTimer {
            timer: TimerKey::DifficultyStep,
            after: self.tuning.difficulty_interval(),
        });
    }

    fn spawn_next(&mut self, player_rank: u32, out: &mut Vec<Command>) {
        let stage = self.stage(player_rank);
        if self.clear_if_capped(stage, out) {
            return;
        }

        if let Some(wave) = select_wave(&self.waves, stage, self.tuning.top_candidates, &mut self.rng)
        {
            debug!(wave = %wave.id, difficulty = wave.difficulty, stage = stage.get(), "wave selected");
            self.waves_spawned = self.waves_spawned.saturating_add(1);
            for descriptor in &wave.enemies {
                let Some(enemy) = self
                    .enemies
                    .iter()
                    .find(|enemy| enemy.id == descriptor.enemy_type)
                else {
                    debug!(kind = %descriptor.enemy_type, wave = %wave.id, "unknown enemy type skipped");
                    continue;
                };
                if !self.mapper.contains_column(descriptor.grid_x) {
                    debug!(column = descriptor.grid_x, wave = %wave.id, "spawn column outside grid skipped");
                    continue;
                }
                out.push(Command::SpawnAgent {
                    enemy: enemy.clone(),
                    cell: GridCell::new(
                        descriptor.grid_x,
                        descriptor.grid_y.saturating_sub(self.tuning.entry_rows),
                    ),
                    destination_row: descriptor.grid_y,
                });
            }
        }

        out.push(Command::ScheduleTimer {
            timer: TimerKey::Spawn,
            after: self
                .timing
                .turn_duration(stage)
                .saturating_mul(self.tuning.gap_steps),
        });
    }

    fn clear_if_capped(&mut self, stage: Stage, out: &mut Vec<Command>) -> bool {
        if stage.get() < self.tuning.stage_cap {
            return false;
        }
        if !self.cleared {
            self.cleared = true;
            info!(stage = stage.get(), "stage cap reached");
            out.push(Command::EndSession {
                outcome: SessionOutcome::GameClear,
            });
        }
        true
    }
}

/// Chooses a wave for the stage, or `None` when the catalog is empty.
///
/// Candidates are the waves whose difficulty does not exceed the stage, then
/// the difficulty-one waves, then the whole catalog. The `top` hardest
/// candidates are kept and one is picked uniformly.
pub fn select_wave<'a, R>(
    waves: &'a [WaveDefinition],
    stage: Stage,
    top: usize,
    rng: &mut R,
) -> Option<&'a WaveDefinition>
where
    R: Rng,
{
    let mut candidates: Vec<&WaveDefinition> = waves
        .iter()
        .filter(|wave| wave.difficulty <= stage.get())
        .collect();
    if candidates.is_empty() {
        candidates = waves.iter().filter(|wave| wave.difficulty == 1).collect();
    }
    if candidates.is_empty() {
        candidates = waves.iter().collect();
    }
    if candidates.is_empty() {
        return None;
    }

    candidates.sort_by(|a, b| b.difficulty.cmp(&a.difficulty));
    candidates.truncate(top.max(1));
    let index = rng.gen_range(0..candidates.len());
    candidates.get(index).copied()
}
