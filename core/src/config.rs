//! Read-only configuration: tuning sections and the content catalogs.

use std::{collections::HashSet, fmt, time::Duration};

use serde::Deserialize;
use thiserror::Error;

use crate::{AiProfile, GridConfig, TurnTiming};

/// Complete configuration consumed by a session.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Logical screen layout.
    pub grid: GridConfig,
    /// Turn rhythm.
    pub turns: TurnTiming,
    /// Wave and difficulty pacing.
    pub director: DirectorTuning,
    /// Combo scoring.
    pub combo: ComboTuning,
    /// Player rank ladder.
    pub player: PlayerTuning,
    /// Enemy catalog.
    pub enemies: Vec<EnemyDefinition>,
    /// Wave catalog.
    pub waves: Vec<WaveDefinition>,
    /// Player attack-pattern catalog.
    pub patterns: Vec<AttackPattern>,
}

impl GameConfig {
    /// Rejects structurally invalid configurations.
    ///
    /// Dangling references between catalogs are tolerated; consumers skip them.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid.columns == 0 {
            return Err(ConfigError::NoColumns);
        }
        if !(self.grid.screen_width > 0.0 && self.grid.screen_height > 0.0) {
            return Err(ConfigError::InvalidScreen {
                width: self.grid.screen_width,
                height: self.grid.screen_height,
            });
        }

        ensure_unique("enemy", self.enemies.iter().map(|enemy| enemy.id.as_str()))?;
        ensure_unique("wave", self.waves.iter().map(|wave| wave.id.as_str()))?;
        ensure_unique(
            "pattern",
            self.patterns.iter().map(|pattern| pattern.id.as_str()),
        )?;

        for enemy in &self.enemies {
            validate_profile(enemy)?;
        }
        for wave in &self.waves {
            if wave.difficulty == 0 {
                return Err(ConfigError::ZeroDifficulty(wave.id.clone()));
            }
        }
        Ok(())
    }

    /// Looks up an enemy definition by identifier.
    #[must_use]
    pub fn enemy(&self, id: &EnemyKindId) -> Option<&EnemyDefinition> {
        self.enemies.iter().find(|enemy| &enemy.id == id)
    }

    /// Looks up an attack pattern by identifier.
    #[must_use]
    pub fn pattern(&self, id: &PatternId) -> Option<&AttackPattern> {
        self.patterns.iter().find(|pattern| &pattern.id == id)
    }
}

fn ensure_unique<'a>(
    catalog: &'static str,
    ids: impl Iterator<Item = &'a str>,
) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(ConfigError::DuplicateId {
                catalog,
                id: id.to_owned(),
            });
        }
    }
    Ok(())
}

fn validate_profile(enemy: &EnemyDefinition) -> Result<(), ConfigError> {
    match &enemy.ai_profile {
        None => Ok(()),
        Some(AiProfile::GridMove { move_pattern }) if move_pattern.is_empty() => {
            Err(ConfigError::EmptyProfile(enemy.id.clone()))
        }
        Some(AiProfile::StrategicMove {
            movable_angles,
            speed_rate,
        }) => {
            if movable_angles.is_empty() {
                return Err(ConfigError::EmptyProfile(enemy.id.clone()));
            }
            if !(speed_rate.is_finite() && *speed_rate >= 0.0) {
                return Err(ConfigError::InvalidSpeedRate(enemy.id.clone()));
            }
            Ok(())
        }
        Some(AiProfile::GridMove { .. }) => Ok(()),
    }
}

/// Errors reported while validating configuration data.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// The grid declares zero columns.
    #[error("grid must declare at least one column")]
    NoColumns,
    /// The logical screen has a non-positive dimension.
    #[error("screen size {width}x{height} must be positive")]
    InvalidScreen {
        /// Configured width.
        width: f32,
        /// Configured height.
        height: f32,
    },
    /// Two catalog entries share an identifier.
    #[error("duplicate {catalog} id `{id}`")]
    DuplicateId {
        /// Catalog containing the duplicate.
        catalog: &'static str,
        /// Repeated identifier.
        id: String,
    },
    /// A wave declares difficulty zero.
    #[error("wave `{0}` must have difficulty of at least 1")]
    ZeroDifficulty(WaveId),
    /// A movement profile declares no candidates.
    #[error("enemy `{0}` declares a movement profile without candidates")]
    EmptyProfile(EnemyKindId),
    /// A strategic profile declares a negative or non-finite speed rate.
    #[error("enemy `{0}` declares an invalid speed rate")]
    InvalidSpeedRate(EnemyKindId),
    /// A colour string is not of the form `#rrggbb`.
    #[error("invalid colour `{0}`, expected #rrggbb")]
    InvalidColor(String),
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates an identifier from its textual form.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Textual form of the identifier.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Identifier of an enemy type in the catalog.
    EnemyKindId
);
string_id!(
    /// Identifier of a wave template.
    WaveId
);
string_id!(
    /// Identifier of a player attack pattern.
    PatternId
);

/// Display colour applied to an agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct AgentColor {
    red: u8,
    green: u8,
    blue: u8,
}

impl AgentColor {
    /// Creates a colour from byte RGB components.
    #[must_use]
    pub const fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Red component of the colour.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.red
    }

    /// Green component of the colour.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.green
    }

    /// Blue component of the colour.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.blue
    }
}

impl Default for AgentColor {
    fn default() -> Self {
        Self::from_rgb(0x8b, 0x45, 0x13)
    }
}

impl TryFrom<String> for AgentColor {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let invalid = || ConfigError::InvalidColor(value.clone());
        let hex = value.strip_prefix('#').ok_or_else(invalid)?;
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(invalid());
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| invalid())
        };
        Ok(Self::from_rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

/// Enemy catalog entry.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct EnemyDefinition {
    /// Catalog identifier.
    pub id: EnemyKindId,
    /// Starting health.
    pub hp: u32,
    /// Base points awarded for a kill.
    pub score: u32,
    /// Movement speed in logical units per second.
    pub speed: f32,
    /// Display colour.
    #[serde(default)]
    pub color: AgentColor,
    /// Movement profile; absent means [`AiProfile::straight_down`].
    #[serde(default)]
    pub ai_profile: Option<AiProfile>,
    /// Attack pattern fired by this enemy, if any.
    #[serde(default)]
    pub pattern_id: Option<PatternId>,
}

impl EnemyDefinition {
    /// Movement profile, falling back to the default when none is declared.
    #[must_use]
    pub fn profile(&self) -> AiProfile {
        self.ai_profile.clone().unwrap_or_default()
    }
}

/// Wave catalog entry.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct WaveDefinition {
    /// Catalog identifier.
    pub id: WaveId,
    /// Difficulty tier, at least one.
    pub difficulty: u32,
    /// Agents spawned by the wave.
    #[serde(default)]
    pub enemies: Vec<SpawnDescriptor>,
}

/// Single agent placement inside a wave.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct SpawnDescriptor {
    /// Enemy type to spawn.
    #[serde(rename = "type")]
    pub enemy_type: EnemyKindId,
    /// Column the agent settles into.
    pub grid_x: i32,
    /// Row the agent must reach before roaming freely.
    pub grid_y: i32,
}

/// Player attack pattern entry.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct AttackPattern {
    /// Catalog identifier.
    pub id: PatternId,
    /// Interval between volleys.
    pub interval_ms: u64,
    /// Projectiles fired per volley.
    #[serde(default)]
    pub projectiles: Vec<ProjectileSpec>,
}

/// One projectile in an attack pattern.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct ProjectileSpec {
    /// Launch angle in degrees.
    pub angle: f32,
    /// Launch speed in logical units per second.
    pub speed: f32,
}

/// Tuning for the wave and difficulty director.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DirectorTuning {
    /// Wall-clock interval after which the base difficulty level increments.
    pub difficulty_interval_ms: u64,
    /// Number of hardest unlocked waves the random choice is drawn from.
    pub top_candidates: usize,
    /// Turns between consecutive spawns.
    pub gap_steps: u32,
    /// Rows above its target at which an agent is created.
    pub entry_rows: i32,
    /// Delay before the first spawn of a session.
    pub first_spawn_delay_ms: u64,
    /// Stage at which the session is cleared.
    pub stage_cap: u32,
    /// Seed for wave selection.
    pub seed: u64,
}

impl Default for DirectorTuning {
    fn default() -> Self {
        Self {
            difficulty_interval_ms: 30_000,
            top_candidates: 3,
            gap_steps: 2,
            entry_rows: 10,
            first_spawn_delay_ms: 1_000,
            stage_cap: 20,
            seed: 0x6b6f_6d61_7275_7368,
        }
    }
}

impl DirectorTuning {
    /// Interval between base difficulty increments.
    #[must_use]
    pub const fn difficulty_interval(&self) -> Duration {
        Duration::from_millis(self.difficulty_interval_ms)
    }

    /// Delay before the first spawn.
    #[must_use]
    pub const fn first_spawn_delay(&self) -> Duration {
        Duration::from_millis(self.first_spawn_delay_ms)
    }
}

/// Tuning for combo scoring.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ComboTuning {
    /// Time without a kill after which the combo resets.
    pub window_ms: u64,
    /// Fraction of base points added per combo step.
    ///
    /// Resolved to thousandths; finer digits are rounded away.
    pub rate: f64,
}

impl Default for ComboTuning {
    fn default() -> Self {
        Self {
            window_ms: 3_000,
            rate: 0.1,
        }
    }
}

impl ComboTuning {
    /// Decay window.
    #[must_use]
    pub const fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    /// Combo rate in thousandths, rounded to the nearest step and clamped at zero.
    #[must_use]
    pub fn rate_per_mille(&self) -> u64 {
        let rate = (self.rate * 1_000.0).round();
        if rate.is_finite() && rate > 0.0 {
            rate as u64
        } else {
            0
        }
    }
}

/// Tuning for the player rank ladder.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    /// Highest reachable rank.
    pub max_rank: u32,
    /// Invulnerability after a demotion.
    pub invincibility_ms: u64,
    /// Delay between the player's destruction and game over.
    pub game_over_delay_ms: u64,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            max_rank: 7,
            invincibility_ms: 1_600,
            game_over_delay_ms: 1_000,
        }
    }
}

impl PlayerTuning {
    /// Invulnerability window.
    #[must_use]
    pub const fn invincibility(&self) -> Duration {
        Duration::from_millis(self.invincibility_ms)
    }

    /// Game-over delay.
    #[must_use]
    pub const fn game_over_delay(&self) -> Duration {
        Duration::from_millis(self.game_over_delay_ms)
    }
}
