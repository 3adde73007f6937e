//! Configuration loading from TOML.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use koma_rush_core::{ConfigError, GameConfig};
use thiserror::Error;

/// Configuration shipped with the engine.
pub const DEFAULT_CONFIG: &str = include_str!("../assets/koma_rush.toml");

/// Errors raised while loading a configuration.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The configuration file could not be read.
    #[error("failed to read configuration from {path}")]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The document is not valid TOML for the configuration schema.
    #[error("failed to parse configuration")]
    Parse(#[from] toml::de::Error),
    /// The document parsed but is structurally invalid.
    #[error("invalid configuration")]
    Invalid(#[from] ConfigError),
}

/// Parses and validates a configuration document.
pub fn parse_config(text: &str) -> Result<GameConfig, LoadError> {
    let config: GameConfig = toml::from_str(text)?;
    config.validate()?;
    Ok(config)
}

/// Reads, parses, and validates a configuration file.
pub fn load_config(path: &Path) -> Result<GameConfig, LoadError> {
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&text)
}

/// The built-in configuration.
pub fn default_config() -> Result<GameConfig, LoadError> {
    parse_config(DEFAULT_CONFIG)
}
