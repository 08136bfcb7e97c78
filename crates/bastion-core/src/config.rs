//! Configuration loading and typed config structures for Bastion.
//!
//! The canonical configuration lives in `bastion-config.yaml`. Every
//! section is optional: a missing section or field takes the default
//! documented on its struct. Gameplay constants live in the `rules`
//! section and are handed to the kernel unchanged.

use std::path::Path;

use bastion_kernel::RulesConfig;
use serde::Deserialize;

/// Environment variable that overrides `logging.level`.
pub const LOG_LEVEL_ENV: &str = "BASTION_LOG";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SimulationConfig {
    /// Map size, seed and the players to seat.
    #[serde(default)]
    pub world: WorldConfig,

    /// Clock settings.
    #[serde(default)]
    pub time: TimeConfig,

    /// Gameplay constants consumed by commands and tick hooks.
    #[serde(default)]
    pub rules: RulesConfig,

    /// Run length of the engine binary.
    #[serde(default)]
    pub simulation: SessionConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `BASTION_LOG` overrides `logging.level` when set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.logging.apply_env_overrides();
        Ok(config)
    }
}

/// World generation settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldConfig {
    /// Human-readable simulation name.
    #[serde(default = "default_world_name")]
    pub name: String,

    /// Terrain seed; the same seed yields the same map.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Map width in tiles.
    #[serde(default = "default_dimension")]
    pub width: u32,

    /// Map height in tiles.
    #[serde(default = "default_dimension")]
    pub height: u32,

    /// Player names, one start corner each (at most four).
    #[serde(default = "default_players")]
    pub players: Vec<String>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: default_world_name(),
            seed: default_seed(),
            width: default_dimension(),
            height: default_dimension(),
            players: default_players(),
        }
    }
}

/// Clock settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TimeConfig {
    /// Tick the world starts at.
    #[serde(default)]
    pub start_tick: u64,
}

/// How long the engine binary runs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionConfig {
    /// Number of command/advance steps.
    #[serde(default = "default_max_steps")]
    pub max_steps: u64,

    /// Ticks advanced after each step's commands.
    #[serde(default = "default_ticks_per_step")]
    pub ticks_per_step: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
            ticks_per_step: default_ticks_per_step(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive (trace, debug, info, warn, error, or a full
    /// `EnvFilter` directive). `RUST_LOG` still wins at runtime.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl LoggingConfig {
    /// Override the level from `BASTION_LOG` when it is set.
    pub fn apply_env_overrides(&mut self) {
        self.apply_level_override(std::env::var(LOG_LEVEL_ENV).ok());
    }

    /// Replace the level with `value` unless it is absent or blank.
    pub fn apply_level_override(&mut self, value: Option<String>) {
        if let Some(level) = value.filter(|v| !v.trim().is_empty()) {
            self.level = level;
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

fn default_world_name() -> String {
    "Bastion Skirmish".to_owned()
}

const fn default_seed() -> u64 {
    42
}

const fn default_dimension() -> u32 {
    32
}

fn default_players() -> Vec<String> {
    vec!["Red".to_owned(), "Blue".to_owned()]
}

const fn default_max_steps() -> u64 {
    40
}

const fn default_ticks_per_step() -> u64 {
    5
}

fn default_log_level() -> String {
    "info".to_owned()
}
