//! # Unified Configuration System
//!
//! Configuration structures for the simulation core. Every section has
//! defaults, so a config file only needs the keys it overrides.
//!
//! ## Configuration Categories
//!
//! - **World Config**: Event dispatch limits and tick loop behavior
//! - **Time Config**: Initial time scale and pause state of the game clock
//! - **Logging Config**: Default log filter

use serde::{Serialize, Deserialize};

use crate::events::DEFAULT_MAX_DISPATCH_DEPTH;

pub use crate::config::{Config, ConfigError};

/// # World Configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Maximum nesting of emits from inside event handlers
    pub max_event_depth: u32,
    /// Whether a negative or NaN tick delta is logged before being clamped
    pub warn_on_negative_delta: bool,
}

impl WorldConfig {
    /// Create a new world configuration
    pub const fn new() -> Self {
        Self {
            max_event_depth: DEFAULT_MAX_DISPATCH_DEPTH,
            warn_on_negative_delta: true,
        }
    }

    /// Set the maximum event dispatch depth
    pub const fn with_max_event_depth(mut self, depth: u32) -> Self {
        self.max_event_depth = depth;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_event_depth == 0 {
            return Err("Max event depth must be at least 1".to_string());
        }
        Ok(())
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Time Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeConfig {
    /// Game time multiplier; `0.0` freezes game time
    pub time_scale: f64,
    /// Start with the clock paused
    pub start_paused: bool,
}

impl TimeConfig {
    /// Create a new time configuration
    pub const fn new() -> Self {
        Self {
            time_scale: 1.0,
            start_paused: false,
        }
    }

    /// Set the time scale
    pub const fn with_time_scale(mut self, scale: f64) -> Self {
        self.time_scale = scale;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.time_scale.is_finite() || self.time_scale < 0.0 {
            return Err(format!("Time scale must be a finite non-negative number, got {}", self.time_scale));
        }
        Ok(())
    }
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Logging Configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `env_logger` filter used when `RUST_LOG` is unset
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

/// # Engine Configuration
///
/// Top-level configuration that encompasses all core subsystems.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// World and scheduler settings
    pub world: WorldConfig,
    /// Game clock settings
    pub time: TimeConfig,
    /// Logging settings
    pub logging: LoggingConfig,
}

impl EngineConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), String> {
        self.world.validate()?;
        self.time.validate()?;
        Ok(())
    }
}

impl Config for EngineConfig {}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.world.max_event_depth, DEFAULT_MAX_DISPATCH_DEPTH);
        assert!(config.world.warn_on_negative_delta);
        assert_relative_eq!(config.time.time_scale, 1.0);
        assert!(!config.time.start_paused);
        assert_eq!(config.logging.filter, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let config = EngineConfig::from_toml_str(
            r#"
            [time]
            time_scale = 2.5

            [logging]
            filter = "rpg_engine=debug"
            "#,
        )
        .unwrap();
        assert_relative_eq!(config.time.time_scale, 2.5);
        assert!(!config.time.start_paused);
        assert_eq!(config.world, WorldConfig::default());
        assert_eq!(config.logging.filter, "rpg_engine=debug");
    }

    #[test]
    fn test_ron_section() {
        let config = EngineConfig::from_ron_str("(world: (max_event_depth: 4), time: (start_paused: true))").unwrap();
        assert_eq!(config.world.max_event_depth, 4);
        assert!(config.time.start_paused);
    }

    #[test]
    fn test_toml_text_round_trip() {
        let config = EngineConfig {
            world: WorldConfig::new().with_max_event_depth(8),
            time: TimeConfig::new().with_time_scale(0.5),
            logging: LoggingConfig::default(),
        };
        let text = config.to_toml_string().unwrap();
        assert_eq!(EngineConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = EngineConfig::default();
        config.world.max_event_depth = 0;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.time.time_scale = -1.0;
        assert!(config.validate().is_err());

        config.time.time_scale = f64::NAN;
        assert!(config.validate().is_err());
    }
}
