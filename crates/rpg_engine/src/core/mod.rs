//! # Core Engine Module
//!
//! Shared abstractions used by the rest of the engine.
//!
//! ## Organization
//!
//! - **Config**: Unified configuration for the world, the game clock and logging

pub mod config;

// Re-export commonly used config types
pub use config::{
    EngineConfig,
    WorldConfig,
    TimeConfig,
    LoggingConfig,
    Config,
    ConfigError,
};
