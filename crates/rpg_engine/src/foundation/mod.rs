//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the engine:
//! - Time management (game clock, timers)
//! - Logging utilities

pub mod time;
pub mod logging;
