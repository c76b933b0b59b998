//! # Hearthvale
//!
//! A small headless village simulation on top of `rpg_engine`: a calendar,
//! regenerating heroes, a smithy on crafting timers and a market settled
//! through events.

pub mod components;
pub mod config;
pub mod events;
pub mod systems;
pub mod village;
