//! # RPG Engine
//!
//! The simulation core of a data-driven role-playing game: an
//! Entity-Component-System world, a string-keyed event bus and a pausable,
//! scalable game clock with timers.
//!
//! ## Features
//!
//! - **ECS Architecture**: Typed component storage keyed by entity
//! - **Events**: Publish/subscribe with typed payloads and reentrant dispatch
//! - **Game Time**: Pause, time scale and game-time timers
//! - **Config**: TOML and RON configuration files
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rpg_engine::prelude::*;
//!
//! #[derive(Debug)]
//! struct Health(i32);
//!
//! impl Component for Health {
//!     const TYPE_NAME: &'static str = "Health";
//! }
//!
//! struct Regen {
//!     required: Vec<ComponentType>,
//! }
//!
//! impl System for Regen {
//!     fn name(&self) -> &str {
//!         "regen"
//!     }
//!
//!     fn required_components(&self) -> &[ComponentType] {
//!         &self.required
//!     }
//!
//!     fn update(&mut self, ctx: &mut SystemContext<'_>, _delta_time: f32) {
//!         for entity in self.get_entities(ctx) {
//!             if let Some(health) = ctx.get_component_mut::<Health>(entity) {
//!                 health.0 += 1;
//!             }
//!         }
//!     }
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut world = World::new();
//!     let hero = world.create_entity();
//!     world.components_mut().add_component(hero, Health(10));
//!     world.add_system(Regen { required: vec![ComponentType::of::<Health>()] })?;
//!     world.initialize()?;
//!     world.update(0.016);
//!     world.shutdown()?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Core engine modules
pub mod core;

pub mod foundation;
pub mod ecs;
pub mod events;
pub mod config;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError},
        core::config::{EngineConfig, LoggingConfig, TimeConfig, WorldConfig},
        ecs::{
            AnyComponent, Component, ComponentManager, ComponentType, Entity, EntityManager, System,
            SystemContext, SystemError, SystemState, World, WorldError,
        },
        events::{DispatchReport, Event, EventArg, EventContext, EventError, EventSystem, HandlerResult, SubscriptionId},
        foundation::time::{Clock, ManualClock, SystemClock, TimeManager, Timer, TimerId, TimerMode, TimerQueue},
    };
}
