//! Entity-Component-System implementation
//!
//! Entities are opaque ids, components are plain data stored per type, and
//! systems hold the logic. The [`World`] ties them together and runs the
//! systems once per tick.

pub mod entity;
pub mod component;
pub mod storage;
pub mod system;
pub mod world;

#[cfg(test)]
mod tests;

pub use entity::{Entity, EntityManager};
pub use component::{AnyComponent, Component, ComponentType};
pub use storage::ComponentManager;
pub use system::{System, SystemContext, SystemError, SystemState};
pub use world::{World, WorldError};
