//! System trait and the context systems run with

use thiserror::Error;

use crate::ecs::{Component, ComponentManager, ComponentType, Entity, EntityManager};
use crate::events::{DispatchReport, Event, EventError, EventSystem};
use crate::foundation::time::TimeManager;

/// Everything a system can reach during a lifecycle call
///
/// Managers are injected here by the [`World`](crate::ecs::World) for the
/// duration of one call; systems keep no references between ticks.
pub struct SystemContext<'w> {
    /// Entity lifecycle
    pub entities: &'w mut EntityManager,
    /// Component storage
    pub components: &'w mut ComponentManager,
    /// Event bus
    pub events: &'w EventSystem,
    /// Game clock
    pub time: &'w mut TimeManager,
}

impl SystemContext<'_> {
    /// Create a new entity
    pub fn create_entity(&mut self) -> Entity {
        self.entities.create_entity()
    }

    /// Destroy an entity and all its components
    pub fn destroy_entity(&mut self, entity: Entity) -> bool {
        self.entities.destroy_entity(entity, self.components)
    }

    /// Get a component from an entity
    pub fn get_component<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.components.get_component(entity)
    }

    /// Get a mutable component from an entity
    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        self.components.get_component_mut(entity)
    }

    /// Attach a component to an entity
    pub fn add_component<T: Component>(&mut self, entity: Entity, component: T) -> Option<T> {
        self.components.add_component(entity, component)
    }

    /// Remove a component from an entity
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> bool {
        self.components.remove_component::<T>(entity)
    }

    /// Entities holding all of the given component types
    pub fn entities_with_all(&self, required: &[ComponentType]) -> Vec<Entity> {
        self.components.entities_with_all(required)
    }

    /// Snapshot of every live entity
    pub fn get_all_entities(&self) -> Vec<Entity> {
        self.entities.get_all_entities()
    }

    /// Emit an event, stamping it with the current game time if unstamped
    pub fn emit(&mut self, mut event: Event) -> Result<DispatchReport, EventError> {
        if event.timestamp.is_none() {
            event.timestamp = Some(self.time.get_game_time());
        }
        self.events.emit(&event, self.components)
    }
}

/// Lifecycle position of a registered system
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemState {
    /// Registered, `on_initialize` not yet run (or it failed)
    Uninitialized,
    /// Receiving `update` every tick
    Initialized,
    /// `shutdown` has run
    ShutDown,
}

/// Errors a system can report from its lifecycle hooks
#[derive(Error, Debug)]
pub enum SystemError {
    /// A component, entity or resource the system depends on is missing
    #[error("Missing resource: {0}")]
    MissingResource(String),

    /// Emitting an event failed
    #[error("Event error: {0}")]
    Event(#[from] EventError),

    /// The system panicked inside a lifecycle hook
    #[error("Panicked: {0}")]
    Panicked(String),

    /// Custom system error
    #[error("System error: {0}")]
    Custom(String),
}

/// Stateful logic unit run once per tick
///
/// Systems keep their own cross-tick state (cooldowns, queues, tables); the
/// core only drives the lifecycle:
/// `on_initialize` once, `update` every tick, `shutdown` once at the end.
pub trait System {
    /// Name used in logs and diagnostics
    fn name(&self) -> &str;

    /// Component types an entity must hold to be returned by [`get_entities`](Self::get_entities)
    fn required_components(&self) -> &[ComponentType] {
        &[]
    }

    /// Called exactly once, before the first `update`
    fn on_initialize(&mut self, _ctx: &mut SystemContext<'_>) -> Result<(), SystemError> {
        Ok(())
    }

    /// Called every tick in registration order; `delta_time` may be zero
    fn update(&mut self, ctx: &mut SystemContext<'_>, delta_time: f32);

    /// Best-effort cleanup when the world shuts down
    fn shutdown(&mut self, _ctx: &mut SystemContext<'_>) -> Result<(), SystemError> {
        Ok(())
    }

    /// Entities holding *all* of [`required_components`](Self::required_components)
    ///
    /// A system that requires nothing matches nothing; such systems discover
    /// entities themselves, e.g. through [`SystemContext::get_all_entities`].
    fn get_entities(&self, ctx: &SystemContext<'_>) -> Vec<Entity> {
        ctx.entities_with_all(self.required_components())
    }
}
