//! Entity implementation
//!
//! Entities are bare identifiers. All data attached to them lives in the
//! [`ComponentManager`](crate::ecs::ComponentManager).

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ecs::{ComponentManager, ComponentType};

/// Entity identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Entity {
    id: u64,
}

impl Entity {
    /// Create an entity handle from a raw id
    ///
    /// Used when rebuilding a world from saved data. Fresh entities should come
    /// from [`EntityManager::create_entity`].
    pub const fn from_raw(id: u64) -> Self {
        Self { id }
    }

    /// Get the entity ID
    pub const fn id(self) -> u64 {
        self.id
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({})", self.id)
    }
}

/// Mints and retires entity identifiers
///
/// Ids are sequential and start at 1. A retired id is never handed out again,
/// except after [`EntityManager::reset`], which wipes component storage first.
#[derive(Debug)]
pub struct EntityManager {
    /// `None` once every id up to `u64::MAX` has been handed out or restored
    next_entity_id: Option<u64>,
    live: IndexSet<Entity>,
}

impl EntityManager {
    /// Create an empty entity manager
    pub fn new() -> Self {
        Self {
            next_entity_id: Some(1),
            live: IndexSet::new(),
        }
    }

    /// Create a new entity
    ///
    /// # Panics
    ///
    /// Panics if the id space is exhausted, which only happens after an entity
    /// with id `u64::MAX` has been created or restored.
    pub fn create_entity(&mut self) -> Entity {
        let Some(id) = self.next_entity_id else {
            panic!("entity id space exhausted");
        };
        let entity = Entity::from_raw(id);
        self.next_entity_id = id.checked_add(1);
        self.live.insert(entity);
        log::trace!("Created {entity}");
        entity
    }

    /// Register an externally minted entity as live
    ///
    /// Keeps the id counter ahead of `entity` so later calls to
    /// [`create_entity`](Self::create_entity) cannot collide with it.
    pub fn restore_entity(&mut self, entity: Entity) -> bool {
        if let Some(next) = self.next_entity_id {
            self.next_entity_id = entity.id().checked_add(1).map(|after| next.max(after));
        }
        self.live.insert(entity)
    }

    /// Destroy an entity and every component attached to it
    ///
    /// Returns `false` if the entity was not live. Components are removed
    /// either way, so data attached to a never-registered id is still cleaned up.
    pub fn destroy_entity(&mut self, entity: Entity, components: &mut ComponentManager) -> bool {
        let was_live = self.live.shift_remove(&entity);
        let removed = components.remove_all_components(entity);
        if was_live {
            log::trace!("Destroyed {entity} ({removed} components)");
        }
        was_live
    }

    /// Check whether an entity is live
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.live.contains(&entity)
    }

    /// Number of live entities
    pub fn entity_count(&self) -> usize {
        self.live.len()
    }

    /// Snapshot of all live entities in creation order
    ///
    /// The returned `Vec` is detached from the manager, so callers may create
    /// or destroy entities while walking it.
    pub fn get_all_entities(&self) -> Vec<Entity> {
        self.live.iter().copied().collect()
    }

    /// Live entities holding a component whose type name is `type_name`
    ///
    /// Order follows component insertion order.
    pub fn get_entities_by_component(&self, components: &ComponentManager, type_name: &str) -> Vec<Entity> {
        components
            .entities_with_name(type_name)
            .into_iter()
            .filter(|entity| self.live.contains(entity))
            .collect()
    }

    /// Typed counterpart of [`get_entities_by_component`](Self::get_entities_by_component)
    pub fn get_entities_with(&self, components: &ComponentManager, component_type: ComponentType) -> Vec<Entity> {
        components
            .entities_with(component_type)
            .into_iter()
            .filter(|entity| self.live.contains(entity))
            .collect()
    }

    /// Forget every entity and restart ids at 1
    ///
    /// Component storage is cleared as part of the reset.
    pub fn reset(&mut self, components: &mut ComponentManager) {
        components.clear();
        self.live.clear();
        self.next_entity_id = Some(1);
    }
}

impl Default for EntityManager {
    fn default() -> Self {
        Self::new()
    }
}
