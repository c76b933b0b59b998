//! Component Storage
//!
//! The [`ComponentManager`] is the only place component data lives. Storage is
//! two-level: component type → (entity → component). Each inner map is a typed
//! store behind a small object-safe trait so the manager can hold every
//! component type side by side.
//!
//! Absence is never an error here. Gameplay systems poll storage every tick
//! ("does this entity have a shop?"), so missing data comes back as `None`,
//! `false` or an empty collection.

use indexmap::IndexMap;
use std::any::Any;

use crate::ecs::{AnyComponent, Component, ComponentType, Entity};

/// Type-erased operations over one component type's inner map
trait ComponentStore {
    fn remove(&mut self, entity: Entity) -> bool;
    fn contains(&self, entity: Entity) -> bool;
    fn len(&self) -> usize;
    fn entities(&self) -> Vec<Entity>;
    fn get_erased(&self, entity: Entity) -> Option<&dyn AnyComponent>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Inner map for a single component type, kept in insertion order
struct TypedStore<T: Component> {
    components: IndexMap<Entity, T>,
}

impl<T: Component> TypedStore<T> {
    fn new() -> Self {
        Self {
            components: IndexMap::new(),
        }
    }
}

impl<T: Component> ComponentStore for TypedStore<T> {
    fn remove(&mut self, entity: Entity) -> bool {
        self.components.shift_remove(&entity).is_some()
    }

    fn contains(&self, entity: Entity) -> bool {
        self.components.contains_key(&entity)
    }

    fn len(&self) -> usize {
        self.components.len()
    }

    fn entities(&self) -> Vec<Entity> {
        self.components.keys().copied().collect()
    }

    fn get_erased(&self, entity: Entity) -> Option<&dyn AnyComponent> {
        self.components.get(&entity).map(|c| c as &dyn AnyComponent)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Owner of all component data
#[derive(Default)]
pub struct ComponentManager {
    stores: IndexMap<ComponentType, Box<dyn ComponentStore>>,
}

impl ComponentManager {
    /// Create an empty component manager
    pub fn new() -> Self {
        Self::default()
    }

    fn typed_store<T: Component>(&self) -> Option<&TypedStore<T>> {
        self.stores
            .get(&ComponentType::of::<T>())?
            .as_any()
            .downcast_ref::<TypedStore<T>>()
    }

    fn typed_store_mut<T: Component>(&mut self) -> Option<&mut TypedStore<T>> {
        self.stores
            .get_mut(&ComponentType::of::<T>())?
            .as_any_mut()
            .downcast_mut::<TypedStore<T>>()
    }

    /// Attach a component to an entity, replacing any previous value of the same type
    ///
    /// The entity is not checked for liveness: components may be attached
    /// while an entity is still being assembled. Returns the replaced value.
    pub fn add_component<T: Component>(&mut self, entity: Entity, component: T) -> Option<T> {
        let component_type = ComponentType::of::<T>();
        let store = self
            .stores
            .entry(component_type)
            .or_insert_with(|| Box::new(TypedStore::<T>::new()));
        match store.as_any_mut().downcast_mut::<TypedStore<T>>() {
            Some(store) => store.components.insert(entity, component),
            None => unreachable!("store registered for {component_type} holds a different type"),
        }
    }

    /// Remove a component from an entity
    ///
    /// Returns `true` if something was removed. The type's inner map is dropped
    /// as soon as it becomes empty.
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> bool {
        self.take_component::<T>(entity).is_some()
    }

    /// Remove a component by type token
    pub fn remove_component_of(&mut self, entity: Entity, component_type: ComponentType) -> bool {
        let Some(store) = self.stores.get_mut(&component_type) else {
            return false;
        };
        let removed = store.remove(entity);
        if store.len() == 0 {
            self.stores.shift_remove(&component_type);
        }
        removed
    }

    /// Remove a component and hand it back to the caller
    pub fn take_component<T: Component>(&mut self, entity: Entity) -> Option<T> {
        let store = self.typed_store_mut::<T>()?;
        let taken = store.components.shift_remove(&entity);
        if store.components.is_empty() {
            self.stores.shift_remove(&ComponentType::of::<T>());
        }
        taken
    }

    /// Get a component from an entity
    pub fn get_component<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.typed_store::<T>()?.components.get(&entity)
    }

    /// Get a mutable component from an entity
    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        self.typed_store_mut::<T>()?.components.get_mut(&entity)
    }

    /// Check whether an entity has a component of type `T`
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.has_component_of(entity, ComponentType::of::<T>())
    }

    /// Check whether an entity has a component of the given type
    pub fn has_component_of(&self, entity: Entity, component_type: ComponentType) -> bool {
        self.stores
            .get(&component_type)
            .is_some_and(|store| store.contains(entity))
    }

    /// Iterate every instance of `T` in insertion order
    pub fn get_all_components<T: Component>(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.typed_store::<T>()
            .into_iter()
            .flat_map(|store| store.components.iter().map(|(entity, c)| (*entity, c)))
    }

    /// Iterate every instance of `T` mutably in insertion order
    pub fn get_all_components_mut<T: Component>(&mut self) -> impl Iterator<Item = (Entity, &mut T)> {
        self.typed_store_mut::<T>()
            .into_iter()
            .flat_map(|store| store.components.iter_mut().map(|(entity, c)| (*entity, c)))
    }

    /// Every component currently attached to an entity, across all types
    pub fn get_entity_components(&self, entity: Entity) -> Vec<&dyn AnyComponent> {
        self.stores
            .values()
            .filter_map(|store| store.get_erased(entity))
            .collect()
    }

    /// Remove every component attached to an entity
    ///
    /// Returns the number of components removed.
    pub fn remove_all_components(&mut self, entity: Entity) -> usize {
        let removed = self
            .stores
            .values_mut()
            .map(|store| store.remove(entity))
            .filter(|removed| *removed)
            .count();
        if removed > 0 {
            self.stores.retain(|_, store| store.len() > 0);
        }
        removed
    }

    /// Entities holding a component of the given type, in insertion order
    pub fn entities_with(&self, component_type: ComponentType) -> Vec<Entity> {
        self.stores
            .get(&component_type)
            .map(|store| store.entities())
            .unwrap_or_default()
    }

    /// Entities holding a component whose `TYPE_NAME` is `type_name`
    pub fn entities_with_name(&self, type_name: &str) -> Vec<Entity> {
        self.stores
            .iter()
            .filter(|(component_type, _)| component_type.name() == type_name)
            .flat_map(|(_, store)| store.entities())
            .collect()
    }

    /// Entities holding *all* of the given component types
    ///
    /// An empty `required` list matches nothing. Results follow the insertion
    /// order of the first required type.
    pub fn entities_with_all(&self, required: &[ComponentType]) -> Vec<Entity> {
        let Some((first, rest)) = required.split_first() else {
            return Vec::new();
        };
        let Some(store) = self.stores.get(first) else {
            return Vec::new();
        };
        store
            .entities()
            .into_iter()
            .filter(|&entity| rest.iter().all(|ty| self.has_component_of(entity, *ty)))
            .collect()
    }

    /// Names of all component types with at least one stored instance
    pub fn get_component_types(&self) -> Vec<&'static str> {
        self.stores.keys().map(|ty| ty.name()).collect()
    }

    /// Tokens of all component types with at least one stored instance
    pub fn component_types(&self) -> Vec<ComponentType> {
        self.stores.keys().copied().collect()
    }

    /// Total number of stored (type, entity) pairs
    pub fn get_component_count(&self) -> usize {
        self.stores.values().map(|store| store.len()).sum()
    }

    /// Drop all component data
    pub fn clear(&mut self) {
        self.stores.clear();
    }
}

impl std::fmt::Debug for ComponentManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.stores.iter().map(|(ty, store)| (ty.name(), store.len())))
            .finish()
    }
}
