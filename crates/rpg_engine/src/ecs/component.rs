//! Component trait and type tokens

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Marker trait for components
///
/// A component is plain data attached to an entity. `TYPE_NAME` is the string
/// discriminant used for data-driven lookups, diagnostics and save files; the
/// Rust type itself is the schema.
pub trait Component: Any + fmt::Debug {
    /// Stable, human-readable name of this component type (e.g. `"health"`)
    const TYPE_NAME: &'static str;
}

/// Token identifying a component type
///
/// Equality and hashing only consider the Rust type, so two tokens for the
/// same `T` are interchangeable wherever they were created.
#[derive(Clone, Copy)]
pub struct ComponentType {
    id: TypeId,
    name: &'static str,
}

impl ComponentType {
    /// Token for component type `T`
    pub fn of<T: Component>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: T::TYPE_NAME,
        }
    }

    /// The component's `TYPE_NAME`
    pub const fn name(self) -> &'static str {
        self.name
    }

    /// Underlying Rust type id
    pub const fn type_id(self) -> TypeId {
        self.id
    }
}

impl PartialEq for ComponentType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ComponentType {}

impl Hash for ComponentType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ComponentType").field(&self.name).finish()
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Type-erased view of a stored component
///
/// Returned by [`ComponentManager::get_entity_components`](crate::ecs::ComponentManager::get_entity_components)
/// so callers can inspect or serialize every component on an entity without
/// knowing the concrete types up front.
pub trait AnyComponent: fmt::Debug {
    /// Name of the component type
    fn type_name(&self) -> &'static str;

    /// Token of the component type
    fn component_type(&self) -> ComponentType;

    /// Upcast for downcasting to the concrete type
    fn as_any(&self) -> &dyn Any;
}

impl<T: Component> AnyComponent for T {
    fn type_name(&self) -> &'static str {
        T::TYPE_NAME
    }

    fn component_type(&self) -> ComponentType {
        ComponentType::of::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl dyn AnyComponent + '_ {
    /// Downcast to the concrete component type
    pub fn downcast_ref<T: Component>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}
