//! ECS World implementation
//!
//! The world is the composition root: it owns the entity and component
//! managers, the event bus, the game clock and the ordered system list, and it
//! drives the tick loop.
//!
//! Systems run in registration order, every tick. A system that reads state
//! written by another system in the same tick must be registered after it.

use std::panic::{self, AssertUnwindSafe};
use thiserror::Error;

use crate::core::config::{EngineConfig, WorldConfig};
use crate::ecs::{ComponentManager, Entity, EntityManager, System, SystemContext, SystemError, SystemState};
use crate::events::{panic_message, DispatchReport, Event, EventError, EventSystem};
use crate::foundation::time::TimeManager;

/// World lifecycle errors
#[derive(Error, Debug)]
pub enum WorldError {
    /// One or more systems failed `on_initialize`
    #[error("{count} system(s) failed to initialize")]
    InitializationFailed {
        /// Number of failing systems
        count: usize,
        /// System name and error, in registration order
        failures: Vec<(String, SystemError)>,
    },

    /// One or more systems failed `shutdown`
    #[error("{count} system(s) failed to shut down")]
    ShutdownFailed {
        /// Number of failing systems
        count: usize,
        /// System name and error, in registration order
        failures: Vec<(String, SystemError)>,
    },
}

struct SystemSlot {
    system: Box<dyn System>,
    state: SystemState,
}

/// ECS World containing all entities, components and systems
pub struct World {
    entities: EntityManager,
    components: ComponentManager,
    events: EventSystem,
    time: TimeManager,
    systems: Vec<SystemSlot>,
    initialized: bool,
    shut_down: bool,
    tick_count: u64,
    warn_on_negative_delta: bool,
}

impl World {
    /// Create a new world on the wall clock
    pub fn new() -> Self {
        Self::with_time_manager(TimeManager::new())
    }

    /// Create a new world driven by the given time manager
    pub fn with_time_manager(time: TimeManager) -> Self {
        Self {
            entities: EntityManager::new(),
            components: ComponentManager::new(),
            events: EventSystem::new(),
            time,
            systems: Vec::new(),
            initialized: false,
            shut_down: false,
            tick_count: 0,
            warn_on_negative_delta: true,
        }
    }

    /// Create a world on the wall clock with the given world settings
    pub fn with_config(config: &WorldConfig) -> Self {
        Self::new().apply_world_config(config)
    }

    /// Create a world configured from an [`EngineConfig`]
    ///
    /// The time settings are applied to `time` before the world takes it.
    pub fn from_config(config: &EngineConfig, mut time: TimeManager) -> Self {
        time.set_time_scale(config.time.time_scale);
        if config.time.start_paused {
            time.pause();
        }
        Self::with_time_manager(time).apply_world_config(&config.world)
    }

    fn apply_world_config(mut self, config: &WorldConfig) -> Self {
        self.events = EventSystem::with_max_depth(config.max_event_depth);
        self.warn_on_negative_delta = config.warn_on_negative_delta;
        self
    }

    /// Register a system at the end of the schedule
    ///
    /// If the world is already initialized the system is initialized right
    /// away, and its failure is returned.
    ///
    /// # Panics
    ///
    /// Panics if the world has been shut down.
    pub fn add_system(&mut self, system: impl System + 'static) -> Result<(), WorldError> {
        self.add_boxed_system(Box::new(system))
    }

    /// Register an already boxed system
    ///
    /// # Panics
    ///
    /// Panics if the world has been shut down.
    pub fn add_boxed_system(&mut self, system: Box<dyn System>) -> Result<(), WorldError> {
        assert!(!self.shut_down, "cannot add system '{}' to a shut down world", system.name());
        log::debug!("Registering system '{}'", system.name());
        self.systems.push(SystemSlot {
            system,
            state: SystemState::Uninitialized,
        });

        if !self.initialized {
            return Ok(());
        }
        let index = self.systems.len() - 1;
        match self.initialize_slot(index) {
            Ok(()) => Ok(()),
            Err(failure) => Err(WorldError::InitializationFailed {
                count: 1,
                failures: vec![failure],
            }),
        }
    }

    /// Initialize every registered system, in registration order
    ///
    /// A system whose `on_initialize` fails stays uninitialized and is never
    /// updated; the remaining systems are still initialized.
    ///
    /// # Panics
    ///
    /// Panics if called more than once.
    pub fn initialize(&mut self) -> Result<(), WorldError> {
        assert!(!self.initialized, "World::initialize called twice");
        self.initialized = true;
        log::info!("Initializing world with {} systems", self.systems.len());

        let failures: Vec<(String, SystemError)> = (0..self.systems.len())
            .filter_map(|index| self.initialize_slot(index).err())
            .collect();

        if failures.is_empty() {
            Ok(())
        } else {
            Err(WorldError::InitializationFailed {
                count: failures.len(),
                failures,
            })
        }
    }

    fn initialize_slot(&mut self, index: usize) -> Result<(), (String, SystemError)> {
        let slot = &mut self.systems[index];
        assert_eq!(
            slot.state,
            SystemState::Uninitialized,
            "system '{}' initialized twice",
            slot.system.name()
        );

        let mut ctx = SystemContext {
            entities: &mut self.entities,
            components: &mut self.components,
            events: &self.events,
            time: &mut self.time,
        };
        match slot.system.on_initialize(&mut ctx) {
            Ok(()) => {
                slot.state = SystemState::Initialized;
                log::debug!("Initialized system '{}'", slot.system.name());
                Ok(())
            }
            Err(err) => {
                log::error!("System '{}' failed to initialize: {err}", slot.system.name());
                Err((slot.system.name().to_owned(), err))
            }
        }
    }

    /// Advance every initialized system by one tick, in registration order
    ///
    /// `delta_time` is in seconds; zero is a legal tick. Negative and NaN values
    /// are clamped to zero.
    ///
    /// # Panics
    ///
    /// Panics if the world has not been initialized or has been shut down.
    pub fn update(&mut self, delta_time: f32) {
        assert!(self.initialized, "World::update called before World::initialize");
        assert!(!self.shut_down, "World::update called after World::shutdown");

        let delta_time = if delta_time.is_nan() || delta_time < 0.0 {
            if self.warn_on_negative_delta {
                log::warn!("Invalid delta time {delta_time}, clamping to 0");
            }
            0.0
        } else {
            delta_time
        };

        for slot in &mut self.systems {
            if slot.state != SystemState::Initialized {
                continue;
            }
            let mut ctx = SystemContext {
                entities: &mut self.entities,
                components: &mut self.components,
                events: &self.events,
                time: &mut self.time,
            };
            slot.system.update(&mut ctx, delta_time);
        }
        self.tick_count += 1;
    }

    /// Shut every initialized system down, in registration order
    ///
    /// Best effort: a failing or panicking system is logged and the rest still
    /// shut down. Calling this again is a no-op.
    pub fn shutdown(&mut self) -> Result<(), WorldError> {
        if self.shut_down {
            return Ok(());
        }
        self.shut_down = true;
        log::info!("Shutting down world after {} ticks", self.tick_count);

        let mut failures = Vec::new();
        for slot in &mut self.systems {
            if slot.state != SystemState::Initialized {
                continue;
            }
            slot.state = SystemState::ShutDown;
            let mut ctx = SystemContext {
                entities: &mut self.entities,
                components: &mut self.components,
                events: &self.events,
                time: &mut self.time,
            };
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| slot.system.shutdown(&mut ctx)))
                .unwrap_or_else(|payload| Err(SystemError::Panicked(panic_message(payload.as_ref()).to_owned())));
            if let Err(err) = outcome {
                log::error!("System '{}' failed to shut down: {err}", slot.system.name());
                failures.push((slot.system.name().to_owned(), err));
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(WorldError::ShutdownFailed {
                count: failures.len(),
                failures,
            })
        }
    }

    /// Create a new entity
    pub fn create_entity(&mut self) -> Entity {
        self.entities.create_entity()
    }

    /// Destroy an entity and all its components
    pub fn destroy_entity(&mut self, entity: Entity) -> bool {
        self.entities.destroy_entity(entity, &mut self.components)
    }

    /// Emit an event outside of any system
    pub fn emit(&mut self, event: &Event) -> Result<DispatchReport, EventError> {
        self.events.emit(event, &mut self.components)
    }

    /// Entity manager
    pub const fn entities(&self) -> &EntityManager {
        &self.entities
    }

    /// Mutable entity manager
    pub fn entities_mut(&mut self) -> &mut EntityManager {
        &mut self.entities
    }

    /// Component manager
    pub const fn components(&self) -> &ComponentManager {
        &self.components
    }

    /// Mutable component manager
    pub fn components_mut(&mut self) -> &mut ComponentManager {
        &mut self.components
    }

    /// Event bus
    pub const fn events(&self) -> &EventSystem {
        &self.events
    }

    /// Game clock
    pub const fn time(&self) -> &TimeManager {
        &self.time
    }

    /// Mutable game clock
    pub fn time_mut(&mut self) -> &mut TimeManager {
        &mut self.time
    }

    /// Number of completed ticks
    pub const fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Whether [`initialize`](Self::initialize) has run
    pub const fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Number of registered systems
    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// Names of registered systems in schedule order
    pub fn system_names(&self) -> Vec<&str> {
        self.systems.iter().map(|slot| slot.system.name()).collect()
    }

    /// Lifecycle state of the first system with the given name
    pub fn system_state(&self, name: &str) -> Option<SystemState> {
        self.systems
            .iter()
            .find(|slot| slot.system.name() == name)
            .map(|slot| slot.state)
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("entities", &self.entities.entity_count())
            .field("components", &self.components.get_component_count())
            .field("systems", &self.system_names())
            .field("tick_count", &self.tick_count)
            .finish_non_exhaustive()
    }
}
