//! Event system
//!
//! Synchronous publish/subscribe bus that decouples gameplay systems.
//!
//! - Events carry a string kind and key-value arguments (no order dependency)
//! - Handlers run in subscription order, inside [`EventSystem::emit`]
//! - A failing or panicking handler is logged and skipped; the rest still run
//! - Handlers may emit follow-up events, which are delivered depth-first
//!
//! All methods take `&self` so a handler can publish, subscribe or unsubscribe
//! while a dispatch is in flight. The bus is single-threaded (`!Sync`).

use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SlotMap};
use std::borrow::Cow;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use thiserror::Error;

use crate::ecs::{ComponentManager, Entity};

/// Default bound on nested emits from inside handlers
pub const DEFAULT_MAX_DISPATCH_DEPTH: u32 = 32;

new_key_type! {
    /// Handle returned by [`EventSystem::subscribe`], used to unsubscribe
    pub struct SubscriptionId;
}

/// Variant for type-safe event arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventArg {
    /// Entity reference
    Entity(Entity),
    /// Signed integer (currency, counts, item ids)
    Int(i64),
    /// Floating point value
    Float(f64),
    /// Flag
    Bool(bool),
    /// Free-form text (item names, reasons)
    Text(String),
}

impl From<Entity> for EventArg {
    fn from(value: Entity) -> Self {
        Self::Entity(value)
    }
}

impl From<i64> for EventArg {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for EventArg {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u32> for EventArg {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for EventArg {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for EventArg {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<String> for EventArg {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for EventArg {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

/// Event with a kind discriminant and key-value arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    kind: Cow<'static, str>,
    /// Game time (ms) at which the event was produced, if the producer stamped it
    pub timestamp: Option<f64>,
    args: HashMap<String, EventArg>,
}

impl Event {
    /// Create a new event of the given kind
    pub fn new(kind: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind: kind.into(),
            timestamp: None,
            args: HashMap::new(),
        }
    }

    /// Set the timestamp (builder pattern)
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: f64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Add an argument to the event (builder pattern)
    #[must_use]
    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<EventArg>) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }

    /// The event kind
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Get an argument by key
    pub fn get_arg(&self, key: &str) -> Option<&EventArg> {
        self.args.get(key)
    }

    /// Get an entity argument if present
    pub fn get_entity(&self, key: &str) -> Option<Entity> {
        match self.get_arg(key) {
            Some(EventArg::Entity(entity)) => Some(*entity),
            _ => None,
        }
    }

    /// Get an integer argument if present
    pub fn get_int(&self, key: &str) -> Option<i64> {
        match self.get_arg(key) {
            Some(EventArg::Int(value)) => Some(*value),
            _ => None,
        }
    }

    /// Get a float argument if present
    ///
    /// Integer arguments are widened.
    #[allow(clippy::cast_precision_loss)]
    pub fn get_float(&self, key: &str) -> Option<f64> {
        match self.get_arg(key) {
            Some(EventArg::Float(value)) => Some(*value),
            Some(EventArg::Int(value)) => Some(*value as f64),
            _ => None,
        }
    }

    /// Get a boolean argument if present
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.get_arg(key) {
            Some(EventArg::Bool(value)) => Some(*value),
            _ => None,
        }
    }

    /// Get a text argument if present
    pub fn get_text(&self, key: &str) -> Option<&str> {
        match self.get_arg(key) {
            Some(EventArg::Text(value)) => Some(value),
            _ => None,
        }
    }
}

/// Result returned by event handlers
pub type HandlerResult = Result<(), Box<dyn std::error::Error>>;

type Handler = Rc<RefCell<dyn FnMut(&Event, &mut EventContext<'_>) -> HandlerResult>>;

/// What a handler can reach while it runs
pub struct EventContext<'a> {
    /// Shared component storage
    pub components: &'a mut ComponentManager,
    /// The bus that is dispatching, for follow-up events
    pub events: &'a EventSystem,
}

impl EventContext<'_> {
    /// Emit a follow-up event; it is delivered before this call returns
    pub fn emit(&mut self, event: &Event) -> Result<DispatchReport, EventError> {
        self.events.emit(event, self.components)
    }
}

/// Outcome of a single [`EventSystem::emit`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Handlers that ran and returned `Ok`
    pub delivered: usize,
    /// Handlers that returned `Err` or panicked
    pub failed: usize,
    /// Handlers skipped because they were already running further up the stack
    pub skipped: usize,
}

/// Event system errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EventError {
    /// Nested emits went deeper than the configured bound
    #[error("dispatch of '{kind}' exceeded maximum depth {max_depth}")]
    DispatchDepthExceeded {
        /// Kind of the event that was dropped
        kind: String,
        /// Configured bound
        max_depth: u32,
    },
}

struct Registration {
    kind: String,
    handler: Handler,
}

/// Event system with per-kind handler registration
pub struct EventSystem {
    subscriptions: RefCell<SlotMap<SubscriptionId, Registration>>,
    by_kind: RefCell<HashMap<String, Vec<SubscriptionId>>>,
    depth: Cell<u32>,
    max_depth: u32,
    emitted: Cell<u64>,
}

impl EventSystem {
    /// Create a new empty event system
    pub fn new() -> Self {
        Self::with_max_depth(DEFAULT_MAX_DISPATCH_DEPTH)
    }

    /// Create an event system with a custom nesting bound
    pub fn with_max_depth(max_depth: u32) -> Self {
        Self {
            subscriptions: RefCell::new(SlotMap::with_key()),
            by_kind: RefCell::new(HashMap::new()),
            depth: Cell::new(0),
            max_depth: max_depth.max(1),
            emitted: Cell::new(0),
        }
    }

    /// Register a handler for an event kind
    ///
    /// Handlers added while a dispatch is running are first called on the
    /// next emit.
    pub fn subscribe<F>(&self, kind: impl Into<String>, handler: F) -> SubscriptionId
    where
        F: FnMut(&Event, &mut EventContext<'_>) -> HandlerResult + 'static,
    {
        let kind = kind.into();
        let handler: Handler = Rc::new(RefCell::new(handler));
        let id = self.subscriptions.borrow_mut().insert(Registration {
            kind: kind.clone(),
            handler,
        });
        log::trace!("Subscribed {id:?} to '{kind}'");
        self.by_kind.borrow_mut().entry(kind).or_default().push(id);
        id
    }

    /// Alias for [`subscribe`](Self::subscribe)
    pub fn on<F>(&self, kind: impl Into<String>, handler: F) -> SubscriptionId
    where
        F: FnMut(&Event, &mut EventContext<'_>) -> HandlerResult + 'static,
    {
        self.subscribe(kind, handler)
    }

    /// Remove a handler
    ///
    /// Takes effect immediately, including for a dispatch in progress.
    /// Returns `false` if the id was unknown or already removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let Some(registration) = self.subscriptions.borrow_mut().remove(id) else {
            return false;
        };
        let mut by_kind = self.by_kind.borrow_mut();
        if let Some(ids) = by_kind.get_mut(&registration.kind) {
            ids.retain(|other| *other != id);
            if ids.is_empty() {
                by_kind.remove(&registration.kind);
            }
        }
        true
    }

    /// Remove every handler for a kind, returning how many were removed
    pub fn unsubscribe_all(&self, kind: &str) -> usize {
        let ids = self.by_kind.borrow_mut().remove(kind).unwrap_or_default();
        let mut subscriptions = self.subscriptions.borrow_mut();
        ids.into_iter()
            .filter(|id| subscriptions.remove(*id).is_some())
            .count()
    }

    /// Number of handlers registered for a kind
    pub fn handler_count(&self, kind: &str) -> usize {
        self.by_kind.borrow().get(kind).map_or(0, Vec::len)
    }

    /// Total number of registered handlers
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.borrow().len()
    }

    /// Number of top-level and nested emits accepted so far
    pub fn emitted_count(&self) -> u64 {
        self.emitted.get()
    }

    /// Configured nesting bound
    pub const fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Drop every handler
    pub fn clear(&self) {
        self.subscriptions.borrow_mut().clear();
        self.by_kind.borrow_mut().clear();
    }

    /// Deliver an event to every handler registered for its kind
    ///
    /// Delivery is synchronous: all handler side effects are visible when this
    /// returns. Handler failures are isolated and reported in the
    /// [`DispatchReport`]; the only error is exceeding the nesting bound.
    pub fn emit(&self, event: &Event, components: &mut ComponentManager) -> Result<DispatchReport, EventError> {
        let depth = self.depth.get();
        if depth >= self.max_depth {
            log::error!(
                "Dropping '{}': dispatch depth {} reached the limit",
                event.kind(),
                depth
            );
            return Err(EventError::DispatchDepthExceeded {
                kind: event.kind().to_owned(),
                max_depth: self.max_depth,
            });
        }

        let handlers = self.snapshot(event.kind());
        self.emitted.set(self.emitted.get() + 1);
        self.depth.set(depth + 1);

        let mut report = DispatchReport::default();
        for (id, handler) in handlers {
            if !self.subscriptions.borrow().contains_key(id) {
                continue;
            }
            let Ok(mut callback) = handler.try_borrow_mut() else {
                log::warn!("Handler {id:?} is already handling an event, skipping '{}'", event.kind());
                report.skipped += 1;
                continue;
            };

            let mut ctx = EventContext {
                components: &mut *components,
                events: self,
            };
            match panic::catch_unwind(AssertUnwindSafe(|| (&mut *callback)(event, &mut ctx))) {
                Ok(Ok(())) => report.delivered += 1,
                Ok(Err(err)) => {
                    log::error!("Handler {id:?} failed on '{}': {err}", event.kind());
                    report.failed += 1;
                }
                Err(payload) => {
                    log::error!(
                        "Handler {id:?} panicked on '{}': {}",
                        event.kind(),
                        panic_message(payload.as_ref())
                    );
                    report.failed += 1;
                }
            }
        }

        self.depth.set(depth);
        Ok(report)
    }

    fn snapshot(&self, kind: &str) -> Vec<(SubscriptionId, Handler)> {
        let by_kind = self.by_kind.borrow();
        let Some(ids) = by_kind.get(kind) else {
            return Vec::new();
        };
        let subscriptions = self.subscriptions.borrow();
        ids.iter()
            .filter_map(|id| {
                subscriptions
                    .get(*id)
                    .map(|registration| (*id, Rc::clone(&registration.handler)))
            })
            .collect()
    }
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}

impl Default for EventSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSystem")
            .field("subscriptions", &self.subscription_count())
            .field("max_depth", &self.max_depth)
            .field("emitted", &self.emitted.get())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::Component;

    #[derive(Debug, PartialEq)]
    struct Wallet {
        gold: i64,
    }

    impl Component for Wallet {
        const TYPE_NAME: &'static str = "wallet";
    }

    fn recorder() -> Rc<RefCell<Vec<&'static str>>> {
        Rc::new(RefCell::new(Vec::new()))
    }

    #[test]
    fn test_handlers_run_in_subscription_order() {
        let events = EventSystem::new();
        let mut components = ComponentManager::new();
        let calls = recorder();

        let log1 = Rc::clone(&calls);
        events.subscribe("X", move |_, _| {
            log1.borrow_mut().push("h1");
            Ok(())
        });
        let log2 = Rc::clone(&calls);
        events.on("X", move |_, _| {
            log2.borrow_mut().push("h2");
            Ok(())
        });

        let report = events.emit(&Event::new("X"), &mut components).unwrap();

        assert_eq!(*calls.borrow(), vec!["h1", "h2"]);
        assert_eq!(report.delivered, 2);
    }

    #[test]
    fn test_unmatched_kind_is_a_no_op() {
        let events = EventSystem::new();
        let mut components = ComponentManager::new();
        events.subscribe("X", |_, _| Ok(()));

        let report = events.emit(&Event::new("Y"), &mut components).unwrap();
        assert_eq!(report, DispatchReport::default());
    }

    #[test]
    fn test_side_effects_visible_after_emit() {
        let events = EventSystem::new();
        let mut components = ComponentManager::new();
        let player = Entity::from_raw(1);
        components.add_component(player, Wallet { gold: 10 });

        events.subscribe("gold_awarded", |event, ctx| {
            let target = event.get_entity("target").ok_or("missing target")?;
            let amount = event.get_int("amount").ok_or("missing amount")?;
            if let Some(wallet) = ctx.components.get_component_mut::<Wallet>(target) {
                wallet.gold += amount;
            }
            Ok(())
        });

        let award = Event::new("gold_awarded")
            .with_arg("target", player)
            .with_arg("amount", 25_i64);
        events.emit(&award, &mut components).unwrap();

        assert_eq!(components.get_component::<Wallet>(player), Some(&Wallet { gold: 35 }));
    }

    #[test]
    fn test_failing_handlers_are_isolated() {
        let events = EventSystem::new();
        let mut components = ComponentManager::new();
        let calls = recorder();

        events.subscribe("X", |_, _| Err("broken listener".into()));
        events.subscribe("X", |_, _| panic!("exploding listener"));
        let log = Rc::clone(&calls);
        events.subscribe("X", move |_, _| {
            log.borrow_mut().push("survivor");
            Ok(())
        });

        let report = events.emit(&Event::new("X"), &mut components).unwrap();

        assert_eq!(report.failed, 2);
        assert_eq!(report.delivered, 1);
        assert_eq!(*calls.borrow(), vec!["survivor"]);

        // The panicking handler stays registered and the bus keeps working
        let again = events.emit(&Event::new("X"), &mut components).unwrap();
        assert_eq!(again.delivered, 1);
    }

    #[test]
    fn test_unsubscribe() {
        let events = EventSystem::new();
        let mut components = ComponentManager::new();
        let calls = recorder();

        let log = Rc::clone(&calls);
        let id = events.subscribe("X", move |_, _| {
            log.borrow_mut().push("h");
            Ok(())
        });
        assert!(events.unsubscribe(id));
        assert!(!events.unsubscribe(id));
        assert_eq!(events.handler_count("X"), 0);

        events.emit(&Event::new("X"), &mut components).unwrap();
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn test_unsubscribe_all() {
        let events = EventSystem::new();
        events.subscribe("X", |_, _| Ok(()));
        events.subscribe("X", |_, _| Ok(()));
        events.subscribe("Y", |_, _| Ok(()));

        assert_eq!(events.unsubscribe_all("X"), 2);
        assert_eq!(events.subscription_count(), 1);
        events.clear();
        assert_eq!(events.subscription_count(), 0);
    }

    #[test]
    fn test_unsubscribe_during_dispatch_skips_later_handler() {
        let events = EventSystem::new();
        let mut components = ComponentManager::new();
        let calls = recorder();
        let victim: Rc<Cell<Option<SubscriptionId>>> = Rc::new(Cell::new(None));

        let target = Rc::clone(&victim);
        events.subscribe("X", move |_, ctx| {
            if let Some(id) = target.get() {
                ctx.events.unsubscribe(id);
            }
            Ok(())
        });
        let log = Rc::clone(&calls);
        let id = events.subscribe("X", move |_, _| {
            log.borrow_mut().push("victim");
            Ok(())
        });
        victim.set(Some(id));

        events.emit(&Event::new("X"), &mut components).unwrap();
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn test_subscribe_during_dispatch_applies_next_emit() {
        let events = EventSystem::new();
        let mut components = ComponentManager::new();
        let calls = recorder();

        let log = Rc::clone(&calls);
        let mut installed = false;
        events.subscribe("X", move |_, ctx| {
            if !installed {
                installed = true;
                let inner = Rc::clone(&log);
                ctx.events.subscribe("X", move |_, _| {
                    inner.borrow_mut().push("late");
                    Ok(())
                });
            }
            Ok(())
        });

        events.emit(&Event::new("X"), &mut components).unwrap();
        assert!(calls.borrow().is_empty());
        events.emit(&Event::new("X"), &mut components).unwrap();
        assert_eq!(*calls.borrow(), vec!["late"]);
    }

    #[test]
    fn test_nested_emit_is_delivered_depth_first() {
        let events = EventSystem::new();
        let mut components = ComponentManager::new();
        let calls = recorder();

        let log = Rc::clone(&calls);
        events.subscribe("outer", move |_, ctx| {
            log.borrow_mut().push("outer:start");
            ctx.emit(&Event::new("inner"))?;
            log.borrow_mut().push("outer:end");
            Ok(())
        });
        let log = Rc::clone(&calls);
        events.subscribe("inner", move |_, _| {
            log.borrow_mut().push("inner");
            Ok(())
        });

        events.emit(&Event::new("outer"), &mut components).unwrap();
        assert_eq!(*calls.borrow(), vec!["outer:start", "inner", "outer:end"]);
        assert_eq!(events.emitted_count(), 2);
    }

    #[test]
    fn test_recursive_emit_hits_depth_limit() {
        let events = EventSystem::with_max_depth(4);
        let mut components = ComponentManager::new();
        let errors: Rc<RefCell<Vec<EventError>>> = Rc::new(RefCell::new(Vec::new()));

        // Each level is a fresh handler so reentry protection does not kick in
        for level in 0..8 {
            let sink = Rc::clone(&errors);
            events.subscribe(format!("level{level}"), move |_, ctx| {
                if let Err(err) = ctx.emit(&Event::new(format!("level{}", level + 1))) {
                    sink.borrow_mut().push(err);
                }
                Ok(())
            });
        }

        events.emit(&Event::new("level0"), &mut components).unwrap();

        assert_eq!(
            *errors.borrow(),
            vec![EventError::DispatchDepthExceeded {
                kind: "level4".to_owned(),
                max_depth: 4,
            }]
        );
        // Depth is restored once the outermost emit returns
        assert!(events.emit(&Event::new("level7"), &mut components).is_ok());
    }

    #[test]
    fn test_self_reentry_is_skipped() {
        let events = EventSystem::new();
        let mut components = ComponentManager::new();
        let nested: Rc<Cell<Option<DispatchReport>>> = Rc::new(Cell::new(None));

        let sink = Rc::clone(&nested);
        events.subscribe("echo", move |_, ctx| {
            if sink.get().is_none() {
                let report = ctx.emit(&Event::new("echo"))?;
                sink.set(Some(report));
            }
            Ok(())
        });

        let outer = events.emit(&Event::new("echo"), &mut components).unwrap();
        assert_eq!(outer.delivered, 1);
        assert_eq!(
            nested.get(),
            Some(DispatchReport {
                delivered: 0,
                failed: 0,
                skipped: 1
            })
        );
    }

    #[test]
    fn test_event_args() {
        let entity = Entity::from_raw(3);
        let event = Event::new("item_crafted")
            .with_timestamp(1500.0)
            .with_arg("crafter", entity)
            .with_arg("quantity", 2_u32)
            .with_arg("quality", 0.75)
            .with_arg("masterwork", false)
            .with_arg("item", "iron sword");

        assert_eq!(event.kind(), "item_crafted");
        assert_eq!(event.timestamp, Some(1500.0));
        assert_eq!(event.get_entity("crafter"), Some(entity));
        assert_eq!(event.get_int("quantity"), Some(2));
        assert_eq!(event.get_float("quantity"), Some(2.0));
        assert_eq!(event.get_float("quality"), Some(0.75));
        assert_eq!(event.get_bool("masterwork"), Some(false));
        assert_eq!(event.get_text("item"), Some("iron sword"));
        assert_eq!(event.get_int("item"), None);
        assert!(event.get_arg("missing").is_none());
    }
}
