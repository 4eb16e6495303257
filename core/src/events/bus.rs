// flowdeck/src/events/bus.rs

//! Defines the `EventBus`, a synchronous, single-dispatch publish/subscribe hub.
//!
//! Handlers run in registration order on the emitting thread. A handler that
//! returns an error or panics is logged and skipped; the remaining handlers for
//! the same event still run. Emits nested deeper than [`MAX_EMIT_DEPTH`] on
//! one thread are dropped, which breaks handler cycles.

use parking_lot::RwLock;
use serde_json::Value;
use std::cell::Cell;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::{event, instrument, Level};

/// Type alias for an event handler.
///
/// Handlers receive the emitted payload by reference and report failure through
/// `anyhow::Result`. Failures never propagate to the emitter.
pub type EventHandler = Arc<dyn Fn(&Value) -> anyhow::Result<()> + Send + Sync + 'static>;

/// Maximum nesting of `emit` calls made from inside handlers.
pub const MAX_EMIT_DEPTH: usize = 32;

thread_local! {
  static EMIT_DEPTH: Cell<usize> = const { Cell::new(0) };
}

struct DepthGuard;

impl DepthGuard {
  fn enter() -> Option<Self> {
    EMIT_DEPTH.with(|depth| {
      if depth.get() >= MAX_EMIT_DEPTH {
        None
      } else {
        depth.set(depth.get() + 1);
        Some(DepthGuard)
      }
    })
  }
}

impl Drop for DepthGuard {
  fn drop(&mut self) {
    EMIT_DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
  }
}

/// Opaque identifier of one registered handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

struct Listener {
  id: SubscriptionId,
  handler: EventHandler,
  once: bool,
}

#[derive(Default)]
struct BusInner {
  listeners: RwLock<HashMap<String, Vec<Listener>>>,
  next_id: AtomicU64,
}

impl BusInner {
  fn remove(&self, event_type: &str, id: SubscriptionId) -> bool {
    let mut listeners = self.listeners.write();
    let Some(list) = listeners.get_mut(event_type) else {
      return false;
    };
    let before = list.len();
    list.retain(|l| l.id != id);
    let removed = list.len() != before;
    if list.is_empty() {
      listeners.remove(event_type);
    }
    removed
  }
}

/// Handle returned by [`EventBus::on`]. Dropping it does not unsubscribe.
#[derive(Clone)]
pub struct Subscription {
  bus: Weak<BusInner>,
  event_type: String,
  id: SubscriptionId,
}

impl Subscription {
  pub fn id(&self) -> SubscriptionId {
    self.id
  }

  pub fn event_type(&self) -> &str {
    &self.event_type
  }

  /// Removes the handler from the bus. Returns `false` if it was already gone
  /// or the bus no longer exists.
  pub fn unsubscribe(&self) -> bool {
    match self.bus.upgrade() {
      Some(inner) => inner.remove(&self.event_type, self.id),
      None => false,
    }
  }
}

impl std::fmt::Debug for Subscription {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Subscription")
      .field("event_type", &self.event_type)
      .field("id", &self.id)
      .field("bus_alive", &(self.bus.strong_count() > 0))
      .finish()
  }
}

/// Synchronous event hub.
#[derive(Default)]
pub struct EventBus {
  inner: Arc<BusInner>,
}

impl EventBus {
  pub fn new() -> Self {
    Self::default()
  }

  /// Subscribes `handler` to `event_type`.
  pub fn on<F>(&self, event_type: &str, handler: F) -> Subscription
  where
    F: Fn(&Value) -> anyhow::Result<()> + Send + Sync + 'static,
  {
    self.subscribe(event_type, Arc::new(handler), false)
  }

  /// Subscribes an already shared handler.
  pub fn on_shared(&self, event_type: &str, handler: EventHandler) -> Subscription {
    self.subscribe(event_type, handler, false)
  }

  /// Subscribes a handler that is removed after its first delivery.
  pub fn once<F>(&self, event_type: &str, handler: F) -> Subscription
  where
    F: Fn(&Value) -> anyhow::Result<()> + Send + Sync + 'static,
  {
    self.subscribe(event_type, Arc::new(handler), true)
  }

  fn subscribe(&self, event_type: &str, handler: EventHandler, once: bool) -> Subscription {
    let id = SubscriptionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
    self
      .inner
      .listeners
      .write()
      .entry(event_type.to_string())
      .or_default()
      .push(Listener { id, handler, once });
    event!(Level::TRACE, %event_type, subscription = id.0, once, "Handler subscribed.");
    Subscription {
      bus: Arc::downgrade(&self.inner),
      event_type: event_type.to_string(),
      id,
    }
  }

  /// Removes the handler registered under `id` for `event_type`.
  pub fn off(&self, event_type: &str, id: SubscriptionId) -> bool {
    self.inner.remove(event_type, id)
  }

  /// Delivers `payload` to every handler of `event_type`, in registration order.
  ///
  /// Returns the number of handlers that completed without error. The handler
  /// list is snapshotted first, so handlers may emit or (un)subscribe freely.
  /// Past [`MAX_EMIT_DEPTH`] nested emits the event is dropped and 0 returned.
  #[instrument(name = "EventBus::emit", skip(self, payload), level = "trace")]
  pub fn emit(&self, event_type: &str, payload: &Value) -> usize {
    let Some(_depth) = DepthGuard::enter() else {
      event!(Level::ERROR, %event_type, max_depth = MAX_EMIT_DEPTH, "Nested emit too deep, event dropped.");
      return 0;
    };
    let snapshot: Vec<(SubscriptionId, EventHandler, bool)> = {
      let listeners = self.inner.listeners.read();
      match listeners.get(event_type) {
        Some(list) => list.iter().map(|l| (l.id, l.handler.clone(), l.once)).collect(),
        None => return 0,
      }
    };

    if snapshot.iter().any(|(_, _, once)| *once) {
      for (id, _, once) in &snapshot {
        if *once {
          self.inner.remove(event_type, *id);
        }
      }
    }

    let mut delivered = 0;
    for (id, handler, _) in snapshot {
      match catch_unwind(AssertUnwindSafe(|| handler(payload))) {
        Ok(Ok(())) => delivered += 1,
        Ok(Err(e)) => {
          event!(Level::ERROR, %event_type, subscription = id.0, error = %e, "Event handler failed.");
        }
        Err(_) => {
          event!(Level::ERROR, %event_type, subscription = id.0, "Event handler panicked.");
        }
      }
    }
    delivered
  }

  pub fn listener_count(&self, event_type: &str) -> usize {
    self.inner.listeners.read().get(event_type).map_or(0, Vec::len)
  }

  pub fn has_listeners(&self, event_type: &str) -> bool {
    self.listener_count(event_type) > 0
  }

  /// Removes every handler for every event type.
  pub fn clear(&self) {
    self.inner.listeners.write().clear();
  }
}

impl std::fmt::Debug for EventBus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let listeners = self.inner.listeners.read();
    let mut types: Vec<&String> = listeners.keys().collect();
    types.sort();
    f.debug_struct("EventBus").field("event_types", &types).finish()
  }
}
