// tests/common/mod.rs
#![allow(dead_code)] // Allow unused code in this common test module

use flowdeck::{EventBus, Registries, Subscription};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};
use tracing::Level;

// --- Helper for Tracing Setup (call once per test run if needed) ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer() // Important for tests to capture output
    .try_init()
    .ok(); // Allow multiple initializations in tests (ok if fails)
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

/// Fresh, isolated registries for one test.
pub fn registries() -> Arc<Registries> {
  setup_tracing();
  Registries::shared()
}

// --- Event recording ---

/// Collects every payload delivered for one event type.
#[derive(Clone, Default)]
pub struct EventRecorder {
  payloads: Arc<Mutex<Vec<Value>>>,
}

impl EventRecorder {
  pub fn attach(bus: &EventBus, event_type: &str) -> (Self, Subscription) {
    let recorder = Self::default();
    let sink = recorder.payloads.clone();
    let subscription = bus.on(event_type, move |payload| {
      sink.lock().push(payload.clone());
      Ok(())
    });
    (recorder, subscription)
  }

  pub fn count(&self) -> usize {
    self.payloads.lock().len()
  }

  pub fn payloads(&self) -> Vec<Value> {
    self.payloads.lock().clone()
  }

  pub fn last(&self) -> Option<Value> {
    self.payloads.lock().last().cloned()
  }
}

// --- Atomic counters for checking hook execution counts ---
pub static INSTALL_HOOK_COUNTER: Lazy<Arc<AtomicUsize>> = Lazy::new(|| Arc::new(AtomicUsize::new(0)));
pub static ACTIVATE_HOOK_COUNTER: Lazy<Arc<AtomicUsize>> = Lazy::new(|| Arc::new(AtomicUsize::new(0)));
pub static DEACTIVATE_HOOK_COUNTER: Lazy<Arc<AtomicUsize>> = Lazy::new(|| Arc::new(AtomicUsize::new(0)));
pub static UNINSTALL_HOOK_COUNTER: Lazy<Arc<AtomicUsize>> = Lazy::new(|| Arc::new(AtomicUsize::new(0)));

pub fn reset_counters() {
  INSTALL_HOOK_COUNTER.store(0, Ordering::SeqCst);
  ACTIVATE_HOOK_COUNTER.store(0, Ordering::SeqCst);
  DEACTIVATE_HOOK_COUNTER.store(0, Ordering::SeqCst);
  UNINSTALL_HOOK_COUNTER.store(0, Ordering::SeqCst);
}
