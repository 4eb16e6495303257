// tests/event_bus_tests.rs
mod common;

use common::*;
use flowdeck::events::MAX_EMIT_DEPTH;
use flowdeck::EventBus;
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;

#[test]
fn test_handlers_run_in_registration_order() {
  setup_tracing();
  let bus = EventBus::new();
  let order = Arc::new(Mutex::new(Vec::new()));
  for label in ["first", "second", "third"] {
    let order = order.clone();
    bus.on("node:created", move |_| {
      order.lock().push(label);
      Ok(())
    });
  }

  let delivered = bus.emit("node:created", &json!({ "id": "n1" }));
  assert_eq!(delivered, 3);
  assert_eq!(*order.lock(), vec!["first", "second", "third"]);
}

#[test]
fn test_failing_handler_does_not_block_later_handlers() {
  setup_tracing();
  let bus = EventBus::new();
  bus.on("property:changed", |_| Err(anyhow::anyhow!("listener exploded")));
  bus.on("property:changed", |_| panic!("listener panicked"));
  let (recorder, _sub) = EventRecorder::attach(&bus, "property:changed");

  let delivered = bus.emit("property:changed", &json!({ "field": "label" }));
  assert_eq!(delivered, 1, "only the healthy handler counts as delivered");
  assert_eq!(recorder.count(), 1);
}

#[test]
fn test_unsubscribe_and_off() {
  setup_tracing();
  let bus = EventBus::new();
  let (recorder, sub) = EventRecorder::attach(&bus, "node:updated");
  let (other, other_sub) = EventRecorder::attach(&bus, "node:updated");

  assert!(sub.unsubscribe());
  assert!(!sub.unsubscribe(), "second unsubscribe finds nothing");
  bus.emit("node:updated", &json!({}));
  assert_eq!(recorder.count(), 0);
  assert_eq!(other.count(), 1);

  assert!(bus.off("node:updated", other_sub.id()));
  bus.emit("node:updated", &json!({}));
  assert_eq!(other.count(), 1);
  assert!(!bus.has_listeners("node:updated"));
}

#[test]
fn test_once_handler_fires_once() {
  setup_tracing();
  let bus = EventBus::new();
  let hits = Arc::new(Mutex::new(0));
  let hits_clone = hits.clone();
  bus.once("plugin:loaded", move |_| {
    *hits_clone.lock() += 1;
    Ok(())
  });

  bus.emit("plugin:loaded", &json!({}));
  bus.emit("plugin:loaded", &json!({}));
  assert_eq!(*hits.lock(), 1);
  assert_eq!(bus.listener_count("plugin:loaded"), 0);
}

#[test]
fn test_handlers_may_emit_and_subscribe_reentrantly() {
  setup_tracing();
  let bus = Arc::new(EventBus::new());
  let (downstream, _sub) = EventRecorder::attach(&bus, "downstream");

  let weak = Arc::downgrade(&bus);
  bus.on("upstream", move |payload| {
    if let Some(bus) = weak.upgrade() {
      bus.emit("downstream", payload);
      bus.on("late", |_| Ok(()));
    }
    Ok(())
  });

  bus.emit("upstream", &json!({ "hop": 1 }));
  assert_eq!(downstream.last(), Some(json!({ "hop": 1 })));
  assert_eq!(bus.listener_count("late"), 1);
}

#[test]
fn test_handler_cycles_stop_at_max_depth() {
  setup_tracing();
  let bus = Arc::new(EventBus::new());
  let hits = Arc::new(Mutex::new(0usize));

  for (source, target) in [("ping", "pong"), ("pong", "ping")] {
    let weak = Arc::downgrade(&bus);
    let hits = hits.clone();
    bus.on(source, move |payload| {
      *hits.lock() += 1;
      if let Some(bus) = weak.upgrade() {
        bus.emit(target, payload);
      }
      Ok(())
    });
  }

  assert_eq!(bus.emit("ping", &json!({})), 1);
  assert_eq!(*hits.lock(), MAX_EMIT_DEPTH);

  let (recorder, _sub) = EventRecorder::attach(&bus, "after");
  bus.emit("after", &json!({ "ok": true }));
  assert_eq!(recorder.count(), 1);
}

#[test]
fn test_emit_without_listeners_and_clear() {
  setup_tracing();
  let bus = EventBus::new();
  assert_eq!(bus.emit("nobody:listens", &json!(null)), 0);

  let (_recorder, _sub) = EventRecorder::attach(&bus, "a");
  let (_recorder_b, _sub_b) = EventRecorder::attach(&bus, "b");
  bus.clear();
  assert_eq!(bus.listener_count("a"), 0);
  assert_eq!(bus.listener_count("b"), 0);
}
