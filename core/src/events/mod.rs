// flowdeck/src/events/mod.rs

//! Synchronous publish/subscribe hub shared by every registry and the plugin manager.

pub mod bus;
pub mod names;

pub use bus::{EventBus, EventHandler, Subscription, SubscriptionId, MAX_EMIT_DEPTH};
