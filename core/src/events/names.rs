// flowdeck/src/events/names.rs

//! Well-known event type names.

pub const NODE_CREATED: &str = "node:created";
pub const NODE_UPDATED: &str = "node:updated";
pub const NODE_DELETED: &str = "node:deleted";
pub const PROPERTY_CHANGED: &str = "property:changed";

pub const REGISTRY_ITEM_REGISTERED: &str = "registry:item-registered";
pub const REGISTRY_ITEM_UNREGISTERED: &str = "registry:item-unregistered";

pub const PLUGIN_LOADED: &str = "plugin:loaded";
pub const PLUGIN_UNLOADED: &str = "plugin:unloaded";
pub const PLUGIN_ACTIVATED: &str = "plugin:activated";
pub const PLUGIN_DEACTIVATED: &str = "plugin:deactivated";
