// src/lib.rs

//! Flowdeck: the extensibility engine of a visual workflow diagram editor.
//!
//! Flowdeck keeps track of everything a diagram editor can put on its canvas,
//! and lets plugins and JSON documents extend that set at runtime:
//!  - A synchronous event bus that isolates failing listeners.
//!  - Typed registries for node, edge, rule, theme, category and context-menu definitions.
//!  - A plugin manager with dependency checks and async lifecycle hooks.
//!  - An inheritance engine deriving node types from eight fixed archetypes.
//!  - Per-type property schemas with validation and entity synchronisation.
//!  - A JSON bridge that validates node/plugin documents and wires declarative triggers.

pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod inheritance;
pub mod model;
pub mod plugin;
pub mod properties;
pub mod registry;

// --- Re-exports for the Public API ---

pub use crate::context::Registries;
pub use crate::error::{FlowdeckError, FlowdeckResult};
pub use crate::events::{EventBus, Subscription, SubscriptionId};

pub use crate::model::{BaseNodeConfig, ConnectionRules, EdgeEntity, Entity, JsonMap, LocalizedText, NodeMetadata};

pub use crate::registry::{
  CategoryConfig, CategoryRegistry, ContextMenuConfig, ContextMenuItem, ContextMenuRegistry, EdgeConfig, EdgeRegistry,
  MenuTarget, NodeRegistry, Registry, RegistryItem, RuleConfig, RuleRegistry, ThemeConfig, ThemeRegistry,
};

pub use crate::inheritance::{
  create_inherited_node_config, validate_inheritance, BaseNodeType, NodeConfigOverrides, PropertyFieldPatch,
};

pub use crate::properties::{PropertyConfigRegistry, PropertyFieldDefinition, PropertyGroupDefinition};

pub use crate::plugin::{Plugin, PluginManager, PluginMetadata, PluginResources, StaticPlugin};

pub use crate::config::{BatchRegistration, BridgeOptions, JsonConfigBridge, PluginDocument};

/*
    Typical wiring:
    1. `let registries = Registries::shared();` builds the bus and every registry.
    2. `PluginManager::new(registries.clone())` installs and activates code plugins.
    3. `JsonConfigBridge::new(registries.clone())?` loads node types from JSON
       documents, a string or a URL.
    4. The rendering layer reads from `registries.nodes`, `registries.properties`
       and `registries.context_menus`, and listens on `registries.bus`.
*/
