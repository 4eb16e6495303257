// flowdeck/src/context.rs

//! The explicitly constructed service bundle every writer and reader shares.

use crate::events::EventBus;
use crate::properties::PropertyConfigRegistry;
use crate::registry::{CategoryRegistry, ContextMenuRegistry, EdgeRegistry, NodeRegistry, RuleRegistry, ThemeRegistry};
use serde_json::{json, Value};
use std::sync::Arc;

/// One event bus plus every registry wired to it.
///
/// Build one per editor instance (or per test) and share it behind an `Arc`.
pub struct Registries {
  pub bus: Arc<EventBus>,
  pub nodes: NodeRegistry,
  pub edges: EdgeRegistry,
  pub rules: RuleRegistry,
  pub themes: ThemeRegistry,
  pub categories: CategoryRegistry,
  pub context_menus: ContextMenuRegistry,
  pub properties: PropertyConfigRegistry,
}

impl Registries {
  pub fn new() -> Self {
    Self::with_bus(Arc::new(EventBus::new()))
  }

  pub fn with_bus(bus: Arc<EventBus>) -> Self {
    Self {
      nodes: NodeRegistry::new(bus.clone()),
      edges: EdgeRegistry::new(bus.clone()),
      rules: RuleRegistry::new(bus.clone()),
      themes: ThemeRegistry::new(bus.clone()),
      categories: CategoryRegistry::new(bus.clone()),
      context_menus: ContextMenuRegistry::new(bus.clone()),
      properties: PropertyConfigRegistry::new(),
      bus,
    }
  }

  /// Convenience for the common `Arc::new(Registries::new())`.
  pub fn shared() -> Arc<Self> {
    Arc::new(Self::new())
  }

  /// A JSON snapshot of what is registered, for debugging tools.
  pub fn diagnostics(&self) -> Value {
    json!({
      "nodes": { "count": self.nodes.size(), "types": self.nodes.ids(), "categories": self.nodes.categories() },
      "edges": { "count": self.edges.size(), "types": self.edges.ids() },
      "rules": { "count": self.rules.size() },
      "themes": {
        "count": self.themes.size(),
        "active": self.themes.active_theme().map(|t| t.id),
      },
      "categories": { "count": self.categories.size(), "ids": self.categories.ids() },
      "contextMenus": { "count": self.context_menus.size(), "ids": self.context_menus.ids() },
      "propertyGroups": {
        "nodeTypes": self.properties.node_types(),
        "edgeTypes": self.properties.edge_types(),
      },
    })
  }
}

impl Default for Registries {
  fn default() -> Self {
    Self::new()
  }
}

impl std::fmt::Debug for Registries {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Registries")
      .field("nodes", &self.nodes.size())
      .field("edges", &self.edges.size())
      .field("rules", &self.rules.size())
      .field("themes", &self.themes.size())
      .field("categories", &self.categories.size())
      .field("context_menus", &self.context_menus.size())
      .finish()
  }
}
