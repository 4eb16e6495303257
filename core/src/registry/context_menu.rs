// flowdeck/src/registry/context_menu.rs

//! Context menu registry and the merge of general and type-specific menus.
//!
//! For one target (node type, edge type or canvas) the registry collects the
//! items of every menu without a type filter ("general") and the items of the
//! first menu whose filter names the type ("specific"). The merge:
//!
//!  1. Specific items that already contain a reserved default id are a
//!     complete menu and are returned unchanged.
//!  2. General items named by `disable_default_items` are removed (`"all"`
//!     expands to every reserved id) and orphaned separators are cleaned up.
//!  3. Specific items are inserted before the `properties` item, fenced by
//!     separators unless one is already adjacent; without that anchor they
//!     are appended.
//!  4. A final pass drops leading, trailing and consecutive separators.

use super::item::RegistryItem;
use super::store::Registry;
use crate::events::EventBus;
use crate::model::LocalizedText;
use serde::{Deserialize, Serialize};
use std::ops::Deref;
use std::sync::Arc;
use tracing::{event, Level};

pub const CONTEXT_MENU_NAMESPACE: &str = "contextMenus";

pub const PROPERTIES_ITEM: &str = "properties";
pub const APPEARANCE_ITEM: &str = "appearance";
pub const DUPLICATE_ITEM: &str = "duplicate";
pub const DELETE_ITEM: &str = "delete";

/// Default item ids every editor menu may contain.
pub const RESERVED_ITEM_IDS: [&str; 4] = [PROPERTIES_ITEM, APPEARANCE_ITEM, DUPLICATE_ITEM, DELETE_ITEM];

/// Entry of `disable_default_items` that disables every reserved item.
pub const DISABLE_ALL: &str = "all";

/// Submenus nested deeper than this are cut off.
pub const MAX_SUBMENU_DEPTH: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MenuTarget {
  Node,
  Edge,
  Canvas,
}

impl MenuTarget {
  pub fn as_str(&self) -> &'static str {
    match self {
      MenuTarget::Node => "node",
      MenuTarget::Edge => "edge",
      MenuTarget::Canvas => "canvas",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextMenuItem {
  pub id: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub label: Option<LocalizedText>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub icon: Option<String>,
  /// Event emitted on the bus when the item is chosen.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub action: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub shortcut: Option<String>,
  #[serde(default)]
  pub disabled: bool,
  #[serde(default)]
  pub danger: bool,
  #[serde(default)]
  pub separator: bool,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub submenu: Vec<ContextMenuItem>,
}

impl ContextMenuItem {
  pub fn action(id: impl Into<String>, label: impl Into<LocalizedText>, action: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      label: Some(label.into()),
      action: Some(action.into()),
      ..Default::default()
    }
  }

  pub fn separator(id: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      separator: true,
      ..Default::default()
    }
  }

  pub fn with_submenu(mut self, submenu: Vec<ContextMenuItem>) -> Self {
    self.submenu = submenu;
    self
  }

  pub fn is_separator(&self) -> bool {
    self.separator
  }

  pub fn is_reserved(&self) -> bool {
    RESERVED_ITEM_IDS.contains(&self.id.as_str())
  }

  /// Deepest submenu nesting below this item (0 for a leaf).
  pub fn depth(&self) -> usize {
    self.submenu.iter().map(|child| child.depth() + 1).max().unwrap_or(0)
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextMenuConfig {
  pub id: String,
  pub target: MenuTarget,
  /// Node/edge types this menu applies to. `None` makes it a general menu.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub types: Option<Vec<String>>,
  pub items: Vec<ContextMenuItem>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub disable_default_items: Vec<String>,
}

impl ContextMenuConfig {
  pub fn general(id: impl Into<String>, target: MenuTarget, items: Vec<ContextMenuItem>) -> Self {
    Self {
      id: id.into(),
      target,
      types: None,
      items,
      disable_default_items: Vec::new(),
    }
  }

  pub fn for_types(id: impl Into<String>, target: MenuTarget, types: Vec<String>, items: Vec<ContextMenuItem>) -> Self {
    Self {
      id: id.into(),
      target,
      types: Some(types),
      items,
      disable_default_items: Vec::new(),
    }
  }

  pub fn with_disabled_defaults(mut self, ids: Vec<String>) -> Self {
    self.disable_default_items = ids;
    self
  }

  fn applies_to(&self, item_type: &str) -> bool {
    self.types.as_ref().is_some_and(|types| types.iter().any(|t| t == item_type))
  }
}

/// Removes separators at the start, at the end and directly after another separator.
pub fn cleanup_separators(items: Vec<ContextMenuItem>) -> Vec<ContextMenuItem> {
  let mut cleaned: Vec<ContextMenuItem> = Vec::with_capacity(items.len());
  for item in items {
    if item.is_separator() && cleaned.last().map_or(true, ContextMenuItem::is_separator) {
      continue;
    }
    cleaned.push(item);
  }
  while cleaned.last().is_some_and(ContextMenuItem::is_separator) {
    cleaned.pop();
  }
  cleaned
}

/// Expands `"all"` into the reserved ids.
pub fn expand_disabled_items(disabled: &[String]) -> Vec<String> {
  let mut expanded: Vec<String> = Vec::new();
  for id in disabled {
    let ids: Vec<String> = if id == DISABLE_ALL {
      RESERVED_ITEM_IDS.iter().map(|s| s.to_string()).collect()
    } else {
      vec![id.clone()]
    };
    for id in ids {
      if !expanded.contains(&id) {
        expanded.push(id);
      }
    }
  }
  expanded
}

/// Cuts submenus nested deeper than `max_depth` levels below the top.
pub fn limit_submenu_depth(items: Vec<ContextMenuItem>, max_depth: usize) -> Vec<ContextMenuItem> {
  items
    .into_iter()
    .map(|mut item| {
      if max_depth == 0 {
        if !item.submenu.is_empty() {
          event!(Level::WARN, item = %item.id, "Submenu exceeds maximum depth, truncated.");
        }
        item.submenu.clear();
      } else {
        item.submenu = limit_submenu_depth(std::mem::take(&mut item.submenu), max_depth - 1);
      }
      item
    })
    .collect()
}

/// Merges general and specific items as described in the module docs.
pub fn merge_menu_items(
  general: &[ContextMenuItem],
  specific: &[ContextMenuItem],
  disable_default_items: &[String],
) -> Vec<ContextMenuItem> {
  if specific.iter().any(ContextMenuItem::is_reserved) {
    return specific.to_vec();
  }

  let disabled = expand_disabled_items(disable_default_items);
  let filtered: Vec<ContextMenuItem> = general
    .iter()
    .filter(|item| !disabled.contains(&item.id))
    .cloned()
    .collect();
  let mut merged = cleanup_separators(filtered);

  if specific.is_empty() {
    return merged;
  }

  match merged.iter().position(|item| item.id == PROPERTIES_ITEM) {
    Some(anchor) => {
      let mut block: Vec<ContextMenuItem> = Vec::with_capacity(specific.len() + 2);
      let preceded_by_separator = anchor == 0 || merged[anchor - 1].is_separator();
      if !preceded_by_separator && !specific[0].is_separator() {
        block.push(ContextMenuItem::separator("separator-before-custom"));
      }
      block.extend(specific.iter().cloned());
      if !block.last().is_some_and(ContextMenuItem::is_separator) {
        block.push(ContextMenuItem::separator("separator-after-custom"));
      }
      merged.splice(anchor..anchor, block);
    }
    None => merged.extend(specific.iter().cloned()),
  }

  cleanup_separators(merged)
}

pub fn default_node_menu() -> ContextMenuConfig {
  ContextMenuConfig::general(
    "default-node",
    MenuTarget::Node,
    vec![
      ContextMenuItem::action(PROPERTIES_ITEM, "Properties", "node:open-properties"),
      ContextMenuItem::action(APPEARANCE_ITEM, "Appearance", "node:open-appearance"),
      ContextMenuItem::separator("separator-edit"),
      ContextMenuItem::action(DUPLICATE_ITEM, "Duplicate", "node:duplicate"),
      ContextMenuItem::separator("separator-danger"),
      ContextMenuItem {
        danger: true,
        ..ContextMenuItem::action(DELETE_ITEM, "Delete", "node:delete")
      },
    ],
  )
}

pub fn default_edge_menu() -> ContextMenuConfig {
  ContextMenuConfig::general(
    "default-edge",
    MenuTarget::Edge,
    vec![
      ContextMenuItem::action(PROPERTIES_ITEM, "Properties", "edge:open-properties"),
      ContextMenuItem::separator("separator-danger"),
      ContextMenuItem {
        danger: true,
        ..ContextMenuItem::action(DELETE_ITEM, "Delete", "edge:delete")
      },
    ],
  )
}

pub struct ContextMenuRegistry {
  store: Registry<ContextMenuConfig>,
}

impl Deref for ContextMenuRegistry {
  type Target = Registry<ContextMenuConfig>;

  fn deref(&self) -> &Self::Target {
    &self.store
  }
}

impl ContextMenuRegistry {
  pub fn new(bus: Arc<EventBus>) -> Self {
    Self {
      store: Registry::new(CONTEXT_MENU_NAMESPACE, bus),
    }
  }

  /// Registers `menu`, truncating submenus nested deeper than [`MAX_SUBMENU_DEPTH`].
  pub fn register_menu(&self, mut menu: ContextMenuConfig) {
    menu.items = limit_submenu_depth(std::mem::take(&mut menu.items), MAX_SUBMENU_DEPTH);
    let item_type = match &menu.types {
      Some(_) => format!("{}:specific", menu.target.as_str()),
      None => format!("{}:general", menu.target.as_str()),
    };
    self
      .store
      .register(RegistryItem::new(menu.id.clone(), item_type, menu.id.clone(), menu));
  }

  /// Registers the built-in node and edge menus.
  pub fn register_defaults(&self) {
    self.register_menu(default_node_menu());
    self.register_menu(default_edge_menu());
  }

  /// Menus registered for `target`, in registration order.
  pub fn menus_for_target(&self, target: MenuTarget) -> Vec<ContextMenuConfig> {
    self
      .store
      .get_all()
      .into_iter()
      .map(|item| item.config)
      .filter(|menu| menu.target == target)
      .collect()
  }

  /// The merged item list for `target`, specialised for `item_type` when given.
  pub fn items_for(&self, target: MenuTarget, item_type: Option<&str>) -> Vec<ContextMenuItem> {
    let menus = self.menus_for_target(target);
    let general: Vec<ContextMenuItem> = menus
      .iter()
      .filter(|menu| menu.types.is_none())
      .flat_map(|menu| menu.items.iter().cloned())
      .collect();
    let specific = item_type.and_then(|t| menus.iter().find(|menu| menu.applies_to(t)));

    match specific {
      Some(menu) => merge_menu_items(&general, &menu.items, &menu.disable_default_items),
      None => cleanup_separators(general),
    }
  }

  pub fn node_menu(&self, node_type: &str) -> Vec<ContextMenuItem> {
    self.items_for(MenuTarget::Node, Some(node_type))
  }

  pub fn edge_menu(&self, edge_type: &str) -> Vec<ContextMenuItem> {
    self.items_for(MenuTarget::Edge, Some(edge_type))
  }

  pub fn canvas_menu(&self) -> Vec<ContextMenuItem> {
    self.items_for(MenuTarget::Canvas, None)
  }
}
