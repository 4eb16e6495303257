// flowdeck/src/registry/theme.rs

use super::item::RegistryItem;
use super::store::Registry;
use crate::events::EventBus;
use crate::model::{merge_json_maps, JsonMap};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Deref;
use std::sync::Arc;
use tracing::{event, Level};

pub const THEME_NAMESPACE: &str = "themes";

/// Key in `node_styles`/`edge_styles` applied to every type before the
/// type-specific entry.
pub const DEFAULT_STYLE_KEY: &str = "default";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeConfig {
  pub id: String,
  pub name: String,
  #[serde(default)]
  pub dark: bool,
  #[serde(default)]
  pub colors: BTreeMap<String, String>,
  #[serde(default)]
  pub node_styles: BTreeMap<String, JsonMap>,
  #[serde(default)]
  pub edge_styles: BTreeMap<String, JsonMap>,
}

impl ThemeConfig {
  pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      name: name.into(),
      dark: false,
      colors: BTreeMap::new(),
      node_styles: BTreeMap::new(),
      edge_styles: BTreeMap::new(),
    }
  }
}

fn resolve_style(styles: &BTreeMap<String, JsonMap>, key: &str) -> JsonMap {
  let base = styles.get(DEFAULT_STYLE_KEY).cloned().unwrap_or_default();
  match styles.get(key) {
    Some(specific) => merge_json_maps(&base, specific),
    None => base,
  }
}

pub struct ThemeRegistry {
  store: Registry<ThemeConfig>,
  active: RwLock<Option<String>>,
}

impl Deref for ThemeRegistry {
  type Target = Registry<ThemeConfig>;

  fn deref(&self) -> &Self::Target {
    &self.store
  }
}

impl ThemeRegistry {
  pub fn new(bus: Arc<EventBus>) -> Self {
    Self {
      store: Registry::new(THEME_NAMESPACE, bus),
      active: RwLock::new(None),
    }
  }

  pub fn register_theme(&self, theme: ThemeConfig) {
    let item_type = if theme.dark { "dark" } else { "light" };
    self
      .store
      .register(RegistryItem::new(theme.id.clone(), item_type, theme.name.clone(), theme));
  }

  /// Selects the active theme. Returns `false` if `id` is not registered.
  pub fn set_active(&self, id: &str) -> bool {
    if !self.store.has(id) {
      event!(Level::WARN, theme = %id, "Cannot activate unregistered theme.");
      return false;
    }
    *self.active.write() = Some(id.to_string());
    true
  }

  /// The active theme, if one is selected and still registered.
  pub fn active_theme(&self) -> Option<ThemeConfig> {
    let active = self.active.read().clone()?;
    self.store.get_config(&active)
  }

  /// Style for `node_type` under the active theme: the theme's default node
  /// style with the type-specific style merged on top.
  pub fn node_style(&self, node_type: &str) -> JsonMap {
    self
      .active_theme()
      .map(|theme| resolve_style(&theme.node_styles, node_type))
      .unwrap_or_default()
  }

  pub fn edge_style(&self, edge_type: &str) -> JsonMap {
    self
      .active_theme()
      .map(|theme| resolve_style(&theme.edge_styles, edge_type))
      .unwrap_or_default()
  }
}
