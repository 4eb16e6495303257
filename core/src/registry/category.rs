// flowdeck/src/registry/category.rs

use super::item::RegistryItem;
use super::store::Registry;
use crate::events::EventBus;
use crate::model::LocalizedText;
use serde::{Deserialize, Serialize};
use std::ops::Deref;
use std::sync::Arc;

pub const CATEGORY_NAMESPACE: &str = "categories";

/// A palette section that node types are filed under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryConfig {
  pub id: String,
  pub name: LocalizedText,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<LocalizedText>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub icon: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub color: Option<String>,
  #[serde(default)]
  pub order: i32,
  #[serde(default)]
  pub collapsed: bool,
}

impl CategoryConfig {
  pub fn new(id: impl Into<String>, name: impl Into<LocalizedText>, order: i32) -> Self {
    Self {
      id: id.into(),
      name: name.into(),
      description: None,
      icon: None,
      color: None,
      order,
      collapsed: false,
    }
  }
}

pub struct CategoryRegistry {
  store: Registry<CategoryConfig>,
}

impl Deref for CategoryRegistry {
  type Target = Registry<CategoryConfig>;

  fn deref(&self) -> &Self::Target {
    &self.store
  }
}

impl CategoryRegistry {
  pub fn new(bus: Arc<EventBus>) -> Self {
    Self {
      store: Registry::new(CATEGORY_NAMESPACE, bus),
    }
  }

  pub fn register_category(&self, category: CategoryConfig) {
    let mut item = RegistryItem::new(category.id.clone(), "category", category.name.to_string(), category.clone());
    item.description = category.description.as_ref().map(LocalizedText::to_string);
    self.store.register(item);
  }

  /// Categories sorted by `order`, then by name.
  pub fn sorted(&self) -> Vec<CategoryConfig> {
    let mut categories: Vec<CategoryConfig> = self.store.get_all().into_iter().map(|item| item.config).collect();
    categories.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.name.to_string().cmp(&b.name.to_string())));
    categories
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn sorted_by_order_then_name() {
    let categories = CategoryRegistry::new(Arc::new(EventBus::new()));
    categories.register_category(CategoryConfig::new("tasks", "Tasks", 2));
    categories.register_category(CategoryConfig::new("events", "Events", 1));
    categories.register_category(CategoryConfig::new("artifacts", "Artifacts", 2));
    let ids: Vec<String> = categories.sorted().into_iter().map(|c| c.id).collect();
    assert_eq!(ids, vec!["events", "artifacts", "tasks"]);
  }
}
