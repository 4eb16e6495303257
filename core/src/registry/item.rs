// flowdeck/src/registry/item.rs

use serde::{Deserialize, Serialize};

/// The unit of storage in every registry: identity and display data plus an
/// opaque config payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryItem<T> {
  pub id: String,
  #[serde(rename = "type")]
  pub item_type: String,
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub category: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  pub config: T,
}

impl<T> RegistryItem<T> {
  pub fn new(id: impl Into<String>, item_type: impl Into<String>, name: impl Into<String>, config: T) -> Self {
    Self {
      id: id.into(),
      item_type: item_type.into(),
      name: name.into(),
      category: None,
      description: None,
      config,
    }
  }

  pub fn with_category(mut self, category: impl Into<String>) -> Self {
    self.category = Some(category.into());
    self
  }

  pub fn with_description(mut self, description: impl Into<String>) -> Self {
    self.description = Some(description.into());
    self
  }

  pub(crate) fn matches_query(&self, needle_lower: &str) -> bool {
    self.name.to_lowercase().contains(needle_lower)
      || self.id.to_lowercase().contains(needle_lower)
      || self
        .description
        .as_deref()
        .is_some_and(|d| d.to_lowercase().contains(needle_lower))
  }
}

/// Partial update for [`RegistryItem`]. Fields left `None` keep their value.
#[derive(Debug, Clone)]
pub struct RegistryItemPatch<T> {
  pub item_type: Option<String>,
  pub name: Option<String>,
  pub category: Option<String>,
  pub description: Option<String>,
  pub config: Option<T>,
}

impl<T> Default for RegistryItemPatch<T> {
  fn default() -> Self {
    Self {
      item_type: None,
      name: None,
      category: None,
      description: None,
      config: None,
    }
  }
}

impl<T> RegistryItemPatch<T> {
  pub fn name(name: impl Into<String>) -> Self {
    Self {
      name: Some(name.into()),
      ..Default::default()
    }
  }

  pub fn config(config: T) -> Self {
    Self {
      config: Some(config),
      ..Default::default()
    }
  }

  pub(crate) fn apply(self, item: &mut RegistryItem<T>) {
    if let Some(item_type) = self.item_type {
      item.item_type = item_type;
    }
    if let Some(name) = self.name {
      item.name = name;
    }
    if let Some(category) = self.category {
      item.category = Some(category);
    }
    if let Some(description) = self.description {
      item.description = Some(description);
    }
    if let Some(config) = self.config {
      item.config = config;
    }
  }
}
