// flowdeck/src/plugin/mod.rs

//! Plugins: installable bundles of registry resources with async lifecycle hooks.

pub mod manager;

pub use manager::PluginManager;

use crate::model::BaseNodeConfig;
use crate::registry::{CategoryConfig, ContextMenuConfig, EdgeConfig, RuleConfig, ThemeConfig};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginMetadata {
  pub id: String,
  pub name: String,
  pub version: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub author: Option<String>,
  /// Ids of plugins that must be installed first.
  #[serde(default)]
  pub dependencies: Vec<String>,
}

impl PluginMetadata {
  pub fn new(id: impl Into<String>, name: impl Into<String>, version: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      name: name.into(),
      version: version.into(),
      description: None,
      author: None,
      dependencies: Vec::new(),
    }
  }

  pub fn with_dependencies(mut self, dependencies: Vec<String>) -> Self {
    self.dependencies = dependencies;
    self
  }
}

/// Everything a plugin contributes to the registries while it is active.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginResources {
  #[serde(default)]
  pub nodes: Vec<BaseNodeConfig>,
  #[serde(default)]
  pub edges: Vec<EdgeConfig>,
  #[serde(default)]
  pub rules: Vec<RuleConfig>,
  #[serde(default)]
  pub themes: Vec<ThemeConfig>,
  #[serde(default)]
  pub context_menus: Vec<ContextMenuConfig>,
  #[serde(default)]
  pub categories: Vec<CategoryConfig>,
}

impl PluginResources {
  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
      && self.edges.is_empty()
      && self.rules.is_empty()
      && self.themes.is_empty()
      && self.context_menus.is_empty()
      && self.categories.is_empty()
  }
}

/// A plugin. Hooks default to no-ops.
///
/// Hooks run without any registry lock held and may use the registries freely.
#[async_trait]
pub trait Plugin: Send + Sync + 'static {
  fn metadata(&self) -> &PluginMetadata;

  fn resources(&self) -> &PluginResources;

  async fn on_install(&self) -> anyhow::Result<()> {
    Ok(())
  }

  async fn on_uninstall(&self) -> anyhow::Result<()> {
    Ok(())
  }

  /// Runs after the resources are registered and before `on_activate`.
  async fn initialize(&self) -> anyhow::Result<()> {
    Ok(())
  }

  async fn on_activate(&self) -> anyhow::Result<()> {
    Ok(())
  }

  async fn on_deactivate(&self) -> anyhow::Result<()> {
    Ok(())
  }
}

/// A plugin made only of metadata and resources.
#[derive(Debug, Clone)]
pub struct StaticPlugin {
  metadata: PluginMetadata,
  resources: PluginResources,
}

impl StaticPlugin {
  pub fn new(metadata: PluginMetadata, resources: PluginResources) -> Self {
    Self { metadata, resources }
  }
}

#[async_trait]
impl Plugin for StaticPlugin {
  fn metadata(&self) -> &PluginMetadata {
    &self.metadata
  }

  fn resources(&self) -> &PluginResources {
    &self.resources
  }
}
