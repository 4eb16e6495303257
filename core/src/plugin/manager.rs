// flowdeck/src/plugin/manager.rs

//! Install/activate/deactivate/uninstall orchestration for plugins.

use super::Plugin;
use crate::context::Registries;
use crate::error::{FlowdeckError, FlowdeckResult};
use crate::events::names;
use crate::properties::registry::groups_from_field_definitions;
use crate::properties::DEFAULT_CUSTOM_GROUP;
use parking_lot::RwLock;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{event, instrument, Level};

#[derive(Default)]
struct PluginState {
  plugins: HashMap<String, Arc<dyn Plugin>>,
  /// Installed ids in installation order.
  installed: Vec<String>,
  active: HashSet<String>,
}

/// Drives plugins through their lifecycle against one [`Registries`] bundle.
///
/// A plugin's resources are present in the registries exactly while it is
/// active. Locks are only held for bookkeeping, never across a hook `.await`.
pub struct PluginManager {
  registries: Arc<Registries>,
  state: RwLock<PluginState>,
}

fn hook_error<'a>(plugin_id: &'a str, hook: &'static str) -> impl FnOnce(anyhow::Error) -> FlowdeckError + 'a {
  move |source| FlowdeckError::LifecycleHook {
    plugin_id: plugin_id.to_string(),
    hook,
    source,
  }
}

impl PluginManager {
  pub fn new(registries: Arc<Registries>) -> Self {
    Self {
      registries,
      state: RwLock::new(PluginState::default()),
    }
  }

  pub fn registries(&self) -> &Arc<Registries> {
    &self.registries
  }

  /// Installs `plugin` without touching the registries.
  ///
  /// Fails with `DuplicateInstall` or `MissingDependency` before any state
  /// changes. If `on_install` fails the installation is rolled back.
  #[instrument(name = "PluginManager::install", skip_all, fields(plugin_id = %plugin.metadata().id))]
  pub async fn install(&self, plugin: Arc<dyn Plugin>) -> FlowdeckResult<()> {
    let metadata = plugin.metadata().clone();
    {
      let mut state = self.state.write();
      if state.plugins.contains_key(&metadata.id) {
        event!(Level::WARN, "Plugin already installed.");
        return Err(FlowdeckError::DuplicateInstall {
          plugin_id: metadata.id,
        });
      }
      if let Some(missing) = metadata
        .dependencies
        .iter()
        .find(|dep| !state.plugins.contains_key(dep.as_str()))
      {
        event!(Level::WARN, dependency = %missing, "Plugin dependency not installed.");
        return Err(FlowdeckError::MissingDependency {
          plugin_id: metadata.id.clone(),
          dependency: missing.clone(),
        });
      }
      state.plugins.insert(metadata.id.clone(), plugin.clone());
      state.installed.push(metadata.id.clone());
    }

    if let Err(err) = plugin.on_install().await.map_err(hook_error(&metadata.id, "on_install")) {
      event!(Level::ERROR, error = %err, "on_install failed, rolling back.");
      let mut state = self.state.write();
      state.plugins.remove(&metadata.id);
      state.installed.retain(|id| id != &metadata.id);
      return Err(err);
    }

    event!(Level::INFO, version = %metadata.version, "Plugin installed.");
    self.registries.bus.emit(
      names::PLUGIN_LOADED,
      &json!({ "pluginId": metadata.id, "name": metadata.name, "version": metadata.version }),
    );
    Ok(())
  }

  /// Deactivates (if needed) and removes an installed plugin.
  ///
  /// Fails with `NotInstalled` for unknown ids. Beyond that, refuses with
  /// `DependentPluginsInstalled` while another installed plugin lists this
  /// one as a dependency, so uninstall order mirrors install order. If
  /// `on_uninstall` fails the plugin stays installed, inactive.
  #[instrument(name = "PluginManager::uninstall", skip(self))]
  pub async fn uninstall(&self, plugin_id: &str) -> FlowdeckResult<()> {
    let plugin = self.require(plugin_id)?;
    let dependents = self.dependents_of(plugin_id);
    if !dependents.is_empty() {
      event!(Level::WARN, ?dependents, "Cannot uninstall plugin with installed dependents.");
      return Err(FlowdeckError::DependentPluginsInstalled {
        plugin_id: plugin_id.to_string(),
        dependents,
      });
    }

    if self.is_active(plugin_id) {
      self.deactivate(plugin_id).await?;
    }

    plugin.on_uninstall().await.map_err(hook_error(plugin_id, "on_uninstall"))?;
    self.unregister_resources(plugin.as_ref());

    {
      let mut state = self.state.write();
      state.plugins.remove(plugin_id);
      state.installed.retain(|id| id != plugin_id);
      state.active.remove(plugin_id);
    }

    event!(Level::INFO, "Plugin uninstalled.");
    self
      .registries
      .bus
      .emit(names::PLUGIN_UNLOADED, &json!({ "pluginId": plugin_id }));
    Ok(())
  }

  /// Registers the plugin's resources, then runs `initialize` and `on_activate`.
  ///
  /// Activating an active plugin is a no-op. A failing hook unregisters the
  /// resources again and leaves the plugin inactive.
  #[instrument(name = "PluginManager::activate", skip(self))]
  pub async fn activate(&self, plugin_id: &str) -> FlowdeckResult<()> {
    let plugin = self.require(plugin_id)?;
    if !self.state.write().active.insert(plugin_id.to_string()) {
      event!(Level::INFO, "Plugin already active, nothing to do.");
      return Ok(());
    }

    self.register_resources(plugin.as_ref());

    let hooks = async {
      plugin.initialize().await.map_err(hook_error(plugin_id, "initialize"))?;
      plugin.on_activate().await.map_err(hook_error(plugin_id, "on_activate"))
    };
    if let Err(err) = hooks.await {
      event!(Level::ERROR, error = %err, "Activation hook failed, reverting.");
      self.unregister_resources(plugin.as_ref());
      self.state.write().active.remove(plugin_id);
      return Err(err);
    }

    event!(Level::INFO, "Plugin activated.");
    self
      .registries
      .bus
      .emit(names::PLUGIN_ACTIVATED, &json!({ "pluginId": plugin_id }));
    Ok(())
  }

  /// Runs `on_deactivate` and removes the plugin's resources; the plugin stays installed.
  ///
  /// Resources are removed even when the hook fails; the hook error is returned afterwards.
  #[instrument(name = "PluginManager::deactivate", skip(self))]
  pub async fn deactivate(&self, plugin_id: &str) -> FlowdeckResult<()> {
    let plugin = self.require(plugin_id)?;
    if !self.is_active(plugin_id) {
      event!(Level::WARN, "Plugin is not active.");
      return Ok(());
    }

    let hook_result = plugin.on_deactivate().await.map_err(hook_error(plugin_id, "on_deactivate"));
    self.unregister_resources(plugin.as_ref());
    self.state.write().active.remove(plugin_id);
    hook_result?;

    event!(Level::INFO, "Plugin deactivated.");
    self
      .registries
      .bus
      .emit(names::PLUGIN_DEACTIVATED, &json!({ "pluginId": plugin_id }));
    Ok(())
  }

  /// `install` followed by `activate`.
  pub async fn install_and_activate(&self, plugin: Arc<dyn Plugin>) -> FlowdeckResult<()> {
    let plugin_id = plugin.metadata().id.clone();
    self.install(plugin).await?;
    self.activate(&plugin_id).await
  }

  pub fn get_plugin(&self, plugin_id: &str) -> Option<Arc<dyn Plugin>> {
    self.state.read().plugins.get(plugin_id).cloned()
  }

  /// Installed plugins in installation order.
  pub fn get_all_plugins(&self) -> Vec<Arc<dyn Plugin>> {
    let state = self.state.read();
    state
      .installed
      .iter()
      .filter_map(|id| state.plugins.get(id).cloned())
      .collect()
  }

  pub fn get_active_plugins(&self) -> Vec<Arc<dyn Plugin>> {
    let state = self.state.read();
    state
      .installed
      .iter()
      .filter(|id| state.active.contains(*id))
      .filter_map(|id| state.plugins.get(id).cloned())
      .collect()
  }

  pub fn is_installed(&self, plugin_id: &str) -> bool {
    self.state.read().plugins.contains_key(plugin_id)
  }

  pub fn is_active(&self, plugin_id: &str) -> bool {
    self.state.read().active.contains(plugin_id)
  }

  fn require(&self, plugin_id: &str) -> FlowdeckResult<Arc<dyn Plugin>> {
    self.get_plugin(plugin_id).ok_or_else(|| {
      event!(Level::WARN, %plugin_id, "Plugin is not installed.");
      FlowdeckError::NotInstalled {
        plugin_id: plugin_id.to_string(),
      }
    })
  }

  fn dependents_of(&self, plugin_id: &str) -> Vec<String> {
    let state = self.state.read();
    state
      .installed
      .iter()
      .filter(|id| id.as_str() != plugin_id)
      .filter(|id| {
        state
          .plugins
          .get(*id)
          .is_some_and(|p| p.metadata().dependencies.iter().any(|dep| dep == plugin_id))
      })
      .cloned()
      .collect()
  }

  fn register_resources(&self, plugin: &dyn Plugin) {
    let resources = plugin.resources();
    let registries = &self.registries;

    for category in &resources.categories {
      registries.categories.register_category(category.clone());
    }
    for node in &resources.nodes {
      registries.nodes.register_node(node.clone());
      if !node.property_definitions.is_empty() {
        let groups = groups_from_field_definitions(&node.property_definitions, DEFAULT_CUSTOM_GROUP);
        registries.properties.register_node_groups(&node.node_type, groups);
      }
    }
    for edge in &resources.edges {
      registries.edges.register_edge(edge.clone());
      if !edge.property_definitions.is_empty() {
        let groups = groups_from_field_definitions(&edge.property_definitions, DEFAULT_CUSTOM_GROUP);
        registries.properties.register_edge_groups(&edge.edge_type, groups);
      }
    }
    for rule in &resources.rules {
      registries.rules.register_rule(rule.clone());
    }
    for theme in &resources.themes {
      registries.themes.register_theme(theme.clone());
    }
    for menu in &resources.context_menus {
      registries.context_menus.register_menu(menu.clone());
    }
    event!(
      Level::DEBUG,
      plugin_id = %plugin.metadata().id,
      nodes = resources.nodes.len(),
      edges = resources.edges.len(),
      "Plugin resources registered."
    );
  }

  fn unregister_resources(&self, plugin: &dyn Plugin) {
    let resources = plugin.resources();
    let registries = &self.registries;

    for node in &resources.nodes {
      registries.nodes.unregister(&node.id);
      registries.properties.unregister_node_groups(&node.node_type);
    }
    for edge in &resources.edges {
      registries.edges.unregister(&edge.id);
      registries.properties.unregister_edge_groups(&edge.edge_type);
    }
    for rule in &resources.rules {
      registries.rules.unregister(&rule.id);
    }
    for theme in &resources.themes {
      registries.themes.unregister(&theme.id);
    }
    for menu in &resources.context_menus {
      registries.context_menus.unregister(&menu.id);
    }
    for category in &resources.categories {
      registries.categories.unregister(&category.id);
    }
  }
}

impl std::fmt::Debug for PluginManager {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let state = self.state.read();
    f.debug_struct("PluginManager")
      .field("installed", &state.installed)
      .field("active", &state.active)
      .finish()
  }
}
