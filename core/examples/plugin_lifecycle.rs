// flowdeck/examples/plugin_lifecycle.rs

use async_trait::async_trait;
use flowdeck::events::names;
use flowdeck::properties::FieldType;
use flowdeck::{
  BaseNodeConfig, CategoryConfig, ContextMenuConfig, ContextMenuItem, FlowdeckError, MenuTarget, Plugin, PluginManager,
  PluginMetadata, PluginResources, PropertyFieldDefinition, Registries,
};
use std::sync::Arc;
use tracing::{error, info};

// --- A code plugin contributing one node type ---
struct MailPlugin {
  metadata: PluginMetadata,
  resources: PluginResources,
}

impl MailPlugin {
  fn new() -> Self {
    let mut node = BaseNodeConfig::new("sendEmailTask", "messaging", "Send email");
    node.property_definitions = vec![
      PropertyFieldDefinition::new("to", "To", FieldType::Text).with_order(3).with_group("basic"),
      PropertyFieldDefinition::new("subject", "Subject", FieldType::Text).with_order(4).with_group("basic"),
    ];
    Self {
      metadata: PluginMetadata::new("mail", "Mail", "1.0.0"),
      resources: PluginResources {
        nodes: vec![node],
        categories: vec![CategoryConfig::new("messaging", "Messaging", 10)],
        context_menus: vec![ContextMenuConfig::for_types(
          "mail-menu",
          MenuTarget::Node,
          vec!["sendEmailTask".to_string()],
          vec![ContextMenuItem::action("sendNow", "Send now", "mail:send")],
        )],
        ..Default::default()
      },
    }
  }
}

#[async_trait]
impl Plugin for MailPlugin {
  fn metadata(&self) -> &PluginMetadata {
    &self.metadata
  }

  fn resources(&self) -> &PluginResources {
    &self.resources
  }

  async fn on_activate(&self) -> anyhow::Result<()> {
    info!("Mail plugin activated, connecting to the outbox.");
    Ok(())
  }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();
  info!("--- Flowdeck Plugin Lifecycle Example ---");

  // 1. Build the registries and the plugin manager around them.
  let registries = Registries::shared();
  registries.context_menus.register_defaults();
  let manager = PluginManager::new(registries.clone());

  let _activated = registries.bus.on(names::PLUGIN_ACTIVATED, |payload| {
    info!("Bus saw activation: {}", payload);
    Ok(())
  });

  // 2. Install and activate.
  manager.install_and_activate(Arc::new(MailPlugin::new())).await?;
  let menu: Vec<String> = registries
    .context_menus
    .node_menu("sendEmailTask")
    .into_iter()
    .map(|item| item.id)
    .collect();
  info!("Context menu for sendEmailTask: {:?}", menu);

  let groups = registries.properties.get_node_property_groups("sendEmailTask");
  for group in &groups {
    info!("Property group '{}': {:?}", group.id, group.field_ids());
  }

  // 3. A plugin depending on something that is not installed is refused.
  let reports = flowdeck::StaticPlugin::new(
    PluginMetadata::new("reports", "Reports", "0.1.0").with_dependencies(vec!["charts".to_string()]),
    PluginResources::default(),
  );
  match manager.install(Arc::new(reports)).await {
    Err(FlowdeckError::MissingDependency { dependency, .. }) => info!("Reports refused, '{}' is missing.", dependency),
    Err(e) => error!("Unexpected error: {}", e),
    Ok(()) => error!("Reports should not have installed."),
  }

  // 4. Deactivate and uninstall; the registries are back to their initial state.
  manager.deactivate("mail").await?;
  manager.uninstall("mail").await?;
  info!("Registries after uninstall: {}", registries.diagnostics());

  Ok(())
}
