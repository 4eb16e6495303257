// tests/plugin_manager_tests.rs
mod common;

use async_trait::async_trait;
use common::*;
use flowdeck::events::names;
use flowdeck::properties::FieldType;
use flowdeck::registry::{RuleConfig, RuleEffect};
use flowdeck::{
  BaseNodeConfig, CategoryConfig, ContextMenuConfig, ContextMenuItem, FlowdeckError, MenuTarget, Plugin, PluginManager,
  PluginMetadata, PluginResources, PropertyFieldDefinition, StaticPlugin, ThemeConfig,
};
use serial_test::serial;
use std::sync::atomic::Ordering;
use std::sync::Arc;

#[derive(Default, Clone, Copy)]
struct Failures {
  install: bool,
  activate: bool,
  deactivate: bool,
}

/// Plugin whose hooks bump the shared counters and optionally fail.
struct CountingPlugin {
  metadata: PluginMetadata,
  resources: PluginResources,
  fail: Failures,
}

impl CountingPlugin {
  fn new(id: &str, dependencies: &[&str]) -> Self {
    let metadata =
      PluginMetadata::new(id, format!("{} plugin", id), "1.0.0").with_dependencies(dependencies.iter().map(|d| d.to_string()).collect());
    Self {
      metadata,
      resources: PluginResources::default(),
      fail: Failures::default(),
    }
  }

  fn failing(mut self, fail: Failures) -> Self {
    self.fail = fail;
    self
  }

  fn with_resources(mut self, resources: PluginResources) -> Self {
    self.resources = resources;
    self
  }
}

#[async_trait]
impl Plugin for CountingPlugin {
  fn metadata(&self) -> &PluginMetadata {
    &self.metadata
  }

  fn resources(&self) -> &PluginResources {
    &self.resources
  }

  async fn on_install(&self) -> anyhow::Result<()> {
    INSTALL_HOOK_COUNTER.fetch_add(1, Ordering::SeqCst);
    if self.fail.install {
      anyhow::bail!("install refused");
    }
    Ok(())
  }

  async fn on_activate(&self) -> anyhow::Result<()> {
    ACTIVATE_HOOK_COUNTER.fetch_add(1, Ordering::SeqCst);
    tokio::task::yield_now().await;
    if self.fail.activate {
      anyhow::bail!("activation refused");
    }
    Ok(())
  }

  async fn on_deactivate(&self) -> anyhow::Result<()> {
    DEACTIVATE_HOOK_COUNTER.fetch_add(1, Ordering::SeqCst);
    if self.fail.deactivate {
      anyhow::bail!("deactivation refused");
    }
    Ok(())
  }

  async fn on_uninstall(&self) -> anyhow::Result<()> {
    UNINSTALL_HOOK_COUNTER.fetch_add(1, Ordering::SeqCst);
    Ok(())
  }
}

fn mail_resources() -> PluginResources {
  let mut node = BaseNodeConfig::new("sendEmailTask", "messaging", "Send email");
  node.property_definitions = vec![
    PropertyFieldDefinition::new("to", "To", FieldType::Text).with_order(1),
    PropertyFieldDefinition::new("subject", "Subject", FieldType::Text)
      .with_order(2)
      .with_group("basic"),
  ];
  PluginResources {
    nodes: vec![node],
    categories: vec![CategoryConfig::new("messaging", "Messaging", 5)],
    rules: vec![RuleConfig::new(
      "no-mail-to-start",
      RuleEffect::Deny,
      vec!["sendEmailTask".to_string()],
      vec!["start".to_string()],
    )],
    themes: vec![ThemeConfig::new("mail-dark", "Mail dark")],
    context_menus: vec![ContextMenuConfig::for_types(
      "mail-menu",
      MenuTarget::Node,
      vec!["sendEmailTask".to_string()],
      vec![ContextMenuItem::action("sendNow", "Send now", "mail:send")],
    )],
    ..Default::default()
  }
}

fn manager() -> PluginManager {
  reset_counters();
  PluginManager::new(registries())
}

#[tokio::test]
#[serial]
async fn test_full_lifecycle_runs_each_hook_once() {
  let manager = manager();
  let bus = manager.registries().bus.clone();
  let (loaded, _s1) = EventRecorder::attach(&bus, names::PLUGIN_LOADED);
  let (activated, _s2) = EventRecorder::attach(&bus, names::PLUGIN_ACTIVATED);
  let (deactivated, _s3) = EventRecorder::attach(&bus, names::PLUGIN_DEACTIVATED);
  let (unloaded, _s4) = EventRecorder::attach(&bus, names::PLUGIN_UNLOADED);

  let plugin = Arc::new(CountingPlugin::new("mail", &[]).with_resources(mail_resources()));
  manager.install(plugin).await.expect("install");
  assert!(manager.is_installed("mail"));
  assert!(!manager.is_active("mail"));
  assert!(!manager.registries().nodes.has("sendEmailTask"), "install registers nothing");

  manager.activate("mail").await.expect("activate");
  manager.deactivate("mail").await.expect("deactivate");
  manager.uninstall("mail").await.expect("uninstall");

  assert_eq!(INSTALL_HOOK_COUNTER.load(Ordering::SeqCst), 1);
  assert_eq!(ACTIVATE_HOOK_COUNTER.load(Ordering::SeqCst), 1);
  assert_eq!(DEACTIVATE_HOOK_COUNTER.load(Ordering::SeqCst), 1);
  assert_eq!(UNINSTALL_HOOK_COUNTER.load(Ordering::SeqCst), 1);
  assert_eq!(loaded.last().map(|p| p["version"].clone()), Some(serde_json::json!("1.0.0")));
  assert_eq!((activated.count(), deactivated.count(), unloaded.count()), (1, 1, 1));
  assert!(!manager.is_installed("mail"));
}

#[tokio::test]
#[serial]
async fn test_activation_registers_every_resource_kind() {
  let manager = manager();
  let plugin = Arc::new(CountingPlugin::new("mail", &[]).with_resources(mail_resources()));
  manager.install_and_activate(plugin).await.expect("install and activate");

  let registries = manager.registries();
  assert!(registries.nodes.has("sendEmailTask"));
  assert!(registries.categories.has("messaging"));
  assert!(registries.themes.has("mail-dark"));
  assert!(!registries.rules.evaluate_connection("sendEmailTask", "start", None).allowed);
  assert_eq!(registries.context_menus.node_menu("sendEmailTask")[0].id, "sendNow");

  let group_ids: Vec<String> = registries
    .properties
    .get_node_property_groups("sendEmailTask")
    .into_iter()
    .map(|g| g.id)
    .collect();
  assert_eq!(group_ids, vec!["basic", "custom"]);

  manager.deactivate("mail").await.expect("deactivate");
  assert!(!registries.nodes.has("sendEmailTask"));
  assert!(!registries.categories.has("messaging"));
  assert!(!registries.context_menus.has("mail-menu"));
  assert!(!registries.properties.has_node_groups("sendEmailTask"));
  assert!(registries.rules.evaluate_connection("sendEmailTask", "start", None).allowed);
}

#[tokio::test]
#[serial]
async fn test_missing_dependency_installs_nothing() {
  let manager = manager();
  let err = manager
    .install(Arc::new(CountingPlugin::new("reports", &["charts"])))
    .await
    .expect_err("charts is missing");
  assert!(matches!(err, FlowdeckError::MissingDependency { ref dependency, .. } if dependency == "charts"));
  assert!(err.is_lifecycle_error());
  assert!(!manager.is_installed("reports"));
  assert_eq!(INSTALL_HOOK_COUNTER.load(Ordering::SeqCst), 0);

  manager.install(Arc::new(CountingPlugin::new("charts", &[]))).await.expect("charts");
  manager
    .install(Arc::new(CountingPlugin::new("reports", &["charts"])))
    .await
    .expect("dependency now present");
  let order: Vec<String> = manager.get_all_plugins().iter().map(|p| p.metadata().id.clone()).collect();
  assert_eq!(order, vec!["charts", "reports"]);
}

#[tokio::test]
#[serial]
async fn test_duplicate_install_is_rejected() {
  let manager = manager();
  manager.install(Arc::new(CountingPlugin::new("mail", &[]))).await.expect("first");
  let err = manager
    .install(Arc::new(CountingPlugin::new("mail", &[])))
    .await
    .expect_err("duplicate");
  assert!(matches!(err, FlowdeckError::DuplicateInstall { .. }));
  assert_eq!(INSTALL_HOOK_COUNTER.load(Ordering::SeqCst), 1);
}

#[tokio::test]
#[serial]
async fn test_double_activation_registers_once() {
  let manager = manager();
  let (registered, _sub) = EventRecorder::attach(&manager.registries().bus, names::REGISTRY_ITEM_REGISTERED);
  let plugin = Arc::new(CountingPlugin::new("mail", &[]).with_resources(mail_resources()));
  manager.install(plugin).await.expect("install");

  manager.activate("mail").await.expect("first activation");
  let after_first = registered.count();
  manager.activate("mail").await.expect("second activation is a no-op");

  assert_eq!(registered.count(), after_first);
  assert_eq!(ACTIVATE_HOOK_COUNTER.load(Ordering::SeqCst), 1);
  assert_eq!(manager.get_active_plugins().len(), 1);
}

#[tokio::test]
#[serial]
async fn test_dependents_block_uninstall() {
  let manager = manager();
  manager.install(Arc::new(CountingPlugin::new("charts", &[]))).await.expect("charts");
  manager
    .install(Arc::new(CountingPlugin::new("reports", &["charts"])))
    .await
    .expect("reports");

  let err = manager.uninstall("charts").await.expect_err("reports depends on charts");
  match err {
    FlowdeckError::DependentPluginsInstalled { dependents, .. } => assert_eq!(dependents, vec!["reports"]),
    other => panic!("unexpected error: {}", other),
  }

  manager.uninstall("reports").await.expect("reports");
  manager.uninstall("charts").await.expect("charts");
  assert!(manager.get_all_plugins().is_empty());
}

#[tokio::test]
#[serial]
async fn test_failing_hooks_roll_back() {
  let manager = manager();

  let broken_install = CountingPlugin::new("broken", &[]).failing(Failures {
    install: true,
    ..Default::default()
  });
  let err = manager.install(Arc::new(broken_install)).await.expect_err("install hook fails");
  assert!(matches!(err, FlowdeckError::LifecycleHook { ref plugin_id, hook: "on_install", .. } if plugin_id == "broken"));
  assert!(!manager.is_installed("broken"));

  let broken_activate = CountingPlugin::new("mail", &[])
    .with_resources(mail_resources())
    .failing(Failures {
      activate: true,
      ..Default::default()
    });
  manager.install(Arc::new(broken_activate)).await.expect("install");
  let err = manager.activate("mail").await.expect_err("activate hook fails");
  assert!(matches!(err, FlowdeckError::LifecycleHook { hook: "on_activate", .. }));
  assert!(!manager.is_active("mail"));
  assert!(!manager.registries().nodes.has("sendEmailTask"));
}

#[tokio::test]
#[serial]
async fn test_failing_deactivate_still_removes_resources() {
  let manager = manager();
  let plugin = CountingPlugin::new("mail", &[])
    .with_resources(mail_resources())
    .failing(Failures {
      deactivate: true,
      ..Default::default()
    });
  manager.install_and_activate(Arc::new(plugin)).await.expect("install and activate");

  let err = manager.deactivate("mail").await.expect_err("hook fails");
  assert!(matches!(err, FlowdeckError::LifecycleHook { hook: "on_deactivate", .. }));
  assert!(!manager.is_active("mail"));
  assert!(manager.is_installed("mail"));
  assert!(!manager.registries().nodes.has("sendEmailTask"));
}

#[tokio::test]
#[serial]
async fn test_unknown_plugin_errors_and_inactive_deactivate() {
  let manager = manager();
  assert!(matches!(
    manager.activate("ghost").await,
    Err(FlowdeckError::NotInstalled { .. })
  ));
  assert!(matches!(
    manager.uninstall("ghost").await,
    Err(FlowdeckError::NotInstalled { .. })
  ));

  let plugin = StaticPlugin::new(PluginMetadata::new("static", "Static", "0.1.0"), PluginResources::default());
  manager.install(Arc::new(plugin)).await.expect("install");
  manager.deactivate("static").await.expect("deactivating an inactive plugin is a no-op");
  assert!(manager.get_plugin("static").is_some());
}
