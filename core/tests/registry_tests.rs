// tests/registry_tests.rs
mod common;

use common::*;
use flowdeck::events::names;
use flowdeck::registry::{EdgeOverrides, NodeOverrides, RegistryItemPatch};
use flowdeck::{BaseNodeConfig, EdgeConfig, EventBus, Registry, RegistryItem};
use serde_json::json;
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq)]
struct Widget {
  size: u32,
}

fn widget(id: &str, item_type: &str, size: u32) -> RegistryItem<Widget> {
  RegistryItem::new(id, item_type, format!("Widget {}", id), Widget { size })
}

fn widget_registry() -> (Arc<EventBus>, Registry<Widget>) {
  setup_tracing();
  let bus = Arc::new(EventBus::new());
  let registry = Registry::new("widgets", bus.clone());
  (bus, registry)
}

#[test]
fn test_register_get_unregister() {
  let (_bus, registry) = widget_registry();
  let item = widget("w1", "small", 1);
  registry.register(item.clone());

  assert_eq!(registry.get("w1"), Some(item));
  assert!(registry.has("w1"));
  assert!(registry.unregister("w1").is_some());
  assert!(!registry.has("w1"));
  assert!(registry.unregister("w1").is_none());
}

#[test]
fn test_overwrite_keeps_size_and_position() {
  let (_bus, registry) = widget_registry();
  registry.register(widget("a", "small", 1));
  registry.register(widget("b", "small", 2));
  registry.register(widget("a", "large", 10));

  assert_eq!(registry.size(), 2);
  assert_eq!(registry.get_config("a"), Some(Widget { size: 10 }));
  assert_eq!(registry.ids(), vec!["a", "b"]);
}

#[test]
fn test_mutations_are_announced_on_the_bus() {
  let (bus, registry) = widget_registry();
  let (registered, _s1) = EventRecorder::attach(&bus, names::REGISTRY_ITEM_REGISTERED);
  let (unregistered, _s2) = EventRecorder::attach(&bus, names::REGISTRY_ITEM_UNREGISTERED);

  registry.register(widget("a", "small", 1));
  registry.unregister("a");
  registry.unregister("a");

  assert_eq!(registered.count(), 1);
  assert_eq!(
    registered.last().map(|p| p["registry"].clone()),
    Some(json!("widgets"))
  );
  assert_eq!(unregistered.count(), 1, "removing a missing id emits nothing");
  assert_eq!(unregistered.last().map(|p| p["id"].clone()), Some(json!("a")));
}

#[test]
fn test_queries_by_type_category_and_search() {
  let (_bus, registry) = widget_registry();
  registry.register(widget("gear", "small", 1).with_category("mechanics"));
  registry.register(widget("spring", "small", 2).with_category("mechanics"));
  registry.register(widget("lamp", "large", 3).with_description("Bright LIGHT source"));

  assert_eq!(registry.get_by_type("small").len(), 2);
  assert_eq!(registry.get_by_category("mechanics").len(), 2);
  assert_eq!(registry.types(), vec!["small", "large"]);
  assert_eq!(registry.categories(), vec!["mechanics"]);

  let hits: Vec<String> = registry.search("light").into_iter().map(|i| i.id).collect();
  assert_eq!(hits, vec!["lamp"]);
  let hits: Vec<String> = registry.search("SPR").into_iter().map(|i| i.id).collect();
  assert_eq!(hits, vec!["spring"]);
}

#[test]
fn test_update_merges_and_reemits() {
  let (bus, registry) = widget_registry();
  let (registered, _sub) = EventRecorder::attach(&bus, names::REGISTRY_ITEM_REGISTERED);
  registry.register(widget("a", "small", 1));

  assert!(registry.update("a", RegistryItemPatch::name("Renamed")));
  let item = registry.get("a").expect("item exists");
  assert_eq!(item.name, "Renamed");
  assert_eq!(item.config, Widget { size: 1 });
  assert_eq!(registered.count(), 2);

  assert!(!registry.update("missing", RegistryItemPatch::config(Widget { size: 5 })));
}

#[test]
fn test_clear_empties_registry() {
  let (bus, registry) = widget_registry();
  let (unregistered, _sub) = EventRecorder::attach(&bus, names::REGISTRY_ITEM_UNREGISTERED);
  registry.register_many(vec![widget("a", "small", 1), widget("b", "small", 2)]);
  registry.clear();
  assert!(registry.is_empty());
  assert_eq!(unregistered.count(), 2);
}

#[test]
fn test_create_node_fills_label_and_generates_id() {
  let registries = registries();
  let mut config = BaseNodeConfig::new("approval", "activities", "Approval");
  config.properties.insert("priority".to_string(), json!("high"));
  registries.nodes.register_node(config);

  let node = registries
    .nodes
    .create_node("approval", NodeOverrides::default().with_property("priority", json!("low")))
    .expect("registered type");
  assert!(node.id.starts_with("approval-"));
  assert_eq!(node.entity_type, "approval");
  assert_eq!(node.properties["label"], json!("Approval"));
  assert_eq!(node.data["label"], json!("Approval"));
  assert_eq!(node.properties["priority"], json!("low"));
  assert_eq!(node.data["priority"], json!("high"));

  let named = registries
    .nodes
    .create_node("approval", NodeOverrides::default().with_id("fixed").with_data("label", json!("Custom")))
    .expect("registered type");
  assert_eq!(named.id, "fixed");
  assert_eq!(named.data["label"], json!("Custom"));

  assert!(registries.nodes.create_node("unknown", NodeOverrides::default()).is_none());
}

#[test]
fn test_create_edge_between_nodes() {
  let registries = registries();
  let mut config = EdgeConfig::new("sequence", "Sequence flow");
  config.label = Some("next".to_string());
  config.animated = true;
  registries.edges.register_edge(config);

  let edge = registries
    .edges
    .create_edge("sequence", "a", "b", EdgeOverrides::default())
    .expect("registered type");
  assert_eq!(edge.source, "a");
  assert_eq!(edge.target, "b");
  assert_eq!(edge.entity.data["label"], json!("next"));
  assert_eq!(edge.entity.data["animated"], json!(true));
  assert!(registries.edges.create_edge("dashed", "a", "b", EdgeOverrides::default()).is_none());
}
