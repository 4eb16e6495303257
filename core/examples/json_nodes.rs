// flowdeck/examples/json_nodes.rs

use flowdeck::events::names;
use flowdeck::properties::sync::{apply_update, sync_property, validate_entity};
use flowdeck::properties::ValidateOptions;
use flowdeck::registry::NodeOverrides;
use flowdeck::{JsonConfigBridge, Registries};
use serde_json::json;
use tracing::{info, warn};

const NODES: &str = r#"[
  {
    "id": "sendEmailTask",
    "extends": "task",
    "name": { "en": "Send email", "de": "E-Mail senden" },
    "properties": [
      { "id": "to", "label": "To", "type": "text", "group": "basic", "order": 3, "required": true },
      { "id": "subject", "label": "Subject", "type": "text", "group": "basic", "order": 4 }
    ],
    "eventTriggers": [{
      "event": "property:changed",
      "condition": { "property": "to", "operator": "includes", "value": "@" },
      "action": { "type": "emit", "event": "mail:recipient-set" }
    }]
  },
  { "id": "brokenTask", "extends": "subprocess", "name": "Broken" }
]"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();
  info!("--- Flowdeck JSON Nodes Example ---");

  let registries = Registries::shared();
  let bridge = JsonConfigBridge::new(registries.clone())?;

  // 1. Load a batch; the broken entry is reported, the rest is registered.
  let tally = bridge.load_from_json(NODES);
  info!("Registered {} node(s), {} failed.", tally.success, tally.failed);
  for failure in &tally.errors {
    warn!("'{}' rejected: {}", failure.node_id, failure.error);
  }

  let _recipient = registries.bus.on("mail:recipient-set", |payload| {
    info!("Trigger fired: {}", payload);
    Ok(())
  });

  // 2. Create an instance and edit it the way a property panel would.
  let mut node = registries
    .nodes
    .create_node("sendEmailTask", NodeOverrides::default())
    .ok_or("sendEmailTask was not registered")?;
  let groups = registries.properties.get_node_property_groups("sendEmailTask");

  let report = validate_entity(&node, &groups, ValidateOptions::default());
  info!("Fresh node valid: {} ({} error(s))", report.valid, report.errors.len());

  let definition = groups.iter().find_map(|g| g.field("to")).cloned();
  let result = sync_property(&node, "to", json!("ops@example.com"), definition.as_ref());
  if let Some(update) = &result.update {
    apply_update(&mut node, update);
  }
  registries.bus.emit(
    names::PROPERTY_CHANGED,
    &json!({ "nodeType": node.entity_type, "properties": node.properties }),
  );

  let report = validate_entity(&node, &groups, ValidateOptions::default());
  info!("Edited node valid: {}", report.valid);
  Ok(())
}
