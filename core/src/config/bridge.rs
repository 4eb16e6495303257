// flowdeck/src/config/bridge.rs

//! Validates node/plugin JSON documents and registers what they describe.

use super::document::{EventTrigger, NodeHooks, NodeJson, PluginDocument};
use super::validator::{node_schema, plugin_schema, JsonSchemaValidator};
use crate::context::Registries;
use crate::error::{FlowdeckError, FlowdeckResult};
use crate::events::{names, EventBus, Subscription};
use crate::inheritance::validate_inheritance;
use crate::model::text::DEFAULT_LANGUAGE;
use crate::model::BaseNodeConfig;
use crate::properties::{StructuredError, Validator, DEFAULT_CUSTOM_GROUP};
use crate::registry::context_menu::{ContextMenuConfig, MenuTarget, MAX_SUBMENU_DEPTH};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{event, instrument, Level};

/// Tunables of the bridge.
#[derive(Debug, Clone)]
pub struct BridgeOptions {
  /// Group for declared properties that name none.
  pub default_group: String,
  pub max_submenu_depth: usize,
  pub http_timeout: Duration,
  /// Language used to resolve localized names into node metadata.
  pub language: String,
}

impl Default for BridgeOptions {
  fn default() -> Self {
    Self {
      default_group: DEFAULT_CUSTOM_GROUP.to_string(),
      max_submenu_depth: MAX_SUBMENU_DEPTH,
      http_timeout: Duration::from_secs(30),
      language: DEFAULT_LANGUAGE.to_string(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigValidation {
  pub valid: bool,
  pub errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationFailure {
  pub node_id: String,
  pub error: String,
}

/// Tally of a batch registration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchRegistration {
  pub success: usize,
  pub failed: usize,
  pub errors: Vec<RegistrationFailure>,
}

impl BatchRegistration {
  fn failure(node_id: impl Into<String>, error: impl ToString) -> Self {
    Self {
      success: 0,
      failed: 1,
      errors: vec![RegistrationFailure {
        node_id: node_id.into(),
        error: error.to_string(),
      }],
    }
  }

  fn record(&mut self, node_id: &str, result: FlowdeckResult<BaseNodeConfig>) {
    match result {
      Ok(_) => self.success += 1,
      Err(err) => {
        self.failed += 1;
        self.errors.push(RegistrationFailure {
          node_id: node_id.to_string(),
          error: err.to_string(),
        });
      }
    }
  }
}

/// Id used in a batch tally for a document that failed before a node id was known.
pub const DOCUMENT_ID: &str = "<document>";

fn menu_id(node_id: &str) -> String {
  format!("{}:context-menu", node_id)
}

fn to_strings(errors: Vec<StructuredError>) -> Vec<String> {
  errors.iter().map(ToString::to_string).collect()
}

/// Node type an event payload refers to: `nodeType`, `type`, or `node.type`.
pub fn payload_node_type(payload: &Value) -> Option<&str> {
  payload
    .get("nodeType")
    .and_then(Value::as_str)
    .or_else(|| payload.get("type").and_then(Value::as_str))
    .or_else(|| payload.get("node").and_then(|n| n.get("type")).and_then(Value::as_str))
}

fn with_node_type(payload: &Value, node_type: &str) -> Value {
  let mut object = match payload {
    Value::Object(map) => map.clone(),
    other => {
      let mut map = serde_json::Map::new();
      map.insert("payload".to_string(), other.clone());
      map
    }
  };
  object.insert("nodeType".to_string(), Value::String(node_type.to_string()));
  Value::Object(object)
}

/// Registers nodes described by JSON against a [`Registries`] bundle and wires
/// their declarative triggers and hooks onto its event bus.
pub struct JsonConfigBridge {
  registries: Arc<Registries>,
  options: BridgeOptions,
  node_validator: JsonSchemaValidator<NodeJson>,
  plugin_validator: JsonSchemaValidator<PluginDocument>,
  subscriptions: Mutex<HashMap<String, Vec<Subscription>>>,
  http: reqwest::Client,
}

impl JsonConfigBridge {
  pub fn new(registries: Arc<Registries>) -> FlowdeckResult<Self> {
    Self::with_options(registries, BridgeOptions::default())
  }

  pub fn with_options(registries: Arc<Registries>, options: BridgeOptions) -> FlowdeckResult<Self> {
    let http = reqwest::Client::builder()
      .timeout(options.http_timeout)
      .build()
      .map_err(|e| FlowdeckError::Internal(format!("Failed to build HTTP client: {}", e)))?;
    Ok(Self {
      registries,
      options,
      node_validator: JsonSchemaValidator::new(&node_schema())?,
      plugin_validator: JsonSchemaValidator::new(&plugin_schema())?,
      subscriptions: Mutex::new(HashMap::new()),
      http,
    })
  }

  pub fn registries(&self) -> &Arc<Registries> {
    &self.registries
  }

  pub fn options(&self) -> &BridgeOptions {
    &self.options
  }

  /// Schema and inheritance check of a node document. Never fails.
  pub fn validate_config(&self, config: &Value) -> ConfigValidation {
    let mut errors = to_strings(self.node_validator.check(config));
    if errors.is_empty() {
      let id = config.get("id").and_then(Value::as_str).unwrap_or_default();
      let extends = config.get("extends").and_then(Value::as_str).unwrap_or_default();
      errors.extend(validate_inheritance(id, extends).errors);
    }
    if errors.is_empty() {
      match self.node_validator.parse(config) {
        Ok(node) => errors.extend(node.unlabeled_new_properties()),
        Err(parse_errors) => errors.extend(to_strings(parse_errors)),
      }
    }
    ConfigValidation {
      valid: errors.is_empty(),
      errors,
    }
  }

  /// Schema check of a plugin document. Never fails.
  pub fn validate_plugin_document(&self, document: &Value) -> ConfigValidation {
    let errors = to_strings(self.plugin_validator.check(document));
    ConfigValidation {
      valid: errors.is_empty(),
      errors,
    }
  }

  /// Validates `config`, builds the node from its archetype and registers the
  /// node, its property groups, its context menu, and its triggers and hooks.
  ///
  /// Re-registering an id replaces everything the previous registration wired.
  #[instrument(name = "JsonConfigBridge::register_from_config", skip_all, fields(node_id))]
  pub fn register_from_config(&self, config: &Value) -> FlowdeckResult<BaseNodeConfig> {
    let validation = self.validate_config(config);
    if !validation.valid {
      event!(Level::WARN, errors = ?validation.errors, "Node config rejected.");
      return Err(FlowdeckError::ConfigValidation {
        errors: validation.errors,
      });
    }
    let node = self
      .node_validator
      .parse(config)
      .map_err(|errors| FlowdeckError::ConfigValidation {
        errors: to_strings(errors),
      })?;
    self.register_node_json(&node)
  }

  fn register_node_json(&self, node: &NodeJson) -> FlowdeckResult<BaseNodeConfig> {
    tracing::Span::current().record("node_id", node.id.as_str());
    let mut errors = validate_inheritance(&node.id, &node.extends).errors;
    errors.extend(node.unlabeled_new_properties());
    if !errors.is_empty() {
      return Err(FlowdeckError::ConfigValidation { errors });
    }
    let config = node.to_node_config(&self.options.language, self.options.max_submenu_depth)?;

    self.drop_subscriptions(&node.id);
    let registries = &self.registries;
    registries.nodes.register_node(config.clone());

    let groups = node.property_groups(&config.property_definitions, &self.options.default_group);
    if groups.is_empty() {
      registries.properties.unregister_node_groups(&config.node_type);
    } else {
      registries.properties.register_node_groups(&config.node_type, groups);
    }

    registries.context_menus.unregister(&menu_id(&node.id));
    if !config.context_menu_items.is_empty() || !node.disable_default_context_menu.is_empty() {
      let menu = ContextMenuConfig::for_types(
        menu_id(&node.id),
        MenuTarget::Node,
        vec![config.node_type.clone()],
        config.context_menu_items.clone(),
      )
      .with_disabled_defaults(node.disable_default_context_menu.clone());
      registries.context_menus.register_menu(menu);
    }

    let mut subscriptions = Vec::new();
    for trigger in &node.event_triggers {
      if trigger.action.event == trigger.event {
        event!(Level::WARN, node_type = %config.node_type, event = %trigger.event, "Trigger re-emits its own event, skipped.");
        continue;
      }
      subscriptions.push(self.wire_trigger(&config.node_type, trigger.clone()));
    }
    if let Some(hooks) = &node.hooks {
      subscriptions.extend(self.wire_hooks(&config.node_type, hooks));
    }
    if !subscriptions.is_empty() {
      self.subscriptions.lock().insert(node.id.clone(), subscriptions);
    }

    event!(Level::INFO, node_type = %config.node_type, extends = %node.extends, "Node registered from JSON.");
    Ok(config)
  }

  fn wire_trigger(&self, node_type: &str, trigger: EventTrigger) -> Subscription {
    let bus: Weak<EventBus> = Arc::downgrade(&self.registries.bus);
    let node_type = node_type.to_string();
    let event_type = trigger.event.clone();
    self.registries.bus.on(&event_type, move |payload| {
      if payload_node_type(payload) != Some(node_type.as_str()) {
        return Ok(());
      }
      if let Some(condition) = &trigger.condition {
        if !condition.holds(payload) {
          return Ok(());
        }
      }
      if let Some(bus) = bus.upgrade() {
        let outgoing = with_node_type(&Value::Object(trigger.action.payload.clone()), &node_type);
        event!(Level::DEBUG, %node_type, action_event = %trigger.action.event, "Trigger fired.");
        bus.emit(&trigger.action.event, &outgoing);
      }
      Ok(())
    })
  }

  fn wire_hooks(&self, node_type: &str, hooks: &NodeHooks) -> Vec<Subscription> {
    let pairs = [
      (names::NODE_CREATED, &hooks.on_created),
      (names::NODE_UPDATED, &hooks.on_updated),
      (names::NODE_DELETED, &hooks.on_deleted),
      (names::PROPERTY_CHANGED, &hooks.on_property_changed),
    ];
    pairs
      .into_iter()
      .filter_map(|(source, target)| target.as_ref().map(|target| (source, target.clone())))
      .filter(|(source, target)| {
        let loops = *source == target.as_str();
        if loops {
          event!(Level::WARN, %node_type, hook = %target, "Hook re-emits its own source event, skipped.");
        }
        !loops
      })
      .map(|(source, target)| {
        let bus: Weak<EventBus> = Arc::downgrade(&self.registries.bus);
        let node_type = node_type.to_string();
        self.registries.bus.on(source, move |payload| {
          if payload_node_type(payload) != Some(node_type.as_str()) {
            return Ok(());
          }
          if let Some(bus) = bus.upgrade() {
            bus.emit(&target, &with_node_type(payload, &node_type));
          }
          Ok(())
        })
      })
      .collect()
  }

  fn drop_subscriptions(&self, node_id: &str) -> usize {
    let removed = self.subscriptions.lock().remove(node_id).unwrap_or_default();
    for subscription in &removed {
      subscription.unsubscribe();
    }
    removed.len()
  }

  /// Removes a node registered through the bridge together with its property
  /// groups, its context menu and its bus subscriptions.
  #[instrument(name = "JsonConfigBridge::unregister_node", skip(self))]
  pub fn unregister_node(&self, node_id: &str) -> bool {
    let removed = self.registries.nodes.unregister(node_id);
    let node_type = removed
      .as_ref()
      .map(|item| item.config.node_type.clone())
      .unwrap_or_else(|| node_id.to_string());
    self.registries.properties.unregister_node_groups(&node_type);
    self.registries.context_menus.unregister(&menu_id(node_id));
    let dropped = self.drop_subscriptions(node_id);
    event!(Level::DEBUG, found = removed.is_some(), subscriptions = dropped, "Node unregistered.");
    removed.is_some()
  }

  /// Registers every document, collecting failures instead of stopping.
  #[instrument(name = "JsonConfigBridge::register_many", skip_all, fields(count = configs.len()))]
  pub fn register_many(&self, configs: &[Value]) -> BatchRegistration {
    let mut tally = BatchRegistration::default();
    for config in configs {
      let node_id = config.get("id").and_then(Value::as_str).unwrap_or(DOCUMENT_ID);
      tally.record(node_id, self.register_from_config(config));
    }
    event!(Level::INFO, success = tally.success, failed = tally.failed, "Batch registration finished.");
    tally
  }

  /// Registers the document's categories, then its nodes.
  pub fn register_plugin_document(&self, document: &PluginDocument) -> BatchRegistration {
    for category in &document.categories {
      self.registries.categories.register_category(category.clone());
    }
    let mut tally = BatchRegistration::default();
    for node in &document.nodes {
      tally.record(&node.id, self.register_node_json(node));
    }
    event!(
      Level::INFO,
      plugin_id = %document.metadata.id,
      success = tally.success,
      failed = tally.failed,
      "Plugin document registered."
    );
    tally
  }

  /// Parses `json` as a node array, a single node or a plugin document and
  /// registers it. Parse failures are reported in the tally.
  pub fn load_from_json(&self, json: &str) -> BatchRegistration {
    let value: Value = match serde_json::from_str(json) {
      Ok(value) => value,
      Err(err) => {
        event!(Level::WARN, error = %err, "Failed to parse JSON document.");
        return BatchRegistration::failure(DOCUMENT_ID, FlowdeckError::Parse(err));
      }
    };
    self.load_value(&value)
  }

  fn load_value(&self, value: &Value) -> BatchRegistration {
    match value {
      Value::Array(configs) => self.register_many(configs),
      Value::Object(map) if map.contains_key("metadata") => match self.parse_plugin_document(value) {
        Ok(document) => self.register_plugin_document(&document),
        Err(err) => BatchRegistration::failure(DOCUMENT_ID, err),
      },
      Value::Object(_) => self.register_many(std::slice::from_ref(value)),
      _ => BatchRegistration::failure(DOCUMENT_ID, "Expected a node array, a node or a plugin document"),
    }
  }

  fn parse_plugin_document(&self, value: &Value) -> FlowdeckResult<PluginDocument> {
    self
      .plugin_validator
      .parse(value)
      .map_err(|errors| FlowdeckError::ConfigValidation {
        errors: to_strings(errors),
      })
  }

  async fn fetch(&self, url: &str) -> FlowdeckResult<String> {
    let transport = |source: reqwest::Error| FlowdeckError::Transport {
      url: url.to_string(),
      source: source.into(),
    };
    let response = self.http.get(url).send().await.map_err(transport)?;
    let response = response.error_for_status().map_err(transport)?;
    response.text().await.map_err(transport)
  }

  /// Fetches `url` and loads it like [`load_from_json`](Self::load_from_json).
  /// Transport failures are reported in the tally.
  #[instrument(name = "JsonConfigBridge::load_from_url", skip(self))]
  pub async fn load_from_url(&self, url: &str) -> BatchRegistration {
    match self.fetch(url).await {
      Ok(body) => self.load_from_json(&body),
      Err(err) => {
        event!(Level::WARN, error = %err, "Failed to fetch node document.");
        BatchRegistration::failure(DOCUMENT_ID, err)
      }
    }
  }

  /// Fetches and validates a plugin document without registering it.
  #[instrument(name = "JsonConfigBridge::load_plugin_from_url", skip(self))]
  pub async fn load_plugin_from_url(&self, url: &str) -> FlowdeckResult<PluginDocument> {
    let body = self.fetch(url).await?;
    let value: Value = serde_json::from_str(&body)?;
    self.parse_plugin_document(&value)
  }

  /// Node ids currently holding bus subscriptions.
  pub fn wired_nodes(&self) -> Vec<String> {
    let mut ids: Vec<String> = self.subscriptions.lock().keys().cloned().collect();
    ids.sort();
    ids
  }
}

impl std::fmt::Debug for JsonConfigBridge {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("JsonConfigBridge")
      .field("options", &self.options)
      .field("wired_nodes", &self.wired_nodes())
      .finish()
  }
}
