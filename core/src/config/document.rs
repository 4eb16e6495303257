// flowdeck/src/config/document.rs

//! Serde shapes of node and plugin JSON documents and their conversion into
//! node configurations.

use crate::error::{FlowdeckError, FlowdeckResult};
use crate::inheritance::{base_definition, create_inherited_node_config, BaseNodeType, NodeConfigOverrides, PropertyFieldPatch};
use crate::model::text::DEFAULT_LANGUAGE;
use crate::model::{BaseNodeConfig, ConnectionRules, JsonMap, LocalizedText, NodeMetadata, VisualConfig};
use crate::plugin::{PluginMetadata, PluginResources, StaticPlugin};
use crate::properties::registry::groups_from_field_definitions;
use crate::properties::{ConditionOperator, PropertyFieldDefinition, PropertyGroupDefinition};
use crate::registry::context_menu::{limit_submenu_depth, ContextMenuItem, MAX_SUBMENU_DEPTH};
use crate::registry::CategoryConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A property group declared explicitly in a node document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyGroupJson {
  pub id: String,
  pub label: LocalizedText,
  #[serde(default)]
  pub order: Option<i32>,
  #[serde(default)]
  pub collapsed: bool,
  #[serde(default)]
  pub fields: Vec<PropertyFieldDefinition>,
}

/// `{property, operator, value}` checked against an event payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerCondition {
  pub property: String,
  pub operator: ConditionOperator,
  #[serde(default)]
  pub value: Value,
}

impl TriggerCondition {
  /// Looks the property up in the payload's `properties`, then `data`, then at top level.
  pub fn holds(&self, payload: &Value) -> bool {
    let actual = ["properties", "data"]
      .iter()
      .find_map(|section| payload.get(section).and_then(|s| s.get(&self.property)))
      .or_else(|| payload.get(&self.property));
    self.operator.evaluate(actual, &self.value)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerActionKind {
  Emit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerAction {
  #[serde(rename = "type")]
  pub kind: TriggerActionKind,
  pub event: String,
  #[serde(default)]
  pub payload: JsonMap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTrigger {
  pub event: String,
  #[serde(default)]
  pub condition: Option<TriggerCondition>,
  pub action: TriggerAction,
}

/// Event names re-emitted when lifecycle events hit this node type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeHooks {
  #[serde(default)]
  pub on_created: Option<String>,
  #[serde(default)]
  pub on_updated: Option<String>,
  #[serde(default)]
  pub on_deleted: Option<String>,
  #[serde(default)]
  pub on_property_changed: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeJson {
  pub id: String,
  pub extends: String,
  pub name: LocalizedText,
  #[serde(default)]
  pub description: Option<LocalizedText>,
  #[serde(default)]
  pub category: Option<String>,
  #[serde(default)]
  pub icon: Option<String>,
  #[serde(default)]
  pub visual_config: Option<VisualConfig>,
  /// Patches over the archetype's fields; ids the archetype lacks add new fields.
  #[serde(default)]
  pub properties: Vec<PropertyFieldPatch>,
  #[serde(default)]
  pub property_groups: Vec<PropertyGroupJson>,
  #[serde(default)]
  pub default_properties: JsonMap,
  #[serde(default)]
  pub connection_rules: Option<ConnectionRules>,
  #[serde(default)]
  pub context_menu_items: Vec<ContextMenuItem>,
  #[serde(default)]
  pub disable_default_context_menu: Vec<String>,
  #[serde(default)]
  pub event_triggers: Vec<EventTrigger>,
  #[serde(default)]
  pub hooks: Option<NodeHooks>,
  #[serde(default)]
  pub collapsible: Option<bool>,
  #[serde(default)]
  pub collapsed: Option<bool>,
  #[serde(default)]
  pub editable: Option<bool>,
  #[serde(default)]
  pub deletable: Option<bool>,
  #[serde(default)]
  pub connectable: Option<bool>,
  #[serde(default)]
  pub draggable: Option<bool>,
}

impl NodeJson {
  /// Overrides for the inheritance engine. Declared property defaults seed
  /// `properties` unless `defaultProperties` names the key.
  pub fn to_overrides(&self, language: &str, max_submenu_depth: usize) -> NodeConfigOverrides {
    let mut properties = JsonMap::new();
    for field in &self.properties {
      if let Some(value) = &field.default_value {
        properties.insert(field.id.clone(), value.clone());
      }
    }
    for (key, value) in &self.default_properties {
      properties.insert(key.clone(), value.clone());
    }

    let metadata = NodeMetadata {
      description: self.description.as_ref().map(|d| d.resolve(language)),
      ..NodeMetadata::new(self.id.clone(), self.name.resolve(language))
    };

    NodeConfigOverrides {
      id: Some(self.id.clone()),
      node_type: Some(self.id.clone()),
      category: self.category.clone(),
      metadata: Some(metadata),
      visual_config: self.visual_config.clone(),
      properties,
      property_definitions: self.properties.clone(),
      connection_rules: self.connection_rules.clone(),
      collapsible: self.collapsible,
      collapsed: self.collapsed,
      editable: self.editable,
      deletable: self.deletable,
      connectable: self.connectable,
      draggable: self.draggable,
      icon: self.icon.clone(),
      context_menu_items: if self.context_menu_items.is_empty() {
        None
      } else {
        Some(limit_submenu_depth(self.context_menu_items.clone(), max_submenu_depth))
      },
    }
  }

  /// The full node config inherited from `extends`.
  pub fn to_node_config(&self, language: &str, max_submenu_depth: usize) -> FlowdeckResult<BaseNodeConfig> {
    create_inherited_node_config(&self.extends, self.to_overrides(language, max_submenu_depth)).ok_or_else(|| {
      FlowdeckError::UnknownBaseType {
        base_type: self.extends.clone(),
      }
    })
  }

  /// Declared properties that add a field the archetype does not define but
  /// carry no `label`.
  pub fn unlabeled_new_properties(&self) -> Vec<String> {
    let inherited = match self.extends.parse::<BaseNodeType>() {
      Ok(archetype) => base_definition(archetype).property_definitions,
      Err(_) => Vec::new(),
    };
    self
      .properties
      .iter()
      .enumerate()
      .filter(|(_, patch)| patch.label.is_none() && !inherited.iter().any(|def| def.id == patch.id))
      .map(|(idx, patch)| format!("properties.{}: new property '{}' requires a label", idx, patch.id))
      .collect()
  }

  /// Groups for the property configuration registry: the declared properties,
  /// resolved against `merged` (the inherited definitions), bucketed by
  /// `group`, then explicit `propertyGroups` merged in by id.
  pub fn property_groups(&self, merged: &[PropertyFieldDefinition], default_group: &str) -> Vec<PropertyGroupDefinition> {
    let declared: Vec<PropertyFieldDefinition> = self
      .properties
      .iter()
      .map(|patch| match merged.iter().find(|def| def.id == patch.id) {
        Some(def) => def.clone(),
        None => patch.clone().into_definition(),
      })
      .collect();
    let mut groups = groups_from_field_definitions(&declared, default_group);
    for explicit in &self.property_groups {
      match groups.iter_mut().find(|g| g.id == explicit.id) {
        Some(group) => {
          group.label = explicit.label.clone();
          if let Some(order) = explicit.order {
            group.order = order;
          }
          group.collapsed = explicit.collapsed;
          for field in &explicit.fields {
            match group.fields.iter().position(|f| f.id == field.id) {
              Some(idx) => group.fields[idx] = field.clone(),
              None => group.fields.push(field.clone()),
            }
          }
        }
        None => {
          let order = explicit.order.unwrap_or(groups.len() as i32 + 100);
          let mut group = PropertyGroupDefinition::new(explicit.id.clone(), explicit.label.clone(), order);
          group.collapsed = explicit.collapsed;
          group.fields = explicit.fields.clone();
          groups.push(group);
        }
      }
    }
    groups
  }
}

/// A plugin shipped as JSON: metadata, node documents and categories.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginDocument {
  pub metadata: PluginMetadata,
  #[serde(default)]
  pub nodes: Vec<NodeJson>,
  #[serde(default)]
  pub categories: Vec<CategoryConfig>,
}

impl PluginDocument {
  /// A [`StaticPlugin`] carrying the document's nodes and categories, ready
  /// for the plugin manager. Triggers and hooks are not part of it.
  pub fn into_plugin(self) -> FlowdeckResult<StaticPlugin> {
    let nodes = self
      .nodes
      .iter()
      .map(|node| node.to_node_config(DEFAULT_LANGUAGE, MAX_SUBMENU_DEPTH))
      .collect::<FlowdeckResult<Vec<_>>>()?;
    let resources = PluginResources {
      nodes,
      categories: self.categories,
      ..Default::default()
    };
    Ok(StaticPlugin::new(self.metadata, resources))
  }
}
