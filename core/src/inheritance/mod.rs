// flowdeck/src/inheritance/mod.rs

//! Builds complete node configurations by layering caller overrides over one
//! of the fixed archetypes.
//!
//! Property definitions are merged with field-level *patch* semantics here: an
//! override naming an existing id only changes the attributes it sets. The
//! property configuration registry replaces whole fields instead.

pub mod archetype;

pub use archetype::{base_definition, BaseNodeDefinition, BaseNodeType};

use crate::model::{merge_json_maps, BaseNodeConfig, ConnectionRules, JsonMap, LocalizedText, NodeMetadata, VisualConfig};
use crate::properties::{FieldCondition, FieldSchema, FieldType, PropertyFieldDefinition, SelectOption};
use crate::registry::context_menu::ContextMenuItem;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{event, instrument, Level};

/// A partial [`PropertyFieldDefinition`]. Only `id` is mandatory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyFieldPatch {
  pub id: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub label: Option<LocalizedText>,
  #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
  pub field_type: Option<FieldType>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub default_value: Option<Value>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub required: Option<bool>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub readonly: Option<bool>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub disabled: Option<FieldCondition>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub visible: Option<FieldCondition>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub validation: Option<FieldSchema>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub options: Option<Vec<SelectOption>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub order: Option<i32>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub group: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub placeholder: Option<LocalizedText>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<LocalizedText>,
}

impl PropertyFieldPatch {
  pub fn new(id: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      ..Default::default()
    }
  }

  /// Shallow merge over `base`: attributes set here win.
  pub fn apply(&self, base: &PropertyFieldDefinition) -> PropertyFieldDefinition {
    let patch = self.clone();
    PropertyFieldDefinition {
      id: base.id.clone(),
      label: patch.label.unwrap_or_else(|| base.label.clone()),
      field_type: patch.field_type.unwrap_or(base.field_type),
      default_value: patch.default_value.or_else(|| base.default_value.clone()),
      required: patch.required.unwrap_or(base.required),
      readonly: patch.readonly.unwrap_or(base.readonly),
      disabled: patch.disabled.or_else(|| base.disabled.clone()),
      visible: patch.visible.or_else(|| base.visible.clone()),
      validation: patch.validation.or_else(|| base.validation.clone()),
      options: patch.options.unwrap_or_else(|| base.options.clone()),
      order: patch.order.or(base.order),
      group: patch.group.or_else(|| base.group.clone()),
      placeholder: patch.placeholder.or_else(|| base.placeholder.clone()),
      description: patch.description.or_else(|| base.description.clone()),
    }
  }

  /// A standalone definition; the label falls back to the id.
  pub fn into_definition(self) -> PropertyFieldDefinition {
    let label = self.label.unwrap_or_else(|| LocalizedText::from(self.id.as_str()));
    PropertyFieldDefinition {
      label,
      field_type: self.field_type.unwrap_or_default(),
      default_value: self.default_value,
      required: self.required.unwrap_or(false),
      readonly: self.readonly.unwrap_or(false),
      disabled: self.disabled,
      visible: self.visible,
      validation: self.validation,
      options: self.options.unwrap_or_default(),
      order: self.order,
      group: self.group,
      placeholder: self.placeholder,
      description: self.description,
      id: self.id,
    }
  }
}

impl From<PropertyFieldDefinition> for PropertyFieldPatch {
  fn from(def: PropertyFieldDefinition) -> Self {
    Self {
      id: def.id,
      label: Some(def.label),
      field_type: Some(def.field_type),
      default_value: def.default_value,
      required: Some(def.required),
      readonly: Some(def.readonly),
      disabled: def.disabled,
      visible: def.visible,
      validation: def.validation,
      options: Some(def.options),
      order: def.order,
      group: def.group,
      placeholder: def.placeholder,
      description: def.description,
    }
  }
}

/// Caller-side overrides for [`create_inherited_node_config`]. Unset fields
/// fall back to the archetype.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeConfigOverrides {
  #[serde(default)]
  pub id: Option<String>,
  #[serde(rename = "type", default)]
  pub node_type: Option<String>,
  #[serde(default)]
  pub category: Option<String>,
  #[serde(default)]
  pub metadata: Option<NodeMetadata>,
  #[serde(default)]
  pub visual_config: Option<VisualConfig>,
  #[serde(default)]
  pub properties: JsonMap,
  #[serde(default)]
  pub property_definitions: Vec<PropertyFieldPatch>,
  #[serde(default)]
  pub connection_rules: Option<ConnectionRules>,
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
  #[serde(default)]
  pub icon: Option<String>,
  #[serde(default)]
  pub context_menu_items: Option<Vec<ContextMenuItem>>,
}

impl NodeConfigOverrides {
  pub fn for_type(node_type: impl Into<String>, title: impl Into<String>) -> Self {
    let node_type = node_type.into();
    Self {
      metadata: Some(NodeMetadata::new(node_type.clone(), title)),
      id: Some(node_type.clone()),
      node_type: Some(node_type),
      ..Default::default()
    }
  }

  pub fn with_property(mut self, key: impl Into<String>, value: Value) -> Self {
    self.properties.insert(key.into(), value);
    self
  }

  pub fn with_definition(mut self, patch: impl Into<PropertyFieldPatch>) -> Self {
    self.property_definitions.push(patch.into());
    self
  }
}

/// Merges definitions by id: base entries keep their position and are patched
/// in place when an override names them, new ids are appended.
pub fn merge_property_definitions(
  base: &[PropertyFieldDefinition],
  patches: &[PropertyFieldPatch],
) -> Vec<PropertyFieldDefinition> {
  let mut merged: Vec<PropertyFieldDefinition> = base.to_vec();
  for patch in patches {
    match merged.iter().position(|def| def.id == patch.id) {
      Some(idx) => merged[idx] = patch.apply(&merged[idx]),
      None => merged.push(patch.clone().into_definition()),
    }
  }
  merged
}

/// Builds a node config from the `base_type` archetype with `overrides` on top.
///
/// Returns `None` (and logs) when `base_type` is not an archetype.
#[instrument(name = "inheritance::create_inherited_node_config", skip_all, fields(%base_type))]
pub fn create_inherited_node_config(base_type: &str, overrides: NodeConfigOverrides) -> Option<BaseNodeConfig> {
  let archetype: BaseNodeType = match base_type.parse() {
    Ok(archetype) => archetype,
    Err(err) => {
      event!(Level::WARN, error = %err, "Cannot inherit from unknown base type.");
      return None;
    }
  };
  let base = base_definition(archetype);

  let id = overrides
    .id
    .clone()
    .or_else(|| overrides.node_type.clone())
    .or_else(|| overrides.metadata.as_ref().map(|m| m.id.clone()))
    .unwrap_or_else(|| archetype.as_str().to_string());
  let node_type = overrides.node_type.clone().unwrap_or_else(|| id.clone());
  let metadata = overrides
    .metadata
    .clone()
    .unwrap_or_else(|| NodeMetadata::new(id.clone(), archetype.title()));

  let visual_config = match (&base.visual_config, &overrides.visual_config) {
    (Some(base_visual), Some(over)) => Some(merge_json_maps(base_visual, over)),
    (None, Some(over)) => Some(over.clone()),
    (base_visual, None) => base_visual.clone(),
  };
  let connection_rules = match &overrides.connection_rules {
    Some(over) => base.connection_rules.merged_with(over),
    None => base.connection_rules.clone(),
  };

  let config = BaseNodeConfig {
    id,
    node_type,
    category: overrides.category.clone().unwrap_or(base.category),
    metadata,
    visual_config,
    properties: merge_json_maps(&base.default_properties, &overrides.properties),
    property_definitions: merge_property_definitions(&base.property_definitions, &overrides.property_definitions),
    connection_rules,
    collapsible: overrides.collapsible.unwrap_or(true),
    collapsed: overrides.collapsed.unwrap_or(false),
    editable: overrides.editable.unwrap_or(true),
    deletable: overrides.deletable.unwrap_or(true),
    connectable: overrides.connectable.unwrap_or(true),
    draggable: overrides.draggable.unwrap_or(true),
    icon: overrides.icon,
    context_menu_items: overrides.context_menu_items.unwrap_or(base.context_menu_items),
    extends: Some(archetype),
  };
  event!(Level::DEBUG, node_type = %config.node_type, fields = config.property_definitions.len(), "Inherited node config built.");
  Some(config)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InheritanceValidation {
  pub valid: bool,
  pub errors: Vec<String>,
}

/// Checks that `node_type` may extend `extends_from`.
pub fn validate_inheritance(node_type: &str, extends_from: &str) -> InheritanceValidation {
  let mut errors = Vec::new();
  if node_type.trim().is_empty() {
    errors.push("Node type is required".to_string());
  }
  if extends_from.trim().is_empty() {
    errors.push("Base type to extend is required".to_string());
  } else if extends_from.parse::<BaseNodeType>().is_err() {
    let known: Vec<&str> = BaseNodeType::ALL.iter().map(BaseNodeType::as_str).collect();
    errors.push(format!(
      "Unknown base type '{}'. Expected one of: {}",
      extends_from,
      known.join(", ")
    ));
  }
  if !node_type.is_empty() && node_type == extends_from {
    errors.push(format!("Node type '{}' cannot extend itself", node_type));
  }
  InheritanceValidation {
    valid: errors.is_empty(),
    errors,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn patch_keeps_unset_attributes() {
    let base = PropertyFieldDefinition::new("label", "Label", FieldType::Text)
      .with_order(1)
      .required(true);
    let mut patch = PropertyFieldPatch::new("label");
    patch.default_value = Some(Value::String("Send".to_string()));
    let patched = patch.apply(&base);
    assert!(patched.required);
    assert_eq!(patched.order, Some(1));
    assert_eq!(patched.default_value, Some(Value::String("Send".to_string())));
  }

  #[test]
  fn every_archetype_declares_label_and_description() {
    for archetype in BaseNodeType::ALL {
      let def = base_definition(archetype);
      let ids: Vec<&str> = def.property_definitions.iter().map(|d| d.id.as_str()).collect();
      assert!(ids.starts_with(&["label", "description"]), "{} has {:?}", archetype, ids);
    }
  }
}
