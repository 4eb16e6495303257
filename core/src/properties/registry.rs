// flowdeck/src/properties/registry.rs

//! Defines `PropertyConfigRegistry`, which stores declarative property groups
//! per node/edge type and merges them with a global base group list.
//!
//! Merging here is full-replace at field granularity: a custom field that shares
//! an id with a base field supersedes it entirely. Archetype inheritance
//! patches fields instead.

use super::definition::{compare_field_order, FieldType, PropertyFieldDefinition, PropertyGroupDefinition};
use crate::model::JsonMap;
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::{event, Level};

/// Group id used for fields that do not name a group.
pub const DEFAULT_CUSTOM_GROUP: &str = "custom";

/// Order assigned to groups derived from field definitions, so they land after
/// the base groups.
const DERIVED_GROUP_ORDER_START: i32 = 100;

/// The base group list installed by [`PropertyConfigRegistry::new`].
pub fn default_base_groups() -> Vec<PropertyGroupDefinition> {
  vec![PropertyGroupDefinition::new("basic", "Basic", 1).with_fields(vec![
    PropertyFieldDefinition::new("label", "Label", FieldType::Text).with_order(1),
    PropertyFieldDefinition::new("description", "Description", FieldType::Textarea).with_order(2),
  ])]
}

/// Merges two field lists by id. Custom fields fully replace base fields with
/// the same id; new ids are appended. The result is stably sorted by `order`.
pub fn merge_fields(base: &[PropertyFieldDefinition], custom: &[PropertyFieldDefinition]) -> Vec<PropertyFieldDefinition> {
  let mut merged: Vec<PropertyFieldDefinition> = base.to_vec();
  for field in custom {
    match merged.iter().position(|f| f.id == field.id) {
      Some(idx) => merged[idx] = field.clone(),
      None => merged.push(field.clone()),
    }
  }
  merged.sort_by(compare_field_order);
  merged
}

/// Merges two group lists by id. A custom group sharing an id with a base group
/// contributes its fields to the base group; other custom groups are appended.
/// Groups are stably sorted by `order`, and each group's fields by field `order`.
pub fn merge_groups(base: &[PropertyGroupDefinition], custom: &[PropertyGroupDefinition]) -> Vec<PropertyGroupDefinition> {
  let mut merged: Vec<PropertyGroupDefinition> = base.to_vec();
  for group in custom {
    match merged.iter().position(|g| g.id == group.id) {
      Some(idx) => {
        let fields = merge_fields(&merged[idx].fields, &group.fields);
        merged[idx] = PropertyGroupDefinition {
          fields,
          ..merged[idx].clone()
        };
      }
      None => merged.push(group.clone()),
    }
  }
  for group in merged.iter_mut() {
    group.fields.sort_by(compare_field_order);
  }
  merged.sort_by_key(|g| g.order);
  merged
}

/// Buckets field definitions into groups by their `group`, falling back to
/// `default_group`. Groups keep first-seen order.
pub fn groups_from_field_definitions(
  fields: &[PropertyFieldDefinition],
  default_group: &str,
) -> Vec<PropertyGroupDefinition> {
  let mut groups: Vec<PropertyGroupDefinition> = Vec::new();
  for field in fields {
    let group_id = field.group.as_deref().unwrap_or(default_group);
    match groups.iter_mut().find(|g| g.id == group_id) {
      Some(group) => group.fields.push(field.clone()),
      None => {
        let order = DERIVED_GROUP_ORDER_START + groups.len() as i32;
        let mut group = PropertyGroupDefinition::new(group_id, title_case(group_id), order);
        group.fields.push(field.clone());
        groups.push(group);
      }
    }
  }
  groups
}

fn title_case(id: &str) -> String {
  let mut chars = id.chars();
  match chars.next() {
    Some(first) => first.to_uppercase().chain(chars).collect(),
    None => String::new(),
  }
}

/// Flat `fieldId -> defaultValue` map over every field that declares a default.
pub fn default_values(groups: &[PropertyGroupDefinition]) -> JsonMap {
  let mut defaults = JsonMap::new();
  for field in groups.iter().flat_map(|g| g.fields.iter()) {
    if let Some(value) = &field.default_value {
      defaults.insert(field.id.clone(), value.clone());
    }
  }
  defaults
}

pub struct PropertyConfigRegistry {
  base_groups: RwLock<Vec<PropertyGroupDefinition>>,
  node_groups: RwLock<HashMap<String, Vec<PropertyGroupDefinition>>>,
  edge_groups: RwLock<HashMap<String, Vec<PropertyGroupDefinition>>>,
}

impl Default for PropertyConfigRegistry {
  fn default() -> Self {
    Self::new()
  }
}

impl PropertyConfigRegistry {
  /// Creates a registry whose base groups are [`default_base_groups`].
  pub fn new() -> Self {
    Self::with_base_groups(default_base_groups())
  }

  pub fn with_base_groups(base_groups: Vec<PropertyGroupDefinition>) -> Self {
    Self {
      base_groups: RwLock::new(base_groups),
      node_groups: RwLock::new(HashMap::new()),
      edge_groups: RwLock::new(HashMap::new()),
    }
  }

  pub fn set_base_groups(&self, groups: Vec<PropertyGroupDefinition>) {
    *self.base_groups.write() = groups;
  }

  pub fn base_groups(&self) -> Vec<PropertyGroupDefinition> {
    self.base_groups.read().clone()
  }

  /// Stores the custom groups for `node_type`, replacing any previous set.
  pub fn register_node_groups(&self, node_type: &str, groups: Vec<PropertyGroupDefinition>) {
    if self.node_groups.write().insert(node_type.to_string(), groups).is_some() {
      event!(Level::WARN, %node_type, "Replacing existing node property groups.");
    } else {
      event!(Level::DEBUG, %node_type, "Node property groups registered.");
    }
  }

  pub fn register_edge_groups(&self, edge_type: &str, groups: Vec<PropertyGroupDefinition>) {
    if self.edge_groups.write().insert(edge_type.to_string(), groups).is_some() {
      event!(Level::WARN, %edge_type, "Replacing existing edge property groups.");
    } else {
      event!(Level::DEBUG, %edge_type, "Edge property groups registered.");
    }
  }

  pub fn unregister_node_groups(&self, node_type: &str) -> bool {
    self.node_groups.write().remove(node_type).is_some()
  }

  pub fn unregister_edge_groups(&self, edge_type: &str) -> bool {
    self.edge_groups.write().remove(edge_type).is_some()
  }

  pub fn has_node_groups(&self, node_type: &str) -> bool {
    self.node_groups.read().contains_key(node_type)
  }

  pub fn has_edge_groups(&self, edge_type: &str) -> bool {
    self.edge_groups.read().contains_key(edge_type)
  }

  /// Custom groups registered for `node_type`, unmerged.
  pub fn custom_node_groups(&self, node_type: &str) -> Vec<PropertyGroupDefinition> {
    self.node_groups.read().get(node_type).cloned().unwrap_or_default()
  }

  pub fn get_node_property_groups(&self, node_type: &str) -> Vec<PropertyGroupDefinition> {
    let base = self.base_groups.read();
    let custom = self.node_groups.read();
    merge_groups(&base, custom.get(node_type).map(Vec::as_slice).unwrap_or_default())
  }

  pub fn get_edge_property_groups(&self, edge_type: &str) -> Vec<PropertyGroupDefinition> {
    let base = self.base_groups.read();
    let custom = self.edge_groups.read();
    merge_groups(&base, custom.get(edge_type).map(Vec::as_slice).unwrap_or_default())
  }

  pub fn get_default_node_properties(&self, node_type: &str) -> JsonMap {
    default_values(&self.get_node_property_groups(node_type))
  }

  pub fn get_default_edge_properties(&self, edge_type: &str) -> JsonMap {
    default_values(&self.get_edge_property_groups(edge_type))
  }

  pub fn node_types(&self) -> Vec<String> {
    let mut types: Vec<String> = self.node_groups.read().keys().cloned().collect();
    types.sort();
    types
  }

  pub fn edge_types(&self) -> Vec<String> {
    let mut types: Vec<String> = self.edge_groups.read().keys().cloned().collect();
    types.sort();
    types
  }

  pub fn clear(&self) {
    self.node_groups.write().clear();
    self.edge_groups.write().clear();
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn field(id: &str, order: Option<i32>) -> PropertyFieldDefinition {
    let f = PropertyFieldDefinition::new(id, id, FieldType::Text);
    match order {
      Some(o) => f.with_order(o),
      None => f,
    }
  }

  #[test]
  fn unordered_fields_sort_last_and_stay_stable() {
    let merged = merge_fields(&[field("a", None), field("b", Some(5))], &[field("c", None), field("d", Some(1))]);
    let ids: Vec<&str> = merged.iter().map(|f| f.id.as_str()).collect();
    assert_eq!(ids, vec!["d", "b", "a", "c"]);
  }

  #[test]
  fn derived_groups_follow_first_seen_order() {
    let fields = vec![
      field("to", Some(3)).with_group("basic"),
      field("retries", None),
      field("subject", Some(4)).with_group("basic"),
    ];
    let groups = groups_from_field_definitions(&fields, DEFAULT_CUSTOM_GROUP);
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].id, "basic");
    assert_eq!(groups[0].field_ids(), vec!["to", "subject"]);
    assert_eq!(groups[1].id, "custom");
    assert_eq!(groups[1].label.to_string(), "Custom");
  }
}
