// flowdeck/src/properties/sync.rs

//! Routes property-panel writes to the places an entity stores them and
//! validates entities against their property groups.
//!
//! Routing by field id:
//!  - `id` is immutable and never produces an update.
//!  - `description` is mirrored into `metadata`, `data` and `properties`.
//!  - every other field is mirrored into `properties` and `data`.

use super::definition::{PropertyFieldDefinition, PropertyGroupDefinition};
use super::validation::{EntityValidationResult, FieldValidationResult, ValidationError, ValidationWarning};
use crate::model::{Entity, JsonMap};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{event, instrument, Level};

const ID_FIELD: &str = "id";
const DESCRIPTION_FIELD: &str = "description";

/// Changes to apply to an entity, split by target map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyUpdate {
  #[serde(default, skip_serializing_if = "JsonMap::is_empty")]
  pub metadata: JsonMap,
  #[serde(default, skip_serializing_if = "JsonMap::is_empty")]
  pub data: JsonMap,
  #[serde(default, skip_serializing_if = "JsonMap::is_empty")]
  pub properties: JsonMap,
}

impl PropertyUpdate {
  pub fn is_empty(&self) -> bool {
    self.metadata.is_empty() && self.data.is_empty() && self.properties.is_empty()
  }

  fn route(&mut self, field_id: &str, value: Value) -> bool {
    match field_id {
      ID_FIELD => false,
      DESCRIPTION_FIELD => {
        self.metadata.insert(field_id.to_string(), value.clone());
        self.data.insert(field_id.to_string(), value.clone());
        self.properties.insert(field_id.to_string(), value);
        true
      }
      _ => {
        self.properties.insert(field_id.to_string(), value.clone());
        self.data.insert(field_id.to_string(), value);
        true
      }
    }
  }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SyncResult {
  /// `None` when nothing needs to change (e.g. a write to `id`).
  pub update: Option<PropertyUpdate>,
  pub valid: bool,
  pub errors: Vec<ValidationError>,
  pub warnings: Vec<ValidationWarning>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidateOptions {
  /// Stop at the first field that fails.
  pub abort_early: bool,
}

/// Computes the update for writing `value` into `field_id`.
///
/// A schema failure does not suppress the update; it only marks the result invalid.
#[instrument(name = "properties::sync_property", skip(entity, value, definition), fields(entity_id = %entity.id))]
pub fn sync_property(
  entity: &Entity,
  field_id: &str,
  value: Value,
  definition: Option<&PropertyFieldDefinition>,
) -> SyncResult {
  let check = match definition {
    Some(def) => check_field(def, Some(&value)),
    None => FieldValidationResult::ok(),
  };

  let mut update = PropertyUpdate::default();
  if !update.route(field_id, value) {
    event!(Level::DEBUG, %field_id, "Field is immutable, no update produced.");
  }

  if !check.valid {
    event!(Level::DEBUG, %field_id, errors = check.errors.len(), "Synced value failed validation.");
  }

  SyncResult {
    update: (!update.is_empty()).then_some(update),
    valid: check.valid,
    errors: check.errors,
    warnings: check.warnings,
  }
}

/// Batch form of [`sync_property`] producing one combined update.
#[instrument(name = "properties::sync_properties", skip_all, fields(entity_id = %entity.id))]
pub fn sync_properties<I>(entity: &Entity, changes: I, definitions: &[PropertyFieldDefinition]) -> SyncResult
where
  I: IntoIterator<Item = (String, Value)>,
{
  let mut update = PropertyUpdate::default();
  let mut result = SyncResult {
    valid: true,
    ..Default::default()
  };

  for (field_id, value) in changes {
    if let Some(def) = definitions.iter().find(|d| d.id == field_id) {
      let check = check_field(def, Some(&value));
      result.valid &= check.valid;
      result.errors.extend(check.errors);
      result.warnings.extend(check.warnings);
    }
    update.route(&field_id, value);
  }

  result.update = (!update.is_empty()).then_some(update);
  result
}

/// Applies an update produced by [`sync_property`]/[`sync_properties`].
pub fn apply_update(entity: &mut Entity, update: &PropertyUpdate) {
  for (k, v) in &update.metadata {
    entity.metadata.insert(k.clone(), v.clone());
  }
  for (k, v) in &update.data {
    entity.data.insert(k.clone(), v.clone());
  }
  for (k, v) in &update.properties {
    entity.properties.insert(k.clone(), v.clone());
  }
}

/// Current value of `field` on `entity`, using the same lookup chain as sync:
/// `id` from the entity itself, `description` from metadata, data, then
/// properties, any other field from properties then data. Falls back to the
/// field's default.
pub fn resolve_value(entity: &Entity, field: &PropertyFieldDefinition) -> Option<Value> {
  let found = match field.id.as_str() {
    ID_FIELD => Some(Value::String(entity.id.clone())),
    DESCRIPTION_FIELD => entity
      .metadata
      .get(DESCRIPTION_FIELD)
      .or_else(|| entity.data.get(DESCRIPTION_FIELD))
      .or_else(|| entity.properties.get(DESCRIPTION_FIELD))
      .cloned(),
    other => entity.properties.get(other).or_else(|| entity.data.get(other)).cloned(),
  };
  found.or_else(|| field.default_value.clone())
}

fn check_field(field: &PropertyFieldDefinition, value: Option<&Value>) -> FieldValidationResult {
  let mut result = match &field.validation {
    Some(schema) => schema.validate_value(&field.id, value),
    None => FieldValidationResult::ok(),
  };
  let schema_required = field.validation.as_ref().is_some_and(|s| s.required);
  if field.required && !schema_required {
    let empty = match value {
      None | Some(Value::Null) => true,
      Some(Value::String(s)) => s.trim().is_empty(),
      _ => false,
    };
    if empty {
      result.push_error(&field.id, format!("{} is required", field.label), Some("required".to_string()));
    }
  }
  result
}

pub fn validate_field(entity: &Entity, field: &PropertyFieldDefinition) -> FieldValidationResult {
  check_field(field, resolve_value(entity, field).as_ref())
}

#[instrument(name = "properties::validate_entity", skip(entity, groups), fields(entity_id = %entity.id))]
pub fn validate_entity(entity: &Entity, groups: &[PropertyGroupDefinition], options: ValidateOptions) -> EntityValidationResult {
  let mut result = EntityValidationResult {
    valid: true,
    ..Default::default()
  };

  'groups: for group in groups {
    for field in &group.fields {
      let field_result = validate_field(entity, field);
      let failed = !field_result.valid;
      result.errors.extend(field_result.errors.iter().cloned());
      result.warnings.extend(field_result.warnings.iter().cloned());
      result.field_results.insert(field.id.clone(), field_result);
      if failed && options.abort_early {
        break 'groups;
      }
    }
  }

  result.valid = result.errors.is_empty();
  event!(Level::DEBUG, valid = result.valid, errors = result.errors.len(), "Entity validated.");
  result
}

pub fn is_field_visible(field: &PropertyFieldDefinition, entity: &Entity) -> bool {
  field.visible.as_ref().map_or(true, |c| c.evaluate(entity))
}

/// Read-only fields are always disabled.
pub fn is_field_disabled(field: &PropertyFieldDefinition, entity: &Entity) -> bool {
  field.readonly || field.disabled.as_ref().is_some_and(|c| c.evaluate(entity))
}

pub fn is_group_visible(group: &PropertyGroupDefinition, entity: &Entity) -> bool {
  group.visible.as_ref().map_or(true, |c| c.evaluate(entity))
}
