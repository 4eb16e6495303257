// flowdeck/src/properties/definition.rs

//! Declarative property schema: fields, groups and the conditions that drive
//! their visibility and enablement.

use super::validation::FieldSchema;
use crate::model::{Entity, LocalizedText};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum FieldType {
  #[default]
  Text,
  Textarea,
  Number,
  Boolean,
  Select,
  MultiSelect,
  Color,
  Date,
  Json,
  #[serde(other)]
  Custom,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
  pub label: LocalizedText,
  pub value: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConditionOperator {
  Equals,
  NotEquals,
  Includes,
  NotIncludes,
  Custom,
}

impl ConditionOperator {
  /// Compares the current value of a property against the expected one.
  ///
  /// `includes` checks array membership when the actual value is an array and
  /// substring containment when both sides are strings. `custom` has no
  /// declarative meaning and always holds.
  pub fn evaluate(&self, actual: Option<&Value>, expected: &Value) -> bool {
    match self {
      ConditionOperator::Equals => actual.unwrap_or(&Value::Null) == expected,
      ConditionOperator::NotEquals => actual.unwrap_or(&Value::Null) != expected,
      ConditionOperator::Includes => includes(actual, expected),
      ConditionOperator::NotIncludes => !includes(actual, expected),
      ConditionOperator::Custom => true,
    }
  }
}

fn includes(actual: Option<&Value>, expected: &Value) -> bool {
  match (actual, expected) {
    (Some(Value::Array(items)), _) => items.contains(expected),
    (Some(Value::String(haystack)), Value::String(needle)) => haystack.contains(needle.as_str()),
    _ => false,
  }
}

/// Declarative comparison against `entity.properties[field]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionRule {
  pub field: String,
  pub operator: ConditionOperator,
  #[serde(default)]
  pub value: Value,
}

impl ConditionRule {
  pub fn new(field: impl Into<String>, operator: ConditionOperator, value: Value) -> Self {
    Self {
      field: field.into(),
      operator,
      value,
    }
  }

  pub fn evaluate(&self, entity: &Entity) -> bool {
    self.operator.evaluate(entity.properties.get(&self.field), &self.value)
  }
}

pub type EntityPredicate = Arc<dyn Fn(&Entity) -> bool + Send + Sync + 'static>;

/// Either a predicate over the entity or a declarative rule. Only the rule form
/// survives serialization.
#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldCondition {
  Rule(ConditionRule),
  #[serde(skip)]
  Predicate(EntityPredicate),
}

impl FieldCondition {
  pub fn predicate(f: impl Fn(&Entity) -> bool + Send + Sync + 'static) -> Self {
    FieldCondition::Predicate(Arc::new(f))
  }

  pub fn evaluate(&self, entity: &Entity) -> bool {
    match self {
      FieldCondition::Rule(rule) => rule.evaluate(entity),
      FieldCondition::Predicate(f) => f(entity),
    }
  }
}

impl std::fmt::Debug for FieldCondition {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      FieldCondition::Rule(rule) => f.debug_tuple("Rule").field(rule).finish(),
      FieldCondition::Predicate(_) => f.write_str("Predicate(<fn>)"),
    }
  }
}

impl From<ConditionRule> for FieldCondition {
  fn from(rule: ConditionRule) -> Self {
    FieldCondition::Rule(rule)
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyFieldDefinition {
  pub id: String,
  pub label: LocalizedText,
  #[serde(rename = "type", default)]
  pub field_type: FieldType,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub default_value: Option<Value>,
  #[serde(default)]
  pub required: bool,
  #[serde(default)]
  pub readonly: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub disabled: Option<FieldCondition>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub visible: Option<FieldCondition>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub validation: Option<FieldSchema>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub options: Vec<SelectOption>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub order: Option<i32>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub group: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub placeholder: Option<LocalizedText>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<LocalizedText>,
}

impl PropertyFieldDefinition {
  pub fn new(id: impl Into<String>, label: impl Into<LocalizedText>, field_type: FieldType) -> Self {
    Self {
      id: id.into(),
      label: label.into(),
      field_type,
      default_value: None,
      required: false,
      readonly: false,
      disabled: None,
      visible: None,
      validation: None,
      options: Vec::new(),
      order: None,
      group: None,
      placeholder: None,
      description: None,
    }
  }

  pub fn with_order(mut self, order: i32) -> Self {
    self.order = Some(order);
    self
  }

  pub fn with_default(mut self, value: Value) -> Self {
    self.default_value = Some(value);
    self
  }

  pub fn with_group(mut self, group: impl Into<String>) -> Self {
    self.group = Some(group.into());
    self
  }

  pub fn with_validation(mut self, schema: FieldSchema) -> Self {
    self.validation = Some(schema);
    self
  }

  pub fn with_visible(mut self, condition: impl Into<FieldCondition>) -> Self {
    self.visible = Some(condition.into());
    self
  }

  pub fn with_disabled(mut self, condition: impl Into<FieldCondition>) -> Self {
    self.disabled = Some(condition.into());
    self
  }

  pub fn required(mut self, required: bool) -> Self {
    self.required = required;
    self
  }

  pub fn readonly(mut self, readonly: bool) -> Self {
    self.readonly = readonly;
    self
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyGroupDefinition {
  pub id: String,
  pub label: LocalizedText,
  #[serde(default)]
  pub order: i32,
  #[serde(default)]
  pub fields: Vec<PropertyFieldDefinition>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub visible: Option<FieldCondition>,
  #[serde(default)]
  pub collapsed: bool,
}

impl PropertyGroupDefinition {
  pub fn new(id: impl Into<String>, label: impl Into<LocalizedText>, order: i32) -> Self {
    Self {
      id: id.into(),
      label: label.into(),
      order,
      fields: Vec::new(),
      visible: None,
      collapsed: false,
    }
  }

  pub fn with_fields(mut self, fields: Vec<PropertyFieldDefinition>) -> Self {
    self.fields = fields;
    self
  }

  pub fn field(&self, field_id: &str) -> Option<&PropertyFieldDefinition> {
    self.fields.iter().find(|f| f.id == field_id)
  }

  pub fn field_ids(&self) -> Vec<&str> {
    self.fields.iter().map(|f| f.id.as_str()).collect()
  }
}

/// Ascending by `order`; fields without an order sort after every ordered field.
pub fn compare_field_order(a: &PropertyFieldDefinition, b: &PropertyFieldDefinition) -> Ordering {
  match (a.order, b.order) {
    (Some(x), Some(y)) => x.cmp(&y),
    (Some(_), None) => Ordering::Less,
    (None, Some(_)) => Ordering::Greater,
    (None, None) => Ordering::Equal,
  }
}
