// tests/property_sync_tests.rs
mod common;

use common::*;
use flowdeck::properties::sync::{
  apply_update, is_field_disabled, is_field_visible, is_group_visible, resolve_value, sync_properties, sync_property,
  validate_entity,
};
use flowdeck::properties::{
  ConditionOperator, ConditionRule, FieldCondition, FieldSchema, FieldType, PropertyFieldDefinition,
  PropertyGroupDefinition, ValidateOptions,
};
use flowdeck::Entity;
use serde_json::json;

fn email_field() -> PropertyFieldDefinition {
  PropertyFieldDefinition::new("to", "Recipient", FieldType::Text)
    .with_validation(FieldSchema::required().with_length(None, Some(10)))
}

#[test]
fn test_id_writes_produce_no_update() {
  setup_tracing();
  let entity = Entity::new("n1", "task");
  let result = sync_property(&entity, "id", json!("n2"), None);
  assert!(result.update.is_none());
  assert!(result.valid);
}

#[test]
fn test_description_is_mirrored_to_all_maps() {
  setup_tracing();
  let mut entity = Entity::new("n1", "task");
  let result = sync_property(&entity, "description", json!("Sends mail"), None);
  let update = result.update.expect("description changes the entity");
  assert_eq!(update.metadata["description"], json!("Sends mail"));
  assert_eq!(update.data["description"], json!("Sends mail"));
  assert_eq!(update.properties["description"], json!("Sends mail"));

  apply_update(&mut entity, &update);
  assert_eq!(entity.metadata["description"], json!("Sends mail"));
  assert_eq!(entity.properties["description"], json!("Sends mail"));
}

#[test]
fn test_regular_fields_go_to_properties_and_data() {
  setup_tracing();
  let entity = Entity::new("n1", "task");
  let update = sync_property(&entity, "priority", json!("high"), None)
    .update
    .expect("update");
  assert!(update.metadata.is_empty());
  assert_eq!(update.properties["priority"], json!("high"));
  assert_eq!(update.data["priority"], json!("high"));
}

#[test]
fn test_invalid_value_still_produces_update() {
  setup_tracing();
  let entity = Entity::new("n1", "sendEmailTask");
  let result = sync_property(&entity, "to", json!("someone-with-a-long@address.org"), Some(&email_field()));
  assert!(!result.valid);
  assert_eq!(result.errors.len(), 1);
  assert_eq!(result.errors[0].code.as_deref(), Some("maxLength"));
  assert!(result.update.is_some(), "validation never blocks the write");
}

#[test]
fn test_batch_sync_combines_updates() {
  setup_tracing();
  let entity = Entity::new("n1", "sendEmailTask");
  let changes = vec![
    ("to".to_string(), json!("")),
    ("subject".to_string(), json!("Hello")),
    ("id".to_string(), json!("ignored")),
  ];
  let result = sync_properties(&entity, changes, &[email_field()]);
  assert!(!result.valid);
  assert_eq!(result.errors[0].field, "to");

  let update = result.update.expect("update");
  assert_eq!(update.properties.len(), 2);
  assert!(!update.properties.contains_key("id"));
}

#[test]
fn test_validate_entity_collects_or_aborts() {
  setup_tracing();
  let groups = vec![PropertyGroupDefinition::new("basic", "Basic", 1).with_fields(vec![
    PropertyFieldDefinition::new("label", "Label", FieldType::Text).required(true),
    email_field(),
    PropertyFieldDefinition::new("retries", "Retries", FieldType::Number)
      .with_validation(FieldSchema::default().with_range(Some(0.0), Some(5.0))),
  ])];
  let entity = Entity::new("n1", "sendEmailTask").with_property("retries", json!(9));

  let all = validate_entity(&entity, &groups, ValidateOptions::default());
  assert!(!all.valid);
  assert_eq!(all.errors.len(), 3);
  assert_eq!(all.field_results.len(), 3);

  let first = validate_entity(&entity, &groups, ValidateOptions { abort_early: true });
  assert_eq!(first.errors.len(), 1);
  assert_eq!(first.errors[0].field, "label");

  let fixed = Entity::new("n1", "sendEmailTask")
    .with_property("label", json!("Mail"))
    .with_data("to", json!("a@b.io"))
    .with_property("retries", json!(2));
  assert!(validate_entity(&fixed, &groups, ValidateOptions::default()).valid);
}

#[test]
fn test_resolve_value_lookup_chain() {
  let entity = Entity::new("n1", "task")
    .with_metadata("description", json!("from metadata"))
    .with_property("description", json!("from properties"))
    .with_data("priority", json!("low"));

  let description = PropertyFieldDefinition::new("description", "Description", FieldType::Textarea);
  assert_eq!(resolve_value(&entity, &description), Some(json!("from metadata")));

  let priority = PropertyFieldDefinition::new("priority", "Priority", FieldType::Select);
  assert_eq!(resolve_value(&entity, &priority), Some(json!("low")));

  let id = PropertyFieldDefinition::new("id", "Id", FieldType::Text);
  assert_eq!(resolve_value(&entity, &id), Some(json!("n1")));

  let missing = PropertyFieldDefinition::new("color", "Color", FieldType::Color).with_default(json!("#fff"));
  assert_eq!(resolve_value(&entity, &missing), Some(json!("#fff")));
}

#[test]
fn test_visibility_and_disabled_conditions() {
  let entity = Entity::new("n1", "gateway")
    .with_property("gatewayType", json!("exclusive"))
    .with_property("tags", json!(["urgent", "billing"]));

  let field = PropertyFieldDefinition::new("defaultFlow", "Default flow", FieldType::Text).with_visible(
    ConditionRule::new("gatewayType", ConditionOperator::Equals, json!("exclusive")),
  );
  assert!(is_field_visible(&field, &entity));

  let hidden = field
    .clone()
    .with_visible(ConditionRule::new("tags", ConditionOperator::NotIncludes, json!("urgent")));
  assert!(!is_field_visible(&hidden, &entity));

  let locked = PropertyFieldDefinition::new("owner", "Owner", FieldType::Text)
    .with_disabled(FieldCondition::predicate(|e| e.properties.contains_key("tags")));
  assert!(is_field_disabled(&locked, &entity));
  let readonly = PropertyFieldDefinition::new("owner", "Owner", FieldType::Text).readonly(true);
  assert!(is_field_disabled(&readonly, &Entity::new("n2", "task")));

  let mut group = PropertyGroupDefinition::new("routing", "Routing", 2);
  assert!(is_group_visible(&group, &entity));
  group.visible = Some(ConditionRule::new("gatewayType", ConditionOperator::Equals, json!("parallel")).into());
  assert!(!is_group_visible(&group, &entity));
}
