// flowdeck/src/config/validator.rs

//! JSON-schema checking of node and plugin documents.

use crate::error::{FlowdeckError, FlowdeckResult};
use crate::inheritance::BaseNodeType;
use crate::properties::{StructuredError, Validator};
use jsonschema::JSONSchema;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::marker::PhantomData;

fn text_schema() -> Value {
  json!({
    "oneOf": [
      { "type": "string" },
      {
        "type": "object",
        "required": ["en"],
        "additionalProperties": { "type": "string" }
      }
    ]
  })
}

fn definitions() -> Value {
  let archetypes: Vec<&str> = BaseNodeType::ALL.iter().map(BaseNodeType::as_str).collect();
  json!({
    "text": text_schema(),
    "condition": {
      "type": "object",
      "required": ["field", "operator"],
      "properties": {
        "field": { "type": "string" },
        "operator": { "enum": ["equals", "notEquals", "includes", "notIncludes", "custom"] }
      }
    },
    "property": {
      "type": "object",
      "required": ["id"],
      "properties": {
        "id": { "type": "string", "minLength": 1 },
        "label": { "$ref": "#/definitions/text" },
        "type": { "type": "string" },
        "required": { "type": "boolean" },
        "readonly": { "type": "boolean" },
        "order": { "type": "integer" },
        "group": { "type": "string" },
        "placeholder": { "$ref": "#/definitions/text" },
        "description": { "$ref": "#/definitions/text" },
        "options": {
          "type": "array",
          "items": {
            "type": "object",
            "required": ["label", "value"],
            "properties": { "label": { "$ref": "#/definitions/text" } }
          }
        },
        "validation": { "type": "object" },
        "visible": { "$ref": "#/definitions/condition" },
        "disabled": { "$ref": "#/definitions/condition" }
      }
    },
    "groupField": {
      "allOf": [{ "$ref": "#/definitions/property" }, { "required": ["label"] }]
    },
    "propertyGroup": {
      "type": "object",
      "required": ["id", "label"],
      "properties": {
        "id": { "type": "string", "minLength": 1 },
        "label": { "$ref": "#/definitions/text" },
        "order": { "type": "integer" },
        "collapsed": { "type": "boolean" },
        "fields": { "type": "array", "items": { "$ref": "#/definitions/groupField" } }
      }
    },
    "menuItem": {
      "type": "object",
      "required": ["id"],
      "properties": {
        "id": { "type": "string", "minLength": 1 },
        "label": { "$ref": "#/definitions/text" },
        "icon": { "type": "string" },
        "action": { "type": "string" },
        "shortcut": { "type": "string" },
        "disabled": { "type": "boolean" },
        "danger": { "type": "boolean" },
        "separator": { "type": "boolean" },
        "submenu": { "type": "array", "items": { "$ref": "#/definitions/menuItem" } }
      }
    },
    "trigger": {
      "type": "object",
      "required": ["event", "action"],
      "properties": {
        "event": { "type": "string", "minLength": 1 },
        "condition": {
          "type": "object",
          "required": ["property", "operator"],
          "properties": {
            "property": { "type": "string" },
            "operator": { "enum": ["equals", "notEquals", "includes", "notIncludes"] }
          }
        },
        "action": {
          "type": "object",
          "required": ["type", "event"],
          "properties": {
            "type": { "enum": ["emit"] },
            "event": { "type": "string", "minLength": 1 },
            "payload": { "type": "object" }
          }
        }
      }
    },
    "node": {
      "type": "object",
      "required": ["id", "extends", "name"],
      "properties": {
        "id": { "type": "string", "pattern": "^[A-Za-z][A-Za-z0-9_.:-]*$" },
        "extends": { "enum": archetypes },
        "name": { "$ref": "#/definitions/text" },
        "description": { "$ref": "#/definitions/text" },
        "category": { "type": "string" },
        "icon": { "type": "string" },
        "visualConfig": { "type": "object" },
        "properties": { "type": "array", "items": { "$ref": "#/definitions/property" } },
        "propertyGroups": { "type": "array", "items": { "$ref": "#/definitions/propertyGroup" } },
        "defaultProperties": { "type": "object" },
        "connectionRules": { "type": "object" },
        "contextMenuItems": { "type": "array", "items": { "$ref": "#/definitions/menuItem" } },
        "disableDefaultContextMenu": { "type": "array", "items": { "type": "string" } },
        "eventTriggers": { "type": "array", "items": { "$ref": "#/definitions/trigger" } },
        "hooks": {
          "type": "object",
          "properties": {
            "onCreated": { "type": "string" },
            "onUpdated": { "type": "string" },
            "onDeleted": { "type": "string" },
            "onPropertyChanged": { "type": "string" }
          },
          "additionalProperties": false
        },
        "collapsible": { "type": "boolean" },
        "collapsed": { "type": "boolean" },
        "editable": { "type": "boolean" },
        "deletable": { "type": "boolean" },
        "connectable": { "type": "boolean" },
        "draggable": { "type": "boolean" }
      }
    },
    "category": {
      "type": "object",
      "required": ["id", "name"],
      "properties": {
        "id": { "type": "string", "minLength": 1 },
        "name": { "$ref": "#/definitions/text" },
        "description": { "$ref": "#/definitions/text" },
        "order": { "type": "integer" }
      }
    }
  })
}

/// Schema of a single node document.
pub fn node_schema() -> Value {
  json!({
    "allOf": [{ "$ref": "#/definitions/node" }],
    "definitions": definitions(),
  })
}

/// Schema of a plugin document: metadata plus nodes and categories.
pub fn plugin_schema() -> Value {
  json!({
    "type": "object",
    "required": ["metadata"],
    "properties": {
      "metadata": {
        "type": "object",
        "required": ["id", "name", "version"],
        "properties": {
          "id": { "type": "string", "minLength": 1 },
          "name": { "type": "string" },
          "version": { "type": "string" },
          "description": { "type": "string" },
          "author": { "type": "string" },
          "dependencies": { "type": "array", "items": { "type": "string" } }
        }
      },
      "nodes": { "type": "array", "items": { "$ref": "#/definitions/node" } },
      "categories": { "type": "array", "items": { "$ref": "#/definitions/category" } }
    },
    "definitions": definitions(),
  })
}

fn display_path(pointer: &str) -> String {
  let trimmed = pointer.trim_start_matches('/');
  if trimmed.is_empty() {
    "root".to_string()
  } else {
    trimmed.replace('/', ".")
  }
}

/// Compiled JSON schema that parses matching documents into `T`.
pub struct JsonSchemaValidator<T> {
  schema: JSONSchema,
  _target: PhantomData<fn() -> T>,
}

impl<T> JsonSchemaValidator<T> {
  pub fn new(schema: &Value) -> FlowdeckResult<Self> {
    let compiled = JSONSchema::compile(schema)
      .map_err(|e| FlowdeckError::Internal(format!("Invalid JSON schema: {}", e)))?;
    Ok(Self {
      schema: compiled,
      _target: PhantomData,
    })
  }

  /// Every schema violation in `input`, as `path: message` errors.
  pub fn check(&self, input: &Value) -> Vec<StructuredError> {
    match self.schema.validate(input) {
      Ok(()) => Vec::new(),
      Err(errors) => errors
        .map(|e| StructuredError::new(display_path(&e.instance_path.to_string()), e.to_string()))
        .collect(),
    }
  }
}

impl<T: DeserializeOwned> Validator<T> for JsonSchemaValidator<T> {
  fn parse(&self, input: &Value) -> Result<T, Vec<StructuredError>> {
    let errors = self.check(input);
    if !errors.is_empty() {
      return Err(errors);
    }
    serde_json::from_value(input.clone()).map_err(|e| vec![StructuredError::new("root", e.to_string())])
  }
}

impl<T> std::fmt::Debug for JsonSchemaValidator<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("JsonSchemaValidator")
      .field("target", &std::any::type_name::<T>())
      .finish()
  }
}
