// flowdeck/src/inheritance/archetype.rs

//! The eight built-in node archetypes and their canonical definitions.

use crate::error::FlowdeckError;
use crate::model::{ConnectionRules, JsonMap, VisualConfig};
use crate::properties::{FieldType, PropertyFieldDefinition, SelectOption};
use crate::registry::context_menu::ContextMenuItem;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaseNodeType {
  Start,
  End,
  Task,
  Gateway,
  Event,
  Annotation,
  Pool,
  Note,
}

impl BaseNodeType {
  pub const ALL: [BaseNodeType; 8] = [
    BaseNodeType::Start,
    BaseNodeType::End,
    BaseNodeType::Task,
    BaseNodeType::Gateway,
    BaseNodeType::Event,
    BaseNodeType::Annotation,
    BaseNodeType::Pool,
    BaseNodeType::Note,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      BaseNodeType::Start => "start",
      BaseNodeType::End => "end",
      BaseNodeType::Task => "task",
      BaseNodeType::Gateway => "gateway",
      BaseNodeType::Event => "event",
      BaseNodeType::Annotation => "annotation",
      BaseNodeType::Pool => "pool",
      BaseNodeType::Note => "note",
    }
  }

  /// Human readable name, used as the default node title.
  pub fn title(&self) -> &'static str {
    match self {
      BaseNodeType::Start => "Start",
      BaseNodeType::End => "End",
      BaseNodeType::Task => "Task",
      BaseNodeType::Gateway => "Gateway",
      BaseNodeType::Event => "Event",
      BaseNodeType::Annotation => "Annotation",
      BaseNodeType::Pool => "Pool",
      BaseNodeType::Note => "Note",
    }
  }
}

impl fmt::Display for BaseNodeType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for BaseNodeType {
  type Err = FlowdeckError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    BaseNodeType::ALL
      .into_iter()
      .find(|t| t.as_str() == s)
      .ok_or_else(|| FlowdeckError::UnknownBaseType {
        base_type: s.to_string(),
      })
  }
}

/// Canonical definition of an archetype. Every node type extends one of these.
#[derive(Debug, Clone)]
pub struct BaseNodeDefinition {
  pub node_type: BaseNodeType,
  pub category: String,
  pub default_properties: JsonMap,
  pub visual_config: Option<VisualConfig>,
  pub connection_rules: ConnectionRules,
  pub property_definitions: Vec<PropertyFieldDefinition>,
  pub context_menu_items: Vec<ContextMenuItem>,
}

fn object(value: Value) -> JsonMap {
  match value {
    Value::Object(map) => map,
    _ => JsonMap::new(),
  }
}

/// `label` and `description`, declared by every archetype.
fn common_definitions() -> Vec<PropertyFieldDefinition> {
  vec![
    PropertyFieldDefinition::new("label", "Label", FieldType::Text)
      .with_order(1)
      .with_group("basic")
      .required(true),
    PropertyFieldDefinition::new("description", "Description", FieldType::Textarea)
      .with_order(2)
      .with_group("basic"),
  ]
}

fn select(id: &str, label: &str, order: i32, values: &[&str], default: &str) -> PropertyFieldDefinition {
  let mut field = PropertyFieldDefinition::new(id, label, FieldType::Select)
    .with_order(order)
    .with_group("basic")
    .with_default(Value::String(default.to_string()));
  field.options = values
    .iter()
    .map(|v| SelectOption {
      label: (*v).into(),
      value: Value::String(v.to_string()),
    })
    .collect();
  field
}

fn visual(shape: &str, color: &str, width: u32, height: u32) -> Option<VisualConfig> {
  Some(object(json!({
    "shape": shape,
    "color": color,
    "width": width,
    "height": height,
  })))
}

/// Looks up the canonical definition for `node_type`.
pub fn base_definition(node_type: BaseNodeType) -> BaseNodeDefinition {
  let mut property_definitions = common_definitions();
  let (category, default_properties, visual_config, connection_rules) = match node_type {
    BaseNodeType::Start => (
      "events",
      json!({"label": "Start", "description": "Process start"}),
      visual("circle", "#4caf50", 40, 40),
      ConnectionRules {
        can_be_source: Some(true),
        can_be_target: Some(false),
        max_incoming: Some(0),
        ..Default::default()
      },
    ),
    BaseNodeType::End => (
      "events",
      json!({"label": "End", "description": "Process end"}),
      visual("circle", "#f44336", 40, 40),
      ConnectionRules {
        can_be_source: Some(false),
        can_be_target: Some(true),
        max_outgoing: Some(0),
        ..Default::default()
      },
    ),
    BaseNodeType::Task => {
      property_definitions.push(select("priority", "Priority", 3, &["low", "medium", "high"], "medium"));
      (
        "activities",
        json!({"label": "Task", "description": "Generic task", "priority": "medium"}),
        visual("rectangle", "#2196f3", 160, 80),
        ConnectionRules {
          can_be_source: Some(true),
          can_be_target: Some(true),
          ..Default::default()
        },
      )
    }
    BaseNodeType::Gateway => {
      property_definitions.push(select(
        "gatewayType",
        "Gateway type",
        3,
        &["exclusive", "parallel", "inclusive"],
        "exclusive",
      ));
      (
        "gateways",
        json!({"label": "Gateway", "description": "Decision point", "gatewayType": "exclusive"}),
        visual("diamond", "#ff9800", 60, 60),
        ConnectionRules {
          can_be_source: Some(true),
          can_be_target: Some(true),
          ..Default::default()
        },
      )
    }
    BaseNodeType::Event => {
      property_definitions.push(select(
        "eventType",
        "Event type",
        3,
        &["intermediate", "timer", "message", "signal"],
        "intermediate",
      ));
      (
        "events",
        json!({"label": "Event", "description": "Intermediate event", "eventType": "intermediate"}),
        visual("circle", "#9c27b0", 40, 40),
        ConnectionRules {
          can_be_source: Some(true),
          can_be_target: Some(true),
          ..Default::default()
        },
      )
    }
    BaseNodeType::Annotation => (
      "artifacts",
      json!({"label": "Annotation", "description": ""}),
      visual("bracket", "#757575", 120, 60),
      ConnectionRules {
        can_be_source: Some(false),
        can_be_target: Some(false),
        max_incoming: Some(0),
        max_outgoing: Some(0),
        ..Default::default()
      },
    ),
    BaseNodeType::Pool => {
      property_definitions
        .push(PropertyFieldDefinition::new("participant", "Participant", FieldType::Text).with_order(3));
      (
        "swimlanes",
        json!({"label": "Pool", "description": "", "participant": "", "lanes": []}),
        visual("pool", "#e0e0e0", 600, 200),
        ConnectionRules {
          can_be_source: Some(false),
          can_be_target: Some(false),
          ..Default::default()
        },
      )
    }
    BaseNodeType::Note => {
      property_definitions.push(
        PropertyFieldDefinition::new("color", "Color", FieldType::Color)
          .with_order(3)
          .with_default(Value::String("#fff59d".to_string())),
      );
      (
        "artifacts",
        json!({"label": "Note", "description": "", "color": "#fff59d"}),
        visual("note", "#fff59d", 160, 120),
        ConnectionRules {
          can_be_source: Some(false),
          can_be_target: Some(false),
          ..Default::default()
        },
      )
    }
  };

  BaseNodeDefinition {
    node_type,
    category: category.to_string(),
    default_properties: object(default_properties),
    visual_config,
    connection_rules,
    property_definitions,
    context_menu_items: Vec::new(),
  }
}
