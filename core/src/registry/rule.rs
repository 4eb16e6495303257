// flowdeck/src/registry/rule.rs

//! Connection rules between node types.
//!
//! The highest-priority matching rule decides; on equal priority a deny rule
//! beats an allow rule. With no matching rule the connection is allowed.

use super::item::RegistryItem;
use super::store::Registry;
use crate::events::EventBus;
use serde::{Deserialize, Serialize};
use std::ops::Deref;
use std::sync::Arc;

pub const RULE_NAMESPACE: &str = "rules";

/// Matches any node or edge type.
pub const WILDCARD: &str = "*";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum RuleEffect {
  #[default]
  Allow,
  Deny,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleConfig {
  pub id: String,
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(default)]
  pub effect: RuleEffect,
  pub source_types: Vec<String>,
  pub target_types: Vec<String>,
  /// Empty means any edge type.
  #[serde(default)]
  pub edge_types: Vec<String>,
  #[serde(default)]
  pub priority: i32,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub message: Option<String>,
}

impl RuleConfig {
  pub fn new(id: impl Into<String>, effect: RuleEffect, source_types: Vec<String>, target_types: Vec<String>) -> Self {
    let id = id.into();
    Self {
      name: id.clone(),
      id,
      description: None,
      effect,
      source_types,
      target_types,
      edge_types: Vec::new(),
      priority: 0,
      message: None,
    }
  }

  fn type_matches(types: &[String], candidate: &str) -> bool {
    types.iter().any(|t| t == WILDCARD || t == candidate)
  }

  pub fn matches(&self, source_type: &str, target_type: &str, edge_type: Option<&str>) -> bool {
    let edge_ok = match edge_type {
      Some(edge) if !self.edge_types.is_empty() => Self::type_matches(&self.edge_types, edge),
      _ => true,
    };
    edge_ok && Self::type_matches(&self.source_types, source_type) && Self::type_matches(&self.target_types, target_type)
  }

  pub fn involves(&self, node_type: &str) -> bool {
    Self::type_matches(&self.source_types, node_type) || Self::type_matches(&self.target_types, node_type)
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionVerdict {
  pub allowed: bool,
  /// The rule that decided, if any matched.
  pub rule_id: Option<String>,
  pub message: Option<String>,
}

pub struct RuleRegistry {
  store: Registry<RuleConfig>,
}

impl Deref for RuleRegistry {
  type Target = Registry<RuleConfig>;

  fn deref(&self) -> &Self::Target {
    &self.store
  }
}

impl RuleRegistry {
  pub fn new(bus: Arc<EventBus>) -> Self {
    Self {
      store: Registry::new(RULE_NAMESPACE, bus),
    }
  }

  pub fn register_rule(&self, rule: RuleConfig) {
    let item_type = match rule.effect {
      RuleEffect::Allow => "allow",
      RuleEffect::Deny => "deny",
    };
    let mut item = RegistryItem::new(rule.id.clone(), item_type, rule.name.clone(), rule.clone());
    item.description = rule.description.clone();
    self.store.register(item);
  }

  pub fn rules_for_node_type(&self, node_type: &str) -> Vec<RuleConfig> {
    self
      .store
      .get_all()
      .into_iter()
      .map(|item| item.config)
      .filter(|rule| rule.involves(node_type))
      .collect()
  }

  pub fn evaluate_connection(&self, source_type: &str, target_type: &str, edge_type: Option<&str>) -> ConnectionVerdict {
    let decisive = self
      .store
      .get_all()
      .into_iter()
      .map(|item| item.config)
      .filter(|rule| rule.matches(source_type, target_type, edge_type))
      .max_by(|a, b| {
        a.priority
          .cmp(&b.priority)
          .then_with(|| (a.effect == RuleEffect::Deny).cmp(&(b.effect == RuleEffect::Deny)))
      });

    match decisive {
      Some(rule) => ConnectionVerdict {
        allowed: rule.effect == RuleEffect::Allow,
        message: rule.message.clone(),
        rule_id: Some(rule.id),
      },
      None => ConnectionVerdict {
        allowed: true,
        rule_id: None,
        message: None,
      },
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn types(ts: &[&str]) -> Vec<String> {
    ts.iter().map(|t| t.to_string()).collect()
  }

  #[test]
  fn deny_wins_on_equal_priority() {
    let rules = RuleRegistry::new(Arc::new(EventBus::new()));
    rules.register_rule(RuleConfig::new("allow-all", RuleEffect::Allow, types(&["*"]), types(&["*"])));
    let mut deny = RuleConfig::new("no-end-source", RuleEffect::Deny, types(&["end"]), types(&["*"]));
    deny.message = Some("End events cannot have outgoing flows".to_string());
    rules.register_rule(deny);

    let verdict = rules.evaluate_connection("end", "task", None);
    assert!(!verdict.allowed);
    assert_eq!(verdict.rule_id.as_deref(), Some("no-end-source"));
    assert!(rules.evaluate_connection("task", "end", None).allowed);
  }

  #[test]
  fn higher_priority_allow_overrides_deny() {
    let rules = RuleRegistry::new(Arc::new(EventBus::new()));
    rules.register_rule(RuleConfig::new("deny", RuleEffect::Deny, types(&["gateway"]), types(&["*"])));
    let mut allow = RuleConfig::new("allow-task", RuleEffect::Allow, types(&["gateway"]), types(&["task"]));
    allow.priority = 10;
    rules.register_rule(allow);
    assert!(rules.evaluate_connection("gateway", "task", Some("sequence")).allowed);
    assert!(!rules.evaluate_connection("gateway", "end", None).allowed);
  }

  #[test]
  fn unmatched_connection_is_allowed() {
    let rules = RuleRegistry::new(Arc::new(EventBus::new()));
    let verdict = rules.evaluate_connection("a", "b", None);
    assert!(verdict.allowed);
    assert!(verdict.rule_id.is_none());
  }
}
