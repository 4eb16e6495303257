// flowdeck/src/model/mod.rs

//! Data types shared by the registries, the inheritance engine and the property pipeline.

pub mod entity;
pub mod node;
pub mod text;

pub use entity::{EdgeEntity, Entity};
pub use node::{BaseNodeConfig, ConnectionRules, NodeMetadata, VisualConfig};
pub use text::LocalizedText;

/// JSON object type used for property, data and metadata maps.
pub type JsonMap = serde_json::Map<String, serde_json::Value>;

/// Shallow, right-biased merge of two JSON objects. Keys in `over` win.
pub fn merge_json_maps(base: &JsonMap, over: &JsonMap) -> JsonMap {
  let mut merged = base.clone();
  for (key, value) in over {
    merged.insert(key.clone(), value.clone());
  }
  merged
}
