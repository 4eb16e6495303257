// flowdeck/src/model/text.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const DEFAULT_LANGUAGE: &str = "en";

/// User-facing text: either a plain string or a language-code keyed map.
///
/// The map form is expected to carry an `"en"` entry; the JSON bridge rejects
/// documents where it is missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocalizedText {
  Plain(String),
  Localized(BTreeMap<String, String>),
}

impl LocalizedText {
  /// Text for `lang`, falling back to English and then to any available entry.
  pub fn resolve(&self, lang: &str) -> String {
    match self {
      LocalizedText::Plain(s) => s.clone(),
      LocalizedText::Localized(map) => map
        .get(lang)
        .or_else(|| map.get(DEFAULT_LANGUAGE))
        .or_else(|| map.values().next())
        .cloned()
        .unwrap_or_default(),
    }
  }

  pub fn is_empty(&self) -> bool {
    match self {
      LocalizedText::Plain(s) => s.is_empty(),
      LocalizedText::Localized(map) => map.values().all(String::is_empty),
    }
  }
}

impl Default for LocalizedText {
  fn default() -> Self {
    LocalizedText::Plain(String::new())
  }
}

impl fmt::Display for LocalizedText {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.resolve(DEFAULT_LANGUAGE))
  }
}

impl From<&str> for LocalizedText {
  fn from(s: &str) -> Self {
    LocalizedText::Plain(s.to_string())
  }
}

impl From<String> for LocalizedText {
  fn from(s: String) -> Self {
    LocalizedText::Plain(s)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn resolve_falls_back_to_english() {
    let mut map = BTreeMap::new();
    map.insert("en".to_string(), "Send email".to_string());
    map.insert("de".to_string(), "E-Mail senden".to_string());
    let text = LocalizedText::Localized(map);
    assert_eq!(text.resolve("de"), "E-Mail senden");
    assert_eq!(text.resolve("fr"), "Send email");
    assert_eq!(text.to_string(), "Send email");
  }

  #[test]
  fn deserializes_both_forms() {
    let plain: LocalizedText = serde_json::from_str("\"Task\"").unwrap();
    assert_eq!(plain, LocalizedText::from("Task"));
    let localized: LocalizedText = serde_json::from_str(r#"{"en":"Task","nl":"Taak"}"#).unwrap();
    assert_eq!(localized.resolve("nl"), "Taak");
  }
}
