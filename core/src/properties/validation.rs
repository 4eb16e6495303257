// flowdeck/src/properties/validation.rs

//! Field-level value validation.
//!
//! Validation never fails with an error: every problem is collected into a
//! `FieldValidationResult` so the property panel can show all of them at once.

use once_cell::sync::OnceCell;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// One structured problem reported by a [`Validator`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredError {
  /// JSON-pointer-like location inside the validated input (empty for the root).
  pub path: String,
  pub message: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub code: Option<String>,
}

impl StructuredError {
  pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
    Self {
      path: path.into(),
      message: message.into(),
      code: None,
    }
  }

  pub fn with_code(mut self, code: &str) -> Self {
    self.code = Some(code.to_string());
    self
  }
}

impl std::fmt::Display for StructuredError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    if self.path.is_empty() {
      write!(f, "{}", self.message)
    } else {
      write!(f, "{}: {}", self.path, self.message)
    }
  }
}

/// Parses untrusted input into `T`, reporting every structural problem found.
pub trait Validator<T>: Send + Sync {
  fn parse(&self, input: &Value) -> Result<T, Vec<StructuredError>>;
}

/// Shared handle to a user-supplied value validator.
#[derive(Clone)]
pub struct CustomValidator(pub Arc<dyn Validator<Value>>);

impl std::fmt::Debug for CustomValidator {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str("CustomValidator(<dyn Validator>)")
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
  pub field: String,
  pub message: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationWarning {
  pub field: String,
  pub message: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FieldValidationResult {
  pub valid: bool,
  pub errors: Vec<ValidationError>,
  pub warnings: Vec<ValidationWarning>,
}

impl FieldValidationResult {
  pub fn ok() -> Self {
    Self {
      valid: true,
      ..Default::default()
    }
  }

  pub(crate) fn push_error(&mut self, field: &str, message: impl Into<String>, code: Option<String>) {
    self.valid = false;
    self.errors.push(ValidationError {
      field: field.to_string(),
      message: message.into(),
      code,
    });
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityValidationResult {
  pub valid: bool,
  pub errors: Vec<ValidationError>,
  pub warnings: Vec<ValidationWarning>,
  pub field_results: BTreeMap<String, FieldValidationResult>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueKind {
  String,
  Number,
  Integer,
  Boolean,
  Array,
  Object,
}

impl ValueKind {
  fn matches(&self, value: &Value) -> bool {
    match self {
      ValueKind::String => value.is_string(),
      ValueKind::Number => value.is_number(),
      ValueKind::Integer => value.is_i64() || value.is_u64(),
      ValueKind::Boolean => value.is_boolean(),
      ValueKind::Array => value.is_array(),
      ValueKind::Object => value.is_object(),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StringFormat {
  Email,
  Url,
}

/// Declarative schema attached to a property field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSchema {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub kind: Option<ValueKind>,
  #[serde(default)]
  pub required: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub min: Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub max: Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub min_length: Option<usize>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub max_length: Option<usize>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub pattern: Option<String>,
  #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
  pub allowed: Option<Vec<Value>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub format: Option<StringFormat>,
  /// Lengths above this produce a warning, not an error.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub warn_length: Option<usize>,
  /// Replaces the generated message of every error.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub message: Option<String>,
  #[serde(skip)]
  pub custom: Option<CustomValidator>,
  /// `pattern` compiled on first use, keyed by the source it was built from.
  #[serde(skip)]
  pattern_cache: OnceCell<(String, Result<Regex, String>)>,
}

fn is_empty_value(value: Option<&Value>) -> bool {
  match value {
    None | Some(Value::Null) => true,
    Some(Value::String(s)) => s.trim().is_empty(),
    Some(Value::Array(a)) => a.is_empty(),
    _ => false,
  }
}

fn value_length(value: &Value) -> Option<usize> {
  match value {
    Value::String(s) => Some(s.chars().count()),
    Value::Array(a) => Some(a.len()),
    _ => None,
  }
}

impl FieldSchema {
  pub fn required() -> Self {
    Self {
      required: true,
      ..Default::default()
    }
  }

  pub fn with_kind(mut self, kind: ValueKind) -> Self {
    self.kind = Some(kind);
    self
  }

  pub fn with_length(mut self, min: Option<usize>, max: Option<usize>) -> Self {
    self.min_length = min;
    self.max_length = max;
    self
  }

  pub fn with_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
    self.min = min;
    self.max = max;
    self
  }

  pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
    self.pattern = Some(pattern.into());
    self.pattern_cache = OnceCell::new();
    self
  }

  fn check_pattern(&self, pattern: &str, s: &str) -> Option<StructuredError> {
    let compile = || Regex::new(pattern).map_err(|e| e.to_string());
    let cached = self.pattern_cache.get_or_init(|| (pattern.to_string(), compile()));
    let fresh;
    let compiled = if cached.0 == pattern {
      &cached.1
    } else {
      fresh = compile();
      &fresh
    };
    match compiled {
      Ok(re) if re.is_match(s) => None,
      Ok(_) => Some(StructuredError::new("", format!("does not match pattern {}", pattern)).with_code("pattern")),
      Err(e) => Some(StructuredError::new("", format!("invalid pattern {}: {}", pattern, e)).with_code("pattern")),
    }
  }

  pub fn with_format(mut self, format: StringFormat) -> Self {
    self.format = Some(format);
    self
  }

  pub fn with_custom(mut self, validator: impl Validator<Value> + 'static) -> Self {
    self.custom = Some(CustomValidator(Arc::new(validator)));
    self
  }

  /// Checks `value` (absent when the entity has no value for the field).
  pub fn validate_value(&self, field: &str, value: Option<&Value>) -> FieldValidationResult {
    let mut result = FieldValidationResult::ok();

    if is_empty_value(value) {
      if self.required {
        let message = self.message.clone().unwrap_or_else(|| format!("{} is required", field));
        result.push_error(field, message, Some("required".to_string()));
      }
      return result;
    }

    // Non-empty past this point.
    let Some(value) = value else {
      return result;
    };

    let violations = match self.parse(value) {
      Ok(_) => Vec::new(),
      Err(errors) => errors,
    };
    for violation in violations {
      let message = self.message.clone().unwrap_or(violation.message);
      result.push_error(field, message, violation.code);
    }

    if let (Some(limit), Some(len)) = (self.warn_length, value_length(value)) {
      if len > limit {
        result.warnings.push(ValidationWarning {
          field: field.to_string(),
          message: format!("{} is longer than the recommended {} characters", field, limit),
          code: Some("length".to_string()),
        });
      }
    }
    result
  }
}

impl Validator<Value> for FieldSchema {
  fn parse(&self, input: &Value) -> Result<Value, Vec<StructuredError>> {
    let mut errors = Vec::new();

    if let Some(kind) = self.kind {
      if !kind.matches(input) {
        errors.push(StructuredError::new("", format!("expected a value of kind {:?}", kind)).with_code("type"));
        // Remaining checks assume the declared kind.
        return Err(errors);
      }
    }

    if let Some(n) = input.as_f64() {
      if let Some(min) = self.min {
        if n < min {
          errors.push(StructuredError::new("", format!("must be at least {}", min)).with_code("min"));
        }
      }
      if let Some(max) = self.max {
        if n > max {
          errors.push(StructuredError::new("", format!("must be at most {}", max)).with_code("max"));
        }
      }
    }

    if let Some(len) = value_length(input) {
      if let Some(min) = self.min_length {
        if len < min {
          errors.push(StructuredError::new("", format!("must have at least {} characters", min)).with_code("minLength"));
        }
      }
      if let Some(max) = self.max_length {
        if len > max {
          errors.push(StructuredError::new("", format!("must have at most {} characters", max)).with_code("maxLength"));
        }
      }
    }

    if let (Some(pattern), Some(s)) = (&self.pattern, input.as_str()) {
      errors.extend(self.check_pattern(pattern, s));
    }

    if let (Some(format), Some(s)) = (self.format, input.as_str()) {
      let ok = match format {
        StringFormat::Email => {
          let mut parts = s.splitn(2, '@');
          let local = parts.next().unwrap_or_default();
          let domain = parts.next().unwrap_or_default();
          !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.') && !s.contains(' ')
        }
        StringFormat::Url => (s.starts_with("http://") || s.starts_with("https://")) && s.len() > "https://".len(),
      };
      if !ok {
        errors.push(StructuredError::new("", format!("is not a valid {:?}", format).to_lowercase()).with_code("format"));
      }
    }

    if let Some(allowed) = &self.allowed {
      if !allowed.contains(input) {
        errors.push(StructuredError::new("", "is not one of the allowed values").with_code("enum"));
      }
    }

    if let Some(custom) = &self.custom {
      if let Err(mut custom_errors) = custom.0.parse(input) {
        errors.append(&mut custom_errors);
      }
    }

    if errors.is_empty() {
      Ok(input.clone())
    } else {
      Err(errors)
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn absent_optional_value_is_valid() {
    let schema = FieldSchema::default().with_length(Some(3), None);
    assert!(schema.validate_value("subject", None).valid);
  }

  #[test]
  fn required_reports_code() {
    let result = FieldSchema::required().validate_value("to", Some(&json!("  ")));
    assert!(!result.valid);
    assert_eq!(result.errors[0].code.as_deref(), Some("required"));
  }

  #[test]
  fn collects_every_violation() {
    let schema = FieldSchema::default().with_length(Some(10), None).with_pattern("^[0-9]+$");
    let result = schema.validate_value("code", Some(&json!("abc")));
    assert_eq!(result.errors.len(), 2);
  }

  #[test]
  fn pattern_is_compiled_once_and_follows_edits() {
    let mut schema = FieldSchema::default().with_pattern("^[0-9]+$");
    assert!(schema.pattern_cache.get().is_none());
    assert!(schema.validate_value("zip", Some(&json!("1234"))).valid);
    assert!(!schema.validate_value("zip", Some(&json!("12a4"))).valid);
    assert_eq!(schema.pattern_cache.get().map(|(src, _)| src.as_str()), Some("^[0-9]+$"));

    schema.pattern = Some("^[a-z]+$".to_string());
    assert!(schema.validate_value("zip", Some(&json!("abc"))).valid);

    let broken = FieldSchema::default().with_pattern("(");
    let result = broken.validate_value("zip", Some(&json!("x")));
    assert_eq!(result.errors[0].code.as_deref(), Some("pattern"));
    assert!(!broken.validate_value("zip", Some(&json!("y"))).valid);
  }

  #[test]
  fn email_format() {
    let schema = FieldSchema::default().with_format(StringFormat::Email);
    assert!(schema.validate_value("to", Some(&json!("bob@example.com"))).valid);
    assert!(!schema.validate_value("to", Some(&json!("bob@example"))).valid);
  }

  #[test]
  fn warn_length_is_not_an_error() {
    let schema = FieldSchema {
      warn_length: Some(5),
      ..Default::default()
    };
    let result = schema.validate_value("body", Some(&json!("far too long")));
    assert!(result.valid);
    assert_eq!(result.warnings.len(), 1);
  }
}
