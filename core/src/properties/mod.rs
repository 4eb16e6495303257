// flowdeck/src/properties/mod.rs

//! Property schemas for nodes and edges: declarative groups/fields, the
//! per-type configuration registry, value validation and the sync engine.

pub mod definition;
pub mod registry;
pub mod sync;
pub mod validation;

pub use definition::{
  ConditionOperator, ConditionRule, FieldCondition, FieldType, PropertyFieldDefinition, PropertyGroupDefinition,
  SelectOption,
};
pub use registry::{PropertyConfigRegistry, DEFAULT_CUSTOM_GROUP};
pub use sync::{PropertyUpdate, SyncResult, ValidateOptions};
pub use validation::{
  EntityValidationResult, FieldSchema, FieldValidationResult, StructuredError, ValidationError, ValidationWarning,
  Validator,
};
