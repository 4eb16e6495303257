// flowdeck/src/config/mod.rs

//! The JSON configuration bridge: node and plugin documents in, registrations out.

pub mod bridge;
pub mod document;
pub mod validator;

pub use bridge::{BatchRegistration, BridgeOptions, ConfigValidation, JsonConfigBridge, RegistrationFailure};
pub use document::{EventTrigger, NodeHooks, NodeJson, PluginDocument, PropertyGroupJson, TriggerAction, TriggerCondition};
pub use validator::JsonSchemaValidator;
