// flowdeck/src/error.rs
use anyhow::Error as AnyhowError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlowdeckError {
  #[error("Config validation failed: {}", errors.join("; "))]
  ConfigValidation { errors: Vec<String> },

  #[error("Plugin '{plugin_id}' is already installed")]
  DuplicateInstall { plugin_id: String },

  #[error("Plugin '{plugin_id}' depends on '{dependency}', which is not installed")]
  MissingDependency { plugin_id: String, dependency: String },

  #[error("Plugin '{plugin_id}' is not installed")]
  NotInstalled { plugin_id: String },

  #[error("Plugin '{plugin_id}' is required by installed plugins: {}", dependents.join(", "))]
  DependentPluginsInstalled { plugin_id: String, dependents: Vec<String> },

  #[error("Lifecycle hook '{hook}' of plugin '{plugin_id}' failed. Source: {source}")]
  LifecycleHook {
    plugin_id: String,
    hook: &'static str,
    #[source]
    source: AnyhowError,
  },

  #[error("Unknown base node type: {base_type}")]
  UnknownBaseType { base_type: String },

  #[error("Failed to fetch '{url}'. Source: {source}")]
  Transport {
    url: String,
    #[source]
    source: AnyhowError,
  },

  #[error("Failed to parse JSON document: {0}")]
  Parse(#[from] serde_json::Error),

  #[error("Error in user-provided handler or external operation. Source: {source}")]
  HandlerError {
    #[source]
    source: AnyhowError,
  },

  #[error("Internal flowdeck error: {0}")]
  Internal(String),
}

impl FlowdeckError {
  /// Lifecycle errors are the ones the plugin manager raises for bad state transitions.
  pub fn is_lifecycle_error(&self) -> bool {
    matches!(
      self,
      FlowdeckError::DuplicateInstall { .. }
        | FlowdeckError::MissingDependency { .. }
        | FlowdeckError::NotInstalled { .. }
        | FlowdeckError::DependentPluginsInstalled { .. }
        | FlowdeckError::LifecycleHook { .. }
    )
  }
}

impl From<AnyhowError> for FlowdeckError {
  fn from(err: AnyhowError) -> Self {
    // Unwrap a FlowdeckError that travelled through anyhow instead of nesting it.
    match err.downcast::<FlowdeckError>() {
      Ok(inner) => inner,
      Err(err) => FlowdeckError::HandlerError { source: err },
    }
  }
}

pub type FlowdeckResult<T, E = FlowdeckError> = std::result::Result<T, E>;
