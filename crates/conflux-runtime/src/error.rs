//! Runtime error types.

use conflux_core::{ComponentError, SchemaError};
use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur during runtime operations.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Loading or validating the configuration failed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Registering, binding or activating a component failed.
    #[error(transparent)]
    Component(#[from] ComponentError),

    /// `start` was called on a running runtime.
    #[error("Runtime is already running")]
    AlreadyRunning,

    /// Installing a signal handler failed.
    #[error("Failed to listen for shutdown signals: {0}")]
    Signal(#[from] std::io::Error),
}

impl From<SchemaError> for RuntimeError {
    fn from(error: SchemaError) -> Self {
        Self::Component(ComponentError::Schema(error))
    }
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
