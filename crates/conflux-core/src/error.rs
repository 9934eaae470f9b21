//! Unified error types for the Conflux core.
//!
//! Errors are split by the stage that produces them:
//! - [`SchemaError`]: schema construction, registration and lookup
//! - [`BindError`]: turning raw values into a [`BoundConfiguration`]
//! - [`ComponentError`]: the full activation pipeline
//!
//! [`BoundConfiguration`]: crate::BoundConfiguration

use std::time::Duration;

use thiserror::Error;

use crate::option::OptionKind;

/// Boxed error type returned by external collaborators (factories, endpoints).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Placeholder shown instead of values supplied for secret options.
pub const REDACTED: &str = "******";

// =============================================================================
// Schema Errors
// =============================================================================

/// Errors raised while building, registering or looking up component schemas.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaError {
    /// A component with the same identifier is already registered.
    #[error("component '{0}' is already registered")]
    DuplicateComponent(String),

    /// No component is registered under this identifier.
    #[error("unknown component '{0}'")]
    UnknownComponent(String),

    /// Two descriptors of one schema share the same (normalized) name.
    #[error("component '{component}' declares option '{option}' more than once")]
    DuplicateOption {
        /// Component identifier.
        component: String,
        /// Option name as declared by the second descriptor.
        option: String,
    },

    /// A declared default does not coerce to the option kind.
    #[error("component '{component}': default '{value}' of option '{option}' is invalid: {reason}")]
    InvalidDefault {
        /// Component identifier.
        component: String,
        /// Option name.
        option: String,
        /// The offending default.
        value: String,
        /// Why the default was rejected.
        reason: String,
    },

    /// A serialized schema could not be parsed.
    #[error("invalid schema document: {0}")]
    InvalidSchema(String),
}

impl From<serde_json::Error> for SchemaError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidSchema(err.to_string())
    }
}

// =============================================================================
// Bind Errors
// =============================================================================

/// Errors raised by the binder.
///
/// Binding is all-or-nothing: the first error aborts and no partial
/// configuration is returned.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BindError {
    /// A required option has neither a supplied value nor a default.
    #[error("component '{component}': missing required option '{option}'")]
    MissingRequiredOption {
        /// Component identifier.
        component: String,
        /// Option name.
        option: String,
    },

    /// A supplied value could not be converted to the option kind.
    #[error("component '{component}': cannot convert '{value}' for option '{option}' to {expected}")]
    TypeCoercion {
        /// Component identifier.
        component: String,
        /// Option name.
        option: String,
        /// Supplied value (redacted for secret options).
        value: String,
        /// Expected kind.
        expected: OptionKind,
    },

    /// A supplied value is not one of the allowed enum constants.
    #[error("component '{component}': '{value}' is not a valid value for option '{option}' (allowed: {})", allowed.join(", "))]
    InvalidEnumValue {
        /// Component identifier.
        component: String,
        /// Option name.
        option: String,
        /// Supplied value.
        value: String,
        /// Allowed constants.
        allowed: Vec<String>,
    },

    /// A raw key does not match any option (strict mode only).
    #[error("component '{component}': unknown option '{key}'")]
    UnknownOption {
        /// Component identifier.
        component: String,
        /// Raw key as supplied.
        key: String,
    },

    /// An object reference names a bean the resolver does not know.
    #[error("component '{component}': option '{option}' references unknown object '{name}'")]
    UnresolvedReference {
        /// Component identifier.
        component: String,
        /// Option name.
        option: String,
        /// Referenced bean name.
        name: String,
    },

    /// Several raw keys spell the same option.
    #[error("component '{component}': option '{option}' is set by several keys ({})", keys.join(", "))]
    ConflictingKeys {
        /// Component identifier.
        component: String,
        /// Option name.
        option: String,
        /// The conflicting raw keys, sorted.
        keys: Vec<String>,
    },
}

impl BindError {
    /// Returns the component identifier carried by this error.
    pub fn component(&self) -> &str {
        match self {
            Self::MissingRequiredOption { component, .. }
            | Self::TypeCoercion { component, .. }
            | Self::InvalidEnumValue { component, .. }
            | Self::UnknownOption { component, .. }
            | Self::UnresolvedReference { component, .. }
            | Self::ConflictingKeys { component, .. } => component,
        }
    }
}

// =============================================================================
// Activation Errors
// =============================================================================

/// Source error used when a factory does not finish within the activation timeout.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("activation timed out after {0:?}")]
pub struct ActivationTimeout(pub Duration);

/// Errors returned by [`ComponentRegistry::activate`](crate::ComponentRegistry::activate).
///
/// Schema and binding errors are forwarded unchanged so callers can still
/// match on the original kind.
#[derive(Debug, Error)]
pub enum ComponentError {
    /// Schema lookup failed.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Binding failed.
    #[error(transparent)]
    Bind(#[from] BindError),

    /// The component factory failed or timed out.
    #[error("failed to activate component '{component}': {source}")]
    Activation {
        /// Component identifier.
        component: String,
        /// Original cause reported by the factory.
        #[source]
        source: BoxError,
    },
}

impl ComponentError {
    /// Creates an activation error wrapping the given cause.
    pub fn activation(component: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Activation {
            component: component.into(),
            source: source.into(),
        }
    }

    /// Returns `true` if this is an activation timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Activation { source, .. } if source.is::<ActivationTimeout>())
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Result type for binding.
pub type BindResult<T> = Result<T, BindError>;

/// Result type for activation.
pub type ComponentResult<T> = Result<T, ComponentError>;
