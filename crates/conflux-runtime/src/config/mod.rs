//! Configuration module for the Conflux runtime.
//!
//! Layered loading (files, environment, overrides), validation, and the
//! conversion of `components.<id>` sections into raw values for the binder.

pub mod error;
pub mod loader;
pub mod schema;
pub mod section;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    BindingConfig, ConfluxConfig, LogFormat, LogLevel, LogOutput, LogRotation, LoggingConfig,
};
pub use section::{ComponentSection, ENABLED_KEY, component_sections};
pub use validation::validate_config;
