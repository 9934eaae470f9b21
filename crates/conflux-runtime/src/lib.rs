//! Conflux Runtime - configuration and lifecycle layer for Conflux components.
//!
//! This crate provides:
//! - Layered configuration loading with figment (`ConfigLoader`)
//! - Conversion of `components.<id>` sections into raw values for the binder
//! - Logging configuration (`LoggingBuilder`)
//! - Runtime orchestration (`ConfluxRuntime`): activation, shutdown, signals
//!
//! ```ignore
//! use conflux_runtime::ConfluxRuntime;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = ConfluxRuntime::builder().build()?;
//!     runtime.run().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;

// Re-exports
pub use config::{
    BindingConfig, ComponentSection, ConfigError, ConfigLoader, ConfigResult, ConfluxConfig,
    LoggingConfig, Profile,
};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::LoggingBuilder;
pub use runtime::{ConfluxRuntime, RuntimeBuilder, RuntimeStats};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Logging macros for applications built on the runtime.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
