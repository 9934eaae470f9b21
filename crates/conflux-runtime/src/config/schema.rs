//! Configuration schema definitions.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use conflux_core::{Binder, UnknownKeyPolicy};
use serde::{Deserialize, Serialize};

/// Root configuration structure.
///
/// ```toml
/// [logging]
/// level = "debug"
///
/// [binding]
/// unknown_keys = "strict"
/// activation_timeout_ms = 5000
///
/// [components.aws2-kinesis]
/// stream-name = "orders"
/// iterator-type = "LATEST"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfluxConfig {
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Binder and activation settings.
    #[serde(default)]
    pub binding: BindingConfig,

    /// Component sections, keyed by component id.
    #[serde(default)]
    pub components: BTreeMap<String, serde_json::Value>,
}

// =============================================================================
// Logging
// =============================================================================

/// Logging configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Global log level.
    #[serde(default)]
    pub level: LogLevel,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Output destination.
    #[serde(default)]
    pub output: LogOutput,

    /// Log file path, used when `output = "file"`.
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    /// Log file rotation, used when `output = "file"`.
    #[serde(default)]
    pub rotation: LogRotation,

    /// Per-target levels, e.g. `conflux_core = "debug"`.
    #[serde(default)]
    pub filters: BTreeMap<String, LogLevel>,

    /// Include thread ids.
    #[serde(default)]
    pub thread_ids: bool,

    /// Include source file and line.
    #[serde(default)]
    pub file_location: bool,
}

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Returns the level name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Converts to a `tracing` level.
    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Requires the `json-log` feature; falls back to `full` without it.
    Json,
}

/// Log output destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    File,
}

/// Log file rotation period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    #[default]
    Never,
    Hourly,
    Daily,
}

// =============================================================================
// Binding
// =============================================================================

/// Binder and activation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BindingConfig {
    /// Treatment of keys matching no option.
    #[serde(default)]
    pub unknown_keys: UnknownKeyPolicy,

    /// Fill autowired object options from the bean registry.
    #[serde(default = "default_autowire")]
    pub autowire: bool,

    /// Upper bound for a single component activation, in milliseconds.
    #[serde(default)]
    pub activation_timeout_ms: Option<u64>,
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            unknown_keys: UnknownKeyPolicy::default(),
            autowire: default_autowire(),
            activation_timeout_ms: None,
        }
    }
}

fn default_autowire() -> bool {
    true
}

impl BindingConfig {
    /// Builds the binder described by this section.
    pub fn binder(&self) -> Binder {
        Binder::new()
            .with_unknown_keys(self.unknown_keys)
            .with_autowire(self.autowire)
    }

    /// Activation timeout, if configured.
    pub fn activation_timeout(&self) -> Option<Duration> {
        self.activation_timeout_ms.map(Duration::from_millis)
    }
}
