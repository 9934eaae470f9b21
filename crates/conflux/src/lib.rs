//! # Conflux
//!
//! Typed, declarative component configuration and property binding.
//!
//! ## Overview
//!
//! Conflux maps flat string configuration (files, environment variables,
//! programmatic overrides) onto strongly typed component options, then hands
//! the result to a per-component factory that produces a live endpoint.
//!
//! ```text
//! ┌──────────────┐   ┌──────────┐   ┌────────────────────┐   ┌─────────┐   ┌──────────┐
//! │ conflux.toml │──▶│ sections │──▶│ Binder (+ schema,  │──▶│ Factory │──▶│ Endpoint │
//! │ CONFLUX_*    │   │ raw keys │   │  object resolver)  │   │         │   │  handle  │
//! └──────────────┘   └──────────┘   └────────────────────┘   └─────────┘   └──────────┘
//! ```
//!
//! - **Schema**: ordered option descriptors of a component (kind, default, flags)
//! - **Binder**: key normalisation, coercion, defaults, object references
//! - **Registry**: component id → schema + factory, frozen after startup
//! - **Runtime**: loads configuration and activates every enabled component
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use conflux::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = ConfluxRuntime::builder()
//!         .bean("kinesis", KinesisClient::new(MyKinesis::default()))
//!         .build()?;
//!     runtime.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config` (default) / `yaml-config`: configuration file formats
//! - `json-log`: JSON log output
//! - `aws2-kinesis`, `spring-rabbitmq`, `google-calendar-stream`: built-in
//!   components, registered automatically when enabled
//! - `all-components`: every built-in component

pub use conflux_core as core;
pub use conflux_runtime as runtime;

#[cfg(feature = "aws2-kinesis")]
pub use conflux_aws2_kinesis as aws2_kinesis;
#[cfg(feature = "google-calendar-stream")]
pub use conflux_google_calendar_stream as google_calendar_stream;
#[cfg(feature = "spring-rabbitmq")]
pub use conflux_spring_rabbitmq as spring_rabbitmq;

pub use conflux_core::{
    BeanRegistry, Binder, BindError, BoundConfiguration, Catalog, ComponentError,
    ComponentFactory, ComponentKind, ComponentRegistry, ComponentSchema, Endpoint,
    EndpointHandle, FromBound, ObjectRef, OptionDescriptor, OptionKind, RawValues,
    SchemaError, UnknownKeyPolicy,
};
pub use conflux_runtime::{ConfigLoader, ConfluxConfig, ConfluxRuntime, RuntimeError};

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use conflux::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use conflux_runtime::{ConfluxRuntime, RuntimeBuilder};

    // Binding
    pub use conflux_core::prelude::*;

    // Built-in components
    #[cfg(feature = "aws2-kinesis")]
    pub use conflux_aws2_kinesis::{KinesisApi, KinesisClient, KinesisEndpoint};
    #[cfg(feature = "google-calendar-stream")]
    pub use conflux_google_calendar_stream::{
        CalendarApi, CalendarClientBuilder, CalendarStreamEndpoint, GoogleCalendarClientFactory,
    };
    #[cfg(feature = "spring-rabbitmq")]
    pub use conflux_spring_rabbitmq::{AmqpConnector, ConnectionFactory, RabbitEndpoint};

    // Logging
    pub use conflux_runtime::prelude::*;
}
