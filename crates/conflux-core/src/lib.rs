//! # Conflux Core
//!
//! Typed component configuration: every component declares a schema of
//! options, raw string properties are bound against that schema, and the
//! resulting [`BoundConfiguration`] is handed to the component's factory.
//!
//! ## Building blocks
//!
//! - **Schemas**: [`OptionDescriptor`], [`OptionKind`], [`ComponentSchema`]
//! - **Binding**: [`Binder`], [`RawValues`], [`BoundConfiguration`], [`FromBound`]
//! - **Objects**: [`ObjectResolver`], [`BeanRegistry`], [`ObjectRef`]
//! - **Dispatch**: [`ComponentRegistry`], [`ComponentFactory`], [`Endpoint`], [`EndpointHandle`]
//! - **Discovery**: [`ComponentDescriptor`] and the [`COMPONENTS`] link-time slice
//! - **Catalog**: [`Catalog`] JSON export and import
//!
//! ## Flow
//!
//! ```text
//! raw properties ──▶ Binder ──▶ BoundConfiguration ──▶ ComponentFactory ──▶ EndpointHandle
//!                      ▲
//!               ComponentSchema (from ComponentRegistry)
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use conflux_core::prelude::*;
//!
//! let registry = ComponentRegistry::builder()
//!     .register_options(
//!         "aws2-kinesis",
//!         [
//!             OptionDescriptor::string("shardId"),
//!             OptionDescriptor::enumeration("iteratorType", ["TRIM_HORIZON", "LATEST"])
//!                 .with_default("TRIM_HORIZON"),
//!         ],
//!         kinesis_factory(),
//!     )?
//!     .build();
//!
//! let raw = raw_values([("shard-id", "shard-0001")]);
//! let handle = registry.activate("aws2-kinesis", &raw, &NoObjects).await?;
//! ```

pub mod binder;
pub mod bound;
pub mod catalog;
pub mod descriptor;
pub mod endpoint;
pub mod error;
pub mod key;
pub mod option;
pub mod registry;
pub mod resolver;
pub mod schema;

pub use binder::{Binder, RawValue, RawValues, UnknownKeyPolicy, raw_values};
pub use bound::{BoundConfiguration, FromBound, missing};
pub use catalog::Catalog;
pub use descriptor::{COMPONENTS, ComponentDescriptor, linked_components};
pub use endpoint::{
    BoxedFactory, ComponentFactory, Endpoint, EndpointHandle, FactoryResult, factory_fn,
};
pub use error::{
    ActivationTimeout, BindError, BindResult, BoxError, ComponentError, ComponentResult,
    REDACTED, SchemaError, SchemaResult,
};
pub use key::{keys_match, normalize_key};
pub use option::{OptionDescriptor, OptionKind, OptionValue};
pub use registry::{ComponentRegistry, RegistryBuilder};
pub use resolver::{BeanRegistry, NoObjects, ObjectRef, ObjectResolver, bean_name};
pub use schema::{ComponentKind, ComponentSchema, SchemaBuilder};

// Used by component crates to contribute descriptors.
pub use async_trait::async_trait;
pub use linkme;

/// Prelude for common imports.
pub mod prelude {
    pub use super::{
        BeanRegistry, Binder, BoundConfiguration, ComponentError, ComponentFactory,
        ComponentKind, ComponentRegistry, ComponentSchema, Endpoint, EndpointHandle, FromBound,
        NoObjects, ObjectRef, ObjectResolver, OptionDescriptor, OptionKind, OptionValue,
        RawValue, RawValues, UnknownKeyPolicy, factory_fn, raw_values,
    };
}
