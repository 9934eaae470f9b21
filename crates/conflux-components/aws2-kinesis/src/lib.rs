//! # Conflux component: AWS Kinesis
//!
//! Consumes records from an Amazon Kinesis stream. The component is
//! registered at link time under the id `aws2-kinesis`, so depending on this
//! crate is enough for [`RegistryBuilder::with_linked_components`] to see it.
//!
//! ## Configuration
//!
//! ```toml
//! [components.aws2-kinesis]
//! stream-name = "orders"
//! iterator-type = "LATEST"
//! shard-closed = "silent"
//! amazon-kinesis-client = "#bean:kinesis"
//! ```
//!
//! ## Client
//!
//! The endpoint talks to Kinesis through a [`KinesisClient`] bean wrapping
//! any [`KinesisApi`] implementation. With autowiring enabled a single
//! registered client is used without naming it:
//!
//! ```rust,ignore
//! use conflux_aws2_kinesis::{KinesisClient, KinesisEndpoint};
//!
//! let beans = BeanRegistry::new().with("kinesis", KinesisClient::new(MyKinesis::new()));
//! let handle = registry.activate("aws2-kinesis", &raw, &beans).await?;
//! let endpoint = handle.downcast_ref::<KinesisEndpoint>().unwrap();
//! println!("consuming {:?}", endpoint.shards());
//! ```
//!
//! [`RegistryBuilder::with_linked_components`]: conflux_core::RegistryBuilder::with_linked_components

mod client;
mod endpoint;
mod error;
mod options;
mod settings;

use conflux_core::linkme::distributed_slice;
use conflux_core::{COMPONENTS, ComponentDescriptor, ComponentKind};

pub use client::{KINESIS_CLIENT_TYPE, KinesisApi, KinesisClient};
pub use endpoint::{KinesisEndpoint, KinesisFactory};
pub use error::{KinesisError, KinesisResult};
pub use options::options;
pub use settings::{
    Credentials, IteratorType, KinesisSettings, ProxyProtocol, ProxySettings, ShardClosedStrategy,
};

/// Component identifier.
pub const COMPONENT_ID: &str = "aws2-kinesis";

/// Link-time descriptor of the `aws2-kinesis` component.
#[distributed_slice(COMPONENTS)]
#[linkme(crate = conflux_core::linkme)]
pub static AWS2_KINESIS: ComponentDescriptor = ComponentDescriptor {
    id: COMPONENT_ID,
    kind: ComponentKind::Component,
    title: "AWS Kinesis",
    options,
    factory: KinesisFactory::boxed,
};
