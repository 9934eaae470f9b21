//! # Conflux component: Spring RabbitMQ
//!
//! Publishes to and consumes from RabbitMQ exchanges. Registered at link
//! time under the id `spring-rabbitmq`.
//!
//! ```yaml
//! components:
//!   spring-rabbitmq:
//!     exchange-name: orders
//!     queues: [created, cancelled]
//!     auto-declare: true
//!     dead-letter-exchange: orders.dlx
//!     dead-letter-queue: orders.dlq
//! ```
//!
//! Broker access goes through a [`ConnectionFactory`] bean. On activation
//! the endpoint can test the connection (`testConnectionOnStartup`) and
//! declare the exchange, queues, bindings and dead letter topology
//! (`autoDeclare`).

mod connection;
mod endpoint;
mod error;
mod options;
mod settings;

use conflux_core::linkme::distributed_slice;
use conflux_core::{COMPONENTS, ComponentDescriptor, ComponentKind};

pub use connection::{AmqpConnector, CONNECTION_FACTORY_TYPE, ConnectionFactory};
pub use endpoint::{RabbitEndpoint, RabbitFactory};
pub use error::{RabbitError, RabbitResult};
pub use options::options;
pub use settings::{DeadLetter, ExchangeType, RabbitSettings, RetrySettings};

/// Component identifier.
pub const COMPONENT_ID: &str = "spring-rabbitmq";

#[distributed_slice(COMPONENTS)]
#[linkme(crate = conflux_core::linkme)]
pub static SPRING_RABBITMQ: ComponentDescriptor = ComponentDescriptor {
    id: COMPONENT_ID,
    kind: ComponentKind::Component,
    title: "Spring RabbitMQ",
    options,
    factory: RabbitFactory::boxed,
};
