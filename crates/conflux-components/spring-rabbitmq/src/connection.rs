//! Broker connection seam.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use conflux_core::BoxError;

use crate::settings::ExchangeType;

/// Type name declared by the `connectionFactory` option.
pub const CONNECTION_FACTORY_TYPE: &str = "ConnectionFactory";

/// Broker operations the endpoint needs at startup.
#[async_trait]
pub trait AmqpConnector: Send + Sync {
    /// Opens and closes a connection.
    async fn check_connection(&self) -> Result<(), BoxError>;

    /// Declares a durable exchange.
    async fn declare_exchange(&self, name: &str, kind: ExchangeType) -> Result<(), BoxError>;

    /// Declares a durable queue, optionally dead-lettering into `dead_letter`.
    async fn declare_queue(&self, name: &str, dead_letter: Option<&str>) -> Result<(), BoxError>;

    /// Binds `queue` to `exchange`.
    async fn bind_queue(&self, queue: &str, exchange: &str, routing_key: &str)
    -> Result<(), BoxError>;
}

/// Shared handle to an [`AmqpConnector`], registered as a bean.
#[derive(Clone)]
pub struct ConnectionFactory {
    connector: Arc<dyn AmqpConnector>,
}

impl ConnectionFactory {
    /// Wraps a connector implementation.
    pub fn new(connector: impl AmqpConnector + 'static) -> Self {
        Self {
            connector: Arc::new(connector),
        }
    }

    /// Returns the wrapped connector.
    pub fn connector(&self) -> &dyn AmqpConnector {
        self.connector.as_ref()
    }
}

impl fmt::Debug for ConnectionFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionFactory").finish_non_exhaustive()
    }
}
