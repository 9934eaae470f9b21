//! The Kinesis client seam.
//!
//! Conflux does not ship an AWS SDK. Applications wrap whatever client they
//! use in a [`KinesisClient`] and register it as a bean; the endpoint only
//! needs the operations of [`KinesisApi`].

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use conflux_core::BoxError;

/// Type name declared by the `amazonKinesisClient` option.
pub const KINESIS_CLIENT_TYPE: &str = "KinesisClient";

/// Operations the endpoint performs against Kinesis.
#[async_trait]
pub trait KinesisApi: Send + Sync {
    /// Lists the ids of the open shards of `stream`.
    async fn list_shards(&self, stream: &str) -> Result<Vec<String>, BoxError>;
}

/// Shared handle to a [`KinesisApi`] implementation.
///
/// Registered beans of this type are picked up by the `amazonKinesisClient`
/// option, by name or through autowiring.
#[derive(Clone)]
pub struct KinesisClient {
    api: Arc<dyn KinesisApi>,
}

impl KinesisClient {
    /// Wraps a client implementation.
    pub fn new(api: impl KinesisApi + 'static) -> Self {
        Self { api: Arc::new(api) }
    }

    /// Lists the ids of the open shards of `stream`.
    pub async fn list_shards(&self, stream: &str) -> Result<Vec<String>, BoxError> {
        self.api.list_shards(stream).await
    }
}

impl fmt::Debug for KinesisClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KinesisClient").finish_non_exhaustive()
    }
}
