use conflux_core::{BindError, BoxError};
use thiserror::Error;

/// Errors raised while creating a Kinesis endpoint.
#[derive(Debug, Error)]
pub enum KinesisError {
    #[error(transparent)]
    Bind(#[from] BindError),

    #[error("option '{option}' {reason}")]
    InvalidOption {
        option: &'static str,
        reason: &'static str,
    },

    #[error("no KinesisClient available: set 'amazonKinesisClient' or register exactly one client bean")]
    MissingClient,

    #[error("shard '{shard}' not found in stream '{stream}'")]
    UnknownShard { stream: String, shard: String },

    #[error("Kinesis request failed")]
    Client(#[source] BoxError),
}

/// Result type for Kinesis endpoint creation.
pub type KinesisResult<T> = Result<T, KinesisError>;
