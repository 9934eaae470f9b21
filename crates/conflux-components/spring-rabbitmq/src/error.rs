use conflux_core::{BindError, BoxError};
use thiserror::Error;

/// Errors raised while creating a RabbitMQ endpoint.
#[derive(Debug, Error)]
pub enum RabbitError {
    #[error(transparent)]
    Bind(#[from] BindError),

    #[error("option '{option}' {reason}")]
    InvalidOption {
        option: &'static str,
        reason: String,
    },

    #[error("no ConnectionFactory available: set 'connectionFactory' or register exactly one factory bean")]
    MissingConnectionFactory,

    #[error("cannot connect to the broker")]
    Connection(#[source] BoxError),

    #[error("failed to declare {what}")]
    Declaration {
        what: String,
        #[source]
        source: BoxError,
    },
}

/// Result type for RabbitMQ endpoint creation.
pub type RabbitResult<T> = Result<T, RabbitError>;
