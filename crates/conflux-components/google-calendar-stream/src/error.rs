use conflux_core::{BindError, BoxError};
use thiserror::Error;

/// Errors raised by the calendar stream endpoint.
#[derive(Debug, Error)]
pub enum CalendarError {
    #[error(transparent)]
    Bind(#[from] BindError),

    #[error("option '{option}' {reason}")]
    InvalidOption {
        option: &'static str,
        reason: &'static str,
    },

    #[error("no GoogleCalendarClientFactory available: set 'clientFactory' or register exactly one factory bean")]
    MissingClientFactory,

    #[error("cannot build an authorized calendar client")]
    Authorization(#[source] BoxError),

    #[error("calendar request failed")]
    Client(#[source] BoxError),
}

pub type CalendarResult<T> = Result<T, CalendarError>;
