//! Calendar API seam.
//!
//! The endpoint does not speak HTTP itself. A [`GoogleCalendarClientFactory`]
//! bean turns the configured credentials into a [`CalendarApi`] client, in
//! the same way the Google client libraries build an authorized service.

use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

use async_trait::async_trait;
use conflux_core::BoxError;

use crate::settings::CalendarCredentials;

/// Type name declared by the `clientFactory` option.
pub const CLIENT_FACTORY_TYPE: &str = "GoogleCalendarClientFactory";

/// Sort order of returned events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOrder {
    StartTime,
    Updated,
}

/// Parameters of one `events.list` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
    pub calendar_id: String,
    pub max_results: i32,
    pub order_by: EventOrder,
    pub query: Option<String>,
    /// Lower bound on event end time.
    pub time_min: Option<SystemTime>,
    /// Lower bound on last modification time.
    pub updated_min: Option<SystemTime>,
    pub sync_token: Option<String>,
}

/// A calendar event, reduced to what the consumer tracks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEvent {
    pub id: String,
    pub summary: Option<String>,
    pub updated: SystemTime,
}

/// One page of `events.list` results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventPage {
    pub events: Vec<CalendarEvent>,
    pub next_sync_token: Option<String>,
}

/// An authorized calendar client.
#[async_trait]
pub trait CalendarApi: Send + Sync {
    async fn list_events(&self, query: &EventQuery) -> Result<EventPage, BoxError>;
}

/// Builds authorized clients from credentials.
#[async_trait]
pub trait CalendarClientBuilder: Send + Sync {
    async fn build(
        &self,
        credentials: &CalendarCredentials,
        scopes: &[String],
        application_name: Option<&str>,
    ) -> Result<Arc<dyn CalendarApi>, BoxError>;
}

/// Shared handle to a [`CalendarClientBuilder`], registered as a bean.
#[derive(Clone)]
pub struct GoogleCalendarClientFactory {
    builder: Arc<dyn CalendarClientBuilder>,
}

impl GoogleCalendarClientFactory {
    pub fn new(builder: impl CalendarClientBuilder + 'static) -> Self {
        Self {
            builder: Arc::new(builder),
        }
    }

    /// Builds a client for the given credentials.
    pub async fn make_client(
        &self,
        credentials: &CalendarCredentials,
        scopes: &[String],
        application_name: Option<&str>,
    ) -> Result<Arc<dyn CalendarApi>, BoxError> {
        self.builder
            .build(credentials, scopes, application_name)
            .await
    }
}

impl fmt::Debug for GoogleCalendarClientFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoogleCalendarClientFactory")
            .finish_non_exhaustive()
    }
}
