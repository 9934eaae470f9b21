//! Calendar stream endpoint and its factory.

use std::any::Any;
use std::sync::Arc;
use std::time::SystemTime;

use async_trait::async_trait;
use conflux_core::{
    BoundConfiguration, BoxedFactory, ComponentFactory, Endpoint, FactoryResult, FromBound,
};
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::client::{CalendarApi, CalendarEvent, EventOrder, EventQuery, GoogleCalendarClientFactory};
use crate::error::{CalendarError, CalendarResult};
use crate::settings::CalendarSettings;

/// Largest page size `events.list` accepts.
const MAX_PAGE_SIZE: i32 = 2500;

/// Creates [`CalendarStreamEndpoint`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct CalendarStreamFactory;

impl CalendarStreamFactory {
    /// Returns the factory as a shared trait object.
    pub fn boxed() -> BoxedFactory {
        Arc::new(Self)
    }
}

#[async_trait]
impl ComponentFactory for CalendarStreamFactory {
    async fn create(&self, config: BoundConfiguration) -> FactoryResult {
        let endpoint = CalendarStreamEndpoint::start(&config).await?;
        Ok(Box::new(endpoint))
    }
}

#[derive(Debug, Default)]
struct PollState {
    time_min: Option<SystemTime>,
    last_update: Option<SystemTime>,
    sync_token: Option<String>,
}

/// Pull-based consumer of calendar events.
///
/// Each [`poll`](Self::poll) fetches the next page of events. With
/// `syncFlow` the consumer follows sync tokens; with `considerLastUpdate`
/// it only asks for events modified since the newest one seen so far.
pub struct CalendarStreamEndpoint {
    settings: CalendarSettings,
    client: Arc<dyn CalendarApi>,
    state: Mutex<PollState>,
}

impl CalendarStreamEndpoint {
    /// Validates the settings and builds an authorized client.
    pub async fn start(config: &BoundConfiguration) -> CalendarResult<Self> {
        let settings = CalendarSettings::from_bound(config)?;
        if !(1..=MAX_PAGE_SIZE).contains(&settings.max_results) {
            return Err(CalendarError::InvalidOption {
                option: "maxResults",
                reason: "must be between 1 and 2500",
            });
        }
        if settings.sync_flow && settings.query.is_some() {
            return Err(CalendarError::InvalidOption {
                option: "query",
                reason: "cannot be combined with syncFlow",
            });
        }

        let factory = config
            .try_object::<GoogleCalendarClientFactory>("clientFactory")?
            .ok_or(CalendarError::MissingClientFactory)?;
        let client = factory
            .make_client(
                &settings.credentials,
                &settings.scopes,
                settings.application_name.as_deref(),
            )
            .await
            .map_err(CalendarError::Authorization)?;

        let state = PollState {
            time_min: settings.consume_from_now.then(SystemTime::now),
            ..Default::default()
        };

        info!(calendar = %settings.calendar_id, sync_flow = settings.sync_flow, "Calendar stream ready");
        Ok(Self {
            settings,
            client,
            state: Mutex::new(state),
        })
    }

    /// The settings the endpoint was created with.
    pub fn settings(&self) -> &CalendarSettings {
        &self.settings
    }

    /// Query the next [`poll`](Self::poll) will send.
    pub fn next_query(&self) -> EventQuery {
        let settings = &self.settings;
        let state = self.state.lock();

        if settings.sync_flow {
            return EventQuery {
                calendar_id: settings.calendar_id.clone(),
                max_results: settings.max_results,
                order_by: EventOrder::StartTime,
                query: None,
                time_min: None,
                updated_min: None,
                sync_token: state.sync_token.clone(),
            };
        }

        EventQuery {
            calendar_id: settings.calendar_id.clone(),
            max_results: settings.max_results,
            order_by: if settings.consider_last_update {
                EventOrder::Updated
            } else {
                EventOrder::StartTime
            },
            query: settings.query.clone(),
            time_min: state.time_min,
            updated_min: state.last_update.filter(|_| settings.consider_last_update),
            sync_token: None,
        }
    }

    /// Fetches the next page of events.
    pub async fn poll(&self) -> CalendarResult<Vec<CalendarEvent>> {
        let query = self.next_query();
        let page = self
            .client
            .list_events(&query)
            .await
            .map_err(CalendarError::Client)?;

        let mut state = self.state.lock();
        if self.settings.sync_flow
            && let Some(token) = page.next_sync_token
        {
            state.sync_token = Some(token);
        }
        if self.settings.consider_last_update
            && let Some(newest) = page.events.iter().map(|event| event.updated).max()
        {
            state.last_update = Some(state.last_update.map_or(newest, |seen| seen.max(newest)));
        }

        debug!(calendar = %self.settings.calendar_id, events = page.events.len(), "Polled calendar");
        Ok(page.events)
    }
}

#[async_trait]
impl Endpoint for CalendarStreamEndpoint {
    fn uri(&self) -> String {
        format!("google-calendar-stream:{}", self.settings.calendar_id)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
