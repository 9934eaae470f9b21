//! # Conflux component: Google Calendar stream
//!
//! Polls events from a Google calendar. Registered at link time under the id
//! `google-calendar-stream`.
//!
//! ```toml
//! [components.google-calendar-stream]
//! calendar-id = "team@example.com"
//! client-id = "..."
//! client-secret = "..."
//! refresh-token = "..."
//! consider-last-update = true
//! ```
//!
//! Credentials are either OAuth (`clientId`, `clientSecret` and a refresh or
//! access token) or a service account (`serviceAccountKey`, or
//! `emailAddress` with `p12FileName`). A [`GoogleCalendarClientFactory`]
//! bean turns them into an authorized client.

mod client;
mod endpoint;
mod error;
mod options;
mod settings;

use conflux_core::linkme::distributed_slice;
use conflux_core::{COMPONENTS, ComponentDescriptor, ComponentKind};

pub use client::{
    CLIENT_FACTORY_TYPE, CalendarApi, CalendarClientBuilder, CalendarEvent, EventOrder, EventPage,
    EventQuery, GoogleCalendarClientFactory,
};
pub use endpoint::{CalendarStreamEndpoint, CalendarStreamFactory};
pub use error::{CalendarError, CalendarResult};
pub use options::{DEFAULT_SCOPE, options};
pub use settings::{CalendarCredentials, CalendarSettings};

/// Component identifier.
pub const COMPONENT_ID: &str = "google-calendar-stream";

#[distributed_slice(COMPONENTS)]
#[linkme(crate = conflux_core::linkme)]
pub static GOOGLE_CALENDAR_STREAM: ComponentDescriptor = ComponentDescriptor {
    id: COMPONENT_ID,
    kind: ComponentKind::Component,
    title: "Google Calendar Stream",
    options,
    factory: CalendarStreamFactory::boxed,
};
