//! Typed settings read from a bound `google-calendar-stream` configuration.

use std::fmt;

use conflux_core::{BindError, BoundConfiguration, FromBound, REDACTED, missing};

/// How the client authorizes against Google.
#[derive(Clone, PartialEq, Eq)]
pub enum CalendarCredentials {
    /// Installed-application OAuth; at least one of the tokens is set.
    OAuth {
        client_id: String,
        client_secret: String,
        refresh_token: Option<String>,
        access_token: Option<String>,
    },
    /// Service account key file (JSON).
    ServiceAccountKey {
        key: String,
        delegate: Option<String>,
    },
    /// Legacy P12 service account.
    P12 {
        email_address: String,
        p12_file_name: String,
        delegate: Option<String>,
    },
}

impl fmt::Debug for CalendarCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |token: &Option<String>| token.as_ref().map(|_| REDACTED);
        match self {
            Self::OAuth {
                client_id,
                refresh_token,
                access_token,
                ..
            } => f
                .debug_struct("OAuth")
                .field("client_id", client_id)
                .field("client_secret", &REDACTED)
                .field("refresh_token", &redact(refresh_token))
                .field("access_token", &redact(access_token))
                .finish(),
            Self::ServiceAccountKey { key, delegate } => f
                .debug_struct("ServiceAccountKey")
                .field("key", key)
                .field("delegate", delegate)
                .finish(),
            Self::P12 {
                email_address,
                p12_file_name,
                delegate,
            } => f
                .debug_struct("P12")
                .field("email_address", email_address)
                .field("p12_file_name", p12_file_name)
                .field("delegate", delegate)
                .finish(),
        }
    }
}

impl FromBound for CalendarCredentials {
    fn from_bound(config: &BoundConfiguration) -> Result<Self, BindError> {
        let string = |key: &str| config.string(key).map(str::to_string);
        let delegate = string("delegate");

        if let Some(key) = string("serviceAccountKey") {
            return Ok(Self::ServiceAccountKey { key, delegate });
        }

        match (string("emailAddress"), string("p12FileName")) {
            (Some(email_address), Some(p12_file_name)) => {
                return Ok(Self::P12 {
                    email_address,
                    p12_file_name,
                    delegate,
                });
            }
            (Some(_), None) => return Err(missing(config, "p12FileName")),
            (None, Some(_)) => return Err(missing(config, "emailAddress")),
            (None, None) => {}
        }

        let client_id = string("clientId").ok_or_else(|| missing(config, "clientId"))?;
        let client_secret = string("clientSecret").ok_or_else(|| missing(config, "clientSecret"))?;
        let refresh_token = string("refreshToken");
        let access_token = string("accessToken");
        if refresh_token.is_none() && access_token.is_none() {
            return Err(missing(config, "refreshToken"));
        }

        Ok(Self::OAuth {
            client_id,
            client_secret,
            refresh_token,
            access_token,
        })
    }
}

/// Settings of one calendar stream consumer.
#[derive(Debug, Clone)]
pub struct CalendarSettings {
    pub calendar_id: String,
    pub application_name: Option<String>,
    pub scopes: Vec<String>,
    pub max_results: i32,
    pub query: Option<String>,
    pub consider_last_update: bool,
    pub consume_from_now: bool,
    pub sync_flow: bool,
    pub credentials: CalendarCredentials,
}

impl FromBound for CalendarSettings {
    fn from_bound(config: &BoundConfiguration) -> Result<Self, BindError> {
        Ok(Self {
            calendar_id: config.string("calendarId").unwrap_or("primary").to_string(),
            application_name: config.string("applicationName").map(str::to_string),
            scopes: config.list("scopes").map(<[String]>::to_vec).unwrap_or_default(),
            max_results: config.int("maxResults").unwrap_or(10),
            query: config.string("query").map(str::to_string),
            consider_last_update: config.bool("considerLastUpdate").unwrap_or(false),
            consume_from_now: config.bool("consumeFromNow").unwrap_or(true),
            sync_flow: config.bool("syncFlow").unwrap_or(false),
            credentials: CalendarCredentials::from_bound(config)?,
        })
    }
}
