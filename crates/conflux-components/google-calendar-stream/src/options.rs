use conflux_core::OptionDescriptor;

use crate::client::CLIENT_FACTORY_TYPE;

/// Scope requested when none is configured.
pub const DEFAULT_SCOPE: &str = "https://www.googleapis.com/auth/calendar";

/// Returns the option list, in catalog order.
pub fn options() -> Vec<OptionDescriptor> {
    vec![
        OptionDescriptor::string("applicationName"),
        OptionDescriptor::string("calendarId").with_default("primary"),
        OptionDescriptor::string("clientId"),
        OptionDescriptor::bool("considerLastUpdate")
            .with_default("false")
            .describe("Only fetch events updated since the last poll"),
        OptionDescriptor::bool("consumeFromNow")
            .with_default("true")
            .describe("Skip events that ended before the consumer started"),
        OptionDescriptor::string("delegate")
            .describe("User a service account acts on behalf of"),
        OptionDescriptor::int("maxResults").with_default("10"),
        OptionDescriptor::string("query").describe("Free text search filter"),
        OptionDescriptor::list("scopes").with_default(DEFAULT_SCOPE),
        OptionDescriptor::bool("syncFlow")
            .with_default("false")
            .describe("Use incremental synchronization tokens"),
        OptionDescriptor::bool("bridgeErrorHandler").with_default("false"),
        // Advanced
        OptionDescriptor::object("clientFactory", CLIENT_FACTORY_TYPE).autowired(),
        // Security
        OptionDescriptor::string("accessToken").secret(),
        OptionDescriptor::string("clientSecret").secret(),
        OptionDescriptor::string("emailAddress"),
        OptionDescriptor::string("p12FileName"),
        OptionDescriptor::string("refreshToken").secret(),
        OptionDescriptor::string("serviceAccountKey"),
    ]
}
