//! Option descriptors of the `spring-rabbitmq` component.

use conflux_core::OptionDescriptor;

use crate::connection::CONNECTION_FACTORY_TYPE;

const EXCHANGE_TYPES: [&str; 4] = ["direct", "fanout", "headers", "topic"];

/// Returns the option list, in catalog order.
pub fn options() -> Vec<OptionDescriptor> {
    vec![
        OptionDescriptor::string("exchangeName").describe("Exchange to publish to or consume from"),
        OptionDescriptor::enumeration("exchangeType", EXCHANGE_TYPES).with_default("direct"),
        OptionDescriptor::string("routingKey"),
        OptionDescriptor::list("queues").describe("Queues to consume, comma separated"),
        // Common
        OptionDescriptor::object("connectionFactory", CONNECTION_FACTORY_TYPE)
            .autowired()
            .describe("Connection factory used for every broker connection"),
        OptionDescriptor::bool("testConnectionOnStartup")
            .with_default("false")
            .describe("Open a connection on startup and fail fast if the broker is unreachable"),
        // Consumer
        OptionDescriptor::bool("autoDeclare")
            .with_default("false")
            .describe("Declare exchanges, queues and bindings on startup"),
        OptionDescriptor::bool("autoStartup").with_default("true"),
        OptionDescriptor::bool("bridgeErrorHandler").with_default("false"),
        OptionDescriptor::int("concurrentConsumers").with_default("1"),
        OptionDescriptor::int("maxConcurrentConsumers"),
        OptionDescriptor::string("deadLetterExchange"),
        OptionDescriptor::enumeration("deadLetterExchangeType", EXCHANGE_TYPES)
            .with_default("direct"),
        OptionDescriptor::string("deadLetterQueue"),
        OptionDescriptor::string("deadLetterRoutingKey"),
        OptionDescriptor::int("maximumRetryAttempts").with_default("5"),
        OptionDescriptor::int("prefetchCount")
            .with_default("250")
            .describe("Messages the broker sends to a consumer ahead of acknowledgement"),
        OptionDescriptor::bool("rejectAndDontRequeue").with_default("true"),
        OptionDescriptor::int("retryDelay").with_default("1000"),
        OptionDescriptor::long("shutdownTimeout")
            .with_default("5000")
            .describe("Milliseconds to wait for in-flight messages on shutdown"),
        // Producer
        OptionDescriptor::bool("lazyStartProducer").with_default("false"),
        OptionDescriptor::long("replyTimeout").with_default("30000"),
        // Advanced
        OptionDescriptor::bool("ignoreDeclarationExceptions")
            .with_default("false")
            .describe("Log declaration failures instead of failing startup"),
    ]
}
