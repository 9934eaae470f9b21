//! Option descriptors of the `aws2-kinesis` component.

use conflux_core::OptionDescriptor;

use crate::client::KINESIS_CLIENT_TYPE;

/// Returns the option list, in catalog order.
pub fn options() -> Vec<OptionDescriptor> {
    vec![
        // Stream
        OptionDescriptor::string("streamName").describe("Name of the stream to consume"),
        OptionDescriptor::bool("cborEnabled")
            .with_default("true")
            .describe("Use CBOR encoding for requests"),
        OptionDescriptor::string("region").describe("Region the Kinesis client works in"),
        OptionDescriptor::bool("overrideEndpoint")
            .with_default("false")
            .describe("Send requests to 'uriEndpointOverride' instead of the regional endpoint"),
        OptionDescriptor::string("uriEndpointOverride")
            .describe("Endpoint URI used when 'overrideEndpoint' is set"),
        // Consumer
        OptionDescriptor::enumeration(
            "iteratorType",
            [
                "TRIM_HORIZON",
                "LATEST",
                "AT_TIMESTAMP",
                "AFTER_SEQUENCE_NUMBER",
                "AT_SEQUENCE_NUMBER",
            ],
        )
        .with_default("TRIM_HORIZON")
        .describe("Where to start reading a shard"),
        OptionDescriptor::int("maxResultsPerRequest")
            .with_default("1")
            .describe("Maximum number of records per request"),
        OptionDescriptor::string("messageTimestamp")
            .describe("Start timestamp for the AT_TIMESTAMP iterator"),
        OptionDescriptor::string("sequenceNumber")
            .describe("Start sequence number for the *_SEQUENCE_NUMBER iterators"),
        OptionDescriptor::enumeration("shardClosed", ["ignore", "fail", "silent"])
            .with_default("ignore")
            .describe("What to do when a consumed shard is closed"),
        OptionDescriptor::string("shardId").describe("Consume a single shard instead of all"),
        OptionDescriptor::long("shardMonitorInterval")
            .with_default("10000")
            .describe("Interval in milliseconds between shard list refreshes, 0 disables"),
        OptionDescriptor::bool("bridgeErrorHandler").with_default("false"),
        // Producer
        OptionDescriptor::bool("lazyStartProducer").with_default("false"),
        // Advanced
        OptionDescriptor::object("amazonKinesisClient", KINESIS_CLIENT_TYPE)
            .autowired()
            .describe("Client used for every Kinesis request"),
        OptionDescriptor::bool("healthCheckConsumerEnabled").with_default("true"),
        OptionDescriptor::bool("healthCheckProducerEnabled").with_default("true"),
        // Proxy
        OptionDescriptor::string("proxyHost"),
        OptionDescriptor::int("proxyPort"),
        OptionDescriptor::enumeration("proxyProtocol", ["HTTP", "HTTPS"]).with_default("HTTPS"),
        // Security
        OptionDescriptor::string("accessKey").secret(),
        OptionDescriptor::string("secretKey").secret(),
        OptionDescriptor::string("sessionToken").secret(),
        OptionDescriptor::string("profileCredentialsName"),
        OptionDescriptor::bool("trustAllCertificates").with_default("false"),
        OptionDescriptor::bool("useDefaultCredentialsProvider").with_default("false"),
        OptionDescriptor::bool("useProfileCredentialsProvider").with_default("false"),
        OptionDescriptor::bool("useSessionCredentials").with_default("false"),
    ]
}
