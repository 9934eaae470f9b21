//! Typed settings read from a bound `aws2-kinesis` configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use conflux_core::{BindError, BoundConfiguration, FromBound, REDACTED, missing};

// =============================================================================
// Enums
// =============================================================================

/// Where a shard iterator starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IteratorType {
    /// Oldest record still retained.
    #[default]
    TrimHorizon,
    /// Records added after the consumer starts.
    Latest,
    /// Records from `messageTimestamp` on.
    AtTimestamp,
    /// Records after `sequenceNumber`.
    AfterSequenceNumber,
    /// Records from `sequenceNumber` on.
    AtSequenceNumber,
}

impl IteratorType {
    /// Returns the constant as written in configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TrimHorizon => "TRIM_HORIZON",
            Self::Latest => "LATEST",
            Self::AtTimestamp => "AT_TIMESTAMP",
            Self::AfterSequenceNumber => "AFTER_SEQUENCE_NUMBER",
            Self::AtSequenceNumber => "AT_SEQUENCE_NUMBER",
        }
    }

    /// Returns `true` if the iterator needs a `sequenceNumber`.
    pub fn needs_sequence_number(&self) -> bool {
        matches!(self, Self::AfterSequenceNumber | Self::AtSequenceNumber)
    }
}

impl FromStr for IteratorType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TRIM_HORIZON" => Ok(Self::TrimHorizon),
            "LATEST" => Ok(Self::Latest),
            "AT_TIMESTAMP" => Ok(Self::AtTimestamp),
            "AFTER_SEQUENCE_NUMBER" => Ok(Self::AfterSequenceNumber),
            "AT_SEQUENCE_NUMBER" => Ok(Self::AtSequenceNumber),
            _ => Err(()),
        }
    }
}

impl fmt::Display for IteratorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reaction to a consumed shard being closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShardClosedStrategy {
    /// Log a warning and keep consuming the other shards.
    #[default]
    Ignore,
    /// Keep consuming without a warning.
    Silent,
    /// Mark the endpoint as failed.
    Fail,
}

impl FromStr for ShardClosedStrategy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ignore" => Ok(Self::Ignore),
            "silent" => Ok(Self::Silent),
            "fail" => Ok(Self::Fail),
            _ => Err(()),
        }
    }
}

/// Protocol used to talk to the proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProxyProtocol {
    Http,
    #[default]
    Https,
}

impl FromStr for ProxyProtocol {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HTTP" => Ok(Self::Http),
            "HTTPS" => Ok(Self::Https),
            _ => Err(()),
        }
    }
}

// =============================================================================
// Settings
// =============================================================================

/// Proxy in front of the Kinesis endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxySettings {
    pub host: String,
    pub port: i32,
    pub protocol: ProxyProtocol,
}

/// How the client authenticates.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Whatever the injected client was built with.
    FromClient,
    /// The SDK default provider chain.
    DefaultProvider,
    /// A named profile, or the default profile if `None`.
    Profile(Option<String>),
    /// Static keys, with a session token for temporary credentials.
    Static {
        access_key: String,
        secret_key: String,
        session_token: Option<String>,
    },
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FromClient => f.write_str("FromClient"),
            Self::DefaultProvider => f.write_str("DefaultProvider"),
            Self::Profile(name) => f.debug_tuple("Profile").field(name).finish(),
            Self::Static { session_token, .. } => f
                .debug_struct("Static")
                .field("access_key", &REDACTED)
                .field("secret_key", &REDACTED)
                .field("session_token", &session_token.as_ref().map(|_| REDACTED))
                .finish(),
        }
    }
}

impl Credentials {
    fn from_bound(config: &BoundConfiguration) -> Result<Self, BindError> {
        if config.bool("useDefaultCredentialsProvider") == Some(true) {
            return Ok(Self::DefaultProvider);
        }
        if config.bool("useProfileCredentialsProvider") == Some(true) {
            return Ok(Self::Profile(
                config.string("profileCredentialsName").map(str::to_string),
            ));
        }

        let session = config.bool("useSessionCredentials") == Some(true);
        let access_key = config.string("accessKey");
        let secret_key = config.string("secretKey");
        if access_key.is_none() && secret_key.is_none() && !session {
            return Ok(Self::FromClient);
        }

        let access_key = access_key.ok_or_else(|| missing(config, "accessKey"))?;
        let secret_key = secret_key.ok_or_else(|| missing(config, "secretKey"))?;
        let session_token = if session {
            let token = config
                .string("sessionToken")
                .ok_or_else(|| missing(config, "sessionToken"))?;
            Some(token.to_string())
        } else {
            None
        };

        Ok(Self::Static {
            access_key: access_key.to_string(),
            secret_key: secret_key.to_string(),
            session_token,
        })
    }
}

/// Settings of one Kinesis consumer endpoint.
#[derive(Debug, Clone)]
pub struct KinesisSettings {
    pub stream_name: String,
    pub region: Option<String>,
    pub endpoint_override: Option<String>,
    pub cbor_enabled: bool,
    pub iterator_type: IteratorType,
    pub sequence_number: Option<String>,
    pub message_timestamp: Option<String>,
    pub max_results_per_request: i32,
    pub shard_id: Option<String>,
    pub shard_closed: ShardClosedStrategy,
    /// `None` when monitoring is disabled.
    pub shard_monitor_interval: Option<Duration>,
    pub proxy: Option<ProxySettings>,
    pub credentials: Credentials,
    pub trust_all_certificates: bool,
}

impl FromBound for KinesisSettings {
    fn from_bound(config: &BoundConfiguration) -> Result<Self, BindError> {
        let string = |key: &str| config.string(key).map(str::to_string);

        let stream_name = string("streamName").ok_or_else(|| missing(config, "streamName"))?;

        let endpoint_override = if config.bool("overrideEndpoint") == Some(true) {
            Some(string("uriEndpointOverride").ok_or_else(|| missing(config, "uriEndpointOverride"))?)
        } else {
            None
        };

        let iterator_type = config
            .parse_enum::<IteratorType>("iteratorType")?
            .unwrap_or_default();
        let sequence_number = string("sequenceNumber");
        let message_timestamp = string("messageTimestamp");
        if iterator_type.needs_sequence_number() && sequence_number.is_none() {
            return Err(missing(config, "sequenceNumber"));
        }
        if iterator_type == IteratorType::AtTimestamp && message_timestamp.is_none() {
            return Err(missing(config, "messageTimestamp"));
        }

        let proxy = match (string("proxyHost"), config.int("proxyPort")) {
            (Some(host), Some(port)) => Some(ProxySettings {
                host,
                port,
                protocol: config
                    .parse_enum::<ProxyProtocol>("proxyProtocol")?
                    .unwrap_or_default(),
            }),
            (Some(_), None) => return Err(missing(config, "proxyPort")),
            (None, _) => None,
        };

        let shard_monitor_interval = config
            .long("shardMonitorInterval")
            .filter(|ms| *ms > 0)
            .map(|ms| Duration::from_millis(ms.unsigned_abs()));

        Ok(Self {
            stream_name,
            region: string("region"),
            endpoint_override,
            cbor_enabled: config.bool("cborEnabled").unwrap_or(true),
            iterator_type,
            sequence_number,
            message_timestamp,
            max_results_per_request: config.int("maxResultsPerRequest").unwrap_or(1),
            shard_id: string("shardId"),
            shard_closed: config
                .parse_enum::<ShardClosedStrategy>("shardClosed")?
                .unwrap_or_default(),
            shard_monitor_interval,
            proxy,
            credentials: Credentials::from_bound(config)?,
            trust_all_certificates: config.bool("trustAllCertificates").unwrap_or(false),
        })
    }
}

#[cfg(test)]
mod tests {
    use conflux_core::{Binder, ComponentSchema, NoObjects, raw_values};

    use super::*;
    use crate::options;

    fn settings(pairs: &[(&str, &str)]) -> Result<KinesisSettings, BindError> {
        let schema = ComponentSchema::new("aws2-kinesis", options()).unwrap();
        let raw = raw_values(pairs.iter().copied());
        let bound = Binder::new().bind(&schema, &raw, &NoObjects)?;
        KinesisSettings::from_bound(&bound)
    }

    #[test]
    fn test_defaults() {
        let settings = settings(&[("stream-name", "orders")]).unwrap();

        assert_eq!(settings.stream_name, "orders");
        assert_eq!(settings.iterator_type, IteratorType::TrimHorizon);
        assert_eq!(settings.shard_closed, ShardClosedStrategy::Ignore);
        assert_eq!(settings.max_results_per_request, 1);
        assert_eq!(settings.shard_monitor_interval, Some(Duration::from_secs(10)));
        assert_eq!(settings.credentials, Credentials::FromClient);
        assert!(settings.cbor_enabled);
        assert!(settings.proxy.is_none());
    }

    #[test]
    fn test_stream_name_is_needed() {
        let err = settings(&[("shardId", "shardId-000000000001")]).unwrap_err();
        assert_eq!(
            err,
            BindError::MissingRequiredOption {
                component: "aws2-kinesis".into(),
                option: "streamName".into(),
            }
        );
    }

    #[test]
    fn test_iterator_needs_position() {
        let err = settings(&[("streamName", "s"), ("iteratorType", "AT_SEQUENCE_NUMBER")])
            .unwrap_err();
        assert!(matches!(err, BindError::MissingRequiredOption { ref option, .. } if option == "sequenceNumber"));

        let err =
            settings(&[("streamName", "s"), ("iteratorType", "AT_TIMESTAMP")]).unwrap_err();
        assert!(matches!(err, BindError::MissingRequiredOption { ref option, .. } if option == "messageTimestamp"));

        let ok = settings(&[
            ("streamName", "s"),
            ("iteratorType", "AFTER_SEQUENCE_NUMBER"),
            ("sequenceNumber", "4960"),
        ])
        .unwrap();
        assert_eq!(ok.iterator_type, IteratorType::AfterSequenceNumber);
    }

    #[test]
    fn test_credentials() {
        let s = settings(&[("streamName", "s"), ("useProfileCredentialsProvider", "true")]).unwrap();
        assert_eq!(s.credentials, Credentials::Profile(None));

        let s = settings(&[("streamName", "s"), ("access-key", "AK"), ("secret-key", "SK")]).unwrap();
        assert_eq!(
            s.credentials,
            Credentials::Static {
                access_key: "AK".into(),
                secret_key: "SK".into(),
                session_token: None,
            }
        );
        assert!(!format!("{:?}", s.credentials).contains("SK"));

        let err = settings(&[("streamName", "s"), ("accessKey", "AK")]).unwrap_err();
        assert!(matches!(err, BindError::MissingRequiredOption { ref option, .. } if option == "secretKey"));

        let err = settings(&[
            ("streamName", "s"),
            ("accessKey", "AK"),
            ("secretKey", "SK"),
            ("useSessionCredentials", "true"),
        ])
        .unwrap_err();
        assert!(matches!(err, BindError::MissingRequiredOption { ref option, .. } if option == "sessionToken"));
    }

    #[test]
    fn test_proxy_and_endpoint_override() {
        let s = settings(&[
            ("streamName", "s"),
            ("proxy.host", "proxy.local"),
            ("proxy.port", "3128"),
            ("overrideEndpoint", "true"),
            ("uriEndpointOverride", "http://localhost:4566"),
        ])
        .unwrap();
        assert_eq!(
            s.proxy,
            Some(ProxySettings {
                host: "proxy.local".into(),
                port: 3128,
                protocol: ProxyProtocol::Https,
            })
        );
        assert_eq!(s.endpoint_override.as_deref(), Some("http://localhost:4566"));

        let err = settings(&[("streamName", "s"), ("proxyHost", "proxy.local")]).unwrap_err();
        assert!(matches!(err, BindError::MissingRequiredOption { ref option, .. } if option == "proxyPort"));
    }

    #[test]
    fn test_monitor_can_be_disabled() {
        let s = settings(&[("streamName", "s"), ("shardMonitorInterval", "0")]).unwrap();
        assert_eq!(s.shard_monitor_interval, None);
    }
}
