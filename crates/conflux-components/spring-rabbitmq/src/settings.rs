//! Typed settings read from a bound `spring-rabbitmq` configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use conflux_core::{BindError, BoundConfiguration, FromBound, missing};

/// AMQP exchange type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExchangeType {
    #[default]
    Direct,
    Fanout,
    Headers,
    Topic,
}

impl ExchangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Fanout => "fanout",
            Self::Headers => "headers",
            Self::Topic => "topic",
        }
    }
}

impl FromStr for ExchangeType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "direct" => Ok(Self::Direct),
            "fanout" => Ok(Self::Fanout),
            "headers" => Ok(Self::Headers),
            "topic" => Ok(Self::Topic),
            _ => Err(()),
        }
    }
}

impl fmt::Display for ExchangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where rejected messages go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeadLetter {
    pub exchange: String,
    pub exchange_type: ExchangeType,
    pub queue: Option<String>,
    pub routing_key: Option<String>,
}

/// Redelivery of failed messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrySettings {
    pub max_attempts: i32,
    pub delay: Duration,
    /// Reject without requeue once attempts are exhausted.
    pub reject_and_dont_requeue: bool,
}

/// Settings of one RabbitMQ endpoint.
#[derive(Debug, Clone)]
pub struct RabbitSettings {
    pub exchange_name: String,
    pub exchange_type: ExchangeType,
    pub routing_key: Option<String>,
    pub queues: Vec<String>,
    pub test_connection_on_startup: bool,
    pub auto_declare: bool,
    pub auto_startup: bool,
    pub ignore_declaration_exceptions: bool,
    pub concurrent_consumers: i32,
    pub max_concurrent_consumers: Option<i32>,
    pub prefetch_count: i32,
    pub shutdown_timeout: Duration,
    pub reply_timeout: Duration,
    pub dead_letter: Option<DeadLetter>,
    pub retry: RetrySettings,
}

fn millis(config: &BoundConfiguration, key: &str, default: i64) -> Duration {
    let ms = config.long(key).unwrap_or(default).max(0);
    Duration::from_millis(ms.unsigned_abs())
}

impl FromBound for RabbitSettings {
    fn from_bound(config: &BoundConfiguration) -> Result<Self, BindError> {
        let string = |key: &str| config.string(key).map(str::to_string);
        let flag = |key: &str, default: bool| config.bool(key).unwrap_or(default);

        let exchange_name =
            string("exchangeName").ok_or_else(|| missing(config, "exchangeName"))?;

        let dead_letter_queue = string("deadLetterQueue");
        let dead_letter_routing_key = string("deadLetterRoutingKey");
        let dead_letter = match string("deadLetterExchange") {
            Some(exchange) => Some(DeadLetter {
                exchange,
                exchange_type: config
                    .parse_enum("deadLetterExchangeType")?
                    .unwrap_or_default(),
                queue: dead_letter_queue,
                routing_key: dead_letter_routing_key,
            }),
            None if dead_letter_queue.is_some() || dead_letter_routing_key.is_some() => {
                return Err(missing(config, "deadLetterExchange"));
            }
            None => None,
        };

        let retry_delay = config.int("retryDelay").unwrap_or(1000).max(0);

        Ok(Self {
            exchange_name,
            exchange_type: config.parse_enum("exchangeType")?.unwrap_or_default(),
            routing_key: string("routingKey"),
            queues: config.list("queues").map(<[String]>::to_vec).unwrap_or_default(),
            test_connection_on_startup: flag("testConnectionOnStartup", false),
            auto_declare: flag("autoDeclare", false),
            auto_startup: flag("autoStartup", true),
            ignore_declaration_exceptions: flag("ignoreDeclarationExceptions", false),
            concurrent_consumers: config.int("concurrentConsumers").unwrap_or(1),
            max_concurrent_consumers: config.int("maxConcurrentConsumers"),
            prefetch_count: config.int("prefetchCount").unwrap_or(250),
            shutdown_timeout: millis(config, "shutdownTimeout", 5000),
            reply_timeout: millis(config, "replyTimeout", 30_000),
            dead_letter,
            retry: RetrySettings {
                max_attempts: config.int("maximumRetryAttempts").unwrap_or(5),
                delay: Duration::from_millis(u64::from(retry_delay.unsigned_abs())),
                reject_and_dont_requeue: flag("rejectAndDontRequeue", true),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use conflux_core::{Binder, ComponentSchema, NoObjects, raw_values};

    use super::*;
    use crate::options;

    fn settings(pairs: &[(&str, &str)]) -> Result<RabbitSettings, BindError> {
        let schema = ComponentSchema::new("spring-rabbitmq", options()).unwrap();
        let bound = Binder::new().bind(&schema, &raw_values(pairs.iter().copied()), &NoObjects)?;
        RabbitSettings::from_bound(&bound)
    }

    #[test]
    fn test_defaults() {
        let s = settings(&[("exchangeName", "orders")]).unwrap();

        assert_eq!(s.exchange_type, ExchangeType::Direct);
        assert_eq!(s.prefetch_count, 250);
        assert_eq!(s.shutdown_timeout, Duration::from_secs(5));
        assert_eq!(s.retry.max_attempts, 5);
        assert!(s.retry.reject_and_dont_requeue);
        assert!(s.auto_startup);
        assert!(!s.auto_declare);
        assert!(s.queues.is_empty());
        assert!(s.dead_letter.is_none());
    }

    #[test]
    fn test_queues_and_dead_letter() {
        let s = settings(&[
            ("exchange-name", "orders"),
            ("exchange-type", "topic"),
            ("queues", "created, cancelled,"),
            ("dead-letter-exchange", "orders.dlx"),
            ("dead-letter-exchange-type", "fanout"),
            ("dead-letter-queue", "orders.dlq"),
        ])
        .unwrap();

        assert_eq!(s.exchange_type, ExchangeType::Topic);
        assert_eq!(s.queues, vec!["created".to_string(), "cancelled".to_string()]);
        assert_eq!(
            s.dead_letter,
            Some(DeadLetter {
                exchange: "orders.dlx".into(),
                exchange_type: ExchangeType::Fanout,
                queue: Some("orders.dlq".into()),
                routing_key: None,
            })
        );
    }

    #[test]
    fn test_dead_letter_queue_needs_exchange() {
        let err = settings(&[("exchangeName", "orders"), ("deadLetterQueue", "dlq")]).unwrap_err();
        assert!(matches!(
            err,
            BindError::MissingRequiredOption { ref option, .. } if option == "deadLetterExchange"
        ));
    }
}
