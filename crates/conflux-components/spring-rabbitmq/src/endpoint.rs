//! RabbitMQ endpoint and its factory.

use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use conflux_core::{
    BoundConfiguration, BoxError, BoxedFactory, ComponentFactory, Endpoint, FactoryResult,
    FromBound,
};
use tracing::{debug, info, warn};

use crate::connection::{AmqpConnector, ConnectionFactory};
use crate::error::{RabbitError, RabbitResult};
use crate::settings::RabbitSettings;

/// AMQP prefetch counts are 16-bit.
const MAX_PREFETCH: i32 = u16::MAX as i32;

/// Creates [`RabbitEndpoint`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct RabbitFactory;

impl RabbitFactory {
    /// Returns the factory as a shared trait object.
    pub fn boxed() -> BoxedFactory {
        Arc::new(Self)
    }
}

#[async_trait]
impl ComponentFactory for RabbitFactory {
    async fn create(&self, config: BoundConfiguration) -> FactoryResult {
        let endpoint = RabbitEndpoint::start(&config).await?;
        Ok(Box::new(endpoint))
    }
}

/// An endpoint bound to one exchange.
pub struct RabbitEndpoint {
    settings: RabbitSettings,
    factory: ConnectionFactory,
    running: AtomicBool,
}

impl RabbitEndpoint {
    /// Validates the settings, then optionally tests the connection and
    /// declares the topology.
    pub async fn start(config: &BoundConfiguration) -> RabbitResult<Self> {
        let settings = RabbitSettings::from_bound(config)?;
        validate(&settings)?;

        let factory = config
            .try_object::<ConnectionFactory>("connectionFactory")?
            .ok_or(RabbitError::MissingConnectionFactory)?;
        let factory = ConnectionFactory::clone(&factory);

        if settings.test_connection_on_startup {
            factory
                .connector()
                .check_connection()
                .await
                .map_err(RabbitError::Connection)?;
            debug!(exchange = %settings.exchange_name, "Broker connection verified");
        }

        if settings.auto_declare {
            declare(factory.connector(), &settings).await?;
        }

        info!(
            exchange = %settings.exchange_name,
            queues = ?settings.queues,
            auto_startup = settings.auto_startup,
            "RabbitMQ endpoint created"
        );

        Ok(Self {
            running: AtomicBool::new(settings.auto_startup),
            settings,
            factory,
        })
    }

    /// The settings the endpoint was created with.
    pub fn settings(&self) -> &RabbitSettings {
        &self.settings
    }

    /// The connection factory used by the endpoint.
    pub fn connection_factory(&self) -> &ConnectionFactory {
        &self.factory
    }

    /// Whether the listener is consuming.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Starts consuming if `autoStartup` was off.
    pub fn resume(&self) {
        if !self.running.swap(true, Ordering::AcqRel) {
            info!(exchange = %self.settings.exchange_name, "RabbitMQ listener started");
        }
    }
}

#[async_trait]
impl Endpoint for RabbitEndpoint {
    fn uri(&self) -> String {
        format!("spring-rabbitmq:{}", self.settings.exchange_name)
    }

    async fn shutdown(&self) -> Result<(), BoxError> {
        self.running.store(false, Ordering::Release);
        info!(
            exchange = %self.settings.exchange_name,
            timeout = ?self.settings.shutdown_timeout,
            "RabbitMQ endpoint stopped"
        );
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn validate(settings: &RabbitSettings) -> RabbitResult<()> {
    if !(0..=MAX_PREFETCH).contains(&settings.prefetch_count) {
        return Err(RabbitError::InvalidOption {
            option: "prefetchCount",
            reason: format!("must be between 0 and {MAX_PREFETCH}"),
        });
    }
    if settings.concurrent_consumers < 1 {
        return Err(RabbitError::InvalidOption {
            option: "concurrentConsumers",
            reason: "must be at least 1".into(),
        });
    }
    if let Some(max) = settings.max_concurrent_consumers
        && max < settings.concurrent_consumers
    {
        return Err(RabbitError::InvalidOption {
            option: "maxConcurrentConsumers",
            reason: format!(
                "must not be lower than concurrentConsumers ({})",
                settings.concurrent_consumers
            ),
        });
    }
    Ok(())
}

/// Declares the exchange, the queues with their bindings and the dead letter
/// topology.
async fn declare(connector: &dyn AmqpConnector, settings: &RabbitSettings) -> RabbitResult<()> {
    let tolerate = |what: String, result: Result<(), BoxError>| match result {
        Ok(()) => Ok(()),
        Err(e) if settings.ignore_declaration_exceptions => {
            warn!(error = %e, "Failed to declare {what}, ignoring");
            Ok(())
        }
        Err(source) => Err(RabbitError::Declaration { what, source }),
    };

    let exchange = settings.exchange_name.as_str();
    tolerate(
        format!("exchange '{exchange}'"),
        connector.declare_exchange(exchange, settings.exchange_type).await,
    )?;

    let dead_letter = settings.dead_letter.as_ref();
    if let Some(dlx) = dead_letter {
        tolerate(
            format!("exchange '{}'", dlx.exchange),
            connector.declare_exchange(&dlx.exchange, dlx.exchange_type).await,
        )?;
        if let Some(queue) = &dlx.queue {
            tolerate(format!("queue '{queue}'"), connector.declare_queue(queue, None).await)?;
            let key = dlx.routing_key.as_deref().unwrap_or(queue);
            tolerate(
                format!("binding '{queue}' -> '{}'", dlx.exchange),
                connector.bind_queue(queue, &dlx.exchange, key).await,
            )?;
        }
    }

    let routing_key = settings.routing_key.as_deref().unwrap_or("");
    for queue in &settings.queues {
        tolerate(
            format!("queue '{queue}'"),
            connector
                .declare_queue(queue, dead_letter.map(|dlx| dlx.exchange.as_str()))
                .await,
        )?;
        tolerate(
            format!("binding '{queue}' -> '{exchange}'"),
            connector.bind_queue(queue, exchange, routing_key).await,
        )?;
    }

    debug!(exchange, queues = settings.queues.len(), "Topology declared");
    Ok(())
}
