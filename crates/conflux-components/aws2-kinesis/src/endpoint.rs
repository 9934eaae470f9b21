//! Kinesis consumer endpoint and its factory.

use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use conflux_core::{
    BoundConfiguration, BoxError, BoxedFactory, ComponentFactory, Endpoint, FactoryResult,
    FromBound,
};
use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::client::KinesisClient;
use crate::error::{KinesisError, KinesisResult};
use crate::settings::{KinesisSettings, ShardClosedStrategy};

/// Upper bound of records Kinesis returns per `GetRecords` call.
const MAX_RECORDS_PER_REQUEST: i32 = 10_000;

// =============================================================================
// Factory
// =============================================================================

/// Creates [`KinesisEndpoint`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct KinesisFactory;

impl KinesisFactory {
    /// Returns the factory as a shared trait object.
    pub fn boxed() -> BoxedFactory {
        Arc::new(Self)
    }
}

#[async_trait]
impl ComponentFactory for KinesisFactory {
    async fn create(&self, config: BoundConfiguration) -> FactoryResult {
        let endpoint = KinesisEndpoint::start(&config).await?;
        Ok(Box::new(endpoint))
    }
}

// =============================================================================
// Endpoint
// =============================================================================

#[derive(Debug, Default)]
struct ShardState {
    shards: RwLock<Vec<String>>,
    failed: AtomicBool,
}

impl ShardState {
    /// Applies a fresh shard listing and returns the shards that disappeared.
    fn refresh(&self, open: &[String], follow_new: bool) -> Vec<String> {
        let mut shards = self.shards.write();
        let (kept, closed): (Vec<String>, Vec<String>) =
            shards.drain(..).partition(|shard| open.contains(shard));
        *shards = kept;

        if follow_new {
            for shard in open {
                if !shards.contains(shard) {
                    info!(shard = %shard, "New shard discovered");
                    shards.push(shard.clone());
                }
            }
        }
        closed
    }
}

/// A consumer bound to one Kinesis stream.
///
/// On start the endpoint lists the stream's shards and, unless disabled,
/// keeps a background task refreshing that list every
/// `shardMonitorInterval`.
pub struct KinesisEndpoint {
    settings: KinesisSettings,
    client: KinesisClient,
    state: Arc<ShardState>,
    monitor: Mutex<Option<JoinHandle<()>>>,
}

impl KinesisEndpoint {
    /// Validates the configuration, lists the shards and starts the monitor.
    pub async fn start(config: &BoundConfiguration) -> KinesisResult<Self> {
        let settings = KinesisSettings::from_bound(config)?;
        if !(1..=MAX_RECORDS_PER_REQUEST).contains(&settings.max_results_per_request) {
            return Err(KinesisError::InvalidOption {
                option: "maxResultsPerRequest",
                reason: "must be between 1 and 10000",
            });
        }

        let client = config
            .try_object::<KinesisClient>("amazonKinesisClient")?
            .ok_or(KinesisError::MissingClient)?;
        let client = KinesisClient::clone(&client);

        let open = client
            .list_shards(&settings.stream_name)
            .await
            .map_err(KinesisError::Client)?;

        let shards = match &settings.shard_id {
            Some(shard) if !open.contains(shard) => {
                return Err(KinesisError::UnknownShard {
                    stream: settings.stream_name.clone(),
                    shard: shard.clone(),
                });
            }
            Some(shard) => vec![shard.clone()],
            None => open,
        };
        debug!(stream = %settings.stream_name, shards = ?shards, "Shards selected");

        let state = Arc::new(ShardState {
            shards: RwLock::new(shards),
            failed: AtomicBool::new(false),
        });

        let monitor = settings.shard_monitor_interval.map(|every| {
            tokio::spawn(monitor_shards(
                client.clone(),
                settings.clone(),
                every,
                Arc::clone(&state),
            ))
        });

        info!(
            stream = %settings.stream_name,
            iterator = %settings.iterator_type,
            "Kinesis consumer started"
        );

        Ok(Self {
            settings,
            client,
            state,
            monitor: Mutex::new(monitor),
        })
    }

    /// The settings the endpoint was created with.
    pub fn settings(&self) -> &KinesisSettings {
        &self.settings
    }

    /// The client used by the endpoint.
    pub fn client(&self) -> &KinesisClient {
        &self.client
    }

    /// Shards currently consumed.
    pub fn shards(&self) -> Vec<String> {
        self.state.shards.read().clone()
    }

    /// Returns `true` once a closed shard stopped the endpoint (`shardClosed = fail`).
    pub fn is_failed(&self) -> bool {
        self.state.failed.load(Ordering::Acquire)
    }
}

#[async_trait]
impl Endpoint for KinesisEndpoint {
    fn uri(&self) -> String {
        format!("aws2-kinesis:{}", self.settings.stream_name)
    }

    async fn shutdown(&self) -> Result<(), BoxError> {
        if let Some(monitor) = self.monitor.lock().take() {
            monitor.abort();
        }
        info!(stream = %self.settings.stream_name, "Kinesis consumer stopped");
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

async fn monitor_shards(
    client: KinesisClient,
    settings: KinesisSettings,
    every: Duration,
    state: Arc<ShardState>,
) {
    let stream = settings.stream_name.as_str();
    let follow_new = settings.shard_id.is_none();

    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        ticker.tick().await;

        let open = match client.list_shards(stream).await {
            Ok(open) => open,
            Err(e) => {
                warn!(stream, error = %e, "Failed to refresh shard list");
                continue;
            }
        };

        for shard in state.refresh(&open, follow_new) {
            match settings.shard_closed {
                ShardClosedStrategy::Ignore => {
                    warn!(stream, shard = %shard, "Shard closed, ignoring it");
                }
                ShardClosedStrategy::Silent => {
                    debug!(stream, shard = %shard, "Shard closed");
                }
                ShardClosedStrategy::Fail => {
                    error!(stream, shard = %shard, "Shard closed, stopping consumer");
                    state.failed.store(true, Ordering::Release);
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use conflux_core::{
        BeanRegistry, ComponentError, ComponentRegistry, EndpointHandle, NoObjects, RawValues,
    };
    use parking_lot::Mutex;

    use super::*;
    use crate::client::KinesisApi;

    #[derive(Clone, Default)]
    struct FakeKinesis {
        shards: Arc<Mutex<Vec<String>>>,
    }

    impl FakeKinesis {
        fn with_shards(shards: &[&str]) -> Self {
            let fake = Self::default();
            fake.set(shards);
            fake
        }

        fn set(&self, shards: &[&str]) {
            *self.shards.lock() = shards.iter().map(|s| s.to_string()).collect();
        }
    }

    #[async_trait]
    impl KinesisApi for FakeKinesis {
        async fn list_shards(&self, _stream: &str) -> Result<Vec<String>, BoxError> {
            Ok(self.shards.lock().clone())
        }
    }

    fn registry() -> ComponentRegistry {
        ComponentRegistry::builder()
            .register_descriptor(&crate::AWS2_KINESIS)
            .unwrap()
            .build()
    }

    fn raw(yaml: &str) -> RawValues {
        let map: std::collections::BTreeMap<String, serde_yaml::Value> =
            serde_yaml::from_str(yaml).unwrap();
        map.into_iter()
            .map(|(key, value)| {
                let text = match value {
                    serde_yaml::Value::String(s) => s,
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    serde_yaml::Value::Number(n) => n.to_string(),
                    other => panic!("unexpected value {other:?}"),
                };
                (key, text.into())
            })
            .collect()
    }

    async fn activate(yaml: &str, fake: &FakeKinesis) -> Result<EndpointHandle, ComponentError> {
        let beans = BeanRegistry::new().with("kinesis", KinesisClient::new(fake.clone()));
        registry().activate("aws2-kinesis", &raw(yaml), &beans).await
    }

    #[test]
    fn test_consume_single_shard() {
        let fake = FakeKinesis::with_shards(&["shardId-000000000000", "shardId-000000000001"]);
        let handle = tokio_test::block_on(activate(
            r#"
stream-name: orders
shardId: shardId-000000000001
iteratorType: LATEST
shardMonitorInterval: 0
"#,
            &fake,
        ))
        .unwrap();

        assert_eq!(handle.uri(), "aws2-kinesis:orders");
        let endpoint = handle.downcast_ref::<KinesisEndpoint>().unwrap();
        assert_eq!(endpoint.shards(), vec!["shardId-000000000001".to_string()]);
        assert_eq!(endpoint.settings().iterator_type.as_str(), "LATEST");
        tokio_test::block_on(handle.shutdown()).unwrap();
    }

    #[test]
    fn test_unknown_shard_fails_activation() {
        let fake = FakeKinesis::with_shards(&["shardId-000000000000"]);
        let err = tokio_test::block_on(activate(
            "streamName: orders\nshardId: shardId-000000000009\n",
            &fake,
        ))
        .unwrap_err();

        assert!(matches!(err, ComponentError::Activation { .. }));
        assert!(err.to_string().contains("aws2-kinesis"));
    }

    #[test]
    fn test_missing_client() {
        let err = tokio_test::block_on(registry().activate(
            "aws2-kinesis",
            &raw("streamName: orders\n"),
            &NoObjects,
        ))
        .unwrap_err();

        let ComponentError::Activation { source, .. } = err else {
            panic!("expected activation error");
        };
        assert!(matches!(
            source.downcast_ref::<KinesisError>(),
            Some(KinesisError::MissingClient)
        ));
    }

    #[test]
    fn test_max_results_range() {
        let fake = FakeKinesis::with_shards(&["a"]);
        let err = tokio_test::block_on(activate(
            "streamName: orders\nmaxResultsPerRequest: 0\n",
            &fake,
        ))
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "failed to activate component 'aws2-kinesis': \
             option 'maxResultsPerRequest' must be between 1 and 10000"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_monitor_follows_shards() {
        let fake = FakeKinesis::with_shards(&["a", "b"]);
        let handle = activate("streamName: orders\nshardMonitorInterval: 100\n", &fake)
            .await
            .unwrap();

        fake.set(&["b", "c"]);
        tokio::time::sleep(Duration::from_millis(150)).await;

        let endpoint = handle.downcast_ref::<KinesisEndpoint>().unwrap();
        assert_eq!(endpoint.shards(), vec!["b".to_string(), "c".to_string()]);
        assert!(!endpoint.is_failed());
        handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_shard_fails_endpoint() {
        let fake = FakeKinesis::with_shards(&["a"]);
        let handle = activate(
            "streamName: orders\nshardId: a\nshardClosed: fail\nshardMonitorInterval: 100\n",
            &fake,
        )
        .await
        .unwrap();

        fake.set(&[]);
        tokio::time::sleep(Duration::from_millis(150)).await;

        let endpoint = handle.downcast_ref::<KinesisEndpoint>().unwrap();
        assert!(endpoint.is_failed());
        assert!(endpoint.shards().is_empty());
        handle.shutdown().await.unwrap();
    }
}
