//! Runtime orchestration: configuration in, live endpoints out.
//!
//! The runtime loads the layered configuration, builds the component
//! registry, and activates one endpoint per enabled `components.<id>`
//! section. Startup is all-or-nothing.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use conflux_runtime::ConfluxRuntime;
//!
//! let runtime = ConfluxRuntime::builder()
//!     .config_file("conflux.toml")
//!     .bean("kinesisClient", KinesisClient::from_env().await)
//!     .build()?;
//!
//! // Activates every section, waits for Ctrl+C or SIGTERM, shuts down.
//! runtime.run().await?;
//! ```

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use conflux_core::{
    BeanRegistry, ComponentError, ComponentRegistry, EndpointHandle, RawValues, RegistryBuilder,
    SchemaError, UnknownKeyPolicy,
};
use futures::future::join_all;
use serde::Serialize;
use tokio::signal;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::{
    ComponentSection, ConfigLoader, ConfluxConfig, component_sections, validate_config,
};
use crate::error::{RuntimeError, RuntimeResult};
use crate::logging;

#[derive(Default)]
struct RuntimeState {
    running: bool,
    endpoints: Vec<EndpointHandle>,
    skipped: usize,
}

/// Owns the registry, the bean registry and the activated endpoints.
pub struct ConfluxRuntime {
    config: ConfluxConfig,
    registry: Arc<ComponentRegistry>,
    beans: Arc<BeanRegistry>,
    state: Mutex<RuntimeState>,
}

impl ConfluxRuntime {
    /// Creates a runtime builder.
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Assembles a runtime from already built parts.
    ///
    /// Does not validate the configuration or initialize logging.
    pub fn from_parts(config: ConfluxConfig, registry: ComponentRegistry, beans: BeanRegistry) -> Self {
        Self {
            config,
            registry: Arc::new(registry),
            beans: Arc::new(beans),
            state: Mutex::new(RuntimeState::default()),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ConfluxConfig {
        &self.config
    }

    /// Returns the component registry.
    pub fn registry(&self) -> &Arc<ComponentRegistry> {
        &self.registry
    }

    /// Returns the bean registry used to resolve object options.
    pub fn beans(&self) -> &Arc<BeanRegistry> {
        &self.beans
    }

    /// Returns whether the runtime is running.
    pub async fn is_running(&self) -> bool {
        self.state.lock().await.running
    }

    /// Activates a single component outside of the configured sections.
    ///
    /// The caller owns the returned handle.
    pub async fn activate(&self, component: &str, raw: &RawValues) -> RuntimeResult<EndpointHandle> {
        Ok(self
            .registry
            .activate(component, raw, self.beans.as_ref())
            .await?)
    }

    /// Sections that should be activated, in id order.
    fn pending_sections(&self) -> RuntimeResult<(Vec<ComponentSection>, usize)> {
        let mut pending = Vec::new();
        let mut skipped = 0;

        for section in component_sections(&self.config)? {
            if !section.is_enabled() {
                info!(component = section.id(), "Component disabled, skipping");
                skipped += 1;
                continue;
            }
            if !self.registry.contains(section.id()) {
                if self.registry.binder().unknown_keys() == UnknownKeyPolicy::Strict {
                    return Err(SchemaError::UnknownComponent(section.id().to_string()).into());
                }
                warn!(
                    component = section.id(),
                    "No component registered for configuration section, skipping"
                );
                skipped += 1;
                continue;
            }
            pending.push(section);
        }
        Ok((pending, skipped))
    }

    /// Activates every enabled component section concurrently.
    ///
    /// If any activation fails, the endpoints already created are shut down
    /// and the first error (in section order) is returned.
    pub async fn start(&self) -> RuntimeResult<()> {
        let mut state = self.state.lock().await;
        if state.running {
            return Err(RuntimeError::AlreadyRunning);
        }

        let (sections, skipped) = self.pending_sections()?;
        info!(components = sections.len(), "Starting Conflux runtime");

        let resolver = self.beans.as_ref();
        let results = join_all(
            sections
                .iter()
                .map(|section| self.registry.activate(section.id(), section.values(), resolver)),
        )
        .await;

        let mut endpoints = Vec::with_capacity(results.len());
        let mut failure: Option<ComponentError> = None;
        for result in results {
            match result {
                Ok(handle) => endpoints.push(handle),
                Err(e) => {
                    error!(error = %e, "Component activation failed");
                    failure.get_or_insert(e);
                }
            }
        }

        if let Some(e) = failure {
            warn!(
                active = endpoints.len(),
                "Startup aborted, shutting down activated endpoints"
            );
            shutdown_all(endpoints).await;
            return Err(e.into());
        }

        state.running = true;
        state.skipped = skipped;
        state.endpoints = endpoints;
        info!(active = state.endpoints.len(), skipped, "Runtime started");
        Ok(())
    }

    /// Shuts every endpoint down. Shutdown failures are logged, not returned.
    pub async fn stop(&self) -> RuntimeResult<()> {
        let endpoints = {
            let mut state = self.state.lock().await;
            if !state.running {
                warn!("Runtime is not running");
                return Ok(());
            }
            state.running = false;
            std::mem::take(&mut state.endpoints)
        };

        info!(active = endpoints.len(), "Stopping Conflux runtime");
        shutdown_all(endpoints).await;
        info!("Runtime stopped");
        Ok(())
    }

    /// Runs the runtime until Ctrl+C or SIGTERM.
    pub async fn run(&self) -> RuntimeResult<()> {
        self.start().await?;
        info!("Conflux runtime is now running. Press Ctrl+C to stop.");

        let waited = wait_for_shutdown().await;
        self.stop().await?;
        waited
    }

    /// Runs the runtime until `shutdown` completes.
    pub async fn run_until<F>(&self, shutdown: F) -> RuntimeResult<()>
    where
        F: Future<Output = ()>,
    {
        self.start().await?;
        shutdown.await;
        self.stop().await
    }

    /// Calls `f` with the first active endpoint of `component`.
    pub async fn with_endpoint<R>(
        &self,
        component: &str,
        f: impl FnOnce(&EndpointHandle) -> R,
    ) -> Option<R> {
        let state = self.state.lock().await;
        let normalized = conflux_core::normalize_key(component);
        state
            .endpoints
            .iter()
            .find(|h| conflux_core::normalize_key(h.component_id()) == normalized)
            .map(f)
    }

    /// Downcasts the endpoint of `component` and calls `f` with it.
    pub async fn with_endpoint_as<T: Any, R>(
        &self,
        component: &str,
        f: impl FnOnce(&T) -> R,
    ) -> Option<R> {
        self.with_endpoint(component, |handle| handle.downcast_ref::<T>().map(f))
            .await
            .flatten()
    }

    /// Returns statistics about the runtime.
    pub async fn stats(&self) -> RuntimeStats {
        let state = self.state.lock().await;
        RuntimeStats {
            registered: self.registry.len(),
            active: state.endpoints.len(),
            skipped: state.skipped,
            running: state.running,
        }
    }
}

async fn shutdown_all(endpoints: Vec<EndpointHandle>) {
    join_all(endpoints.into_iter().map(|handle| async move {
        let component = handle.component_id().to_string();
        let uri = handle.uri();
        match handle.shutdown().await {
            Ok(()) => debug!(component, uri, "Endpoint shut down"),
            Err(e) => error!(component, uri, error = %e, "Error during endpoint shutdown"),
        }
    }))
    .await;
}

/// Waits for Ctrl+C or SIGTERM.
async fn wait_for_shutdown() -> RuntimeResult<()> {
    #[cfg(unix)]
    {
        let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;
        tokio::select! {
            result = signal::ctrl_c() => {
                result?;
                info!("Received Ctrl+C, shutting down");
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down");
            }
        }
    }

    #[cfg(not(unix))]
    {
        signal::ctrl_c().await?;
        info!("Received Ctrl+C, shutting down");
    }

    Ok(())
}

/// Statistics about the runtime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RuntimeStats {
    /// Number of registered components.
    pub registered: usize,
    /// Number of active endpoints.
    pub active: usize,
    /// Sections skipped because they were disabled or unknown.
    pub skipped: usize,
    /// Whether the runtime is running.
    pub running: bool,
}

impl fmt::Display for RuntimeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Components: {} registered, {} active, {} skipped ({})",
            self.registered,
            self.active,
            self.skipped,
            if self.running { "running" } else { "stopped" }
        )
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for [`ConfluxRuntime`].
///
/// Without an explicit registry, every component linked into the binary is
/// registered. The `binding` section of the configuration always decides the
/// binder policy and activation timeout.
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
    config: Option<ConfluxConfig>,
    registry: Option<RegistryBuilder>,
    beans: BeanRegistry,
    init_logging: bool,
}

impl RuntimeBuilder {
    /// Creates a builder loading configuration from the current directory.
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new().with_current_dir(),
            config: None,
            registry: None,
            beans: BeanRegistry::new(),
            init_logging: true,
        }
    }

    /// Sets a specific configuration file to load.
    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile (e.g., "development", "production").
    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Overrides a single configuration value by dotted key path.
    pub fn set<T: Serialize>(mut self, key: &str, value: T) -> Self {
        self.config_loader = self.config_loader.set(key, value);
        self
    }

    /// Uses an already loaded configuration instead of the loader.
    pub fn config(mut self, config: ConfluxConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Uses a custom set of components instead of the linked ones.
    pub fn registry(mut self, registry: RegistryBuilder) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Registers a bean for object options.
    pub fn bean<T: Any + Send + Sync>(self, name: impl Into<String>, value: T) -> Self {
        self.beans.insert(name, value);
        self
    }

    /// Replaces the bean registry.
    pub fn beans(mut self, beans: BeanRegistry) -> Self {
        self.beans = beans;
        self
    }

    /// Leaves the global `tracing` subscriber alone.
    pub fn without_logging(mut self) -> Self {
        self.init_logging = false;
        self
    }

    /// Loads and validates the configuration, then builds the runtime.
    pub fn build(self) -> RuntimeResult<ConfluxRuntime> {
        let config = match self.config {
            Some(config) => config,
            None => self.config_loader.load()?,
        };
        validate_config(&config)?;

        if self.init_logging {
            logging::init_from_config(&config.logging);
        }

        let mut registry = match self.registry {
            Some(registry) => registry,
            None => RegistryBuilder::new().with_linked_components()?,
        };
        registry = registry.binder(config.binding.binder());
        if let Some(timeout) = config.binding.activation_timeout() {
            registry = registry.activation_timeout(timeout);
        }

        info!(
            log_level = %config.logging.level,
            unknown_keys = %config.binding.unknown_keys,
            sections = config.components.len(),
            "Runtime initialized from configuration"
        );

        Ok(ConfluxRuntime::from_parts(config, registry.build(), self.beans))
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use conflux_core::{
        BoundConfiguration, BoxError, Endpoint, OptionDescriptor, async_trait, factory_fn,
    };
    use serde_json::json;

    use super::*;

    struct Consumer {
        queue: String,
        client: Option<Arc<FakeClient>>,
        shutdowns: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Endpoint for Consumer {
        fn uri(&self) -> String {
            format!("queue:{}", self.queue)
        }

        async fn shutdown(&self) -> Result<(), BoxError> {
            self.shutdowns.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    struct FakeClient;

    fn registry(shutdowns: &Arc<AtomicUsize>) -> RegistryBuilder {
        let counter = Arc::clone(shutdowns);
        RegistryBuilder::new()
            .register_options(
                "queue",
                [
                    OptionDescriptor::string("name").required(),
                    OptionDescriptor::object("client", "FakeClient").autowired(),
                ],
                factory_fn(move |config: BoundConfiguration| {
                    let shutdowns = Arc::clone(&counter);
                    async move {
                        Ok(Box::new(Consumer {
                            queue: config.string("name").unwrap_or_default().to_string(),
                            client: config.object::<FakeClient>("client"),
                            shutdowns,
                        }) as Box<dyn Endpoint>)
                    }
                }),
            )
            .unwrap()
            .register_options(
                "broken",
                [],
                factory_fn(|_| async { Err::<Box<dyn Endpoint>, BoxError>("no route to host".into()) }),
            )
            .unwrap()
    }

    fn config(components: serde_json::Value) -> ConfluxConfig {
        ConfluxConfig {
            components: serde_json::from_value(components).unwrap(),
            ..Default::default()
        }
    }

    fn runtime(components: serde_json::Value, shutdowns: &Arc<AtomicUsize>) -> ConfluxRuntime {
        ConfluxRuntime::builder()
            .config(config(components))
            .registry(registry(shutdowns))
            .bean("client", FakeClient)
            .without_logging()
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_start_activates_enabled_sections() {
        let shutdowns = Arc::new(AtomicUsize::new(0));
        let runtime = runtime(
            json!({
                "queue": { "name": "orders" },
                "broken": { "enabled": false },
            }),
            &shutdowns,
        );

        runtime.start().await.unwrap();
        assert!(runtime.is_running().await);

        let stats = runtime.stats().await;
        assert_eq!(stats.registered, 2);
        assert_eq!(stats.active, 1);
        assert_eq!(stats.skipped, 1);

        let (uri, autowired) = runtime
            .with_endpoint_as::<Consumer, _>("queue", |c| (c.uri(), c.client.is_some()))
            .await
            .unwrap();
        assert_eq!(uri, "queue:orders");
        assert!(autowired);

        assert!(matches!(
            runtime.start().await,
            Err(RuntimeError::AlreadyRunning)
        ));

        runtime.stop().await.unwrap();
        assert!(!runtime.is_running().await);
        assert_eq!(shutdowns.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_startup_is_all_or_nothing() {
        let shutdowns = Arc::new(AtomicUsize::new(0));
        let runtime = runtime(
            json!({
                "queue": { "name": "orders" },
                "broken": {},
            }),
            &shutdowns,
        );

        let err = runtime.start().await.unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::Component(ComponentError::Activation { ref component, .. }) if component == "broken"
        ));
        assert!(!runtime.is_running().await);
        assert_eq!(runtime.stats().await.active, 0);
        assert_eq!(shutdowns.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_binding_errors_abort_startup() {
        let shutdowns = Arc::new(AtomicUsize::new(0));
        let runtime = runtime(json!({ "queue": {} }), &shutdowns);

        let err = runtime.start().await.unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::Component(ComponentError::Bind(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_sections() {
        let shutdowns = Arc::new(AtomicUsize::new(0));
        let runtime = runtime(json!({ "jms": { "queue": "a" } }), &shutdowns);
        runtime.start().await.unwrap();
        assert_eq!(runtime.stats().await.skipped, 1);

        let mut strict = config(json!({ "jms": { "queue": "a" } }));
        strict.binding.unknown_keys = UnknownKeyPolicy::Strict;
        let runtime = ConfluxRuntime::builder()
            .config(strict)
            .registry(registry(&shutdowns))
            .without_logging()
            .build()
            .unwrap();
        let err = runtime.start().await.unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::Component(ComponentError::Schema(SchemaError::UnknownComponent(_)))
        ));
    }

    #[tokio::test]
    async fn test_run_until() {
        let shutdowns = Arc::new(AtomicUsize::new(0));
        let runtime = runtime(json!({ "queue": { "name": "a" } }), &shutdowns);

        runtime.run_until(async {}).await.unwrap();
        assert!(!runtime.is_running().await);
        assert_eq!(shutdowns.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_manual_activation() {
        let shutdowns = Arc::new(AtomicUsize::new(0));
        let runtime = runtime(json!({}), &shutdowns);

        let raw = conflux_core::raw_values([("name", "audit")]);
        let handle = runtime.activate("queue", &raw).await.unwrap();
        assert_eq!(handle.uri(), "queue:audit");
        handle.shutdown().await.unwrap();
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = ConfluxConfig::default();
        config.binding.activation_timeout_ms = Some(0);
        let result = ConfluxRuntime::builder()
            .config(config)
            .registry(RegistryBuilder::new())
            .without_logging()
            .build();
        assert!(matches!(result, Err(RuntimeError::Config(_))));
    }

    #[test]
    fn test_stats_display() {
        let stats = RuntimeStats {
            registered: 3,
            active: 2,
            skipped: 1,
            running: true,
        };
        assert_eq!(
            stats.to_string(),
            "Components: 3 registered, 2 active, 1 skipped (running)"
        );
    }
}
