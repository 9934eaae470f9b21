//! Component registry and activation.
//!
//! The registry is filled once through a [`RegistryBuilder`] and frozen into a
//! [`ComponentRegistry`]. After that it is read-only: lookups, binding and
//! activation only read shared state, so a single `Arc<ComponentRegistry>` can
//! serve any number of concurrent activations without locking.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use tracing::{debug, info};

use crate::binder::{Binder, RawValues};
use crate::bound::BoundConfiguration;
use crate::descriptor::{ComponentDescriptor, linked_components};
use crate::endpoint::{BoxedFactory, EndpointHandle};
use crate::error::{
    ActivationTimeout, ComponentError, ComponentResult, SchemaError, SchemaResult,
};
use crate::key::normalize_key;
use crate::option::OptionDescriptor;
use crate::resolver::ObjectResolver;
use crate::schema::{ComponentKind, ComponentSchema};

struct RegistryEntry {
    schema: ComponentSchema,
    factory: BoxedFactory,
}

/// Builder for [`ComponentRegistry`].
///
/// # Example
///
/// ```rust,ignore
/// let registry = ComponentRegistry::builder()
///     .with_linked_components()?
///     .register(my_schema, my_factory)?
///     .binder(Binder::strict())
///     .activation_timeout(Duration::from_secs(10))
///     .build();
/// ```
#[derive(Default)]
pub struct RegistryBuilder {
    /// Normalized component id → entry.
    entries: BTreeMap<String, RegistryEntry>,
    binder: Binder,
    activation_timeout: Option<Duration>,
}

impl RegistryBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a component schema with its factory.
    ///
    /// Fails with [`SchemaError::DuplicateComponent`] if a component with the
    /// same (normalized) id is already registered.
    pub fn register(mut self, schema: ComponentSchema, factory: BoxedFactory) -> SchemaResult<Self> {
        let key = normalize_key(schema.id());
        if self.entries.contains_key(&key) {
            return Err(SchemaError::DuplicateComponent(schema.id().to_string()));
        }
        debug!(
            component = schema.id(),
            kind = %schema.kind(),
            options = schema.len(),
            "Registered component"
        );
        self.entries.insert(key, RegistryEntry { schema, factory });
        Ok(self)
    }

    /// Builds a schema from `options` and registers it.
    pub fn register_options(
        self,
        id: impl Into<String>,
        options: impl IntoIterator<Item = OptionDescriptor>,
        factory: BoxedFactory,
    ) -> SchemaResult<Self> {
        let schema = ComponentSchema::new(id, options)?;
        self.register(schema, factory)
    }

    /// Registers a static component descriptor.
    pub fn register_descriptor(self, descriptor: &ComponentDescriptor) -> SchemaResult<Self> {
        let schema = descriptor.schema()?;
        self.register(schema, descriptor.instantiate())
    }

    /// Registers every component linked into the binary.
    pub fn with_linked_components(mut self) -> SchemaResult<Self> {
        for descriptor in linked_components() {
            self = self.register_descriptor(descriptor)?;
        }
        Ok(self)
    }

    /// Sets the binder used by [`ComponentRegistry::bind`] and [`ComponentRegistry::activate`].
    pub fn binder(mut self, binder: Binder) -> Self {
        self.binder = binder;
        self
    }

    /// Bounds how long a factory may take to create an endpoint.
    pub fn activation_timeout(mut self, timeout: Duration) -> Self {
        self.activation_timeout = Some(timeout);
        self
    }

    /// Freezes the registry.
    pub fn build(self) -> ComponentRegistry {
        info!(components = self.entries.len(), "Component registry ready");
        ComponentRegistry {
            entries: self.entries,
            binder: self.binder,
            activation_timeout: self.activation_timeout,
        }
    }
}

/// Read-only map from component id to schema and factory.
///
/// Component ids are matched like option keys, so `aws2-kinesis` can also be
/// looked up as `aws2_kinesis` (the spelling environment variables produce).
pub struct ComponentRegistry {
    entries: BTreeMap<String, RegistryEntry>,
    binder: Binder,
    activation_timeout: Option<Duration>,
}

impl ComponentRegistry {
    /// Creates a registry builder.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    fn entry(&self, id: &str) -> SchemaResult<&RegistryEntry> {
        self.entries
            .get(&normalize_key(id))
            .ok_or_else(|| SchemaError::UnknownComponent(id.to_string()))
    }

    /// Returns the schema of a component.
    pub fn lookup(&self, id: &str) -> SchemaResult<&ComponentSchema> {
        self.entry(id).map(|e| &e.schema)
    }

    /// Returns `true` if the component is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(&normalize_key(id))
    }

    /// Number of registered components.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no component is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered schemas, ordered by normalized id.
    pub fn schemas(&self) -> impl Iterator<Item = &ComponentSchema> {
        self.entries.values().map(|e| &e.schema)
    }

    /// Declared ids of every registered component.
    pub fn component_ids(&self) -> Vec<&str> {
        self.schemas().map(ComponentSchema::id).collect()
    }

    /// Declared ids of the components of one catalog kind.
    pub fn names(&self, kind: ComponentKind) -> Vec<&str> {
        self.schemas()
            .filter(|s| s.kind() == kind)
            .map(ComponentSchema::id)
            .collect()
    }

    /// The binder in use.
    pub fn binder(&self) -> Binder {
        self.binder
    }

    /// The activation timeout, if any.
    pub fn activation_timeout(&self) -> Option<Duration> {
        self.activation_timeout
    }

    /// Binds raw values for a component without activating it.
    pub fn bind(
        &self,
        id: &str,
        raw: &RawValues,
        resolver: &dyn ObjectResolver,
    ) -> ComponentResult<BoundConfiguration> {
        let entry = self.entry(id)?;
        Ok(self.binder.bind(&entry.schema, raw, resolver)?)
    }

    /// Binds raw values and hands the result to the component factory.
    ///
    /// Schema and binding errors are returned unchanged. Factory failures and
    /// timeouts become [`ComponentError::Activation`] with the original cause
    /// as source. The registry itself is never modified.
    pub async fn activate(
        &self,
        id: &str,
        raw: &RawValues,
        resolver: &dyn ObjectResolver,
    ) -> ComponentResult<EndpointHandle> {
        let entry = self.entry(id)?;
        let config = self.binder.bind(&entry.schema, raw, resolver)?;
        let component = entry.schema.id();

        debug!(component, options = ?config.redacted_properties(), "Activating component");

        let create = entry.factory.create(config);
        let created = match self.activation_timeout {
            Some(limit) => tokio::time::timeout(limit, create)
                .await
                .map_err(|_| ComponentError::activation(component, ActivationTimeout(limit)))?,
            None => create.await,
        };
        let endpoint = created.map_err(|source| ComponentError::Activation {
            component: component.to_string(),
            source,
        })?;

        let handle = EndpointHandle::new(component, endpoint);
        info!(component, id = %handle.id(), uri = %handle.uri(), "Component activated");
        Ok(handle)
    }
}

impl fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("components", &self.component_ids())
            .field("binder", &self.binder)
            .field("activation_timeout", &self.activation_timeout)
            .finish()
    }
}
