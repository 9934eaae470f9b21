//! Factory and endpoint traits at the runtime boundary.
//!
//! A [`ComponentFactory`] turns a [`BoundConfiguration`] into a live
//! [`Endpoint`]: a queue consumer, a file poller, an API client. What an
//! endpoint actually does is the component's business; Conflux only hands it
//! out wrapped in an [`EndpointHandle`] and asks it to shut down.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use uuid::Uuid;

use crate::bound::BoundConfiguration;
use crate::error::BoxError;

/// A live endpoint created by a component factory.
#[async_trait]
pub trait Endpoint: Send + Sync {
    /// Endpoint URI for logs, e.g. `aws2-kinesis:orders`.
    fn uri(&self) -> String;

    /// Releases the endpoint's resources.
    async fn shutdown(&self) -> Result<(), BoxError> {
        Ok(())
    }

    /// Returns a `&dyn Any` reference for downcasting to the concrete endpoint type.
    fn as_any(&self) -> &dyn Any;
}

/// Creates endpoints from bound configurations.
#[async_trait]
pub trait ComponentFactory: Send + Sync {
    /// Builds an endpoint. May perform I/O (connecting, authenticating).
    async fn create(&self, config: BoundConfiguration) -> FactoryResult;
}

/// Result of [`ComponentFactory::create`].
pub type FactoryResult = Result<Box<dyn Endpoint>, BoxError>;

/// A shared factory trait object.
pub type BoxedFactory = Arc<dyn ComponentFactory>;

/// Adapts an async closure into a [`ComponentFactory`].
///
/// ```rust,ignore
/// let factory = factory_fn(|config: BoundConfiguration| async move {
///     Ok(Box::new(LogEndpoint::new(config)) as Box<dyn Endpoint>)
/// });
/// ```
pub fn factory_fn<F, Fut>(f: F) -> BoxedFactory
where
    F: Fn(BoundConfiguration) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = FactoryResult> + Send + 'static,
{
    Arc::new(FnFactory {
        f: move |config: BoundConfiguration| -> BoxFuture<'static, FactoryResult> {
            Box::pin(f(config))
        },
    })
}

struct FnFactory<F> {
    f: F,
}

#[async_trait]
impl<F> ComponentFactory for FnFactory<F>
where
    F: Fn(BoundConfiguration) -> BoxFuture<'static, FactoryResult> + Send + Sync,
{
    async fn create(&self, config: BoundConfiguration) -> FactoryResult {
        (self.f)(config).await
    }
}

/// Caller-owned handle to an activated endpoint.
///
/// Dropping the handle does not shut the endpoint down; call
/// [`shutdown`](Self::shutdown) explicitly.
pub struct EndpointHandle {
    id: Uuid,
    component_id: String,
    endpoint: Box<dyn Endpoint>,
}

impl EndpointHandle {
    /// Wraps a freshly created endpoint.
    pub fn new(component_id: impl Into<String>, endpoint: Box<dyn Endpoint>) -> Self {
        Self {
            id: Uuid::new_v4(),
            component_id: component_id.into(),
            endpoint,
        }
    }

    /// Unique id of this activation.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Identifier of the component that created the endpoint.
    pub fn component_id(&self) -> &str {
        &self.component_id
    }

    /// Endpoint URI.
    pub fn uri(&self) -> String {
        self.endpoint.uri()
    }

    /// Returns the endpoint trait object.
    pub fn endpoint(&self) -> &dyn Endpoint {
        self.endpoint.as_ref()
    }

    /// Attempts to downcast the endpoint to its concrete type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.endpoint.as_any().downcast_ref::<T>()
    }

    /// Shuts the endpoint down, consuming the handle.
    pub async fn shutdown(self) -> Result<(), BoxError> {
        self.endpoint.shutdown().await
    }
}

impl fmt::Debug for EndpointHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointHandle")
            .field("id", &self.id)
            .field("component_id", &self.component_id)
            .field("uri", &self.endpoint.uri())
            .finish()
    }
}
