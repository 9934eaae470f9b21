//! External object references and their resolution.
//!
//! Some options do not hold text at all but a pre-built object: an SDK client,
//! a connection factory, a message converter. Those objects are constructed
//! outside of Conflux and handed to the binder through an [`ObjectResolver`],
//! which is always passed explicitly to `bind`/`activate`.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

/// Prefixes accepted in front of bean names in text values (`#bean:client`, `#client`).
const BEAN_PREFIXES: [&str; 2] = ["#bean:", "#"];

/// A shared, type-erased reference to an external object.
///
/// The type name is taken from the last path segment of the Rust type
/// (`aws::KinesisClient` → `KinesisClient`), which is what object options
/// declare in their [`OptionKind::Object`](crate::OptionKind::Object).
/// Two types sharing that segment pass the same option check; the concrete
/// type is only verified on downcast, see
/// [`BoundConfiguration::try_object`](crate::BoundConfiguration::try_object).
#[derive(Clone)]
pub struct ObjectRef {
    type_name: String,
    rust_type: &'static str,
    value: Arc<dyn Any + Send + Sync>,
}

impl ObjectRef {
    /// Wraps a value, deriving the type name from `T`.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self::from_arc(Arc::new(value))
    }

    /// Wraps an already shared value.
    pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self {
            type_name: short_type_name::<T>().to_string(),
            rust_type: std::any::type_name::<T>(),
            value,
        }
    }

    /// Wraps a value under an explicit type name.
    pub fn with_type_name<T: Any + Send + Sync>(type_name: impl Into<String>, value: T) -> Self {
        Self {
            type_name: type_name.into(),
            rust_type: std::any::type_name::<T>(),
            value: Arc::new(value),
        }
    }

    /// Returns the declared type name.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Returns the full path of the concrete Rust type.
    pub fn rust_type_name(&self) -> &'static str {
        self.rust_type
    }

    /// Returns `true` if this reference was registered under `type_name`.
    pub fn is_type(&self, type_name: &str) -> bool {
        self.type_name == type_name
    }

    /// Attempts to downcast to the concrete type.
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.value).downcast::<T>().ok()
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectRef")
            .field("type_name", &self.type_name)
            .field("rust_type", &self.rust_type)
            .finish_non_exhaustive()
    }
}

fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    // Generic arguments may contain `::` themselves; only look before them.
    let head = full.split('<').next().unwrap_or(full);
    head.rsplit("::").next().unwrap_or(head)
}

/// Strips the optional bean prefix from a text reference.
pub fn bean_name(text: &str) -> &str {
    BEAN_PREFIXES
        .iter()
        .find_map(|prefix| text.strip_prefix(prefix))
        .unwrap_or(text)
}

// =============================================================================
// ObjectResolver
// =============================================================================

/// Lookup of external objects by name or by type.
pub trait ObjectResolver: Send + Sync {
    /// Returns the object registered under `name`.
    fn lookup(&self, name: &str) -> Option<ObjectRef>;

    /// Returns every object registered with the given type name.
    fn find_by_type(&self, type_name: &str) -> Vec<ObjectRef>;
}

/// A resolver that knows no objects.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoObjects;

impl ObjectResolver for NoObjects {
    fn lookup(&self, _name: &str) -> Option<ObjectRef> {
        None
    }

    fn find_by_type(&self, _type_name: &str) -> Vec<ObjectRef> {
        Vec::new()
    }
}

impl<R: ObjectResolver + ?Sized> ObjectResolver for Arc<R> {
    fn lookup(&self, name: &str) -> Option<ObjectRef> {
        (**self).lookup(name)
    }

    fn find_by_type(&self, type_name: &str) -> Vec<ObjectRef> {
        (**self).find_by_type(type_name)
    }
}

// =============================================================================
// BeanRegistry
// =============================================================================

/// A named object store usable as an [`ObjectResolver`].
///
/// # Example
///
/// ```rust,ignore
/// let beans = BeanRegistry::new();
/// beans.insert("kinesisClient", KinesisClient::new(region));
///
/// // Option value "#bean:kinesisClient" now resolves to the client.
/// ```
#[derive(Default)]
pub struct BeanRegistry {
    beans: RwLock<HashMap<String, ObjectRef>>,
}

impl BeanRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a value under `name`, replacing any previous bean of that name.
    pub fn insert<T: Any + Send + Sync>(&self, name: impl Into<String>, value: T) {
        self.insert_ref(name, ObjectRef::new(value));
    }

    /// Registers an existing object reference under `name`.
    pub fn insert_ref(&self, name: impl Into<String>, object: ObjectRef) {
        let name = name.into();
        debug!(bean = %name, type_name = object.type_name(), "Registered bean");
        self.beans.write().insert(name, object);
    }

    /// Builder-style variant of [`insert`](Self::insert).
    pub fn with<T: Any + Send + Sync>(self, name: impl Into<String>, value: T) -> Self {
        self.insert(name, value);
        self
    }

    /// Removes the bean registered under `name`.
    pub fn remove(&self, name: &str) -> Option<ObjectRef> {
        self.beans.write().remove(name)
    }

    /// Returns the number of registered beans.
    pub fn len(&self) -> usize {
        self.beans.read().len()
    }

    /// Returns `true` if no beans are registered.
    pub fn is_empty(&self) -> bool {
        self.beans.read().is_empty()
    }
}

impl ObjectResolver for BeanRegistry {
    fn lookup(&self, name: &str) -> Option<ObjectRef> {
        self.beans.read().get(name).cloned()
    }

    fn find_by_type(&self, type_name: &str) -> Vec<ObjectRef> {
        self.beans
            .read()
            .values()
            .filter(|obj| obj.is_type(type_name))
            .cloned()
            .collect()
    }
}

impl fmt::Debug for BeanRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let beans = self.beans.read();
        let mut names: Vec<_> = beans.keys().collect();
        names.sort();
        f.debug_struct("BeanRegistry").field("beans", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct KinesisClient {
        region: &'static str,
    }

    #[test]
    fn test_type_name_is_last_segment() {
        let obj = ObjectRef::new(KinesisClient { region: "eu-west-1" });
        assert_eq!(obj.type_name(), "KinesisClient");
        assert!(obj.rust_type_name().ends_with("tests::KinesisClient"));
        assert_eq!(obj.downcast::<KinesisClient>().unwrap().region, "eu-west-1");
        assert!(obj.downcast::<String>().is_none());
    }

    #[test]
    fn test_bean_name_prefixes() {
        assert_eq!(bean_name("#bean:client"), "client");
        assert_eq!(bean_name("#client"), "client");
        assert_eq!(bean_name("client"), "client");
    }

    #[test]
    fn test_bean_registry_lookup() {
        let beans = BeanRegistry::new()
            .with("primary", KinesisClient { region: "a" })
            .with("secondary", KinesisClient { region: "b" })
            .with("name", String::from("x"));

        assert!(beans.lookup("primary").is_some());
        assert!(beans.lookup("missing").is_none());
        assert_eq!(beans.find_by_type("KinesisClient").len(), 2);
        assert_eq!(beans.find_by_type("String").len(), 1);
        assert_eq!(beans.len(), 3);
    }
}
