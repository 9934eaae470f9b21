//! Bound configurations: the typed result of binding.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{BindError, REDACTED};
use crate::option::{OptionDescriptor, OptionKind, OptionValue};
use crate::schema::ComponentSchema;

/// Resolved option values of one component, in schema order.
///
/// Only options that were supplied, defaulted or autowired are present; an
/// optional option without a default stays absent. Every present value
/// matches the kind of its descriptor.
///
/// Lookups accept any spelling of the option name:
///
/// ```rust,ignore
/// let config = binder.bind(&schema, &raw, &NoObjects)?;
/// assert_eq!(config.int("max-results-per-request"), Some(5));
/// assert_eq!(config.enum_value("iteratorType"), Some("LATEST"));
/// ```
#[derive(Clone)]
pub struct BoundConfiguration {
    schema: ComponentSchema,
    /// Indexed like `schema.options()`.
    values: Vec<Option<OptionValue>>,
}

impl BoundConfiguration {
    pub(crate) fn new(schema: ComponentSchema, values: Vec<Option<OptionValue>>) -> Self {
        debug_assert_eq!(schema.len(), values.len());
        Self { schema, values }
    }

    /// Component identifier.
    pub fn component_id(&self) -> &str {
        self.schema.id()
    }

    /// The schema this configuration was bound against.
    pub fn schema(&self) -> &ComponentSchema {
        &self.schema
    }

    /// Returns the value of an option, if set.
    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.schema.index_of(key).and_then(|i| self.values[i].as_ref())
    }

    /// Returns `true` if the option has a value.
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Number of options with a value.
    pub fn len(&self) -> usize {
        self.values.iter().flatten().count()
    }

    /// Returns `true` if no option has a value.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates over set options in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&OptionDescriptor, &OptionValue)> {
        self.schema
            .options()
            .iter()
            .zip(&self.values)
            .filter_map(|(desc, value)| value.as_ref().map(|v| (desc, v)))
    }

    /// Value of a `bool` option.
    pub fn bool(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            OptionValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Value of an `int` option.
    pub fn int(&self, key: &str) -> Option<i32> {
        match self.get(key)? {
            OptionValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Value of a `long` option.
    pub fn long(&self, key: &str) -> Option<i64> {
        match self.get(key)? {
            OptionValue::Long(v) => Some(*v),
            _ => None,
        }
    }

    /// Value of a `string` option.
    pub fn string(&self, key: &str) -> Option<&str> {
        match self.get(key)? {
            OptionValue::String(v) => Some(v),
            _ => None,
        }
    }

    /// Value of an `enum` option.
    pub fn enum_value(&self, key: &str) -> Option<&str> {
        match self.get(key)? {
            OptionValue::Enum(v) => Some(v),
            _ => None,
        }
    }

    /// Value of an `enum` option parsed into `T`.
    ///
    /// Fails with [`BindError::InvalidEnumValue`] if `T` rejects the constant.
    pub fn parse_enum<T: FromStr>(&self, key: &str) -> Result<Option<T>, BindError> {
        let Some(value) = self.enum_value(key) else {
            return Ok(None);
        };
        value.parse().map(Some).map_err(|_| {
            let allowed = match self.schema.option(key).map(|option| &option.kind) {
                Some(OptionKind::Enum { values }) => values.clone(),
                _ => Vec::new(),
            };
            BindError::InvalidEnumValue {
                component: self.component_id().to_string(),
                option: key.to_string(),
                value: value.to_string(),
                allowed,
            }
        })
    }

    /// Value of a `list` option.
    pub fn list(&self, key: &str) -> Option<&[String]> {
        match self.get(key)? {
            OptionValue::List(v) => Some(v),
            _ => None,
        }
    }

    /// Value of an object option, downcast to `T`.
    pub fn object<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        match self.get(key)? {
            OptionValue::Object(obj) => obj.downcast::<T>(),
            _ => None,
        }
    }

    /// Like [`object`](Self::object), but an object of another concrete type
    /// fails with [`BindError::TypeCoercion`] instead of reading as absent.
    pub fn try_object<T: Any + Send + Sync>(&self, key: &str) -> Result<Option<Arc<T>>, BindError> {
        let Some(OptionValue::Object(obj)) = self.get(key) else {
            return Ok(None);
        };
        match obj.downcast::<T>() {
            Some(value) => Ok(Some(value)),
            None => Err(BindError::TypeCoercion {
                component: self.component_id().to_string(),
                option: key.to_string(),
                value: format!("<{}>", obj.rust_type_name()),
                expected: OptionKind::Object {
                    type_name: std::any::type_name::<T>().to_string(),
                },
            }),
        }
    }

    /// Renders every scalar option back to text, keyed by declared name.
    ///
    /// Object references are skipped. Secret values are included; use
    /// [`redacted_properties`](Self::redacted_properties) for anything that
    /// ends up in logs.
    pub fn to_properties(&self) -> BTreeMap<String, String> {
        self.iter()
            .filter_map(|(desc, value)| value.to_text().map(|text| (desc.name.clone(), text)))
            .collect()
    }

    /// Like [`to_properties`](Self::to_properties) with secret values masked.
    pub fn redacted_properties(&self) -> BTreeMap<String, String> {
        self.iter()
            .filter_map(|(desc, value)| {
                let text = if desc.secret {
                    Some(REDACTED.to_string())
                } else {
                    value.to_text()
                };
                text.map(|t| (desc.name.clone(), t))
            })
            .collect()
    }
}

impl fmt::Debug for BoundConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        struct Redacted;
        impl fmt::Debug for Redacted {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(REDACTED)
            }
        }

        let mut map = f.debug_map();
        for (desc, value) in self.iter() {
            if desc.secret {
                map.entry(&desc.name, &Redacted);
            } else {
                map.entry(&desc.name, value);
            }
        }
        map.finish()
    }
}

/// Conversion from a bound configuration into a component's own settings type.
///
/// Implementations read values with the typed accessors; since binding already
/// applied defaults and checked kinds, they usually only fail for options the
/// component needs but the schema declares optional.
pub trait FromBound: Sized {
    /// Builds the settings from a bound configuration.
    fn from_bound(config: &BoundConfiguration) -> Result<Self, BindError>;
}

/// Returns a [`BindError::MissingRequiredOption`] for `option`.
///
/// Convenience for [`FromBound`] implementations.
pub fn missing(config: &BoundConfiguration, option: &str) -> BindError {
    BindError::MissingRequiredOption {
        component: config.component_id().to_string(),
        option: option.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ObjectRef;

    fn sample() -> BoundConfiguration {
        let schema = ComponentSchema::new(
            "sample",
            [
                OptionDescriptor::string("region"),
                OptionDescriptor::string("secretKey").secret(),
                OptionDescriptor::int("proxyPort"),
                OptionDescriptor::object("client", "String"),
            ],
        )
        .unwrap();
        BoundConfiguration::new(
            schema,
            vec![
                Some(OptionValue::String("eu-west-1".into())),
                Some(OptionValue::String("hunter2".into())),
                None,
                Some(OptionValue::Object(ObjectRef::new(String::from("client")))),
            ],
        )
    }

    #[test]
    fn test_typed_accessors() {
        let config = sample();
        assert_eq!(config.string("REGION"), Some("eu-west-1"));
        assert_eq!(config.int("proxy-port"), None);
        assert!(!config.contains("proxyPort"));
        assert_eq!(config.bool("region"), None);
        assert_eq!(config.object::<String>("client").as_deref().map(String::as_str), Some("client"));
        assert_eq!(config.len(), 3);
    }

    #[test]
    fn test_try_object_checks_concrete_type() {
        mod primary {
            pub struct Client;
        }
        mod fallback {
            #[derive(Debug)]
            pub struct Client;
        }

        let schema = ComponentSchema::new(
            "sample",
            [
                OptionDescriptor::object("client", "Client"),
                OptionDescriptor::object("spare", "Client"),
            ],
        )
        .unwrap();
        let config = BoundConfiguration::new(
            schema,
            vec![Some(OptionValue::Object(ObjectRef::new(primary::Client))), None],
        );

        assert!(config.try_object::<primary::Client>("client").unwrap().is_some());
        assert!(config.try_object::<primary::Client>("spare").unwrap().is_none());
        assert!(config.object::<fallback::Client>("client").is_none());

        let err = config.try_object::<fallback::Client>("client").unwrap_err();
        assert!(matches!(
            err,
            BindError::TypeCoercion { ref option, ref value, .. }
                if option == "client" && value.ends_with("primary::Client>")
        ));
    }

    #[test]
    fn test_secrets_are_redacted() {
        let config = sample();
        let debug = format!("{config:?}");
        assert!(debug.contains("eu-west-1"));
        assert!(!debug.contains("hunter2"));

        assert_eq!(config.to_properties()["secretKey"], "hunter2");
        assert_eq!(config.redacted_properties()["secretKey"], REDACTED);
        assert!(!config.to_properties().contains_key("client"));
    }

    #[test]
    fn test_parse_enum() {
        #[derive(Debug, PartialEq)]
        enum Protocol {
            Http,
        }

        impl FromStr for Protocol {
            type Err = ();

            fn from_str(s: &str) -> Result<Self, ()> {
                match s {
                    "HTTP" => Ok(Self::Http),
                    _ => Err(()),
                }
            }
        }

        let schema = ComponentSchema::new(
            "sample",
            [
                OptionDescriptor::enumeration("proxyProtocol", ["HTTP", "HTTPS"]),
                OptionDescriptor::enumeration("other", ["HTTPS"]),
            ],
        )
        .unwrap();
        let config = BoundConfiguration::new(
            schema,
            vec![
                Some(OptionValue::Enum("HTTP".into())),
                Some(OptionValue::Enum("HTTPS".into())),
            ],
        );

        assert_eq!(config.parse_enum::<Protocol>("proxy-protocol").unwrap(), Some(Protocol::Http));
        assert_eq!(config.parse_enum::<Protocol>("missing").unwrap(), None);

        let err = config.parse_enum::<Protocol>("other").unwrap_err();
        assert!(matches!(
            err,
            BindError::InvalidEnumValue { ref option, ref allowed, .. }
                if option == "other" && allowed == &vec!["HTTPS".to_string()]
        ));
    }
}
