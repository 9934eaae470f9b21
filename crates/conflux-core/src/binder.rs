//! The binder: raw key/value input → [`BoundConfiguration`].
//!
//! # Binding rules
//!
//! For every option of the schema, in declaration order:
//!
//! 1. The raw value is looked up under any spelling of the option name
//!    (`maxResultsPerRequest`, `max-results-per-request`, `max.results.per.request`).
//! 2. If absent, the default is used; otherwise an autowired object option is
//!    filled with the single resolver instance of its type; otherwise a
//!    required option fails with [`BindError::MissingRequiredOption`] and an
//!    optional one stays unset.
//! 3. If present, the text is coerced to the option kind. Object options
//!    accept either an [`ObjectRef`] directly or a bean name (`#bean:client`)
//!    resolved through the [`ObjectResolver`].
//!
//! Raw keys matching no option are ignored in [`UnknownKeyPolicy::Lenient`]
//! mode and rejected in [`UnknownKeyPolicy::Strict`] mode. The first error
//! aborts binding; no partial configuration is ever returned.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::bound::BoundConfiguration;
use crate::error::{BindError, BindResult, REDACTED};
use crate::key::normalize_key;
use crate::option::{OptionDescriptor, OptionKind, OptionValue, ParseFailure};
use crate::resolver::{ObjectRef, ObjectResolver, bean_name};
use crate::schema::ComponentSchema;

/// How the binder treats raw keys that match no option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownKeyPolicy {
    /// Unknown keys are ignored.
    #[default]
    Lenient,
    /// Unknown keys fail with [`BindError::UnknownOption`].
    Strict,
}

impl fmt::Display for UnknownKeyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lenient => f.write_str("lenient"),
            Self::Strict => f.write_str("strict"),
        }
    }
}

/// A raw, not yet coerced configuration value.
#[derive(Debug, Clone)]
pub enum RawValue {
    /// Text as read from files, environment or command line.
    Text(String),
    /// A pre-built external object.
    Object(ObjectRef),
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<ObjectRef> for RawValue {
    fn from(value: ObjectRef) -> Self {
        Self::Object(value)
    }
}

/// Raw input for one component, keyed by option name in any spelling.
pub type RawValues = HashMap<String, RawValue>;

/// Collects key/value pairs into [`RawValues`].
///
/// ```rust,ignore
/// let raw = raw_values([("iteratorType", "LATEST"), ("max-results-per-request", "5")]);
/// ```
pub fn raw_values<I, K, V>(pairs: I) -> RawValues
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<RawValue>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// Binds raw values against component schemas.
///
/// The binder holds only its policy; it is `Copy` and safe to share between
/// threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binder {
    unknown_keys: UnknownKeyPolicy,
    autowire: bool,
}

impl Default for Binder {
    fn default() -> Self {
        Self::new()
    }
}

impl Binder {
    /// Creates a lenient binder with autowiring enabled.
    pub fn new() -> Self {
        Self {
            unknown_keys: UnknownKeyPolicy::Lenient,
            autowire: true,
        }
    }

    /// Creates a binder that rejects unknown keys.
    pub fn strict() -> Self {
        Self::new().with_unknown_keys(UnknownKeyPolicy::Strict)
    }

    /// Sets the unknown key policy.
    pub fn with_unknown_keys(mut self, policy: UnknownKeyPolicy) -> Self {
        self.unknown_keys = policy;
        self
    }

    /// Enables or disables autowiring of object options.
    pub fn with_autowire(mut self, enabled: bool) -> Self {
        self.autowire = enabled;
        self
    }

    /// Returns the unknown key policy.
    pub fn unknown_keys(&self) -> UnknownKeyPolicy {
        self.unknown_keys
    }

    /// Returns whether autowiring is enabled.
    pub fn autowire(&self) -> bool {
        self.autowire
    }

    /// Binds `raw` against `schema`.
    pub fn bind(
        &self,
        schema: &ComponentSchema,
        raw: &RawValues,
        resolver: &dyn ObjectResolver,
    ) -> BindResult<BoundConfiguration> {
        let component = schema.id();

        let mut supplied: HashMap<String, Vec<(&str, &RawValue)>> = HashMap::new();
        for (key, value) in raw {
            supplied
                .entry(normalize_key(key))
                .or_default()
                .push((key.as_str(), value));
        }

        let mut values = Vec::with_capacity(schema.len());
        for option in schema.options() {
            let value = match supplied.remove(&normalize_key(&option.name)).as_deref() {
                Some([(key, value)]) => {
                    Some(self.coerce(component, option, key, value, resolver)?)
                }
                Some(entries) => {
                    let mut keys: Vec<String> = entries.iter().map(|(k, _)| k.to_string()).collect();
                    keys.sort();
                    return Err(BindError::ConflictingKeys {
                        component: component.to_string(),
                        option: option.name.clone(),
                        keys,
                    });
                }
                None => self.fallback(component, option, resolver)?,
            };
            values.push(value);
        }

        if !supplied.is_empty() {
            let mut unknown: Vec<&str> = supplied.values().flatten().map(|(k, _)| *k).collect();
            unknown.sort_unstable();
            match self.unknown_keys {
                UnknownKeyPolicy::Strict => {
                    return Err(BindError::UnknownOption {
                        component: component.to_string(),
                        key: unknown[0].to_string(),
                    });
                }
                UnknownKeyPolicy::Lenient => {
                    debug!(component, keys = ?unknown, "Ignoring unknown option keys");
                }
            }
        }

        let bound = BoundConfiguration::new(schema.clone(), values);
        debug!(component, options = bound.len(), "Bound component configuration");
        Ok(bound)
    }

    /// Value for an option that was not supplied.
    fn fallback(
        &self,
        component: &str,
        option: &OptionDescriptor,
        resolver: &dyn ObjectResolver,
    ) -> BindResult<Option<OptionValue>> {
        if let Some(default) = &option.default {
            return coerce_text(component, option, default).map(Some);
        }

        if self.autowire
            && option.autowired
            && let OptionKind::Object { type_name } = &option.kind
        {
            let mut candidates = resolver.find_by_type(type_name);
            match candidates.len() {
                1 => {
                    debug!(component, option = %option.name, %type_name, "Autowired option");
                    return Ok(candidates.pop().map(OptionValue::Object));
                }
                0 => {}
                count => {
                    debug!(
                        component,
                        option = %option.name,
                        %type_name,
                        count,
                        "Not autowiring option, several candidates"
                    );
                }
            }
        }

        if option.required {
            return Err(BindError::MissingRequiredOption {
                component: component.to_string(),
                option: option.name.clone(),
            });
        }
        Ok(None)
    }

    /// Coerces a supplied value.
    fn coerce(
        &self,
        component: &str,
        option: &OptionDescriptor,
        key: &str,
        raw: &RawValue,
        resolver: &dyn ObjectResolver,
    ) -> BindResult<OptionValue> {
        if option.deprecated {
            warn!(component, option = %option.name, key, "Option is deprecated");
        }

        match (raw, &option.kind) {
            (RawValue::Text(text), OptionKind::Object { .. }) => {
                let name = bean_name(text);
                let object =
                    resolver
                        .lookup(name)
                        .ok_or_else(|| BindError::UnresolvedReference {
                            component: component.to_string(),
                            option: option.name.clone(),
                            name: name.to_string(),
                        })?;
                check_object(component, option, object)
            }
            (RawValue::Object(object), OptionKind::Object { .. }) => {
                check_object(component, option, object.clone())
            }
            (RawValue::Object(object), _) => Err(BindError::TypeCoercion {
                component: component.to_string(),
                option: option.name.clone(),
                value: format!("<{}>", object.type_name()),
                expected: option.kind.clone(),
            }),
            (RawValue::Text(text), _) => coerce_text(component, option, text),
        }
    }
}

fn coerce_text(component: &str, option: &OptionDescriptor, text: &str) -> BindResult<OptionValue> {
    let shown = || {
        if option.secret {
            REDACTED.to_string()
        } else {
            text.to_string()
        }
    };

    option.kind.parse(text).map_err(|failure| match (failure, &option.kind) {
        (ParseFailure::NotInEnum, OptionKind::Enum { values }) => BindError::InvalidEnumValue {
            component: component.to_string(),
            option: option.name.clone(),
            value: shown(),
            allowed: values.clone(),
        },
        _ => BindError::TypeCoercion {
            component: component.to_string(),
            option: option.name.clone(),
            value: shown(),
            expected: option.kind.clone(),
        },
    })
}

fn check_object(
    component: &str,
    option: &OptionDescriptor,
    object: ObjectRef,
) -> BindResult<OptionValue> {
    match &option.kind {
        OptionKind::Object { type_name } if object.is_type(type_name) => {
            Ok(OptionValue::Object(object))
        }
        _ => Err(BindError::TypeCoercion {
            component: component.to_string(),
            option: option.name.clone(),
            value: format!("<{}>", object.type_name()),
            expected: option.kind.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::resolver::{BeanRegistry, NoObjects};

    struct KinesisClient;
    struct DynamoDbClient;

    fn kinesis_schema() -> ComponentSchema {
        ComponentSchema::new(
            "aws2-kinesis",
            [
                OptionDescriptor::string("shardId"),
                OptionDescriptor::enumeration("iteratorType", ["TRIM_HORIZON", "LATEST"])
                    .with_default("TRIM_HORIZON")
                    .required(),
                OptionDescriptor::int("maxResultsPerRequest").with_default("1"),
                OptionDescriptor::long("shardMonitorInterval").with_default("10000"),
                OptionDescriptor::bool("cborEnabled").with_default("true"),
                OptionDescriptor::string("secretKey").secret(),
                OptionDescriptor::object("amazonKinesisClient", "KinesisClient").autowired(),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_empty_input_applies_defaults_only() {
        let bound = Binder::new()
            .bind(&kinesis_schema(), &RawValues::new(), &NoObjects)
            .unwrap();

        assert_eq!(bound.enum_value("iteratorType"), Some("TRIM_HORIZON"));
        assert_eq!(bound.int("maxResultsPerRequest"), Some(1));
        assert_eq!(bound.long("shardMonitorInterval"), Some(10_000));
        assert_eq!(bound.bool("cborEnabled"), Some(true));
        assert!(!bound.contains("shardId"));
        assert!(!bound.contains("amazonKinesisClient"));
    }

    #[test]
    fn test_invalid_enum_value() {
        let raw = raw_values([("iteratorType", "BOGUS")]);
        let err = Binder::new()
            .bind(&kinesis_schema(), &raw, &NoObjects)
            .unwrap_err();

        assert_eq!(
            err,
            BindError::InvalidEnumValue {
                component: "aws2-kinesis".into(),
                option: "iteratorType".into(),
                value: "BOGUS".into(),
                allowed: vec!["TRIM_HORIZON".into(), "LATEST".into()],
            }
        );
    }

    #[test]
    fn test_missing_required_option() {
        let schema = ComponentSchema::new(
            "sql",
            [
                OptionDescriptor::string("query").required(),
                OptionDescriptor::bool("batch"),
            ],
        )
        .unwrap();
        let err = Binder::new()
            .bind(&schema, &raw_values([("batch", "true")]), &NoObjects)
            .unwrap_err();
        assert_eq!(
            err,
            BindError::MissingRequiredOption {
                component: "sql".into(),
                option: "query".into()
            }
        );
    }

    #[test]
    fn test_separator_equivalence() {
        let schema = kinesis_schema();
        for key in [
            "maxResultsPerRequest",
            "max-results-per-request",
            "max.results.per.request",
        ] {
            let bound = Binder::new()
                .bind(&schema, &raw_values([(key, "7")]), &NoObjects)
                .unwrap();
            assert_eq!(bound.int("maxResultsPerRequest"), Some(7), "{key}");
        }
    }

    #[test]
    fn test_conflicting_spellings_rejected() {
        let raw = raw_values([("shardId", "a"), ("shard-id", "b")]);
        let err = Binder::new()
            .bind(&kinesis_schema(), &raw, &NoObjects)
            .unwrap_err();
        assert_eq!(
            err,
            BindError::ConflictingKeys {
                component: "aws2-kinesis".into(),
                option: "shardId".into(),
                keys: vec!["shard-id".into(), "shardId".into()],
            }
        );
    }

    #[test]
    fn test_type_coercion_error_is_all_or_nothing() {
        let raw = raw_values([("shardId", "shard-0001"), ("maxResultsPerRequest", "many")]);
        let err = Binder::new()
            .bind(&kinesis_schema(), &raw, &NoObjects)
            .unwrap_err();
        assert_eq!(
            err,
            BindError::TypeCoercion {
                component: "aws2-kinesis".into(),
                option: "maxResultsPerRequest".into(),
                value: "many".into(),
                expected: OptionKind::Int,
            }
        );
    }

    #[test]
    fn test_scalar_round_trip() {
        let input = BTreeMap::from([
            ("cborEnabled".to_string(), "false".to_string()),
            ("iteratorType".to_string(), "LATEST".to_string()),
            ("maxResultsPerRequest".to_string(), "-3".to_string()),
            ("shardId".to_string(), "shard-0001".to_string()),
            ("shardMonitorInterval".to_string(), "9000000000".to_string()),
        ]);
        let raw = raw_values(input.clone());
        let bound = Binder::new()
            .bind(&kinesis_schema(), &raw, &NoObjects)
            .unwrap();

        assert_eq!(bound.to_properties(), input);
    }

    #[test]
    fn test_unknown_keys_policy() {
        let raw = raw_values([("shardId", "s"), ("notAnOption", "x")]);

        let bound = Binder::new()
            .bind(&kinesis_schema(), &raw, &NoObjects)
            .unwrap();
        assert!(!bound.contains("notAnOption"));
        assert!(!bound.to_properties().contains_key("notAnOption"));

        let err = Binder::strict()
            .bind(&kinesis_schema(), &raw, &NoObjects)
            .unwrap_err();
        assert_eq!(
            err,
            BindError::UnknownOption {
                component: "aws2-kinesis".into(),
                key: "notAnOption".into()
            }
        );
    }

    #[test]
    fn test_secret_values_not_echoed_in_errors() {
        let schema = ComponentSchema::new("x", [OptionDescriptor::int("pin").secret()]).unwrap();
        let err = Binder::new()
            .bind(&schema, &raw_values([("pin", "12ab")]), &NoObjects)
            .unwrap_err();
        assert!(!err.to_string().contains("12ab"));
        assert!(err.to_string().contains(REDACTED));
    }

    #[test]
    fn test_object_reference_by_bean_name() {
        let beans = BeanRegistry::new().with("kinesis", KinesisClient);

        let raw = raw_values([("amazonKinesisClient", "#bean:kinesis")]);
        let bound = Binder::new().bind(&kinesis_schema(), &raw, &beans).unwrap();
        assert!(bound.object::<KinesisClient>("amazonKinesisClient").is_some());

        let raw = raw_values([("amazonKinesisClient", "#missing")]);
        let err = Binder::new().bind(&kinesis_schema(), &raw, &beans).unwrap_err();
        assert!(matches!(err, BindError::UnresolvedReference { ref name, .. } if name == "missing"));
    }

    #[test]
    fn test_object_reference_type_checked() {
        let mut raw = RawValues::new();
        raw.insert(
            "amazonKinesisClient".into(),
            RawValue::Object(ObjectRef::new(DynamoDbClient)),
        );
        let err = Binder::new()
            .bind(&kinesis_schema(), &raw, &NoObjects)
            .unwrap_err();
        assert!(matches!(
            err,
            BindError::TypeCoercion { ref value, .. } if value == "<DynamoDbClient>"
        ));

        raw.insert(
            "amazonKinesisClient".into(),
            RawValue::Object(ObjectRef::new(KinesisClient)),
        );
        assert!(Binder::new().bind(&kinesis_schema(), &raw, &NoObjects).is_ok());
    }

    #[test]
    fn test_deprecated_option_logs_warning() {
        use std::sync::Arc;

        use parking_lot::Mutex;
        use tracing_subscriber::layer::{Context, SubscriberExt};

        #[derive(Clone, Default)]
        struct WarningCapture {
            options: Arc<Mutex<Vec<String>>>,
        }

        impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for WarningCapture {
            fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
                if *event.metadata().level() == tracing::Level::WARN {
                    let mut visitor = OptionVisitor(None);
                    event.record(&mut visitor);
                    self.options.lock().extend(visitor.0);
                }
            }
        }

        struct OptionVisitor(Option<String>);

        impl tracing::field::Visit for OptionVisitor {
            fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn fmt::Debug) {
                if field.name() == "option" {
                    self.0 = Some(format!("{value:?}"));
                }
            }
        }

        let schema = ComponentSchema::new(
            "aws2-kinesis",
            [
                OptionDescriptor::string("shardId"),
                OptionDescriptor::string("legacyEndpoint").deprecated(),
                OptionDescriptor::int("legacyBatch").with_default("1").deprecated(),
            ],
        )
        .unwrap();

        let capture = WarningCapture::default();
        let warnings = capture.options.clone();
        let subscriber = tracing_subscriber::registry().with(capture);

        tracing::subscriber::with_default(subscriber, || {
            let raw = raw_values([("shardId", "s"), ("legacy-endpoint", "http://old")]);
            let bound = Binder::new().bind(&schema, &raw, &NoObjects).unwrap();
            assert_eq!(bound.string("legacyEndpoint"), Some("http://old"));
            assert_eq!(bound.int("legacyBatch"), Some(1));
        });

        assert_eq!(*warnings.lock(), vec!["legacyEndpoint".to_string()]);
    }

    #[test]
    fn test_autowiring_requires_single_candidate() {
        let schema = kinesis_schema();
        let beans = BeanRegistry::new().with("one", KinesisClient);

        let bound = Binder::new().bind(&schema, &RawValues::new(), &beans).unwrap();
        assert!(bound.contains("amazonKinesisClient"));

        let bound = Binder::new()
            .with_autowire(false)
            .bind(&schema, &RawValues::new(), &beans)
            .unwrap();
        assert!(!bound.contains("amazonKinesisClient"));

        beans.insert("two", KinesisClient);
        let bound = Binder::new().bind(&schema, &RawValues::new(), &beans).unwrap();
        assert!(!bound.contains("amazonKinesisClient"));
    }
}
