//! Component schemas: the ordered option list of one component.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{SchemaError, SchemaResult};
use crate::key::normalize_key;
use crate::option::{OptionDescriptor, OptionKind, ParseFailure};

/// Catalog category of a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    /// Endpoint-producing connector (queue, file system, SaaS API, ...).
    #[default]
    Component,
    /// Marshalling format.
    DataFormat,
    /// Expression language.
    Language,
    /// Anything else.
    Other,
}

impl ComponentKind {
    /// Returns the kind name as used in the catalog.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Component => "component",
            Self::DataFormat => "dataformat",
            Self::Language => "language",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serialized form of a schema (catalog entry).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SchemaDocument {
    pub id: String,
    #[serde(default)]
    pub kind: ComponentKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub options: Vec<OptionDescriptor>,
}

struct SchemaInner {
    id: String,
    kind: ComponentKind,
    title: Option<String>,
    options: Vec<OptionDescriptor>,
    /// Normalized option name → index into `options`.
    index: HashMap<String, usize>,
}

/// The immutable option schema of one component.
///
/// Cloning is cheap; all clones share the same descriptors. Option names are
/// unique after [normalization](crate::normalize_key), and every declared
/// default is known to coerce to its option kind.
#[derive(Clone)]
pub struct ComponentSchema {
    inner: Arc<SchemaInner>,
}

impl ComponentSchema {
    /// Builds a schema of kind [`ComponentKind::Component`].
    pub fn new(
        id: impl Into<String>,
        options: impl IntoIterator<Item = OptionDescriptor>,
    ) -> SchemaResult<Self> {
        Self::builder(id).options(options).build()
    }

    /// Starts building a schema.
    pub fn builder(id: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            id: id.into(),
            kind: ComponentKind::default(),
            title: None,
            options: Vec::new(),
        }
    }

    /// Parses a schema from its catalog JSON form.
    pub fn from_json(json: &str) -> SchemaResult<Self> {
        let doc: SchemaDocument = serde_json::from_str(json)?;
        Self::from_document(doc)
    }

    pub(crate) fn from_document(doc: SchemaDocument) -> SchemaResult<Self> {
        let mut builder = Self::builder(doc.id).kind(doc.kind).options(doc.options);
        builder.title = doc.title;
        builder.build()
    }

    pub(crate) fn to_document(&self) -> SchemaDocument {
        SchemaDocument {
            id: self.inner.id.clone(),
            kind: self.inner.kind,
            title: self.inner.title.clone(),
            options: self.inner.options.clone(),
        }
    }

    /// Serializes the schema to its catalog JSON form.
    pub fn to_json(&self) -> serde_json::Value {
        // A document of plain strings and bools always serializes.
        serde_json::to_value(self.to_document()).unwrap_or_default()
    }

    /// Component identifier.
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// Catalog category.
    pub fn kind(&self) -> ComponentKind {
        self.inner.kind
    }

    /// Human readable title, if any.
    pub fn title(&self) -> Option<&str> {
        self.inner.title.as_deref()
    }

    /// Option descriptors in declaration order.
    pub fn options(&self) -> &[OptionDescriptor] {
        &self.inner.options
    }

    /// Number of options.
    pub fn len(&self) -> usize {
        self.inner.options.len()
    }

    /// Returns `true` if the schema declares no options.
    pub fn is_empty(&self) -> bool {
        self.inner.options.is_empty()
    }

    /// Finds an option by any accepted spelling of its name.
    pub fn option(&self, key: &str) -> Option<&OptionDescriptor> {
        self.inner
            .index
            .get(&normalize_key(key))
            .map(|&i| &self.inner.options[i])
    }

    /// Position of an option in declaration order.
    pub(crate) fn index_of(&self, key: &str) -> Option<usize> {
        self.inner.index.get(&normalize_key(key)).copied()
    }

    /// Required options in declaration order.
    pub fn required_options(&self) -> impl Iterator<Item = &OptionDescriptor> {
        self.inner.options.iter().filter(|o| o.required)
    }
}

impl fmt::Debug for ComponentSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentSchema")
            .field("id", &self.inner.id)
            .field("kind", &self.inner.kind)
            .field("options", &self.inner.options.len())
            .finish()
    }
}

/// Builder for [`ComponentSchema`].
#[derive(Debug)]
pub struct SchemaBuilder {
    id: String,
    kind: ComponentKind,
    title: Option<String>,
    options: Vec<OptionDescriptor>,
}

impl SchemaBuilder {
    /// Sets the catalog category.
    pub fn kind(mut self, kind: ComponentKind) -> Self {
        self.kind = kind;
        self
    }

    /// Sets the title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Appends one option.
    pub fn option(mut self, option: OptionDescriptor) -> Self {
        self.options.push(option);
        self
    }

    /// Appends several options.
    pub fn options(mut self, options: impl IntoIterator<Item = OptionDescriptor>) -> Self {
        self.options.extend(options);
        self
    }

    /// Validates the options and freezes the schema.
    pub fn build(self) -> SchemaResult<ComponentSchema> {
        let mut index = HashMap::with_capacity(self.options.len());

        for (i, option) in self.options.iter().enumerate() {
            if index.insert(normalize_key(&option.name), i).is_some() {
                return Err(SchemaError::DuplicateOption {
                    component: self.id.clone(),
                    option: option.name.clone(),
                });
            }
            if let Some(default) = &option.default {
                check_default(&self.id, option, default)?;
            }
        }

        Ok(ComponentSchema {
            inner: Arc::new(SchemaInner {
                id: self.id,
                kind: self.kind,
                title: self.title,
                options: self.options,
                index,
            }),
        })
    }
}

fn check_default(component: &str, option: &OptionDescriptor, default: &str) -> SchemaResult<()> {
    let reason = match (&option.kind, option.kind.parse(default)) {
        (OptionKind::Object { .. }, _) => "object references cannot have defaults".to_string(),
        (_, Ok(_)) => return Ok(()),
        (_, Err(ParseFailure::NotInEnum)) => format!("not one of the allowed values of {}", option.kind),
        (_, Err(ParseFailure::Malformed)) => format!("not a valid {}", option.kind),
    };
    Err(SchemaError::InvalidDefault {
        component: component.to_string(),
        option: option.name.clone(),
        value: default.to_string(),
        reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinesis_options() -> Vec<OptionDescriptor> {
        vec![
            OptionDescriptor::string("shardId"),
            OptionDescriptor::enumeration("iteratorType", ["TRIM_HORIZON", "LATEST"])
                .with_default("TRIM_HORIZON")
                .required(),
            OptionDescriptor::int("maxResultsPerRequest").with_default("1"),
        ]
    }

    #[test]
    fn test_lookup_by_any_spelling() {
        let schema = ComponentSchema::new("aws2-kinesis", kinesis_options()).unwrap();
        assert_eq!(schema.len(), 3);
        assert_eq!(
            schema.option("max-results-per-request").unwrap().name,
            "maxResultsPerRequest"
        );
        assert_eq!(schema.required_options().count(), 1);
        assert!(schema.option("bogus").is_none());
    }

    #[test]
    fn test_duplicate_option_rejected() {
        let err = ComponentSchema::new(
            "x",
            [OptionDescriptor::string("shardId"), OptionDescriptor::int("shard-id")],
        )
        .unwrap_err();
        assert_eq!(
            err,
            SchemaError::DuplicateOption {
                component: "x".into(),
                option: "shard-id".into()
            }
        );
    }

    #[test]
    fn test_invalid_defaults_rejected() {
        let err = ComponentSchema::new("x", [OptionDescriptor::int("n").with_default("ten")])
            .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidDefault { ref option, .. } if option == "n"));

        let err = ComponentSchema::new(
            "x",
            [OptionDescriptor::object("client", "KinesisClient").with_default("c")],
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidDefault { .. }));
    }

    #[test]
    fn test_json_round_trip() {
        let schema = ComponentSchema::builder("aws2-kinesis")
            .title("AWS Kinesis")
            .options(kinesis_options())
            .build()
            .unwrap();

        let json = schema.to_json();
        assert_eq!(json["id"], "aws2-kinesis");
        assert_eq!(json["kind"], "component");
        assert_eq!(json["options"].as_array().unwrap().len(), 3);

        let parsed = ComponentSchema::from_json(&json.to_string()).unwrap();
        assert_eq!(parsed.options(), schema.options());
        assert_eq!(parsed.title(), Some("AWS Kinesis"));
    }

    #[test]
    fn test_from_json_reports_parse_errors() {
        let err = ComponentSchema::from_json("{ not json").unwrap_err();
        assert!(matches!(err, SchemaError::InvalidSchema(_)));
    }
}
