//! JSON catalog of registered schemas.
//!
//! ```json
//! {
//!   "components": { "aws2-kinesis": { "id": "aws2-kinesis", "kind": "component", "options": [] } },
//!   "dataformats": {},
//!   "languages": {},
//!   "others": {}
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::SchemaResult;
use crate::registry::ComponentRegistry;
use crate::schema::{ComponentKind, ComponentSchema, SchemaDocument};

/// Serializable catalog, grouped by [`ComponentKind`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    components: BTreeMap<String, SchemaDocument>,
    #[serde(default)]
    dataformats: BTreeMap<String, SchemaDocument>,
    #[serde(default)]
    languages: BTreeMap<String, SchemaDocument>,
    #[serde(default)]
    others: BTreeMap<String, SchemaDocument>,
}

impl Catalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects every schema of a registry.
    pub fn from_registry(registry: &ComponentRegistry) -> Self {
        let mut catalog = Self::new();
        for schema in registry.schemas() {
            catalog.insert(schema);
        }
        catalog
    }

    /// Adds a schema under its kind, replacing any entry with the same id.
    pub fn insert(&mut self, schema: &ComponentSchema) {
        self.section_mut(schema.kind())
            .insert(schema.id().to_string(), schema.to_document());
    }

    fn section(&self, kind: ComponentKind) -> &BTreeMap<String, SchemaDocument> {
        match kind {
            ComponentKind::Component => &self.components,
            ComponentKind::DataFormat => &self.dataformats,
            ComponentKind::Language => &self.languages,
            ComponentKind::Other => &self.others,
        }
    }

    fn section_mut(&mut self, kind: ComponentKind) -> &mut BTreeMap<String, SchemaDocument> {
        match kind {
            ComponentKind::Component => &mut self.components,
            ComponentKind::DataFormat => &mut self.dataformats,
            ComponentKind::Language => &mut self.languages,
            ComponentKind::Other => &mut self.others,
        }
    }

    /// Sorted ids of one kind.
    pub fn names(&self, kind: ComponentKind) -> Vec<&str> {
        self.section(kind).keys().map(String::as_str).collect()
    }

    /// Total number of entries.
    pub fn len(&self) -> usize {
        self.components.len() + self.dataformats.len() + self.languages.len() + self.others.len()
    }

    /// Returns `true` if the catalog has no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Parses a catalog document.
    pub fn from_json(json: &str) -> SchemaResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes the catalog.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }

    /// Validates every entry and returns the schemas.
    ///
    /// The section an entry sits in wins over the `kind` field of the entry.
    pub fn schemas(&self) -> SchemaResult<Vec<ComponentSchema>> {
        let kinds = [
            ComponentKind::Component,
            ComponentKind::DataFormat,
            ComponentKind::Language,
            ComponentKind::Other,
        ];
        let mut schemas = Vec::with_capacity(self.len());
        for kind in kinds {
            for doc in self.section(kind).values() {
                let mut doc = doc.clone();
                doc.kind = kind;
                schemas.push(ComponentSchema::from_document(doc)?);
            }
        }
        Ok(schemas)
    }
}

impl ComponentRegistry {
    /// Exports the JSON catalog of every registered schema.
    pub fn catalog(&self) -> Catalog {
        Catalog::from_registry(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::{Endpoint, factory_fn};
    use crate::error::SchemaError;
    use crate::option::OptionDescriptor;

    struct Noop;

    #[async_trait::async_trait]
    impl Endpoint for Noop {
        fn uri(&self) -> String {
            "noop".into()
        }

        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
    }

    fn registry() -> ComponentRegistry {
        let factory = || factory_fn(|_| async { Ok(Box::new(Noop) as Box<dyn Endpoint>) });
        let json = ComponentSchema::builder("jackson")
            .kind(ComponentKind::DataFormat)
            .option(OptionDescriptor::bool("prettyPrint").with_default("false"))
            .build()
            .unwrap();

        ComponentRegistry::builder()
            .register_options(
                "spring-rabbitmq",
                [OptionDescriptor::string("connectionFactory")],
                factory(),
            )
            .unwrap()
            .register_options("aws2-kinesis", [], factory())
            .unwrap()
            .register(json, factory())
            .unwrap()
            .build()
    }

    #[test]
    fn test_catalog_groups_by_kind() {
        let catalog = registry().catalog();
        assert_eq!(catalog.len(), 3);
        assert_eq!(
            catalog.names(ComponentKind::Component),
            vec!["aws2-kinesis", "spring-rabbitmq"]
        );
        assert_eq!(catalog.names(ComponentKind::DataFormat), vec!["jackson"]);
        assert!(catalog.names(ComponentKind::Language).is_empty());

        let json = catalog.to_json();
        assert_eq!(
            json["dataformats"]["jackson"]["options"][0]["name"],
            "prettyPrint"
        );
        assert_eq!(json["components"]["spring-rabbitmq"]["kind"], "component");
    }

    #[test]
    fn test_catalog_reload() {
        let json = registry().catalog().to_json().to_string();
        let catalog = Catalog::from_json(&json).unwrap();
        let schemas = catalog.schemas().unwrap();
        assert_eq!(schemas.len(), 3);
        assert!(
            schemas
                .iter()
                .any(|s| s.id() == "jackson" && s.kind() == ComponentKind::DataFormat)
        );
    }

    #[test]
    fn test_catalog_rejects_invalid_entries() {
        let json = r#"{
            "components": {
                "broken": {
                    "id": "broken",
                    "options": [
                        { "name": "n", "type": "int", "defaultValue": "many" }
                    ]
                }
            }
        }"#;
        let catalog = Catalog::from_json(json).unwrap();
        assert!(matches!(
            catalog.schemas().unwrap_err(),
            SchemaError::InvalidDefault { .. }
        ));
    }
}
