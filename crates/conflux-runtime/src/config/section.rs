//! Component sections: `components.<id>` tables turned into raw values.
//!
//! Nested tables are flattened with `.`, arrays are joined with `,`, scalars
//! are rendered as text and nulls are dropped:
//!
//! ```yaml
//! components:
//!   aws2-kinesis:
//!     enabled: true
//!     stream-name: orders
//!     max-results-per-request: 5      # → "5"
//!     proxy:
//!       host: proxy.local             # → proxy.host = "proxy.local"
//!     shard-ids: [a, b]               # → "a,b"
//! ```

use std::collections::HashMap;

use conflux_core::{RawValue, RawValues, normalize_key};
use serde_json::Value;

use super::error::{ConfigError, ConfigResult};
use super::schema::ConfluxConfig;

/// Reserved key toggling a component on or off.
pub const ENABLED_KEY: &str = "enabled";

/// One component section, ready for binding.
#[derive(Debug, Clone)]
pub struct ComponentSection {
    id: String,
    enabled: bool,
    values: RawValues,
}

impl ComponentSection {
    /// Parses a section value.
    ///
    /// `null` is an empty section. Anything else than a table is rejected.
    pub fn from_value(id: impl Into<String>, value: &Value) -> ConfigResult<Self> {
        let id = id.into();
        let mut section = Self {
            id,
            enabled: true,
            values: RawValues::new(),
        };

        let table = match value {
            Value::Null => return Ok(section),
            Value::Object(table) => table,
            other => {
                return Err(ConfigError::invalid_section(
                    &section.id,
                    format!("expected a table, found {}", type_name(other)),
                ));
            }
        };

        for (key, value) in table {
            if key == ENABLED_KEY {
                section.enabled = parse_enabled(&section.id, value)?;
                continue;
            }
            flatten(&section.id, key.clone(), value, &mut section.values)?;
        }
        Ok(section)
    }

    /// Component id as written in the configuration.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Whether the component should be activated.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Raw values for the binder.
    pub fn values(&self) -> &RawValues {
        &self.values
    }

    /// Consumes the section, returning its raw values.
    pub fn into_values(self) -> RawValues {
        self.values
    }
}

/// Parses every `components.<id>` section, in id order.
///
/// Fails if a section is malformed or two ids differ only in spelling.
pub fn component_sections(config: &ConfluxConfig) -> ConfigResult<Vec<ComponentSection>> {
    let mut seen: HashMap<String, &str> = HashMap::new();
    let mut sections = Vec::with_capacity(config.components.len());

    for (id, value) in &config.components {
        if id.trim().is_empty() {
            return Err(ConfigError::validation("Component id cannot be empty"));
        }
        if let Some(previous) = seen.insert(normalize_key(id), id) {
            return Err(ConfigError::validation(format!(
                "Component sections '{previous}' and '{id}' refer to the same component"
            )));
        }
        sections.push(ComponentSection::from_value(id.as_str(), value)?);
    }
    Ok(sections)
}

fn parse_enabled(component: &str, value: &Value) -> ConfigResult<bool> {
    match value {
        Value::Bool(enabled) => Ok(*enabled),
        Value::String(s) if s.eq_ignore_ascii_case("true") => Ok(true),
        Value::String(s) if s.eq_ignore_ascii_case("false") => Ok(false),
        other => Err(ConfigError::invalid_section(
            component,
            format!("'{ENABLED_KEY}' must be a boolean, found {other}"),
        )),
    }
}

fn flatten(component: &str, key: String, value: &Value, out: &mut RawValues) -> ConfigResult<()> {
    match value {
        Value::Null => {}
        Value::Object(table) => {
            for (child, value) in table {
                flatten(component, format!("{key}.{child}"), value, out)?;
            }
        }
        Value::Array(items) => {
            let mut parts = Vec::with_capacity(items.len());
            for item in items {
                match scalar_text(item) {
                    Some(text) => parts.push(text),
                    None if item.is_null() => {}
                    None => {
                        return Err(ConfigError::invalid_section(
                            component,
                            format!("list '{key}' may only contain scalars"),
                        ));
                    }
                }
            }
            out.insert(key, RawValue::Text(parts.join(",")));
        }
        scalar => {
            if let Some(text) = scalar_text(scalar) {
                out.insert(key, RawValue::Text(text));
            }
        }
    }
    Ok(())
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a table",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn text<'a>(section: &'a ComponentSection, key: &str) -> &'a str {
        match &section.values()[key] {
            RawValue::Text(text) => text,
            RawValue::Object(_) => panic!("unexpected object for {key}"),
        }
    }

    #[test]
    fn test_flatten_section() {
        let value = json!({
            "stream-name": "orders",
            "max-results-per-request": 5,
            "use-default-credentials-provider": true,
            "proxy": { "host": "proxy.local", "port": 3128 },
            "shard-ids": ["a", "b", null],
            "region": null,
        });
        let section = ComponentSection::from_value("aws2-kinesis", &value).unwrap();

        assert!(section.is_enabled());
        assert_eq!(text(&section, "stream-name"), "orders");
        assert_eq!(text(&section, "max-results-per-request"), "5");
        assert_eq!(text(&section, "use-default-credentials-provider"), "true");
        assert_eq!(text(&section, "proxy.host"), "proxy.local");
        assert_eq!(text(&section, "proxy.port"), "3128");
        assert_eq!(text(&section, "shard-ids"), "a,b");
        assert!(!section.values().contains_key("region"));
        assert_eq!(section.values().len(), 6);
    }

    #[test]
    fn test_enabled_key() {
        let section =
            ComponentSection::from_value("x", &json!({ "enabled": false, "a": 1 })).unwrap();
        assert!(!section.is_enabled());
        assert!(!section.values().contains_key(ENABLED_KEY));

        let section = ComponentSection::from_value("x", &json!({ "enabled": "TRUE" })).unwrap();
        assert!(section.is_enabled());

        let err = ComponentSection::from_value("x", &json!({ "enabled": 1 })).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSection { .. }));
    }

    #[test]
    fn test_component_sections() {
        let mut config = ConfluxConfig::default();
        config
            .components
            .insert("spring-rabbitmq".into(), json!({ "queue": "a" }));
        config
            .components
            .insert("aws2-kinesis".into(), json!({ "enabled": false }));

        let sections = component_sections(&config).unwrap();
        let ids: Vec<&str> = sections.iter().map(ComponentSection::id).collect();
        assert_eq!(ids, vec!["aws2-kinesis", "spring-rabbitmq"]);
        assert!(!sections[0].is_enabled());

        config.components.insert("spring_rabbitmq".into(), Value::Null);
        let err = component_sections(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
    }

    #[test]
    fn test_null_and_invalid_sections() {
        let section = ComponentSection::from_value("x", &Value::Null).unwrap();
        assert!(section.values().is_empty());
        assert!(section.is_enabled());

        let err = ComponentSection::from_value("x", &json!("oops")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid section for component 'x': expected a table, found a string"
        );

        let err = ComponentSection::from_value("x", &json!({ "l": [{ "a": 1 }] })).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSection { .. }));
    }
}
