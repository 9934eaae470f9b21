//! Option descriptors and bound option values.
//!
//! An [`OptionDescriptor`] is the static metadata for one configuration field
//! of a component: its name, [`OptionKind`], default and flags. Descriptors are
//! plain data; they can be built in code with the constructor helpers or
//! deserialized from catalog JSON.
//!
//! # Example
//!
//! ```rust,ignore
//! let options = vec![
//!     OptionDescriptor::string("shardId"),
//!     OptionDescriptor::enumeration("iteratorType", ["TRIM_HORIZON", "LATEST"])
//!         .with_default("TRIM_HORIZON")
//!         .required(),
//!     OptionDescriptor::int("maxResultsPerRequest").with_default("1"),
//!     OptionDescriptor::string("secretKey").secret(),
//! ];
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::resolver::ObjectRef;

// =============================================================================
// OptionKind
// =============================================================================

/// The declared type of an option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum OptionKind {
    /// `true` / `false`, case-insensitive.
    Bool,
    /// 32-bit signed decimal integer.
    Int,
    /// 64-bit signed decimal integer.
    Long,
    /// Free-form text, taken verbatim.
    String,
    /// Comma separated list of strings.
    List,
    /// One of a fixed set of constants, matched exactly.
    Enum {
        /// Allowed constants.
        values: Vec<String>,
    },
    /// Reference to an externally constructed object (client, connection factory, ...).
    Object {
        /// Expected type name of the referenced object.
        #[serde(rename = "typeName")]
        type_name: String,
    },
}

/// Why a text value failed to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ParseFailure {
    /// Malformed for the kind.
    Malformed,
    /// Well formed, but not an allowed enum constant.
    NotInEnum,
}

impl OptionKind {
    /// Returns a short name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Long => "long",
            Self::String => "string",
            Self::List => "list",
            Self::Enum { .. } => "enum",
            Self::Object { .. } => "object",
        }
    }

    /// Returns `true` for kinds that are bound from text alone.
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Self::Object { .. })
    }

    /// Parses a text value into this kind.
    ///
    /// Object references are never parsed from text here; the binder resolves
    /// them through an [`ObjectResolver`](crate::ObjectResolver).
    pub(crate) fn parse(&self, text: &str) -> Result<OptionValue, ParseFailure> {
        match self {
            Self::Bool => {
                if text.eq_ignore_ascii_case("true") {
                    Ok(OptionValue::Bool(true))
                } else if text.eq_ignore_ascii_case("false") {
                    Ok(OptionValue::Bool(false))
                } else {
                    Err(ParseFailure::Malformed)
                }
            }
            Self::Int => text
                .parse::<i32>()
                .map(OptionValue::Int)
                .map_err(|_| ParseFailure::Malformed),
            Self::Long => text
                .parse::<i64>()
                .map(OptionValue::Long)
                .map_err(|_| ParseFailure::Malformed),
            Self::String => Ok(OptionValue::String(text.to_string())),
            Self::List => Ok(OptionValue::List(
                text.split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(str::to_string)
                    .collect(),
            )),
            Self::Enum { values } => {
                if values.iter().any(|v| v == text) {
                    Ok(OptionValue::Enum(text.to_string()))
                } else {
                    Err(ParseFailure::NotInEnum)
                }
            }
            Self::Object { .. } => Err(ParseFailure::Malformed),
        }
    }
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enum { values } => write!(f, "enum [{}]", values.join(", ")),
            Self::Object { type_name } => write!(f, "object reference of type {type_name}"),
            other => f.write_str(other.as_str()),
        }
    }
}

// =============================================================================
// OptionDescriptor
// =============================================================================

/// Metadata describing one option of a component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionDescriptor {
    /// Declared option name (camel case by convention).
    pub name: String,

    /// Declared kind.
    #[serde(flatten)]
    pub kind: OptionKind,

    /// Default in its text form; coerced like any supplied value.
    #[serde(default, rename = "defaultValue", skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,

    /// Binding fails if the option ends up without a value.
    #[serde(default)]
    pub required: bool,

    /// Supplying the option logs a deprecation warning.
    #[serde(default)]
    pub deprecated: bool,

    /// The value is redacted from logs, `Debug` output and error messages.
    #[serde(default)]
    pub secret: bool,

    /// For object options: fill from the single resolver instance of the type.
    #[serde(default)]
    pub autowired: bool,

    /// Human readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl OptionDescriptor {
    /// Creates a descriptor with the given name and kind and no flags set.
    pub fn new(name: impl Into<String>, kind: OptionKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default: None,
            required: false,
            deprecated: false,
            secret: false,
            autowired: false,
            description: None,
        }
    }

    /// Creates a `bool` option.
    pub fn bool(name: impl Into<String>) -> Self {
        Self::new(name, OptionKind::Bool)
    }

    /// Creates an `int` option.
    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, OptionKind::Int)
    }

    /// Creates a `long` option.
    pub fn long(name: impl Into<String>) -> Self {
        Self::new(name, OptionKind::Long)
    }

    /// Creates a `string` option.
    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, OptionKind::String)
    }

    /// Creates a `list` option.
    pub fn list(name: impl Into<String>) -> Self {
        Self::new(name, OptionKind::List)
    }

    /// Creates an `enum` option with the given allowed constants.
    pub fn enumeration<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            name,
            OptionKind::Enum {
                values: values.into_iter().map(Into::into).collect(),
            },
        )
    }

    /// Creates an object-reference option expecting the given type name.
    pub fn object(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::new(
            name,
            OptionKind::Object {
                type_name: type_name.into(),
            },
        )
    }

    /// Sets the default value (text form).
    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Marks the option as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Marks the option as deprecated.
    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    /// Marks the option as secret.
    pub fn secret(mut self) -> Self {
        self.secret = true;
        self
    }

    /// Enables autowiring for an object option.
    pub fn autowired(mut self) -> Self {
        self.autowired = true;
        self
    }

    /// Sets the description.
    pub fn describe(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }
}

// =============================================================================
// OptionValue
// =============================================================================

/// A bound, typed option value.
#[derive(Clone, PartialEq)]
pub enum OptionValue {
    /// Value of a `bool` option.
    Bool(bool),
    /// Value of an `int` option.
    Int(i32),
    /// Value of a `long` option.
    Long(i64),
    /// Value of a `string` option.
    String(String),
    /// Value of an `enum` option (one of the allowed constants).
    Enum(String),
    /// Value of a `list` option.
    List(Vec<String>),
    /// Value of an object-reference option.
    Object(ObjectRef),
}

impl OptionValue {
    /// Renders a scalar value back to its text form.
    ///
    /// Returns `None` for object references, which have no text form.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Self::Bool(v) => Some(v.to_string()),
            Self::Int(v) => Some(v.to_string()),
            Self::Long(v) => Some(v.to_string()),
            Self::String(v) | Self::Enum(v) => Some(v.clone()),
            Self::List(items) => Some(items.join(",")),
            Self::Object(_) => None,
        }
    }

    /// Returns `true` if the value has the shape of the given kind.
    pub fn matches_kind(&self, kind: &OptionKind) -> bool {
        match (self, kind) {
            (Self::Bool(_), OptionKind::Bool)
            | (Self::Int(_), OptionKind::Int)
            | (Self::Long(_), OptionKind::Long)
            | (Self::String(_), OptionKind::String)
            | (Self::List(_), OptionKind::List) => true,
            (Self::Enum(v), OptionKind::Enum { values }) => values.contains(v),
            (Self::Object(obj), OptionKind::Object { type_name }) => obj.is_type(type_name),
            _ => false,
        }
    }
}

impl fmt::Debug for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "Bool({v})"),
            Self::Int(v) => write!(f, "Int({v})"),
            Self::Long(v) => write!(f, "Long({v})"),
            Self::String(v) => write!(f, "String({v:?})"),
            Self::Enum(v) => write!(f, "Enum({v})"),
            Self::List(v) => write!(f, "List({v:?})"),
            Self::Object(obj) => write!(f, "Object({})", obj.type_name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool_case_insensitive() {
        assert_eq!(OptionKind::Bool.parse("TRUE"), Ok(OptionValue::Bool(true)));
        assert_eq!(OptionKind::Bool.parse("False"), Ok(OptionValue::Bool(false)));
        assert_eq!(OptionKind::Bool.parse("yes"), Err(ParseFailure::Malformed));
    }

    #[test]
    fn test_parse_numbers() {
        assert_eq!(OptionKind::Int.parse("-12"), Ok(OptionValue::Int(-12)));
        assert_eq!(
            OptionKind::Long.parse("10000000000"),
            Ok(OptionValue::Long(10_000_000_000))
        );
        // Out of range for i32
        assert_eq!(
            OptionKind::Int.parse("10000000000"),
            Err(ParseFailure::Malformed)
        );
        assert_eq!(OptionKind::Int.parse("1.5"), Err(ParseFailure::Malformed));
    }

    #[test]
    fn test_parse_enum_is_exact() {
        let kind = OptionKind::Enum {
            values: vec!["TRIM_HORIZON".into(), "LATEST".into()],
        };
        assert_eq!(
            kind.parse("LATEST"),
            Ok(OptionValue::Enum("LATEST".into()))
        );
        assert_eq!(kind.parse("latest"), Err(ParseFailure::NotInEnum));
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(
            OptionKind::List.parse(" a, b ,,c"),
            Ok(OptionValue::List(vec!["a".into(), "b".into(), "c".into()]))
        );
    }

    #[test]
    fn test_descriptor_json_shape() {
        let desc = OptionDescriptor::enumeration("iteratorType", ["TRIM_HORIZON", "LATEST"])
            .with_default("TRIM_HORIZON")
            .required();
        let json = serde_json::to_value(&desc).unwrap();
        assert_eq!(json["name"], "iteratorType");
        assert_eq!(json["type"], "enum");
        assert_eq!(json["defaultValue"], "TRIM_HORIZON");
        assert_eq!(json["required"], true);

        let back: OptionDescriptor = serde_json::from_value(json).unwrap();
        assert_eq!(back, desc);
    }
}
