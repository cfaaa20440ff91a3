//! # Error Types: Structured Error Hierarchy
//!
//! Defines the error types surfaced by every jsonbind operation. All errors
//! use `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Malformed JSON text is a recoverable [`ParseError`], never a panic.
//! - Values that cannot be written as JSON surface as
//!   [`JsonError::Serialization`].
//! - Bad enrichment metadata is a [`ConfigurationError`] raised while a schema
//!   is being built, so misconfiguration shows up at startup.
//! - Validation failures carry every checker message in order via
//!   [`Violations`], never only the first.

use std::fmt;

use thiserror::Error;

/// Top-level error type for jsonbind.
#[derive(Error, Debug)]
pub enum JsonError {
    /// JSON or configuration text could not be decoded.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Schema enrichment metadata or codec configuration is invalid.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// The conformance checker could not process the schema itself.
    #[error("schema error: {0}")]
    Schema(String),

    /// A conformant schema rejected the value.
    #[error("validation failed:\n{0}")]
    Validation(Violations),

    /// A value could not be written as JSON.
    #[error("serialization error: {0}")]
    Serialization(#[source] serde_json::Error),

    /// The operation is not defined for this node kind.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// IO error reading a stream or configuration file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl JsonError {
    /// Returns the validation messages when this is a [`JsonError::Validation`].
    pub fn violations(&self) -> Option<&Violations> {
        match self {
            Self::Validation(violations) => Some(violations),
            _ => None,
        }
    }
}

/// Error decoding text into a tree or a typed value.
#[derive(Error, Debug)]
pub enum ParseError {
    /// The text is not well-formed JSON.
    #[error("malformed JSON: {0}")]
    Syntax(#[source] serde_json::Error),

    /// Well-formed JSON whose shape does not fit the requested type.
    #[error("cannot map JSON onto target type: {0}")]
    Mapping(#[source] serde_json::Error),
}

impl From<serde_json::Error> for ParseError {
    fn from(err: serde_json::Error) -> Self {
        match err.classify() {
            serde_json::error::Category::Syntax | serde_json::error::Category::Eof => {
                Self::Syntax(err)
            }
            serde_json::error::Category::Data | serde_json::error::Category::Io => {
                Self::Mapping(err)
            }
        }
    }
}

/// Invalid schema metadata or codec configuration.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    /// A default-value expression does not parse against the declared type.
    #[error("invalid default value for {property}: {reason}")]
    InvalidDefault {
        /// Owning type and property, e.g. `Order.quantity`.
        property: String,
        /// Why the expression was rejected.
        reason: String,
    },

    /// A property names a values accessor the owning type does not declare.
    #[error("values accessor '{accessor}' declared by {property} does not exist")]
    MissingAccessor {
        /// Owning type and property.
        property: String,
        /// Name of the missing accessor.
        accessor: String,
    },

    /// An enumeration literal is not a JSON array.
    #[error("invalid enum literal for {property}: {reason}")]
    InvalidEnumLiteral {
        /// Owning type and property.
        property: String,
        /// Why the literal was rejected.
        reason: String,
    },

    /// A codec configuration document could not be loaded.
    #[error("invalid configuration '{source_name}': {reason}")]
    InvalidConfig {
        /// File path or `<inline>`.
        source_name: String,
        /// Why the configuration was rejected.
        reason: String,
    },
}

/// A single validation violation with structured context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// JSON Pointer path to the violating value in the instance.
    pub instance_path: String,
    /// JSON Pointer path within the schema that triggered the error.
    pub schema_path: String,
    /// Human-readable description of the violation.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "  (root): {}", self.message)
        } else {
            write!(f, "  {}: {}", self.instance_path, self.message)
        }
    }
}

/// Ordered collection of validation violations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Violations {
    violations: Vec<Violation>,
}

impl Violations {
    /// Wrap violations in checker order.
    pub fn new(violations: Vec<Violation>) -> Self {
        Self { violations }
    }

    /// Returns the number of violations.
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Returns true if there are no violations.
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Returns a slice of all violations.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// The bare checker messages, in the order they were reported.
    pub fn messages(&self) -> Vec<&str> {
        self.violations.iter().map(|v| v.message.as_str()).collect()
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_error_classified_as_syntax() {
        let err = serde_json::from_str::<serde_json::Value>("{\"a\":").unwrap_err();
        assert!(matches!(ParseError::from(err), ParseError::Syntax(_)));
    }

    #[test]
    fn test_shape_error_classified_as_mapping() {
        let err = serde_json::from_str::<u32>("\"nope\"").unwrap_err();
        assert!(matches!(ParseError::from(err), ParseError::Mapping(_)));
    }

    #[test]
    fn test_violation_display_root() {
        let v = Violation {
            instance_path: String::new(),
            schema_path: "/required".to_string(),
            message: r#""name" is a required property"#.to_string(),
        };
        assert!(v.to_string().contains("(root)"));
    }

    #[test]
    fn test_violations_keep_order() {
        let violations = Violations::new(vec![
            Violation {
                instance_path: "/a".to_string(),
                schema_path: "/properties/a/type".to_string(),
                message: "first".to_string(),
            },
            Violation {
                instance_path: "/b".to_string(),
                schema_path: "/properties/b/type".to_string(),
                message: "second".to_string(),
            },
        ]);
        assert_eq!(violations.messages(), vec!["first", "second"]);
        let rendered = JsonError::Validation(violations).to_string();
        assert!(rendered.contains("/a: first"));
        assert!(rendered.contains("/b: second"));
    }

    #[test]
    fn test_configuration_error_names_property() {
        let err = ConfigurationError::MissingAccessor {
            property: "Order.status".to_string(),
            accessor: "statuses".to_string(),
        };
        let msg = JsonError::from(err).to_string();
        assert!(msg.contains("Order.status"));
        assert!(msg.contains("statuses"));
    }
}
