//! # Codec Configuration
//!
//! [`CodecConfig`] is read once when a codec or schema factory is built and
//! is immutable afterwards. It can be written in YAML or JSON.
//!
//! ```yaml
//! omit_nulls: true
//! pretty: false
//! schema_dialect: "http://json-schema.org/draft-03/schema#"
//! formats:
//!   Uri: uri
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigurationError, JsonError};

/// `$schema` URI written into schema documents by default.
pub const DRAFT_03_URI: &str = "http://json-schema.org/draft-03/schema#";

/// Settings shared by the codec and the schema factory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CodecConfig {
    /// Drop struct fields whose value is `null` when serializing. Members of
    /// `Value` and `ValueNode` trees are always written.
    pub omit_nulls: bool,
    /// Pretty-print serialized output.
    pub pretty: bool,
    /// URI placed in the `$schema` header of schema documents.
    pub schema_dialect: String,
    /// Extra type name to format tag registrations, layered over the defaults.
    pub formats: BTreeMap<String, String>,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            omit_nulls: true,
            pretty: false,
            schema_dialect: DRAFT_03_URI.to_string(),
            formats: BTreeMap::new(),
        }
    }
}

impl CodecConfig {
    /// Parse a YAML configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidConfig`] if the text is not a
    /// valid configuration.
    pub fn from_yaml_str(text: &str) -> Result<Self, JsonError> {
        serde_yaml::from_str(text).map_err(|e| invalid("<inline>", format!("invalid YAML: {e}")))
    }

    /// Parse a JSON configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidConfig`] if the text is not a
    /// valid configuration.
    pub fn from_json_str(text: &str) -> Result<Self, JsonError> {
        serde_json::from_str(text).map_err(|e| invalid("<inline>", format!("invalid JSON: {e}")))
    }

    /// Load a configuration file. `.yaml`/`.yml` files are read as YAML,
    /// anything else as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`JsonError::Io`] if the file cannot be read and
    /// [`ConfigurationError::InvalidConfig`] if it cannot be decoded.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, JsonError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let source_name = path.display().to_string();

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let config = match ext {
            "yaml" | "yml" => serde_yaml::from_str(&content)
                .map_err(|e| invalid(&source_name, format!("invalid YAML: {e}")))?,
            _ => serde_json::from_str(&content)
                .map_err(|e| invalid(&source_name, format!("invalid JSON: {e}")))?,
        };
        tracing::debug!(path = %source_name, "loaded codec configuration");
        Ok(config)
    }
}

fn invalid(source_name: &str, reason: String) -> JsonError {
    JsonError::Configuration(ConfigurationError::InvalidConfig {
        source_name: source_name.to_string(),
        reason,
    })
}
