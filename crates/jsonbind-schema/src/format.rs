//! # Format Registry
//!
//! Maps type names to the symbolic `format` tag written into string
//! fragments. Lookup tries the exact type first, then each ancestor in the
//! type's lineage.
//!
//! The registry is filled while a [`SchemaFactory`](crate::SchemaFactory) is
//! being configured and is read-only once the factory owns it.

use std::collections::HashMap;

use jsonbind_core::CodecConfig;

use crate::descriptor::TypeName;

/// Format tag for file path strings.
pub const FILE_FORMAT: &str = "file";

/// Format tag for binary stream tokens.
pub const INPUT_STREAM_FORMAT: &str = "inputstream";

/// Type name to format tag lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatRegistry {
    formats: HashMap<String, String>,
}

impl Default for FormatRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register("PathBuf", FILE_FORMAT);
        registry.register("ByteStream", INPUT_STREAM_FORMAT);
        registry
    }
}

impl FormatRegistry {
    /// A registry with no registrations at all.
    pub fn empty() -> Self {
        Self {
            formats: HashMap::new(),
        }
    }

    /// The default registrations overlaid with `config.formats`.
    pub fn from_config(config: &CodecConfig) -> Self {
        let mut registry = Self::default();
        for (type_name, tag) in &config.formats {
            registry.register(type_name.clone(), tag.clone());
        }
        registry
    }

    /// Registers `tag` for `type_name`, replacing any earlier registration.
    pub fn register(&mut self, type_name: impl Into<String>, tag: impl Into<String>) {
        self.formats.insert(type_name.into(), tag.into());
    }

    /// Resolves the format tag for `type_name`, walking its lineage.
    pub fn resolve(&self, type_name: &TypeName) -> Option<&str> {
        type_name
            .lineage()
            .find_map(|name| self.formats.get(name))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.formats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registrations() {
        let registry = FormatRegistry::default();
        assert_eq!(registry.resolve(&TypeName::new("PathBuf")), Some("file"));
        assert_eq!(
            registry.resolve(&TypeName::new("ByteStream")),
            Some("inputstream")
        );
        assert_eq!(registry.resolve(&TypeName::new("String")), None);
    }

    #[test]
    fn test_exact_match_wins_over_ancestor() {
        let mut registry = FormatRegistry::empty();
        registry.register("Resource", "resource");
        registry.register("Image", "image");
        let name = TypeName::new("Image").extends("Resource");
        assert_eq!(registry.resolve(&name), Some("image"));
    }

    #[test]
    fn test_first_matching_ancestor() {
        let mut registry = FormatRegistry::empty();
        registry.register("Resource", "resource");
        registry.register("Blob", "blob");
        let name = TypeName::new("Thumbnail")
            .extends("Image")
            .extends("Blob")
            .extends("Resource");
        assert_eq!(registry.resolve(&name), Some("blob"));
    }

    #[test]
    fn test_config_overlays_defaults() {
        let config = CodecConfig::from_yaml_str("formats:\n  PathBuf: path\n  Url: uri\n").unwrap();
        let registry = FormatRegistry::from_config(&config);
        assert_eq!(registry.resolve(&TypeName::new("PathBuf")), Some("path"));
        assert_eq!(registry.resolve(&TypeName::new("Url")), Some("uri"));
        assert_eq!(
            registry.resolve(&TypeName::new("ByteStream")),
            Some("inputstream")
        );
        assert_eq!(registry.len(), 3);
    }
}
