//! Pluggable decoders turning raw bytes into configuration trees.
//!
//! Decoders are consulted as an ordered strategy list: the first one whose
//! `accepts` matches the requested format wins, mirroring the source
//! factory's first-match rule.

use crate::error::{Error, Result};
use crate::partial::Partial;
use serde_yaml::{Mapping, Value};
use std::sync::Arc;

/// A format-keyed decoder: `bytes -> tree`.
pub trait Decoder: Send + Sync {
    /// Whether this decoder handles the given format name.
    fn accepts(&self, format: &str) -> bool;

    /// Decode raw bytes into a tree.
    fn decode(&self, bytes: &[u8]) -> Result<Partial>;
}

/// YAML decoder, accepting `yaml` and `yml`.
pub struct YamlDecoder;

impl Decoder for YamlDecoder {
    fn accepts(&self, format: &str) -> bool {
        matches!(format, "yaml" | "yml")
    }

    fn decode(&self, bytes: &[u8]) -> Result<Partial> {
        let value: Value = serde_yaml::from_slice(bytes)?;
        Ok(Partial::from_value(normalize(value)))
    }
}

/// JSON decoder, accepting `json`.
pub struct JsonDecoder;

impl Decoder for JsonDecoder {
    fn accepts(&self, format: &str) -> bool {
        format == "json"
    }

    fn decode(&self, bytes: &[u8]) -> Result<Partial> {
        let json: serde_json::Value = serde_json::from_slice(bytes)?;
        let value = serde_yaml::to_value(json)?;
        Ok(Partial::from_value(normalize(value)))
    }
}

/// An empty document decodes to null; a null root would replace the whole
/// accumulated tree on merge, so it is normalized to an empty mapping.
fn normalize(value: Value) -> Value {
    match value {
        Value::Null => Value::Mapping(Mapping::new()),
        other => other,
    }
}

/// Ordered decoder registry; first accepting decoder wins.
#[derive(Clone)]
pub struct DecoderRegistry {
    decoders: Vec<Arc<dyn Decoder>>,
}

impl DecoderRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            decoders: Vec::new(),
        }
    }

    /// A registry with the built-in YAML and JSON decoders.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(YamlDecoder);
        registry.register(JsonDecoder);
        registry
    }

    /// Append a decoder. Registration order is consultation order.
    pub fn register(&mut self, decoder: impl Decoder + 'static) {
        self.decoders.push(Arc::new(decoder));
    }

    /// Whether any registered decoder handles `format`.
    pub fn accepts(&self, format: &str) -> bool {
        self.decoders.iter().any(|d| d.accepts(format))
    }

    /// Decode `bytes` with the first decoder accepting `format`.
    pub fn decode(&self, format: &str, bytes: &[u8]) -> Result<Partial> {
        for decoder in &self.decoders {
            if decoder.accepts(format) {
                return decoder.decode(bytes);
            }
        }
        Err(Error::UnknownFormat {
            format: format.to_string(),
        })
    }
}

impl Default for DecoderRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_decode() {
        let registry = DecoderRegistry::with_defaults();
        let partial = registry.decode("yaml", b"a:\n  b: 1\n").unwrap();
        assert_eq!(partial.get_int("a.b").unwrap(), 1);
    }

    #[test]
    fn test_json_decode() {
        let registry = DecoderRegistry::with_defaults();
        let partial = registry.decode("json", br#"{"a": {"b": true}}"#).unwrap();
        assert_eq!(partial.get_bool("a.b").unwrap(), true);
    }

    #[test]
    fn test_unknown_format() {
        let registry = DecoderRegistry::with_defaults();
        assert!(matches!(
            registry.decode("toml", b""),
            Err(Error::UnknownFormat { .. })
        ));
    }

    #[test]
    fn test_empty_document_is_empty_mapping() {
        let registry = DecoderRegistry::with_defaults();
        let partial = registry.decode("yaml", b"").unwrap();
        assert_eq!(partial, Partial::new());
    }

    #[test]
    fn test_invalid_yaml_surfaces_decoder_error() {
        let registry = DecoderRegistry::with_defaults();
        assert!(matches!(
            registry.decode("yaml", b"a: [unclosed"),
            Err(Error::Yaml(_))
        ));
    }

    #[test]
    fn test_first_accepting_decoder_wins() {
        struct Always;
        impl Decoder for Always {
            fn accepts(&self, _format: &str) -> bool {
                true
            }
            fn decode(&self, _bytes: &[u8]) -> Result<Partial> {
                let mut p = Partial::new();
                p.set("via", serde_yaml::Value::String("always".into()));
                Ok(p)
            }
        }

        let mut registry = DecoderRegistry::new();
        registry.register(Always);
        registry.register(YamlDecoder);
        let partial = registry.decode("yaml", b"x: 1").unwrap();
        assert_eq!(partial.get_str("via").unwrap(), "always");
    }
}
