//! Declarative source construction.
//!
//! A descriptor is a small tree with a `type` discriminator plus
//! type-specific fields. The factory consults an ordered list of
//! strategies; the first one whose `accepts` matches builds the source.

use crate::decode::DecoderRegistry;
use crate::error::{Error, Result};
use crate::partial::Partial;
use crate::source::{
    DirSource, EnvSource, FileSource, MemorySource, ObservableFileSource, ObservableRestSource,
    RestSource, SourceHandle,
};
use serde_yaml::Value;

/// Builds one kind of source from a matching descriptor.
pub trait SourceStrategy: Send + Sync {
    /// Whether this strategy handles the descriptor.
    fn accepts(&self, descriptor: &Partial) -> bool;

    /// Build the source. Only called when `accepts` returned true.
    fn build(&self, descriptor: &Partial, decoders: &DecoderRegistry) -> Result<SourceHandle>;
}

/// Ordered strategy registry; the first strategy accepting a descriptor
/// wins, so custom strategies registered early can shadow the defaults.
pub struct SourceFactory {
    strategies: Vec<Box<dyn SourceStrategy>>,
    decoders: DecoderRegistry,
}

impl SourceFactory {
    /// An empty factory over the given decoders.
    pub fn new(decoders: DecoderRegistry) -> Self {
        Self {
            strategies: Vec::new(),
            decoders,
        }
    }

    /// A factory with every built-in strategy and the default decoders.
    pub fn with_defaults() -> Self {
        let mut factory = Self::new(DecoderRegistry::with_defaults());
        factory.register(MemoryStrategy);
        factory.register(FileStrategy);
        factory.register(ObservableFileStrategy);
        factory.register(DirStrategy);
        factory.register(EnvStrategy);
        factory.register(RestStrategy);
        factory.register(ObservableRestStrategy);
        factory
    }

    /// Append a strategy. Registration order is consultation order.
    pub fn register(&mut self, strategy: impl SourceStrategy + 'static) {
        self.strategies.push(Box::new(strategy));
    }

    /// The decoder registry handed to strategies.
    pub fn decoders(&self) -> &DecoderRegistry {
        &self.decoders
    }

    /// Build a source from a descriptor.
    pub fn build(&self, descriptor: &Partial) -> Result<SourceHandle> {
        for strategy in &self.strategies {
            if strategy.accepts(descriptor) {
                return strategy.build(descriptor, &self.decoders);
            }
        }
        Err(Error::InvalidSourceType {
            kind: descriptor.get_str_or("type", "").unwrap_or_default(),
        })
    }
}

fn is_type(descriptor: &Partial, kind: &str) -> bool {
    descriptor
        .get_str("type")
        .map(|value| value == kind)
        .unwrap_or(false)
}

fn require_str(descriptor: &Partial, field: &str) -> Result<String> {
    match descriptor.get(field) {
        Ok(Value::String(value)) => Ok(value.clone()),
        _ => Err(Error::missing_field(field)),
    }
}

fn optional_str(descriptor: &Partial, field: &str) -> Result<Option<String>> {
    match descriptor.get(field) {
        Ok(Value::String(value)) => Ok(Some(value.clone())),
        Ok(_) => Err(Error::missing_field(field)),
        Err(_) => Ok(None),
    }
}

fn optional_bool(descriptor: &Partial, field: &str) -> Result<bool> {
    match descriptor.get(field) {
        Ok(Value::Bool(value)) => Ok(*value),
        Ok(_) => Err(Error::missing_field(field)),
        Err(_) => Ok(false),
    }
}

/// `{type: memory, partial: {...}}`
pub struct MemoryStrategy;

impl SourceStrategy for MemoryStrategy {
    fn accepts(&self, descriptor: &Partial) -> bool {
        is_type(descriptor, "memory")
    }

    fn build(&self, descriptor: &Partial, _decoders: &DecoderRegistry) -> Result<SourceHandle> {
        let partial = descriptor
            .get_partial("partial")
            .map_err(|_| Error::missing_field("partial"))?;
        Ok(SourceHandle::plain(MemorySource::new(partial)))
    }
}

/// `{type: file, path, format?}`
pub struct FileStrategy;

impl SourceStrategy for FileStrategy {
    fn accepts(&self, descriptor: &Partial) -> bool {
        is_type(descriptor, "file")
    }

    fn build(&self, descriptor: &Partial, decoders: &DecoderRegistry) -> Result<SourceHandle> {
        let path = require_str(descriptor, "path")?;
        let format = optional_str(descriptor, "format")?;
        let source = FileSource::new(path, format.as_deref(), decoders)?;
        Ok(SourceHandle::plain(source))
    }
}

/// `{type: observable_file, path, format?}`
pub struct ObservableFileStrategy;

impl SourceStrategy for ObservableFileStrategy {
    fn accepts(&self, descriptor: &Partial) -> bool {
        is_type(descriptor, "observable_file")
    }

    fn build(&self, descriptor: &Partial, decoders: &DecoderRegistry) -> Result<SourceHandle> {
        let path = require_str(descriptor, "path")?;
        let format = optional_str(descriptor, "format")?;
        let source = ObservableFileSource::new(path, format.as_deref(), decoders)?;
        Ok(SourceHandle::observable(source))
    }
}

/// `{type: dir, path, recursive?}`
pub struct DirStrategy;

impl SourceStrategy for DirStrategy {
    fn accepts(&self, descriptor: &Partial) -> bool {
        is_type(descriptor, "dir")
    }

    fn build(&self, descriptor: &Partial, decoders: &DecoderRegistry) -> Result<SourceHandle> {
        let path = require_str(descriptor, "path")?;
        let recursive = optional_bool(descriptor, "recursive")?;
        let source = DirSource::new(path, recursive, decoders)?;
        Ok(SourceHandle::plain(source))
    }
}

/// `{type: env, mappings: {VAR: dotted.path, ...}}`
pub struct EnvStrategy;

impl SourceStrategy for EnvStrategy {
    fn accepts(&self, descriptor: &Partial) -> bool {
        is_type(descriptor, "env")
    }

    fn build(&self, descriptor: &Partial, _decoders: &DecoderRegistry) -> Result<SourceHandle> {
        let Ok(Value::Mapping(map)) = descriptor.get("mappings") else {
            return Err(Error::missing_field("mappings"));
        };

        let mut pairs = Vec::with_capacity(map.len());
        for (variable, path) in map {
            let (Some(variable), Some(path)) = (variable.as_str(), path.as_str()) else {
                return Err(Error::missing_field("mappings"));
            };
            pairs.push((variable.to_string(), path.to_string()));
        }
        Ok(SourceHandle::plain(EnvSource::new(pairs)))
    }
}

/// `{type: rest, uri, format?}`; format defaults to `json`.
pub struct RestStrategy;

impl SourceStrategy for RestStrategy {
    fn accepts(&self, descriptor: &Partial) -> bool {
        is_type(descriptor, "rest")
    }

    fn build(&self, descriptor: &Partial, decoders: &DecoderRegistry) -> Result<SourceHandle> {
        let uri = require_str(descriptor, "uri")?;
        let format = optional_str(descriptor, "format")?.unwrap_or_else(|| "json".to_string());
        let source = RestSource::new(&uri, &format, decoders)?;
        Ok(SourceHandle::plain(source))
    }
}

/// `{type: observable_rest, uri, format?, path: {config, timestamp}}`
pub struct ObservableRestStrategy;

impl SourceStrategy for ObservableRestStrategy {
    fn accepts(&self, descriptor: &Partial) -> bool {
        is_type(descriptor, "observable_rest")
    }

    fn build(&self, descriptor: &Partial, decoders: &DecoderRegistry) -> Result<SourceHandle> {
        let uri = require_str(descriptor, "uri")?;
        let format = optional_str(descriptor, "format")?.unwrap_or_else(|| "json".to_string());
        let config_path = require_str(descriptor, "path.config")?;
        let timestamp_path = require_str(descriptor, "path.timestamp")?;
        let source =
            ObservableRestSource::new(&uri, &format, &config_path, &timestamp_path, decoders)?;
        Ok(SourceHandle::observable(source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(yaml: &str) -> Partial {
        Partial::from_value(serde_yaml::from_str(yaml).unwrap())
    }

    #[test]
    fn test_memory_descriptor() {
        let factory = SourceFactory::with_defaults();
        let handle = factory
            .build(&descriptor("{type: memory, partial: {a: 1}}"))
            .unwrap();
        assert_eq!(handle.partial().unwrap().get_int("a").unwrap(), 1);
    }

    #[test]
    fn test_file_descriptor() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("app.yaml");
        std::fs::write(&path, "env: staging\n").unwrap();

        let factory = SourceFactory::with_defaults();
        let handle = factory
            .build(&descriptor(&format!(
                "{{type: file, path: {}}}",
                path.display()
            )))
            .unwrap();
        assert_eq!(handle.partial().unwrap().get_str("env").unwrap(), "staging");
    }

    #[test]
    fn test_env_descriptor() {
        unsafe { std::env::set_var("LAMINATE_FACTORY_TEST_HOST", "envhost") };
        let factory = SourceFactory::with_defaults();
        let handle = factory
            .build(&descriptor(
                "{type: env, mappings: {LAMINATE_FACTORY_TEST_HOST: db.host}}",
            ))
            .unwrap();
        assert_eq!(
            handle.partial().unwrap().get_str("db.host").unwrap(),
            "envhost"
        );
    }

    #[test]
    fn test_unknown_type() {
        let factory = SourceFactory::with_defaults();
        let result = factory.build(&descriptor("{type: carrier-pigeon}"));
        assert!(matches!(
            result,
            Err(Error::InvalidSourceType { kind }) if kind == "carrier-pigeon"
        ));
    }

    #[test]
    fn test_missing_required_field() {
        let factory = SourceFactory::with_defaults();
        let result = factory.build(&descriptor("{type: file}"));
        assert!(matches!(
            result,
            Err(Error::MissingField { field }) if field == "path"
        ));

        // wrong type counts as missing too
        let result = factory.build(&descriptor("{type: file, path: 42}"));
        assert!(matches!(result, Err(Error::MissingField { .. })));
    }

    #[test]
    fn test_first_accepting_strategy_wins() {
        struct Shadow;
        impl SourceStrategy for Shadow {
            fn accepts(&self, descriptor: &Partial) -> bool {
                is_type(descriptor, "memory")
            }
            fn build(
                &self,
                _descriptor: &Partial,
                _decoders: &DecoderRegistry,
            ) -> Result<SourceHandle> {
                let mut partial = Partial::new();
                partial.set("via", Value::String("shadow".into()));
                Ok(SourceHandle::plain(MemorySource::new(partial)))
            }
        }

        let mut factory = SourceFactory::new(DecoderRegistry::with_defaults());
        factory.register(Shadow);
        factory.register(MemoryStrategy);

        let handle = factory
            .build(&descriptor("{type: memory, partial: {a: 1}}"))
            .unwrap();
        assert_eq!(handle.partial().unwrap().get_str("via").unwrap(), "shadow");
    }
}
