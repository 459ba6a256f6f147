//! Environment-variable source.

use crate::error::Result;
use crate::partial::Partial;
use serde_yaml::Value;

use super::Source;

/// Maps explicit environment variables onto tree paths.
///
/// The environment is read once at construction; variables that are unset
/// are simply skipped. Values are always strings; conversion, if any, is
/// the reader's concern.
#[derive(Debug, Clone)]
pub struct EnvSource {
    partial: Partial,
}

impl EnvSource {
    /// Build from `(variable, path)` pairs, applied in iteration order.
    pub fn new<V, P>(mappings: impl IntoIterator<Item = (V, P)>) -> Self
    where
        V: AsRef<str>,
        P: AsRef<str>,
    {
        let mut partial = Partial::new();
        for (variable, path) in mappings {
            if let Ok(value) = std::env::var(variable.as_ref()) {
                partial.set(path.as_ref(), Value::String(value));
            }
        }
        Self { partial }
    }
}

impl Source for EnvSource {
    fn partial(&self) -> Result<Partial> {
        Ok(self.partial.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_variables_are_mapped() {
        // process-wide env mutation; use names unique to this test
        unsafe { std::env::set_var("LAMINATE_TEST_DB_HOST", "10.0.0.5") };
        let source = EnvSource::new([
            ("LAMINATE_TEST_DB_HOST", "db.host"),
            ("LAMINATE_TEST_UNSET_VARIABLE", "db.port"),
        ]);
        let partial = source.partial().unwrap();
        assert_eq!(partial.get_str("db.host").unwrap(), "10.0.0.5");
        assert!(!partial.has("db.port"));
    }
}
