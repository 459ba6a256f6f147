//! Aggregate-of-configs source.

use crate::error::Result;
use crate::manager::Manager;
use crate::partial::Partial;
use std::sync::Arc;

use super::Source;

/// Merges the merged views of several managers into one source.
///
/// Children are merged lowest index first, so a later child overrides an
/// earlier one at conflicting paths. Registering a manager into itself
/// (directly or through a cycle of aggregates) is unsupported.
pub struct AggregateSource {
    children: Vec<Arc<Manager>>,
}

impl AggregateSource {
    pub fn new(children: Vec<Arc<Manager>>) -> Self {
        Self { children }
    }
}

impl Source for AggregateSource {
    fn partial(&self) -> Result<Partial> {
        let mut merged = Partial::new();
        for child in &self.children {
            merged.merge(child.snapshot().as_ref().clone());
        }
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{MemorySource, SourceHandle};

    fn manager_with(yaml: &str) -> Arc<Manager> {
        let manager = Manager::new();
        let partial = Partial::from_value(serde_yaml::from_str(yaml).unwrap());
        manager
            .add_source("mem", 0, SourceHandle::plain(MemorySource::new(partial)))
            .unwrap();
        manager
    }

    #[test]
    fn test_later_child_overrides_earlier() {
        let a = manager_with("{x: 1, only_a: true}");
        let b = manager_with("{x: 2}");

        let source = AggregateSource::new(vec![a, b]);
        let merged = source.partial().unwrap();
        assert_eq!(merged.get_int("x").unwrap(), 2);
        assert_eq!(merged.get_bool("only_a").unwrap(), true);
    }
}
