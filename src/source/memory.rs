//! In-memory source over a caller-supplied tree.

use crate::error::Result;
use crate::partial::Partial;

use super::Source;

/// Serves a fixed tree handed over at construction. Useful for defaults,
/// test fixtures, and programmatic overrides.
#[derive(Debug, Clone)]
pub struct MemorySource {
    partial: Partial,
}

impl MemorySource {
    pub fn new(partial: Partial) -> Self {
        Self { partial }
    }
}

impl Source for MemorySource {
    fn partial(&self) -> Result<Partial> {
        Ok(self.partial.clone())
    }
}

impl From<Partial> for MemorySource {
    fn from(partial: Partial) -> Self {
        Self::new(partial)
    }
}
