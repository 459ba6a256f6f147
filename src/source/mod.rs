//! Configuration sources.
//!
//! A [`Source`] provides one tree snapshot; an [`ObservableSource`] can
//! additionally be polled for changes in its backing data. The manager only
//! depends on these capabilities, never on a concrete source.
//!
//! Every concrete source fails closed: a backing input that cannot be read
//! or decoded at construction time yields a constructor error, never an
//! empty source that silently reports nothing.

mod aggregate;
mod dir;
mod env;
mod file;
mod memory;
mod rest;

pub use aggregate::AggregateSource;
pub use dir::DirSource;
pub use env::EnvSource;
pub use file::{FileSource, ObservableFileSource};
pub use memory::MemorySource;
pub use rest::{ObservableRestSource, RestSource};

use crate::error::Result;
use crate::partial::Partial;
use serde_yaml::Value;

/// A read-only provider of one configuration tree snapshot.
pub trait Source: Send {
    /// The full snapshot the manager merges.
    fn partial(&self) -> Result<Partial>;

    /// Resolve a path against this source's own tree.
    fn get(&self, path: &str) -> Result<Value> {
        self.partial()?.get(path).cloned()
    }

    /// Whether a path resolves against this source's own tree.
    fn has(&self, path: &str) -> bool {
        self.get(path).is_ok()
    }

    /// Release any resources held by the source. Default is a no-op.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// A source whose backing data can change at runtime.
pub trait ObservableSource: Source {
    /// Poll the backing data. Returns whether the snapshot changed.
    fn reload(&mut self) -> Result<bool>;
}

/// A registered source, tagged with whether it can be polled.
pub enum SourceHandle {
    Plain(Box<dyn Source>),
    Observable(Box<dyn ObservableSource>),
}

impl SourceHandle {
    /// Wrap a plain source.
    pub fn plain(source: impl Source + 'static) -> Self {
        SourceHandle::Plain(Box::new(source))
    }

    /// Wrap an observable source.
    pub fn observable(source: impl ObservableSource + 'static) -> Self {
        SourceHandle::Observable(Box::new(source))
    }

    pub(crate) fn partial(&self) -> Result<Partial> {
        match self {
            SourceHandle::Plain(source) => source.partial(),
            SourceHandle::Observable(source) => source.partial(),
        }
    }

    pub(crate) fn close(&mut self) -> Result<()> {
        match self {
            SourceHandle::Plain(source) => source.close(),
            SourceHandle::Observable(source) => source.close(),
        }
    }

    /// Poll an observable source; `None` for plain sources.
    pub(crate) fn reload(&mut self) -> Option<Result<bool>> {
        match self {
            SourceHandle::Plain(_) => None,
            SourceHandle::Observable(source) => Some(source.reload()),
        }
    }
}
