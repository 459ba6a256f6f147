//! Layered runtime configuration.
//!
//! Configuration fragments come from pluggable sources (files, directories,
//! environment variables, REST endpoints, in-memory trees), are merged into
//! one tree under a deterministic priority order, and are read back through
//! typed dot-path accessors. Observers registered on a path are notified
//! when a rebuild changes its resolved value, and a periodic trigger can
//! re-poll sources whose backing data changes at runtime.
//!
//! ```no_run
//! use laminate::{Manager, Partial, source::{MemorySource, SourceHandle}};
//!
//! # fn main() -> laminate::Result<()> {
//! let manager = Manager::new();
//! let defaults: Partial = serde_yaml::from_str("{db: {host: localhost}}").unwrap();
//! manager.add_source("defaults", 0, SourceHandle::plain(MemorySource::new(defaults)))?;
//! assert_eq!(manager.get_str("db.host")?, "localhost");
//! # Ok(())
//! # }
//! ```

pub mod decode;
pub mod error;
pub mod factory;
pub mod loader;
pub mod manager;
pub mod partial;
pub mod source;

mod trigger;

pub use decode::{Decoder, DecoderRegistry};
pub use error::{Error, Result};
pub use factory::{SourceFactory, SourceStrategy};
pub use loader::{LoaderOptions, load};
pub use manager::{Manager, ManagerOptions};
pub use partial::Partial;
pub use serde_yaml::Value;
pub use source::{ObservableSource, Source, SourceHandle};
