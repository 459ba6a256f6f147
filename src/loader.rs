//! Bootstrap loading: one root file source plus declared further sources.
//!
//! The loader reads a root configuration file, registers it at priority 0,
//! then looks up a list of source descriptors inside the now-merged tree and
//! registers each of them through the factory. Well-known defaults can be
//! overridden per option or through `LAMINATE_*` environment variables via
//! [`LoaderOptions::discover`].

use crate::error::{Error, Result};
use crate::factory::SourceFactory;
use crate::manager::{Manager, ManagerOptions};
use crate::partial::{DEFAULT_SEPARATOR, Partial};
use crate::source::{FileSource, SourceHandle};
use serde_yaml::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Explicit loader configuration. No ambient global state: construct with
/// [`LoaderOptions::default`], [`LoaderOptions::discover`], or by hand.
#[derive(Debug, Clone)]
pub struct LoaderOptions {
    /// Id the root file source is registered under.
    pub root_id: String,
    /// Path of the root configuration file.
    pub root_path: PathBuf,
    /// Decode format of the root file; `None` uses the file extension.
    pub root_format: Option<String>,
    /// Path (inside the merged tree) of the list of source descriptors.
    pub sources_path: String,
    /// Path separator for the manager.
    pub separator: char,
    /// Reload poll period; zero disables the trigger.
    pub poll_interval: Duration,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            root_id: "root".to_string(),
            root_path: PathBuf::from("config.yaml"),
            root_format: None,
            sources_path: "sources".to_string(),
            separator: DEFAULT_SEPARATOR,
            poll_interval: Duration::ZERO,
        }
    }
}

impl LoaderOptions {
    /// Defaults with `LAMINATE_*` environment overrides applied:
    /// `LAMINATE_ROOT_ID`, `LAMINATE_ROOT_PATH`, `LAMINATE_ROOT_FORMAT`,
    /// `LAMINATE_SOURCES_PATH`, `LAMINATE_SEPARATOR`,
    /// `LAMINATE_POLL_INTERVAL_SECS`.
    ///
    /// Without an explicit root path, a `config.yaml` in the working
    /// directory is preferred, falling back to
    /// `~/.config/laminate/config.yaml`.
    pub fn discover() -> Self {
        let mut options = Self::default();

        if let Ok(id) = std::env::var("LAMINATE_ROOT_ID") {
            options.root_id = id;
        }
        if let Ok(path) = std::env::var("LAMINATE_ROOT_PATH") {
            options.root_path = PathBuf::from(path);
        } else if !options.root_path.exists()
            && let Some(home) = dirs::home_dir()
        {
            options.root_path = home.join(".config/laminate/config.yaml");
        }
        if let Ok(format) = std::env::var("LAMINATE_ROOT_FORMAT") {
            options.root_format = Some(format);
        }
        if let Ok(path) = std::env::var("LAMINATE_SOURCES_PATH") {
            options.sources_path = path;
        }
        if let Ok(separator) = std::env::var("LAMINATE_SEPARATOR")
            && let Some(first) = separator.chars().next()
        {
            options.separator = first;
        }
        if let Ok(seconds) = std::env::var("LAMINATE_POLL_INTERVAL_SECS")
            && let Ok(seconds) = seconds.parse()
        {
            options.poll_interval = Duration::from_secs(seconds);
        }

        options
    }
}

/// Load the root file and every source it declares.
///
/// Descriptor entries need a string `id` and may carry an integer
/// `priority` (default 0) alongside their type-specific fields. A malformed
/// entry aborts the whole load; an absent or empty list is not an error.
pub fn load(options: LoaderOptions, factory: &SourceFactory) -> Result<Arc<Manager>> {
    let manager = Manager::with_options(ManagerOptions {
        separator: options.separator,
        poll_interval: options.poll_interval,
    });

    let root = FileSource::new(&options.root_path, options.root_format.as_deref(), factory.decoders())?;
    manager.add_source(options.root_id.clone(), 0, SourceHandle::plain(root))?;
    debug!(path = %options.root_path.display(), "loaded root source");

    let declared = match manager.get(&options.sources_path) {
        Err(Error::NotFound { .. }) => return Ok(manager),
        other => other?,
    };
    let Value::Sequence(entries) = declared else {
        return Err(Error::conversion(
            &options.sources_path,
            "expected a sequence of source descriptors",
        ));
    };

    for entry in entries {
        let descriptor = Partial::from_value(entry);
        let id = match descriptor.get("id") {
            Ok(Value::String(id)) => id.clone(),
            _ => return Err(Error::missing_field("id")),
        };
        let priority = descriptor.get_int_or("priority", 0)?;
        let handle = factory.build(&descriptor)?;
        manager.add_source(id, priority, handle)?;
    }

    Ok(manager)
}
