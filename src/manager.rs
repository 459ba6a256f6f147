//! The aggregation engine: prioritized sources, one merged view, observers.
//!
//! The manager serializes every structural change (and the rebuild it
//! entails) behind a single lock, and publishes the merged tree through an
//! atomic swap, so a read can never observe a half-applied change and at
//! most one rebuild runs at a time.

use crate::error::{Error, Result};
use crate::partial::{DEFAULT_SEPARATOR, Partial, convert};
use crate::source::SourceHandle;
use crate::trigger::ReloadTrigger;
use arc_swap::ArcSwap;
use serde::de::DeserializeOwned;
use serde_yaml::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, warn};

/// Construction options for [`Manager`].
///
/// An explicit struct rather than ambient process state; use
/// [`ManagerOptions::default`] for the stock behavior.
#[derive(Debug, Clone)]
pub struct ManagerOptions {
    /// Path separator used by all reads through the manager.
    pub separator: char,
    /// Period of the background reload trigger. Zero disables it.
    pub poll_interval: Duration,
}

impl Default for ManagerOptions {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR,
            poll_interval: Duration::ZERO,
        }
    }
}

/// Callback invoked with `(old, new)` when an observed value changes.
///
/// Callbacks run on the thread performing the rebuild, with the manager's
/// lock held: keep them short, and never call back into the manager from
/// inside one.
pub type ObserverCallback = Box<dyn Fn(&Value, &Value) + Send>;

struct SourceRecord {
    id: String,
    priority: i64,
    handle: SourceHandle,
}

struct ObserverRecord {
    path: String,
    last: Value,
    callback: ObserverCallback,
}

#[derive(Default)]
struct Inner {
    sources: Vec<SourceRecord>,
    observers: Vec<ObserverRecord>,
}

/// Aggregates named, prioritized sources into one merged tree and notifies
/// path-scoped observers when a rebuild changes a resolved value.
///
/// Sources are applied in ascending priority order, so a numerically higher
/// priority is merged later and wins at conflicting paths; ties keep their
/// registration order.
pub struct Manager {
    separator: char,
    inner: Mutex<Inner>,
    merged: ArcSwap<Partial>,
    trigger: Mutex<Option<ReloadTrigger>>,
}

impl Manager {
    /// A manager with default options (dot separator, no reload trigger).
    pub fn new() -> Arc<Self> {
        Self::with_options(ManagerOptions::default())
    }

    /// A manager with explicit options. A non-zero `poll_interval` starts
    /// the background reload trigger.
    pub fn with_options(options: ManagerOptions) -> Arc<Self> {
        let manager = Arc::new(Self {
            separator: options.separator,
            inner: Mutex::new(Inner::default()),
            merged: ArcSwap::from_pointee(Partial::new()),
            trigger: Mutex::new(None),
        });
        if !options.poll_interval.is_zero() {
            let trigger = ReloadTrigger::spawn(Arc::downgrade(&manager), options.poll_interval);
            *manager.trigger.lock().unwrap() = Some(trigger);
        }
        manager
    }

    // Structural operations

    /// Register a source under a unique id. Rejects an id that is already
    /// registered, leaving the existing registration intact.
    pub fn add_source(
        &self,
        id: impl Into<String>,
        priority: i64,
        handle: SourceHandle,
    ) -> Result<()> {
        let id = id.into();
        let mut inner = self.inner.lock().unwrap();
        if inner.sources.iter().any(|record| record.id == id) {
            return Err(Error::DuplicateSource { id });
        }
        debug!(source = %id, priority, "adding source");
        inner.sources.push(SourceRecord {
            id,
            priority,
            handle,
        });
        // stable: equal priorities keep their insertion order
        inner.sources.sort_by_key(|record| record.priority);
        self.rebuild(&mut inner)
    }

    /// Remove a source. Unknown ids are a no-op, not an error. A close
    /// failure aborts and leaves the record registered.
    pub fn remove_source(&self, id: &str) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let Some(index) = inner.sources.iter().position(|record| record.id == id) else {
            return Ok(());
        };
        inner.sources[index].handle.close()?;
        inner.sources.remove(index);
        debug!(source = %id, "removed source");
        self.rebuild(&mut inner)
    }

    /// Remove every source. The first close failure aborts and is surfaced,
    /// mirroring per-source removal.
    pub fn remove_all_sources(&self) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        for record in &mut inner.sources {
            record.handle.close()?;
        }
        inner.sources.clear();
        self.rebuild(&mut inner)
    }

    /// Change a source's priority and re-merge.
    pub fn set_source_priority(&self, id: &str, priority: i64) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let record = inner
            .sources
            .iter_mut()
            .find(|record| record.id == id)
            .ok_or_else(|| Error::UnknownSource { id: id.to_string() })?;
        record.priority = priority;
        inner.sources.sort_by_key(|record| record.priority);
        self.rebuild(&mut inner)
    }

    /// Whether a source is registered under `id`.
    pub fn has_source(&self, id: &str) -> bool {
        self.inner
            .lock()
            .unwrap()
            .sources
            .iter()
            .any(|record| record.id == id)
    }

    /// The registered priority of a source.
    pub fn source_priority(&self, id: &str) -> Result<i64> {
        self.inner
            .lock()
            .unwrap()
            .sources
            .iter()
            .find(|record| record.id == id)
            .map(|record| record.priority)
            .ok_or_else(|| Error::UnknownSource { id: id.to_string() })
    }

    /// A fresh snapshot of one registered source's own tree.
    pub fn source_partial(&self, id: &str) -> Result<Partial> {
        let inner = self.inner.lock().unwrap();
        let record = inner
            .sources
            .iter()
            .find(|record| record.id == id)
            .ok_or_else(|| Error::UnknownSource { id: id.to_string() })?;
        record.handle.partial()
    }

    /// Registered source ids in ascending priority order.
    pub fn source_ids(&self) -> Vec<String> {
        self.inner
            .lock()
            .unwrap()
            .sources
            .iter()
            .map(|record| record.id.clone())
            .collect()
    }

    // Observers

    /// Register a callback fired whenever the resolved value at `path`
    /// changes across a rebuild. The path must currently resolve: observe
    /// a declared default, not a value that has never existed.
    pub fn add_observer(
        &self,
        path: impl Into<String>,
        callback: impl Fn(&Value, &Value) + Send + 'static,
    ) -> Result<()> {
        let path = path.into();
        let mut inner = self.inner.lock().unwrap();
        let merged = self.merged.load();
        let last = merged.get_with(&path, self.separator)?.clone();
        inner.observers.push(ObserverRecord {
            path,
            last,
            callback: Box::new(callback),
        });
        Ok(())
    }

    /// Drop every observer registered at `path`.
    pub fn remove_observer(&self, path: &str) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.observers.len();
        inner.observers.retain(|observer| observer.path != path);
        if inner.observers.len() == before {
            return Err(Error::not_found(path));
        }
        Ok(())
    }

    /// Whether any observer is registered at `path`.
    pub fn has_observer(&self, path: &str) -> bool {
        self.inner
            .lock()
            .unwrap()
            .observers
            .iter()
            .any(|observer| observer.path == path)
    }

    // Reads. All reads resolve against the current merged snapshot.

    /// The current merged tree.
    pub fn snapshot(&self) -> Arc<Partial> {
        self.merged.load_full()
    }

    /// Resolve `path` against the merged tree.
    pub fn get(&self, path: &str) -> Result<Value> {
        let merged = self.merged.load();
        merged.get_with(path, self.separator).cloned()
    }

    /// Resolve `path`, falling back to `default` when it does not resolve.
    pub fn get_or(&self, path: &str, default: Value) -> Value {
        self.get(path).unwrap_or(default)
    }

    /// Whether `path` resolves against the merged tree.
    pub fn has(&self, path: &str) -> bool {
        self.get(path).is_ok()
    }

    /// Top-level string keys of the merged tree.
    pub fn entries(&self) -> Vec<String> {
        self.merged.load().entries()
    }

    /// Boolean at `path`.
    pub fn get_bool(&self, path: &str) -> Result<bool> {
        convert::to_bool(&self.get(path)?, path)
    }

    /// Boolean at `path`, or `default` when the path does not resolve.
    pub fn get_bool_or(&self, path: &str, default: bool) -> Result<bool> {
        match self.get(path) {
            Ok(value) => convert::to_bool(&value, path),
            Err(Error::NotFound { .. }) => Ok(default),
            Err(error) => Err(error),
        }
    }

    /// Integer at `path`. A float value is a conversion error, not truncated.
    pub fn get_int(&self, path: &str) -> Result<i64> {
        convert::to_int(&self.get(path)?, path)
    }

    /// Integer at `path`, or `default` when the path does not resolve.
    pub fn get_int_or(&self, path: &str, default: i64) -> Result<i64> {
        match self.get(path) {
            Ok(value) => convert::to_int(&value, path),
            Err(Error::NotFound { .. }) => Ok(default),
            Err(error) => Err(error),
        }
    }

    /// Float at `path`. An integer value is a conversion error, not widened.
    pub fn get_float(&self, path: &str) -> Result<f64> {
        convert::to_float(&self.get(path)?, path)
    }

    /// Float at `path`, or `default` when the path does not resolve.
    pub fn get_float_or(&self, path: &str, default: f64) -> Result<f64> {
        match self.get(path) {
            Ok(value) => convert::to_float(&value, path),
            Err(Error::NotFound { .. }) => Ok(default),
            Err(error) => Err(error),
        }
    }

    /// String at `path`.
    pub fn get_str(&self, path: &str) -> Result<String> {
        convert::to_str(&self.get(path)?, path)
    }

    /// String at `path`, or `default` when the path does not resolve.
    pub fn get_str_or(&self, path: &str, default: impl Into<String>) -> Result<String> {
        match self.get(path) {
            Ok(value) => convert::to_str(&value, path),
            Err(Error::NotFound { .. }) => Ok(default.into()),
            Err(error) => Err(error),
        }
    }

    /// Sequence at `path`.
    pub fn get_sequence(&self, path: &str) -> Result<Vec<Value>> {
        convert::to_sequence(&self.get(path)?, path)
    }

    /// Sequence at `path`, or `default` when the path does not resolve.
    pub fn get_sequence_or(&self, path: &str, default: Vec<Value>) -> Result<Vec<Value>> {
        match self.get(path) {
            Ok(value) => convert::to_sequence(&value, path),
            Err(Error::NotFound { .. }) => Ok(default),
            Err(error) => Err(error),
        }
    }

    /// Subtree at `path` as its own [`Partial`].
    pub fn get_partial(&self, path: &str) -> Result<Partial> {
        convert::to_partial(&self.get(path)?, path)
    }

    /// Subtree at `path`, or `default` when the path does not resolve.
    pub fn get_partial_or(&self, path: &str, default: Partial) -> Result<Partial> {
        match self.get(path) {
            Ok(value) => convert::to_partial(&value, path),
            Err(Error::NotFound { .. }) => Ok(default),
            Err(error) => Err(error),
        }
    }

    /// Deserialize the node at `path` into `T`.
    pub fn populate<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.merged.load().populate_with(path, self.separator)
    }

    // Reload & shutdown

    /// Poll every observable source and rebuild once if any reported a
    /// change. Individual poll failures are logged and swallowed so one
    /// unreachable source cannot starve the others.
    pub fn reload(&self) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let mut changed = false;
        for record in &mut inner.sources {
            match record.handle.reload() {
                None => {}
                Some(Ok(source_changed)) => changed |= source_changed,
                Some(Err(error)) => {
                    warn!(source = %record.id, %error, "source reload failed; keeping last snapshot");
                }
            }
        }
        if changed {
            self.rebuild(&mut inner)?;
        }
        Ok(())
    }

    /// Close every source (first failure aborts and is surfaced), then stop
    /// the reload trigger. Idempotent: a second call is a no-op.
    pub fn close(&self) -> Result<()> {
        {
            let mut inner = self.inner.lock().unwrap();
            for record in &mut inner.sources {
                record.handle.close()?;
            }
            inner.sources.clear();
        }
        // join outside the state lock: an in-flight tick may be waiting on it
        let trigger = self.trigger.lock().unwrap().take();
        if let Some(trigger) = trigger {
            trigger.stop();
        }
        Ok(())
    }

    /// Recompute the merged tree from scratch, swap it in, then evaluate
    /// observers against the new tree. Runs with the state lock held.
    fn rebuild(&self, inner: &mut Inner) -> Result<()> {
        let mut merged = Partial::new();
        for record in &inner.sources {
            merged.merge(record.handle.partial()?);
        }
        let merged = Arc::new(merged);
        self.merged.store(Arc::clone(&merged));
        debug!(sources = inner.sources.len(), "rebuilt merged configuration");

        for observer in &mut inner.observers {
            // a path that stops resolving is not reported as "changed to nil"
            let Ok(value) = merged.get_with(&observer.path, self.separator) else {
                continue;
            };
            if *value != observer.last {
                let previous = std::mem::replace(&mut observer.last, value.clone());
                (observer.callback)(&previous, value);
            }
        }
        Ok(())
    }
}

impl Drop for Manager {
    fn drop(&mut self) {
        if let Some(trigger) = self.trigger.lock().unwrap().take() {
            trigger.stop();
        }
    }
}
