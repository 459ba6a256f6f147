//! Nested configuration trees with dot-path addressing.
//!
//! [`Partial`] wraps a single decoded value and provides the path algebra the
//! rest of the crate builds on: lookups, deep merge, typed accessors, and
//! serde-based population of caller-defined types.
//!
//! A mapping key that is not a string is invisible to path addressing and to
//! [`Partial::entries`], but is preserved verbatim through clone and merge.

pub(crate) mod convert;
mod merge;
mod path;

pub use merge::{deep_merge, deep_merge_all};
pub use path::DEFAULT_SEPARATOR;

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

/// A nested configuration tree.
///
/// Scalars, sequences, and string-keyed mappings, addressed by
/// separator-joined paths (default `.`). A stored null is a *present* value:
/// [`Partial::get`] returns it, and only a path that genuinely does not
/// resolve yields [`Error::NotFound`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Partial {
    root: Value,
}

impl Default for Partial {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Value> for Partial {
    fn from(root: Value) -> Self {
        Self::from_value(root)
    }
}

impl Partial {
    /// An empty tree (an empty mapping, so merges accumulate into it).
    pub fn new() -> Self {
        Self {
            root: Value::Mapping(Mapping::new()),
        }
    }

    /// Wrap an already-decoded value.
    pub fn from_value(root: Value) -> Self {
        Self { root }
    }

    /// Consume the tree, returning the underlying value.
    pub fn into_value(self) -> Value {
        self.root
    }

    /// Borrow the underlying value.
    pub fn as_value(&self) -> &Value {
        &self.root
    }

    /// Resolve `path`. An empty path (or one made only of separators)
    /// returns the whole tree. Descending into a non-mapping node and a
    /// missing key are reported identically as [`Error::NotFound`].
    pub fn get(&self, path: &str) -> Result<&Value> {
        self.get_with(path, DEFAULT_SEPARATOR)
    }

    /// [`Partial::get`] with a custom separator.
    pub fn get_with(&self, path: &str, separator: char) -> Result<&Value> {
        let mut node = &self.root;
        for segment in path::segments(path, separator) {
            let next = match node {
                Value::Mapping(map) => map.get(segment),
                _ => None,
            };
            node = next.ok_or_else(|| Error::not_found(path))?;
        }
        Ok(node)
    }

    /// Resolve `path`, falling back to `default` when it does not resolve.
    pub fn get_or(&self, path: &str, default: Value) -> Value {
        self.get(path).cloned().unwrap_or(default)
    }

    /// Whether `path` resolves to a value (a stored null counts).
    pub fn has(&self, path: &str) -> bool {
        self.get(path).is_ok()
    }

    /// [`Partial::has`] with a custom separator.
    pub fn has_with(&self, path: &str, separator: char) -> bool {
        self.get_with(path, separator).is_ok()
    }

    /// Top-level string keys, in insertion order. Non-string keys are
    /// skipped; nested keys are not included.
    pub fn entries(&self) -> Vec<String> {
        match &self.root {
            Value::Mapping(map) => map
                .keys()
                .filter_map(|key| key.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Store `value` at `path`, creating intermediate mappings as needed and
    /// replacing non-mapping intermediates. An empty path replaces the root.
    pub fn set(&mut self, path: &str, value: Value) {
        self.set_with(path, value, DEFAULT_SEPARATOR);
    }

    /// [`Partial::set`] with a custom separator.
    pub fn set_with(&mut self, path: &str, value: Value, separator: char) {
        let segments: Vec<&str> = path::segments(path, separator).collect();
        set_at(&mut self.root, &segments, value);
    }

    /// Deep-merge `overlay` into this tree; overlay values win on conflict.
    ///
    /// Mappings merge key-by-key; any other pairing (scalars, sequences,
    /// mismatched shapes) is replaced wholesale by the overlay value.
    pub fn merge(&mut self, overlay: Partial) {
        let base = std::mem::replace(&mut self.root, Value::Null);
        self.root = merge::deep_merge(base, overlay.root);
    }

    // Typed accessors. Each `_or` variant substitutes the default only when
    // the path does not resolve; a present value of the wrong shape is a
    // conversion error regardless of the default.

    /// Boolean at `path`.
    pub fn get_bool(&self, path: &str) -> Result<bool> {
        convert::to_bool(self.get(path)?, path)
    }

    /// Boolean at `path`, or `default` when the path does not resolve.
    pub fn get_bool_or(&self, path: &str, default: bool) -> Result<bool> {
        match self.get(path) {
            Ok(value) => convert::to_bool(value, path),
            Err(Error::NotFound { .. }) => Ok(default),
            Err(error) => Err(error),
        }
    }

    /// Integer at `path`. A float value is a conversion error, not truncated.
    pub fn get_int(&self, path: &str) -> Result<i64> {
        convert::to_int(self.get(path)?, path)
    }

    /// Integer at `path`, or `default` when the path does not resolve.
    pub fn get_int_or(&self, path: &str, default: i64) -> Result<i64> {
        match self.get(path) {
            Ok(value) => convert::to_int(value, path),
            Err(Error::NotFound { .. }) => Ok(default),
            Err(error) => Err(error),
        }
    }

    /// Float at `path`. An integer value is a conversion error, not widened.
    pub fn get_float(&self, path: &str) -> Result<f64> {
        convert::to_float(self.get(path)?, path)
    }

    /// Float at `path`, or `default` when the path does not resolve.
    pub fn get_float_or(&self, path: &str, default: f64) -> Result<f64> {
        match self.get(path) {
            Ok(value) => convert::to_float(value, path),
            Err(Error::NotFound { .. }) => Ok(default),
            Err(error) => Err(error),
        }
    }

    /// String at `path`.
    pub fn get_str(&self, path: &str) -> Result<String> {
        convert::to_str(self.get(path)?, path)
    }

    /// String at `path`, or `default` when the path does not resolve.
    pub fn get_str_or(&self, path: &str, default: impl Into<String>) -> Result<String> {
        match self.get(path) {
            Ok(value) => convert::to_str(value, path),
            Err(Error::NotFound { .. }) => Ok(default.into()),
            Err(error) => Err(error),
        }
    }

    /// Sequence at `path`.
    pub fn get_sequence(&self, path: &str) -> Result<Vec<Value>> {
        convert::to_sequence(self.get(path)?, path)
    }

    /// Sequence at `path`, or `default` when the path does not resolve.
    pub fn get_sequence_or(&self, path: &str, default: Vec<Value>) -> Result<Vec<Value>> {
        match self.get(path) {
            Ok(value) => convert::to_sequence(value, path),
            Err(Error::NotFound { .. }) => Ok(default),
            Err(error) => Err(error),
        }
    }

    /// Subtree at `path` as its own [`Partial`]. The node must be a mapping.
    pub fn get_partial(&self, path: &str) -> Result<Partial> {
        convert::to_partial(self.get(path)?, path)
    }

    /// Subtree at `path`, or `default` when the path does not resolve.
    pub fn get_partial_or(&self, path: &str, default: Partial) -> Result<Partial> {
        match self.get(path) {
            Ok(value) => convert::to_partial(value, path),
            Err(Error::NotFound { .. }) => Ok(default),
            Err(error) => Err(error),
        }
    }

    /// Deserialize the node at `path` into `T`.
    ///
    /// Absence tolerance for individual fields belongs to the target type
    /// (`#[serde(default)]`); a present field of the wrong shape fails with
    /// a conversion error.
    pub fn populate<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.populate_with(path, DEFAULT_SEPARATOR)
    }

    /// [`Partial::populate`] with a custom separator.
    pub fn populate_with<T: DeserializeOwned>(&self, path: &str, separator: char) -> Result<T> {
        let node = self.get_with(path, separator)?.clone();
        serde_yaml::from_value(node).map_err(|error| Error::conversion(path, error.to_string()))
    }
}

fn set_at(node: &mut Value, segments: &[&str], value: Value) {
    match segments {
        [] => *node = value,
        [head, rest @ ..] => {
            if !matches!(node, Value::Mapping(_)) {
                *node = Value::Mapping(Mapping::new());
            }
            if let Value::Mapping(map) = node {
                let child = map
                    .entry(Value::String((*head).to_string()))
                    .or_insert(Value::Null);
                set_at(child, rest, value);
            }
        }
    }
}
