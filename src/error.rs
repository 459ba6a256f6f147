//! Structured error types for configuration operations.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by trees, sources, the manager, the factory, and the loader.
///
/// I/O, decoding, and HTTP failures are carried verbatim so callers can
/// inspect the original cause instead of a re-wrapped message.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The path does not resolve to a value. Covers both a missing key and a
    /// walk that runs into a non-mapping node; callers checking optional
    /// configuration should not need to tell those apart.
    #[error("no value found at path `{path}`")]
    NotFound { path: String },

    /// No source is registered under the given id.
    #[error("no source registered under id `{id}`")]
    UnknownSource { id: String },

    /// A source with the given id is already registered.
    #[error("a source is already registered under id `{id}`")]
    DuplicateSource { id: String },

    /// A value is present but does not have the requested shape.
    #[error("cannot convert value at `{path}`: {message}")]
    Conversion { path: String, message: String },

    /// No factory strategy accepts the descriptor's `type`.
    #[error("invalid source type `{kind}`")]
    InvalidSourceType { kind: String },

    /// No registered decoder accepts the format.
    #[error("no decoder registered for format `{format}`")]
    UnknownFormat { format: String },

    /// A required descriptor field is missing or has the wrong type.
    #[error("descriptor field `{field}` is missing or not of the expected type")]
    MissingField { field: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl Error {
    // Convenience constructors

    pub(crate) fn not_found(path: impl Into<String>) -> Self {
        Error::NotFound { path: path.into() }
    }

    pub(crate) fn conversion(path: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Conversion {
            path: path.into(),
            message: message.into(),
        }
    }

    pub(crate) fn type_mismatch(
        path: impl Into<String>,
        expected: &'static str,
        found: &'static str,
    ) -> Self {
        Error::conversion(path, format!("expected {expected}, found {found}"))
    }

    pub(crate) fn missing_field(field: impl Into<String>) -> Self {
        Error::MissingField {
            field: field.into(),
        }
    }

    /// True when the error is the not-found kind, for either a path or a
    /// registered source.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. } | Error::UnknownSource { .. })
    }
}
