//! File-backed sources.
//!
//! [`FileSource`] decodes once at construction; [`ObservableFileSource`]
//! additionally re-reads the file when its modification time moves, so a
//! reload trigger can pick up edits made while the process runs.

use crate::decode::DecoderRegistry;
use crate::error::Result;
use crate::partial::Partial;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;

use super::{ObservableSource, Source};

/// A source decoded from one file at construction time.
pub struct FileSource {
    partial: Partial,
}

impl FileSource {
    /// Read and decode `path`. With no explicit `format`, the file extension
    /// is used, falling back to `yaml`.
    pub fn new(
        path: impl AsRef<Path>,
        format: Option<&str>,
        decoders: &DecoderRegistry,
    ) -> Result<Self> {
        let partial = read_file(path.as_ref(), format, decoders)?;
        Ok(Self { partial })
    }
}

impl Source for FileSource {
    fn partial(&self) -> Result<Partial> {
        Ok(self.partial.clone())
    }
}

/// A file source that re-reads its file when the modification time changes.
///
/// `reload` reports a change only when the decoded tree actually differs,
/// so a rewrite with identical content does not trigger a rebuild.
pub struct ObservableFileSource {
    path: PathBuf,
    format: Option<String>,
    decoders: DecoderRegistry,
    modified: SystemTime,
    partial: Partial,
}

impl ObservableFileSource {
    pub fn new(
        path: impl Into<PathBuf>,
        format: Option<&str>,
        decoders: &DecoderRegistry,
    ) -> Result<Self> {
        let path = path.into();
        let partial = read_file(&path, format, decoders)?;
        let modified = std::fs::metadata(&path)?.modified()?;
        Ok(Self {
            path,
            format: format.map(str::to_string),
            decoders: decoders.clone(),
            modified,
            partial,
        })
    }
}

impl Source for ObservableFileSource {
    fn partial(&self) -> Result<Partial> {
        Ok(self.partial.clone())
    }
}

impl ObservableSource for ObservableFileSource {
    fn reload(&mut self) -> Result<bool> {
        let modified = std::fs::metadata(&self.path)?.modified()?;
        if modified == self.modified {
            return Ok(false);
        }
        self.modified = modified;

        let partial = read_file(&self.path, self.format.as_deref(), &self.decoders)?;
        if partial == self.partial {
            return Ok(false);
        }
        debug!(path = %self.path.display(), "file source changed");
        self.partial = partial;
        Ok(true)
    }
}

fn read_file(path: &Path, format: Option<&str>, decoders: &DecoderRegistry) -> Result<Partial> {
    let format = match format {
        Some(format) => format.to_string(),
        None => path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("yaml")
            .to_string(),
    };
    let bytes = std::fs::read(path)?;
    decoders.decode(&format, &bytes)
}
