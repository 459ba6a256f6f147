//! Directory-backed source.

use crate::decode::DecoderRegistry;
use crate::error::Result;
use crate::partial::Partial;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::Source;

/// Decodes every recognized file under a directory into one merged tree.
///
/// Files are visited in sorted path order so the merged result is
/// deterministic; files whose extension no decoder accepts are skipped.
pub struct DirSource {
    partial: Partial,
}

impl DirSource {
    pub fn new(
        path: impl AsRef<Path>,
        recursive: bool,
        decoders: &DecoderRegistry,
    ) -> Result<Self> {
        let mut partial = Partial::new();
        load_dir(path.as_ref(), recursive, decoders, &mut partial)?;
        Ok(Self { partial })
    }
}

impl Source for DirSource {
    fn partial(&self) -> Result<Partial> {
        Ok(self.partial.clone())
    }
}

fn load_dir(
    dir: &Path,
    recursive: bool,
    decoders: &DecoderRegistry,
    accumulator: &mut Partial,
) -> Result<()> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .collect::<std::io::Result<Vec<_>>>()?
        .into_iter()
        .map(|entry| entry.path())
        .collect();
    paths.sort();

    for path in paths {
        if path.is_dir() {
            if recursive {
                load_dir(&path, recursive, decoders, accumulator)?;
            }
            continue;
        }

        let Some(format) = path.extension().and_then(|ext| ext.to_str()) else {
            continue;
        };
        if !decoders.accepts(format) {
            continue;
        }

        let bytes = std::fs::read(&path)?;
        debug!(file = %path.display(), "merging directory source file");
        accumulator.merge(decoders.decode(format, &bytes)?);
    }
    Ok(())
}
