//! Loading a transcript corpus from a directory

use crate::error::{EngineError, Result};
use shared_types::SourceDocument;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const DEFAULT_EXTENSIONS: &[&str] = &["xml", "xhtml"];

/// Paths of `dir/*.<ext>` for every extension, sorted and deduplicated.
/// Not recursive.
pub fn discover(dir: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(EngineError::io(
            dir,
            std::io::Error::new(std::io::ErrorKind::NotFound, "corpus directory not found"),
        ));
    }

    let escaped_dir = glob::Pattern::escape(&dir.to_string_lossy());
    let mut paths = Vec::new();
    for ext in extensions {
        let pattern = format!("{}/*.{}", escaped_dir, ext.trim_start_matches('.'));
        let entries = glob::glob(&pattern).map_err(|e| {
            EngineError::Config(format!("bad corpus pattern {:?}: {}", pattern, e))
        })?;
        for entry in entries {
            match entry {
                Ok(path) if path.is_file() => paths.push(path),
                Ok(_) => {}
                Err(e) => warn!(error = %e, "Skipping unreadable corpus entry"),
            }
        }
    }

    paths.sort();
    paths.dedup();
    Ok(paths)
}

/// Read every matching file; unreadable files are logged and left out
pub fn load_directory(dir: &Path, extensions: &[String]) -> Result<Vec<SourceDocument>> {
    let paths = discover(dir, extensions)?;
    let mut documents = Vec::with_capacity(paths.len());

    for path in paths {
        match std::fs::read(&path) {
            Ok(bytes) => {
                debug!(path = %path.display(), bytes = bytes.len(), "Loaded document");
                documents.push(SourceDocument::new(path.to_string_lossy(), bytes));
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not read document, skipping")
            }
        }
    }

    info!(dir = %dir.display(), documents = documents.len(), "Corpus loaded");
    Ok(documents)
}

pub fn default_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect()
}
