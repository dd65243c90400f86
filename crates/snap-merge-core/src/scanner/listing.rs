use crate::clock::CreationClock;
use crate::error::{Error, Result};
use crate::imaging::Dimensions;
use glob::Pattern;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, error};

/// A file waiting in the work queue.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub path: PathBuf,
    /// `None` when the creation time could not be read.
    pub created: Option<SystemTime>,
    /// Filled in the first time the image size is read.
    pub dimensions: Option<Dimensions>,
}

impl Candidate {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Regular files directly inside `dir` whose extension matches `extension`
/// (case-insensitive) and whose name matches none of `ignore_patterns`.
/// Results are in file-name order. Failing to read `dir` is fatal.
pub fn list_candidates(
    dir: &Path,
    extension: &str,
    ignore_patterns: &[Pattern],
) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|source| Error::Scan {
        dir: dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry_result in entries {
        let entry = entry_result.map_err(|source| Error::Scan {
            dir: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }
        let matches_ext = path
            .extension()
            .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(extension))
            .unwrap_or(false);
        if !matches_ext {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if ignore_patterns.iter().any(|pattern| pattern.matches(&name)) {
            debug!("Ignoring {}", name);
            continue;
        }
        files.push(path);
    }

    files.sort();
    Ok(files)
}

/// Attach creation times and sort oldest first. The sort is stable, and files
/// whose time cannot be read go last.
pub fn order_by_creation(paths: Vec<PathBuf>, clock: &dyn CreationClock) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = paths
        .into_iter()
        .map(|path| {
            let created = match clock.created(&path) {
                Ok(t) => Some(t),
                Err(e) => {
                    error!("Error reading creation time of {}: {}", path.display(), e);
                    None
                }
            };
            Candidate {
                path,
                created,
                dimensions: None,
            }
        })
        .collect();

    candidates.sort_by_key(|c| (c.created.is_none(), c.created));
    candidates
}
