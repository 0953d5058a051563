use crate::constants::{DEFAULT_EXTENSIONS, DEFAULT_MAX_FILE_SIZE};
use crate::error::{Result, ShrinkError};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Filters applied during the scan. Fixed for the duration of a run.
#[derive(Debug, Clone)]
pub struct ScanPolicy {
    /// Lowercased extensions without the leading dot.
    pub extensions: Vec<String>,
    pub max_size: u64,
    pub recursive: bool,
}

impl Default for ScanPolicy {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            max_size: DEFAULT_MAX_FILE_SIZE,
            recursive: false,
        }
    }
}

impl ScanPolicy {
    pub fn allows_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|s| s.to_str())
            .map(|ext| {
                let ext = ext.to_lowercase();
                self.extensions.iter().any(|allowed| *allowed == ext)
            })
            .unwrap_or(false)
    }
}

/// A file admitted by the scan. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCandidate {
    pub path: PathBuf,
    pub size: u64,
    pub extension: String,
}

/// Walks `root` and returns every regular file that passes the policy's
/// extension allow-list and size ceiling, in deterministic depth-first order
/// (entries sorted by file name, subdirectory contents spliced in at the
/// directory's position). Subdirectories are only entered when
/// `policy.recursive` is set. Any unreadable entry aborts the whole scan.
///
/// The scan is synchronous and completes before any network activity, so the
/// candidate set for a run is fixed at the outset.
pub fn scan(root: &Path, policy: &ScanPolicy) -> Result<Vec<FileCandidate>> {
    if !root.is_dir() {
        return Err(ShrinkError::NotADirectory(root.to_path_buf()));
    }

    let walker = if policy.recursive {
        WalkDir::new(root).sort_by_file_name().into_iter()
    } else {
        WalkDir::new(root).max_depth(1).sort_by_file_name().into_iter()
    };

    let mut candidates = Vec::new();
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let metadata = entry.metadata()?;
        if metadata.len() > policy.max_size || !policy.allows_extension(entry.path()) {
            continue;
        }
        let extension = entry
            .path()
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_lowercase();
        candidates.push(FileCandidate {
            path: entry.path().to_path_buf(),
            size: metadata.len(),
            extension,
        });
    }

    Ok(candidates)
}
