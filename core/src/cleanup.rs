//! Removal of local raw files once they have been uploaded.

use crate::{dataset::raw_file_paths, error::GenResult};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub removed: Vec<PathBuf>,
    pub missing: Vec<PathBuf>,
}

impl CleanupReport {
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Delete each file if present. A missing file is logged and reported,
/// never an error; any other I/O failure propagates.
pub fn remove_files<P: AsRef<Path>>(files: &[P]) -> GenResult<CleanupReport> {
    let mut report = CleanupReport::default();
    for file in files {
        let path = file.as_ref();
        match std::fs::remove_file(path) {
            Ok(()) => {
                log::info!("Removed {}", path.display());
                report.removed.push(path.to_path_buf());
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::warn!("File {} doesn't exist!", path.display());
                report.missing.push(path.to_path_buf());
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(report)
}

/// With no explicit list, remove the three raw files from `dir`.
pub fn remove_raw_files(dir: &Path, files: &[PathBuf]) -> GenResult<CleanupReport> {
    if files.is_empty() {
        return remove_files(&raw_file_paths(dir));
    }
    let resolved: Vec<PathBuf> = files.iter().map(|f| dir.join(f)).collect();
    remove_files(&resolved)
}
