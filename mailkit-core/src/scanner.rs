use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::folder::FolderSet;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Template directory does not exist: {}", .0.display())]
    MissingDir(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid folder name: {}", .0.display())]
    InvalidName(PathBuf),
}

pub struct FolderScanner {
    source_dir: PathBuf,
}

impl FolderScanner {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            source_dir: path.as_ref().to_path_buf(),
        }
    }

    /// List the immediate subdirectories of the source directory.
    ///
    /// Order is whatever the directory listing returns.
    pub fn scan(&self) -> Result<FolderSet, ScanError> {
        if !self.source_dir.is_dir() {
            return Err(ScanError::MissingDir(self.source_dir.clone()));
        }

        debug!("Scanning: {}", self.source_dir.display());

        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.source_dir)? {
            let entry = entry?;
            let path = entry.path();

            if !path.is_dir() {
                continue;
            }

            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| ScanError::InvalidName(path.clone()))?;
            names.push(name.to_string());
        }

        Ok(FolderSet::new(names))
    }
}
