use std::fs::File;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{error, info};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::config::PathsConfig;
use crate::folder::FolderSet;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Output folder does not exist: {} (run build first)", .0.display())]
    MissingOutput(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

#[derive(Debug)]
pub struct ArchiveFailure {
    pub folder: String,
    pub error: String,
}

#[derive(Debug, Default)]
pub struct ArchiveReport {
    pub created: Vec<PathBuf>,
    pub failed: Vec<ArchiveFailure>,
}

/// Zip the contents of `source` into `dest`. Returns the number of files stored.
pub fn archive_folder(source: &Path, dest: &Path) -> Result<usize, ArchiveError> {
    if !source.is_dir() {
        return Err(ArchiveError::MissingOutput(source.to_path_buf()));
    }
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut zip = ZipWriter::new(File::create(dest)?);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut files = 0;

    for entry in WalkDir::new(source).sort_by_file_name() {
        let entry = entry?;
        let relative = entry.path().strip_prefix(source).unwrap_or(entry.path());
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        if name.is_empty() {
            continue;
        }

        if entry.file_type().is_dir() {
            zip.add_directory(name, options)?;
        } else {
            zip.start_file(name, options)?;
            std::io::copy(&mut File::open(entry.path())?, &mut zip)?;
            files += 1;
        }
    }

    zip.finish()?;
    Ok(files)
}

/// Zip every output folder into `<zips>/<name>.zip`.
///
/// Archives run concurrently and finish in any order. A failure is logged
/// and recorded in the report; it never stops the other archives.
pub async fn archive_all(folders: &FolderSet, paths: &PathsConfig) -> ArchiveReport {
    let mut tasks = JoinSet::new();

    for folder in folders.folders(paths) {
        let dest = paths.zips.join(format!("{}.zip", folder.name));
        tasks.spawn_blocking(move || {
            let result = archive_folder(&folder.output, &dest);
            (folder.name, dest, result)
        });
    }

    let mut report = ArchiveReport::default();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((_, dest, Ok(files))) => {
                info!("Zip file {} created ({} files)", dest.display(), files);
                report.created.push(dest);
            }
            Ok((name, _, Err(err))) => {
                error!("Could not archive {}: {}", name, err);
                report.failed.push(ArchiveFailure {
                    folder: name,
                    error: err.to_string(),
                });
            }
            Err(err) => {
                error!("Archive task panicked: {}", err);
                report.failed.push(ArchiveFailure {
                    folder: String::from("<unknown>"),
                    error: err.to_string(),
                });
            }
        }
    }

    report
}
