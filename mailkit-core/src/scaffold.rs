use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum ScaffoldError {
    #[error("Boilerplate directory does not exist: {}", .0.display())]
    MissingBoilerplate(PathBuf),
    #[error("Invalid template name `{0}`: expected a single folder name")]
    InvalidName(String),
    #[error("Template `{}` already exists at {} (pass --force to overwrite)", .0, .1.display())]
    AlreadyExists(String, PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

#[derive(Debug, Clone)]
pub struct ScaffoldOptions {
    pub name: String,
    /// Overwrite files of an existing folder instead of failing
    pub force: bool,
}

/// Copy the boilerplate tree into `<emails>/<name>`. Returns the new folder.
pub fn scaffold(
    boilerplate: &Path,
    emails: &Path,
    options: &ScaffoldOptions,
) -> Result<PathBuf, ScaffoldError> {
    validate_name(&options.name)?;

    if !boilerplate.is_dir() {
        return Err(ScaffoldError::MissingBoilerplate(boilerplate.to_path_buf()));
    }

    let target = emails.join(&options.name);
    if target.exists() {
        if !options.force {
            return Err(ScaffoldError::AlreadyExists(options.name.clone(), target));
        }
        warn!("Overwriting existing template at {}", target.display());
    }

    info!("Creating template `{}` from {}", options.name, boilerplate.display());

    for entry in WalkDir::new(boilerplate) {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(boilerplate)
            .unwrap_or(entry.path());
        let dest = target.join(relative);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&dest)?;
        } else {
            if let Some(parent) = dest.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(entry.path(), &dest)?;
        }
    }

    Ok(target)
}

fn validate_name(name: &str) -> Result<(), ScaffoldError> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(ScaffoldError::InvalidName(name.to_string())),
    }
}
