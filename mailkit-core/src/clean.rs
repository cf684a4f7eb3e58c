use std::path::Path;

use tracing::{debug, info};

/// Remove the output tree. Returns whether anything was removed.
pub fn clean(dist: &Path) -> std::io::Result<bool> {
    if !dist.exists() {
        debug!("Nothing to clean at {}", dist.display());
        return Ok(false);
    }

    std::fs::remove_dir_all(dist)?;
    info!("Removed {}", dist.display());
    Ok(true)
}
