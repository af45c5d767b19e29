//! Config file location.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Resolves the dataverse config file path.
///
/// - If `file` is `Some`, returns it unchanged.
/// - Otherwise returns `~/.dvn/dvn.json`.
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined (when `file` is `None`).
pub fn resolve_config_path(file: Option<&Path>) -> Result<PathBuf> {
    if let Some(f) = file {
        return Ok(f.to_path_buf());
    }

    let home = std::env::var("HOME").context("HOME environment variable is not set")?;
    Ok(PathBuf::from(home).join(".dvn").join("dvn.json"))
}
