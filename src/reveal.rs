//! Open a folder in the platform file manager.

use std::path::Path;
use std::process::{Command, Stdio};
use tracing::debug;

#[cfg(target_os = "macos")]
const OPENER: &str = "open";
#[cfg(target_os = "windows")]
const OPENER: &str = "explorer";
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const OPENER: &str = "xdg-open";

/// Reveal `path` in the file manager.
///
/// Does nothing and returns `Ok(false)` when `path` does not exist. The
/// file manager is launched detached; this does not wait for it.
pub fn reveal_in_file_manager(path: &Path) -> std::io::Result<bool> {
    if !path.exists() {
        debug!("Not revealing missing path {}", path.display());
        return Ok(false);
    }

    Command::new(OPENER)
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    debug!("Revealed {} with {}", path.display(), OPENER);
    Ok(true)
}
