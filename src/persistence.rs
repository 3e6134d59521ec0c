// ABOUTME: Remembers the last accepted power-limit value so it can be re-applied after a reboot.
// ABOUTME: Stores "1" or "0" in a small state file; missing or empty files mean nothing to restore.

use std::fs;
use std::path::Path;

/// Load the saved switch value, returning None if missing, empty or unreadable.
pub fn load_saved_state(path: &Path) -> Option<bool> {
    match fs::read_to_string(path) {
        Ok(content) => match content.trim() {
            "" => {
                tracing::info!("Saved state file is empty, nothing to restore");
                None
            }
            "1" => Some(true),
            "0" => Some(false),
            other => {
                tracing::warn!("Ignoring unrecognised saved state {other:?} in {}", path.display());
                None
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!("No saved state at {}", path.display());
            None
        }
        Err(e) => {
            tracing::warn!("Failed to read saved state (ignoring): {e}");
            None
        }
    }
}

/// Save the switch value, creating the parent directory if needed.
pub fn save_state(path: &Path, limited: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(path, if limited { "1" } else { "0" })?;

    tracing::debug!("Saved power limit state to {}", path.display());
    Ok(())
}
