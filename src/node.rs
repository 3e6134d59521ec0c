// ABOUTME: Reads and writes the kernel power-limit sysfs node.
// ABOUTME: Any read failure reports "not limited"; write failures are logged and reported as false.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Default location of the power-limit control exposed by the kernel.
pub const DEFAULT_NODE_PATH: &str = "/sys/kernel/cpu_power_toggle/limit_mode";

const ENABLED: &str = "1";
const DISABLED: &str = "0";

/// A sysfs-style file holding "1" when the power limit is on and "0" when off.
#[derive(Debug, Clone)]
pub struct PowerLimitNode {
    path: PathBuf,
}

impl PowerLimitNode {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the node exists at all. A missing node still reads as disabled.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read the node and report whether the limit is on.
    /// Missing, unreadable or unexpected contents all read as false.
    pub fn is_currently_limited(&self) -> bool {
        match fs::read_to_string(&self.path) {
            Ok(content) => trim_control(&content) == ENABLED,
            Err(e) => {
                tracing::debug!("Cannot read {}: {e}", self.path.display());
                false
            }
        }
    }

    /// Truncate (or create) the node and write `value` into it.
    pub fn write_node(&self, value: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)?;
        file.write_all(value.as_bytes())?;
        Ok(())
    }

    /// Write "1" or "0" for the requested state. Returns whether the write succeeded.
    pub fn on_toggle(&self, enabled: bool) -> bool {
        let value = if enabled { ENABLED } else { DISABLED };
        match self.write_node(value) {
            Ok(()) => {
                tracing::info!("Wrote {value} to {}", self.path.display());
                true
            }
            Err(e) => {
                tracing::error!("Failed to write node {}: {e}", self.path.display());
                false
            }
        }
    }
}

/// Strip leading and trailing spaces and control characters (anything up to U+0020).
fn trim_control(content: &str) -> &str {
    content.trim_matches(|c: char| c <= ' ')
}

impl Default for PowerLimitNode {
    fn default() -> Self {
        Self::new(DEFAULT_NODE_PATH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node_with(content: &str) -> (tempfile::TempDir, PowerLimitNode) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("limit_mode");
        fs::write(&path, content).unwrap();
        (dir, PowerLimitNode::new(path))
    }

    #[test]
    fn one_reads_as_limited() {
        let (_dir, node) = node_with("1");
        assert!(node.is_currently_limited());
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        let (_dir, node) = node_with("  1\n");
        assert!(node.is_currently_limited());
    }

    #[test]
    fn trailing_nul_and_control_characters_are_trimmed() {
        for content in ["1\0", "\t1\r\n", "\u{1}1"] {
            let (_dir, node) = node_with(content);
            assert!(node.is_currently_limited(), "content {content:?}");
        }
    }

    #[test]
    fn non_breaking_space_is_not_trimmed() {
        let (_dir, node) = node_with("\u{a0}1");
        assert!(!node.is_currently_limited());
    }

    #[test]
    fn zero_and_garbage_read_as_not_limited() {
        for content in ["0", "0\n", "", "2", "true", "11", "enabled"] {
            let (_dir, node) = node_with(content);
            assert!(!node.is_currently_limited(), "content {content:?}");
        }
    }

    #[test]
    fn missing_node_reads_as_not_limited() {
        let dir = tempfile::tempdir().unwrap();
        let node = PowerLimitNode::new(dir.path().join("absent"));
        assert!(!node.exists());
        assert!(!node.is_currently_limited());
    }

    #[test]
    fn directory_in_place_of_node_reads_as_not_limited() {
        let dir = tempfile::tempdir().unwrap();
        let node = PowerLimitNode::new(dir.path());
        assert!(!node.is_currently_limited());
    }

    #[test]
    fn toggle_on_writes_exactly_one() {
        let (_dir, node) = node_with("0\n");
        assert!(node.on_toggle(true));
        assert_eq!(fs::read_to_string(node.path()).unwrap(), "1");
    }

    #[test]
    fn toggle_off_truncates_and_writes_exactly_zero() {
        let (_dir, node) = node_with("1 trailing content");
        assert!(node.on_toggle(false));
        assert_eq!(fs::read_to_string(node.path()).unwrap(), "0");
    }

    #[test]
    fn toggle_into_missing_directory_fails_without_panicking() {
        let dir = tempfile::tempdir().unwrap();
        let node = PowerLimitNode::new(dir.path().join("no_such_dir").join("limit_mode"));
        assert!(!node.on_toggle(true));
        assert!(node.write_node("1").is_err());
    }

    #[test]
    fn toggle_creates_missing_node_in_writable_directory() {
        let dir = tempfile::tempdir().unwrap();
        let node = PowerLimitNode::new(dir.path().join("limit_mode"));
        assert!(node.on_toggle(true));
        assert!(node.exists());
        assert!(node.is_currently_limited());
    }

    #[test]
    fn toggle_then_read_round_trips() {
        let (_dir, node) = node_with("0");
        for value in [true, false, true] {
            assert!(node.on_toggle(value));
            assert_eq!(node.is_currently_limited(), value);
        }
    }

    #[test]
    fn default_points_at_kernel_node() {
        assert_eq!(
            PowerLimitNode::default().path(),
            Path::new("/sys/kernel/cpu_power_toggle/limit_mode")
        );
    }
}
