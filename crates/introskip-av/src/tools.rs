//! External tool detection.
//!
//! introskip needs a single tool, `ffprobe`. A configured path wins when it
//! exists; otherwise the tool is looked up on `PATH`.

use std::path::{Path, PathBuf};

use introskip_core::config::ToolsConfig;

/// Availability information for a tool, returned by [`check_ffprobe`].
#[derive(Debug, Clone)]
pub struct ToolInfo {
    /// Tool name.
    pub name: String,
    /// Whether the tool was found.
    pub available: bool,
    /// Version string (first line of `-version` output), if available.
    pub version: Option<String>,
    /// Resolved path to the executable.
    pub path: Option<PathBuf>,
}

/// Resolve a tool by name, preferring `custom` when that path exists.
pub fn locate(name: &str, custom: Option<&Path>) -> Option<PathBuf> {
    match custom {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => {
            tracing::warn!(
                tool = name,
                path = %p.display(),
                "Configured tool path does not exist; searching PATH"
            );
            which::which(name).ok()
        }
        None => which::which(name).ok(),
    }
}

/// Locate `ffprobe` according to `tools`.
pub fn locate_ffprobe(tools: &ToolsConfig) -> Option<PathBuf> {
    locate("ffprobe", tools.ffprobe_path.as_deref())
}

/// Report whether `ffprobe` is available and which version it is.
pub fn check_ffprobe(tools: &ToolsConfig) -> ToolInfo {
    match locate_ffprobe(tools) {
        Some(path) => ToolInfo {
            name: "ffprobe".to_string(),
            available: true,
            version: detect_version(&path),
            path: Some(path),
        },
        None => ToolInfo {
            name: "ffprobe".to_string(),
            available: false,
            version: None,
            path: None,
        },
    }
}

/// Run `<tool> -version` and return the first line of stdout.
fn detect_version(path: &Path) -> Option<String> {
    let output = std::process::Command::new(path)
        .arg("-version")
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(|s| s.to_string())
}
