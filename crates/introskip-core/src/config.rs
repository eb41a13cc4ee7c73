//! Application configuration types.
//!
//! The top-level [`Config`] struct carries the server, proxy and tool
//! sections. Every section defaults sensibly so an empty file is valid; the
//! binary reads the file (TOML) and hands the result to [`Config::validate`].

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Nominal playlist duration when the caller does not know the real one.
pub const DEFAULT_DECLARED_DURATION_SECS: u32 = 7200;

/// Leading bytes re-served ahead of every body segment so a player that starts
/// mid-file still sees the container metadata.
///
/// This is a heuristic: typical MP4 `moov` and Matroska `SeekHead`/`Tracks`
/// blocks fit comfortably, but very large or unusually laid out containers
/// may need a bigger budget.
pub const HEADER_BUDGET_BYTES: u64 = 1_000_000;

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub proxy: ProxyConfig,
    pub tools: ToolsConfig,
}

impl Config {
    /// Return a list of validation problems. An empty list means the
    /// configuration is usable.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if self.server.port == 0 {
            problems.push("server.port cannot be 0".into());
        }
        if self.proxy.declared_duration_secs == 0 {
            problems.push("proxy.declared_duration_secs must be positive".into());
        }
        if self.proxy.header_budget_bytes == 0 {
            problems.push("proxy.header_budget_bytes must be positive".into());
        }
        if self.proxy.probe_timeout_secs == 0 {
            problems.push("proxy.probe_timeout_secs must be positive".into());
        }
        if self.proxy.offset_timeout_secs == 0 {
            problems.push("proxy.offset_timeout_secs must be positive".into());
        }
        if self.proxy.cache_max_entries == 0 {
            problems.push("proxy.cache_max_entries must be positive".into());
        }

        problems
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 7000,
        }
    }
}

/// Manifest proxy settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Target duration written into every playlist.
    pub declared_duration_secs: u32,
    /// Size of the leading header segment.
    pub header_budget_bytes: u64,
    /// Timeout for the HEAD request that resolves redirects and length.
    pub probe_timeout_secs: u64,
    /// Hard limit for a single keyframe lookup.
    pub offset_timeout_secs: u64,
    /// Maximum number of cached manifests.
    pub cache_max_entries: usize,
    /// Idle time after which a cached manifest is dropped. `0` disables it.
    pub cache_ttl_secs: u64,
}

impl ProxyConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn offset_timeout(&self) -> Duration {
        Duration::from_secs(self.offset_timeout_secs)
    }

    /// Idle TTL for cache entries, `None` when disabled.
    pub fn cache_ttl(&self) -> Option<Duration> {
        (self.cache_ttl_secs > 0).then(|| Duration::from_secs(self.cache_ttl_secs))
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            declared_duration_secs: DEFAULT_DECLARED_DURATION_SECS,
            header_budget_bytes: HEADER_BUDGET_BYTES,
            probe_timeout_secs: 10,
            offset_timeout_secs: 30,
            cache_max_entries: 1024,
            cache_ttl_secs: 6 * 60 * 60,
        }
    }
}

/// Custom paths for external tools. `None` means search `PATH`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub ffprobe_path: Option<PathBuf>,
}
