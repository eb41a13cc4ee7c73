pub use introskip_core::config::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Locations searched, in order, when no config path is given.
pub const DEFAULT_CONFIG_PATHS: [&str; 3] = [
    "./introskip.toml",
    "~/.config/introskip/config.toml",
    "/etc/introskip/config.toml",
];

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    expand_tool_paths(&mut config.tools);
    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    for path_str in DEFAULT_CONFIG_PATHS {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Using config file {:?}", path);
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    let problems = config.validate();
    if !problems.is_empty() {
        anyhow::bail!("Invalid configuration: {}", problems.join("; "));
    }

    if let Some(ref path) = config.tools.ffprobe_path {
        if !path.exists() {
            tracing::warn!("Configured ffprobe path does not exist: {:?}", path);
        }
    }

    Ok(())
}

/// Expand `~` in configured tool paths.
fn expand_tool_paths(tools: &mut ToolsConfig) {
    if let Some(path) = tools.ffprobe_path.take() {
        let expanded = shellexpand::tilde(&path.to_string_lossy()).into_owned();
        tools.ffprobe_path = Some(expanded.into());
    }
}
