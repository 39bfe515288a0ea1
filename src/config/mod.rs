mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config = parse_config(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    Ok(config)
}

/// Parse and validate configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content)?;
    validate_config(&config)?;
    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./livesim.toml",
        "./config.toml",
        "~/.config/livesim/config.toml",
    ];

    for path_str in default_paths {
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
fn validate_config(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    let prefix = config.simulator.prefix();
    if prefix.is_empty() {
        anyhow::bail!("Simulator route prefix cannot be empty");
    }
    if prefix.contains('/') {
        anyhow::bail!("Simulator route prefix must be a single path segment: {prefix}");
    }

    if config.simulator.lookahead_ms > MAX_LOOKAHEAD_MS {
        anyhow::bail!(
            "Simulator lookahead_ms must be at most {MAX_LOOKAHEAD_MS}: {}",
            config.simulator.lookahead_ms
        );
    }

    if !config.simulator.streams_dir.is_dir() {
        tracing::warn!(
            "Streams directory does not exist: {:?}",
            config.simulator.streams_dir
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 5173);
        assert_eq!(config.simulator.prefix(), "local");
        assert_eq!(config.simulator.lookahead().num_milliseconds(), 1000);
        assert_eq!(config.simulator.hold_open().as_secs(), 60);
    }

    #[test]
    fn test_parse_partial_config() {
        let config = parse_config(
            r#"
            [server]
            port = 9000

            [simulator]
            route_prefix = "/sim/"
            hold_open_secs = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.simulator.prefix(), "sim");
        assert_eq!(config.simulator.hold_open_secs, 5);
        assert_eq!(config.simulator.lookahead_ms, 1000);
    }

    #[test]
    fn test_rejects_zero_port() {
        assert!(parse_config("[server]\nport = 0\n").is_err());
    }

    #[test]
    fn test_rejects_nested_prefix() {
        assert!(parse_config("[simulator]\nroute_prefix = \"a/b\"\n").is_err());
        assert!(parse_config("[simulator]\nroute_prefix = \"/\"\n").is_err());
    }

    #[test]
    fn test_rejects_oversized_lookahead() {
        assert!(parse_config("[simulator]\nlookahead_ms = 9223372036854775807\n").is_err());
        assert!(parse_config("[simulator]\nlookahead_ms = 3600001\n").is_err());

        let config = parse_config("[simulator]\nlookahead_ms = 3600000\n").unwrap();
        assert_eq!(config.simulator.lookahead().num_hours(), 1);
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("livesim.toml");
        std::fs::write(&path, "[simulator]\nlookahead_ms = 0\n").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.simulator.lookahead_ms, 0);
        assert!(load_config(&dir.path().join("missing.toml")).is_err());
    }
}
