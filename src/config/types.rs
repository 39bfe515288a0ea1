use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub simulator: SimulatorConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Allow cross-origin requests (browser players on another port)
    #[serde(default = "default_cors")]
    pub cors: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    5173
}
fn default_cors() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors: default_cors(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulatorConfig {
    /// Directory holding source manifests and their segment files
    #[serde(default = "default_streams_dir")]
    pub streams_dir: PathBuf,

    /// First path component of every simulated route
    #[serde(default = "default_route_prefix")]
    pub route_prefix: String,

    /// How far ahead of real time the live edge is cut (milliseconds)
    #[serde(default = "default_lookahead_ms")]
    pub lookahead_ms: u64,

    /// How long a held-open request waits before failing (seconds)
    #[serde(default = "default_hold_open_secs")]
    pub hold_open_secs: u64,
}

/// Upper bound for `simulator.lookahead_ms` (one hour)
pub const MAX_LOOKAHEAD_MS: u64 = 60 * 60 * 1000;

fn default_streams_dir() -> PathBuf {
    PathBuf::from("./streams")
}
fn default_route_prefix() -> String {
    "local".to_string()
}
fn default_lookahead_ms() -> u64 {
    1000
}
fn default_hold_open_secs() -> u64 {
    60
}

impl SimulatorConfig {
    /// Live-edge lookahead, capped at [`MAX_LOOKAHEAD_MS`].
    pub fn lookahead(&self) -> TimeDelta {
        TimeDelta::milliseconds(self.lookahead_ms.min(MAX_LOOKAHEAD_MS) as i64)
    }

    pub fn hold_open(&self) -> Duration {
        Duration::from_secs(self.hold_open_secs)
    }

    /// Route prefix without surrounding slashes.
    pub fn prefix(&self) -> &str {
        self.route_prefix.trim_matches('/')
    }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            streams_dir: default_streams_dir(),
            route_prefix: default_route_prefix(),
            lookahead_ms: default_lookahead_ms(),
            hold_open_secs: default_hold_open_secs(),
        }
    }
}
