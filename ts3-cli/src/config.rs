//! Configuration management for the ts3bridge CLI.
//!
//! The CLI reads the bridge's own tables (`[bridge]`, `[client_lib]`) plus
//! a `[sim]` table describing the simulated client library:
//!
//! ```toml
//! [sim]
//! latency_ms = 5
//! jitter_ms = 2
//! server_password = "secret"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use ts3_bridge::sim::SimulatedClientLib;
use ts3_bridge::BridgeConfig;

/// Simulated client library settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SimConfig {
    /// Base delay before each event is delivered (default: 5).
    #[serde(default = "default_latency_ms")]
    pub latency_ms: u64,
    /// Upper bound of random extra delay (default: 0).
    #[serde(default)]
    pub jitter_ms: u64,
    /// Password the simulated server demands.
    #[serde(default)]
    pub server_password: Option<String>,
}

fn default_latency_ms() -> u64 {
    5
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            latency_ms: default_latency_ms(),
            jitter_ms: 0,
            server_password: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SimFile {
    #[serde(default)]
    sim: SimConfig,
}

/// Everything a command needs.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Bridge settings.
    pub bridge: BridgeConfig,
    /// Simulator settings.
    pub sim: SimConfig,
}

impl CliConfig {
    /// Load from `path`, or defaults when no file was given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let bridge = BridgeConfig::from_file(path)?;
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let file: SimFile = toml::from_str(&contents).context("Invalid [sim] configuration")?;

        Ok(Self {
            bridge,
            sim: file.sim,
        })
    }

    /// Build a simulated client library from the `[sim]` settings.
    pub fn simulator(&self) -> SimulatedClientLib {
        let sim = SimulatedClientLib::new().with_latency(
            Duration::from_millis(self.sim.latency_ms),
            Duration::from_millis(self.sim.jitter_ms),
        );
        sim.set_server_password(self.sim.server_password.as_deref());
        sim
    }
}
