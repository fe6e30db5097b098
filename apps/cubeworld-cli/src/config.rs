use anyhow::Context;
use cubeworld_net::NetConfig;
use cubeworld_sync::SyncConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Runner settings, optionally loaded from YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub tick_rate_hz: u32,
    /// How often the local avatar's position is sent.
    pub send_rate_hz: u32,
    pub net: NetConfig,
    pub sync: SyncConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 60,
            send_rate_hz: 30,
            net: NetConfig::default(),
            sync: SyncConfig::default(),
        }
    }
}

impl RuntimeConfig {
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_yaml(text: &str) -> anyhow::Result<Self> {
        let config: Self = serde_yaml::from_str(text)?;
        anyhow::ensure!(config.tick_rate_hz > 0, "tick_rate_hz must be positive");
        anyhow::ensure!(config.send_rate_hz > 0, "send_rate_hz must be positive");
        Ok(config)
    }

    pub fn tick_dt(&self) -> f32 {
        1.0 / self.tick_rate_hz as f32
    }

    pub fn send_interval(&self) -> f32 {
        1.0 / self.send_rate_hz as f32
    }
}
