use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration for an outpost simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutpostConfig {
    /// Simulated time (millisols) offered to every worker per pulse.
    #[serde(default = "default_pulse_millisols")]
    pub pulse_millisols: f64,

    /// Wall-clock delay between pulses of the simulation loop.
    #[serde(default = "default_pulse_interval_ms")]
    pub pulse_interval_ms: u64,

    /// Seed for the accident model. Unset means a fresh seed every run.
    #[serde(default)]
    pub accident_seed: Option<u64>,

    /// Performance below which a person is not offered work.
    #[serde(default = "default_min_performance")]
    pub min_performance: f64,

    /// Address of the read-only dashboard.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Emit logs as JSON lines.
    #[serde(default)]
    pub json_logs: bool,

    /// Pulses a malfunction lasts before the repair crew fixes it. 0 disables repairs.
    #[serde(default = "default_repair_after_pulses")]
    pub repair_after_pulses: u64,

    /// Newest journal entries kept in memory. 0 keeps everything.
    #[serde(default = "default_journal_capacity")]
    pub journal_capacity: usize,
}

fn default_pulse_millisols() -> f64 {
    5.0
}

fn default_pulse_interval_ms() -> u64 {
    250
}

fn default_min_performance() -> f64 {
    0.2
}

fn default_bind_addr() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_repair_after_pulses() -> u64 {
    20
}

fn default_journal_capacity() -> usize {
    10_000
}

impl Default for OutpostConfig {
    fn default() -> Self {
        Self {
            pulse_millisols: default_pulse_millisols(),
            pulse_interval_ms: default_pulse_interval_ms(),
            accident_seed: None,
            min_performance: default_min_performance(),
            bind_addr: default_bind_addr(),
            json_logs: false,
            repair_after_pulses: default_repair_after_pulses(),
            journal_capacity: default_journal_capacity(),
        }
    }
}

impl OutpostConfig {
    /// Config file path within the config directory.
    pub fn config_path(config_dir: &Path) -> PathBuf {
        config_dir.join("outpost.toml")
    }

    /// Load config from disk. Returns default if not found.
    pub fn load(config_dir: &Path) -> Result<Self> {
        let path = Self::config_path(config_dir);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path).context("Failed to read config file")?;
        let config: Self = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Save config to disk.
    pub fn save(&self, config_dir: &Path) -> Result<()> {
        let path = Self::config_path(config_dir);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&path, content).context("Failed to write config file")?;
        Ok(())
    }

    pub fn pulse_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.pulse_interval_ms.max(1))
    }
}
