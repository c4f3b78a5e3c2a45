use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::game::EngineConfig;

/// Server configuration persisted as TOML. Every table- and
/// pipeline-level knob lives here; the engine receives its subset via
/// `engine_config()`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// TCP port to listen on.
    pub port: u16,
    /// Per-player initial chips.
    pub starting_stack: u32,
    pub small_blind: u32,
    pub big_blind: u32,
    /// Whether blinds escalate as the session goes on.
    pub blind_escalation: bool,
    pub hands_per_blind_level: u32,
    pub blind_multiplier: f64,
    /// Cross-hand event history cap (drop-oldest).
    pub event_history_cap: usize,
    /// Rich completed-hand history cap.
    pub hand_history_cap: usize,
    /// Legacy completed-hand list cap.
    pub completed_hands_cap: usize,
    /// How long step mode waits for a `continue` frame.
    pub step_timeout_secs: u64,
    /// Cosmetic pause between AI actions outside step mode.
    pub ai_action_delay_ms: u64,
    /// Runtime invariant assertions (fatal when violated). Turn off
    /// only for performance measurements.
    pub assertions: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 3000,
            starting_stack: 1000,
            small_blind: 5,
            big_blind: 10,
            blind_escalation: true,
            hands_per_blind_level: 10,
            blind_multiplier: 2.0,
            event_history_cap: 1000,
            hand_history_cap: 100,
            completed_hands_cap: 50,
            step_timeout_secs: 60,
            ai_action_delay_ms: 500,
            assertions: true,
        }
    }
}

impl Config {
    /// Load configuration from `path`. If the file does not exist,
    /// create it with defaults and return those.
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading config file '{}'", path.display()))?;
            let cfg: Config = toml::from_str(&text)
                .with_context(|| format!("parsing TOML config '{}'", path.display()))?;
            Ok(cfg)
        } else {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    fs::create_dir_all(parent).with_context(|| {
                        format!("creating config directory '{}'", parent.display())
                    })?;
                }
            }
            let cfg = Config::default();
            let text = toml::to_string_pretty(&cfg)
                .with_context(|| "serializing default config to TOML")?;
            fs::write(path, text)
                .with_context(|| format!("writing default config to '{}'", path.display()))?;
            Ok(cfg)
        }
    }

    /// Save the current config back to the provided path (overwrites).
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating config directory '{}'", parent.display()))?;
            }
        }
        let text = toml::to_string_pretty(self).with_context(|| "serializing config to TOML")?;
        fs::write(path, text)
            .with_context(|| format!("writing config to '{}'", path.display()))?;
        Ok(())
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            starting_stack: self.starting_stack,
            small_blind: self.small_blind,
            big_blind: self.big_blind,
            blind_escalation_enabled: self.blind_escalation,
            hands_per_blind_level: self.hands_per_blind_level,
            blind_multiplier: self.blind_multiplier,
            event_history_cap: self.event_history_cap,
            hand_history_cap: self.hand_history_cap,
            completed_hands_cap: self.completed_hands_cap,
            assertions_enabled: self.assertions,
        }
    }
}
