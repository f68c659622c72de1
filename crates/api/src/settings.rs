//! Layered settings: defaults, then `cabin.toml`, then `CABIN__*` variables

use config::{Config, ConfigError, Environment, File};
use dms::{AlertnessPreset, DmsConfig};
use pipeline::PipelineConfig;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// trace, debug, info, warn or error
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Stream opened at startup
    pub stream_url: Option<String>,
    /// Always-awake gesture mode
    pub demo_mode: bool,
    /// Replaces `pipeline.dms` with a named threshold set
    pub alertness: Option<AlertnessPreset>,
    pub listen_addr: String,
    /// Prometheus exporter address; no exporter when unset
    pub metrics_addr: Option<String>,
    /// Gesture mapping overrides
    pub mapping_file: PathBuf,
    pub log: LogSettings,
    pub pipeline: PipelineConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            stream_url: None,
            demo_mode: false,
            alertness: None,
            listen_addr: "0.0.0.0:8080".to_string(),
            metrics_addr: None,
            mapping_file: PathBuf::from("gesture_mappings.json"),
            log: LogSettings::default(),
            pipeline: PipelineConfig::default(),
        }
    }
}

impl Settings {
    /// Load from `cabin.toml` (optional) and the environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("cabin")
    }

    /// Load with an explicit file stem; the file may be missing
    pub fn load_from(file: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name(file).required(false))
            .add_source(
                Environment::with_prefix("CABIN")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Pipeline configuration with top-level overrides applied
    pub fn pipeline_config(&self) -> PipelineConfig {
        let mut config = self.pipeline.clone();
        if self.demo_mode {
            config.gesture.demo_mode = true;
        }
        if let Some(preset) = self.alertness {
            config.dms = DmsConfig::from_preset(preset);
        }
        config
    }
}
