//! Vitals Estimation
//!
//! Remote photoplethysmography from the camera stream:
//! - Mean green value over a cheek (or centre) patch, at most ~30 Hz
//! - Zero-crossing heart-rate estimate over a five-second window
//! - Spectral cross-check inside the heart band
//! - Stress classification from rate and mood, with a calm-mode latch

mod estimator;
mod roi;
mod spectrum;

pub use estimator::{
    classify_stress, estimate_bpm, smooth_bpm, HeartRateEstimator, MAX_BPM, MIN_BPM, RESTING_BPM,
};
pub use roi::Roi;
pub use spectrum::SpectralAnalyzer;

use serde::{Deserialize, Serialize};

/// Stress classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StressLevel {
    #[default]
    Low,
    Moderate,
    High,
}

/// Latest vitals snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthState {
    pub heart_rate_bpm: i32,
    pub stress_level: StressLevel,
    pub calm_mode_active: bool,
    /// Green mean of the sample that produced this state
    pub raw_signal: f32,
    /// Dominant heart-band frequency, diagnostic only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spectral_bpm: Option<f32>,
}

impl Default for HealthState {
    fn default() -> Self {
        Self {
            heart_rate_bpm: RESTING_BPM,
            stress_level: StressLevel::Low,
            calm_mode_active: false,
            raw_signal: 0.0,
            spectral_bpm: None,
        }
    }
}

/// Vitals configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VitalsConfig {
    /// Minimum spacing between samples (milliseconds)
    pub min_interval_ms: u64,
    /// Signal window length in samples
    pub window_size: usize,
    /// Assumed sampling rate for the spectral check (Hz)
    pub sample_rate_hz: f64,
}

impl Default for VitalsConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: 33,
            window_size: ring_buffer::DEFAULT_CAPACITY,
            sample_rate_hz: 30.0,
        }
    }
}
