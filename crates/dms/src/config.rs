//! Mood monitor tuning

use serde::{Deserialize, Serialize};

/// Alertness thresholds and evaluation cadence
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DmsConfig {
    /// Evaluate mood on every Nth processed frame
    pub decimation: u32,

    /// Combined blink score above which both eyes count as closed
    pub eyes_closed_threshold: f32,

    /// Eyes must stay closed this long for DROWSY WARNING (milliseconds)
    pub drowsiness_threshold_ms: u64,

    /// Gaze-out score above which the driver counts as looking away
    pub gaze_out_threshold: f32,

    /// Gaze must stay away this long for DISTRACTED (milliseconds)
    pub distraction_threshold_ms: u64,
}

impl Default for DmsConfig {
    fn default() -> Self {
        Self {
            decimation: 10,
            eyes_closed_threshold: 0.8,
            drowsiness_threshold_ms: 1000,
            gaze_out_threshold: 0.6,
            distraction_threshold_ms: 2000,
        }
    }
}

/// Named threshold sets selectable from settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertnessPreset {
    #[default]
    Standard,
    Strict,
    Lenient,
}

impl DmsConfig {
    pub fn from_preset(preset: AlertnessPreset) -> Self {
        match preset {
            AlertnessPreset::Standard => Self::default(),
            AlertnessPreset::Strict => Self::strict(),
            AlertnessPreset::Lenient => Self::lenient(),
        }
    }

    /// Fires sooner on closed eyes and looking away
    pub fn strict() -> Self {
        Self {
            drowsiness_threshold_ms: 700,
            distraction_threshold_ms: 1500,
            gaze_out_threshold: 0.5,
            ..Default::default()
        }
    }

    /// Tolerates longer blinks and mirror checks
    pub fn lenient() -> Self {
        Self {
            drowsiness_threshold_ms: 1500,
            distraction_threshold_ms: 3000,
            gaze_out_threshold: 0.7,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_bracket_defaults() {
        let default = DmsConfig::default();
        let strict = DmsConfig::from_preset(AlertnessPreset::Strict);
        let lenient = DmsConfig::from_preset(AlertnessPreset::Lenient);

        assert!(strict.drowsiness_threshold_ms < default.drowsiness_threshold_ms);
        assert!(lenient.drowsiness_threshold_ms > default.drowsiness_threshold_ms);
        assert!(strict.gaze_out_threshold < lenient.gaze_out_threshold);
        assert_eq!(strict.decimation, default.decimation);
        assert_eq!(
            DmsConfig::from_preset(AlertnessPreset::Standard).drowsiness_threshold_ms,
            default.drowsiness_threshold_ms
        );
    }
}
