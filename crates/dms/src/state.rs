//! Driver state tracking

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

/// Alertness / expression label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Mood {
    #[default]
    #[serde(rename = "Neutral")]
    Neutral,
    #[serde(rename = "DROWSY WARNING")]
    DrowsyWarning,
    #[serde(rename = "DISTRACTED")]
    Distracted,
    #[serde(rename = "Confused ?")]
    Confused,
    #[serde(rename = "Discomfort/Wince")]
    Discomfort,
    #[serde(rename = "Frustrated (Cheek Puff)")]
    Frustrated,
    #[serde(rename = "Skeptical -_-")]
    Skeptical,
    #[serde(rename = "Happy :)")]
    Happy,
    #[serde(rename = "Angry >:(")]
    Angry,
    #[serde(rename = "Sad :(")]
    Sad,
    #[serde(rename = "Surprised :O")]
    Surprised,
    #[serde(rename = "Winking (Left)")]
    WinkingLeft,
    #[serde(rename = "Winking (Right)")]
    WinkingRight,
}

impl Mood {
    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            Mood::Neutral => "Neutral",
            Mood::DrowsyWarning => "DROWSY WARNING",
            Mood::Distracted => "DISTRACTED",
            Mood::Confused => "Confused ?",
            Mood::Discomfort => "Discomfort/Wince",
            Mood::Frustrated => "Frustrated (Cheek Puff)",
            Mood::Skeptical => "Skeptical -_-",
            Mood::Happy => "Happy :)",
            Mood::Angry => "Angry >:(",
            Mood::Sad => "Sad :(",
            Mood::Surprised => "Surprised :O",
            Mood::WinkingLeft => "Winking (Left)",
            Mood::WinkingRight => "Winking (Right)",
        }
    }

    /// Safety-relevant states that outrank any expression
    pub fn is_critical(&self) -> bool {
        matches!(self, Mood::DrowsyWarning | Mood::Distracted)
    }

    /// Expressions that raise the stress classification on their own
    pub fn is_negative(&self) -> bool {
        matches!(self, Mood::Angry | Mood::Sad)
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Alert state (tracked over time)
///
/// The timers are only touched by [`crate::MoodMonitor`].
#[derive(Debug, Clone, Default)]
pub(crate) struct AlertState {
    pub(crate) mood: Mood,

    /// Start of the current eyes-closed run
    pub(crate) eyes_closed_since: Option<Instant>,

    /// Start of the current gaze-away run
    pub(crate) gaze_away_since: Option<Instant>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_uses_label() {
        assert_eq!(Mood::DrowsyWarning.to_string(), "DROWSY WARNING");
        assert_eq!(Mood::Angry.to_string(), "Angry >:(");
        assert_eq!(Mood::default(), Mood::Neutral);
    }

    #[test]
    fn test_classification_helpers() {
        assert!(Mood::DrowsyWarning.is_critical());
        assert!(Mood::Distracted.is_critical());
        assert!(!Mood::Confused.is_critical());
        assert!(Mood::Sad.is_negative());
        assert!(!Mood::Happy.is_negative());
    }
}
