//! Actions, tones and safety alerts

use serde::{Deserialize, Serialize};
use std::fmt;

/// Effector action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    Play,
    Pause,
    Next,
    Previous,
    VolumeUp,
    VolumeDown,
    Mute,
    Home,
    Favorite,
}

impl Action {
    /// Parse a stored action name. "NONE" and unknown names yield `None`.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "PLAY" => Some(Action::Play),
            "PAUSE" => Some(Action::Pause),
            "NEXT" => Some(Action::Next),
            "PREVIOUS" => Some(Action::Previous),
            "VOLUME_UP" => Some(Action::VolumeUp),
            "VOLUME_DOWN" => Some(Action::VolumeDown),
            "MUTE" => Some(Action::Mute),
            "HOME" => Some(Action::Home),
            "FAVORITE" => Some(Action::Favorite),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Play => "PLAY",
            Action::Pause => "PAUSE",
            Action::Next => "NEXT",
            Action::Previous => "PREVIOUS",
            Action::VolumeUp => "VOLUME_UP",
            Action::VolumeDown => "VOLUME_DOWN",
            Action::Mute => "MUTE",
            Action::Home => "HOME",
            Action::Favorite => "FAVORITE",
        }
    }

    /// Confirmation tone for this action
    pub fn tone(&self) -> Tone {
        match self {
            Action::Home | Action::Favorite => Tone::DoubleBeep,
            _ => Tone::Beep,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Confirmation tone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tone {
    Beep,
    DoubleBeep,
}

/// Safety alert raised outside the gesture debounce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SafetyAlert {
    Drowsiness,
    Distraction,
    Confusion,
    Discomfort,
    HighStress,
}

impl SafetyAlert {
    pub fn as_str(&self) -> &'static str {
        match self {
            SafetyAlert::Drowsiness => "drowsiness",
            SafetyAlert::Distraction => "distraction",
            SafetyAlert::Confusion => "confusion",
            SafetyAlert::Discomfort => "discomfort",
            SafetyAlert::HighStress => "high_stress",
        }
    }
}
