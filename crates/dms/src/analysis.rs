//! Blendshape feature aggregation and expression classification

use crate::state::Mood;
use serde::{Deserialize, Serialize};

/// One named blendshape score in [0, 1]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blendshape {
    pub name: String,
    pub score: f32,
}

impl Blendshape {
    pub fn new(name: impl Into<String>, score: f32) -> Self {
        Self {
            name: name.into(),
            score,
        }
    }
}

/// Face landmarker output for one frame
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FaceResult {
    /// Blendshape scores
    pub blendshapes: Vec<Blendshape>,

    /// Face mesh points, normalized (x, y)
    pub landmarks: Vec<(f32, f32)>,
}

impl FaceResult {
    pub fn new(blendshapes: Vec<Blendshape>, landmarks: Vec<(f32, f32)>) -> Self {
        Self {
            blendshapes,
            landmarks,
        }
    }

    pub fn has_blendshapes(&self) -> bool {
        !self.blendshapes.is_empty()
    }
}

/// Aggregated expression features
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BlendshapeFeatures {
    /// mouthSmileLeft + mouthSmileRight
    pub smile: f32,
    pub jaw_open: f32,
    /// browDownLeft + browDownRight
    pub brow_down: f32,
    /// mouthFrownLeft + mouthFrownRight
    pub frown: f32,
    pub blink_left: f32,
    pub blink_right: f32,
    /// 0.5 per eye whose blink score exceeds 0.5
    pub combined_blink: f32,
    /// Last eyeLookOut/Up/Down score above 0.5
    pub gaze_out: f32,
    pub brow_inner_up: f32,
    /// Last noseSneer score above 0.5
    pub nose_sneer: f32,
    pub cheek_puff: f32,
    /// eyeSquintLeft + eyeSquintRight
    pub eye_squint: f32,
}

impl BlendshapeFeatures {
    /// Fold a blendshape list into features. Unknown names are ignored.
    pub fn from_blendshapes(blendshapes: &[Blendshape]) -> Self {
        let mut f = Self::default();

        for b in blendshapes {
            let score = b.score;
            match b.name.as_str() {
                "mouthSmileLeft" | "mouthSmileRight" => f.smile += score,
                "jawOpen" => f.jaw_open = score,
                "browDownLeft" | "browDownRight" => f.brow_down += score,
                "mouthFrownLeft" | "mouthFrownRight" => f.frown += score,
                "eyeBlinkLeft" | "eyeBlinkRight" => {
                    if b.name == "eyeBlinkLeft" {
                        f.blink_left = score;
                    } else {
                        f.blink_right = score;
                    }
                    if score > 0.5 {
                        f.combined_blink += 0.5;
                    }
                }
                "eyeLookOutLeft" | "eyeLookOutRight" | "eyeLookUp" | "eyeLookDown" => {
                    if score > 0.5 {
                        f.gaze_out = score;
                    }
                }
                "browInnerUp" => f.brow_inner_up = score,
                "noseSneerLeft" | "noseSneerRight" => {
                    if score > 0.5 {
                        f.nose_sneer = score;
                    }
                }
                "cheekPuff" => f.cheek_puff = score,
                "eyeSquintLeft" | "eyeSquintRight" => f.eye_squint += score,
                _ => {}
            }
        }

        f
    }
}

/// Immediate expression, first match wins
pub fn classify_expression(f: &BlendshapeFeatures) -> Mood {
    if f.brow_inner_up > 0.5 {
        Mood::Confused
    } else if f.nose_sneer > 0.5 {
        Mood::Discomfort
    } else if f.cheek_puff > 0.4 {
        Mood::Frustrated
    } else if f.eye_squint > 1.0 && f.smile < 0.2 {
        Mood::Skeptical
    } else if f.smile > 0.5 {
        Mood::Happy
    } else if f.brow_down > 0.5 {
        Mood::Angry
    } else if f.frown > 0.5 {
        Mood::Sad
    } else if f.jaw_open > 0.45 {
        Mood::Surprised
    } else if f.blink_left > 0.5 && f.blink_right < 0.2 {
        Mood::WinkingLeft
    } else if f.blink_right > 0.5 && f.blink_left < 0.2 {
        Mood::WinkingRight
    } else {
        Mood::Neutral
    }
}
