//! Driver Monitoring System (DMS)
//!
//! Alertness and expression state from face blendshape scores:
//! - Drowsiness (both eyes closed, sustained)
//! - Distraction (gaze away from the road, sustained)
//! - Immediate expressions (confused, happy, angry, ...)

pub mod analysis;
pub mod config;
pub mod state;

pub use analysis::{classify_expression, Blendshape, BlendshapeFeatures, FaceResult};
pub use config::{AlertnessPreset, DmsConfig};
pub use state::Mood;

use state::AlertState;

use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Mood / alertness state machine
pub struct MoodMonitor {
    config: DmsConfig,
    state: AlertState,
    frame_count: u64,
}

impl MoodMonitor {
    /// Create a new monitor with configuration
    pub fn new(config: DmsConfig) -> Self {
        Self {
            config,
            state: AlertState::default(),
            frame_count: 0,
        }
    }

    /// Count one processed frame; true on every Nth frame.
    ///
    /// Face inference is only worth running when this returns true.
    pub fn tick(&mut self) -> bool {
        self.frame_count += 1;
        self.frame_count % u64::from(self.config.decimation.max(1)) == 0
    }

    /// Current mood
    pub fn mood(&self) -> Mood {
        self.state.mood
    }

    /// Evaluate one face result and return the new mood.
    ///
    /// A missing face (or one without blendshapes) leaves mood and timers
    /// unchanged.
    pub fn evaluate(&mut self, face: Option<&FaceResult>, now: Instant) -> Mood {
        let Some(face) = face.filter(|f| f.has_blendshapes()) else {
            return self.state.mood;
        };

        let features = BlendshapeFeatures::from_blendshapes(&face.blendshapes);

        let drowsy = sustained(
            &mut self.state.eyes_closed_since,
            features.combined_blink > self.config.eyes_closed_threshold,
            Duration::from_millis(self.config.drowsiness_threshold_ms),
            now,
        );
        let distracted = sustained(
            &mut self.state.gaze_away_since,
            features.gaze_out > self.config.gaze_out_threshold,
            Duration::from_millis(self.config.distraction_threshold_ms),
            now,
        );

        let mood = if drowsy {
            Mood::DrowsyWarning
        } else if distracted {
            Mood::Distracted
        } else {
            classify_expression(&features)
        };

        if mood.is_critical() {
            warn!("Critical State: {}", mood);
        } else if mood != self.state.mood {
            debug!("Mood changed: {} -> {}", self.state.mood, mood);
        }

        self.state.mood = mood;
        mood
    }
}

impl Default for MoodMonitor {
    fn default() -> Self {
        Self::new(DmsConfig::default())
    }
}

/// Hysteresis timer: true once `active` has held for `threshold`.
///
/// While it keeps holding the start is pinned at `now - threshold` so the
/// condition re-fires on every evaluation; a single inactive sample clears it.
fn sustained(since: &mut Option<Instant>, active: bool, threshold: Duration, now: Instant) -> bool {
    if !active {
        *since = None;
        return false;
    }

    let start = *since.get_or_insert(now);
    if now.saturating_duration_since(start) >= threshold {
        *since = Some(now.checked_sub(threshold).unwrap_or(start));
        true
    } else {
        false
    }
}
