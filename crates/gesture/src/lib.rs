//! Gesture Classification
//!
//! Turns one hand recognizer result plus scene luminance into a single
//! [`GestureEvent`] per frame:
//! - Night-mode confidence threshold
//! - Geometric overrides (two-finger directions, pointing down)
//! - Swipe and static-hand filters over a short wrist history
//! - Driver-zone gating
//! - Sleep/wake hysteresis with a held wake gesture

pub mod geometry;
pub mod landmarks;
pub mod motion;
pub mod wake;

pub use landmarks::{category, HandLandmarks, Point2, HAND_POINTS};
pub use motion::MotionTracker;
pub use wake::{SleepState, WakeMachine, WakeProgress};

use dms::Mood;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;

/// Gesture classifier configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Disables the wake machine, static filter and driver zone
    pub demo_mode: bool,

    /// Central luminance below this enables night mode
    pub night_luminance: u8,

    /// Confidence threshold at night
    pub night_threshold: f32,

    /// Confidence threshold in daylight
    pub day_threshold: f32,

    /// Wake gesture must be held this long (milliseconds)
    pub wake_hold_ms: u64,

    /// Awake period without activity before sleeping (milliseconds)
    pub awake_timeout_ms: u64,

    /// Wrist x beyond which the hand belongs to the passenger
    pub driver_zone_max_x: f32,

    /// Thumb/index tip distance that counts as a pinch
    pub pinch_distance: f32,

    /// Wrist displacement below which the hand is static
    pub static_displacement: f32,

    /// Wrist velocity above which a swipe is reported (per second)
    pub swipe_velocity: f32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            demo_mode: false,
            night_luminance: 80,
            night_threshold: 0.4,
            day_threshold: 0.6,
            wake_hold_ms: 1000,
            awake_timeout_ms: 10_000,
            driver_zone_max_x: 0.6,
            pinch_distance: 0.05,
            static_displacement: 0.02,
            swipe_velocity: 0.5,
        }
    }
}

impl GestureConfig {
    /// Always-awake configuration for demonstrations
    pub fn demo() -> Self {
        Self {
            demo_mode: true,
            ..Default::default()
        }
    }
}

/// Per-frame classifier output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GestureEvent {
    pub category: String,
    pub score: f32,
    pub feedback: String,
    pub position_hint: String,
    pub is_night_mode: bool,
    pub sleep_state: SleepState,
    pub demo_mode: bool,
    pub mood: Mood,
}

impl GestureEvent {
    /// Whether this event names something the dispatcher can act on
    pub fn is_actionable(&self) -> bool {
        self.category != category::NONE
            && !matches!(
                self.category.as_str(),
                category::WAKE_UP | category::POSSIBLE_WAKE | category::SLEEPING
            )
    }
}

mod hint {
    pub const CENTERED: &str = "Centered";
    pub const MOVE_RIGHT: &str = "Move Right >";
    pub const MOVE_LEFT: &str = "< Move Left";
    pub const PASSENGER: &str = "passenger zone ignored";
    pub const NO_HAND: &str = "No Hand";
}

/// Gesture classifier with owned wake state and hand history
pub struct GestureClassifier {
    config: GestureConfig,
    wake: WakeMachine,
    motion: MotionTracker,
}

impl GestureClassifier {
    pub fn new(config: GestureConfig) -> Self {
        let wake = WakeMachine::new(
            Duration::from_millis(config.wake_hold_ms),
            Duration::from_millis(config.awake_timeout_ms),
        );
        Self {
            config,
            wake,
            motion: MotionTracker::new(),
        }
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    pub fn sleep_state(&self) -> SleepState {
        self.wake.state()
    }

    pub fn is_sleeping(&self) -> bool {
        self.wake.is_sleeping()
    }

    /// Classify one frame. Always returns exactly one event.
    pub fn process(
        &mut self,
        hand: Option<&HandLandmarks>,
        luminance: u8,
        mood: Mood,
        now: Instant,
    ) -> GestureEvent {
        if self.config.demo_mode {
            self.wake.force_awake(now);
        } else {
            self.wake.check_timeout(now);
        }

        let night = luminance < self.config.night_luminance;
        let threshold = if night {
            self.config.night_threshold
        } else {
            self.config.day_threshold
        };

        let event = |s: &Self, category: &str, score: f32, feedback: &str, hint: &str| GestureEvent {
            category: category.to_string(),
            score,
            feedback: feedback.to_string(),
            position_hint: hint.to_string(),
            is_night_mode: night,
            sleep_state: s.wake.state(),
            demo_mode: s.config.demo_mode,
            mood,
        };

        let Some(hand) = hand else {
            self.wake.reset_hold();
            return if self.wake.is_sleeping() {
                event(self, category::SLEEPING, 0.0, "Show Palm to Wake", hint::NO_HAND)
            } else {
                event(self, category::NONE, 0.0, " ", hint::NO_HAND)
            };
        };

        let score = hand.score;
        let mut name: &str = &hand.category;

        if let Some(over) = geometry::directional_override(hand) {
            name = over;
        }

        let wrist_x = hand.wrist().x;
        self.motion.record(now, wrist_x);

        let is_static =
            !self.config.demo_mode && self.motion.is_static(self.config.static_displacement);
        if let Some(swipe) = self.motion.swipe(self.config.swipe_velocity) {
            name = swipe;
        }

        let in_zone = self.config.demo_mode || wrist_x <= self.config.driver_zone_max_x;
        let position = if !in_zone {
            hint::PASSENGER
        } else if wrist_x < 0.3 {
            hint::MOVE_RIGHT
        } else if wrist_x > 0.5 {
            hint::MOVE_LEFT
        } else {
            hint::CENTERED
        };

        if self.wake.is_sleeping() {
            if in_zone && name == category::OPEN_PALM && score > threshold {
                return match self.wake.hold(now) {
                    WakeProgress::Woke => {
                        event(self, category::WAKE_UP, score, "System Active", position)
                    }
                    WakeProgress::Holding => {
                        event(self, category::POSSIBLE_WAKE, score, "Hold to Wake...", position)
                    }
                };
            }
            self.wake.reset_hold();
            return event(self, category::SLEEPING, score, "Show Palm to Wake", position);
        }

        if in_zone
            && score > threshold
            && geometry::pinch_distance(hand) < self.config.pinch_distance
        {
            self.wake.touch(now);
            return event(self, category::PINCH, score, "Privacy Toggled", position);
        }

        if !in_zone {
            return event(self, category::NONE, 0.0, "Ignored (Passenger)", position);
        }

        if is_static {
            return event(self, category::NONE, score, "Ignored (Static/Wheel)", position);
        }

        let feedback = if score > 0.8 { "Excellent" } else { "Good" };
        if score > threshold {
            self.wake.touch(now);
            debug!("Gesture {} ({:.2})", name, score);
            event(self, name, score, feedback, position)
        } else {
            event(self, category::NONE, score, " ", position)
        }
    }
}

impl Default for GestureClassifier {
    fn default() -> Self {
        Self::new(GestureConfig::default())
    }
}
