//! Sleep/wake hysteresis

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::info;

/// Wake machine state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SleepState {
    #[default]
    Sleeping,
    /// Asleep with a wake gesture being held
    WakeHold,
    Awake,
}

/// Outcome of a frame carrying the wake gesture while asleep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeProgress {
    Holding,
    Woke,
}

/// Sleep/wake machine. Starts asleep.
#[derive(Debug, Clone)]
pub struct WakeMachine {
    sleeping: bool,
    /// Last wake-sustaining activity
    last_active: Option<Instant>,
    /// Start of the current wake-gesture hold
    hold_start: Option<Instant>,
    hold: Duration,
    awake_for: Duration,
}

impl WakeMachine {
    pub fn new(hold: Duration, awake_for: Duration) -> Self {
        Self {
            sleeping: true,
            last_active: None,
            hold_start: None,
            hold,
            awake_for,
        }
    }

    pub fn state(&self) -> SleepState {
        match (self.sleeping, self.hold_start) {
            (false, _) => SleepState::Awake,
            (true, Some(_)) => SleepState::WakeHold,
            (true, None) => SleepState::Sleeping,
        }
    }

    pub fn is_sleeping(&self) -> bool {
        self.sleeping
    }

    /// Fall asleep when awake with no activity for longer than the awake period
    pub fn check_timeout(&mut self, now: Instant) {
        if self.sleeping {
            return;
        }
        let idle = self
            .last_active
            .map_or(Duration::MAX, |t| now.saturating_duration_since(t));
        if idle > self.awake_for {
            info!("No activity for {}ms, going to sleep", idle.as_millis());
            self.sleeping = true;
            self.hold_start = None;
        }
    }

    /// Wake gesture seen while asleep
    pub fn hold(&mut self, now: Instant) -> WakeProgress {
        let start = *self.hold_start.get_or_insert(now);
        if now.saturating_duration_since(start) >= self.hold {
            info!("Wake gesture held, system active");
            self.sleeping = false;
            self.hold_start = None;
            self.last_active = Some(now);
            WakeProgress::Woke
        } else {
            WakeProgress::Holding
        }
    }

    /// Any interrupting frame restarts the hold
    pub fn reset_hold(&mut self) {
        self.hold_start = None;
    }

    /// Record wake-sustaining activity
    pub fn touch(&mut self, now: Instant) {
        self.last_active = Some(now);
    }

    /// Force awake (demo bypass)
    pub fn force_awake(&mut self, now: Instant) {
        self.sleeping = false;
        self.hold_start = None;
        self.last_active = Some(now);
    }
}
