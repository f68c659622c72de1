//! Debounced dispatch

use crate::action::{Action, SafetyAlert};
use crate::effector::Effector;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use storage::MappingStore;
use tracing::{debug, error, info, warn};

/// Dispatcher configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Minimum spacing between gesture-derived actions (milliseconds)
    pub debounce_ms: u64,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self { debounce_ms: 1000 }
    }
}

/// Gesture-to-action dispatcher
pub struct CommandDispatcher {
    config: DispatcherConfig,
    store: Arc<dyn MappingStore>,
    effector: Arc<dyn Effector>,
    /// Last gesture-derived dispatch
    last_command: Option<Instant>,
}

impl CommandDispatcher {
    pub fn new(
        config: DispatcherConfig,
        store: Arc<dyn MappingStore>,
        effector: Arc<dyn Effector>,
    ) -> Self {
        info!("Creating command dispatcher with config: {:?}", config);
        Self {
            config,
            store,
            effector,
            last_command: None,
        }
    }

    fn debounce(&self) -> Duration {
        Duration::from_millis(self.config.debounce_ms)
    }

    /// Dispatch the action mapped to a gesture.
    ///
    /// Returns the action performed, or `None` when the category is "None",
    /// the debounce window is still open, or the gesture maps to nothing.
    /// Only a performed action restarts the debounce window.
    pub fn on_gesture(&mut self, category: &str, now: Instant) -> Option<Action> {
        if category == "None" {
            return None;
        }

        if let Some(last) = self.last_command {
            if now.saturating_duration_since(last) < self.debounce() {
                debug!("Gesture {} suppressed: in debounce window", category);
                return None;
            }
        }

        let name = match self.store.get(category) {
            Ok(name) => name,
            Err(e) => {
                warn!("Mapping lookup failed for {}: {}", category, e);
                return None;
            }
        };
        let action = Action::parse(&name)?;

        info!("Gesture: {} -> Action: {}", category, action);
        self.execute(action);
        self.last_command = Some(now);
        metrics::counter!("dispatcher_actions_total", "action" => action.as_str()).increment(1);
        Some(action)
    }

    /// Raise a safety alert. Not subject to the gesture debounce.
    pub fn trigger_safety(&self, alert: SafetyAlert) {
        warn!("Safety alert: {}", alert.as_str());
        if let Err(e) = self.effector.alert(alert) {
            error!("Safety alert {} failed: {}", alert.as_str(), e);
        }
        metrics::counter!("dispatcher_safety_alerts_total", "alert" => alert.as_str())
            .increment(1);
    }

    fn execute(&self, action: Action) {
        if let Err(e) = self.effector.perform(action) {
            error!("Action {} failed: {}", action, e);
        }
        if let Err(e) = self.effector.play_tone(action.tone()) {
            error!("Tone error: {}", e);
        }
    }
}
