//! Command Dispatcher
//!
//! Maps gesture categories to effector actions with a global debounce, and
//! exposes separate entry points for safety alerts that bypass it.

mod action;
mod dispatcher;
mod effector;

pub use action::{Action, SafetyAlert, Tone};
pub use dispatcher::{CommandDispatcher, DispatcherConfig};
pub use effector::{Effector, LoggingEffector};

use thiserror::Error;

/// Effector errors
#[derive(Debug, Error)]
pub enum EffectorError {
    #[error("Effector call failed: {0}")]
    Failed(String),
}
