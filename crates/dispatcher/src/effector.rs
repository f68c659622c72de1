//! Vehicle / media side effects

use crate::action::{Action, SafetyAlert, Tone};
use crate::EffectorError;
use tracing::{info, warn};

/// External side-effecting calls made by the dispatcher.
///
/// Calls are fire-and-forget; the dispatcher logs failures and carries on.
pub trait Effector: Send + Sync {
    fn perform(&self, action: Action) -> Result<(), EffectorError>;

    fn play_tone(&self, tone: Tone) -> Result<(), EffectorError>;

    fn alert(&self, alert: SafetyAlert) -> Result<(), EffectorError>;
}

/// Effector that only logs; used when no vehicle bus is attached
#[derive(Debug, Default, Clone)]
pub struct LoggingEffector;

impl Effector for LoggingEffector {
    fn perform(&self, action: Action) -> Result<(), EffectorError> {
        info!(action = action.as_str(), "Effector action");
        Ok(())
    }

    fn play_tone(&self, tone: Tone) -> Result<(), EffectorError> {
        info!(?tone, "Confirmation tone");
        Ok(())
    }

    fn alert(&self, alert: SafetyAlert) -> Result<(), EffectorError> {
        warn!(alert = alert.as_str(), "Safety alert");
        Ok(())
    }
}
