//! Cabin Pipeline
//!
//! Wires capture, classification and dispatch into one running service:
//! - Single processing context fed by a small frame queue
//! - Status fan-out to any number of observers
//! - Stream watchdog with automatic reconnect

pub mod inference;
pub mod processor;
pub mod service;
pub mod status;
pub mod watchdog;

pub use inference::{LandmarkInference, NoopInference};
pub use processor::{ControlCommand, FrameOutcome, FrameProcessor};
pub use service::CabinService;
pub use status::{StatusSink, StatusSnapshot, StatusUpdate};
pub use watchdog::{run_watchdog, Heartbeat, StreamSupervisor, Watchdog, WatchdogConfig, WatchdogVerdict};

use dispatcher::DispatcherConfig;
use dms::DmsConfig;
use gesture::GestureConfig;
use serde::{Deserialize, Serialize};
use stream_capture::{CaptureConfig, CaptureError};
use thiserror::Error;
use vitals::VitalsConfig;

/// Landmark model errors
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Inference failed: {0}")]
    Failed(String),
}

/// Service errors
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("No stream source has been set")]
    NoSource,

    #[error("Processing context is gone")]
    ChannelClosed,

    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Full pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub capture: CaptureConfig,
    pub gesture: GestureConfig,
    pub dms: DmsConfig,
    pub vitals: VitalsConfig,
    pub dispatcher: DispatcherConfig,
    pub watchdog: WatchdogConfig,

    /// Decoded frames waiting for the processing context
    pub frame_queue: usize,

    /// Minimum spacing between gesture passes (milliseconds)
    pub gesture_interval_ms: u64,

    /// Status broadcast buffer per observer
    pub status_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            capture: CaptureConfig::default(),
            gesture: GestureConfig::default(),
            dms: DmsConfig::default(),
            vitals: VitalsConfig::default(),
            dispatcher: DispatcherConfig::default(),
            watchdog: WatchdogConfig::default(),
            frame_queue: 2,
            gesture_interval_ms: 100,
            status_capacity: 64,
        }
    }
}
