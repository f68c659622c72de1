//! Landmark inference seam

use crate::InferenceError;
use dms::FaceResult;
use gesture::HandLandmarks;
use stream_capture::VideoFrame;

/// Hand and face landmark models.
///
/// Called only from the processing context. Face inference is requested on
/// the mood decimation cadence, hand inference on every gesture pass.
pub trait LandmarkInference: Send {
    /// Zero or one hand
    fn infer_hand(&mut self, frame: &VideoFrame) -> Result<Option<HandLandmarks>, InferenceError>;

    /// Zero or one face with blendshapes and mesh points
    fn infer_face(&mut self, frame: &VideoFrame) -> Result<Option<FaceResult>, InferenceError>;
}

/// Inference stand-in that never detects anything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopInference;

impl LandmarkInference for NoopInference {
    fn infer_hand(&mut self, _frame: &VideoFrame) -> Result<Option<HandLandmarks>, InferenceError> {
        Ok(None)
    }

    fn infer_face(&mut self, _frame: &VideoFrame) -> Result<Option<FaceResult>, InferenceError> {
        Ok(None)
    }
}
