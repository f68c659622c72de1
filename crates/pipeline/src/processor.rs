//! Single processing context
//!
//! Owns every piece of classifier state. Frames and control commands are
//! handled strictly one at a time.

use crate::inference::LandmarkInference;
use crate::status::StatusSink;
use crate::watchdog::Heartbeat;
use crate::PipelineConfig;
use dispatcher::{Action, CommandDispatcher, SafetyAlert};
use dms::{FaceResult, Mood, MoodMonitor};
use gesture::{GestureClassifier, GestureEvent, SleepState};
use std::time::{Duration, Instant};
use stream_capture::VideoFrame;
use tracing::{debug, info, warn};
use vitals::{HealthState, HeartRateEstimator, StressLevel};

/// Requests from outside the processing context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    /// Clear the calm-mode latch
    ResetCalmMode,
}

/// What one frame produced
#[derive(Debug, Clone, Default)]
pub struct FrameOutcome {
    /// Set when the frame got a gesture pass
    pub gesture: Option<GestureEvent>,
    pub action: Option<Action>,
    /// Set when the frame was sampled for vitals
    pub health: Option<HealthState>,
}

pub struct FrameProcessor {
    inference: Box<dyn LandmarkInference>,
    gesture: GestureClassifier,
    mood: MoodMonitor,
    vitals: HeartRateEstimator,
    dispatcher: CommandDispatcher,
    sink: StatusSink,
    heartbeat: Heartbeat,
    gesture_interval: Duration,
    last_gesture_pass: Option<Instant>,
    /// Latest face result, reused for the vitals ROI between evaluations
    last_face: Option<FaceResult>,
}

impl FrameProcessor {
    pub fn new(
        config: &PipelineConfig,
        inference: Box<dyn LandmarkInference>,
        dispatcher: CommandDispatcher,
        sink: StatusSink,
        heartbeat: Heartbeat,
    ) -> Self {
        Self {
            inference,
            gesture: GestureClassifier::new(config.gesture.clone()),
            mood: MoodMonitor::new(config.dms.clone()),
            vitals: HeartRateEstimator::new(config.vitals.clone()),
            dispatcher,
            sink,
            heartbeat,
            gesture_interval: Duration::from_millis(config.gesture_interval_ms),
            last_gesture_pass: None,
            last_face: None,
        }
    }

    pub fn mood(&self) -> Mood {
        self.mood.mood()
    }

    pub fn calm_mode_active(&self) -> bool {
        self.vitals.calm_mode_active()
    }

    pub fn handle_command(&mut self, command: ControlCommand) {
        match command {
            ControlCommand::ResetCalmMode => {
                info!("Calm mode reset requested");
                self.vitals.reset_calm_mode();
            }
        }
    }

    /// Run one frame through gesture, mood and vitals
    pub fn process_frame(&mut self, frame: &VideoFrame, now: Instant) -> FrameOutcome {
        self.heartbeat.beat(now);
        metrics::counter!("pipeline_frames_processed_total").increment(1);

        let mut outcome = FrameOutcome::default();

        let due = self
            .last_gesture_pass
            .map_or(true, |t| now.saturating_duration_since(t) >= self.gesture_interval);
        if due {
            self.last_gesture_pass = Some(now);
            let (event, action) = self.gesture_pass(frame, now);
            outcome.gesture = Some(event);
            outcome.action = action;
        }

        outcome.health = self.vitals_pass(frame, now);
        outcome
    }

    fn gesture_pass(&mut self, frame: &VideoFrame, now: Instant) -> (GestureEvent, Option<Action>) {
        let hand = match self.inference.infer_hand(frame) {
            Ok(hand) => hand,
            Err(e) => {
                warn!("Hand inference error: {}", e);
                None
            }
        };

        if self.mood.tick() {
            self.mood_pass(frame, now);
        }

        let luminance = frame.center_luminance();
        let event = self
            .gesture
            .process(hand.as_ref(), luminance, self.mood.mood(), now);

        let action = if event.sleep_state == SleepState::Awake && event.is_actionable() {
            self.dispatcher.on_gesture(&event.category, now)
        } else {
            None
        };

        self.sink.gesture(event.clone());
        (event, action)
    }

    fn mood_pass(&mut self, frame: &VideoFrame, now: Instant) {
        let face = match self.inference.infer_face(frame) {
            Ok(face) => face,
            Err(e) => {
                warn!("Face inference error: {}", e);
                None
            }
        };

        let evaluated = face.as_ref().map_or(false, |f| f.has_blendshapes());
        let previous = self.mood.mood();
        let mood = self.mood.evaluate(face.as_ref(), now);
        self.last_face = face;

        if !evaluated {
            return;
        }

        let entered = mood != previous;
        let alert = match mood {
            Mood::DrowsyWarning => Some(SafetyAlert::Drowsiness),
            Mood::Distracted if entered => Some(SafetyAlert::Distraction),
            Mood::Confused if entered => Some(SafetyAlert::Confusion),
            Mood::Discomfort if entered => Some(SafetyAlert::Discomfort),
            _ => None,
        };
        if let Some(alert) = alert {
            self.dispatcher.trigger_safety(alert);
        }
    }

    fn vitals_pass(&mut self, frame: &VideoFrame, now: Instant) -> Option<HealthState> {
        let landmarks = self
            .last_face
            .as_ref()
            .map(|f| f.landmarks.as_slice())
            .filter(|l| !l.is_empty());

        let mut state = self.vitals.process(frame, landmarks, self.mood.mood(), now)?;

        if state.stress_level == StressLevel::High && !self.vitals.calm_mode_active() {
            debug!("High stress at {} bpm", state.heart_rate_bpm);
            self.dispatcher.trigger_safety(SafetyAlert::HighStress);
            self.vitals.activate_calm_mode();
            state.calm_mode_active = true;
        }

        self.sink.health(state.clone());
        Some(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InferenceError;
    use dispatcher::{DispatcherConfig, Effector, EffectorError, Tone};
    use dms::Blendshape;
    use gesture::{category, GestureConfig, HandLandmarks, Point2, HAND_POINTS};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use storage::MemoryMappingStore;

    #[derive(Default)]
    struct Recorder {
        actions: Mutex<Vec<Action>>,
        alerts: Mutex<Vec<SafetyAlert>>,
    }

    impl Effector for Recorder {
        fn perform(&self, action: Action) -> Result<(), EffectorError> {
            self.actions.lock().unwrap().push(action);
            Ok(())
        }

        fn play_tone(&self, _tone: Tone) -> Result<(), EffectorError> {
            Ok(())
        }

        fn alert(&self, alert: SafetyAlert) -> Result<(), EffectorError> {
            self.alerts.lock().unwrap().push(alert);
            Ok(())
        }
    }

    /// Replays queued hands; the face is fixed
    #[derive(Default)]
    struct Scripted {
        hands: VecDeque<Option<HandLandmarks>>,
        face: Option<FaceResult>,
        fail_hand: bool,
    }

    impl LandmarkInference for Scripted {
        fn infer_hand(&mut self, _frame: &VideoFrame) -> Result<Option<HandLandmarks>, InferenceError> {
            if self.fail_hand {
                return Err(InferenceError::Failed("model not loaded".to_string()));
            }
            Ok(self.hands.pop_front().flatten())
        }

        fn infer_face(&mut self, _frame: &VideoFrame) -> Result<Option<FaceResult>, InferenceError> {
            Ok(self.face.clone())
        }
    }

    fn hand(name: &str, wrist_x: f32) -> HandLandmarks {
        let mut points = [Point2::new(wrist_x, 0.6); HAND_POINTS];
        points[0] = Point2::new(wrist_x, 0.8);
        for tip in [8, 12, 16, 20] {
            points[tip] = Point2::new(wrist_x, 0.62);
        }
        points[4] = Point2::new(wrist_x - 0.1, 0.45);
        HandLandmarks::new(name, 0.9, points)
    }

    fn face(shapes: &[(&str, f32)]) -> FaceResult {
        FaceResult::new(
            shapes.iter().map(|(n, s)| Blendshape::new(*n, *s)).collect(),
            vec![],
        )
    }

    fn processor(config: PipelineConfig, inference: Scripted) -> (FrameProcessor, Arc<Recorder>, StatusSink) {
        let recorder = Arc::new(Recorder::default());
        let dispatcher = CommandDispatcher::new(
            DispatcherConfig::default(),
            Arc::new(MemoryMappingStore::new()),
            recorder.clone(),
        );
        let sink = StatusSink::default();
        let p = FrameProcessor::new(&config, Box::new(inference), dispatcher, sink.clone(), Heartbeat::new());
        (p, recorder, sink)
    }

    fn demo_config() -> PipelineConfig {
        PipelineConfig {
            gesture: GestureConfig::demo(),
            ..Default::default()
        }
    }

    fn frame() -> VideoFrame {
        VideoFrame::filled(160, 120, [120, 140, 110])
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_gesture_dispatches_action() {
        let inference = Scripted {
            hands: VecDeque::from(vec![Some(hand(category::THUMB_UP, 0.4))]),
            ..Default::default()
        };
        let (mut p, recorder, sink) = processor(demo_config(), inference);

        let outcome = p.process_frame(&frame(), Instant::now());
        assert_eq!(outcome.gesture.unwrap().category, category::THUMB_UP);
        assert_eq!(outcome.action, Some(Action::VolumeUp));
        assert_eq!(*recorder.actions.lock().unwrap(), vec![Action::VolumeUp]);
        assert!(sink.snapshot().gesture.is_some());
        assert!(sink.snapshot().health.is_some());
    }

    #[test]
    fn test_gesture_pass_throttled() {
        let inference = Scripted {
            hands: VecDeque::from(vec![Some(hand(category::THUMB_UP, 0.4)); 3]),
            ..Default::default()
        };
        let (mut p, _, _) = processor(demo_config(), inference);
        let t0 = Instant::now();

        assert!(p.process_frame(&frame(), t0).gesture.is_some());
        let second = p.process_frame(&frame(), t0 + ms(50));
        assert!(second.gesture.is_none());
        assert!(second.health.is_some());
        assert!(p.process_frame(&frame(), t0 + ms(100)).gesture.is_some());
    }

    #[test]
    fn test_sleeping_events_not_dispatched() {
        let inference = Scripted {
            hands: VecDeque::from(vec![Some(hand(category::THUMB_UP, 0.4))]),
            ..Default::default()
        };
        let (mut p, recorder, _) = processor(PipelineConfig::default(), inference);

        let outcome = p.process_frame(&frame(), Instant::now());
        assert_eq!(outcome.gesture.unwrap().category, category::SLEEPING);
        assert_eq!(outcome.action, None);
        assert!(recorder.actions.lock().unwrap().is_empty());
    }

    #[test]
    fn test_inference_failure_still_emits_event() {
        let inference = Scripted {
            fail_hand: true,
            ..Default::default()
        };
        let (mut p, _, _) = processor(demo_config(), inference);

        let event = p.process_frame(&frame(), Instant::now()).gesture.unwrap();
        assert_eq!(event.category, category::NONE);
        assert_eq!(event.position_hint, "No Hand");
    }

    #[test]
    fn test_drowsiness_alert_on_every_evaluation() {
        let inference = Scripted {
            face: Some(face(&[("eyeBlinkLeft", 0.95), ("eyeBlinkRight", 0.95)])),
            ..Default::default()
        };
        let (mut p, recorder, _) = processor(demo_config(), inference);
        let t0 = Instant::now();

        // Mood is evaluated on passes 10, 20 and 30
        for i in 0..30 {
            p.process_frame(&frame(), t0 + ms(i * 100));
        }
        assert_eq!(p.mood(), Mood::DrowsyWarning);
        let alerts = recorder.alerts.lock().unwrap();
        assert_eq!(
            alerts.iter().filter(|a| **a == SafetyAlert::Drowsiness).count(),
            2
        );
    }

    #[test]
    fn test_confusion_alert_on_entry_only() {
        let inference = Scripted {
            face: Some(face(&[("browInnerUp", 0.8)])),
            ..Default::default()
        };
        let (mut p, recorder, _) = processor(demo_config(), inference);
        let t0 = Instant::now();

        for i in 0..40 {
            p.process_frame(&frame(), t0 + ms(i * 100));
        }
        assert_eq!(*recorder.alerts.lock().unwrap(), vec![SafetyAlert::Confusion]);
    }

    #[test]
    fn test_high_stress_latches_calm_mode() {
        let inference = Scripted {
            face: Some(face(&[("browDownLeft", 0.4), ("browDownRight", 0.4)])),
            ..Default::default()
        };
        let (mut p, recorder, _) = processor(demo_config(), inference);
        let t0 = Instant::now();

        for i in 0..20 {
            p.process_frame(&frame(), t0 + ms(i * 100));
        }
        assert_eq!(p.mood(), Mood::Angry);
        assert!(p.calm_mode_active());
        assert_eq!(*recorder.alerts.lock().unwrap(), vec![SafetyAlert::HighStress]);

        p.handle_command(ControlCommand::ResetCalmMode);
        assert!(!p.calm_mode_active());
        let state = p.process_frame(&frame(), t0 + ms(2000)).health.unwrap();
        assert!(state.calm_mode_active);
        assert_eq!(recorder.alerts.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_heartbeat_tracks_frames() {
        let recorder = Arc::new(Recorder::default());
        let heartbeat = Heartbeat::new();
        let mut p = FrameProcessor::new(
            &PipelineConfig::default(),
            Box::new(Scripted::default()),
            CommandDispatcher::new(
                DispatcherConfig::default(),
                Arc::new(MemoryMappingStore::new()),
                recorder,
            ),
            StatusSink::default(),
            heartbeat.clone(),
        );
        let t = Instant::now();
        p.process_frame(&frame(), t);
        assert_eq!(heartbeat.last(), Some(t));
    }
}
