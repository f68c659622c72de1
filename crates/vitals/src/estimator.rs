//! Heart-rate estimation from the green-channel signal

use crate::roi::Roi;
use crate::spectrum::SpectralAnalyzer;
use crate::{HealthState, StressLevel, VitalsConfig};
use dms::Mood;
use ring_buffer::{RingBuffer, Sample};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Resting rate the estimate decays toward on implausible readings
pub const RESTING_BPM: i32 = 72;
/// Plausible estimate range (inclusive)
pub const MIN_BPM: i32 = 50;
pub const MAX_BPM: i32 = 120;
/// Half-swing the AC signal must exceed to count as a crossing
const CROSSING_HYSTERESIS: f32 = 2.0;
/// The full window spans about five seconds
const WINDOW_SECS: f64 = 5.0;

/// Raw BPM estimate from a full signal window.
///
/// Removes the mean, counts sign changes with hysteresis, and scales the
/// cycle count to a per-minute rate.
pub fn estimate_bpm(signal: &[f32]) -> i32 {
    let Some(&first) = signal.first() else {
        return 0;
    };
    let mean = signal.iter().sum::<f32>() / signal.len() as f32;

    let mut positive = first - mean > 0.0;
    let mut crossings = 0u32;
    for &v in signal {
        let ac = v - mean;
        if positive && ac < -CROSSING_HYSTERESIS {
            crossings += 1;
            positive = false;
        } else if !positive && ac > CROSSING_HYSTERESIS {
            crossings += 1;
            positive = true;
        }
    }

    let cycles = f64::from(crossings) / 2.0;
    (cycles * (60.0 / WINDOW_SECS)) as i32
}

/// Blend a new estimate into the running rate
pub fn smooth_bpm(current: i32, estimate: i32) -> i32 {
    if (MIN_BPM..=MAX_BPM).contains(&estimate) {
        (f64::from(current) * 0.7 + f64::from(estimate) * 0.3) as i32
    } else {
        (f64::from(current) * 0.95 + f64::from(RESTING_BPM) * 0.05) as i32
    }
}

/// Stress from rate and mood
pub fn classify_stress(bpm: i32, mood: Mood) -> StressLevel {
    if bpm > 90 || mood.is_negative() {
        StressLevel::High
    } else if bpm > 80 {
        StressLevel::Moderate
    } else {
        StressLevel::Low
    }
}

/// rPPG heart-rate estimator
pub struct HeartRateEstimator {
    config: VitalsConfig,
    signal: RingBuffer<Sample<f32>>,
    current_bpm: i32,
    stress: StressLevel,
    calm_mode: bool,
    spectral_bpm: Option<f32>,
    spectrum: SpectralAnalyzer,
    last_update: Option<Instant>,
}

impl HeartRateEstimator {
    pub fn new(config: VitalsConfig) -> Self {
        Self {
            signal: RingBuffer::new(config.window_size),
            spectrum: SpectralAnalyzer::new(config.sample_rate_hz),
            current_bpm: RESTING_BPM,
            stress: StressLevel::Low,
            calm_mode: false,
            spectral_bpm: None,
            last_update: None,
            config,
        }
    }

    /// Sample one frame. Returns `None` when throttled.
    pub fn process(
        &mut self,
        frame: &stream_capture::VideoFrame,
        face_landmarks: Option<&[(f32, f32)]>,
        mood: Mood,
        now: Instant,
    ) -> Option<HealthState> {
        let interval = Duration::from_millis(self.config.min_interval_ms);
        if let Some(last) = self.last_update {
            if now.saturating_duration_since(last) < interval {
                return None;
            }
        }
        self.last_update = Some(now);

        let roi = Roi::select(frame, face_landmarks);
        let green = roi.average_green(frame);
        self.signal.push(Sample::new(now, green));

        if self.signal.is_full() {
            let window: Vec<f32> = self.signal.iter().map(|s| s.value).collect();
            let estimate = estimate_bpm(&window);
            self.current_bpm = smooth_bpm(self.current_bpm, estimate);
            self.spectral_bpm = self.spectrum.dominant_bpm(&window);
            debug!(
                estimate,
                bpm = self.current_bpm,
                spectral = ?self.spectral_bpm,
                span_secs = self.signal.span_secs(),
                "Heart rate updated"
            );
            metrics::gauge!("vitals_heart_rate_bpm").set(f64::from(self.current_bpm));
        }

        self.stress = classify_stress(self.current_bpm, mood);

        Some(self.state(green))
    }

    fn state(&self, raw_signal: f32) -> HealthState {
        HealthState {
            heart_rate_bpm: self.current_bpm,
            stress_level: self.stress,
            calm_mode_active: self.calm_mode,
            raw_signal,
            spectral_bpm: self.spectral_bpm,
        }
    }

    pub fn calm_mode_active(&self) -> bool {
        self.calm_mode
    }

    /// Latch calm mode after a high-stress action
    pub fn activate_calm_mode(&mut self) {
        if !self.calm_mode {
            info!("Calm mode activated");
            self.calm_mode = true;
        }
    }

    /// External reset of the calm latch
    pub fn reset_calm_mode(&mut self) {
        if self.calm_mode {
            info!("Calm mode reset");
            self.calm_mode = false;
        }
    }
}

impl Default for HeartRateEstimator {
    fn default() -> Self {
        Self::new(VitalsConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stream_capture::VideoFrame;

    fn sine_window(cycles: f64, amplitude: f64) -> Vec<f32> {
        (0..150)
            .map(|i| {
                // Starts at a trough so the first sample sits clearly below the mean
                let phase = 2.0 * std::f64::consts::PI * cycles * i as f64 / 150.0;
                (128.0 - amplitude * phase.cos()) as f32
            })
            .collect()
    }

    #[test]
    fn test_estimate_from_periodic_signal() {
        for cycles in [5.0, 6.0, 7.0, 8.0] {
            let bpm = estimate_bpm(&sine_window(cycles, 10.0));
            let expected = (cycles * 12.0) as i32;
            assert!((bpm - expected).abs() <= 5, "cycles {} -> {}", cycles, bpm);
        }
    }

    #[test]
    fn test_small_ripple_is_ignored() {
        assert_eq!(estimate_bpm(&sine_window(7.0, 1.5)), 0);
    }

    #[test]
    fn test_smoothing_rules() {
        assert_eq!(smooth_bpm(72, 84), 75);
        assert_eq!(smooth_bpm(72, 50), 65);
        // Out of range decays toward resting
        assert_eq!(smooth_bpm(100, 0), 98);
        assert_eq!(smooth_bpm(60, 200), 60);
    }

    #[test]
    fn test_stress_classification() {
        assert_eq!(classify_stress(95, Mood::Neutral), StressLevel::High);
        assert_eq!(classify_stress(70, Mood::Angry), StressLevel::High);
        assert_eq!(classify_stress(70, Mood::Sad), StressLevel::High);
        assert_eq!(classify_stress(85, Mood::Happy), StressLevel::Moderate);
        assert_eq!(classify_stress(80, Mood::Neutral), StressLevel::Low);
    }

    #[test]
    fn test_throttle() {
        let mut estimator = HeartRateEstimator::default();
        let frame = VideoFrame::filled(160, 120, [0, 128, 0]);
        let t0 = Instant::now();

        assert!(estimator.process(&frame, None, Mood::Neutral, t0).is_some());
        assert!(estimator
            .process(&frame, None, Mood::Neutral, t0 + Duration::from_millis(20))
            .is_none());
        assert!(estimator
            .process(&frame, None, Mood::Neutral, t0 + Duration::from_millis(33))
            .is_some());
        let kept: Vec<Instant> = estimator.signal.iter().map(|s| s.timestamp).collect();
        assert_eq!(kept, vec![t0, t0 + Duration::from_millis(33)]);
    }

    #[test]
    fn test_full_window_updates_rate() {
        let mut estimator = HeartRateEstimator::default();
        let t0 = Instant::now();
        let mut last = None;

        for (i, g) in sine_window(7.0, 10.0).into_iter().enumerate() {
            let frame = VideoFrame::filled(160, 120, [0, g as u8, 0]);
            last = estimator.process(
                &frame,
                None,
                Mood::Neutral,
                t0 + Duration::from_millis(34 * i as u64),
            );
            if i < 149 {
                assert_eq!(last.as_ref().unwrap().heart_rate_bpm, RESTING_BPM);
            }
        }

        // 150 samples 34 ms apart
        assert!((estimator.signal.span_secs() - 5.066).abs() < 1e-6);

        let state = last.unwrap();
        assert_eq!(state.heart_rate_bpm, 75);
        assert_eq!(state.stress_level, StressLevel::Low);
        let spectral = state.spectral_bpm.unwrap();
        assert!((spectral - 84.0).abs() < 6.0);
    }

    #[test]
    fn test_calm_latch() {
        let mut estimator = HeartRateEstimator::default();
        estimator.activate_calm_mode();
        estimator.activate_calm_mode();
        assert!(estimator.calm_mode_active());

        let frame = VideoFrame::filled(64, 64, [0, 100, 0]);
        let state = estimator
            .process(&frame, None, Mood::Neutral, Instant::now())
            .unwrap();
        assert!(state.calm_mode_active);

        estimator.reset_calm_mode();
        assert!(!estimator.calm_mode_active());
    }
}
