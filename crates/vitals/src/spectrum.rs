//! FFT-based heart band analysis

use rustfft::{num_complex::Complex, FftPlanner};

/// Plausible heart-rate band (Hz), 42-180 bpm
#[derive(Debug, Clone, Copy)]
pub struct HeartBand {
    pub low: f64,
    pub high: f64,
}

impl Default for HeartBand {
    fn default() -> Self {
        Self {
            low: 0.7,
            high: 3.0,
        }
    }
}

/// FFT analyzer restricted to the heart band
pub struct SpectralAnalyzer {
    /// FFT planner for efficient computation
    planner: FftPlanner<f64>,
    band: HeartBand,
    /// Sampling frequency (Hz)
    sample_rate: f64,
}

impl SpectralAnalyzer {
    pub fn new(sample_rate: f64) -> Self {
        Self {
            planner: FftPlanner::new(),
            band: HeartBand::default(),
            sample_rate,
        }
    }

    /// Apply Hamming window to reduce spectral leakage
    fn apply_hamming_window(signal: &mut [f64]) {
        let n = signal.len();
        if n < 2 {
            return;
        }
        for (i, v) in signal.iter_mut().enumerate() {
            let window =
                0.54 - 0.46 * (2.0 * std::f64::consts::PI * i as f64 / (n - 1) as f64).cos();
            *v *= window;
        }
    }

    /// Dominant in-band frequency of the mean-removed signal, in beats per minute
    pub fn dominant_bpm(&mut self, signal: &[f32]) -> Option<f32> {
        let n = signal.len();
        if n < 2 {
            return None;
        }

        let mean = signal.iter().map(|&v| f64::from(v)).sum::<f64>() / n as f64;
        let mut windowed: Vec<f64> = signal.iter().map(|&v| f64::from(v) - mean).collect();
        Self::apply_hamming_window(&mut windowed);

        let mut buffer: Vec<Complex<f64>> =
            windowed.iter().map(|&v| Complex::new(v, 0.0)).collect();
        let fft = self.planner.plan_fft_forward(n);
        fft.process(&mut buffer);

        let resolution = self.sample_rate / n as f64;
        let mut best: Option<(usize, f64)> = None;

        for (i, c) in buffer.iter().enumerate().take(n / 2) {
            let freq = i as f64 * resolution;
            if freq < self.band.low || freq > self.band.high {
                continue;
            }
            let power = c.norm_sqr() / n as f64;
            if best.map_or(true, |(_, p)| power > p) {
                best = Some((i, power));
            }
        }

        best.filter(|&(_, p)| p > 0.0)
            .map(|(i, _)| (i as f64 * resolution * 60.0) as f32)
    }
}
