use aaa_core::traits::FeatureExtractor;
use realfft::RealFftPlanner;

use crate::fft::FftPipeline;
use crate::fft_length::best_fft_length;

/// Number of scalar (non-band) features.
const SCALAR_FEATURES: usize = 6;

/// Spectral features of a whole signal.
///
/// Layout of the feature vector:
/// `[rms, peak, zero_crossing_rate, spectral_centroid, spectral_flatness,
/// spectral_rolloff, band_0 .. band_{n-1}]`, where bands are octaves below
/// Nyquist (band 0 is the highest). The spectrum is computed on the first
/// `best_fft_length(len)` samples.
///
/// # Example
/// ```
/// use aaa_core::traits::FeatureExtractor;
/// use aaa_dsp::features::SpectralFeatures;
///
/// let mut features = SpectralFeatures::new(8);
/// let values = features.compute(&vec![0.0; 1000], 100.0);
/// assert_eq!(values.len(), features.n_features());
/// assert!(values[0].abs() < f64::EPSILON);
/// ```
pub struct SpectralFeatures {
    planner: RealFftPlanner<f64>,
    n_bands: usize,
    /// Fraction of the spectral energy below the rolloff frequency.
    rolloff_fraction: f64,
}

impl SpectralFeatures {
    /// Build an extractor with `n_bands` octave bands.
    #[must_use]
    pub fn new(n_bands: usize) -> Self {
        Self {
            planner: RealFftPlanner::new(),
            n_bands,
            rolloff_fraction: 0.85,
        }
    }

    /// Feature names, aligned with [`FeatureExtractor::compute`].
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = [
            "rms",
            "peak",
            "zero_crossing_rate",
            "spectral_centroid",
            "spectral_flatness",
            "spectral_rolloff",
        ]
        .iter()
        .map(ToString::to_string)
        .collect();
        names.extend((0..self.n_bands).map(|i| format!("band_{i}")));
        names
    }

    fn spectrum(&mut self, signal: &[f64]) -> Vec<f64> {
        let Ok(n) = best_fft_length(signal.len()) else {
            return Vec::new();
        };
        let fft = FftPipeline::with_window(&mut self.planner, n, Vec::new());
        match fft.and_then(|mut fft| fft.magnitude(&signal[..n])) {
            Ok(mag) => mag,
            Err(e) => {
                log::warn!("Spectre indisponible : {e}");
                Vec::new()
            }
        }
    }
}

impl Default for SpectralFeatures {
    fn default() -> Self {
        Self::new(8)
    }
}

impl FeatureExtractor for SpectralFeatures {
    fn compute(&mut self, signal: &[f64], fs: f64) -> Vec<f64> {
        let mut values = vec![0.0; self.n_features()];
        if signal.is_empty() {
            return values;
        }

        // RMS
        let sum_sq: f64 = signal.iter().map(|s| s * s).sum();
        values[0] = (sum_sq / signal.len() as f64).sqrt();

        // Peak
        values[1] = signal.iter().map(|s| s.abs()).fold(0.0f64, f64::max);

        // Zero crossing rate
        if signal.len() > 1 {
            let crossings = signal
                .windows(2)
                .filter(|w| (w[0] >= 0.0) != (w[1] >= 0.0))
                .count();
            values[2] = crossings as f64 / (signal.len() - 1) as f64;
        }

        let spectrum = self.spectrum(signal);
        if spectrum.len() > 1 {
            let nyquist = fs / 2.0;
            let bin_hz = nyquist / (spectrum.len() - 1) as f64;
            let total: f64 = spectrum.iter().sum();

            if total > 1e-12 {
                // Spectral centroid, normalised by Nyquist
                let weighted: f64 = spectrum
                    .iter()
                    .enumerate()
                    .map(|(i, &mag)| i as f64 * bin_hz * mag)
                    .sum();
                values[3] = (weighted / total / nyquist).clamp(0.0, 1.0);

                // Spectral flatness (geometric mean / arithmetic mean)
                let n = spectrum.len() as f64;
                let log_sum: f64 = spectrum.iter().map(|&m| (m + 1e-12).ln()).sum();
                values[4] = ((log_sum / n).exp() / (total / n)).clamp(0.0, 1.0);

                // Rolloff, normalised by Nyquist
                let target = total * self.rolloff_fraction;
                let mut acc = 0.0;
                let idx = spectrum
                    .iter()
                    .position(|&m| {
                        acc += m;
                        acc >= target
                    })
                    .unwrap_or(spectrum.len() - 1);
                values[5] = idx as f64 * bin_hz / nyquist;
            }

            fill_octave_bands(&spectrum, &mut values[SCALAR_FEATURES..]);
        }

        values
    }

    fn n_features(&self) -> usize {
        SCALAR_FEATURES + self.n_bands
    }

    fn name(&self) -> &'static str {
        "spectral"
    }
}

/// Mean magnitude in octave bands below Nyquist: band i covers
/// `[nyq / 2^(i+1), nyq / 2^i]`.
fn fill_octave_bands(spectrum: &[f64], bands: &mut [f64]) {
    let last = spectrum.len() - 1;
    for (i, band) in bands.iter_mut().enumerate() {
        let hi = (last >> i).max(1);
        let lo = (last >> (i + 1)).min(hi - 1);
        let slice = &spectrum[lo..=hi];
        *band = slice.iter().sum::<f64>() / slice.len() as f64;
    }
}
