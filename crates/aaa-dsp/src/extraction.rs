use aaa_core::config::PreprocessingConfig;
use aaa_core::traits::FeatureExtractor;
use ndarray::{Array2, ArrayView1};

use crate::error::DspError;

/// Signal energy, Σ x².
///
/// # Example
/// ```
/// use aaa_dsp::extraction::energy;
/// assert_eq!(energy(&[1.0, -2.0, 2.0]), 9.0);
/// ```
#[must_use]
pub fn energy(signal: &[f64]) -> f64 {
    signal.iter().map(|x| x * x).sum()
}

/// Scale `signal` to unit energy. Silent signals are returned unchanged.
#[must_use]
pub fn normalize_energy(signal: &[f64]) -> Vec<f64> {
    let e = energy(signal);
    if e <= 0.0 || !e.is_finite() {
        log::debug!("Énergie nulle ou non finie, signal laissé tel quel");
        return signal.to_vec();
    }
    let norm = e.sqrt();
    signal.iter().map(|x| x / norm).collect()
}

/// Extract one feature row per signal and stack them into an
/// `(n_signals, n_features)` matrix.
///
/// With `energy_norm` set, each signal is first divided by the square root
/// of its energy. An empty batch yields a `0 × 0` matrix.
///
/// # Errors
/// Returns `DspError::FeatureShape` if the extractor does not return the
/// same number of features for every signal.
///
/// # Example
/// ```
/// use aaa_core::config::PreprocessingConfig;
/// use aaa_core::traits::FeatureExtractor;
/// use aaa_dsp::extraction::extract_features;
///
/// struct Stats;
/// impl FeatureExtractor for Stats {
///     fn compute(&mut self, s: &[f64], _fs: f64) -> Vec<f64> {
///         vec![s.iter().sum(), s.len() as f64]
///     }
///     fn n_features(&self) -> usize { 2 }
///     fn name(&self) -> &'static str { "stats" }
/// }
///
/// let config = PreprocessingConfig { energy_norm: false };
/// let m = extract_features(&config, &[vec![1.0, 2.0], vec![3.0]], &mut Stats, 10.0).unwrap();
/// assert_eq!(m.shape(), &[2, 2]);
/// assert_eq!(m[[0, 0]], 3.0);
/// assert_eq!(m[[1, 1]], 1.0);
/// ```
pub fn extract_features<E: FeatureExtractor + ?Sized>(
    config: &PreprocessingConfig,
    signals: &[Vec<f64>],
    extractor: &mut E,
    fs: f64,
) -> Result<Array2<f64>, DspError> {
    let mut rows: Vec<Vec<f64>> = Vec::with_capacity(signals.len());
    for (i, signal) in signals.iter().enumerate() {
        let values = if config.energy_norm {
            extractor.compute(&normalize_energy(signal), fs)
        } else {
            extractor.compute(signal, fs)
        };
        if let Some(first) = rows.first() {
            if first.len() != values.len() {
                return Err(DspError::FeatureShape {
                    row: i,
                    expected: first.len(),
                    got: values.len(),
                });
            }
        }
        rows.push(values);
    }

    let n_features = rows.first().map_or(0, Vec::len);
    log::info!(
        "{} : {} signaux, {} features",
        extractor.name(),
        rows.len(),
        n_features
    );

    let mut matrix = Array2::zeros((rows.len(), n_features));
    for (mut dst, src) in matrix.rows_mut().into_iter().zip(&rows) {
        dst.assign(&ArrayView1::from(src.as_slice()));
    }
    Ok(matrix)
}
