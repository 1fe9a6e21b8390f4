/// Computes a fixed-length feature vector from one signal.
///
/// Implemented by : `SpectralFeatures` (aaa-dsp). The extraction loop calls
/// `compute` once per signal and stacks the results row by row, so every
/// call on the same extractor must return the same number of values.
///
/// # Example
/// ```
/// use aaa_core::traits::FeatureExtractor;
///
/// struct Duration;
/// impl FeatureExtractor for Duration {
///     fn compute(&mut self, signal: &[f64], fs: f64) -> Vec<f64> {
///         vec![signal.len() as f64 / fs]
///     }
///     fn n_features(&self) -> usize { 1 }
///     fn name(&self) -> &'static str { "duration" }
/// }
///
/// let mut ex = Duration;
/// assert_eq!(ex.compute(&[0.0; 200], 100.0), vec![2.0]);
/// ```
pub trait FeatureExtractor {
    /// Compute the features of `signal` sampled at `fs` Hz.
    fn compute(&mut self, signal: &[f64], fs: f64) -> Vec<f64>;

    /// Number of values returned by `compute`.
    fn n_features(&self) -> usize;

    /// Nom lisible pour les logs.
    fn name(&self) -> &'static str;
}
