use thiserror::Error;

/// Errors originating from the DSP module.
#[derive(Error, Debug, PartialEq)]
pub enum DspError {
    /// A length of zero was given where a sample count is required.
    #[error("Longueur invalide : {0} (attendu >= 1)")]
    InvalidLength(usize),

    /// Sampling rate must be strictly positive and finite.
    #[error("Fréquence d'échantillonnage invalide : {0} Hz")]
    InvalidSampleRate(f64),

    /// Cutoff frequencies outside of (0, fs/2) or not ordered.
    #[error("Fréquence de coupure invalide : {reason}")]
    InvalidCutoff {
        /// Why the cutoff was rejected.
        reason: String,
    },

    /// Filter order must be >= 1.
    #[error("Ordre de filtre invalide : {0}")]
    InvalidOrder(usize),

    /// Decimation factor must be >= 1.
    #[error("Facteur de décimation invalide : {0}")]
    InvalidDecimation(usize),

    /// Signal shorter than the analysis window.
    #[error("Signal trop court : {len} échantillons, {needed} requis")]
    SignalTooShort {
        /// Signal length.
        len: usize,
        /// Minimum length required.
        needed: usize,
    },

    /// Window parameters are inconsistent.
    #[error("Fenêtre invalide : {0}")]
    InvalidWindow(String),

    /// Feature extractor returned a vector of unexpected length.
    #[error("Signal {row} : {got} features, {expected} attendues")]
    FeatureShape {
        /// Index of the offending signal.
        row: usize,
        /// Length of the first feature vector.
        expected: usize,
        /// Length actually returned.
        got: usize,
    },

    /// FFT backend failure.
    #[error("Erreur FFT : {0}")]
    Fft(String),
}
