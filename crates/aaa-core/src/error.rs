use thiserror::Error;

/// Errors raised while loading or validating the analysis configuration.
#[derive(Error, Debug, PartialEq)]
pub enum CoreError {
    /// `[filter]` cutoffs below zero.
    #[error("Fréquences de coupure négatives ({lowcut} Hz, {highcut} Hz)")]
    NegativeCutoff { lowcut: f64, highcut: f64 },

    /// `[filter]` band with `lowcut >= highcut`.
    #[error("lowcut ({lowcut} Hz) doit être inférieur à highcut ({highcut} Hz)")]
    EmptyBand { lowcut: f64, highcut: f64 },

    /// `[display] window_type` left blank.
    #[error("window_type vide")]
    MissingWindowType,

    /// Configuration file does not exist.
    #[error("Fichier introuvable : {path}")]
    FileNotFound {
        /// Path that was not found.
        path: String,
    },
}
