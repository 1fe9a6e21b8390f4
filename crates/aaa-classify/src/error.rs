use thiserror::Error;

/// Errors originating from the classification helpers.
#[derive(Error, Debug, PartialEq)]
pub enum ClassifyError {
    /// Thresholding was requested without a threshold vector.
    #[error("Seuillage demandé sans vecteur de seuils")]
    MissingThreshold,

    /// Threshold vector length differs from the number of classes.
    #[error("Vecteur de seuils de longueur {got}, {expected} classes attendues")]
    ThresholdLength {
        /// Number of classes.
        expected: usize,
        /// Length of the threshold vector.
        got: usize,
    },

    /// The probability matrix has no class column.
    #[error("Matrice de probabilités sans classe")]
    NoClasses,

    /// A row contains NaN.
    #[error("Score non fini à la ligne {row}")]
    NonFinite {
        /// Offending sample.
        row: usize,
    },

    /// Rows of unequal length, or matrix and labels that do not agree.
    #[error("Dimensions incohérentes : {0}")]
    Shape(String),

    /// Class id outside `0..n_classes`.
    #[error("Classe {class} hors de 0..{n_classes}")]
    ClassOutOfRange {
        /// Offending class id.
        class: i64,
        /// Number of classes.
        n_classes: usize,
    },
}
