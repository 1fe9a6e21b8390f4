use ndarray::{Array2, ArrayView1, ArrayView2};
use serde::Serialize;

use crate::error::ClassifyError;

/// Classifier decision for one sample.
///
/// `class` and `score` always describe the best class. A rejected decision
/// keeps them; [`Decision::class_id`] and [`Decision::signed_score`] give the
/// `-1` / negated-score encoding used in tabular outputs.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Decision {
    /// Index of the highest-scoring class.
    pub class: usize,
    /// Score of that class.
    pub score: f64,
    /// Score fell below the threshold of its class.
    pub rejected: bool,
}

impl Decision {
    /// Class id, `-1` when rejected.
    #[must_use]
    pub fn class_id(&self) -> i64 {
        if self.rejected {
            -1
        } else {
            self.class as i64
        }
    }

    /// Score, negated when rejected.
    #[must_use]
    pub fn signed_score(&self) -> f64 {
        if self.rejected { -self.score } else { self.score }
    }

    /// `Some(class)` for accepted decisions.
    #[must_use]
    pub fn accepted(&self) -> Option<usize> {
        (!self.rejected).then_some(self.class)
    }
}

/// Index and value of the maximum of `row`, first index on ties.
///
/// Returns `None` for an empty row or a row containing NaN.
#[must_use]
pub fn argmax(row: ArrayView1<'_, f64>) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (j, &p) in row.iter().enumerate() {
        if p.is_nan() {
            return None;
        }
        match best {
            Some((_, b)) if p <= b => {}
            _ => best = Some((j, p)),
        }
    }
    best
}

/// Pick the best class of each sample, optionally rejecting weak decisions.
///
/// `probs` has one row per sample and one column per class. With
/// `thresholding` set, a sample whose best score is strictly below
/// `threshold[class]` is rejected. Without it, `threshold` is ignored.
///
/// # Errors
/// - `MissingThreshold` / `ThresholdLength` when thresholding is requested
///   without a usable threshold vector. Checked before any row.
/// - `NoClasses` when `probs` has no column.
/// - `NonFinite` when a row contains NaN.
///
/// # Example
/// ```
/// use aaa_classify::decide;
/// use ndarray::array;
///
/// let probs = array![[0.1, 0.7, 0.2], [0.5, 0.5, 0.0]];
/// let decisions = decide(probs.view(), Some(&[0.6, 0.6, 0.6]), true).unwrap();
/// assert_eq!(decisions[0].class_id(), 1);
/// assert_eq!(decisions[1].class_id(), -1);
/// assert_eq!(decisions[1].signed_score(), -0.5);
/// ```
pub fn decide(
    probs: ArrayView2<'_, f64>,
    threshold: Option<&[f64]>,
    thresholding: bool,
) -> Result<Vec<Decision>, ClassifyError> {
    let n_classes = probs.ncols();
    let threshold = if thresholding {
        let t = threshold.ok_or(ClassifyError::MissingThreshold)?;
        if t.len() != n_classes {
            return Err(ClassifyError::ThresholdLength {
                expected: n_classes,
                got: t.len(),
            });
        }
        Some(t)
    } else {
        None
    };
    if n_classes == 0 {
        return Err(ClassifyError::NoClasses);
    }

    let decisions = probs
        .rows()
        .into_iter()
        .enumerate()
        .map(|(i, row)| {
            let (class, score) = argmax(row).ok_or(ClassifyError::NonFinite { row: i })?;
            let rejected = threshold.is_some_and(|t| score < t[class]);
            Ok(Decision {
                class,
                score,
                rejected,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    log::debug!(
        "{} décisions, {} rejetées",
        decisions.len(),
        rejected_count(&decisions)
    );
    Ok(decisions)
}

/// Class ids with `-1` for rejected samples.
#[must_use]
pub fn class_ids(decisions: &[Decision]) -> Vec<i64> {
    decisions.iter().map(Decision::class_id).collect()
}

/// Scores, negated for rejected samples.
#[must_use]
pub fn signed_scores(decisions: &[Decision]) -> Vec<f64> {
    decisions.iter().map(Decision::signed_score).collect()
}

#[must_use]
pub fn rejected_count(decisions: &[Decision]) -> usize {
    decisions.iter().filter(|d| d.rejected).count()
}

/// Stack rows of scores into a probability matrix.
///
/// # Errors
/// Returns `ClassifyError::Shape` if the rows differ in length.
pub fn probability_matrix(rows: Vec<Vec<f64>>) -> Result<Array2<f64>, ClassifyError> {
    let n_rows = rows.len();
    let n_cols = rows.first().map_or(0, Vec::len);
    if let Some(i) = rows.iter().position(|r| r.len() != n_cols) {
        return Err(ClassifyError::Shape(format!(
            "ligne {i} de longueur {}, {n_cols} attendue",
            rows[i].len()
        )));
    }
    let flat: Vec<f64> = rows.into_iter().flatten().collect();
    Array2::from_shape_vec((n_rows, n_cols), flat).map_err(|e| ClassifyError::Shape(e.to_string()))
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn argmax_without_threshold() {
        let probs = array![[0.1, 0.7, 0.2], [0.5, 0.5, 0.0]];
        let d = decide(probs.view(), None, false).unwrap();
        assert_eq!(class_ids(&d), vec![1, 0]);
        assert_eq!(signed_scores(&d), vec![0.7, 0.5]);
        assert_eq!(rejected_count(&d), 0);
    }

    #[test]
    fn threshold_rejects_weak_rows() {
        let probs = array![[0.1, 0.7, 0.2], [0.5, 0.5, 0.0]];
        let d = decide(probs.view(), Some(&[0.6, 0.6, 0.6]), true).unwrap();
        assert_eq!(class_ids(&d), vec![1, -1]);
        assert_eq!(signed_scores(&d), vec![0.7, -0.5]);
        // the rejected row still remembers its best class
        assert_eq!(d[1].class, 0);
        assert_eq!(d[1].accepted(), None);
    }

    #[test]
    fn score_equal_to_threshold_is_kept() {
        let probs = array![[0.2, 0.8]];
        let d = decide(probs.view(), Some(&[0.0, 0.8]), true).unwrap();
        assert_eq!(d[0].class_id(), 1);
        assert!(!d[0].rejected);
    }

    #[test]
    fn threshold_is_per_class() {
        let probs = array![[0.9, 0.1], [0.3, 0.7]];
        let d = decide(probs.view(), Some(&[0.95, 0.5]), true).unwrap();
        assert_eq!(class_ids(&d), vec![-1, 1]);
    }

    #[test]
    fn ignored_threshold_when_thresholding_is_off() {
        let probs = array![[0.1, 0.9]];
        let d = decide(probs.view(), Some(&[1.0]), false).unwrap();
        assert_eq!(class_ids(&d), vec![1]);
    }

    #[test]
    fn threshold_errors() {
        let probs = array![[0.1, 0.7, 0.2]];
        assert_eq!(
            decide(probs.view(), None, true),
            Err(ClassifyError::MissingThreshold)
        );
        assert_eq!(
            decide(probs.view(), Some(&[0.5, 0.5]), true),
            Err(ClassifyError::ThresholdLength {
                expected: 3,
                got: 2
            })
        );
    }

    #[test]
    fn nan_and_empty_inputs() {
        let probs = array![[0.1, 0.2], [f64::NAN, 0.3]];
        assert_eq!(
            decide(probs.view(), None, false),
            Err(ClassifyError::NonFinite { row: 1 })
        );
        let empty = Array2::<f64>::zeros((2, 0));
        assert_eq!(
            decide(empty.view(), None, false),
            Err(ClassifyError::NoClasses)
        );
        let no_rows = Array2::<f64>::zeros((0, 3));
        assert!(decide(no_rows.view(), None, false).unwrap().is_empty());
    }

    #[test]
    fn matrix_from_rows() {
        let m = probability_matrix(vec![vec![0.1, 0.9], vec![0.4, 0.6]]).unwrap();
        assert_eq!(m, array![[0.1, 0.9], [0.4, 0.6]]);
        assert!(matches!(
            probability_matrix(vec![vec![0.1, 0.9], vec![1.0]]),
            Err(ClassifyError::Shape(_))
        ));
    }

    #[test]
    fn decisions_serialize() {
        let d = Decision {
            class: 2,
            score: 0.5,
            rejected: false,
        };
        let json = serde_json::to_string(&d).unwrap();
        assert_eq!(json, r#"{"class":2,"score":0.5,"rejected":false}"#);
    }
}
