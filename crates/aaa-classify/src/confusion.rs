use std::fmt::Write as _;

use ndarray::{Array2, ArrayView2};

use crate::error::ClassifyError;

/// Minimum label column width (length of a printed value).
const MIN_LABEL_WIDTH: usize = 5;

/// Presentation options of [`format_confusion_matrix`].
#[derive(Clone, Debug, PartialEq)]
pub struct CmDisplay {
    /// Blank cells equal to zero.
    pub hide_zeroes: bool,
    /// Blank the diagonal.
    pub hide_diagonal: bool,
    /// Blank cells `<=` this value. `None` or `0.0` disables it.
    pub hide_threshold: Option<f64>,
    /// Column labels are truncated to this many characters.
    /// `None` uses the full label width for every column.
    pub max_str_label_size: Option<usize>,
    /// One decimal instead of none.
    pub float_display: bool,
}

impl Default for CmDisplay {
    fn default() -> Self {
        Self {
            hide_zeroes: false,
            hide_diagonal: false,
            hide_threshold: None,
            max_str_label_size: Some(10),
            float_display: false,
        }
    }
}

/// Render a confusion matrix as a fixed-width text table.
///
/// Rows are true classes, columns predicted classes. Every line ends with
/// a newline.
///
/// # Errors
/// Returns `ClassifyError::Shape` if `cm` is not square or does not have one
/// row per label.
///
/// # Example
/// ```
/// use aaa_classify::confusion::{format_confusion_matrix, CmDisplay};
/// use ndarray::array;
///
/// let cm = array![[1.0, 2.0], [0.0, 3.0]];
/// let labels = ["a".to_string(), "bb".to_string()];
/// let text = format_confusion_matrix(cm.view(), &labels, &CmDisplay::default()).unwrap();
/// assert!(text.starts_with("          Predicted class\n"));
/// ```
pub fn format_confusion_matrix(
    cm: ArrayView2<'_, f64>,
    labels: &[String],
    display: &CmDisplay,
) -> Result<String, ClassifyError> {
    let n = labels.len();
    if cm.nrows() != cm.ncols() || cm.nrows() != n {
        return Err(ClassifyError::Shape(format!(
            "matrice {}x{} pour {n} étiquettes",
            cm.nrows(),
            cm.ncols()
        )));
    }

    let big_width = labels
        .iter()
        .map(|l| l.chars().count())
        .max()
        .unwrap_or(0)
        .max(MIN_LABEL_WIDTH);
    let (width, truncate) = match display.max_str_label_size {
        Some(max) if max > 0 => (max + 3, Some(max)),
        Some(_) => (big_width, Some(0)),
        None => (big_width, None),
    };
    let empty_cell = " ".repeat(width);
    let big_empty = " ".repeat(big_width);
    let threshold = display.hide_threshold.filter(|t| *t != 0.0);

    let mut out = String::new();
    let _ = writeln!(out, "{big_empty}{big_empty}Predicted class");
    let _ = write!(out, "    {big_empty} ");
    for label in labels {
        let shown: String = match truncate {
            Some(max) => label.chars().take(max).collect(),
            None => label.clone(),
        };
        let _ = write!(out, "{shown:>width$} ");
    }
    out.push('\n');

    for (i, label) in labels.iter().enumerate() {
        let _ = write!(out, "    {label:>big_width$} ");
        for j in 0..n {
            let value = cm[[i, j]];
            let hidden = (display.hide_zeroes && value == 0.0)
                || (display.hide_diagonal && i == j)
                || threshold.is_some_and(|t| value <= t);
            if hidden {
                out.push_str(&empty_cell);
            } else if display.float_display {
                let _ = write!(out, "{value:>width$.1}");
            } else {
                let _ = write!(out, "{value:>width$.0}");
            }
            out.push(' ');
        }
        out.push('\n');
    }
    Ok(out)
}

/// Print [`format_confusion_matrix`] to stdout.
///
/// # Errors
/// Same as [`format_confusion_matrix`].
pub fn print_confusion_matrix(
    cm: ArrayView2<'_, f64>,
    labels: &[String],
    display: &CmDisplay,
) -> Result<(), ClassifyError> {
    print!("{}", format_confusion_matrix(cm, labels, display)?);
    Ok(())
}

/// Count `(truth, predicted)` pairs into an `n_classes × n_classes` matrix.
///
/// Rejected predictions (`-1`) are skipped.
///
/// # Errors
/// - `Shape` if the two slices differ in length.
/// - `ClassOutOfRange` for a class id outside `0..n_classes`.
pub fn confusion_matrix(
    truth: &[usize],
    predicted: &[i64],
    n_classes: usize,
) -> Result<Array2<f64>, ClassifyError> {
    if truth.len() != predicted.len() {
        return Err(ClassifyError::Shape(format!(
            "{} vérités pour {} prédictions",
            truth.len(),
            predicted.len()
        )));
    }
    let mut cm = Array2::zeros((n_classes, n_classes));
    let mut skipped = 0usize;
    for (&t, &p) in truth.iter().zip(predicted) {
        if t >= n_classes {
            return Err(ClassifyError::ClassOutOfRange {
                class: t as i64,
                n_classes,
            });
        }
        if p == -1 {
            skipped += 1;
            continue;
        }
        let Ok(p) = usize::try_from(p) else {
            return Err(ClassifyError::ClassOutOfRange {
                class: p,
                n_classes,
            });
        };
        if p >= n_classes {
            return Err(ClassifyError::ClassOutOfRange {
                class: p as i64,
                n_classes,
            });
        }
        cm[[t, p]] += 1.0;
    }
    if skipped > 0 {
        log::debug!("{skipped} prédictions rejetées ignorées");
    }
    Ok(cm)
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn full_width_layout() {
        let cm = array![[1.0, 2.0], [0.0, 3.0]];
        let display = CmDisplay {
            max_str_label_size: None,
            ..CmDisplay::default()
        };
        let text = format_confusion_matrix(cm.view(), &labels(&["a", "bb"]), &display).unwrap();
        assert_eq!(
            text,
            "          Predicted class\n              a    bb \n        a     1     2 \n       bb     0     3 \n"
        );
    }

    #[test]
    fn hidden_cells_are_blank() {
        let cm = array![[1.0, 2.0], [0.0, 3.0]];
        let display = CmDisplay {
            hide_zeroes: true,
            hide_diagonal: true,
            max_str_label_size: None,
            ..CmDisplay::default()
        };
        let text = format_confusion_matrix(cm.view(), &labels(&["a", "bb"]), &display).unwrap();
        assert_eq!(
            text,
            "          Predicted class\n              a    bb \n        a           2 \n       bb             \n"
        );
    }

    #[test]
    fn truncated_labels_and_rates() {
        let cm = array![[0.3, 0.7], [0.12, 0.88]];
        let display = CmDisplay {
            hide_threshold: Some(0.2),
            max_str_label_size: Some(4),
            float_display: true,
            ..CmDisplay::default()
        };
        let text =
            format_confusion_matrix(cm.view(), &labels(&["quake", "explosion"]), &display).unwrap();
        assert_eq!(
            text,
            "                  Predicted class\n                 quak    expl \n        quake     0.3     0.7 \n    explosion             0.9 \n"
        );
    }

    #[test]
    fn zero_threshold_hides_nothing() {
        let cm = array![[0.0]];
        let display = CmDisplay {
            hide_threshold: Some(0.0),
            max_str_label_size: None,
            ..CmDisplay::default()
        };
        let text = format_confusion_matrix(cm.view(), &labels(&["a"]), &display).unwrap();
        assert!(text.ends_with("    0 \n"));
    }

    #[test]
    fn shape_errors() {
        let cm = array![[1.0, 2.0]];
        assert!(matches!(
            format_confusion_matrix(cm.view(), &labels(&["a", "b"]), &CmDisplay::default()),
            Err(ClassifyError::Shape(_))
        ));
        let square = array![[1.0, 2.0], [3.0, 4.0]];
        assert!(matches!(
            format_confusion_matrix(square.view(), &labels(&["a"]), &CmDisplay::default()),
            Err(ClassifyError::Shape(_))
        ));
    }

    #[test]
    fn counts_skip_rejections() {
        let cm = confusion_matrix(&[0, 0, 1, 1], &[0, 1, -1, 1], 2).unwrap();
        assert_eq!(cm, array![[1.0, 1.0], [0.0, 1.0]]);
    }

    #[test]
    fn counts_reject_unknown_classes() {
        assert_eq!(
            confusion_matrix(&[0], &[3], 2),
            Err(ClassifyError::ClassOutOfRange {
                class: 3,
                n_classes: 2
            })
        );
        assert_eq!(
            confusion_matrix(&[0], &[-2], 2),
            Err(ClassifyError::ClassOutOfRange {
                class: -2,
                n_classes: 2
            })
        );
        assert!(matches!(
            confusion_matrix(&[0, 1], &[0], 2),
            Err(ClassifyError::Shape(_))
        ));
    }
}
