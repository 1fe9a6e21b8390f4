use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

/// One labelled event of a catalogue.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Class name.
    pub class: String,
    /// Event duration in seconds.
    pub length: f64,
}

/// Duration statistics of one class.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ClassSummary {
    pub class: String,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation, NaN below two events.
    pub std: f64,
    /// Adjusted Fisher-Pearson skewness, NaN below three events.
    pub skew: f64,
}

/// Per-class duration statistics, classes in order of first appearance.
///
/// # Example
/// ```
/// use aaa_classify::catalog::{summarize_catalog, CatalogEntry};
///
/// let entries = vec![
///     CatalogEntry { class: "VT".into(), length: 10.0 },
///     CatalogEntry { class: "LP".into(), length: 4.0 },
///     CatalogEntry { class: "VT".into(), length: 20.0 },
/// ];
/// let summary = summarize_catalog(&entries);
/// assert_eq!(summary[0].class, "VT");
/// assert_eq!(summary[0].mean, 15.0);
/// assert_eq!(summary[1].count, 1);
/// ```
#[must_use]
pub fn summarize_catalog(entries: &[CatalogEntry]) -> Vec<ClassSummary> {
    let mut groups: Vec<(&str, Vec<f64>)> = Vec::new();
    for entry in entries {
        match groups.iter_mut().find(|(c, _)| *c == entry.class) {
            Some((_, lengths)) => lengths.push(entry.length),
            None => groups.push((&entry.class, vec![entry.length])),
        }
    }
    groups
        .into_iter()
        .map(|(class, lengths)| {
            let (mean, std, skew) = moments(&lengths);
            ClassSummary {
                class: class.to_string(),
                count: lengths.len(),
                mean,
                std,
                skew,
            }
        })
        .collect()
}

/// Mean, sample standard deviation and adjusted skewness.
fn moments(values: &[f64]) -> (f64, f64, f64) {
    let n = values.len() as f64;
    if values.is_empty() {
        return (f64::NAN, f64::NAN, f64::NAN);
    }
    let mean = values.iter().sum::<f64>() / n;
    let m2 = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let m3 = values.iter().map(|v| (v - mean).powi(3)).sum::<f64>() / n;

    let std = if values.len() < 2 {
        f64::NAN
    } else {
        (m2 * n / (n - 1.0)).sqrt()
    };
    let skew = if values.len() < 3 {
        f64::NAN
    } else if m2 <= f64::EPSILON * mean.abs().max(1.0) {
        0.0
    } else {
        (n * (n - 1.0)).sqrt() / (n - 2.0) * m3 / m2.powf(1.5)
    };
    (mean, std, skew)
}

/// Two-decimal value, `nan` for missing statistics.
fn fixed2(v: f64) -> String {
    if v.is_nan() {
        "nan".to_string()
    } else {
        format!("{v:.2}")
    }
}

/// Tab-separated table of [`summarize_catalog`].
#[must_use]
pub fn format_catalog_summary(summary: &[ClassSummary]) -> String {
    let mut out = String::from("Class\t<- length (s) ->\tskew\n     \tmean\tstdev\n");
    for s in summary {
        let _ = writeln!(
            out,
            "{}\t{}\t{}\t\t{}",
            s.class,
            fixed2(s.mean),
            fixed2(s.std),
            fixed2(s.skew)
        );
    }
    out
}
