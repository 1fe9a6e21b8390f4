use std::f64::consts::PI;

use crate::error::DspError;

/// Window families supported by the spectrogram display.
///
/// # Example
/// ```
/// use aaa_dsp::window::WindowKind;
/// assert_eq!(WindowKind::parse("kaiser"), Some(WindowKind::Kaiser));
/// assert_eq!(WindowKind::parse("tukey"), None);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindowKind {
    /// Kaiser window, shape set by beta.
    Kaiser,
    /// Periodic Hann window.
    Hann,
}

impl WindowKind {
    /// Parse a configuration name (case-insensitive). Unknown names give `None`.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "kaiser" => Some(Self::Kaiser),
            "hann" | "hanning" => Some(Self::Hann),
            _ => None,
        }
    }
}

/// Zeroth-order modified Bessel function of the first kind.
#[must_use]
pub fn bessel_i0(x: f64) -> f64 {
    let half = x / 2.0;
    let mut term = 1.0;
    let mut sum = 1.0;
    for k in 1..500u32 {
        let r = half / f64::from(k);
        term *= r * r;
        sum += term;
        if term < sum * 1e-17 {
            break;
        }
    }
    sum
}

/// Symmetric Kaiser window of `n` points.
///
/// # Example
/// ```
/// use aaa_dsp::window::kaiser;
/// let w = kaiser(9, 18.0);
/// assert!((w[4] - 1.0).abs() < 1e-12);
/// assert!((w[0] - w[8]).abs() < 1e-12);
/// ```
#[must_use]
pub fn kaiser(n: usize, beta: f64) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![1.0],
        _ => {
            let denom = bessel_i0(beta);
            let m = (n - 1) as f64;
            (0..n)
                .map(|i| {
                    let r = 2.0 * i as f64 / m - 1.0;
                    bessel_i0(beta * (1.0 - r * r).max(0.0).sqrt()) / denom
                })
                .collect()
        }
    }
}

/// Periodic Hann window of `n` points.
#[must_use]
pub fn hann(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / n as f64).cos())
        .collect()
}

/// Symmetric Blackman window of `n` points.
#[must_use]
pub fn blackman(n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![1.0],
        _ => {
            let m = (n - 1) as f64;
            (0..n)
                .map(|i| {
                    let x = i as f64 / m;
                    0.42 - 0.5 * (2.0 * PI * x).cos() + 0.08 * (4.0 * PI * x).cos()
                })
                .collect()
        }
    }
}

/// Rescale `w` so that its sum of squares equals its length.
///
/// # Errors
/// Returns `DspError::InvalidWindow` for an empty or all-zero window.
pub fn normalize_power(w: &mut [f64]) -> Result<(), DspError> {
    let power: f64 = w.iter().map(|x| x * x).sum();
    if w.is_empty() || power <= 0.0 {
        return Err(DspError::InvalidWindow("fenêtre nulle".into()));
    }
    let scale = w.len() as f64 / power;
    for x in w.iter_mut() {
        *x *= scale;
    }
    Ok(())
}

/// Build the display window for `kind`.
///
/// The Kaiser window is power-normalised (`Σ w² = n`).
///
/// # Errors
/// Returns `DspError::InvalidWindow` if `n == 0`.
///
/// # Example
/// ```
/// use aaa_dsp::window::{display_window, WindowKind};
/// let w = display_window(WindowKind::Kaiser, 256, 18.0).unwrap();
/// let power: f64 = w.iter().map(|x| x * x).sum();
/// assert!((power - 256.0).abs() < 1e-9);
/// ```
pub fn display_window(kind: WindowKind, n: usize, beta: f64) -> Result<Vec<f64>, DspError> {
    if n == 0 {
        return Err(DspError::InvalidWindow("longueur nulle".into()));
    }
    match kind {
        WindowKind::Kaiser => {
            let mut w = kaiser(n, beta);
            normalize_power(&mut w)?;
            Ok(w)
        }
        WindowKind::Hann => Ok(hann(n)),
    }
}
