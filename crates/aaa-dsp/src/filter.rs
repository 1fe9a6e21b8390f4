//! Butterworth IIR filtering (zero-phase) and windowed-sinc FIR high-pass.
//!
//! Butterworth filters are realised as cascades of second-order sections,
//! each obtained by bilinear transform (with frequency pre-warping) of one
//! conjugate pole pair of the analog prototype. Odd orders add a first-order
//! section.

use std::f64::consts::PI;

use crate::error::DspError;
use crate::window::blackman;

/// Default Butterworth order for band-pass filtering.
pub const DEFAULT_BUTTER_ORDER: usize = 5;

/// Transition band of the FIR high-pass, as a fraction of the sampling rate.
pub const FIR_TRANSITION_BAND: f64 = 0.08;

/// Order used by the anti-aliasing filter of [`decimate`].
const DECIMATE_ORDER: usize = 8;

/// One second-order section, normalised by a0.
///
/// First-order sections have `b2 = a2 = 0`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Biquad {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Pass {
    Low,
    High,
}

impl Biquad {
    fn second_order(pass: Pass, w0: f64, q: f64) -> Self {
        let cos_w = w0.cos();
        let alpha = w0.sin() / (2.0 * q);
        let a0 = 1.0 + alpha;
        let (b0, b1) = match pass {
            Pass::Low => ((1.0 - cos_w) / 2.0, 1.0 - cos_w),
            Pass::High => ((1.0 + cos_w) / 2.0, -(1.0 + cos_w)),
        };
        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b0 / a0,
            a1: -2.0 * cos_w / a0,
            a2: (1.0 - alpha) / a0,
        }
    }

    fn first_order(pass: Pass, w0: f64) -> Self {
        let k = (w0 / 2.0).tan();
        let a1 = (k - 1.0) / (k + 1.0);
        let (b0, b1) = match pass {
            Pass::Low => (k / (1.0 + k), k / (1.0 + k)),
            Pass::High => (1.0 / (1.0 + k), -1.0 / (1.0 + k)),
        };
        Self {
            b0,
            b1,
            b2: 0.0,
            a1,
            a2: 0.0,
        }
    }

    /// Gain of the section at DC.
    fn dc_gain(&self) -> f64 {
        (self.b0 + self.b1 + self.b2) / (1.0 + self.a1 + self.a2)
    }
}

/// Butterworth sections for one pass type at normalised angular cutoff `w0`.
fn butter_sections(pass: Pass, order: usize, w0: f64) -> Vec<Biquad> {
    let mut sections = Vec::with_capacity(order.div_ceil(2));
    for k in 1..=order / 2 {
        // angle of the k-th pole pair from the negative real axis
        let theta = PI * (order + 1 - 2 * k) as f64 / (2 * order) as f64;
        let q = 1.0 / (2.0 * theta.cos());
        sections.push(Biquad::second_order(pass, w0, q));
    }
    if order % 2 == 1 {
        sections.push(Biquad::first_order(pass, w0));
    }
    sections
}

fn check_rate(fs: f64) -> Result<f64, DspError> {
    if !fs.is_finite() || fs <= 0.0 {
        return Err(DspError::InvalidSampleRate(fs));
    }
    Ok(fs / 2.0)
}

fn check_cutoff(cutoff: f64, nyquist: f64, name: &str) -> Result<(), DspError> {
    if !cutoff.is_finite() || cutoff <= 0.0 || cutoff >= nyquist {
        return Err(DspError::InvalidCutoff {
            reason: format!("{name} = {cutoff} Hz hors de ]0, {nyquist}[ Hz"),
        });
    }
    Ok(())
}

/// Design a Butterworth low-pass cascade.
///
/// # Errors
/// Returns an error for `order == 0`, a non-positive rate, or a cutoff
/// outside `(0, fs/2)`.
///
/// # Example
/// ```
/// use aaa_dsp::filter::butter_lowpass;
/// let sos = butter_lowpass(5, 10.0, 100.0).unwrap();
/// assert_eq!(sos.len(), 3);
/// ```
pub fn butter_lowpass(order: usize, cutoff: f64, fs: f64) -> Result<Vec<Biquad>, DspError> {
    if order == 0 {
        return Err(DspError::InvalidOrder(order));
    }
    let nyquist = check_rate(fs)?;
    check_cutoff(cutoff, nyquist, "cutoff")?;
    Ok(butter_sections(Pass::Low, order, 2.0 * PI * cutoff / fs))
}

/// Design a Butterworth band-pass as high-pass(lowcut) ∘ low-pass(highcut).
///
/// # Errors
/// Returns an error for `order == 0`, a non-positive rate, cutoffs outside
/// `(0, fs/2)` or `lowcut >= highcut`.
pub fn butter_bandpass(
    order: usize,
    lowcut: f64,
    highcut: f64,
    fs: f64,
) -> Result<Vec<Biquad>, DspError> {
    if order == 0 {
        return Err(DspError::InvalidOrder(order));
    }
    let nyquist = check_rate(fs)?;
    check_cutoff(lowcut, nyquist, "lowcut")?;
    check_cutoff(highcut, nyquist, "highcut")?;
    if lowcut >= highcut {
        return Err(DspError::InvalidCutoff {
            reason: format!("lowcut ({lowcut} Hz) >= highcut ({highcut} Hz)"),
        });
    }
    let mut sections = butter_sections(Pass::High, order, 2.0 * PI * lowcut / fs);
    sections.extend(butter_sections(Pass::Low, order, 2.0 * PI * highcut / fs));
    Ok(sections)
}

/// Run the cascade over `data` (transposed direct form II), starting from
/// the steady state of a constant input equal to `x0`.
fn sosfilt(sections: &[Biquad], data: &mut [f64], x0: f64) {
    let mut level = x0;
    for s in sections {
        let y0 = s.dc_gain() * level;
        let mut z1 = y0 - s.b0 * level;
        let mut z2 = s.b2 * level - s.a2 * y0;
        for x in data.iter_mut() {
            let u = *x;
            let y = s.b0 * u + z1;
            z1 = s.b1 * u - s.a1 * y + z2;
            z2 = s.b2 * u - s.a2 * y;
            *x = y;
        }
        level = y0;
    }
}

/// Apply a cascade forward then backward (zero phase).
///
/// The signal is extended at both ends by odd reflection of
/// `3 * (2 * n_sections + 1)` samples (clamped to `len - 1`) to limit edge
/// transients.
///
/// # Example
/// ```
/// use aaa_dsp::filter::{butter_lowpass, filtfilt};
/// let sos = butter_lowpass(4, 5.0, 100.0).unwrap();
/// let y = filtfilt(&sos, &vec![2.0; 100]);
/// assert!(y.iter().all(|v| (v - 2.0).abs() < 1e-6));
/// ```
#[must_use]
pub fn filtfilt(sections: &[Biquad], data: &[f64]) -> Vec<f64> {
    let n = data.len();
    if n == 0 || sections.is_empty() {
        return data.to_vec();
    }
    let padlen = (3 * (2 * sections.len() + 1)).min(n - 1);

    let first = data[0];
    let last = data[n - 1];
    let mut ext = Vec::with_capacity(n + 2 * padlen);
    ext.extend((1..=padlen).rev().map(|i| 2.0 * first - data[i]));
    ext.extend_from_slice(data);
    ext.extend((1..=padlen).map(|i| 2.0 * last - data[n - 1 - i]));

    let x0 = ext[0];
    sosfilt(sections, &mut ext, x0);
    ext.reverse();
    let x0 = ext[0];
    sosfilt(sections, &mut ext, x0);
    ext.reverse();

    ext[padlen..padlen + n].to_vec()
}

/// Zero-phase Butterworth band-pass.
///
/// A missing (or zero) cutoff skips filtering and returns the input unchanged.
///
/// # Errors
/// Returns an error if the filter cannot be designed (see [`butter_bandpass`]).
///
/// # Example
/// ```
/// use aaa_dsp::filter::bandpass_filter;
/// let data = vec![1.0, -2.0, 3.0];
/// assert_eq!(bandpass_filter(&data, None, Some(10.0), 100.0, 5).unwrap(), data);
/// ```
pub fn bandpass_filter(
    data: &[f64],
    lowcut: Option<f64>,
    highcut: Option<f64>,
    fs: f64,
    order: usize,
) -> Result<Vec<f64>, DspError> {
    let (Some(lo), Some(hi)) = (
        lowcut.filter(|&f| f != 0.0),
        highcut.filter(|&f| f != 0.0),
    ) else {
        return Ok(data.to_vec());
    };
    let sections = butter_bandpass(order, lo, hi, fs)?;
    Ok(filtfilt(&sections, data))
}

/// [`bandpass_filter`] applied to every row of a batch.
///
/// # Errors
/// Returns an error if the filter cannot be designed.
pub fn bandpass_filter_batch(
    data: &[Vec<f64>],
    lowcut: Option<f64>,
    highcut: Option<f64>,
    fs: f64,
    order: usize,
) -> Result<Vec<Vec<f64>>, DspError> {
    data.iter()
        .map(|row| bandpass_filter(row, lowcut, highcut, fs, order))
        .collect()
}

/// Zero-phase Butterworth low-pass.
///
/// # Errors
/// Returns an error if the filter cannot be designed.
pub fn lowpass_filter(
    data: &[f64],
    cutoff: f64,
    fs: f64,
    order: usize,
) -> Result<Vec<f64>, DspError> {
    let sections = butter_lowpass(order, cutoff, fs)?;
    Ok(filtfilt(&sections, data))
}

/// Low-pass then keep one sample out of `q`. Returns the new signal and rate.
///
/// The anti-aliasing filter is a zero-phase order-8 Butterworth at
/// `0.8 * fs / (2q)`. The returned rate is `fs / q` truncated to an integer.
///
/// # Errors
/// Returns `DspError::InvalidDecimation` if `q == 0`.
///
/// # Example
/// ```
/// use aaa_dsp::filter::decimate;
/// let (y, fs) = decimate(&vec![0.0; 1000], 100.0, 4).unwrap();
/// assert_eq!(y.len(), 250);
/// assert_eq!(fs, 25.0);
/// ```
pub fn decimate(data: &[f64], fs: f64, q: usize) -> Result<(Vec<f64>, f64), DspError> {
    if q == 0 {
        return Err(DspError::InvalidDecimation(q));
    }
    if q == 1 {
        return Ok((data.to_vec(), fs));
    }
    let filtered = lowpass_filter(data, 0.8 * fs / (2.0 * q as f64), fs, DECIMATE_ORDER)?;
    let out = filtered.into_iter().step_by(q).collect();
    Ok((out, (fs / q as f64).trunc()))
}

/// Number of taps of the FIR filters: `ceil(4 / b)` forced odd.
#[must_use]
pub fn fir_taps() -> usize {
    let n = (4.0 / FIR_TRANSITION_BAND).ceil() as usize;
    if n % 2 == 0 { n + 1 } else { n }
}

fn sinc(x: f64) -> f64 {
    if x.abs() < 1e-300 {
        1.0
    } else {
        (PI * x).sin() / (PI * x)
    }
}

/// Blackman-windowed sinc low-pass kernel with unit DC gain.
///
/// `fc` is the cutoff as a fraction of the sampling rate, in (0, 0.5).
///
/// # Errors
/// Returns `DspError::InvalidCutoff` if `fc` is outside (0, 0.5).
pub fn lowpass_fir_kernel(fc: f64) -> Result<Vec<f64>, DspError> {
    if !fc.is_finite() || fc <= 0.0 || fc >= 0.5 {
        return Err(DspError::InvalidCutoff {
            reason: format!("fc = {fc} hors de ]0, 0.5["),
        });
    }
    let n = fir_taps();
    let centre = (n - 1) as f64 / 2.0;
    let w = blackman(n);
    let mut h: Vec<f64> = (0..n)
        .map(|i| sinc(2.0 * fc * (i as f64 - centre)) * w[i])
        .collect();
    let sum: f64 = h.iter().sum();
    for v in &mut h {
        *v /= sum;
    }
    Ok(h)
}

/// High-pass kernel obtained from [`lowpass_fir_kernel`] by spectral inversion.
///
/// # Errors
/// Returns `DspError::InvalidCutoff` if `fc` is outside (0, 0.5).
///
/// # Example
/// ```
/// use aaa_dsp::filter::highpass_fir_kernel;
/// let h = highpass_fir_kernel(0.1).unwrap();
/// assert_eq!(h.len(), 51);
/// assert!(h.iter().sum::<f64>().abs() < 1e-12);
/// ```
pub fn highpass_fir_kernel(fc: f64) -> Result<Vec<f64>, DspError> {
    let mut h = lowpass_fir_kernel(fc)?;
    for v in &mut h {
        *v = -*v;
    }
    let centre = (h.len() - 1) / 2;
    h[centre] += 1.0;
    Ok(h)
}

/// Full discrete convolution (output length `a.len() + b.len() - 1`).
#[must_use]
pub fn convolve(a: &[f64], b: &[f64]) -> Vec<f64> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, &x) in a.iter().enumerate() {
        for (j, &h) in b.iter().enumerate() {
            out[i + j] += x * h;
        }
    }
    out
}

/// High-pass every row of a batch with the windowed-sinc FIR at `lowcut` Hz.
///
/// Each output row is the full convolution, `taps - 1` samples longer than
/// its input.
///
/// # Errors
/// Returns an error if `fs` is not positive or `lowcut` is outside `(0, fs/2)`.
pub fn highpass_fir_batch(
    data: &[Vec<f64>],
    fs: f64,
    lowcut: f64,
) -> Result<Vec<Vec<f64>>, DspError> {
    check_rate(fs)?;
    let h = highpass_fir_kernel(lowcut / fs)?;
    Ok(data.iter().map(|row| convolve(row, &h)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(freq: f64, fs: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| (2.0 * PI * freq * i as f64 / fs).sin())
            .collect()
    }

    fn rms(x: &[f64]) -> f64 {
        (x.iter().map(|v| v * v).sum::<f64>() / x.len() as f64).sqrt()
    }

    /// |H(e^{jw})| of the cascade.
    fn response(sections: &[Biquad], freq: f64, fs: f64) -> f64 {
        let w = 2.0 * PI * freq / fs;
        let (c1, s1) = (w.cos(), -w.sin());
        let (c2, s2) = ((2.0 * w).cos(), -(2.0 * w).sin());
        sections
            .iter()
            .map(|s| {
                let nr = s.b0 + s.b1 * c1 + s.b2 * c2;
                let ni = s.b1 * s1 + s.b2 * s2;
                let dr = 1.0 + s.a1 * c1 + s.a2 * c2;
                let di = s.a1 * s1 + s.a2 * s2;
                ((nr * nr + ni * ni) / (dr * dr + di * di)).sqrt()
            })
            .product()
    }

    #[test]
    fn missing_cutoff_is_identity() {
        let data = tone(3.0, 100.0, 64);
        assert_eq!(bandpass_filter(&data, None, Some(10.0), 100.0, 5).unwrap(), data);
        assert_eq!(bandpass_filter(&data, Some(1.0), None, 100.0, 5).unwrap(), data);
        assert_eq!(bandpass_filter(&data, Some(0.0), Some(10.0), 100.0, 5).unwrap(), data);
    }

    #[test]
    fn lowpass_is_butterworth_at_cutoff() {
        for order in 1..=8 {
            let sos = butter_lowpass(order, 10.0, 100.0).unwrap();
            assert_eq!(sos.len(), order.div_ceil(2));
            let g = response(&sos, 10.0, 100.0);
            assert!((g - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-9, "order {order}: {g}");
            assert!((response(&sos, 0.0, 100.0) - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn bandpass_keeps_band_and_rejects_outside() {
        let fs = 100.0;
        let sos = butter_bandpass(5, 5.0, 15.0, fs).unwrap();
        assert!(response(&sos, 9.0, fs) > 0.95);
        assert!(response(&sos, 0.5, fs) < 1e-3);
        assert!(response(&sos, 40.0, fs) < 1e-3);
    }

    #[test]
    fn bandpass_filter_attenuates_out_of_band_tone() {
        let fs = 100.0;
        let inband = tone(9.0, fs, 2000);
        let outband = tone(40.0, fs, 2000);
        let y_in = bandpass_filter(&inband, Some(5.0), Some(15.0), fs, 5).unwrap();
        let y_out = bandpass_filter(&outband, Some(5.0), Some(15.0), fs, 5).unwrap();
        assert_eq!(y_in.len(), inband.len());
        // interior only, away from edge transients
        assert!(rms(&y_in[200..1800]) > 0.6);
        assert!(rms(&y_out[200..1800]) < 0.01);
    }

    #[test]
    fn bandpass_rejects_inverted_band() {
        assert!(matches!(
            bandpass_filter(&[0.0; 10], Some(20.0), Some(10.0), 100.0, 5),
            Err(DspError::InvalidCutoff { .. })
        ));
        assert!(matches!(
            bandpass_filter(&[0.0; 10], Some(1.0), Some(60.0), 100.0, 5),
            Err(DspError::InvalidCutoff { .. })
        ));
        assert_eq!(
            bandpass_filter(&[0.0; 10], Some(1.0), Some(10.0), 100.0, 0),
            Err(DspError::InvalidOrder(0))
        );
    }

    #[test]
    fn filtfilt_handles_tiny_inputs() {
        let sos = butter_lowpass(2, 10.0, 100.0).unwrap();
        assert!(filtfilt(&sos, &[]).is_empty());
        let one = filtfilt(&sos, &[3.0]);
        assert!((one[0] - 3.0).abs() < 1e-9);
    }

    #[test]
    fn fir_highpass_kernel_shape() {
        assert_eq!(fir_taps(), 51);
        let h = highpass_fir_kernel(0.05).unwrap();
        assert_eq!(h.len(), 51);
        assert!(h.iter().sum::<f64>().abs() < 1e-12);
        for i in 0..25 {
            assert!((h[i] - h[50 - i]).abs() < 1e-12);
        }
    }

    #[test]
    fn fir_batch_output_is_full_convolution() {
        let data = vec![tone(1.0, 100.0, 200), tone(30.0, 100.0, 150)];
        let out = highpass_fir_batch(&data, 100.0, 5.0).unwrap();
        assert_eq!(out[0].len(), 250);
        assert_eq!(out[1].len(), 200);
        // 1 Hz removed, 30 Hz kept
        assert!(rms(&out[0][50..200]) < 0.05);
        assert!(rms(&out[1][50..150]) > 0.6);
    }

    #[test]
    fn convolve_matches_hand_computation() {
        assert_eq!(convolve(&[1.0, 2.0, 3.0], &[0.0, 1.0, 0.5]), vec![0.0, 1.0, 2.5, 4.0, 1.5]);
        assert!(convolve(&[], &[1.0]).is_empty());
    }

    #[test]
    fn decimate_keeps_low_frequency_content() {
        let fs = 200.0;
        let x = tone(2.0, fs, 4000);
        let (y, new_fs) = decimate(&x, fs, 4).unwrap();
        assert!((new_fs - 50.0).abs() < f64::EPSILON);
        assert_eq!(y.len(), 1000);
        assert!((rms(&y[100..900]) - std::f64::consts::FRAC_1_SQRT_2).abs() < 0.02);
        assert_eq!(decimate(&x, fs, 0), Err(DspError::InvalidDecimation(0)));
    }
}
