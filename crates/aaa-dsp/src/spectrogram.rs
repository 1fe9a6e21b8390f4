use aaa_core::config::{DisplayConfig, Scaling};
use realfft::RealFftPlanner;

use crate::error::DspError;
use crate::fft::FftPipeline;
use crate::filter::decimate;
use crate::window::{WindowKind, display_window};

/// Time-frequency power of a signal.
#[derive(Clone, Debug, PartialEq)]
pub struct Spectrogram {
    /// One-sided frequency bins in Hz.
    pub frequencies: Vec<f64>,
    /// Segment centre times in seconds.
    pub times: Vec<f64>,
    /// Power in frequency-major layout `[freq][time]`.
    pub power: Vec<Vec<f64>>,
}

impl Spectrogram {
    /// Power converted to decibels, floored at 1e-20 before the log.
    #[must_use]
    pub fn to_db(&self) -> Vec<Vec<f64>> {
        self.power
            .iter()
            .map(|row| row.iter().map(|p| 10.0 * p.max(1e-20).log10()).collect())
            .collect()
    }

    /// Number of time segments.
    #[must_use]
    pub fn n_times(&self) -> usize {
        self.times.len()
    }
}

/// Segmentation and scaling of a spectrogram computation.
#[derive(Clone, Debug)]
pub struct SpectrogramParams {
    /// Analysis window; its length is the segment length.
    pub window: Vec<f64>,
    /// Samples shared by consecutive segments.
    pub noverlap: usize,
    /// FFT length, >= window length.
    pub nfft: usize,
    /// Density or spectrum scaling.
    pub scaling: Scaling,
}

impl SpectrogramParams {
    /// Resolve display parameters into a window and segmentation.
    ///
    /// Returns `Ok(None)` when the configured window type is not supported.
    ///
    /// # Errors
    /// Returns `DspError::InvalidWindow` if the window cannot be built.
    pub fn from_display(display: &DisplayConfig) -> Result<Option<Self>, DspError> {
        let Some(kind) = WindowKind::parse(&display.window_type) else {
            return Ok(None);
        };
        let window = display_window(kind, display.spectro_window_size, display.kaiser_beta)?;
        Ok(Some(Self {
            window,
            noverlap: display.resolved_noverlap(),
            nfft: display.resolved_nfft(),
            scaling: display.scaling,
        }))
    }
}

/// Spectrogram with constant detrending of each segment and one-sided output.
///
/// # Errors
/// Returns an error if `fs` is not positive, if the window is empty or
/// overlaps itself, if `nfft` is shorter than the window, or if the signal is
/// shorter than one segment.
///
/// # Example
/// ```
/// use aaa_core::config::Scaling;
/// use aaa_dsp::spectrogram::{spectrogram, SpectrogramParams};
///
/// let params = SpectrogramParams { window: vec![1.0; 64], noverlap: 32, nfft: 64, scaling: Scaling::Density };
/// let spec = spectrogram(&vec![0.0; 256], 100.0, &params).unwrap();
/// assert_eq!(spec.frequencies.len(), 33);
/// assert_eq!(spec.times.len(), 7);
/// ```
pub fn spectrogram(
    signal: &[f64],
    fs: f64,
    params: &SpectrogramParams,
) -> Result<Spectrogram, DspError> {
    if !fs.is_finite() || fs <= 0.0 {
        return Err(DspError::InvalidSampleRate(fs));
    }
    let nperseg = params.window.len();
    if nperseg == 0 {
        return Err(DspError::InvalidWindow("fenêtre vide".into()));
    }
    if params.noverlap >= nperseg {
        return Err(DspError::InvalidWindow(format!(
            "noverlap ({}) >= nperseg ({nperseg})",
            params.noverlap
        )));
    }
    if signal.len() < nperseg {
        return Err(DspError::SignalTooShort {
            len: signal.len(),
            needed: nperseg,
        });
    }

    let step = nperseg - params.noverlap;
    let n_segments = (signal.len() - params.noverlap) / step;

    let mut planner = RealFftPlanner::new();
    let mut fft = FftPipeline::with_window(&mut planner, params.nfft, params.window.clone())?;
    let n_bins = fft.n_bins();

    let scale = match params.scaling {
        Scaling::Density => 1.0 / (fs * params.window.iter().map(|w| w * w).sum::<f64>()),
        Scaling::Spectrum => 1.0 / params.window.iter().sum::<f64>().powi(2),
    };
    // Nyquist bin is not doubled for even FFT lengths
    let doubled_end = if params.nfft % 2 == 0 { n_bins - 1 } else { n_bins };

    let mut power = vec![Vec::with_capacity(n_segments); n_bins];
    let mut segment = vec![0.0; nperseg];
    for s in 0..n_segments {
        let start = s * step;
        segment.copy_from_slice(&signal[start..start + nperseg]);
        let mean = segment.iter().sum::<f64>() / nperseg as f64;
        for x in &mut segment {
            *x -= mean;
        }
        let bins = fft.power(&segment)?;
        for (k, p) in bins.into_iter().enumerate() {
            let factor = if k > 0 && k < doubled_end { 2.0 } else { 1.0 };
            power[k].push(p * scale * factor);
        }
    }

    let frequencies = (0..n_bins)
        .map(|k| k as f64 * fs / params.nfft as f64)
        .collect();
    let times = (0..n_segments)
        .map(|s| (nperseg as f64 / 2.0 + (s * step) as f64) / fs)
        .collect();

    Ok(Spectrogram {
        frequencies,
        times,
        power,
    })
}

/// Spectrogram of an observation following the display configuration.
///
/// Applies the configured decimation first. Returns `Ok(None)` when the
/// window type is not supported.
///
/// # Errors
/// Propagates decimation and spectrogram errors.
pub fn display_spectrogram(
    signal: &[f64],
    fs: f64,
    display: &DisplayConfig,
) -> Result<Option<Spectrogram>, DspError> {
    let Some(params) = SpectrogramParams::from_display(display)? else {
        return Ok(None);
    };
    let spec = match display.decimate_factor {
        Some(q) => {
            let (decimated, fs_spectro) = decimate(signal, fs, q)?;
            spectrogram(&decimated, fs_spectro, &params)?
        }
        None => spectrogram(signal, fs, &params)?,
    };
    Ok(Some(spec))
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use super::*;

    fn params(n: usize, scaling: Scaling) -> SpectrogramParams {
        SpectrogramParams {
            window: crate::window::hann(n),
            noverlap: n / 2,
            nfft: n,
            scaling,
        }
    }

    #[test]
    fn tone_peaks_at_its_frequency() {
        let fs = 100.0;
        let signal: Vec<f64> = (0..1000)
            .map(|i| (2.0 * PI * 12.5 * i as f64 / fs).sin())
            .collect();
        let spec = spectrogram(&signal, fs, &params(64, Scaling::Density)).unwrap();
        for t in 0..spec.n_times() {
            let peak = (0..spec.frequencies.len())
                .max_by(|&a, &b| spec.power[a][t].total_cmp(&spec.power[b][t]))
                .unwrap();
            assert!((spec.frequencies[peak] - 12.5).abs() < 1e-9);
        }
    }

    #[test]
    fn spectrum_scaling_recovers_tone_power() {
        // Spectrum scaling: a unit sine on a bin centre gives 0.5 (= A²/2) in that bin.
        let fs = 64.0;
        let signal: Vec<f64> = (0..256)
            .map(|i| (2.0 * PI * 8.0 * i as f64 / fs).sin())
            .collect();
        let spec = spectrogram(&signal, fs, &params(64, Scaling::Spectrum)).unwrap();
        let bin = spec.frequencies.iter().position(|&f| (f - 8.0).abs() < 1e-9).unwrap();
        assert!((spec.power[bin][0] - 0.5).abs() < 1e-9, "{}", spec.power[bin][0]);
    }

    #[test]
    fn constant_signal_is_detrended() {
        let spec = spectrogram(&[3.0; 128], 10.0, &params(32, Scaling::Density)).unwrap();
        assert!(spec.power.iter().flatten().all(|p| p.abs() < 1e-20));
    }

    #[test]
    fn segment_times_are_centred() {
        let spec = spectrogram(&[0.0; 100], 10.0, &params(20, Scaling::Density)).unwrap();
        assert_eq!(spec.times.len(), 9);
        assert!((spec.times[0] - 1.0).abs() < 1e-12);
        assert!((spec.times[1] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn short_signal_is_rejected() {
        assert_eq!(
            spectrogram(&[0.0; 10], 10.0, &params(32, Scaling::Density)),
            Err(DspError::SignalTooShort { len: 10, needed: 32 })
        );
    }

    #[test]
    fn unsupported_window_yields_none() {
        let display = DisplayConfig {
            window_type: "tukey".into(),
            ..DisplayConfig::default()
        };
        assert!(display_spectrogram(&[0.0; 1024], 100.0, &display).unwrap().is_none());
    }

    #[test]
    fn decimation_divides_the_frequency_axis() {
        let display = DisplayConfig {
            decimate_factor: Some(2),
            spectro_window_size: 64,
            ..DisplayConfig::default()
        };
        let spec = display_spectrogram(&vec![0.0; 2048], 100.0, &display)
            .unwrap()
            .unwrap();
        let last = *spec.frequencies.last().unwrap();
        assert!((last - 25.0).abs() < 1e-9);
    }
}
