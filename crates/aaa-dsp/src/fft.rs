use std::sync::Arc;

use realfft::num_complex::Complex;
use realfft::{RealFftPlanner, RealToComplex};

use crate::error::DspError;

/// Windowed real FFT using realfft.
///
/// Pre-allocates the FFT plan and scratch buffers; calls to [`FftPipeline::power`]
/// do not reallocate the work buffers. Inputs shorter than the FFT size are
/// zero-padded.
///
/// # Example
/// ```
/// use aaa_dsp::fft::FftPipeline;
/// let fft = FftPipeline::new(2048).unwrap();
/// assert_eq!(fft.n_bins(), 1025);
/// ```
pub struct FftPipeline {
    fft_size: usize,
    input_buf: Vec<f64>,
    spectrum_buf: Vec<Complex<f64>>,
    scratch: Vec<Complex<f64>>,
    plan: Arc<dyn RealToComplex<f64>>,
    /// Window applied to the leading samples. Empty = rectangular.
    window: Vec<f64>,
}

impl FftPipeline {
    /// Create a pipeline with a symmetric Hann window spanning the whole FFT.
    ///
    /// # Errors
    /// Returns `DspError::InvalidLength` if `size` is 0.
    pub fn new(size: usize) -> Result<Self, DspError> {
        if size == 0 {
            return Err(DspError::InvalidLength(size));
        }
        let window: Vec<f64> = if size == 1 {
            vec![1.0]
        } else {
            (0..size)
                .map(|i| {
                    0.5 * (1.0
                        - (2.0 * std::f64::consts::PI * i as f64 / (size as f64 - 1.0)).cos())
                })
                .collect()
        };
        Self::with_window(&mut RealFftPlanner::new(), size, window)
    }

    /// Create a pipeline from an existing planner with a custom window.
    ///
    /// The window may be shorter than `size`: samples past the window are
    /// zero-padded. An empty window means no windowing.
    ///
    /// # Errors
    /// Returns `DspError::InvalidLength` if `size` is 0, or
    /// `DspError::InvalidWindow` if the window is longer than `size`.
    pub fn with_window(
        planner: &mut RealFftPlanner<f64>,
        size: usize,
        window: Vec<f64>,
    ) -> Result<Self, DspError> {
        if size == 0 {
            return Err(DspError::InvalidLength(size));
        }
        if window.len() > size {
            return Err(DspError::InvalidWindow(format!(
                "fenêtre de {} points pour une FFT de {size}",
                window.len()
            )));
        }

        let plan = planner.plan_fft_forward(size);
        let input_buf = plan.make_input_vec();
        let spectrum_buf = plan.make_output_vec();
        let scratch = plan.make_scratch_vec();

        Ok(Self {
            fft_size: size,
            input_buf,
            spectrum_buf,
            scratch,
            plan,
            window,
        })
    }

    /// Run the windowed FFT and return the raw complex spectrum (N/2+1 bins).
    ///
    /// # Errors
    /// Returns `DspError::Fft` if the backend rejects the buffers.
    pub fn process(&mut self, samples: &[f64]) -> Result<&[Complex<f64>], DspError> {
        let n = self.fft_size.min(samples.len());

        // Copy, window, zero-pad
        for (i, slot) in self.input_buf.iter_mut().enumerate() {
            *slot = if i < n {
                let w = if self.window.is_empty() {
                    1.0
                } else {
                    self.window.get(i).copied().unwrap_or(0.0)
                };
                samples[i] * w
            } else {
                0.0
            };
        }

        self.plan
            .process_with_scratch(
                &mut self.input_buf,
                &mut self.spectrum_buf,
                &mut self.scratch,
            )
            .map_err(|e| DspError::Fft(e.to_string()))?;

        Ok(&self.spectrum_buf)
    }

    /// Squared magnitude |X(k)|² of each bin, unscaled.
    ///
    /// # Errors
    /// Returns `DspError::Fft` if the backend rejects the buffers.
    ///
    /// # Example
    /// ```
    /// use aaa_dsp::fft::FftPipeline;
    /// let mut fft = FftPipeline::new(256).unwrap();
    /// let power = fft.power(&vec![0.0; 256]).unwrap();
    /// assert_eq!(power.len(), 129); // N/2 + 1
    /// assert!(power.iter().all(|p| *p == 0.0));
    /// ```
    pub fn power(&mut self, samples: &[f64]) -> Result<Vec<f64>, DspError> {
        Ok(self.process(samples)?.iter().map(Complex::norm_sqr).collect())
    }

    /// Magnitude normalised by the FFT size.
    ///
    /// # Errors
    /// Returns `DspError::Fft` if the backend rejects the buffers.
    pub fn magnitude(&mut self, samples: &[f64]) -> Result<Vec<f64>, DspError> {
        let size = self.fft_size as f64;
        Ok(self
            .process(samples)?
            .iter()
            .map(|c| c.norm() / size)
            .collect())
    }

    /// FFT window size.
    #[must_use]
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Number of one-sided frequency bins.
    #[must_use]
    pub fn n_bins(&self) -> usize {
        self.fft_size / 2 + 1
    }
}
