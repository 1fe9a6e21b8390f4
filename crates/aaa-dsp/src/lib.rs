// Signal helpers: FFT sizing, filtering, spectrogram and feature extraction.

pub mod decode;
pub mod error;
pub mod extraction;
pub mod features;
pub mod fft;
pub mod fft_length;
pub mod filter;
pub mod spectrogram;
pub mod window;

pub use error::DspError;
pub use fft_length::best_fft_length;
