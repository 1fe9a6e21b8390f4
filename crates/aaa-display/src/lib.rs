//! Spectrogram rendering of observations to raster images.
//!
//! The image backend is chosen when building a [`SpectrogramRenderer`];
//! nothing is configured process-wide.

pub mod colormap;
pub mod error;
pub mod renderer;

pub use error::DisplayError;
pub use renderer::{ImageKind, RenderBackend, SpectrogramRenderer};
