use aaa_dsp::DspError;
use thiserror::Error;

/// Errors raised while rendering a spectrogram.
#[derive(Error, Debug)]
pub enum DisplayError {
    /// Spectrogram computation failed.
    #[error(transparent)]
    Dsp(#[from] DspError),

    /// Encoding or writing the image failed.
    #[error("Écriture de l'image impossible : {0}")]
    Image(#[from] image::ImageError),

    /// Zero-sized output image.
    #[error("Taille d'image invalide : {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
}
