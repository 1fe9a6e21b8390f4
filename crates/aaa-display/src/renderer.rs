use std::path::{Path, PathBuf};

use aaa_core::config::DisplayConfig;
use aaa_dsp::spectrogram::{Spectrogram, display_spectrogram};
use image::{ImageFormat, Rgb, RgbImage};

use crate::colormap::colormap;
use crate::error::DisplayError;

/// Outline width of the observation rectangle, in pixels.
const RECT_LINE_WIDTH: i64 = 5;
const RECT_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Raster format of rendered figures.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ImageKind {
    #[default]
    Png,
    Bmp,
}

impl ImageKind {
    /// File extension appended to the figure path.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Bmp => "bmp",
        }
    }

    fn format(self) -> ImageFormat {
        match self {
            Self::Png => ImageFormat::Png,
            Self::Bmp => ImageFormat::Bmp,
        }
    }
}

/// Output image format and size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderBackend {
    pub kind: ImageKind,
    pub width: u32,
    pub height: u32,
}

impl Default for RenderBackend {
    fn default() -> Self {
        Self {
            kind: ImageKind::Png,
            width: 1500,
            height: 600,
        }
    }
}

/// Draws observation spectrograms with the observation window outlined.
///
/// # Example
/// ```no_run
/// use std::path::Path;
/// use aaa_core::config::DisplayConfig;
/// use aaa_display::{RenderBackend, SpectrogramRenderer};
///
/// let renderer = SpectrogramRenderer::new(DisplayConfig::default(), RenderBackend::default()).unwrap();
/// let signal = vec![0.0; 3000];
/// let written = renderer
///     .render_observation(&signal, 1.0, 10.0, 100.0, 10.0, "event 42", Path::new("figures/event_42"))
///     .unwrap();
/// ```
pub struct SpectrogramRenderer {
    display: DisplayConfig,
    backend: RenderBackend,
}

impl SpectrogramRenderer {
    /// # Errors
    /// Returns `DisplayError::InvalidSize` for a zero-sized backend.
    pub fn new(display: DisplayConfig, backend: RenderBackend) -> Result<Self, DisplayError> {
        if backend.width == 0 || backend.height == 0 {
            return Err(DisplayError::InvalidSize {
                width: backend.width,
                height: backend.height,
            });
        }
        Ok(Self { display, backend })
    }

    #[must_use]
    pub fn backend(&self) -> RenderBackend {
        self.backend
    }

    /// Render the spectrogram of `signal` and outline the observation.
    ///
    /// The observation spans `[window_size_t, 2 * window_size_t]` seconds and
    /// `[f_min, f_max]` Hz. The figure is written to `<path>.<ext>`.
    ///
    /// Returns `Ok(None)` without writing anything when the configured window
    /// type is not supported.
    ///
    /// # Errors
    /// Returns an error if the spectrogram cannot be computed or the image
    /// cannot be written.
    #[allow(clippy::too_many_arguments)]
    pub fn render_observation(
        &self,
        signal: &[f64],
        f_min: f64,
        f_max: f64,
        fs: f64,
        window_size_t: f64,
        title: &str,
        path: &Path,
    ) -> Result<Option<PathBuf>, DisplayError> {
        let Some(spec) = display_spectrogram(signal, fs, &self.display)? else {
            log::warn!(
                "Fenêtre « {} » non supportée, figure ignorée",
                self.display.window_type
            );
            return Ok(None);
        };

        let mut img = self.paint(&spec);
        let axes = Axes {
            duration: signal.len() as f64 / fs,
            f_top: spec.frequencies.last().copied().unwrap_or(0.0),
            width: self.backend.width,
            height: self.backend.height,
        };
        let (x0, x1) = (axes.x(window_size_t), axes.x(2.0 * window_size_t));
        let (y0, y1) = (axes.y(f_max), axes.y(f_min));
        draw_rect_outline(&mut img, (x0, y0), (x1, y1), RECT_LINE_WIDTH, RECT_COLOR);

        let mut out = path.as_os_str().to_owned();
        out.push(".");
        out.push(self.backend.kind.extension());
        let out = PathBuf::from(out);
        img.save_with_format(&out, self.backend.kind.format())?;
        log::info!("{title} : figure écrite dans {}", out.display());
        Ok(Some(out))
    }

    /// Fill the whole image with the colour-mapped spectrogram, low
    /// frequencies at the bottom.
    fn paint(&self, spec: &Spectrogram) -> RgbImage {
        let values = if self.display.db {
            spec.to_db()
        } else {
            spec.power.clone()
        };
        let (lo, hi) = values
            .iter()
            .flatten()
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        let span = if hi > lo { hi - lo } else { 1.0 };

        let (w, h) = (self.backend.width as usize, self.backend.height as usize);
        let n_f = values.len();
        let n_t = spec.n_times();
        RgbImage::from_fn(self.backend.width, self.backend.height, |x, y| {
            if n_f == 0 || n_t == 0 {
                return Rgb(colormap(0.0));
            }
            let col = (x as usize * n_t / w).min(n_t - 1);
            let row = ((h - 1 - y as usize) * n_f / h).min(n_f - 1);
            Rgb(colormap((values[row][col] - lo) / span))
        })
    }
}

/// Data to pixel mapping: time left to right over the signal duration,
/// frequency bottom to top up to the highest bin.
struct Axes {
    duration: f64,
    f_top: f64,
    width: u32,
    height: u32,
}

impl Axes {
    fn x(&self, t: f64) -> i64 {
        if self.duration <= 0.0 {
            return 0;
        }
        (t / self.duration * f64::from(self.width)).floor() as i64
    }

    fn y(&self, f: f64) -> i64 {
        if self.f_top <= 0.0 {
            return i64::from(self.height);
        }
        (f64::from(self.height) * (1.0 - f / self.f_top)).floor() as i64
    }
}

/// Outline the rectangle with corners `a` and `b`, the stroke centred on its
/// edges and clipped to the image.
fn draw_rect_outline(img: &mut RgbImage, a: (i64, i64), b: (i64, i64), line: i64, color: Rgb<u8>) {
    let (x0, x1) = (a.0.min(b.0), a.0.max(b.0));
    let (y0, y1) = (a.1.min(b.1), a.1.max(b.1));
    let half = line / 2;
    let mut fill = |xa: i64, xb: i64, ya: i64, yb: i64| {
        let xa = xa.max(0);
        let ya = ya.max(0);
        let xb = xb.min(i64::from(img.width()) - 1);
        let yb = yb.min(i64::from(img.height()) - 1);
        for y in ya..=yb {
            for x in xa..=xb {
                img.put_pixel(x as u32, y as u32, color);
            }
        }
    };
    fill(x0 - half, x1 + half, y0 - half, y0 + half);
    fill(x0 - half, x1 + half, y1 - half, y1 + half);
    fill(x0 - half, x0 + half, y0 - half, y1 + half);
    fill(x1 - half, x1 + half, y0 - half, y1 + half);
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use super::*;

    fn tone(n: usize, fs: f64, f: f64) -> Vec<f64> {
        (0..n)
            .map(|i| (2.0 * PI * f * i as f64 / fs).sin())
            .collect()
    }

    fn small_backend(kind: ImageKind) -> RenderBackend {
        RenderBackend {
            kind,
            width: 200,
            height: 100,
        }
    }

    #[test]
    fn writes_png_with_observation_box() {
        let dir = tempfile::tempdir().unwrap();
        let renderer =
            SpectrogramRenderer::new(DisplayConfig::default(), small_backend(ImageKind::Png))
                .unwrap();
        let signal = tone(4096, 1000.0, 100.0);
        let out = renderer
            .render_observation(&signal, 50.0, 150.0, 1000.0, 1.0, "test", &dir.path().join("obs"))
            .unwrap()
            .unwrap();
        assert_eq!(out, dir.path().join("obs.png"));

        let img = image::open(&out).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (200, 100));
        // left edge of the box: t = 1 s over 4.096 s, between 50 and 150 Hz
        assert_eq!(*img.get_pixel(48, 80), RECT_COLOR);
        assert_ne!(*img.get_pixel(10, 10), RECT_COLOR);
    }

    #[test]
    fn bmp_backend_uses_its_extension() {
        let dir = tempfile::tempdir().unwrap();
        let renderer =
            SpectrogramRenderer::new(DisplayConfig::default(), small_backend(ImageKind::Bmp))
                .unwrap();
        let out = renderer
            .render_observation(&tone(2048, 500.0, 60.0), 10.0, 100.0, 500.0, 1.0, "bmp", &dir.path().join("fig.v1"))
            .unwrap()
            .unwrap();
        assert_eq!(out, dir.path().join("fig.v1.bmp"));
        assert!(out.exists());
    }

    #[test]
    fn unsupported_window_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let display = DisplayConfig {
            window_type: "tukey".into(),
            ..DisplayConfig::default()
        };
        let renderer = SpectrogramRenderer::new(display, small_backend(ImageKind::Png)).unwrap();
        let out = renderer
            .render_observation(&tone(4096, 1000.0, 100.0), 50.0, 150.0, 1000.0, 1.0, "x", &dir.path().join("none"))
            .unwrap();
        assert!(out.is_none());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn zero_sized_backend_is_rejected() {
        let backend = RenderBackend {
            width: 0,
            ..RenderBackend::default()
        };
        assert!(matches!(
            SpectrogramRenderer::new(DisplayConfig::default(), backend),
            Err(DisplayError::InvalidSize { .. })
        ));
    }

    #[test]
    fn tone_is_brightest_at_its_frequency() {
        let renderer = SpectrogramRenderer::new(
            DisplayConfig::default(),
            RenderBackend {
                kind: ImageKind::Png,
                width: 50,
                height: 200,
            },
        )
        .unwrap();
        let spec = display_spectrogram(&tone(4096, 1000.0, 250.0), 1000.0, &DisplayConfig::default())
            .unwrap()
            .unwrap();
        let img = renderer.paint(&spec);
        let brightest = (0..200)
            .max_by_key(|&y| {
                let p = img.get_pixel(25, y);
                u32::from(p[0]) + u32::from(p[1])
            })
            .unwrap();
        // 250 Hz is half of the 500 Hz axis
        assert!((95..=105).contains(&brightest), "{brightest}");
    }
}
