use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Configuration complète de l'analyse.
///
/// Sérialisable en TOML. Chaque champ a une valeur par défaut saine.
///
/// # Example
/// ```
/// use aaa_core::config::AnalysisConfig;
/// let config = AnalysisConfig::default();
/// assert!(config.preprocessing.energy_norm);
/// assert_eq!(config.display.window_type, "kaiser");
/// ```
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct AnalysisConfig {
    /// Preprocessing applied before feature extraction.
    pub preprocessing: PreprocessingConfig,
    /// Band-pass filtering applied upstream of extraction.
    pub filter: FilterConfig,
    /// Spectrogram display parameters.
    pub display: DisplayConfig,
}

/// Preprocessing options.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct PreprocessingConfig {
    /// Divide each signal by the square root of its energy.
    pub energy_norm: bool,
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self { energy_norm: true }
    }
}

/// Butterworth band-pass options. A missing cutoff disables filtering.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct FilterConfig {
    /// Low cutoff in Hz.
    pub lowcut: Option<f64>,
    /// High cutoff in Hz.
    pub highcut: Option<f64>,
    /// Filter order [1, 16].
    pub order: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            lowcut: None,
            highcut: None,
            order: 5,
        }
    }
}

/// Spectral density scaling.
///
/// # Example
/// ```
/// use aaa_core::config::Scaling;
/// assert!(matches!(Scaling::default(), Scaling::Density));
/// ```
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Scaling {
    /// Power spectral density, unit(x)²/Hz.
    #[default]
    Density,
    /// Power spectrum, unit(x)².
    Spectrum,
}

/// Spectrogram display parameters.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct DisplayConfig {
    /// "kaiser" | "hann". Other values are reported and skipped at render time.
    pub window_type: String,
    /// Window length, also used as segment length (nperseg).
    pub spectro_window_size: usize,
    /// Kaiser shape parameter.
    pub kaiser_beta: f64,
    /// Decimation factor applied before the spectrogram. None = no decimation.
    pub decimate_factor: Option<usize>,
    /// Overlap between segments. None = 3/4 of the window.
    pub noverlap: Option<usize>,
    /// FFT length (zero-padded). None = window length.
    pub nfft: Option<usize>,
    /// Density or spectrum scaling.
    pub scaling: Scaling,
    /// Display the power in dB.
    pub db: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            window_type: "kaiser".into(),
            spectro_window_size: 256,
            kaiser_beta: 18.0,
            decimate_factor: None,
            noverlap: None,
            nfft: None,
            scaling: Scaling::Density,
            db: true,
        }
    }
}

impl DisplayConfig {
    /// Segment overlap, resolved against the window length.
    ///
    /// # Example
    /// ```
    /// use aaa_core::config::DisplayConfig;
    /// let display = DisplayConfig::default();
    /// assert_eq!(display.resolved_noverlap(), 192);
    /// ```
    #[must_use]
    pub fn resolved_noverlap(&self) -> usize {
        self.noverlap
            .unwrap_or(self.spectro_window_size * 3 / 4)
            .min(self.spectro_window_size.saturating_sub(1))
    }

    /// FFT length, never shorter than the window.
    #[must_use]
    pub fn resolved_nfft(&self) -> usize {
        self.nfft
            .unwrap_or(self.spectro_window_size)
            .max(self.spectro_window_size)
    }
}

impl AnalysisConfig {
    /// Clamp all numeric fields to their valid ranges.
    /// Called after TOML deserialization to prevent out-of-range values.
    pub fn clamp_all(&mut self) {
        self.filter.order = self.filter.order.clamp(1, 16);
        self.display.spectro_window_size = self.display.spectro_window_size.clamp(8, 65536);
        self.display.kaiser_beta = self.display.kaiser_beta.clamp(0.0, 50.0);
        if let Some(v) = self.display.noverlap {
            self.display.noverlap = Some(v.min(self.display.spectro_window_size - 1));
        }
        if let Some(v) = self.display.nfft {
            self.display.nfft = Some(v.clamp(self.display.spectro_window_size, 1 << 20));
        }
        // Un facteur 1 équivaut à pas de décimation.
        self.display.decimate_factor = self.display.decimate_factor.filter(|&q| q > 1);
    }

    /// Check cross-field constraints that clamping cannot repair.
    ///
    /// # Errors
    /// Returns `CoreError::NegativeCutoff` or `CoreError::EmptyBand` for an
    /// unusable filter band, `CoreError::MissingWindowType` for a blank window.
    ///
    /// # Example
    /// ```
    /// use aaa_core::config::AnalysisConfig;
    /// let mut config = AnalysisConfig::default();
    /// config.filter.lowcut = Some(10.0);
    /// config.filter.highcut = Some(2.0);
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), CoreError> {
        if let (Some(lo), Some(hi)) = (self.filter.lowcut, self.filter.highcut) {
            if lo < 0.0 || hi < 0.0 {
                return Err(CoreError::NegativeCutoff {
                    lowcut: lo,
                    highcut: hi,
                });
            }
            if lo >= hi {
                return Err(CoreError::EmptyBand {
                    lowcut: lo,
                    highcut: hi,
                });
            }
        }
        if self.display.window_type.trim().is_empty() {
            return Err(CoreError::MissingWindowType);
        }
        Ok(())
    }
}

/// Structure TOML intermédiaire pour désérialisation avec valeurs optionnelles.
#[derive(Deserialize)]
struct ConfigFile {
    preprocessing: Option<PreprocessingSection>,
    filter: Option<FilterSection>,
    display: Option<DisplaySection>,
}

#[derive(Deserialize)]
struct PreprocessingSection {
    energy_norm: Option<bool>,
}

#[derive(Deserialize)]
struct FilterSection {
    lowcut: Option<f64>,
    highcut: Option<f64>,
    order: Option<usize>,
}

/// Display section of the TOML config, all fields optional for partial override.
#[derive(Deserialize)]
struct DisplaySection {
    window_type: Option<String>,
    spectro_window_size: Option<usize>,
    kaiser_beta: Option<f64>,
    decimate_factor: Option<usize>,
    noverlap: Option<usize>,
    nfft: Option<usize>,
    scaling: Option<Scaling>,
    db: Option<bool>,
}

/// Parse a TOML document and merge it over the defaults.
///
/// # Errors
/// Returns an error if the document is not valid TOML, or if the merged
/// configuration is inconsistent.
///
/// # Example
/// ```
/// use aaa_core::config::parse_config;
/// let config = parse_config("[filter]\nlowcut = 1.0\nhighcut = 10.0\n").unwrap();
/// assert_eq!(config.filter.highcut, Some(10.0));
/// assert_eq!(config.filter.order, 5);
/// ```
pub fn parse_config(content: &str) -> Result<AnalysisConfig> {
    let file: ConfigFile = toml::from_str(content).context("Erreur de parsing TOML")?;

    let mut config = AnalysisConfig::default();

    if let Some(p) = file.preprocessing {
        if let Some(v) = p.energy_norm {
            config.preprocessing.energy_norm = v;
        }
    }

    if let Some(f) = file.filter {
        if f.lowcut.is_some() {
            config.filter.lowcut = f.lowcut;
        }
        if f.highcut.is_some() {
            config.filter.highcut = f.highcut;
        }
        if let Some(v) = f.order {
            config.filter.order = v;
        }
    }

    if let Some(d) = file.display {
        if let Some(v) = d.window_type {
            config.display.window_type = v;
        }
        if let Some(v) = d.spectro_window_size {
            config.display.spectro_window_size = v;
        }
        if let Some(v) = d.kaiser_beta {
            config.display.kaiser_beta = v;
        }
        if d.decimate_factor.is_some() {
            config.display.decimate_factor = d.decimate_factor;
        }
        if d.noverlap.is_some() {
            config.display.noverlap = d.noverlap;
        }
        if d.nfft.is_some() {
            config.display.nfft = d.nfft;
        }
        if let Some(v) = d.scaling {
            config.display.scaling = v;
        }
        if let Some(v) = d.db {
            config.display.db = v;
        }
    }

    config.clamp_all();
    config.validate()?;
    Ok(config)
}

/// Charge un fichier TOML et fusionne avec les valeurs par défaut.
///
/// # Errors
/// Returns an error if the file does not exist, cannot be read or parsed.
///
/// # Example
/// ```no_run
/// use aaa_core::config::load_config;
/// use std::path::Path;
/// let config = load_config(Path::new("config/default.toml")).unwrap();
/// ```
pub fn load_config(path: &Path) -> Result<AnalysisConfig> {
    if !path.exists() {
        return Err(CoreError::FileNotFound {
            path: path.display().to_string(),
        }
        .into());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;
    let config = parse_config(&content)
        .with_context(|| format!("Configuration invalide dans {}", path.display()))?;
    log::debug!("Configuration chargée depuis {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config, AnalysisConfig::default());
    }

    #[test]
    fn partial_display_section_keeps_other_defaults() {
        let config = parse_config(
            "[display]\nspectro_window_size = 512\nscaling = \"spectrum\"\ndb = false\n",
        )
        .unwrap();
        assert_eq!(config.display.spectro_window_size, 512);
        assert_eq!(config.display.scaling, Scaling::Spectrum);
        assert!(!config.display.db);
        assert_eq!(config.display.window_type, "kaiser");
        assert!((config.display.kaiser_beta - 18.0).abs() < f64::EPSILON);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let config = parse_config(
            "[filter]\norder = 40\n[display]\nspectro_window_size = 64\nnoverlap = 100\nnfft = 16\ndecimate_factor = 1\n",
        )
        .unwrap();
        assert_eq!(config.filter.order, 16);
        assert_eq!(config.display.noverlap, Some(63));
        assert_eq!(config.display.nfft, Some(64));
        assert_eq!(config.display.decimate_factor, None);
    }

    #[test]
    fn inverted_band_is_rejected() {
        let err = parse_config("[filter]\nlowcut = 20.0\nhighcut = 5.0\n");
        assert!(err.is_err());

        let mut config = AnalysisConfig::default();
        config.filter.lowcut = Some(-1.0);
        config.filter.highcut = Some(5.0);
        assert_eq!(
            config.validate(),
            Err(CoreError::NegativeCutoff {
                lowcut: -1.0,
                highcut: 5.0
            })
        );
        config.display.window_type = "  ".into();
        config.filter.lowcut = None;
        assert_eq!(config.validate(), Err(CoreError::MissingWindowType));
    }

    #[test]
    fn load_config_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(&dir.path().join("absent.toml")).unwrap_err();
        assert!(err.downcast_ref::<CoreError>().is_some());
    }

    #[test]
    fn load_config_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aaa.toml");
        std::fs::write(&path, "[preprocessing]\nenergy_norm = false\n").unwrap();
        let config = load_config(&path).unwrap();
        assert!(!config.preprocessing.energy_norm);
    }
}
