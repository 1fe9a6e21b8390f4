use std::io::Write;
use std::path::{Path, PathBuf};

use aaa_classify::catalog::{CatalogEntry, format_catalog_summary, summarize_catalog};
use aaa_classify::confusion::{CmDisplay, format_confusion_matrix};
use aaa_classify::decision::{decide, probability_matrix};
use aaa_core::config::AnalysisConfig;
use aaa_core::traits::FeatureExtractor;
use aaa_display::{ImageKind, RenderBackend, SpectrogramRenderer};
use aaa_dsp::decode::decode_file;
use aaa_dsp::extraction::extract_features;
use aaa_dsp::features::SpectralFeatures;
use aaa_dsp::filter::{bandpass_filter, highpass_fir_batch};
use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::cli::Command;

/// Samples written by `aaa filter`.
#[derive(Serialize)]
struct FilteredTrace {
    sample_rate: u32,
    samples: Vec<f64>,
}

/// Matrix written by `aaa features`.
#[derive(Serialize)]
struct FeatureTable {
    names: Vec<String>,
    files: Vec<PathBuf>,
    rows: Vec<Vec<f64>>,
}

/// Execute one subcommand, writing its textual output to `out`.
///
/// # Errors
/// Returns an error if an input cannot be read or a computation fails.
#[allow(clippy::too_many_lines)]
pub fn run(command: &Command, config: &AnalysisConfig, out: &mut impl Write) -> Result<()> {
    match command {
        Command::FftLength { n } => {
            writeln!(out, "{}", aaa_dsp::best_fft_length(*n)?)?;
        }
        Command::Classify { probs, threshold } => {
            let rows: Vec<Vec<f64>> = read_json(probs)?;
            let probs = probability_matrix(rows)?;
            let decisions = decide(probs.view(), threshold.as_deref(), threshold.is_some())?;
            for d in &decisions {
                writeln!(out, "{}\t{}", d.class_id(), d.signed_score())?;
            }
        }
        Command::Confusion {
            matrix,
            labels,
            hide_zeroes,
            hide_diagonal,
            hide_threshold,
            max_label_size,
            full_labels,
            float,
        } => {
            let rows: Vec<Vec<f64>> = read_json(matrix)?;
            let cm = probability_matrix(rows)?;
            let display = CmDisplay {
                hide_zeroes: *hide_zeroes,
                hide_diagonal: *hide_diagonal,
                hide_threshold: *hide_threshold,
                max_str_label_size: (!full_labels).then_some(*max_label_size),
                float_display: *float,
            };
            write!(out, "{}", format_confusion_matrix(cm.view(), labels, &display)?)?;
        }
        Command::Catalog { path } => {
            let entries: Vec<CatalogEntry> = read_json(path)?;
            write!(out, "{}", format_catalog_summary(&summarize_catalog(&entries)))?;
        }
        Command::Filter {
            input,
            lowcut,
            highcut,
            order,
            fir,
            out: dest,
        } => {
            let lowcut = lowcut.or(config.filter.lowcut);
            let highcut = highcut.or(config.filter.highcut);
            let (samples, rate) = decode_file(input)?;
            let fs = f64::from(rate);
            let samples = if *fir {
                let lowcut = lowcut.context("--fir requiert une coupure basse")?;
                highpass_fir_batch(&[samples], fs, lowcut)?
                    .pop()
                    .unwrap_or_default()
            } else {
                bandpass_filter(
                    &samples,
                    lowcut,
                    highcut,
                    fs,
                    order.unwrap_or(config.filter.order),
                )?
            };
            let trace = FilteredTrace {
                sample_rate: rate,
                samples,
            };
            write_json(dest, &trace)?;
            writeln!(out, "{}", dest.display())?;
        }
        Command::Features { input, bands } => {
            let mut signals = Vec::with_capacity(input.len());
            let mut rate = None;
            for path in input {
                let (samples, r) = decode_file(path)?;
                match rate {
                    Some(expected) if expected != r => anyhow::bail!(
                        "{} est à {r} Hz, {expected} Hz attendus",
                        path.display()
                    ),
                    _ => rate = Some(r),
                }
                signals.push(samples);
            }
            let fs = f64::from(rate.unwrap_or(1));
            let mut extractor = SpectralFeatures::new(*bands);
            let matrix = extract_features(&config.preprocessing, &signals, &mut extractor, fs)?;
            debug_assert_eq!(matrix.ncols(), extractor.n_features());
            let table = FeatureTable {
                names: extractor.names(),
                files: input.clone(),
                rows: matrix.rows().into_iter().map(|r| r.to_vec()).collect(),
            };
            serde_json::to_writer_pretty(&mut *out, &table)?;
            writeln!(out)?;
        }
        Command::Spectrogram {
            input,
            fmin,
            fmax,
            window_t,
            title,
            out: dest,
            width,
            height,
            bmp,
        } => {
            let (samples, rate) = decode_file(input)?;
            let backend = RenderBackend {
                kind: if *bmp { ImageKind::Bmp } else { ImageKind::Png },
                width: *width,
                height: *height,
            };
            let renderer = SpectrogramRenderer::new(config.display.clone(), backend)?;
            let written = renderer.render_observation(
                &samples,
                *fmin,
                *fmax,
                f64::from(rate),
                *window_t,
                title,
                dest,
            )?;
            if let Some(path) = written {
                writeln!(out, "{}", path.display())?;
            }
        }
    }
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("JSON invalide dans {}", path.display()))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_string(value)?;
    std::fs::write(path, content)
        .with_context(|| format!("Impossible d'écrire {}", path.display()))
}
