//! Configuration, shared types and traits for the AAA toolkit.
//!
//! This crate holds everything the DSP, classification and display crates
//! need to agree on: the TOML configuration, the feature extractor seam and
//! the core error type.

pub mod config;
pub mod error;
pub mod traits;

pub use config::{AnalysisConfig, DisplayConfig, FilterConfig, PreprocessingConfig, Scaling};
pub use error::CoreError;
pub use traits::FeatureExtractor;
