//! Class decisions, confusion matrices and catalogue statistics.

pub mod catalog;
pub mod confusion;
pub mod decision;
pub mod error;

pub use decision::{Decision, decide};
pub use error::ClassifyError;
