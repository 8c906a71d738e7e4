//! Utility modules for the importer

pub mod error;

pub use error::{BackendError, PipelineError, Result};
