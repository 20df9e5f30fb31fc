//! Error types for spectral analysis

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpectrumError {
    #[error("Invalid transform size {size}: {reason}")]
    InvalidConfiguration { size: usize, reason: &'static str },

    #[error("Insufficient samples for transform: need {required}, got {available}")]
    InsufficientSamples { required: usize, available: usize },
}

impl SpectrumError {
    pub(crate) fn invalid(size: usize, reason: &'static str) -> Self {
        SpectrumError::InvalidConfiguration { size, reason }
    }
}
