//! Spectral analysis with a table-driven radix-2 FFT

pub mod analysis;
pub mod error;
pub mod fft;
pub mod kernels;
pub mod tables;
pub mod windowing;

pub use analysis::{AnalyzerConfig, InsufficientSamplesPolicy, SpectrumAnalyzer};
pub use error::SpectrumError;
pub use fft::FftEngine;
pub use kernels::{available_kernels, KernelKind, KernelPreference, KernelSet};
pub use tables::{TransformConfig, MAX_TRANSFORM_SIZE};
pub use windowing::{WindowCoefficients, WindowType};
