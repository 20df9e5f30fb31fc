//! Spectral Analyzer - Real-Time Audio Spectrum Core
//!
//! Windowed radix-2 FFT with precomputed tables and vectorized magnitude
//! extraction, plus the sample sources and buffers that feed it.

// Suppress PyO3 non-local impl warnings (harmless macro-generated code)
#![cfg_attr(feature = "python", allow(non_local_definitions))]

pub mod audio;
pub mod session;
pub mod spectrum;

#[cfg(feature = "python")]
pub mod python_bindings;

pub use audio::{AudioRingBuffer, SampleSource, StreamProcessor, WaveformSampler};
pub use session::{AnalysisSession, SessionError};
pub use spectrum::{AnalyzerConfig, SpectrumAnalyzer, SpectrumError, WindowType};
