//! High-level spectrum analyzer
//!
//! Combines the FFT engine with windowing and magnitude extraction for
//! real-time spectral analysis. One analyzer owns its tables, scratch
//! frame and output spectrum; the spectrum is overwritten by every call.

use std::sync::Arc;
use std::time::Instant;

use super::error::SpectrumError;
use super::fft::FftEngine;
use super::kernels::{KernelKind, KernelPreference, KernelSet};
use super::tables::{validate_size, TransformConfig};
use super::windowing::{WindowCoefficients, WindowType};

/// What `analyze` does when handed fewer samples than the transform size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InsufficientSamplesPolicy {
    /// Return an all-zero spectrum without reading the input
    #[default]
    ZeroFill,
    /// Fail with [`SpectrumError::InsufficientSamples`]
    Reject,
}

/// Spectrum analyzer configuration
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerConfig {
    /// FFT size (number of samples, power of 2)
    pub fft_size: usize,

    /// Window type for spectral analysis
    pub window_type: WindowType,

    /// Sample rate in Hz, used for bin frequencies
    pub sample_rate: f64,

    /// Handling of short input blocks
    pub insufficient_samples: InsufficientSamplesPolicy,

    /// Vectorized or scalar batch kernels
    pub kernel: KernelPreference,

    /// Scale magnitudes by N / Σw so a full-scale tone reads the same
    /// under every window (off: raw DFT magnitudes)
    pub apply_correction: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            fft_size: 2048,
            window_type: WindowType::Hann,
            sample_rate: 44100.0,
            insufficient_samples: InsufficientSamplesPolicy::ZeroFill,
            kernel: KernelPreference::Auto,
            apply_correction: false,
        }
    }
}

/// Real-time spectrum analyzer
pub struct SpectrumAnalyzer {
    config: AnalyzerConfig,
    engine: FftEngine,
    window: Arc<WindowCoefficients>,
    kernels: KernelSet,
    /// Window amplitude correction, 1.0 when disabled
    correction: f32,
    magnitude: Vec<f32>,
    last_transform_ms: f64,
}

impl SpectrumAnalyzer {
    /// Create new spectrum analyzer
    ///
    /// # Errors
    /// [`SpectrumError::InvalidConfiguration`] if `config.fft_size` is not a
    /// supported power of two.
    pub fn new(config: AnalyzerConfig) -> Result<Self, SpectrumError> {
        let tables = Arc::new(TransformConfig::new(config.fft_size)?);
        let window = Arc::new(WindowCoefficients::new(config.window_type, config.fft_size)?);
        let kernels = KernelSet::for_preference(config.kernel);

        log::debug!(
            "Spectrum analyzer created: N={}, window={:?}, kernels={:?}",
            config.fft_size,
            config.window_type,
            kernels.kind()
        );

        Ok(Self::from_parts(config, tables, window, kernels))
    }

    /// Analyzer with default settings and the given transform size
    pub fn with_size(fft_size: usize) -> Result<Self, SpectrumError> {
        Self::new(AnalyzerConfig {
            fft_size,
            ..AnalyzerConfig::default()
        })
    }

    fn from_parts(
        config: AnalyzerConfig,
        tables: Arc<TransformConfig>,
        window: Arc<WindowCoefficients>,
        kernels: KernelSet,
    ) -> Self {
        let bins = tables.size() / 2;
        let correction = correction_for(&config, &window);
        Self {
            config,
            engine: FftEngine::new(tables),
            window,
            kernels,
            correction,
            magnitude: vec![0.0; bins],
            last_transform_ms: 0.0,
        }
    }

    /// New analyzer sharing this one's tables, with its own frame and output
    ///
    /// Lets independent callers (e.g. other threads) analyze concurrently
    /// without rebuilding tables.
    pub fn sibling(&self) -> Self {
        Self::from_parts(
            self.config.clone(),
            Arc::clone(self.engine.tables()),
            Arc::clone(&self.window),
            self.kernels,
        )
    }

    /// Change the transform size
    ///
    /// No-op when `size` is already current. On error the previous
    /// configuration stays in place.
    pub fn configure(&mut self, size: usize) -> Result<(), SpectrumError> {
        if size == self.size() {
            return Ok(());
        }

        let config = AnalyzerConfig {
            fft_size: size,
            ..self.config.clone()
        };
        self.update_config(config)
    }

    /// Update configuration, rebuilding only what changed
    pub fn update_config(&mut self, config: AnalyzerConfig) -> Result<(), SpectrumError> {
        validate_size(config.fft_size)?;

        let resize = config.fft_size != self.config.fft_size;
        let rewindow = resize || config.window_type != self.config.window_type;

        // Build everything fallible before touching current state
        let tables = if resize {
            Some(Arc::new(TransformConfig::new(config.fft_size)?))
        } else {
            None
        };
        let window = if rewindow {
            Some(Arc::new(WindowCoefficients::new(config.window_type, config.fft_size)?))
        } else {
            None
        };

        if let Some(tables) = tables {
            log::debug!("Rebuilt transform tables: N {} -> {}", self.size(), config.fft_size);
            self.engine = FftEngine::new(tables);
            self.magnitude = vec![0.0; config.fft_size / 2];
        }
        if let Some(window) = window {
            self.window = window;
        }
        if config.kernel != self.config.kernel {
            self.kernels = KernelSet::for_preference(config.kernel);
        }
        self.correction = correction_for(&config, &self.window);

        self.config = config;
        Ok(())
    }

    /// Analyze one block and return its magnitude spectrum
    ///
    /// # Arguments
    /// * `samples` - Mono input; the first `size()` samples are used
    ///
    /// # Returns
    /// `size() / 2` magnitudes, bin k at `k * sample_rate / size()` Hz. The
    /// slice borrows the analyzer's buffer and is overwritten by the next call.
    ///
    /// Short input yields all zeros, or an error under
    /// [`InsufficientSamplesPolicy::Reject`].
    pub fn analyze(&mut self, samples: &[f32]) -> Result<&[f32], SpectrumError> {
        let size = self.size();

        if samples.len() < size {
            match self.config.insufficient_samples {
                InsufficientSamplesPolicy::ZeroFill => {
                    log::debug!(
                        "Insufficient samples for N={} transform ({} available), returning zeros",
                        size,
                        samples.len()
                    );
                    self.magnitude.fill(0.0);
                    return Ok(self.magnitude.as_slice());
                }
                InsufficientSamplesPolicy::Reject => {
                    return Err(SpectrumError::InsufficientSamples {
                        required: size,
                        available: samples.len(),
                    });
                }
            }
        }

        self.kernels
            .apply_window(&samples[..size], self.window.as_slice(), self.engine.frame_mut());

        let start = Instant::now();
        self.engine.process();
        self.kernels
            .magnitudes(&self.engine.frame()[..size / 2], &mut self.magnitude);
        self.last_transform_ms = start.elapsed().as_secs_f64() * 1000.0;

        log::trace!("N={} transform took {:.4} ms", size, self.last_transform_ms);

        if self.correction != 1.0 {
            let correction = self.correction;
            self.magnitude.iter_mut().for_each(|m| *m *= correction);
        }

        Ok(self.magnitude.as_slice())
    }

    /// Analyze and return magnitude in dB
    ///
    /// # Arguments
    /// * `samples` - Input signal
    /// * `reference` - Reference level for dB
    pub fn analyze_db(&mut self, samples: &[f32], reference: f32) -> Result<Vec<f32>, SpectrumError> {
        let spectrum = self.analyze(samples)?;
        Ok(spectrum
            .iter()
            .map(|&mag| 20.0 * (mag.max(1e-10) / reference).log10())
            .collect())
    }

    /// Duration of the most recent transform in milliseconds (0.0 before any)
    pub fn last_transform_duration(&self) -> f64 {
        self.last_transform_ms
    }

    /// Most recent spectrum
    pub fn spectrum(&self) -> &[f32] {
        &self.magnitude
    }

    /// Transform size N
    pub fn size(&self) -> usize {
        self.engine.fft_size()
    }

    /// Get number of frequency bins (N/2)
    pub fn num_bins(&self) -> usize {
        self.magnitude.len()
    }

    /// Center frequency of `bin` in Hz
    pub fn bin_frequency_hz(&self, bin: usize) -> f64 {
        bin as f64 * self.config.sample_rate / self.size() as f64
    }

    /// Get frequency bins in Hz
    pub fn frequency_bins_hz(&self) -> Vec<f64> {
        (0..self.num_bins()).map(|bin| self.bin_frequency_hz(bin)).collect()
    }

    /// Get current configuration
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn transform_config(&self) -> &TransformConfig {
        self.engine.tables()
    }

    pub fn window(&self) -> &WindowCoefficients {
        &self.window
    }

    pub fn kernel_kind(&self) -> KernelKind {
        self.kernels.kind()
    }
}

fn correction_for(config: &AnalyzerConfig, window: &WindowCoefficients) -> f32 {
    if config.apply_correction {
        window.correction_factor() as f32
    } else {
        1.0
    }
}
