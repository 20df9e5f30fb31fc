//! Python bindings for spectrum analysis

use numpy::{PyArray1, PyReadonlyArray1};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::spectrum::{
    AnalyzerConfig, InsufficientSamplesPolicy, KernelPreference, SpectrumAnalyzer, WindowType,
};

/// Window type enum exposed to Python
#[pyclass(name = "WindowType")]
#[derive(Clone)]
pub enum PyWindowType {
    Hann,
    Hamming,
    Blackman,
    Rectangular,
}

impl From<PyWindowType> for WindowType {
    fn from(py_win: PyWindowType) -> Self {
        match py_win {
            PyWindowType::Hann => WindowType::Hann,
            PyWindowType::Hamming => WindowType::Hamming,
            PyWindowType::Blackman => WindowType::Blackman,
            PyWindowType::Rectangular => WindowType::Rectangular,
        }
    }
}

/// Borrow a contiguous float32 array as a slice
pub(super) fn contiguous<'a>(array: &'a PyReadonlyArray1<f32>) -> PyResult<&'a [f32]> {
    array
        .as_slice()
        .map_err(|_| PyValueError::new_err("samples must be a contiguous float32 array"))
}

/// Spectrum analyzer exposed to Python
#[pyclass(name = "SpectrumAnalyzer")]
pub struct PySpectrumAnalyzer {
    analyzer: SpectrumAnalyzer,
}

#[pymethods]
impl PySpectrumAnalyzer {
    /// Create a new spectrum analyzer
    ///
    /// Args:
    ///     fft_size: FFT size (power of 2, 2..=65536)
    ///     window_type: Window applied before the transform
    ///     sample_rate: Sample rate in Hz
    ///     strict: Raise on short input instead of returning zeros
    ///     simd: Use vectorized kernels when available
    ///     apply_correction: Compensate window amplitude loss
    #[new]
    #[pyo3(signature = (fft_size=2048, window_type=PyWindowType::Hann, sample_rate=44100.0, strict=false, simd=true, apply_correction=false))]
    fn new(
        fft_size: usize,
        window_type: PyWindowType,
        sample_rate: f64,
        strict: bool,
        simd: bool,
        apply_correction: bool,
    ) -> PyResult<Self> {
        let config = AnalyzerConfig {
            fft_size,
            window_type: window_type.into(),
            sample_rate,
            insufficient_samples: if strict {
                InsufficientSamplesPolicy::Reject
            } else {
                InsufficientSamplesPolicy::ZeroFill
            },
            kernel: if simd {
                KernelPreference::Auto
            } else {
                KernelPreference::Scalar
            },
            apply_correction,
        };

        Ok(Self {
            analyzer: SpectrumAnalyzer::new(config)?,
        })
    }

    /// Analyze samples and return the magnitude spectrum
    ///
    /// Args:
    ///     samples: Mono float32 numpy array
    ///
    /// Returns:
    ///     fft_size / 2 magnitudes as a new numpy array
    fn analyze<'py>(
        &mut self,
        py: Python<'py>,
        samples: PyReadonlyArray1<f32>,
    ) -> PyResult<&'py PyArray1<f32>> {
        let spectrum = self.analyzer.analyze(contiguous(&samples)?)?;
        Ok(PyArray1::from_slice(py, spectrum))
    }

    /// Analyze samples and return magnitude in dB
    #[pyo3(signature = (samples, reference=1.0))]
    fn analyze_db<'py>(
        &mut self,
        py: Python<'py>,
        samples: PyReadonlyArray1<f32>,
        reference: f32,
    ) -> PyResult<&'py PyArray1<f32>> {
        let spectrum = self.analyzer.analyze_db(contiguous(&samples)?, reference)?;
        Ok(PyArray1::from_vec(py, spectrum))
    }

    /// Change the FFT size (no-op if unchanged)
    fn configure(&mut self, fft_size: usize) -> PyResult<()> {
        Ok(self.analyzer.configure(fft_size)?)
    }

    /// Get frequency bins in Hz
    fn frequency_bins_hz<'py>(&self, py: Python<'py>) -> &'py PyArray1<f64> {
        PyArray1::from_vec(py, self.analyzer.frequency_bins_hz())
    }

    /// Duration of the last transform in milliseconds
    fn last_transform_duration(&self) -> f64 {
        self.analyzer.last_transform_duration()
    }

    fn num_bins(&self) -> usize {
        self.analyzer.num_bins()
    }

    fn get_fft_size(&self) -> usize {
        self.analyzer.size()
    }

    fn get_sample_rate(&self) -> f64 {
        self.analyzer.config().sample_rate
    }
}
