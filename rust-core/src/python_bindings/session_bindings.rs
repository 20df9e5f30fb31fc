//! Python bindings for analysis sessions

use numpy::{PyArray1, PyReadonlyArray1};
use pyo3::prelude::*;

use super::spectrum_bindings::contiguous;
use crate::session::AnalysisSession;

/// Loaded track plus analyzer, exposed to Python
#[pyclass(name = "AnalysisSession")]
pub struct PyAnalysisSession {
    session: AnalysisSession,
}

#[pymethods]
impl PyAnalysisSession {
    #[new]
    fn new() -> Self {
        Self {
            session: AnalysisSession::default(),
        }
    }

    /// Load a WAV file from bytes
    ///
    /// Returns:
    ///     Duration in milliseconds
    fn load_wav(&mut self, data: &[u8]) -> PyResult<u64> {
        Ok(self.session.load_wav(data)?.duration_ms)
    }

    /// Load interleaved float32 PCM decoded by the host
    fn load_pcm(
        &mut self,
        samples: PyReadonlyArray1<f32>,
        sample_rate: u32,
        channels: u16,
    ) -> PyResult<u64> {
        let info = self
            .session
            .load_pcm(contiguous(&samples)?, sample_rate, channels)?;
        Ok(info.duration_ms)
    }

    /// Spectrum of fft_size frames starting at frame offset
    #[pyo3(signature = (fft_size, offset=0))]
    fn spectrum<'py>(
        &mut self,
        py: Python<'py>,
        fft_size: usize,
        offset: usize,
    ) -> PyResult<&'py PyArray1<f32>> {
        let spectrum = self.session.spectrum_at(offset, fft_size)?;
        Ok(PyArray1::from_slice(py, spectrum))
    }

    /// Amplitude envelope as a float32 array of length resolution
    fn waveform<'py>(&mut self, py: Python<'py>, resolution: usize) -> PyResult<&'py PyArray1<f32>> {
        let points = self.session.waveform(resolution)?;
        let amplitudes: Vec<f32> = points.iter().map(|p| p.amplitude).collect();
        Ok(PyArray1::from_vec(py, amplitudes))
    }

    fn last_transform_duration(&self) -> f64 {
        self.session.last_transform_duration()
    }

    fn sample_count(&self) -> usize {
        self.session.sample_count()
    }

    fn sample_rate(&self) -> u32 {
        self.session.sample_rate()
    }

    fn channels(&self) -> u16 {
        self.session.channels()
    }

    /// Release the loaded track
    fn reset(&mut self) {
        self.session.reset();
    }
}
