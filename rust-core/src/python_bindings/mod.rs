//! PyO3 bindings for Python integration

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::session::SessionError;
use crate::spectrum::SpectrumError;

mod session_bindings;
mod spectrum_bindings;

impl From<SpectrumError> for PyErr {
    fn from(err: SpectrumError) -> Self {
        PyValueError::new_err(err.to_string())
    }
}

impl From<SessionError> for PyErr {
    fn from(err: SessionError) -> Self {
        PyValueError::new_err(err.to_string())
    }
}

/// Python module definition
#[pymodule]
fn spectral_analyzer(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_class::<spectrum_bindings::PySpectrumAnalyzer>()?;
    m.add_class::<spectrum_bindings::PyWindowType>()?;
    m.add_class::<session_bindings::PyAnalysisSession>()?;

    Ok(())
}
