//! Window functions for spectral analysis
//!
//! Applies a taper to each analysis frame before the FFT to reduce
//! spectral leakage. Coefficients are precomputed once per frame size.

use std::f64::consts::PI;

use super::error::SpectrumError;

/// Window function types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowType {
    /// Hann window: w[n] = 0.5 * (1 - cos(2πn/(N-1)))
    #[default]
    Hann,

    /// Hamming window: w[n] = 0.54 - 0.46*cos(2πn/(N-1))
    Hamming,

    /// Blackman window: w[n] = 0.42 - 0.5*cos(2πn/(N-1)) + 0.08*cos(4πn/(N-1))
    Blackman,

    /// Rectangular window (no windowing)
    Rectangular,
}

impl WindowType {
    /// Gain of coefficient `n` in a window of `length` samples (length ≥ 2)
    fn coefficient(self, n: usize, length: usize) -> f64 {
        let angle = 2.0 * PI * n as f64 / (length - 1) as f64;
        match self {
            WindowType::Hann => 0.5 * (1.0 - angle.cos()),
            WindowType::Hamming => 0.54 - 0.46 * angle.cos(),
            WindowType::Blackman => 0.42 - 0.5 * angle.cos() + 0.08 * (2.0 * angle).cos(),
            WindowType::Rectangular => 1.0,
        }
    }
}

/// Precomputed window gains for one frame size
#[derive(Debug, Clone, PartialEq)]
pub struct WindowCoefficients {
    window_type: WindowType,
    coefficients: Vec<f32>,
}

impl WindowCoefficients {
    /// Compute `size` coefficients of `window_type`
    ///
    /// # Errors
    /// [`SpectrumError::InvalidConfiguration`] if `size < 2`; the formulas
    /// divide by N-1.
    pub fn new(window_type: WindowType, size: usize) -> Result<Self, SpectrumError> {
        if size < 2 {
            return Err(SpectrumError::invalid(size, "window length must be at least 2"));
        }

        let coefficients = (0..size)
            .map(|n| window_type.coefficient(n, size).clamp(0.0, 1.0) as f32)
            .collect();

        Ok(Self {
            window_type,
            coefficients,
        })
    }

    /// Hann window of `size` samples
    pub fn hann(size: usize) -> Result<Self, SpectrumError> {
        Self::new(WindowType::Hann, size)
    }

    pub fn window_type(&self) -> WindowType {
        self.window_type
    }

    pub fn len(&self) -> usize {
        self.coefficients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.coefficients
    }

    /// Sum of the coefficients
    ///
    /// A DC input of amplitude A lands in bin 0 with magnitude A * sum.
    pub fn sum(&self) -> f64 {
        self.coefficients.iter().map(|&w| w as f64).sum()
    }

    /// Amplitude correction factor N / Σw[n]
    ///
    /// Multiply a magnitude by this to undo the window's attenuation.
    pub fn correction_factor(&self) -> f64 {
        self.len() as f64 / self.sum()
    }
}
