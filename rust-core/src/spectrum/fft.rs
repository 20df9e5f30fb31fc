//! Radix-2 decimation-in-time FFT engine
//!
//! Optimized for real-time spectral analysis: all tables are precomputed
//! and the complex frame plus its permutation scratch are reused between
//! transforms, so a steady-state transform performs no allocation.

use std::sync::Arc;

use num_complex::Complex;

use super::tables::TransformConfig;

/// In-place Cooley-Tukey FFT over a reusable complex frame
pub struct FftEngine {
    /// Shared, read-only transform tables
    tables: Arc<TransformConfig>,

    /// Complex frame being transformed
    frame: Vec<Complex<f32>>,

    /// Permutation target, swapped with `frame` after reordering
    scratch: Vec<Complex<f32>>,
}

impl FftEngine {
    /// Create new FFT engine over prebuilt tables
    pub fn new(tables: Arc<TransformConfig>) -> Self {
        let size = tables.size();
        Self {
            tables,
            frame: vec![Complex::new(0.0, 0.0); size],
            scratch: vec![Complex::new(0.0, 0.0); size],
        }
    }

    /// Get FFT size
    pub fn fft_size(&self) -> usize {
        self.tables.size()
    }

    pub fn tables(&self) -> &Arc<TransformConfig> {
        &self.tables
    }

    pub fn frame(&self) -> &[Complex<f32>] {
        &self.frame
    }

    /// Mutable access for loading the next input
    pub fn frame_mut(&mut self) -> &mut [Complex<f32>] {
        &mut self.frame
    }

    /// Transform the loaded frame in place
    pub fn process(&mut self) {
        self.permute();
        self.butterflies();
    }

    /// Reorder the frame so that `frame'[bit_reversal[i]] = frame[i]`
    fn permute(&mut self) {
        for (&value, &target) in self.frame.iter().zip(self.tables.bit_reversal()) {
            self.scratch[target] = value;
        }
        std::mem::swap(&mut self.frame, &mut self.scratch);
    }

    /// log2(N) butterfly stages, span doubling from 2 to N
    fn butterflies(&mut self) {
        let n = self.frame.len();
        let cos = self.tables.twiddle_cos();
        let sin = self.tables.twiddle_sin();

        let mut len = 2;
        while len <= n {
            let half_len = len / 2;
            let twiddle_step = n / len;

            for block in self.frame.chunks_exact_mut(len) {
                let (lower, upper) = block.split_at_mut(half_len);
                for (j, (a, b)) in lower.iter_mut().zip(upper.iter_mut()).enumerate() {
                    let t_idx = j * twiddle_step;
                    let (w_re, w_im) = (cos[t_idx], sin[t_idx]);

                    // t = w * b
                    let t_re = w_re * b.re - w_im * b.im;
                    let t_im = w_re * b.im + w_im * b.re;

                    let (a_re, a_im) = (a.re, a.im);
                    *a = Complex::new(a_re + t_re, a_im + t_im);
                    *b = Complex::new(a_re - t_re, a_im - t_im);
                }
            }

            len *= 2;
        }
    }
}
