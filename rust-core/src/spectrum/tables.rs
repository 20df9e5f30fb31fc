//! Precomputed transform tables for the radix-2 FFT
//!
//! Holds the bit-reversal permutation and the forward twiddle factors
//! W_N^k = e^(-2πik/N) for one transform size. Tables are immutable once
//! built; a size change builds a fresh set.

use std::f64::consts::PI;

use super::error::SpectrumError;

/// Largest transform size accepted by the table builder
pub const MAX_TRANSFORM_SIZE: usize = 1 << 16;

/// Bit-reversal and twiddle tables for a power-of-two transform size
#[derive(Debug, Clone, PartialEq)]
pub struct TransformConfig {
    size: usize,
    log2_size: u32,
    bit_reversal: Vec<usize>,
    twiddle_cos: Vec<f32>,
    twiddle_sin: Vec<f32>,
}

impl TransformConfig {
    /// Build tables for `size`
    ///
    /// # Arguments
    /// * `size` - Transform size N (power of two, 2 ≤ N ≤ [`MAX_TRANSFORM_SIZE`])
    ///
    /// # Errors
    /// [`SpectrumError::InvalidConfiguration`] for any other size.
    pub fn new(size: usize) -> Result<Self, SpectrumError> {
        validate_size(size)?;

        let log2_size = size.trailing_zeros();
        let bit_reversal = (0..size).map(|i| reverse_bits(i, log2_size)).collect();

        // Computed in f64 and narrowed so every rebuild is bit-identical
        let half = size / 2;
        let mut twiddle_cos = Vec::with_capacity(half);
        let mut twiddle_sin = Vec::with_capacity(half);
        for k in 0..half {
            let angle = -2.0 * PI * k as f64 / size as f64;
            twiddle_cos.push(angle.cos() as f32);
            twiddle_sin.push(angle.sin() as f32);
        }

        Ok(Self {
            size,
            log2_size,
            bit_reversal,
            twiddle_cos,
            twiddle_sin,
        })
    }

    /// Transform size N
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of butterfly stages, log2(N)
    pub fn log2_size(&self) -> u32 {
        self.log2_size
    }

    /// Permuted position of each input index
    pub fn bit_reversal(&self) -> &[usize] {
        &self.bit_reversal
    }

    /// Real parts of the twiddle factors, k in [0, N/2)
    pub fn twiddle_cos(&self) -> &[f32] {
        &self.twiddle_cos
    }

    /// Imaginary parts of the twiddle factors, k in [0, N/2)
    pub fn twiddle_sin(&self) -> &[f32] {
        &self.twiddle_sin
    }
}

/// Check that `size` is a supported power of two
pub(crate) fn validate_size(size: usize) -> Result<(), SpectrumError> {
    if size < 2 {
        return Err(SpectrumError::invalid(size, "transform size must be at least 2"));
    }
    if !size.is_power_of_two() {
        return Err(SpectrumError::invalid(size, "transform size must be a power of two"));
    }
    if size > MAX_TRANSFORM_SIZE {
        return Err(SpectrumError::invalid(size, "transform size exceeds the supported maximum"));
    }
    Ok(())
}

/// Reverse the low `bits` bits of `index`
fn reverse_bits(index: usize, bits: u32) -> usize {
    let mut remaining = index;
    let mut reversed = 0;
    for _ in 0..bits {
        reversed = (reversed << 1) | (remaining & 1);
        remaining >>= 1;
    }
    reversed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_reversal_size_8() {
        let tables = TransformConfig::new(8).unwrap();
        assert_eq!(tables.bit_reversal(), &[0, 4, 2, 6, 1, 5, 3, 7]);
        assert_eq!(tables.log2_size(), 3);
    }

    #[test]
    fn test_bit_reversal_is_bijection_and_involution() {
        for log2 in 1..=12 {
            let size = 1usize << log2;
            let tables = TransformConfig::new(size).unwrap();
            let rev = tables.bit_reversal();

            let mut seen = vec![false; size];
            for &r in rev {
                assert!(r < size);
                assert!(!seen[r], "index {} produced twice for N={}", r, size);
                seen[r] = true;
            }

            for i in 0..size {
                assert_eq!(rev[rev[i]], i);
            }
        }
    }

    #[test]
    fn test_twiddles_unit_modulus() {
        let tables = TransformConfig::new(4096).unwrap();
        assert_eq!(tables.twiddle_cos().len(), 2048);

        for (c, s) in tables.twiddle_cos().iter().zip(tables.twiddle_sin()) {
            assert!((c * c + s * s - 1.0).abs() < 1e-5);
        }

        // W^0 = 1, W^(N/4) = -i
        assert_eq!(tables.twiddle_cos()[0], 1.0);
        assert_eq!(tables.twiddle_sin()[0], 0.0);
        assert!(tables.twiddle_cos()[1024].abs() < 1e-6);
        assert!((tables.twiddle_sin()[1024] + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_rebuild_is_identical() {
        let a = TransformConfig::new(1024).unwrap();
        let b = TransformConfig::new(1024).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_sizes_rejected() {
        for size in [0, 1, 3, 6, 100, 1000, MAX_TRANSFORM_SIZE * 2] {
            match TransformConfig::new(size) {
                Err(SpectrumError::InvalidConfiguration { size: s, .. }) => assert_eq!(s, size),
                other => panic!("size {} should be rejected, got {:?}", size, other),
            }
        }
    }

    #[test]
    fn test_smallest_size() {
        let tables = TransformConfig::new(2).unwrap();
        assert_eq!(tables.bit_reversal(), &[0, 1]);
        assert_eq!(tables.twiddle_cos(), &[1.0]);
    }
}
