//! Batch kernels for the windowing and magnitude stages
//!
//! Both stages are elementwise, so they are written as pure functions over
//! slices. Vectorized variants (SSE and AVX on x86_64, NEON on aarch64,
//! simd128 on wasm32) process four or eight lanes at a time and fall back
//! to the scalar loop for the tail. The variant is chosen once per process
//! from the CPU's capabilities and handed out as a [`KernelSet`].

use num_complex::Complex;
use once_cell::sync::Lazy;

/// Window stage: `out[i] = samples[i] * window[i] + 0i`
pub type WindowKernel = fn(samples: &[f32], window: &[f32], out: &mut [Complex<f32>]);

/// Magnitude stage: `out[i] = |frame[i]|`
pub type MagnitudeKernel = fn(frame: &[Complex<f32>], out: &mut [f32]);

/// Which implementation a [`KernelSet`] dispatches to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelKind {
    Scalar,
    /// 4 lanes, x86_64 baseline
    Sse,
    /// 8 lanes, x86_64 with AVX detected at runtime
    Avx,
    /// 4 lanes, aarch64
    Neon,
    /// 4 lanes, wasm32 built with `simd128`
    Simd128,
}

/// Kernel selection preference carried in the analyzer configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KernelPreference {
    /// Use the vectorized kernels when the CPU supports them
    #[default]
    Auto,
    /// Always use the scalar kernels
    Scalar,
}

/// Pair of stage kernels with identical signatures across variants
#[derive(Clone, Copy)]
pub struct KernelSet {
    kind: KernelKind,
    window: WindowKernel,
    magnitude: MagnitudeKernel,
}

static DETECTED: Lazy<KernelSet> = Lazy::new(|| {
    let set = probe();
    log::debug!("Selected {:?} spectrum kernels", set.kind);
    set
});

impl KernelSet {
    /// Portable scalar kernels
    pub fn scalar() -> Self {
        Self {
            kind: KernelKind::Scalar,
            window: apply_window_scalar,
            magnitude: magnitudes_scalar,
        }
    }

    /// Best kernels for this CPU (detected once per process)
    pub fn detect() -> Self {
        *DETECTED
    }

    pub fn for_preference(preference: KernelPreference) -> Self {
        match preference {
            KernelPreference::Auto => Self::detect(),
            KernelPreference::Scalar => Self::scalar(),
        }
    }

    pub fn kind(&self) -> KernelKind {
        self.kind
    }

    /// Window `samples` into `out`; all three slices must have equal length
    #[inline]
    pub fn apply_window(&self, samples: &[f32], window: &[f32], out: &mut [Complex<f32>]) {
        debug_assert_eq!(samples.len(), out.len());
        debug_assert_eq!(window.len(), out.len());
        (self.window)(samples, window, out)
    }

    /// Write the modulus of each element of `frame` into `out` (equal lengths)
    #[inline]
    pub fn magnitudes(&self, frame: &[Complex<f32>], out: &mut [f32]) {
        debug_assert_eq!(frame.len(), out.len());
        (self.magnitude)(frame, out)
    }
}

impl std::fmt::Debug for KernelSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KernelSet").field("kind", &self.kind).finish()
    }
}

// SSE is part of the x86_64 baseline, so only AVX needs a runtime check
#[cfg(target_arch = "x86_64")]
fn probe() -> KernelSet {
    if std::arch::is_x86_feature_detected!("avx") {
        avx::kernels()
    } else {
        sse::kernels()
    }
}

#[cfg(target_arch = "aarch64")]
fn probe() -> KernelSet {
    neon::kernels()
}

// wasm has no runtime probe: the vector kernels exist only in simd128 builds
#[cfg(all(target_arch = "wasm32", target_feature = "simd128"))]
fn probe() -> KernelSet {
    simd128::kernels()
}

#[cfg(not(any(
    target_arch = "x86_64",
    target_arch = "aarch64",
    all(target_arch = "wasm32", target_feature = "simd128")
)))]
fn probe() -> KernelSet {
    KernelSet::scalar()
}

/// Every kernel set this CPU can run, scalar first
pub fn available_kernels() -> Vec<KernelSet> {
    let mut sets = vec![KernelSet::scalar()];

    #[cfg(target_arch = "x86_64")]
    {
        sets.push(sse::kernels());
        if std::arch::is_x86_feature_detected!("avx") {
            sets.push(avx::kernels());
        }
    }

    #[cfg(target_arch = "aarch64")]
    sets.push(neon::kernels());

    #[cfg(all(target_arch = "wasm32", target_feature = "simd128"))]
    sets.push(simd128::kernels());

    sets
}

pub fn apply_window_scalar(samples: &[f32], window: &[f32], out: &mut [Complex<f32>]) {
    for ((o, &s), &w) in out.iter_mut().zip(samples).zip(window) {
        *o = Complex::new(s * w, 0.0);
    }
}

pub fn magnitudes_scalar(frame: &[Complex<f32>], out: &mut [f32]) {
    for (o, c) in out.iter_mut().zip(frame) {
        *o = (c.re * c.re + c.im * c.im).sqrt();
    }
}

#[cfg(target_arch = "x86_64")]
mod sse {
    use super::{KernelKind, KernelSet};
    use num_complex::Complex;
    use std::arch::x86_64::*;

    const LANES: usize = 4;

    pub(super) fn kernels() -> KernelSet {
        KernelSet {
            kind: KernelKind::Sse,
            window: apply_window,
            magnitude: magnitudes,
        }
    }

    // SSE is baseline on x86_64
    fn apply_window(samples: &[f32], window: &[f32], out: &mut [Complex<f32>]) {
        unsafe { apply_window_sse(samples, window, out) }
    }

    fn magnitudes(frame: &[Complex<f32>], out: &mut [f32]) {
        unsafe { magnitudes_sse(frame, out) }
    }

    #[target_feature(enable = "sse")]
    unsafe fn apply_window_sse(samples: &[f32], window: &[f32], out: &mut [Complex<f32>]) {
        let n = out.len().min(samples.len()).min(window.len());
        let mut i = 0;
        let mut lanes = [0.0f32; LANES];

        while i + LANES <= n {
            let s = _mm_loadu_ps(samples.as_ptr().add(i));
            let w = _mm_loadu_ps(window.as_ptr().add(i));
            _mm_storeu_ps(lanes.as_mut_ptr(), _mm_mul_ps(s, w));
            for (o, &v) in out[i..i + LANES].iter_mut().zip(&lanes) {
                *o = Complex::new(v, 0.0);
            }
            i += LANES;
        }

        super::apply_window_scalar(&samples[i..n], &window[i..n], &mut out[i..n]);
    }

    #[target_feature(enable = "sse")]
    unsafe fn magnitudes_sse(frame: &[Complex<f32>], out: &mut [f32]) {
        let n = out.len().min(frame.len());
        let mut i = 0;

        // Complex<f32> is repr(C) { re, im }: four values span two registers
        while i + LANES <= n {
            let base = frame.as_ptr().add(i) as *const f32;
            let lo = _mm_loadu_ps(base);
            let hi = _mm_loadu_ps(base.add(LANES));
            let lo_sq = _mm_mul_ps(lo, lo);
            let hi_sq = _mm_mul_ps(hi, hi);
            let re_sq = _mm_shuffle_ps::<0b10_00_10_00>(lo_sq, hi_sq);
            let im_sq = _mm_shuffle_ps::<0b11_01_11_01>(lo_sq, hi_sq);
            let mag = _mm_sqrt_ps(_mm_add_ps(re_sq, im_sq));
            _mm_storeu_ps(out.as_mut_ptr().add(i), mag);
            i += LANES;
        }

        super::magnitudes_scalar(&frame[i..n], &mut out[i..n]);
    }
}

#[cfg(target_arch = "x86_64")]
mod avx {
    use super::{KernelKind, KernelSet};
    use num_complex::Complex;
    use std::arch::x86_64::*;

    const LANES: usize = 8;

    pub(super) fn kernels() -> KernelSet {
        KernelSet {
            kind: KernelKind::Avx,
            window: apply_window,
            magnitude: magnitudes,
        }
    }

    // Only handed out after `is_x86_feature_detected!("avx")`
    fn apply_window(samples: &[f32], window: &[f32], out: &mut [Complex<f32>]) {
        unsafe { apply_window_avx(samples, window, out) }
    }

    fn magnitudes(frame: &[Complex<f32>], out: &mut [f32]) {
        unsafe { magnitudes_avx(frame, out) }
    }

    #[target_feature(enable = "avx")]
    unsafe fn apply_window_avx(samples: &[f32], window: &[f32], out: &mut [Complex<f32>]) {
        let n = out.len().min(samples.len()).min(window.len());
        let mut i = 0;
        let mut lanes = [0.0f32; LANES];

        while i + LANES <= n {
            let s = _mm256_loadu_ps(samples.as_ptr().add(i));
            let w = _mm256_loadu_ps(window.as_ptr().add(i));
            _mm256_storeu_ps(lanes.as_mut_ptr(), _mm256_mul_ps(s, w));
            for (o, &v) in out[i..i + LANES].iter_mut().zip(&lanes) {
                *o = Complex::new(v, 0.0);
            }
            i += LANES;
        }

        super::apply_window_scalar(&samples[i..n], &window[i..n], &mut out[i..n]);
    }

    #[target_feature(enable = "avx")]
    unsafe fn magnitudes_avx(frame: &[Complex<f32>], out: &mut [f32]) {
        let n = out.len().min(frame.len());
        let mut i = 0;

        while i + LANES <= n {
            let base = frame.as_ptr().add(i) as *const f32;
            // c0..c3 and c4..c7, interleaved re/im
            let lo = _mm256_loadu_ps(base);
            let hi = _mm256_loadu_ps(base.add(LANES));
            // Regroup 128-bit halves so the lane-local hadd yields c0..c7 in order
            let a = _mm256_permute2f128_ps::<0x20>(lo, hi);
            let b = _mm256_permute2f128_ps::<0x31>(lo, hi);
            let sq = _mm256_hadd_ps(_mm256_mul_ps(a, a), _mm256_mul_ps(b, b));
            _mm256_storeu_ps(out.as_mut_ptr().add(i), _mm256_sqrt_ps(sq));
            i += LANES;
        }

        super::magnitudes_scalar(&frame[i..n], &mut out[i..n]);
    }
}

#[cfg(target_arch = "aarch64")]
mod neon {
    use super::{KernelKind, KernelSet};
    use num_complex::Complex;
    use std::arch::aarch64::*;

    const LANES: usize = 4;

    pub(super) fn kernels() -> KernelSet {
        KernelSet {
            kind: KernelKind::Neon,
            window: apply_window,
            magnitude: magnitudes,
        }
    }

    // NEON is baseline on aarch64
    fn apply_window(samples: &[f32], window: &[f32], out: &mut [Complex<f32>]) {
        unsafe { apply_window_neon(samples, window, out) }
    }

    fn magnitudes(frame: &[Complex<f32>], out: &mut [f32]) {
        unsafe { magnitudes_neon(frame, out) }
    }

    #[target_feature(enable = "neon")]
    unsafe fn apply_window_neon(samples: &[f32], window: &[f32], out: &mut [Complex<f32>]) {
        let n = out.len().min(samples.len()).min(window.len());
        let mut i = 0;
        let zero = vdupq_n_f32(0.0);

        while i + LANES <= n {
            let s = vld1q_f32(samples.as_ptr().add(i));
            let w = vld1q_f32(window.as_ptr().add(i));
            // Interleaving store writes (re, 0.0) pairs straight into the frame
            vst2q_f32(
                out.as_mut_ptr().add(i) as *mut f32,
                float32x4x2_t(vmulq_f32(s, w), zero),
            );
            i += LANES;
        }

        super::apply_window_scalar(&samples[i..n], &window[i..n], &mut out[i..n]);
    }

    #[target_feature(enable = "neon")]
    unsafe fn magnitudes_neon(frame: &[Complex<f32>], out: &mut [f32]) {
        let n = out.len().min(frame.len());
        let mut i = 0;

        while i + LANES <= n {
            let float32x4x2_t(re, im) = vld2q_f32(frame.as_ptr().add(i) as *const f32);
            let sq = vaddq_f32(vmulq_f32(re, re), vmulq_f32(im, im));
            vst1q_f32(out.as_mut_ptr().add(i), vsqrtq_f32(sq));
            i += LANES;
        }

        super::magnitudes_scalar(&frame[i..n], &mut out[i..n]);
    }
}

#[cfg(all(target_arch = "wasm32", target_feature = "simd128"))]
mod simd128 {
    use super::{KernelKind, KernelSet};
    use core::arch::wasm32::*;
    use num_complex::Complex;

    const LANES: usize = 4;

    pub(super) fn kernels() -> KernelSet {
        KernelSet {
            kind: KernelKind::Simd128,
            window: apply_window,
            magnitude: magnitudes,
        }
    }

    // Compiled only when the whole module targets simd128
    fn apply_window(samples: &[f32], window: &[f32], out: &mut [Complex<f32>]) {
        unsafe { apply_window_simd128(samples, window, out) }
    }

    fn magnitudes(frame: &[Complex<f32>], out: &mut [f32]) {
        unsafe { magnitudes_simd128(frame, out) }
    }

    #[target_feature(enable = "simd128")]
    unsafe fn apply_window_simd128(samples: &[f32], window: &[f32], out: &mut [Complex<f32>]) {
        let n = out.len().min(samples.len()).min(window.len());
        let mut i = 0;
        let zero = f32x4_splat(0.0);

        while i + LANES <= n {
            let s = v128_load(samples.as_ptr().add(i) as *const v128);
            let w = v128_load(window.as_ptr().add(i) as *const v128);
            let product = f32x4_mul(s, w);
            let dst = out.as_mut_ptr().add(i) as *mut v128;
            v128_store(dst, i32x4_shuffle::<0, 4, 1, 5>(product, zero));
            v128_store(dst.add(1), i32x4_shuffle::<2, 6, 3, 7>(product, zero));
            i += LANES;
        }

        super::apply_window_scalar(&samples[i..n], &window[i..n], &mut out[i..n]);
    }

    #[target_feature(enable = "simd128")]
    unsafe fn magnitudes_simd128(frame: &[Complex<f32>], out: &mut [f32]) {
        let n = out.len().min(frame.len());
        let mut i = 0;

        while i + LANES <= n {
            let base = frame.as_ptr().add(i) as *const v128;
            let lo = v128_load(base);
            let hi = v128_load(base.add(1));
            let lo_sq = f32x4_mul(lo, lo);
            let hi_sq = f32x4_mul(hi, hi);
            let re_sq = i32x4_shuffle::<0, 2, 4, 6>(lo_sq, hi_sq);
            let im_sq = i32x4_shuffle::<1, 3, 5, 7>(lo_sq, hi_sq);
            v128_store(out.as_mut_ptr().add(i) as *mut v128, f32x4_sqrt(f32x4_add(re_sq, im_sq)));
            i += LANES;
        }

        super::magnitudes_scalar(&frame[i..n], &mut out[i..n]);
    }
}
