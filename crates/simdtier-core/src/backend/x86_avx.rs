//! 256-bit tiers: AVX, AVX2 and AVX2+FMA3.
//!
//! All three share `__m256`. `Avx` implements everything; `Avx2` adds no
//! float instruction this crate uses and forwards to it; `Avx2Fma3` replaces
//! `mul_add` with a fused multiply-add.

#![allow(clippy::wildcard_imports)]

#[cfg(target_arch = "x86")]
use std::arch::x86::*;
#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

#[allow(unused_imports)]
use super::forward_ops;
use super::{lanes_valid, Sealed, SimdOps};
use crate::tier::Tier;

// =============================================================================
// AVX
// =============================================================================

/// Token of [`Tier::Avx`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Avx(());

impl Sealed for Avx {}

impl SimdOps for Avx {
    type Batch = __m256;
    const TIER: Tier = Tier::Avx;
    const LANES: usize = Tier::Avx.lanes_f32();
    const ALIGN: usize = Tier::Avx.alignment();

    #[inline(always)]
    unsafe fn new_unchecked() -> Self {
        Self(())
    }

    #[inline(always)]
    fn zero(self) -> __m256 {
        // SAFETY: token proves AVX.
        unsafe { _mm256_setzero_ps() }
    }

    #[inline(always)]
    fn set(self, value: f32) -> __m256 {
        // SAFETY: token proves AVX.
        unsafe { _mm256_set1_ps(value) }
    }

    #[inline(always)]
    unsafe fn load(self, ptr: *const f32) -> __m256 {
        // SAFETY: caller guarantees 32-byte alignment and 8 readable lanes.
        unsafe { _mm256_load_ps(ptr) }
    }

    #[inline(always)]
    unsafe fn loadu(self, ptr: *const f32) -> __m256 {
        // SAFETY: caller guarantees 8 readable lanes.
        unsafe { _mm256_loadu_ps(ptr) }
    }

    #[inline(always)]
    unsafe fn store(self, ptr: *mut f32, v: __m256) {
        // SAFETY: caller guarantees 32-byte alignment and 8 writable lanes.
        unsafe { _mm256_store_ps(ptr, v) }
    }

    #[inline(always)]
    unsafe fn storeu(self, ptr: *mut f32, v: __m256) {
        // SAFETY: caller guarantees 8 writable lanes.
        unsafe { _mm256_storeu_ps(ptr, v) }
    }

    #[inline(always)]
    fn add(self, a: __m256, b: __m256) -> __m256 {
        // SAFETY: token proves AVX.
        unsafe { _mm256_add_ps(a, b) }
    }

    #[inline(always)]
    fn sub(self, a: __m256, b: __m256) -> __m256 {
        // SAFETY: token proves AVX.
        unsafe { _mm256_sub_ps(a, b) }
    }

    #[inline(always)]
    fn mul(self, a: __m256, b: __m256) -> __m256 {
        // SAFETY: token proves AVX.
        unsafe { _mm256_mul_ps(a, b) }
    }

    #[inline(always)]
    fn div(self, a: __m256, b: __m256) -> __m256 {
        // SAFETY: token proves AVX.
        unsafe { _mm256_div_ps(a, b) }
    }

    #[inline(always)]
    fn reduce_sum(self, v: __m256) -> f32 {
        // SAFETY: token proves AVX, which implies SSE3.
        unsafe {
            let hi = _mm256_extractf128_ps(v, 1);
            let lo = _mm256_castps256_ps128(v);
            let sum128 = _mm_add_ps(lo, hi);
            let shuf = _mm_movehdup_ps(sum128);
            let sums = _mm_add_ps(sum128, shuf);
            let shuf = _mm_movehl_ps(shuf, sums);
            _mm_cvtss_f32(_mm_add_ss(sums, shuf))
        }
    }

    #[inline(always)]
    fn mul_add(self, a: __m256, b: __m256, c: __m256) -> __m256 {
        // SAFETY: token proves AVX.
        unsafe { _mm256_add_ps(_mm256_mul_ps(a, b), c) }
    }

    #[inline(always)]
    fn round(self, v: __m256) -> __m256 {
        // SAFETY: token proves AVX.
        unsafe { _mm256_round_ps::<{ _MM_FROUND_TO_NEAREST_INT | _MM_FROUND_NO_EXC }>(v) }
    }
}

const _: () = assert!(lanes_valid(<Avx as SimdOps>::LANES));

// =============================================================================
// AVX2
// =============================================================================

/// Token of [`Tier::Avx2`]. Same float operations as [`Avx`].
#[cfg(feature = "tier-avx2")]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Avx2(());

#[cfg(feature = "tier-avx2")]
impl Sealed for Avx2 {}

#[cfg(feature = "tier-avx2")]
impl SimdOps for Avx2 {
    type Batch = __m256;
    const TIER: Tier = Tier::Avx2;
    const LANES: usize = Tier::Avx2.lanes_f32();
    const ALIGN: usize = Tier::Avx2.alignment();

    #[inline(always)]
    unsafe fn new_unchecked() -> Self {
        Self(())
    }

    forward_ops!(Avx(()) => zero set load loadu store storeu add sub mul div reduce_sum mul_add round);
}

#[cfg(feature = "tier-avx2")]
const _: () = assert!(lanes_valid(<Avx2 as SimdOps>::LANES));

// =============================================================================
// AVX2 + FMA3
// =============================================================================

/// Token of [`Tier::Avx2Fma3`]. Fused `mul_add`.
#[cfg(feature = "tier-avx2-fma3")]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Avx2Fma3(());

#[cfg(feature = "tier-avx2-fma3")]
impl Sealed for Avx2Fma3 {}

#[cfg(feature = "tier-avx2-fma3")]
impl SimdOps for Avx2Fma3 {
    type Batch = __m256;
    const TIER: Tier = Tier::Avx2Fma3;
    const LANES: usize = Tier::Avx2Fma3.lanes_f32();
    const ALIGN: usize = Tier::Avx2Fma3.alignment();

    #[inline(always)]
    unsafe fn new_unchecked() -> Self {
        Self(())
    }

    forward_ops!(Avx2(()) => zero set load loadu store storeu add sub mul div reduce_sum round);

    #[inline(always)]
    fn mul_add(self, a: __m256, b: __m256, c: __m256) -> __m256 {
        // SAFETY: token proves AVX2 and FMA3.
        unsafe { _mm256_fmadd_ps(a, b, c) }
    }
}

#[cfg(feature = "tier-avx2-fma3")]
const _: () = assert!(lanes_valid(<Avx2Fma3 as SimdOps>::LANES));
