//! 512-bit tier: AVX-512 Foundation.

#![allow(clippy::wildcard_imports)]

#[cfg(target_arch = "x86")]
use std::arch::x86::*;
#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

use super::{lanes_valid, Sealed, SimdOps};
use crate::tier::Tier;

/// Token of [`Tier::Avx512F`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Avx512F(());

impl Sealed for Avx512F {}

impl SimdOps for Avx512F {
    type Batch = __m512;
    const TIER: Tier = Tier::Avx512F;
    const LANES: usize = Tier::Avx512F.lanes_f32();
    const ALIGN: usize = Tier::Avx512F.alignment();

    #[inline(always)]
    unsafe fn new_unchecked() -> Self {
        Self(())
    }

    #[inline(always)]
    fn zero(self) -> __m512 {
        // SAFETY: token proves AVX-512F.
        unsafe { _mm512_setzero_ps() }
    }

    #[inline(always)]
    fn set(self, value: f32) -> __m512 {
        // SAFETY: token proves AVX-512F.
        unsafe { _mm512_set1_ps(value) }
    }

    #[inline(always)]
    unsafe fn load(self, ptr: *const f32) -> __m512 {
        // SAFETY: caller guarantees 64-byte alignment and 16 readable lanes.
        unsafe { _mm512_load_ps(ptr) }
    }

    #[inline(always)]
    unsafe fn loadu(self, ptr: *const f32) -> __m512 {
        // SAFETY: caller guarantees 16 readable lanes.
        unsafe { _mm512_loadu_ps(ptr) }
    }

    #[inline(always)]
    unsafe fn store(self, ptr: *mut f32, v: __m512) {
        // SAFETY: caller guarantees 64-byte alignment and 16 writable lanes.
        unsafe { _mm512_store_ps(ptr, v) }
    }

    #[inline(always)]
    unsafe fn storeu(self, ptr: *mut f32, v: __m512) {
        // SAFETY: caller guarantees 16 writable lanes.
        unsafe { _mm512_storeu_ps(ptr, v) }
    }

    #[inline(always)]
    fn add(self, a: __m512, b: __m512) -> __m512 {
        // SAFETY: token proves AVX-512F.
        unsafe { _mm512_add_ps(a, b) }
    }

    #[inline(always)]
    fn sub(self, a: __m512, b: __m512) -> __m512 {
        // SAFETY: token proves AVX-512F.
        unsafe { _mm512_sub_ps(a, b) }
    }

    #[inline(always)]
    fn mul(self, a: __m512, b: __m512) -> __m512 {
        // SAFETY: token proves AVX-512F.
        unsafe { _mm512_mul_ps(a, b) }
    }

    #[inline(always)]
    fn div(self, a: __m512, b: __m512) -> __m512 {
        // SAFETY: token proves AVX-512F.
        unsafe { _mm512_div_ps(a, b) }
    }

    #[inline(always)]
    fn reduce_sum(self, v: __m512) -> f32 {
        // SAFETY: token proves AVX-512F.
        unsafe { _mm512_reduce_add_ps(v) }
    }

    #[inline(always)]
    fn mul_add(self, a: __m512, b: __m512, c: __m512) -> __m512 {
        // SAFETY: token proves AVX-512F.
        unsafe { _mm512_fmadd_ps(a, b, c) }
    }

    #[inline(always)]
    fn round(self, v: __m512) -> __m512 {
        // SAFETY: token proves AVX-512F.
        // scale 0, round to nearest even, suppress precision exceptions
        unsafe { _mm512_roundscale_ps::<{ _MM_FROUND_TO_NEAREST_INT | _MM_FROUND_NO_EXC }>(v) }
    }
}

const _: () = assert!(lanes_valid(<Avx512F as SimdOps>::LANES));
