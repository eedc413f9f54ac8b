//! 128-bit tiers: SSE, SSE2, SSE3 and SSE4.1.
//!
//! `Sse` implements every operation with SSE1 instructions. The wider SSE
//! tiers share its `__m128` register and forward to it, overriding only
//! `reduce_sum` (SSE3 horizontal add) and `round` (SSE4.1 `roundps`).
//!
//! Each `unsafe` block below calls intrinsics of the token's own tier. A
//! token only exists once the host is known to support that tier.

#![allow(clippy::wildcard_imports)]

#[cfg(target_arch = "x86")]
use std::arch::x86::*;
#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

#[allow(unused_imports)]
use super::forward_ops;
use super::{lanes_valid, Sealed, SimdOps};
use crate::tier::Tier;

/// 2^23: adding it to |v| < 2^23 pushes the fraction bits out of the mantissa.
const ROUND_MAGIC: f32 = 8_388_608.0;

// =============================================================================
// SSE
// =============================================================================

/// Token of [`Tier::Sse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sse(());

impl Sealed for Sse {}

impl SimdOps for Sse {
    type Batch = __m128;
    const TIER: Tier = Tier::Sse;
    const LANES: usize = Tier::Sse.lanes_f32();
    const ALIGN: usize = Tier::Sse.alignment();

    #[inline(always)]
    unsafe fn new_unchecked() -> Self {
        Self(())
    }

    #[inline(always)]
    fn zero(self) -> __m128 {
        // SAFETY: token proves SSE.
        unsafe { _mm_setzero_ps() }
    }

    #[inline(always)]
    fn set(self, value: f32) -> __m128 {
        // SAFETY: token proves SSE.
        unsafe { _mm_set1_ps(value) }
    }

    #[inline(always)]
    unsafe fn load(self, ptr: *const f32) -> __m128 {
        // SAFETY: caller guarantees 16-byte alignment and 4 readable lanes.
        unsafe { _mm_load_ps(ptr) }
    }

    #[inline(always)]
    unsafe fn loadu(self, ptr: *const f32) -> __m128 {
        // SAFETY: caller guarantees 4 readable lanes.
        unsafe { _mm_loadu_ps(ptr) }
    }

    #[inline(always)]
    unsafe fn store(self, ptr: *mut f32, v: __m128) {
        // SAFETY: caller guarantees 16-byte alignment and 4 writable lanes.
        unsafe { _mm_store_ps(ptr, v) }
    }

    #[inline(always)]
    unsafe fn storeu(self, ptr: *mut f32, v: __m128) {
        // SAFETY: caller guarantees 4 writable lanes.
        unsafe { _mm_storeu_ps(ptr, v) }
    }

    #[inline(always)]
    fn add(self, a: __m128, b: __m128) -> __m128 {
        // SAFETY: token proves SSE.
        unsafe { _mm_add_ps(a, b) }
    }

    #[inline(always)]
    fn sub(self, a: __m128, b: __m128) -> __m128 {
        // SAFETY: token proves SSE.
        unsafe { _mm_sub_ps(a, b) }
    }

    #[inline(always)]
    fn mul(self, a: __m128, b: __m128) -> __m128 {
        // SAFETY: token proves SSE.
        unsafe { _mm_mul_ps(a, b) }
    }

    #[inline(always)]
    fn div(self, a: __m128, b: __m128) -> __m128 {
        // SAFETY: token proves SSE.
        unsafe { _mm_div_ps(a, b) }
    }

    #[inline(always)]
    fn reduce_sum(self, v: __m128) -> f32 {
        // SAFETY: token proves SSE.
        unsafe {
            // [1, 0, 3, 2]
            let shuf = _mm_shuffle_ps::<0b10_11_00_01>(v, v);
            let sums = _mm_add_ps(v, shuf);
            let high = _mm_movehl_ps(shuf, sums);
            _mm_cvtss_f32(_mm_add_ss(sums, high))
        }
    }

    #[inline(always)]
    fn mul_add(self, a: __m128, b: __m128, c: __m128) -> __m128 {
        // SAFETY: token proves SSE.
        unsafe { _mm_add_ps(_mm_mul_ps(a, b), c) }
    }

    #[inline(always)]
    fn round(self, v: __m128) -> __m128 {
        // SAFETY: token proves SSE.
        unsafe {
            let sign_mask = _mm_set1_ps(-0.0);
            let magic_abs = _mm_set1_ps(ROUND_MAGIC);
            let sign = _mm_and_ps(v, sign_mask);
            // ±2^23 with the sign of v, so v + magic lands in [2^23, 2^24)
            // where the spacing is exactly 1 and the add rounds ties to even.
            let magic = _mm_or_ps(sign, magic_abs);
            let rounded = _mm_sub_ps(_mm_add_ps(v, magic), magic);
            // keeps -0.0 for small negative inputs
            let rounded = _mm_or_ps(rounded, sign);
            // |v| >= 2^23, infinities and NaN pass through unchanged
            let small = _mm_cmplt_ps(_mm_andnot_ps(sign_mask, v), magic_abs);
            _mm_or_ps(_mm_and_ps(small, rounded), _mm_andnot_ps(small, v))
        }
    }
}

const _: () = assert!(lanes_valid(<Sse as SimdOps>::LANES));

// =============================================================================
// SSE2
// =============================================================================

/// Token of [`Tier::Sse2`]. Same operations as [`Sse`].
#[cfg(feature = "tier-sse2")]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sse2(());

#[cfg(feature = "tier-sse2")]
impl Sealed for Sse2 {}

#[cfg(feature = "tier-sse2")]
impl SimdOps for Sse2 {
    type Batch = __m128;
    const TIER: Tier = Tier::Sse2;
    const LANES: usize = Tier::Sse2.lanes_f32();
    const ALIGN: usize = Tier::Sse2.alignment();

    #[inline(always)]
    unsafe fn new_unchecked() -> Self {
        Self(())
    }

    forward_ops!(Sse(()) => zero set load loadu store storeu add sub mul div reduce_sum mul_add round);
}

#[cfg(feature = "tier-sse2")]
const _: () = assert!(lanes_valid(<Sse2 as SimdOps>::LANES));

// =============================================================================
// SSE3
// =============================================================================

/// Token of [`Tier::Sse3`]. Horizontal-add reduction.
#[cfg(feature = "tier-sse3")]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sse3(());

#[cfg(feature = "tier-sse3")]
impl Sealed for Sse3 {}

#[cfg(feature = "tier-sse3")]
impl SimdOps for Sse3 {
    type Batch = __m128;
    const TIER: Tier = Tier::Sse3;
    const LANES: usize = Tier::Sse3.lanes_f32();
    const ALIGN: usize = Tier::Sse3.alignment();

    #[inline(always)]
    unsafe fn new_unchecked() -> Self {
        Self(())
    }

    forward_ops!(Sse2(()) => zero set load loadu store storeu add sub mul div mul_add round);

    #[inline(always)]
    fn reduce_sum(self, v: __m128) -> f32 {
        // SAFETY: token proves SSE3.
        unsafe {
            let pairs = _mm_hadd_ps(v, v);
            _mm_cvtss_f32(_mm_hadd_ps(pairs, pairs))
        }
    }
}

#[cfg(feature = "tier-sse3")]
const _: () = assert!(lanes_valid(<Sse3 as SimdOps>::LANES));

// =============================================================================
// SSE4.1
// =============================================================================

/// Token of [`Tier::Sse41`]. Native packed rounding.
#[cfg(feature = "tier-sse41")]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sse41(());

#[cfg(feature = "tier-sse41")]
impl Sealed for Sse41 {}

#[cfg(feature = "tier-sse41")]
impl SimdOps for Sse41 {
    type Batch = __m128;
    const TIER: Tier = Tier::Sse41;
    const LANES: usize = Tier::Sse41.lanes_f32();
    const ALIGN: usize = Tier::Sse41.alignment();

    #[inline(always)]
    unsafe fn new_unchecked() -> Self {
        Self(())
    }

    forward_ops!(Sse3(()) => zero set load loadu store storeu add sub mul div reduce_sum mul_add);

    #[inline(always)]
    fn round(self, v: __m128) -> __m128 {
        // SAFETY: token proves SSE4.1.
        unsafe { _mm_round_ps::<{ _MM_FROUND_TO_NEAREST_INT | _MM_FROUND_NO_EXC }>(v) }
    }
}

#[cfg(feature = "tier-sse41")]
const _: () = assert!(lanes_valid(<Sse41 as SimdOps>::LANES));
