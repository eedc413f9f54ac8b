//! Scalar tier: one `f32` per "register".
//!
//! Always compiled, always supported. Also serves as the reference the other
//! tiers are tested against.

use super::{lanes_valid, Sealed, SimdOps};
use crate::tier::Tier;

/// Token of [`Tier::Scalar`]. Available on every host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Scalar(());

impl Scalar {
    /// The scalar token; no check needed.
    #[must_use]
    pub const fn new() -> Self {
        Self(())
    }
}

impl Sealed for Scalar {}

impl SimdOps for Scalar {
    type Batch = f32;
    const TIER: Tier = Tier::Scalar;
    const LANES: usize = 1;
    const ALIGN: usize = Tier::Scalar.alignment();

    #[inline(always)]
    unsafe fn new_unchecked() -> Self {
        Self::new()
    }

    #[inline(always)]
    fn try_new() -> crate::Result<Self> {
        Ok(Self::new())
    }

    #[inline(always)]
    fn zero(self) -> f32 {
        0.0
    }

    #[inline(always)]
    fn set(self, value: f32) -> f32 {
        value
    }

    #[inline(always)]
    unsafe fn load(self, ptr: *const f32) -> f32 {
        // SAFETY: caller guarantees ptr is aligned and valid for one read.
        unsafe { ptr.read() }
    }

    #[inline(always)]
    unsafe fn loadu(self, ptr: *const f32) -> f32 {
        // SAFETY: caller guarantees ptr is valid for one read.
        unsafe { ptr.read_unaligned() }
    }

    #[inline(always)]
    unsafe fn store(self, ptr: *mut f32, v: f32) {
        // SAFETY: caller guarantees ptr is aligned and valid for one write.
        unsafe { ptr.write(v) }
    }

    #[inline(always)]
    unsafe fn storeu(self, ptr: *mut f32, v: f32) {
        // SAFETY: caller guarantees ptr is valid for one write.
        unsafe { ptr.write_unaligned(v) }
    }

    #[inline(always)]
    fn add(self, a: f32, b: f32) -> f32 {
        a + b
    }

    #[inline(always)]
    fn sub(self, a: f32, b: f32) -> f32 {
        a - b
    }

    #[inline(always)]
    fn mul(self, a: f32, b: f32) -> f32 {
        a * b
    }

    #[inline(always)]
    fn div(self, a: f32, b: f32) -> f32 {
        a / b
    }

    #[inline(always)]
    fn reduce_sum(self, v: f32) -> f32 {
        v
    }

    #[inline(always)]
    fn mul_add(self, a: f32, b: f32, c: f32) -> f32 {
        // Unfused on purpose: only FMA tiers round once.
        a * b + c
    }

    #[inline(always)]
    fn round(self, v: f32) -> f32 {
        v.round_ties_even()
    }
}

const _: () = assert!(lanes_valid(<Scalar as SimdOps>::LANES));
