//! Tier backends.
//!
//! Every tier is represented by a zero-sized token type implementing
//! [`SimdOps`]. Holding a token is proof that the host supports the tier, so
//! its vector operations are safe to call. Tokens come from
//! [`SimdOps::try_new`] (checked against the selector) or
//! [`SimdOps::new_unchecked`].
//!
//! Tiers that share a register width reuse the narrower tier's operations
//! and only override what their extension improves:
//!
//! | Token | Register | Own operations |
//! |-------|----------|----------------|
//! | [`Scalar`] | `f32` | all |
//! | `Sse` | `__m128` | all |
//! | `Sse2` | `__m128` | none |
//! | `Sse3` | `__m128` | `reduce_sum` (`haddps`) |
//! | `Sse41` | `__m128` | `round` (`roundps`) |
//! | `Avx` | `__m256` | all |
//! | `Avx2` | `__m256` | none |
//! | `Avx2Fma3` | `__m256` | `mul_add` (`vfmadd`) |
//! | `Avx512F` | `__m512` | all, fused `mul_add` |
//!
//! Methods are `#[inline(always)]`: they are meant to be inlined into a
//! `#[target_feature]` entry generated by [`multiversion!`](crate::multiversion),
//! which is where the instructions are actually emitted.

mod scalar;
mod trig;

#[cfg(all(any(target_arch = "x86", target_arch = "x86_64"), feature = "tier-sse"))]
mod x86_sse;

#[cfg(all(any(target_arch = "x86", target_arch = "x86_64"), feature = "tier-avx"))]
mod x86_avx;

#[cfg(all(any(target_arch = "x86", target_arch = "x86_64"), feature = "tier-avx512f"))]
mod x86_avx512;

pub use scalar::Scalar;

#[cfg(all(any(target_arch = "x86", target_arch = "x86_64"), feature = "tier-sse"))]
pub use x86_sse::Sse;
#[cfg(all(any(target_arch = "x86", target_arch = "x86_64"), feature = "tier-sse2"))]
pub use x86_sse::Sse2;
#[cfg(all(any(target_arch = "x86", target_arch = "x86_64"), feature = "tier-sse3"))]
pub use x86_sse::Sse3;
#[cfg(all(any(target_arch = "x86", target_arch = "x86_64"), feature = "tier-sse41"))]
pub use x86_sse::Sse41;

#[cfg(all(any(target_arch = "x86", target_arch = "x86_64"), feature = "tier-avx"))]
pub use x86_avx::Avx;
#[cfg(all(any(target_arch = "x86", target_arch = "x86_64"), feature = "tier-avx2"))]
pub use x86_avx::Avx2;
#[cfg(all(any(target_arch = "x86", target_arch = "x86_64"), feature = "tier-avx2-fma3"))]
pub use x86_avx::Avx2Fma3;

#[cfg(all(any(target_arch = "x86", target_arch = "x86_64"), feature = "tier-avx512f"))]
pub use x86_avx512::Avx512F;

use crate::error::{Error, Result};
use crate::selector::support_info;
use crate::tier::Tier;

mod sealed {
    pub trait Sealed {}
}
pub(crate) use sealed::Sealed;

/// Vector operations of one instruction tier on packed `f32` lanes.
///
/// Implemented only by the token types of this module.
pub trait SimdOps: Copy + Send + Sync + 'static + Sealed {
    /// Register type: `f32`, `__m128`, `__m256` or `__m512`.
    type Batch: Copy;

    /// Tier this token stands for.
    const TIER: Tier;

    /// `f32` lanes per register: 1, or an even number.
    const LANES: usize;

    /// Alignment required by [`SimdOps::load`] and [`SimdOps::store`].
    const ALIGN: usize;

    /// Creates the token without checking the host.
    ///
    /// # Safety
    ///
    /// The host must support [`SimdOps::TIER`]. Using the token on a host that
    /// does not is undefined behavior.
    unsafe fn new_unchecked() -> Self;

    /// Creates the token if the tier is compiled in and the host supports it.
    fn try_new() -> Result<Self> {
        if Self::TIER.is_compiled() && support_info().supports(Self::TIER) {
            // SAFETY: the host reports support for the tier.
            Ok(unsafe { Self::new_unchecked() })
        } else {
            Err(Error::TierUnavailable(Self::TIER))
        }
    }

    /// All lanes zero.
    fn zero(self) -> Self::Batch;

    /// All lanes `value`.
    fn set(self, value: f32) -> Self::Batch;

    /// Loads `LANES` values from an `ALIGN`-aligned pointer.
    ///
    /// # Safety
    ///
    /// `ptr` must be aligned to `ALIGN` and valid for `LANES` reads.
    unsafe fn load(self, ptr: *const f32) -> Self::Batch;

    /// Loads `LANES` values from any pointer.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for `LANES` reads.
    unsafe fn loadu(self, ptr: *const f32) -> Self::Batch;

    /// Stores `LANES` values to an `ALIGN`-aligned pointer.
    ///
    /// # Safety
    ///
    /// `ptr` must be aligned to `ALIGN` and valid for `LANES` writes.
    unsafe fn store(self, ptr: *mut f32, v: Self::Batch);

    /// Stores `LANES` values to any pointer.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for `LANES` writes.
    unsafe fn storeu(self, ptr: *mut f32, v: Self::Batch);

    /// Lane-wise `a + b`.
    fn add(self, a: Self::Batch, b: Self::Batch) -> Self::Batch;

    /// Lane-wise `a - b`.
    fn sub(self, a: Self::Batch, b: Self::Batch) -> Self::Batch;

    /// Lane-wise `a * b`.
    fn mul(self, a: Self::Batch, b: Self::Batch) -> Self::Batch;

    /// Lane-wise `a / b`.
    fn div(self, a: Self::Batch, b: Self::Batch) -> Self::Batch;

    /// Sum of all lanes.
    fn reduce_sum(self, v: Self::Batch) -> f32;

    /// Lane-wise `a * b + c`.
    ///
    /// A single rounding on tiers with FMA ([`Tier::Avx2Fma3`],
    /// [`Tier::Avx512F`]), a multiply then an add elsewhere.
    fn mul_add(self, a: Self::Batch, b: Self::Batch, c: Self::Batch) -> Self::Batch;

    /// Lane-wise round to nearest integer, ties to even.
    fn round(self, v: Self::Batch) -> Self::Batch;

    /// Loads the first `LANES` elements of `src`.
    ///
    /// # Panics
    ///
    /// If `src` is shorter than `LANES`.
    #[inline(always)]
    fn load_slice(self, src: &[f32]) -> Self::Batch {
        assert!(src.len() >= Self::LANES, "slice shorter than one register");
        // SAFETY: the length check above covers LANES reads.
        unsafe { self.loadu(src.as_ptr()) }
    }

    /// Stores into the first `LANES` elements of `dst`.
    ///
    /// # Panics
    ///
    /// If `dst` is shorter than `LANES`.
    #[inline(always)]
    fn store_slice(self, dst: &mut [f32], v: Self::Batch) {
        assert!(dst.len() >= Self::LANES, "slice shorter than one register");
        // SAFETY: the length check above covers LANES writes.
        unsafe { self.storeu(dst.as_mut_ptr(), v) }
    }

    /// Lane-wise sine. Absolute error below 1e-5 for `|x| <= 1e4`.
    #[inline(always)]
    fn sin(self, x: Self::Batch) -> Self::Batch {
        trig::sin(self, x)
    }

    /// Lane-wise cosine. Absolute error below 1e-5 for `|x| <= 1e4`.
    #[inline(always)]
    fn cos(self, x: Self::Batch) -> Self::Batch {
        trig::cos(self, x)
    }
}

/// `LANES` is 1 or an even number; checked at compile time for every token.
pub(crate) const fn lanes_valid(lanes: usize) -> bool {
    lanes == 1 || (lanes >= 2 && lanes % 2 == 0)
}

/// Implements the listed [`SimdOps`] methods by forwarding to a narrower token
/// with the same `Batch` type.
#[allow(unused_macros)]
macro_rules! forward_ops {
    ($lower:expr => $($op:ident)*) => {
        $( forward_ops!(@op $lower, $op); )*
    };
    (@op $lower:expr, zero) => {
        #[inline(always)]
        fn zero(self) -> Self::Batch {
            $lower.zero()
        }
    };
    (@op $lower:expr, set) => {
        #[inline(always)]
        fn set(self, value: f32) -> Self::Batch {
            $lower.set(value)
        }
    };
    (@op $lower:expr, load) => {
        #[inline(always)]
        unsafe fn load(self, ptr: *const f32) -> Self::Batch {
            // SAFETY: same contract as the narrower token.
            unsafe { $lower.load(ptr) }
        }
    };
    (@op $lower:expr, loadu) => {
        #[inline(always)]
        unsafe fn loadu(self, ptr: *const f32) -> Self::Batch {
            // SAFETY: same contract as the narrower token.
            unsafe { $lower.loadu(ptr) }
        }
    };
    (@op $lower:expr, store) => {
        #[inline(always)]
        unsafe fn store(self, ptr: *mut f32, v: Self::Batch) {
            // SAFETY: same contract as the narrower token.
            unsafe { $lower.store(ptr, v) }
        }
    };
    (@op $lower:expr, storeu) => {
        #[inline(always)]
        unsafe fn storeu(self, ptr: *mut f32, v: Self::Batch) {
            // SAFETY: same contract as the narrower token.
            unsafe { $lower.storeu(ptr, v) }
        }
    };
    (@op $lower:expr, add) => {
        #[inline(always)]
        fn add(self, a: Self::Batch, b: Self::Batch) -> Self::Batch {
            $lower.add(a, b)
        }
    };
    (@op $lower:expr, sub) => {
        #[inline(always)]
        fn sub(self, a: Self::Batch, b: Self::Batch) -> Self::Batch {
            $lower.sub(a, b)
        }
    };
    (@op $lower:expr, mul) => {
        #[inline(always)]
        fn mul(self, a: Self::Batch, b: Self::Batch) -> Self::Batch {
            $lower.mul(a, b)
        }
    };
    (@op $lower:expr, div) => {
        #[inline(always)]
        fn div(self, a: Self::Batch, b: Self::Batch) -> Self::Batch {
            $lower.div(a, b)
        }
    };
    (@op $lower:expr, reduce_sum) => {
        #[inline(always)]
        fn reduce_sum(self, v: Self::Batch) -> f32 {
            $lower.reduce_sum(v)
        }
    };
    (@op $lower:expr, mul_add) => {
        #[inline(always)]
        fn mul_add(self, a: Self::Batch, b: Self::Batch, c: Self::Batch) -> Self::Batch {
            $lower.mul_add(a, b, c)
        }
    };
    (@op $lower:expr, round) => {
        #[inline(always)]
        fn round(self, v: Self::Batch) -> Self::Batch {
            $lower.round(v)
        }
    };
}
#[allow(unused_imports)]
pub(crate) use forward_ops;
