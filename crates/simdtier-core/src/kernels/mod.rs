//! Built-in slice kernels.
//!
//! Each kernel is a [`multiversion!`](crate::multiversion) kernel: a safe
//! function dispatching on the selected tier, plus a `*_table()` accessor for
//! callers that want a specific tier. Kernels process whole registers with
//! unaligned loads and finish the remainder with scalar code, so any slice
//! length works.
//!
//! Element-wise kernels require all slices to have the same length and panic
//! otherwise.
//!
//! [`KernelSet`] resolves every kernel once, for code that wants dispatch
//! hoisted out of a hot loop.

mod set;

pub use set::{kernel_set, BinaryFn, DotFn, FillFn, KernelSet, ReduceFn, TernaryFn, UnaryFn};

use crate::backend::{Scalar, SimdOps};
use crate::multiversion;

#[inline(always)]
fn zip_map<S: SimdOps>(
    simd: S,
    a: &[f32],
    b: &[f32],
    out: &mut [f32],
    vector: impl Fn(S::Batch, S::Batch) -> S::Batch,
    scalar: impl Fn(f32, f32) -> f32,
) {
    assert_eq!(a.len(), b.len(), "Vector dimensions must match");
    assert_eq!(a.len(), out.len(), "Output length must match input");

    let lanes = S::LANES;
    let body = a.len() - a.len() % lanes;
    for i in (0..body).step_by(lanes) {
        let v = vector(simd.load_slice(&a[i..]), simd.load_slice(&b[i..]));
        simd.store_slice(&mut out[i..], v);
    }
    for ((o, &x), &y) in out[body..].iter_mut().zip(&a[body..]).zip(&b[body..]) {
        *o = scalar(x, y);
    }
}

#[inline(always)]
fn map<S: SimdOps>(
    simd: S,
    x: &[f32],
    out: &mut [f32],
    vector: impl Fn(S::Batch) -> S::Batch,
    scalar: impl Fn(f32) -> f32,
) {
    assert_eq!(x.len(), out.len(), "Output length must match input");

    let lanes = S::LANES;
    let body = x.len() - x.len() % lanes;
    for i in (0..body).step_by(lanes) {
        let v = vector(simd.load_slice(&x[i..]));
        simd.store_slice(&mut out[i..], v);
    }
    for (o, &v) in out[body..].iter_mut().zip(&x[body..]) {
        *o = scalar(v);
    }
}

// =============================================================================
// Element-wise
// =============================================================================

multiversion! {
    #[table(fill_table)]
    /// Sets every element of `out` to `value`.
    pub fn fill<S>(simd: S, out: &mut [f32], value: f32) {
        let v = simd.set(value);
        let mut chunks = out.chunks_exact_mut(S::LANES);
        for chunk in &mut chunks {
            simd.store_slice(chunk, v);
        }
        for x in chunks.into_remainder() {
            *x = value;
        }
    }
}

multiversion! {
    #[table(add_table)]
    /// `out[i] = a[i] + b[i]`.
    ///
    /// # Panics
    ///
    /// If the slice lengths differ.
    pub fn add<S>(simd: S, a: &[f32], b: &[f32], out: &mut [f32]) {
        zip_map(simd, a, b, out, |x, y| simd.add(x, y), |x, y| x + y);
    }
}

multiversion! {
    #[table(sub_table)]
    /// `out[i] = a[i] - b[i]`.
    ///
    /// # Panics
    ///
    /// If the slice lengths differ.
    pub fn sub<S>(simd: S, a: &[f32], b: &[f32], out: &mut [f32]) {
        zip_map(simd, a, b, out, |x, y| simd.sub(x, y), |x, y| x - y);
    }
}

multiversion! {
    #[table(mul_table)]
    /// `out[i] = a[i] * b[i]`.
    ///
    /// # Panics
    ///
    /// If the slice lengths differ.
    pub fn mul<S>(simd: S, a: &[f32], b: &[f32], out: &mut [f32]) {
        zip_map(simd, a, b, out, |x, y| simd.mul(x, y), |x, y| x * y);
    }
}

multiversion! {
    #[table(div_table)]
    /// `out[i] = a[i] / b[i]`.
    ///
    /// # Panics
    ///
    /// If the slice lengths differ.
    pub fn div<S>(simd: S, a: &[f32], b: &[f32], out: &mut [f32]) {
        zip_map(simd, a, b, out, |x, y| simd.div(x, y), |x, y| x / y);
    }
}

multiversion! {
    #[table(mul_add_table)]
    /// `out[i] = a[i] * b[i] + c[i]`, fused on FMA tiers except in the
    /// scalar tail.
    ///
    /// # Panics
    ///
    /// If the slice lengths differ.
    pub fn mul_add<S>(simd: S, a: &[f32], b: &[f32], c: &[f32], out: &mut [f32]) {
        assert_eq!(a.len(), b.len(), "Vector dimensions must match");
        assert_eq!(a.len(), c.len(), "Vector dimensions must match");
        assert_eq!(a.len(), out.len(), "Output length must match input");

        let lanes = S::LANES;
        let body = a.len() - a.len() % lanes;
        for i in (0..body).step_by(lanes) {
            let v = simd.mul_add(
                simd.load_slice(&a[i..]),
                simd.load_slice(&b[i..]),
                simd.load_slice(&c[i..]),
            );
            simd.store_slice(&mut out[i..], v);
        }
        let tail = a[body..].iter().zip(&b[body..]).zip(&c[body..]);
        for (o, ((&x, &y), &z)) in out[body..].iter_mut().zip(tail) {
            *o = x * y + z;
        }
    }
}

multiversion! {
    #[table(sin_table)]
    /// `out[i] = sin(x[i])`, absolute error below 1e-5 for `|x| <= 1e4`.
    ///
    /// # Panics
    ///
    /// If the slice lengths differ.
    pub fn sin<S>(simd: S, x: &[f32], out: &mut [f32]) {
        let scalar = Scalar::new();
        map(simd, x, out, |v| simd.sin(v), |v| scalar.sin(v));
    }
}

multiversion! {
    #[table(cos_table)]
    /// `out[i] = cos(x[i])`, absolute error below 1e-5 for `|x| <= 1e4`.
    ///
    /// # Panics
    ///
    /// If the slice lengths differ.
    pub fn cos<S>(simd: S, x: &[f32], out: &mut [f32]) {
        let scalar = Scalar::new();
        map(simd, x, out, |v| simd.cos(v), |v| scalar.cos(v));
    }
}

// =============================================================================
// Reductions
// =============================================================================

multiversion! {
    #[table(reduce_sum_table)]
    /// Sum of all elements. Summation order differs between tiers.
    pub fn reduce_sum<S>(simd: S, a: &[f32]) -> f32 {
        let lanes = S::LANES;
        let mut acc0 = simd.zero();
        let mut acc1 = simd.zero();

        let mut pairs = a.chunks_exact(2 * lanes);
        for pair in &mut pairs {
            acc0 = simd.add(acc0, simd.load_slice(pair));
            acc1 = simd.add(acc1, simd.load_slice(&pair[lanes..]));
        }
        let mut rest = pairs.remainder();
        if rest.len() >= lanes {
            acc0 = simd.add(acc0, simd.load_slice(rest));
            rest = &rest[lanes..];
        }

        let mut sum = simd.reduce_sum(simd.add(acc0, acc1));
        for &x in rest {
            sum += x;
        }
        sum
    }
}

multiversion! {
    #[table(dot_table)]
    /// Dot product of `a` and `b`.
    ///
    /// # Panics
    ///
    /// If the slice lengths differ.
    pub fn dot<S>(simd: S, a: &[f32], b: &[f32]) -> f32 {
        assert_eq!(a.len(), b.len(), "Vector dimensions must match");

        let lanes = S::LANES;
        let len = a.len();
        let step = 2 * lanes;
        let mut acc0 = simd.zero();
        let mut acc1 = simd.zero();

        let mut i = 0;
        while i + step <= len {
            acc0 = simd.mul_add(simd.load_slice(&a[i..]), simd.load_slice(&b[i..]), acc0);
            acc1 = simd.mul_add(
                simd.load_slice(&a[i + lanes..]),
                simd.load_slice(&b[i + lanes..]),
                acc1,
            );
            i += step;
        }
        if i + lanes <= len {
            acc0 = simd.mul_add(simd.load_slice(&a[i..]), simd.load_slice(&b[i..]), acc0);
            i += lanes;
        }

        let tail: f32 = a[i..].iter().zip(&b[i..]).map(|(x, y)| x * y).sum();
        simd.reduce_sum(simd.add(acc0, acc1)) + tail
    }
}
