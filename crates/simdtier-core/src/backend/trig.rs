//! Sine and cosine on top of the basic [`SimdOps`] operations.
//!
//! Range reduction by π in three parts (Cody-Waite), then an odd polynomial
//! on [-π/2, π/2]. The sign comes from the parity of the quotient.

use super::SimdOps;

/// High part of π, exact in 8 bits.
const PI_A: f32 = 3.140_625;
/// Middle part of π.
const PI_B: f32 = 9.675_025_939_941_406_25e-4;
/// Low part of π.
const PI_C: f32 = 1.509_957_990_978_376_432e-7;

const FRAC_1_PI: f32 = std::f32::consts::FRAC_1_PI;

// Taylor coefficients of sin(r) / r in r^2.
const S1: f32 = -1.0 / 6.0;
const S2: f32 = 1.0 / 120.0;
const S3: f32 = -1.0 / 5_040.0;
const S4: f32 = 1.0 / 362_880.0;
const S5: f32 = -1.0 / 39_916_800.0;

/// sin(r) for r in [-π/2, π/2].
#[inline(always)]
fn sin_poly<S: SimdOps>(simd: S, r: S::Batch) -> S::Batch {
    let z = simd.mul(r, r);
    let mut p = simd.set(S5);
    p = simd.mul_add(p, z, simd.set(S4));
    p = simd.mul_add(p, z, simd.set(S3));
    p = simd.mul_add(p, z, simd.set(S2));
    p = simd.mul_add(p, z, simd.set(S1));
    p = simd.mul_add(p, z, simd.set(1.0));
    simd.mul(p, r)
}

/// `x - h * π` with π split in three parts.
#[inline(always)]
fn reduce<S: SimdOps>(simd: S, x: S::Batch, h: S::Batch) -> S::Batch {
    let r = simd.sub(x, simd.mul(h, simd.set(PI_A)));
    let r = simd.sub(r, simd.mul(h, simd.set(PI_B)));
    simd.sub(r, simd.mul(h, simd.set(PI_C)))
}

/// `(-1)^q` for integral `q`: `1 - 2 p^2` with `p = q - 2 round(q / 2)`.
#[inline(always)]
fn parity_sign<S: SimdOps>(simd: S, q: S::Batch) -> S::Batch {
    let half = simd.round(simd.mul(q, simd.set(0.5)));
    let p = simd.sub(q, simd.add(half, half));
    let two_p2 = simd.mul(simd.set(2.0), simd.mul(p, p));
    simd.sub(simd.set(1.0), two_p2)
}

#[inline(always)]
pub(super) fn sin<S: SimdOps>(simd: S, x: S::Batch) -> S::Batch {
    let q = simd.round(simd.mul(x, simd.set(FRAC_1_PI)));
    let r = reduce(simd, x, q);
    simd.mul(parity_sign(simd, q), sin_poly(simd, r))
}

#[inline(always)]
pub(super) fn cos<S: SimdOps>(simd: S, x: S::Batch) -> S::Batch {
    // cos(x) = -(-1)^q sin(x - (q + 1/2) π)
    let q = simd.round(simd.sub(simd.mul(x, simd.set(FRAC_1_PI)), simd.set(0.5)));
    let h = simd.add(q, simd.set(0.5));
    let r = reduce(simd, x, h);
    let sign = parity_sign(simd, q);
    simd.sub(simd.zero(), simd.mul(sign, sin_poly(simd, r)))
}
