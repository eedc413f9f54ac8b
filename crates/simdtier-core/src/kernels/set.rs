//! Resolved kernel entries.

use std::sync::OnceLock;

use crate::error::{Error, Result};
use crate::selector::{selected_tier, support_info};
use crate::table::KernelTable;
use crate::tier::Tier;

use super::{
    add_table, cos_table, div_table, dot_table, fill_table, mul_add_table, mul_table,
    reduce_sum_table, sin_table, sub_table,
};

/// Entry type of [`fill`](super::fill).
pub type FillFn = unsafe fn(&mut [f32], f32);
/// Entry type of the element-wise binary kernels.
pub type BinaryFn = unsafe fn(&[f32], &[f32], &mut [f32]);
/// Entry type of [`mul_add`](super::mul_add).
pub type TernaryFn = unsafe fn(&[f32], &[f32], &[f32], &mut [f32]);
/// Entry type of [`reduce_sum`](super::reduce_sum).
pub type ReduceFn = unsafe fn(&[f32]) -> f32;
/// Entry type of [`dot`](super::dot).
pub type DotFn = unsafe fn(&[f32], &[f32]) -> f32;
/// Entry type of the element-wise unary kernels.
pub type UnaryFn = unsafe fn(&[f32], &mut [f32]);

/// Every built-in kernel resolved for one tier.
///
/// Only constructible for a tier the host supports, which makes its methods
/// safe. Copying the set into a hot loop skips the per-call index load.
#[derive(Debug, Clone, Copy)]
pub struct KernelSet {
    tier: Tier,
    fill: FillFn,
    add: BinaryFn,
    sub: BinaryFn,
    mul: BinaryFn,
    div: BinaryFn,
    mul_add: TernaryFn,
    reduce_sum: ReduceFn,
    dot: DotFn,
    sin: UnaryFn,
    cos: UnaryFn,
}

fn pick<F: Copy + 'static>(table: &KernelTable<F>, tier: Tier) -> Result<F> {
    table.entry(tier).ok_or(Error::TierUnavailable(tier))
}

impl KernelSet {
    fn selected() -> Self {
        Self {
            tier: selected_tier(),
            fill: fill_table().dispatch(),
            add: add_table().dispatch(),
            sub: sub_table().dispatch(),
            mul: mul_table().dispatch(),
            div: div_table().dispatch(),
            mul_add: mul_add_table().dispatch(),
            reduce_sum: reduce_sum_table().dispatch(),
            dot: dot_table().dispatch(),
            sin: sin_table().dispatch(),
            cos: cos_table().dispatch(),
        }
    }

    /// Kernels compiled for `tier`.
    ///
    /// Fails with [`Error::TierUnavailable`] when `tier` is not compiled in or
    /// the host does not support it.
    pub fn for_tier(tier: Tier) -> Result<Self> {
        if !support_info().supports(tier) {
            return Err(Error::TierUnavailable(tier));
        }
        Ok(Self {
            tier,
            fill: pick(fill_table(), tier)?,
            add: pick(add_table(), tier)?,
            sub: pick(sub_table(), tier)?,
            mul: pick(mul_table(), tier)?,
            div: pick(div_table(), tier)?,
            mul_add: pick(mul_add_table(), tier)?,
            reduce_sum: pick(reduce_sum_table(), tier)?,
            dot: pick(dot_table(), tier)?,
            sin: pick(sin_table(), tier)?,
            cos: pick(cos_table(), tier)?,
        })
    }

    /// Tier the entries were compiled for.
    #[must_use]
    pub fn tier(&self) -> Tier {
        self.tier
    }

    /// See [`fill`](super::fill).
    pub fn fill(&self, out: &mut [f32], value: f32) {
        // SAFETY: a KernelSet only exists for host-supported tiers.
        unsafe { (self.fill)(out, value) }
    }

    /// See [`add`](super::add).
    pub fn add(&self, a: &[f32], b: &[f32], out: &mut [f32]) {
        // SAFETY: a KernelSet only exists for host-supported tiers.
        unsafe { (self.add)(a, b, out) }
    }

    /// See [`sub`](super::sub).
    pub fn sub(&self, a: &[f32], b: &[f32], out: &mut [f32]) {
        // SAFETY: a KernelSet only exists for host-supported tiers.
        unsafe { (self.sub)(a, b, out) }
    }

    /// See [`mul`](super::mul).
    pub fn mul(&self, a: &[f32], b: &[f32], out: &mut [f32]) {
        // SAFETY: a KernelSet only exists for host-supported tiers.
        unsafe { (self.mul)(a, b, out) }
    }

    /// See [`div`](super::div).
    pub fn div(&self, a: &[f32], b: &[f32], out: &mut [f32]) {
        // SAFETY: a KernelSet only exists for host-supported tiers.
        unsafe { (self.div)(a, b, out) }
    }

    /// See [`mul_add`](super::mul_add).
    pub fn mul_add(&self, a: &[f32], b: &[f32], c: &[f32], out: &mut [f32]) {
        // SAFETY: a KernelSet only exists for host-supported tiers.
        unsafe { (self.mul_add)(a, b, c, out) }
    }

    /// See [`reduce_sum`](super::reduce_sum).
    #[must_use]
    pub fn reduce_sum(&self, a: &[f32]) -> f32 {
        // SAFETY: a KernelSet only exists for host-supported tiers.
        unsafe { (self.reduce_sum)(a) }
    }

    /// See [`dot`](super::dot).
    #[must_use]
    pub fn dot(&self, a: &[f32], b: &[f32]) -> f32 {
        // SAFETY: a KernelSet only exists for host-supported tiers.
        unsafe { (self.dot)(a, b) }
    }

    /// See [`sin`](super::sin).
    pub fn sin(&self, x: &[f32], out: &mut [f32]) {
        // SAFETY: a KernelSet only exists for host-supported tiers.
        unsafe { (self.sin)(x, out) }
    }

    /// See [`cos`](super::cos).
    pub fn cos(&self, x: &[f32], out: &mut [f32]) {
        // SAFETY: a KernelSet only exists for host-supported tiers.
        unsafe { (self.cos)(x, out) }
    }
}

/// Kernels of the selected tier, resolved on first use.
#[must_use]
pub fn kernel_set() -> &'static KernelSet {
    static SET: OnceLock<KernelSet> = OnceLock::new();
    SET.get_or_init(KernelSet::selected)
}
