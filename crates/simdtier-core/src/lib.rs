//! # simdtier core
//!
//! Runtime CPU feature detection and multi-version dispatch for `f32` SIMD
//! kernels.
//!
//! A kernel is written once against the [`SimdOps`] trait and compiled once
//! per instruction tier (scalar, SSE, SSE2, SSE3, SSE4.1, AVX, AVX2,
//! AVX2+FMA3, AVX-512F). On first use the host CPU and operating system are
//! probed, the widest supported tier is selected, and every later call goes
//! straight to that tier's code: one indexed load and one indirect call.
//!
//! ## Features
//!
//! - **CPUID + XCR0 probe**: reports what the CPU *and* the OS support
//! - **Monotone hierarchy**: a tier is only chosen with all its prerequisites
//! - **`multiversion!`**: one body, one `#[target_feature]` entry per tier
//! - **Built-in kernels**: fill, add, sub, mul, div, mul_add, reduce_sum, dot, sin, cos
//! - **Aligned buffers** sized to the selected register width
//!
//! ## Quick Start
//!
//! ```rust
//! use simdtier_core::{kernels, selected_tier, support_info};
//!
//! let a = vec![1.0_f32, 2.0, 3.0, 4.0];
//! let b = vec![5.0_f32, 6.0, 7.0, 8.0];
//!
//! let dot = kernels::dot(&a, &b);
//! assert_eq!(dot, 70.0);
//!
//! println!("running on {} (avx2: {})", selected_tier(), support_info().avx2);
//! ```
//!
//! ## Cargo features
//!
//! `tier-sse` .. `tier-avx512f` choose the widest tier compiled in (each
//! implies the ones below; default `tier-avx512f`). `forced-tier` enables the
//! `SIMDTIER_FORCE_TIER` test hook.

#![warn(missing_docs)]
// Clippy lints configured in workspace Cargo.toml [workspace.lints.clippy]
#![cfg_attr(
    test,
    allow(
        clippy::float_cmp,
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::uninlined_format_args
    )
)]

pub mod aligned;
#[cfg(test)]
mod aligned_tests;
pub mod backend;
pub mod capability;
pub mod config;
#[cfg(test)]
mod config_tests;
pub mod error;
pub mod hierarchy;
pub mod kernels;
pub mod multiversion;
pub mod probe;
pub mod selector;
#[cfg(test)]
mod selector_tests;
pub mod table;
pub mod tier;
#[cfg(test)]
mod tier_tests;

pub use aligned::AlignedBuffer;
pub use backend::{Scalar, SimdOps};
pub use capability::{CapabilitySet, Feature, HierarchyViolation};
pub use config::DispatchConfig;
pub use error::{Error, Result};
pub use kernels::{kernel_set, KernelSet};
pub use probe::{probe, probe_with, CpuidRegisters, CpuidSource, HostCpu};
pub use selector::{
    init, is_ready, required_alignment, selected_tier, selected_tier_index, snapshot,
    support_info, SelectorSnapshot,
};
pub use table::{KernelTable, KernelTableBuilder};
pub use tier::{Tier, COMPILED_TIERS};
