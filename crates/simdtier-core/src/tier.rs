//! Instruction tiers and the compile-time tier set.
//!
//! A [`Tier`] is one selectable instruction-set level. The order of the enum is
//! the selection order: a higher tier is strictly more capable and is preferred
//! whenever the host supports it.
//!
//! Which tiers are compiled into the binary is decided by cargo features
//! (`tier-sse` .. `tier-avx512f`). Each feature pulls in the one below it, so
//! [`COMPILED_TIERS`] is always a contiguous prefix of the tier order.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::capability::Feature;
use crate::error::Error;

/// Selectable instruction-set level, ordered from least to most capable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Tier {
    /// Plain `f32` code, no vector registers. Always available.
    Scalar = 0,
    /// 128-bit SSE.
    Sse = 1,
    /// SSE2 (same register file as SSE).
    Sse2 = 2,
    /// SSE3 (horizontal add).
    Sse3 = 3,
    /// SSE4.1 (packed rounding).
    Sse41 = 4,
    /// 256-bit AVX.
    Avx = 5,
    /// AVX2 (same register file as AVX).
    Avx2 = 6,
    /// AVX2 with fused multiply-add.
    Avx2Fma3 = 7,
    /// 512-bit AVX-512 Foundation.
    Avx512F = 8,
}

impl Tier {
    /// Every tier, ascending.
    pub const ALL: [Tier; 9] = [
        Tier::Scalar,
        Tier::Sse,
        Tier::Sse2,
        Tier::Sse3,
        Tier::Sse41,
        Tier::Avx,
        Tier::Avx2,
        Tier::Avx2Fma3,
        Tier::Avx512F,
    ];

    /// Canonical lowercase name, as accepted by [`FromStr`] and serde.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Tier::Scalar => "scalar",
            Tier::Sse => "sse",
            Tier::Sse2 => "sse2",
            Tier::Sse3 => "sse3",
            Tier::Sse41 => "sse4_1",
            Tier::Avx => "avx",
            Tier::Avx2 => "avx2",
            Tier::Avx2Fma3 => "avx2_fma3",
            Tier::Avx512F => "avx512f",
        }
    }

    /// Capability flag the host must report for this tier.
    ///
    /// `None` for [`Tier::Scalar`], which has no hardware prerequisite.
    #[must_use]
    pub const fn feature(self) -> Option<Feature> {
        match self {
            Tier::Scalar => None,
            Tier::Sse => Some(Feature::Sse),
            Tier::Sse2 => Some(Feature::Sse2),
            Tier::Sse3 => Some(Feature::Sse3),
            Tier::Sse41 => Some(Feature::Sse41),
            Tier::Avx => Some(Feature::Avx),
            Tier::Avx2 => Some(Feature::Avx2),
            Tier::Avx2Fma3 => Some(Feature::Avx2Fma3),
            Tier::Avx512F => Some(Feature::Avx512F),
        }
    }

    /// Width of the tier's register type in bytes.
    #[must_use]
    pub const fn register_bytes(self) -> usize {
        match self {
            Tier::Scalar => 4,
            Tier::Sse | Tier::Sse2 | Tier::Sse3 | Tier::Sse41 => 16,
            Tier::Avx | Tier::Avx2 | Tier::Avx2Fma3 => 32,
            Tier::Avx512F => 64,
        }
    }

    /// Natural alignment of the tier's register type.
    ///
    /// Buffers meant for aligned loads at this tier must honor it.
    #[must_use]
    pub const fn alignment(self) -> usize {
        self.register_bytes()
    }

    /// Number of `f32` lanes per register.
    #[must_use]
    pub const fn lanes_f32(self) -> usize {
        self.register_bytes() / std::mem::size_of::<f32>()
    }

    /// Whether this tier is compiled into the current build.
    #[must_use]
    pub const fn is_compiled(self) -> bool {
        compiled_index(self).is_some()
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Tier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', '.'], "_");
        let tier = match normalized.as_str() {
            "scalar" | "none" => Tier::Scalar,
            "sse" => Tier::Sse,
            "sse2" => Tier::Sse2,
            "sse3" => Tier::Sse3,
            "sse4_1" | "sse41" => Tier::Sse41,
            "avx" => Tier::Avx,
            "avx2" => Tier::Avx2,
            "avx2_fma3" | "avx2_fma" | "avx2fma3" => Tier::Avx2Fma3,
            "avx512f" | "avx512_f" | "avx512" => Tier::Avx512F,
            _ => return Err(Error::UnknownTier(s.to_string())),
        };
        Ok(tier)
    }
}

impl Serialize for Tier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Tier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Compile-time tier set
// =============================================================================

/// Tiers compiled into this build, ascending.
///
/// Kernel tables hold exactly one entry per element of this slice, in this
/// order, and the selector's index is a position in it.
pub const COMPILED_TIERS: &[Tier] = &[
    Tier::Scalar,
    #[cfg(all(any(target_arch = "x86", target_arch = "x86_64"), feature = "tier-sse"))]
    Tier::Sse,
    #[cfg(all(any(target_arch = "x86", target_arch = "x86_64"), feature = "tier-sse2"))]
    Tier::Sse2,
    #[cfg(all(any(target_arch = "x86", target_arch = "x86_64"), feature = "tier-sse3"))]
    Tier::Sse3,
    #[cfg(all(any(target_arch = "x86", target_arch = "x86_64"), feature = "tier-sse41"))]
    Tier::Sse41,
    #[cfg(all(any(target_arch = "x86", target_arch = "x86_64"), feature = "tier-avx"))]
    Tier::Avx,
    #[cfg(all(any(target_arch = "x86", target_arch = "x86_64"), feature = "tier-avx2"))]
    Tier::Avx2,
    #[cfg(all(any(target_arch = "x86", target_arch = "x86_64"), feature = "tier-avx2-fma3"))]
    Tier::Avx2Fma3,
    #[cfg(all(any(target_arch = "x86", target_arch = "x86_64"), feature = "tier-avx512f"))]
    Tier::Avx512F,
];

/// Number of compiled tiers, i.e. the length of every kernel table.
pub const COMPILED_TIER_COUNT: usize = COMPILED_TIERS.len();

/// Position of `tier` in [`COMPILED_TIERS`], or `None` if it is not compiled.
#[must_use]
pub const fn compiled_index(tier: Tier) -> Option<usize> {
    let mut i = 0;
    while i < COMPILED_TIERS.len() {
        if COMPILED_TIERS[i] as u8 == tier as u8 {
            return Some(i);
        }
        i += 1;
    }
    None
}

/// Highest compiled tier.
#[must_use]
pub const fn widest_compiled_tier() -> Tier {
    COMPILED_TIERS[COMPILED_TIER_COUNT - 1]
}

// The table layout relies on these holding for every build configuration.
const _: () = {
    assert!(COMPILED_TIER_COUNT >= 1);
    assert!(COMPILED_TIERS[0] as u8 == Tier::Scalar as u8);
    let mut i = 1;
    while i < COMPILED_TIER_COUNT {
        // contiguous prefix: each compiled tier is the successor of the previous one
        assert!(COMPILED_TIERS[i] as u8 == COMPILED_TIERS[i - 1] as u8 + 1);
        i += 1;
    }
};
