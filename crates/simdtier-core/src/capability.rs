//! Capability flags reported by the feature probe.
//!
//! [`CapabilitySet`] holds one boolean per recognized extension. A consistent
//! set is monotone: whenever a flag is true, every prerequisite listed by
//! [`Feature::prerequisites`] is true as well.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::tier::Tier;

/// One recognized instruction-set extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    /// SSE.
    Sse,
    /// SSE2.
    Sse2,
    /// SSE3.
    Sse3,
    /// Supplemental SSE3.
    Ssse3,
    /// SSE4.1.
    #[serde(rename = "sse4_1")]
    Sse41,
    /// SSE4.2.
    #[serde(rename = "sse4_2")]
    Sse42,
    /// AVX with OS-enabled YMM state.
    Avx,
    /// Half-precision conversions.
    F16c,
    /// Fused multiply-add (FMA3).
    Fma3,
    /// AVX2.
    Avx2,
    /// AVX2 and FMA3 together.
    Avx2Fma3,
    /// AVX-512 Foundation with OS-enabled ZMM/opmask state.
    #[serde(rename = "avx512f")]
    Avx512F,
}

impl Feature {
    /// Every feature, in dependency order (prerequisites first).
    pub const ALL: [Feature; 12] = [
        Feature::Sse,
        Feature::Sse2,
        Feature::Sse3,
        Feature::Ssse3,
        Feature::Sse41,
        Feature::Sse42,
        Feature::Avx,
        Feature::F16c,
        Feature::Fma3,
        Feature::Avx2,
        Feature::Avx2Fma3,
        Feature::Avx512F,
    ];

    /// Direct prerequisites of this feature.
    #[must_use]
    pub const fn prerequisites(self) -> &'static [Feature] {
        match self {
            Feature::Sse => &[],
            Feature::Sse2 => &[Feature::Sse],
            Feature::Sse3 => &[Feature::Sse2],
            Feature::Ssse3 => &[Feature::Sse3],
            Feature::Sse41 => &[Feature::Ssse3],
            Feature::Sse42 => &[Feature::Sse41],
            Feature::Avx => &[Feature::Sse41],
            Feature::F16c | Feature::Fma3 | Feature::Avx2 => &[Feature::Avx],
            Feature::Avx2Fma3 => &[Feature::Avx2, Feature::Fma3],
            Feature::Avx512F => &[Feature::Avx2],
        }
    }

    /// Human-readable name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Feature::Sse => "SSE",
            Feature::Sse2 => "SSE2",
            Feature::Sse3 => "SSE3",
            Feature::Ssse3 => "SSSE3",
            Feature::Sse41 => "SSE4.1",
            Feature::Sse42 => "SSE4.2",
            Feature::Avx => "AVX",
            Feature::F16c => "F16C",
            Feature::Fma3 => "FMA3",
            Feature::Avx2 => "AVX2",
            Feature::Avx2Fma3 => "AVX2+FMA3",
            Feature::Avx512F => "AVX-512F",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A flag is set while one of its prerequisites is not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HierarchyViolation {
    /// The flag that is set.
    pub feature: Feature,
    /// The prerequisite that is missing.
    pub missing: Feature,
}

impl fmt::Display for HierarchyViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} is set but its prerequisite {} is not", self.feature, self.missing)
    }
}

/// Instruction-set extensions supported by the host CPU and operating system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CapabilitySet {
    /// Baseline scalar code. Always true.
    pub scalar: bool,
    /// SSE.
    pub sse: bool,
    /// SSE2.
    pub sse2: bool,
    /// SSE3.
    pub sse3: bool,
    /// SSSE3.
    pub ssse3: bool,
    /// SSE4.1.
    pub sse4_1: bool,
    /// SSE4.2.
    pub sse4_2: bool,
    /// AVX (hardware bit and OS-enabled YMM state).
    pub avx: bool,
    /// F16C.
    pub f16c: bool,
    /// FMA3.
    pub fma3: bool,
    /// AVX2.
    pub avx2: bool,
    /// AVX2 and FMA3.
    pub avx2_fma3: bool,
    /// AVX-512F (hardware bit and OS-enabled ZMM/opmask state).
    pub avx512f: bool,
}

impl Default for CapabilitySet {
    fn default() -> Self {
        Self::baseline()
    }
}

impl CapabilitySet {
    /// Only the scalar tier: what an old, virtualized or non-x86 host reports.
    #[must_use]
    pub const fn baseline() -> Self {
        Self {
            scalar: true,
            sse: false,
            sse2: false,
            sse3: false,
            ssse3: false,
            sse4_1: false,
            sse4_2: false,
            avx: false,
            f16c: false,
            fma3: false,
            avx2: false,
            avx2_fma3: false,
            avx512f: false,
        }
    }

    /// Every flag set.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            scalar: true,
            sse: true,
            sse2: true,
            sse3: true,
            ssse3: true,
            sse4_1: true,
            sse4_2: true,
            avx: true,
            f16c: true,
            fma3: true,
            avx2: true,
            avx2_fma3: true,
            avx512f: true,
        }
    }

    /// Builds a set from a list of features, leaving the rest false.
    ///
    /// No normalization happens; use [`CapabilitySet::normalized`] if the
    /// input may violate the hierarchy.
    #[must_use]
    pub fn from_features(features: &[Feature]) -> Self {
        let mut caps = Self::baseline();
        for &feature in features {
            caps.set(feature, true);
        }
        caps
    }

    /// Raw value of one flag.
    #[must_use]
    pub const fn has(&self, feature: Feature) -> bool {
        match feature {
            Feature::Sse => self.sse,
            Feature::Sse2 => self.sse2,
            Feature::Sse3 => self.sse3,
            Feature::Ssse3 => self.ssse3,
            Feature::Sse41 => self.sse4_1,
            Feature::Sse42 => self.sse4_2,
            Feature::Avx => self.avx,
            Feature::F16c => self.f16c,
            Feature::Fma3 => self.fma3,
            Feature::Avx2 => self.avx2,
            Feature::Avx2Fma3 => self.avx2_fma3,
            Feature::Avx512F => self.avx512f,
        }
    }

    /// Sets one flag.
    pub fn set(&mut self, feature: Feature, value: bool) {
        let slot = match feature {
            Feature::Sse => &mut self.sse,
            Feature::Sse2 => &mut self.sse2,
            Feature::Sse3 => &mut self.sse3,
            Feature::Ssse3 => &mut self.ssse3,
            Feature::Sse41 => &mut self.sse4_1,
            Feature::Sse42 => &mut self.sse4_2,
            Feature::Avx => &mut self.avx,
            Feature::F16c => &mut self.f16c,
            Feature::Fma3 => &mut self.fma3,
            Feature::Avx2 => &mut self.avx2,
            Feature::Avx2Fma3 => &mut self.avx2_fma3,
            Feature::Avx512F => &mut self.avx512f,
        };
        *slot = value;
    }

    /// True if `feature` and all of its transitive prerequisites are set.
    #[must_use]
    pub fn has_with_prerequisites(&self, feature: Feature) -> bool {
        self.has(feature)
            && feature
                .prerequisites()
                .iter()
                .all(|&p| self.has_with_prerequisites(p))
    }

    /// True if code compiled for `tier` may run on this host.
    #[must_use]
    pub fn supports(&self, tier: Tier) -> bool {
        match tier.feature() {
            None => self.scalar,
            Some(feature) => self.has_with_prerequisites(feature),
        }
    }

    /// Returns a copy in which every flag with a missing prerequisite is cleared.
    ///
    /// Idempotent. The result always passes [`CapabilitySet::check_consistency`].
    #[must_use]
    pub fn normalized(&self) -> Self {
        let mut out = *self;
        out.scalar = true;
        // Feature::ALL lists prerequisites first, so one pass settles the chain.
        for feature in Feature::ALL {
            let ok = feature.prerequisites().iter().all(|&p| out.has(p));
            if !ok {
                out.set(feature, false);
            }
        }
        out
    }

    /// Reports the first flag whose prerequisite is missing.
    pub fn check_consistency(&self) -> Result<(), HierarchyViolation> {
        for feature in Feature::ALL {
            if !self.has(feature) {
                continue;
            }
            if let Some(&missing) = feature.prerequisites().iter().find(|&&p| !self.has(p)) {
                return Err(HierarchyViolation { feature, missing });
            }
        }
        Ok(())
    }

    /// Features currently set, in dependency order.
    pub fn features(&self) -> impl Iterator<Item = Feature> + '_ {
        Feature::ALL.into_iter().filter(|&f| self.has(f))
    }
}
