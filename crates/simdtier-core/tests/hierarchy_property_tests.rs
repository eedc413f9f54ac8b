//! Property tests for the capability hierarchy and the CPUID decoder.
//!
//! Exhaustive over every combination of the twelve feature flags, and
//! randomized over raw CPUID/XCR0 register contents.

use std::cell::Cell;

use proptest::{
    prelude::{any, prop_assert, prop_assert_eq, Strategy},
    proptest,
    test_runner::{Config as ProptestConfig, FileFailurePersistence},
};
use simdtier_core::hierarchy::{resolve_tier, supported_tiers};
use simdtier_core::{
    probe_with, CapabilitySet, CpuidRegisters, CpuidSource, Feature, Tier, COMPILED_TIERS,
};

const PROBE_PROP_CASES: u32 = 1024;

const ECX_XSAVE: u32 = 1 << 26;
const ECX_OSXSAVE: u32 = 1 << 27;

fn every_flag_combination() -> impl Iterator<Item = CapabilitySet> {
    (0_u32..1 << Feature::ALL.len()).map(|mask| {
        let mut caps = CapabilitySet::baseline();
        for (bit, feature) in Feature::ALL.into_iter().enumerate() {
            caps.set(feature, mask & (1 << bit) != 0);
        }
        caps
    })
}

fn flags_subset(inner: &CapabilitySet, outer: &CapabilitySet) -> bool {
    Feature::ALL
        .into_iter()
        .all(|f| !inner.has(f) || outer.has(f))
}

#[test]
fn test_normalized_is_consistent_and_idempotent() {
    for caps in every_flag_combination() {
        let normal = caps.normalized();
        assert!(normal.check_consistency().is_ok(), "{caps:?}");
        assert_eq!(normal.normalized(), normal);
        assert!(flags_subset(&normal, &caps));
    }
}

#[test]
fn test_consistent_sets_survive_normalization() {
    for caps in every_flag_combination() {
        if caps.check_consistency().is_ok() {
            assert_eq!(caps.normalized(), caps);
        }
    }
}

#[test]
fn test_resolution_ignores_orphan_flags() {
    for caps in every_flag_combination() {
        let normal = caps.normalized();
        for tier in Tier::ALL {
            assert_eq!(caps.supports(tier), normal.supports(tier), "{tier} {caps:?}");
        }
        assert_eq!(
            resolve_tier(&caps, &Tier::ALL),
            resolve_tier(&normal, &Tier::ALL)
        );
    }
}

#[test]
fn test_resolved_tier_is_supported_and_maximal() {
    for caps in every_flag_combination() {
        let best = resolve_tier(&caps, COMPILED_TIERS);
        assert!(caps.supports(best));
        assert!(COMPILED_TIERS.contains(&best));
        for &tier in COMPILED_TIERS {
            if caps.supports(tier) {
                assert!(tier <= best, "{tier} > {best}");
            }
        }
        assert_eq!(supported_tiers(&caps, COMPILED_TIERS).last(), Some(&best));
    }
}

#[test]
fn test_clearing_a_flag_never_raises_the_tier() {
    for caps in every_flag_combination() {
        let best = resolve_tier(&caps, &Tier::ALL);
        for feature in caps.features().collect::<Vec<_>>() {
            let mut fewer = caps;
            fewer.set(feature, false);
            assert!(resolve_tier(&fewer, &Tier::ALL) <= best, "{feature} {caps:?}");
        }
    }
}

// =============================================================================
// Randomized CPUID
// =============================================================================

#[derive(Debug, Clone)]
struct RandomCpu {
    max_leaf: u32,
    leaf1: CpuidRegisters,
    leaf7: CpuidRegisters,
    xcr0: u64,
    xcr0_reads: Cell<u32>,
}

impl CpuidSource for RandomCpu {
    fn cpuid(&self, leaf: u32, _sub_leaf: u32) -> CpuidRegisters {
        match leaf {
            0 => CpuidRegisters {
                eax: self.max_leaf,
                ..CpuidRegisters::default()
            },
            1 => self.leaf1,
            7 => self.leaf7,
            _ => CpuidRegisters::default(),
        }
    }

    fn xcr0(&self) -> u64 {
        self.xcr0_reads.set(self.xcr0_reads.get() + 1);
        self.xcr0
    }
}

fn registers() -> impl Strategy<Value = CpuidRegisters> {
    (any::<u32>(), any::<u32>(), any::<u32>(), any::<u32>())
        .prop_map(|(eax, ebx, ecx, edx)| CpuidRegisters { eax, ebx, ecx, edx })
}

fn random_cpu() -> impl Strategy<Value = RandomCpu> {
    (0_u32..16, registers(), registers(), any::<u64>()).prop_map(
        |(max_leaf, leaf1, leaf7, xcr0)| RandomCpu {
            max_leaf,
            leaf1,
            leaf7,
            xcr0,
            xcr0_reads: Cell::new(0),
        },
    )
}

fn probe_proptest_config() -> ProptestConfig {
    ProptestConfig {
        cases: PROBE_PROP_CASES,
        failure_persistence: Some(Box::new(FileFailurePersistence::WithSource(
            "probe-property-regressions",
        ))),
        ..ProptestConfig::default()
    }
}

proptest! {
    #![proptest_config(probe_proptest_config())]

    #[test]
    fn test_probe_output_is_always_consistent(cpu in random_cpu()) {
        let caps = probe_with(&cpu);
        prop_assert!(caps.check_consistency().is_ok(), "{:?}", caps);
        prop_assert!(caps.scalar);
        prop_assert_eq!(caps.normalized(), caps);
    }

    #[test]
    fn test_xcr0_read_only_after_osxsave(cpu in random_cpu()) {
        let caps = probe_with(&cpu);
        let os_xsave = cpu.max_leaf >= 1
            && cpu.leaf1.ecx & ECX_XSAVE != 0
            && cpu.leaf1.ecx & ECX_OSXSAVE != 0;
        prop_assert!(cpu.xcr0_reads.get() <= 1);
        if !os_xsave {
            prop_assert_eq!(cpu.xcr0_reads.get(), 0);
            prop_assert!(!caps.avx && !caps.avx2 && !caps.avx512f);
        }
    }

    #[test]
    fn test_wide_tiers_need_os_state(cpu in random_cpu()) {
        let caps = probe_with(&cpu);
        if caps.avx {
            prop_assert_eq!(cpu.xcr0 & 0b110, 0b110);
        }
        if caps.avx512f {
            prop_assert_eq!(cpu.xcr0 & 0b1110_0110, 0b1110_0110);
        }
    }

    #[test]
    fn test_max_leaf_gates_extended_features(cpu in random_cpu()) {
        let caps = probe_with(&cpu);
        if cpu.max_leaf < 7 {
            prop_assert!(!caps.avx2 && !caps.avx2_fma3 && !caps.avx512f);
        }
        if cpu.max_leaf < 1 {
            prop_assert_eq!(caps, CapabilitySet::baseline());
        }
    }
}
