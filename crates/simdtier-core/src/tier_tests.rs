//! Tests for `Tier` and the compiled tier set.

use std::str::FromStr;

use crate::error::Error;
use crate::tier::{compiled_index, widest_compiled_tier, Tier, COMPILED_TIERS, COMPILED_TIER_COUNT};

#[test]
fn test_tier_order() {
    for pair in Tier::ALL.windows(2) {
        assert!(pair[0] < pair[1]);
    }
    assert!(Tier::Avx2 < Tier::Avx2Fma3);
    assert!(Tier::Sse41 < Tier::Avx);
}

#[test]
fn test_alignment_and_lanes() {
    assert_eq!(Tier::Scalar.alignment(), 4);
    assert_eq!(Tier::Scalar.lanes_f32(), 1);
    assert_eq!(Tier::Sse3.alignment(), 16);
    assert_eq!(Tier::Sse3.lanes_f32(), 4);
    assert_eq!(Tier::Avx2Fma3.alignment(), 32);
    assert_eq!(Tier::Avx2Fma3.lanes_f32(), 8);
    assert_eq!(Tier::Avx512F.alignment(), 64);
    assert_eq!(Tier::Avx512F.lanes_f32(), 16);
}

#[test]
fn test_lanes_one_or_even() {
    for tier in Tier::ALL {
        let lanes = tier.lanes_f32();
        assert!(lanes == 1 || (lanes >= 2 && lanes % 2 == 0), "{tier}: {lanes}");
    }
}

#[test]
fn test_name_round_trip() {
    for tier in Tier::ALL {
        assert_eq!(Tier::from_str(tier.name()).unwrap(), tier);
        assert_eq!(tier.to_string(), tier.name());
    }
}

#[test]
fn test_parse_aliases() {
    assert_eq!("SSE4.1".parse::<Tier>().unwrap(), Tier::Sse41);
    assert_eq!("sse41".parse::<Tier>().unwrap(), Tier::Sse41);
    assert_eq!(" AVX2-FMA3 ".parse::<Tier>().unwrap(), Tier::Avx2Fma3);
    assert_eq!("avx512".parse::<Tier>().unwrap(), Tier::Avx512F);
    assert_eq!("none".parse::<Tier>().unwrap(), Tier::Scalar);
}

#[test]
fn test_parse_unknown() {
    assert_eq!(
        "neon".parse::<Tier>(),
        Err(Error::UnknownTier("neon".to_string()))
    );
}

#[test]
fn test_serde_uses_names() {
    assert_eq!(serde_json::to_string(&Tier::Sse41).unwrap(), "\"sse4_1\"");
    let tier: Tier = serde_json::from_str("\"avx2_fma3\"").unwrap();
    assert_eq!(tier, Tier::Avx2Fma3);
    assert!(serde_json::from_str::<Tier>("\"mmx\"").is_err());
}

#[test]
fn test_scalar_has_no_feature() {
    assert!(Tier::Scalar.feature().is_none());
    for tier in Tier::ALL.into_iter().skip(1) {
        assert!(tier.feature().is_some());
    }
}

// =============================================================================
// Compiled set
// =============================================================================

#[test]
fn test_compiled_tiers_contiguous_prefix() {
    assert_eq!(COMPILED_TIERS.len(), COMPILED_TIER_COUNT);
    assert_eq!(COMPILED_TIERS, &Tier::ALL[..COMPILED_TIER_COUNT]);
}

#[test]
fn test_compiled_index_matches_position() {
    for (i, &tier) in COMPILED_TIERS.iter().enumerate() {
        assert_eq!(compiled_index(tier), Some(i));
        assert!(tier.is_compiled());
    }
    for tier in &Tier::ALL[COMPILED_TIER_COUNT..] {
        assert_eq!(compiled_index(*tier), None);
        assert!(!tier.is_compiled());
    }
}

#[test]
fn test_widest_compiled_tier() {
    assert_eq!(widest_compiled_tier(), *COMPILED_TIERS.last().unwrap());
}

#[cfg(all(target_arch = "x86_64", feature = "tier-avx512f"))]
#[test]
fn test_default_build_compiles_every_tier() {
    assert_eq!(COMPILED_TIERS, &Tier::ALL[..]);
}

#[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
#[test]
fn test_non_x86_build_is_scalar_only() {
    assert_eq!(COMPILED_TIERS, &[Tier::Scalar]);
}
