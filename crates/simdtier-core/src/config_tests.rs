//! Tests for `DispatchConfig`.

use figment::providers::{Env, Format, Serialized};
use figment::Figment;

use crate::config::{DispatchConfig, FORCED_TIER_HOOK_ENABLED};
use crate::error::Error;
use crate::tier::Tier;

/// Figment reading a test-private environment prefix, so tests never observe
/// each other's variables or the real `SIMDTIER_` ones.
fn env_figment(prefix: &str) -> Figment {
    Figment::from(Serialized::defaults(DispatchConfig::default())).merge(Env::prefixed(prefix))
}

#[test]
fn test_default_has_no_forced_tier() {
    assert_eq!(DispatchConfig::default().force_tier, None);
}

#[test]
fn test_hook_enabled_in_unit_tests() {
    assert!(FORCED_TIER_HOOK_ENABLED);
}

#[test]
fn test_toml_force_tier() {
    let config = DispatchConfig::from_toml_str(r#"force_tier = "sse4_1""#).unwrap();
    assert_eq!(config.force_tier, Some(Tier::Sse41));
}

#[test]
fn test_toml_alias() {
    let config = DispatchConfig::from_toml_str(r#"force_tier = "AVX2-FMA3""#).unwrap();
    assert_eq!(config.force_tier, Some(Tier::Avx2Fma3));
}

#[test]
fn test_empty_toml_is_default() {
    let config = DispatchConfig::from_toml_str("").unwrap();
    assert_eq!(config, DispatchConfig::default());
}

#[test]
fn test_toml_unknown_tier_is_config_error() {
    let err = DispatchConfig::from_toml_str(r#"force_tier = "mmx""#).unwrap_err();
    match err {
        Error::Config(msg) => assert!(msg.contains("mmx"), "{msg}"),
        other => panic!("expected Config error, got {other:?}"),
    }
}

#[test]
fn test_env_force_tier() {
    std::env::set_var("SIMDTIER_CFGTEST_A_FORCE_TIER", "sse2");
    let config = DispatchConfig::from_figment(&env_figment("SIMDTIER_CFGTEST_A_")).unwrap();
    std::env::remove_var("SIMDTIER_CFGTEST_A_FORCE_TIER");

    assert_eq!(config.force_tier, Some(Tier::Sse2));
}

#[test]
fn test_env_absent_is_default() {
    let config = DispatchConfig::from_figment(&env_figment("SIMDTIER_CFGTEST_B_")).unwrap();
    assert_eq!(config, DispatchConfig::default());
}

#[test]
fn test_env_overrides_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("simdtier.toml");
    std::fs::write(&path, "force_tier = \"sse\"\n").unwrap();

    let from_file: DispatchConfig = Figment::from(Serialized::defaults(DispatchConfig::default()))
        .merge(figment::providers::Toml::file(&path))
        .extract()
        .unwrap();
    assert_eq!(from_file.force_tier, Some(Tier::Sse));

    std::env::set_var("SIMDTIER_CFGTEST_C_FORCE_TIER", "sse3");
    let layered: DispatchConfig = Figment::from(Serialized::defaults(DispatchConfig::default()))
        .merge(figment::providers::Toml::file(&path))
        .merge(Env::prefixed("SIMDTIER_CFGTEST_C_"))
        .extract()
        .unwrap();
    std::env::remove_var("SIMDTIER_CFGTEST_C_FORCE_TIER");

    assert_eq!(layered.force_tier, Some(Tier::Sse3));
}

#[test]
fn test_missing_file_falls_back() {
    let figment = DispatchConfig::figment_with_file("/nonexistent/simdtier.toml");
    // The real environment may carry SIMDTIER_FORCE_TIER; only check that
    // extraction succeeds.
    assert!(DispatchConfig::from_figment(&figment).is_ok());
}
