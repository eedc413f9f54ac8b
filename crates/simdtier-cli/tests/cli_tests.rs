//! Smoke tests for the `simdtier` binary.

use assert_cmd::Command;
use predicates::prelude::*;

fn simdtier() -> Command {
    let mut cmd = Command::cargo_bin("simdtier").expect("binary built");
    cmd.env_remove("SIMDTIER_FORCE_TIER");
    cmd
}

#[test]
fn test_info_prints_tables() {
    simdtier()
        .arg("info")
        .assert()
        .success()
        .stdout(predicate::str::contains("Feature"))
        .stdout(predicate::str::contains("AVX2+FMA3"))
        .stdout(predicate::str::contains("Selected:"));
}

#[test]
fn test_info_json_is_parseable() {
    let output = simdtier().args(["info", "--json"]).output().expect("run");
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    let tier = report["tier"].as_str().expect("tier field");
    let compiled = report["compiled_tiers"].as_array().expect("compiled_tiers field");
    assert!(compiled.iter().any(|t| t.as_str() == Some(tier)));
    assert_eq!(report["capabilities"]["scalar"], serde_json::Value::Bool(true));
    assert_eq!(
        report["index"].as_u64().and_then(|i| compiled.get(usize::try_from(i).ok()?)),
        Some(&report["tier"])
    );
    assert!(report["supported_tiers"].as_array().is_some());
}

#[test]
fn test_bench_reports_every_kernel() {
    simdtier()
        .args(["bench", "--len", "67", "--iters", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("mul_add"))
        .stdout(predicate::str::contains("reduce_sum"))
        .stdout(predicate::str::contains("scalar"))
        .stdout(predicate::str::contains("67 elements"));
}

#[test]
fn test_bench_json_has_small_deviation() {
    let output = simdtier()
        .args(["bench", "--len", "100", "--iters", "1", "--json"])
        .output()
        .expect("run");
    assert!(output.status.success());

    let rows: Vec<serde_json::Value> = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert!(rows.len() >= 10);
    for row in &rows {
        let dev = row["max_deviation"].as_f64().expect("max_deviation");
        assert!(dev <= 1e-3, "{row}");
        if row["tier"] == "scalar" {
            assert_eq!(dev, 0.0, "{row}");
        }
    }
}

#[test]
fn test_bench_rejects_zero_iterations() {
    simdtier()
        .args(["bench", "--iters", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--iters must be at least 1"));
}

#[test]
fn test_unknown_subcommand_fails() {
    simdtier().arg("frobnicate").assert().failure();
}

#[test]
fn test_info_reads_config_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("simdtier.toml");
    std::fs::write(&path, "force_tier = \"sse2\"\n").expect("write config");

    let output = simdtier()
        .args(["info", "--json", "--config"])
        .arg(&path)
        .output()
        .expect("run");
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(report["configured_force_tier"], "sse2");
    assert_eq!(report["force_tier_applied"], false);
    assert_ne!(report["forced"], true);
}

#[test]
fn test_info_labels_config_file_tier_as_not_applied() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("simdtier.toml");
    std::fs::write(&path, "force_tier = \"scalar\"\n").expect("write config");

    simdtier()
        .args(["info", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("not applied"));
}

#[test]
fn test_info_rejects_bad_config_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("simdtier.toml");
    std::fs::write(&path, "force_tier = \"mmx\"\n").expect("write config");

    simdtier()
        .args(["info", "--config"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("reading"));
}
