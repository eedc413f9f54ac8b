//! Tests for the instruction selector.
//!
//! The forced-tier tests re-run this test binary in a child process, because
//! the selector state is per process and an unusable forced tier aborts.

use std::process::{Command, Output};
use std::sync::{Arc, Barrier};
use std::thread;

use crate::capability::CapabilitySet;
use crate::hierarchy::{
    enforce_forced_tier, required_alignment as resolve_alignment, resolve_tier, supported_tiers,
};
use crate::selector::{
    init, is_ready, required_alignment, selected_tier, selected_tier_index, snapshot, support_info,
};
use crate::tier::{Tier, COMPILED_TIERS};

const CHILD_MARKER: &str = "SIMDTIER_SELECTOR_CHILD";

fn run_child(test_name: &str, force_tier: &str) -> Output {
    let exe = std::env::current_exe().expect("test executable path");
    Command::new(exe)
        .args([test_name, "--exact", "--nocapture", "--test-threads=1"])
        .env(CHILD_MARKER, "1")
        .env("SIMDTIER_FORCE_TIER", force_tier)
        .output()
        .expect("spawn child test process")
}

fn in_child() -> bool {
    std::env::var_os(CHILD_MARKER).is_some()
}

// =============================================================================
// Automatic selection
// =============================================================================

#[test]
fn test_init_is_idempotent() {
    init();
    assert!(is_ready());
    let tier = selected_tier();
    init();
    assert_eq!(selected_tier(), tier);
}

#[test]
fn test_selection_matches_resolver() {
    if in_child() {
        return;
    }
    let snap = snapshot();
    if snap.forced {
        // SIMDTIER_FORCE_TIER is set for the whole run.
        return;
    }
    let caps = support_info();
    assert_eq!(selected_tier(), resolve_tier(caps, COMPILED_TIERS));
    assert_eq!(required_alignment(), resolve_alignment(caps, COMPILED_TIERS));
}

#[test]
fn test_index_points_at_selected_tier() {
    let index = selected_tier_index();
    assert!(index < COMPILED_TIERS.len());
    assert_eq!(COMPILED_TIERS[index], selected_tier());
    assert_eq!(required_alignment(), selected_tier().alignment());
}

#[test]
fn test_selected_tier_is_supported() {
    let caps = support_info();
    assert!(caps.supports(selected_tier()));
    assert!(supported_tiers(caps, COMPILED_TIERS).contains(&selected_tier()));
    assert!(caps.check_consistency().is_ok());
}

#[test]
fn test_alignment_is_register_width() {
    assert!([4, 16, 32, 64].contains(&required_alignment()));
}

#[test]
fn test_snapshot_consistent_with_queries() {
    let snap = snapshot();
    assert_eq!(snap.tier, selected_tier());
    assert_eq!(snap.index, selected_tier_index());
    assert_eq!(snap.alignment, required_alignment());
    assert_eq!(&snap.capabilities, support_info());
    assert_eq!(snap.compiled_tiers, COMPILED_TIERS);
}

#[test]
fn test_snapshot_serializes() {
    let json = serde_json::to_value(snapshot()).unwrap();
    assert_eq!(json["tier"], selected_tier().name());
    assert_eq!(json["capabilities"]["scalar"], true);
    assert_eq!(json["compiled_tiers"][0], "scalar");
}

#[test]
fn test_concurrent_first_use_agrees() {
    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                (selected_tier_index(), support_info() as *const _ as usize)
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(results.windows(2).all(|w| w[0] == w[1]));
}

// =============================================================================
// Forced tier (child processes)
// =============================================================================

#[test]
fn child_select_forced_scalar() {
    if !in_child() {
        return;
    }
    let snap = snapshot();
    assert!(snap.forced);
    assert_eq!(snap.tier, Tier::Scalar);
    assert_eq!(snap.index, 0);
    assert_eq!(snap.alignment, 4);
}

#[test]
fn child_select_must_abort() {
    if !in_child() {
        return;
    }
    init();
    // Reaching this point means the forced tier was accepted.
    println!("selected {}", selected_tier());
}

#[test]
fn test_forced_scalar_is_honored() {
    if in_child() {
        return;
    }
    let output = run_child("selector_tests::child_select_forced_scalar", "scalar");
    assert!(
        output.status.success(),
        "child failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn test_unparsable_forced_tier_aborts() {
    if in_child() {
        return;
    }
    let output = run_child("selector_tests::child_select_must_abort", "not-a-tier");
    assert!(!output.status.success());
    assert!(!String::from_utf8_lossy(&output.stdout).contains("selected "));
}

#[test]
fn test_unsupported_forced_tier_aborts() {
    if in_child() {
        return;
    }
    let caps = support_info();
    let unusable = Tier::ALL
        .into_iter()
        .find(|&tier| !tier.is_compiled() || !caps.supports(tier));
    let Some(tier) = unusable else {
        // Every tier is compiled and supported on this host.
        return;
    };

    let output = run_child("selector_tests::child_select_must_abort", tier.name());
    assert!(!output.status.success(), "forcing {tier} should abort");
    assert!(!String::from_utf8_lossy(&output.stdout).contains("selected "));
}

#[test]
fn child_enforce_avx_on_baseline_cpu() {
    if !in_child() {
        return;
    }
    let tier = enforce_forced_tier(Tier::Avx, &CapabilitySet::baseline(), &Tier::ALL);
    println!("selected {tier}");
}

#[test]
fn test_forced_tier_above_simulated_cpu_aborts() {
    if in_child() {
        return;
    }
    let output = run_child("selector_tests::child_enforce_avx_on_baseline_cpu", "scalar");
    assert!(!output.status.success(), "forcing avx on a baseline cpu should abort");
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        assert_eq!(output.status.signal(), Some(6), "expected SIGABRT");
    }
    assert!(!String::from_utf8_lossy(&output.stdout).contains("selected "));
}
