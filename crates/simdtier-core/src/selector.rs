//! Instruction selector.
//!
//! Process-wide singleton that probes the host once, picks the best compiled
//! tier and caches the result. The first caller of any function here runs the
//! probe; concurrent first callers block until it completes and then all
//! observe the same state. After that every query is a single acquire load.
//!
//! # Forced tier
//!
//! When the forced-tier hook is compiled in (unit tests, or the
//! `forced-tier` feature), `SIMDTIER_FORCE_TIER` overrides automatic
//! selection. A forced tier the host cannot run aborts the process.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::capability::CapabilitySet;
use crate::hierarchy::resolve_tier;
use crate::probe::probe;
use crate::tier::{compiled_index, Tier, COMPILED_TIERS};

#[derive(Debug)]
struct SelectorState {
    caps: CapabilitySet,
    tier: Tier,
    index: usize,
    alignment: usize,
    forced: bool,
}

static STATE: OnceLock<SelectorState> = OnceLock::new();

#[inline]
fn state() -> &'static SelectorState {
    STATE.get_or_init(select)
}

fn select() -> SelectorState {
    let caps = probe();

    let (tier, forced) = match forced_tier(&caps) {
        Some(tier) => (tier, true),
        None => (resolve_tier(&caps, COMPILED_TIERS), false),
    };

    // resolve_tier only returns members of COMPILED_TIERS or Scalar (index 0).
    let (tier, index) = match compiled_index(tier) {
        Some(index) => (tier, index),
        None => (Tier::Scalar, 0),
    };
    let alignment = tier.alignment();

    info!(
        tier = %tier,
        index,
        alignment,
        forced,
        compiled = COMPILED_TIERS.len(),
        "instruction tier selected"
    );

    SelectorState {
        caps,
        tier,
        index,
        alignment,
        forced,
    }
}

#[cfg(any(test, feature = "forced-tier"))]
fn forced_tier(caps: &CapabilitySet) -> Option<Tier> {
    use crate::config::DispatchConfig;
    use crate::hierarchy::enforce_forced_tier;

    let config = match DispatchConfig::load() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "invalid dispatch configuration, aborting");
            std::process::abort()
        }
    };
    config
        .force_tier
        .map(|tier| enforce_forced_tier(tier, caps, COMPILED_TIERS))
}

#[cfg(not(any(test, feature = "forced-tier")))]
#[inline]
fn forced_tier(_caps: &CapabilitySet) -> Option<Tier> {
    None
}

// =============================================================================
// Queries
// =============================================================================

/// Runs detection and selection if they have not run yet.
///
/// Idempotent and thread-safe. Calling it is optional: every other query
/// initializes on demand. Useful to move the probe off a latency-sensitive
/// first call.
pub fn init() {
    let _ = state();
}

/// Whether detection has completed.
#[must_use]
pub fn is_ready() -> bool {
    STATE.get().is_some()
}

/// Capability flags of the host, probed once per process.
#[must_use]
pub fn support_info() -> &'static CapabilitySet {
    &state().caps
}

/// The selected tier.
#[must_use]
pub fn selected_tier() -> Tier {
    state().tier
}

/// Position of the selected tier in [`COMPILED_TIERS`].
///
/// Every kernel table is indexed with this value.
#[inline]
#[must_use]
pub fn selected_tier_index() -> usize {
    state().index
}

/// Byte alignment of the selected tier's register type (4, 16, 32 or 64).
///
/// Buffers passed to aligned loads and stores must honor it.
#[must_use]
pub fn required_alignment() -> usize {
    state().alignment
}

/// Serializable copy of the selector state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorSnapshot {
    /// Host capability flags.
    pub capabilities: CapabilitySet,
    /// Selected tier.
    pub tier: Tier,
    /// Position of `tier` in `compiled_tiers`.
    pub index: usize,
    /// Required alignment in bytes.
    pub alignment: usize,
    /// Tiers compiled into this build.
    pub compiled_tiers: Vec<Tier>,
    /// Whether the tier came from `SIMDTIER_FORCE_TIER`.
    pub forced: bool,
}

/// Captures the selector state, initializing it if needed.
#[must_use]
pub fn snapshot() -> SelectorSnapshot {
    let state = state();
    SelectorSnapshot {
        capabilities: state.caps,
        tier: state.tier,
        index: state.index,
        alignment: state.alignment,
        compiled_tiers: COMPILED_TIERS.to_vec(),
        forced: state.forced,
    }
}
