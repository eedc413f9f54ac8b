//! Capability hierarchy resolver.
//!
//! Ranks a [`CapabilitySet`] against a set of enabled tiers and picks the
//! best one. All functions are pure; the selector feeds them the probed
//! capabilities and [`COMPILED_TIERS`](crate::tier::COMPILED_TIERS).

use tracing::error;

use crate::capability::CapabilitySet;
use crate::tier::Tier;

/// Highest tier in `enabled` whose flag and transitive prerequisites are all
/// set in `caps`.
///
/// `enabled` need not be sorted. Falls back to [`Tier::Scalar`] when nothing
/// in it is supported, so the result is always runnable.
#[must_use]
pub fn resolve_tier(caps: &CapabilitySet, enabled: &[Tier]) -> Tier {
    enabled
        .iter()
        .copied()
        .filter(|&tier| caps.supports(tier))
        .max()
        .unwrap_or(Tier::Scalar)
}

/// Register alignment of the tier [`resolve_tier`] picks.
#[must_use]
pub fn required_alignment(caps: &CapabilitySet, enabled: &[Tier]) -> usize {
    resolve_tier(caps, enabled).alignment()
}

/// Every tier in `enabled` the host supports, ascending and deduplicated.
#[must_use]
pub fn supported_tiers(caps: &CapabilitySet, enabled: &[Tier]) -> Vec<Tier> {
    let mut tiers: Vec<Tier> = enabled
        .iter()
        .copied()
        .filter(|&tier| caps.supports(tier))
        .collect();
    tiers.sort_unstable();
    tiers.dedup();
    tiers
}

/// Checks a forced tier without side effects.
///
/// Returns `Ok(forced)` when `forced` is enabled and supported, otherwise a
/// description of why it cannot run.
pub fn check_forced_tier(
    forced: Tier,
    caps: &CapabilitySet,
    enabled: &[Tier],
) -> Result<Tier, &'static str> {
    if !enabled.contains(&forced) {
        return Err("tier is not compiled into this build");
    }
    if !caps.supports(forced) {
        return Err("tier is not supported by this host");
    }
    Ok(forced)
}

/// Accepts a forced tier or terminates the process.
///
/// Running code compiled for an unsupported instruction set is undefined
/// behavior, so an unusable forced tier is fatal rather than a fallback.
#[must_use]
pub fn enforce_forced_tier(forced: Tier, caps: &CapabilitySet, enabled: &[Tier]) -> Tier {
    match check_forced_tier(forced, caps, enabled) {
        Ok(tier) => tier,
        Err(reason) => {
            error!(tier = %forced, reason, "forced instruction tier cannot run, aborting");
            std::process::abort()
        }
    }
}
