//! Dispatch configuration.
//!
//! Configuration is layered with figment: built-in defaults, then an optional
//! TOML source, then `SIMDTIER_`-prefixed environment variables.
//!
//! ```toml
//! # simdtier.toml
//! force_tier = "sse4_1"
//! ```
//!
//! ```bash
//! SIMDTIER_FORCE_TIER=avx2 cargo test
//! ```
//!
//! `force_tier` is only honored when the forced-tier hook is compiled in
//! (this crate's unit tests, or the `forced-tier` cargo feature). Release
//! builds without the feature ignore it and always select automatically.

use std::path::Path;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::tier::Tier;

/// Prefix of every environment variable read by [`DispatchConfig::load`].
pub const ENV_PREFIX: &str = "SIMDTIER_";

/// Whether this build honors [`DispatchConfig::force_tier`].
pub const FORCED_TIER_HOOK_ENABLED: bool = cfg!(any(test, feature = "forced-tier"));

/// Settings read by the instruction selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Tier to select instead of the detected one.
    ///
    /// The process aborts if the host cannot run it.
    pub force_tier: Option<Tier>,
}

impl DispatchConfig {
    /// Defaults merged with the process environment.
    #[must_use]
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Self::default())).merge(Env::prefixed(ENV_PREFIX))
    }

    /// Defaults, then the TOML file at `path` (if it exists), then the
    /// environment.
    #[must_use]
    pub fn figment_with_file(path: impl AsRef<Path>) -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    /// Extracts a configuration from any figment.
    pub fn from_figment(figment: &Figment) -> Result<Self> {
        Ok(figment.extract()?)
    }

    /// Loads the configuration from the environment.
    pub fn load() -> Result<Self> {
        Self::from_figment(&Self::figment())
    }

    /// Parses a TOML document on top of the defaults. The environment is not
    /// consulted.
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let figment = Figment::from(Serialized::defaults(Self::default())).merge(Toml::string(toml));
        Self::from_figment(&figment)
    }
}
