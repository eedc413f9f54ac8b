//! Error types for simdtier-core.
//!
//! Detection and dispatch never fail: unknown or disabled hardware degrades to
//! the scalar tier. Errors only surface at the edges of the crate (parsing,
//! configuration, aligned allocation, explicit backend requests).

use thiserror::Error;

use crate::tier::Tier;

/// simdtier error types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A tier name could not be parsed.
    #[error("Unknown instruction tier: '{0}'")]
    UnknownTier(String),

    /// Configuration could not be extracted.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A buffer layout is not representable.
    #[error("Invalid buffer layout: {len} elements aligned to {align} bytes")]
    InvalidLayout {
        /// Requested element count.
        len: usize,
        /// Requested alignment in bytes.
        align: usize,
    },

    /// The allocator returned null.
    #[error("Allocation of {bytes} bytes aligned to {align} failed")]
    AllocationFailed {
        /// Requested size in bytes.
        bytes: usize,
        /// Requested alignment in bytes.
        align: usize,
    },

    /// A tier was requested explicitly but is not compiled in or not supported by the host.
    #[error("Instruction tier {0} is not available on this host")]
    TierUnavailable(Tier),
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result type alias for simdtier operations.
pub type Result<T> = std::result::Result<T, Error>;
