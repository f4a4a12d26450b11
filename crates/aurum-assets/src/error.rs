//! Error types and return codes for the asset universe

use aurum_primitives::{AssetName, PublicKey, MAX_AMOUNT};
use thiserror::Error;

/// Errors from universe construction and mutation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UniverseError {
    /// Capacity must be a non-zero power of two
    #[error("capacity {0} is not a non-zero power of two")]
    BadCapacity(usize),

    /// Capacity exceeds the addressable index range
    #[error("capacity {0} exceeds the addressable range")]
    CapacityTooLarge(usize),

    /// No empty slot left for a new record
    #[error("universe is full")]
    Full,

    /// An issuance with this (issuer, name) pair already exists
    #[error("asset {name} already issued by {issuer}")]
    AlreadyIssued {
        /// Issuer of the existing record
        issuer: PublicKey,
        /// Name of the existing record
        name: AssetName,
    },

    /// Share count outside `(0, MAX_AMOUNT]`
    #[error("share count {0} out of range")]
    InvalidShareCount(i64),

    /// A consistency audit found corrupted state
    #[error("universe inconsistent: {0}")]
    Inconsistent(String),
}

/// Result type for universe operations
pub type UniverseResult<T> = Result<T, UniverseError>;

/// Transfer return code: requested amount outside `(0, MAX_AMOUNT]`.
pub const ERR_AMOUNT_OUT_OF_RANGE: i64 = -(MAX_AMOUNT + 1);

/// Transfer return code: no empty slot left for the destination records.
pub const ERR_UNIVERSE_FULL: i64 = -(MAX_AMOUNT + 2);
