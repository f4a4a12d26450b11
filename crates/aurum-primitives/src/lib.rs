//! # aurum-primitives
//!
//! Primitive types for the Aurum asset ledger.
//!
//! This crate provides the fundamental value types used throughout the
//! system: 256-bit identities, packed 7-byte asset names and units of
//! measurement, and the protocol-wide constants.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod id;
mod name;

pub use id::{IdError, PublicKey};
pub use name::{AssetName, NameError, UnitOfMeasurement};

/// Maximum amount of the native currency, and therefore the largest share
/// count any single issuance or transfer may carry.
pub const MAX_AMOUNT: i64 = 1_000_000_000_000_000;

/// Number of computor identities. Every contract self-issuance has exactly
/// this many shares, which is what terminates the dividend walk.
pub const NUMBER_OF_COMPUTORS: i64 = 676;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert!(MAX_AMOUNT > NUMBER_OF_COMPUTORS);
        assert_eq!(NUMBER_OF_COMPUTORS, 676);
    }
}
