//! # aurum-assets
//!
//! The asset universe of the Aurum ledger: a fixed-capacity record store
//! for asset issuances, ownerships and possessions, and the operations by
//! which contracts query and move shares.
//!
//! This crate provides:
//! - The open-addressed record store shared by all three record kinds
//! - Intrusive index lists threading ownerships under issuances and
//!   possessions under ownerships
//! - Selector-driven iterators with wildcard/exact matching
//! - Share transfer, management-rights transfer and dividend distribution
//! - The process-wide exclusive lock serializing all of the above
//!
//! ## Architecture
//!
//! ```text
//! +---------------------+
//! |     AssetLedger     |  <- lock + contract-facing operations
//! +---------------------+
//!            |
//! +---------------------+
//! |      Universe       |  <- cells + child lists + hash probing
//! +---------------------+
//!            |
//! +----------+----------+
//! | Iterators| Selectors|  <- enumeration under the caller-held lock
//! +----------+----------+
//! ```
//!
//! External subsystems (energy balances, contract registry, action
//! tracker, cross-contract hooks) are reached through the traits in
//! [`traits`]: the core holds no state but the universe itself.
//!
//! ## Usage
//!
//! ```
//! use aurum_assets::{AssetLedger, CallContext, Universe};
//! use aurum_primitives::PublicKey;
//!
//! let ledger = AssetLedger::new(Universe::with_capacity(1 << 10).unwrap());
//! let issuer = PublicKey::from_u64(42);
//! let ctx = CallContext {
//!     contract_index: 1,
//!     contract_id: PublicKey::from_u64(0x1000),
//!     invocator: issuer,
//!     invocation_reward: 0,
//! };
//! let issued = ledger.issue_asset(&ctx, 0x5851 /* "QX" */, issuer, 0, 676, 0);
//! assert_eq!(issued, 676);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod cell;
mod error;
mod iter;
mod ledger;
mod select;
pub mod traits;
mod universe;

pub use cell::{AssetCell, AssetIndex, Issuance, Ownership, Possession};
pub use error::{UniverseError, UniverseResult, ERR_AMOUNT_OUT_OF_RANGE, ERR_UNIVERSE_FULL};
pub use iter::{OwnershipIterator, PossessionIterator};
pub use ledger::{AssetLedger, CallContext};
pub use select::{AssetIssuanceId, OwnershipSelect, PossessionSelect};
pub use traits::{
    AbortCode, ContractHost, EnergyLedger, QuTransfer, RightsHooks, RightsTransferInput,
    SpectrumIndex,
};
pub use universe::{IssuedAsset, Universe};
