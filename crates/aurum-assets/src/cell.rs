//! Record cells of the asset universe

use aurum_primitives::{AssetName, PublicKey, UnitOfMeasurement};
use std::fmt;

/// Typed index of a cell in the universe array.
///
/// Absence (the "no index" sentinel of the record graph) is expressed as
/// `Option<AssetIndex>`; a held value always addresses a real slot.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct AssetIndex(u32);

impl AssetIndex {
    pub(crate) fn new(slot: usize) -> Self {
        AssetIndex(slot as u32)
    }

    /// Position in the universe array.
    pub fn slot(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for AssetIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Genesis record of a named asset. Immutable after creation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Issuance {
    /// Issuer identity; zero for contract self-issuances.
    pub public_key: PublicKey,
    /// Asset name, unique per issuer.
    pub name: AssetName,
    /// Number of decimal places used when displaying amounts.
    pub decimals: i8,
    /// Unit-of-measurement code.
    pub unit: UnitOfMeasurement,
}

/// Shares held by an owner, as a child of an issuance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ownership {
    /// Owner identity.
    pub public_key: PublicKey,
    /// Parent issuance cell.
    pub issuance_index: AssetIndex,
    /// Contract empowered to transfer this record.
    pub managing_contract: u16,
    /// Owned share count; never negative.
    pub shares: i64,
}

/// Shares possessed on behalf of an ownership, as a child of that ownership.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Possession {
    /// Possessor identity.
    pub public_key: PublicKey,
    /// Parent ownership cell.
    pub ownership_index: AssetIndex,
    /// Contract empowered to transfer this record.
    pub managing_contract: u16,
    /// Possessed share count; never negative.
    pub shares: i64,
}

/// One slot of the universe array.
///
/// Slots start `Empty` and are never emptied again once written; hash
/// probes rely on that to terminate at the first `Empty` cell.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum AssetCell {
    /// Unused slot; probes terminate here.
    #[default]
    Empty,
    /// Asset genesis record.
    Issuance(Issuance),
    /// Shares held by an owner.
    Ownership(Ownership),
    /// Shares possessed on behalf of an ownership.
    Possession(Possession),
}

impl AssetCell {
    /// Whether the slot is unused.
    pub fn is_empty(&self) -> bool {
        matches!(self, AssetCell::Empty)
    }

    /// Issuance payload, if this cell is one.
    pub fn as_issuance(&self) -> Option<&Issuance> {
        match self {
            AssetCell::Issuance(issuance) => Some(issuance),
            _ => None,
        }
    }

    /// Ownership payload, if this cell is one.
    pub fn as_ownership(&self) -> Option<&Ownership> {
        match self {
            AssetCell::Ownership(ownership) => Some(ownership),
            _ => None,
        }
    }

    /// Possession payload, if this cell is one.
    pub fn as_possession(&self) -> Option<&Possession> {
        match self {
            AssetCell::Possession(possession) => Some(possession),
            _ => None,
        }
    }

    pub(crate) fn as_ownership_mut(&mut self) -> Option<&mut Ownership> {
        match self {
            AssetCell::Ownership(ownership) => Some(ownership),
            _ => None,
        }
    }

    pub(crate) fn as_possession_mut(&mut self) -> Option<&mut Possession> {
        match self {
            AssetCell::Possession(possession) => Some(possession),
            _ => None,
        }
    }
}
