//! Issuance identifiers and record selectors

use aurum_primitives::{AssetName, PublicKey};

/// Identifies an issuance by issuer and name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AssetIssuanceId {
    /// Issuer identity; zero for contract self-issuances.
    pub issuer: PublicKey,
    /// Asset name.
    pub name: AssetName,
}

impl AssetIssuanceId {
    /// Create an issuance id.
    pub fn new(issuer: PublicKey, name: AssetName) -> Self {
        Self { issuer, name }
    }
}

/// Selects ownership records during iteration: wildcard or exact match on
/// owner and on managing contract.
#[derive(Clone, Copy, Debug)]
pub struct OwnershipSelect {
    /// Match any owner (walk the issuance's child list).
    pub any_owner: bool,
    /// Owner to match when `any_owner` is false.
    pub owner: PublicKey,
    /// Match any managing contract.
    pub any_managing_contract: bool,
    /// Managing contract to match when `any_managing_contract` is false.
    pub managing_contract: u16,
}

impl OwnershipSelect {
    /// Match every ownership of the issuance.
    pub fn any() -> Self {
        Self {
            any_owner: true,
            owner: PublicKey::ZERO,
            any_managing_contract: true,
            managing_contract: 0,
        }
    }

    /// Match a specific owner under any managing contract.
    pub fn by_owner(owner: PublicKey) -> Self {
        Self {
            any_owner: false,
            owner,
            any_managing_contract: true,
            managing_contract: 0,
        }
    }

    /// Match any owner under a specific managing contract.
    pub fn by_managing_contract(managing_contract: u16) -> Self {
        Self {
            any_owner: true,
            owner: PublicKey::ZERO,
            any_managing_contract: false,
            managing_contract,
        }
    }

    /// Match a specific owner under a specific managing contract.
    pub fn exact(owner: PublicKey, managing_contract: u16) -> Self {
        Self {
            any_owner: false,
            owner,
            any_managing_contract: false,
            managing_contract,
        }
    }

    pub(crate) fn matches_contract(&self, managing_contract: u16) -> bool {
        self.any_managing_contract || self.managing_contract == managing_contract
    }
}

/// Selects possession records during iteration: wildcard or exact match on
/// possessor and on managing contract.
#[derive(Clone, Copy, Debug)]
pub struct PossessionSelect {
    /// Match any possessor (walk the ownership's child list).
    pub any_possessor: bool,
    /// Possessor to match when `any_possessor` is false.
    pub possessor: PublicKey,
    /// Match any managing contract.
    pub any_managing_contract: bool,
    /// Managing contract to match when `any_managing_contract` is false.
    pub managing_contract: u16,
}

impl PossessionSelect {
    /// Match every possession of every selected ownership.
    pub fn any() -> Self {
        Self {
            any_possessor: true,
            possessor: PublicKey::ZERO,
            any_managing_contract: true,
            managing_contract: 0,
        }
    }

    /// Match a specific possessor under any managing contract.
    pub fn by_possessor(possessor: PublicKey) -> Self {
        Self {
            any_possessor: false,
            possessor,
            any_managing_contract: true,
            managing_contract: 0,
        }
    }

    /// Match any possessor under a specific managing contract.
    pub fn by_managing_contract(managing_contract: u16) -> Self {
        Self {
            any_possessor: true,
            possessor: PublicKey::ZERO,
            any_managing_contract: false,
            managing_contract,
        }
    }

    /// Match a specific possessor under a specific managing contract.
    pub fn exact(possessor: PublicKey, managing_contract: u16) -> Self {
        Self {
            any_possessor: false,
            possessor,
            any_managing_contract: false,
            managing_contract,
        }
    }

    pub(crate) fn matches_contract(&self, managing_contract: u16) -> bool {
        self.any_managing_contract || self.managing_contract == managing_contract
    }
}
