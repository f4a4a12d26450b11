//! Ownership and possession iterators.
//!
//! Both iterators are small state machines over a borrowed universe. The
//! selector decides the traversal mode at construction: an exact holder key
//! probes the hash table (all matches sit on one contiguous run), a
//! wildcard walks the parent's child list. The caller must keep the
//! universe locked for the iterator's lifetime; enumeration never observes
//! mutations.

use crate::cell::{AssetCell, AssetIndex};
use crate::select::{AssetIssuanceId, OwnershipSelect, PossessionSelect};
use crate::universe::Universe;
use aurum_primitives::PublicKey;

/// Enumerates the ownerships of one issuance that match a selector.
///
/// Construction positions the iterator on the first match; `next` advances.
/// Once `next` has returned false the iterator stays at the end.
pub struct OwnershipIterator<'u> {
    universe: &'u Universe,
    select: OwnershipSelect,
    issuance_idx: Option<AssetIndex>,
    ownership_idx: Option<AssetIndex>,
    exhausted: bool,
}

impl<'u> OwnershipIterator<'u> {
    pub(crate) fn new(
        universe: &'u Universe,
        issuance: AssetIssuanceId,
        select: OwnershipSelect,
    ) -> Self {
        let issuance_idx = universe.find_issuance(&issuance.issuer, issuance.name);
        let mut iter = Self {
            universe,
            select,
            issuance_idx,
            ownership_idx: None,
            exhausted: issuance_idx.is_none(),
        };
        if !iter.exhausted {
            iter.next();
        }
        iter
    }

    /// Whether iteration is past the last matching record.
    pub fn reached_end(&self) -> bool {
        self.ownership_idx.is_none()
    }

    /// Advance to the next matching record. Returns true if one was found.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> bool {
        if self.exhausted {
            return false;
        }
        let found = if self.select.any_owner {
            self.next_in_list()
        } else {
            self.next_in_table()
        };
        if !found {
            self.exhausted = true;
        }
        found
    }

    // Probe mode: all records for one owner key sit on the contiguous
    // non-empty run starting at the key's seed.
    fn next_in_table(&mut self) -> bool {
        let Some(issuance_idx) = self.issuance_idx else {
            return false;
        };
        let mask = self.universe.mask();
        let start = match self.ownership_idx {
            Some(index) => (index.slot() + 1) & mask,
            None => self.select.owner.hash_seed() as usize & mask,
        };
        for step in 0..=mask {
            let slot = (start + step) & mask;
            match self.universe.cell_at(slot) {
                AssetCell::Empty => break,
                AssetCell::Ownership(ownership)
                    if ownership.issuance_index == issuance_idx
                        && ownership.public_key == self.select.owner
                        && self.select.matches_contract(ownership.managing_contract) =>
                {
                    self.ownership_idx = Some(AssetIndex::new(slot));
                    return true;
                }
                _ => {}
            }
        }
        self.ownership_idx = None;
        false
    }

    // List mode: walk the issuance's child list, filtered by managing
    // contract.
    fn next_in_list(&mut self) -> bool {
        let mut cursor = match self.ownership_idx {
            Some(index) => self.universe.next_sibling(index),
            None => self.issuance_idx.and_then(|index| self.universe.first_child(index)),
        };
        while let Some(index) = cursor {
            if let AssetCell::Ownership(ownership) = self.universe.cell(index) {
                if self.select.matches_contract(ownership.managing_contract) {
                    self.ownership_idx = Some(index);
                    return true;
                }
            }
            cursor = self.universe.next_sibling(index);
        }
        self.ownership_idx = None;
        false
    }

    /// Issuer of the iterated issuance; zero if the issuance was not found.
    pub fn issuer(&self) -> PublicKey {
        self.issuance_idx
            .and_then(|index| self.universe.cell(index).as_issuance())
            .map(|issuance| issuance.public_key)
            .unwrap_or(PublicKey::ZERO)
    }

    /// Owner of the current record; zero at the end.
    pub fn owner(&self) -> PublicKey {
        self.current()
            .map(|ownership| ownership.public_key)
            .unwrap_or(PublicKey::ZERO)
    }

    /// Share count of the current record; -1 at the end.
    pub fn number_of_owned_shares(&self) -> i64 {
        self.current().map(|ownership| ownership.shares).unwrap_or(-1)
    }

    /// Index of the current record.
    pub fn ownership_index(&self) -> Option<AssetIndex> {
        self.ownership_idx
    }

    /// Managing contract of the current record.
    pub fn ownership_managing_contract(&self) -> Option<u16> {
        self.current().map(|ownership| ownership.managing_contract)
    }

    /// Index of the iterated issuance, if it exists.
    pub fn issuance_index(&self) -> Option<AssetIndex> {
        self.issuance_idx
    }

    fn current(&self) -> Option<&crate::cell::Ownership> {
        self.ownership_idx
            .and_then(|index| self.universe.cell(index).as_ownership())
    }
}

/// Enumerates the possessions under every ownership an
/// [`OwnershipIterator`] yields.
///
/// When the possessions of the current ownership are exhausted, the
/// ownership iterator advances and the possession walk restarts.
pub struct PossessionIterator<'u> {
    ownerships: OwnershipIterator<'u>,
    select: PossessionSelect,
    possession_idx: Option<AssetIndex>,
    exhausted: bool,
}

impl<'u> PossessionIterator<'u> {
    pub(crate) fn new(
        universe: &'u Universe,
        issuance: AssetIssuanceId,
        ownership: OwnershipSelect,
        possession: PossessionSelect,
    ) -> Self {
        let ownerships = OwnershipIterator::new(universe, issuance, ownership);
        let mut iter = Self {
            exhausted: ownerships.reached_end(),
            ownerships,
            select: possession,
            possession_idx: None,
        };
        if !iter.exhausted {
            iter.next();
        }
        iter
    }

    /// Whether iteration is past the last matching record.
    pub fn reached_end(&self) -> bool {
        self.possession_idx.is_none()
    }

    /// Advance to the next matching record. Returns true if one was found.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> bool {
        if self.exhausted {
            return false;
        }
        loop {
            let found = if self.select.any_possessor {
                self.next_in_list()
            } else {
                self.next_in_table()
            };
            if found {
                return true;
            }
            self.possession_idx = None;
            if !self.ownerships.next() {
                self.exhausted = true;
                return false;
            }
        }
    }

    fn next_in_table(&mut self) -> bool {
        let Some(ownership_idx) = self.ownerships.ownership_index() else {
            return false;
        };
        let universe = self.ownerships.universe;
        let mask = universe.mask();
        let start = match self.possession_idx {
            Some(index) => (index.slot() + 1) & mask,
            None => self.select.possessor.hash_seed() as usize & mask,
        };
        for step in 0..=mask {
            let slot = (start + step) & mask;
            match universe.cell_at(slot) {
                AssetCell::Empty => break,
                AssetCell::Possession(possession)
                    if possession.ownership_index == ownership_idx
                        && possession.public_key == self.select.possessor
                        && self.select.matches_contract(possession.managing_contract) =>
                {
                    self.possession_idx = Some(AssetIndex::new(slot));
                    return true;
                }
                _ => {}
            }
        }
        self.possession_idx = None;
        false
    }

    fn next_in_list(&mut self) -> bool {
        let universe = self.ownerships.universe;
        let mut cursor = match self.possession_idx {
            Some(index) => universe.next_sibling(index),
            None => self
                .ownerships
                .ownership_index()
                .and_then(|index| universe.first_child(index)),
        };
        while let Some(index) = cursor {
            if let AssetCell::Possession(possession) = universe.cell(index) {
                if self.select.matches_contract(possession.managing_contract) {
                    self.possession_idx = Some(index);
                    return true;
                }
            }
            cursor = universe.next_sibling(index);
        }
        self.possession_idx = None;
        false
    }

    /// Issuer of the iterated issuance; zero if the issuance was not found.
    pub fn issuer(&self) -> PublicKey {
        self.ownerships.issuer()
    }

    /// Owner of the ownership the current possession belongs to.
    pub fn owner(&self) -> PublicKey {
        self.ownerships.owner()
    }

    /// Share count of the current ownership; -1 at the end.
    pub fn number_of_owned_shares(&self) -> i64 {
        self.ownerships.number_of_owned_shares()
    }

    /// Index of the current ownership record.
    pub fn ownership_index(&self) -> Option<AssetIndex> {
        self.ownerships.ownership_index()
    }

    /// Possessor of the current record; zero at the end.
    pub fn possessor(&self) -> PublicKey {
        self.current()
            .map(|possession| possession.public_key)
            .unwrap_or(PublicKey::ZERO)
    }

    /// Share count of the current record; -1 at the end.
    pub fn number_of_possessed_shares(&self) -> i64 {
        self.current().map(|possession| possession.shares).unwrap_or(-1)
    }

    /// Index of the current record.
    pub fn possession_index(&self) -> Option<AssetIndex> {
        self.possession_idx
    }

    /// Managing contract of the current record.
    pub fn possession_managing_contract(&self) -> Option<u16> {
        self.current().map(|possession| possession.managing_contract)
    }

    fn current(&self) -> Option<&crate::cell::Possession> {
        let universe = self.ownerships.universe;
        self.possession_idx
            .and_then(|index| universe.cell(index).as_possession())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::universe::Universe;
    use aurum_primitives::{AssetName, UnitOfMeasurement};
    use std::str::FromStr;

    fn name(s: &str) -> AssetName {
        AssetName::from_str(s).unwrap()
    }

    fn issuance_id(issuer: PublicKey, s: &str) -> AssetIssuanceId {
        AssetIssuanceId::new(issuer, name(s))
    }

    /// QX issued by A under contract 1, 100 shares passed to X (contract 1)
    /// and 200 to Y, whose records are then split to contract 2.
    fn sample() -> (Universe, PublicKey, PublicKey, PublicKey) {
        let mut universe = Universe::with_capacity(64).unwrap();
        let a = PublicKey::from_u64(0xA);
        let x = PublicKey::from_u64(0xB);
        let y = PublicKey::from_u64(0xC);
        universe
            .issue_asset(a, name("QX"), 0, UnitOfMeasurement::NONE, 676, 1)
            .unwrap();
        universe.transfer_share_ownership_and_possession(name("QX"), &a, &a, &a, 100, &x, 1);
        universe.transfer_share_ownership_and_possession(name("QX"), &a, &a, &a, 200, &y, 1);
        let issuance = universe.find_issuance(&a, name("QX")).unwrap();
        let ownership = universe.probe_ownership(issuance, &y, Some(1)).unwrap();
        let possession = universe.probe_possession(ownership, &y, Some(1)).unwrap();
        universe
            .move_shares(ownership, possession, &y, &y, 2, 2, 200)
            .unwrap();
        (universe, a, x, y)
    }

    // ==================== Ownership iteration ====================

    #[test]
    fn test_unknown_issuance_is_exhausted() {
        let (universe, _, _, _) = sample();
        let mut iter = universe.ownerships(
            issuance_id(PublicKey::from_u64(0xFF), "QX"),
            OwnershipSelect::any(),
        );
        assert!(iter.reached_end());
        assert!(!iter.next());
        assert_eq!(iter.number_of_owned_shares(), -1);
        assert!(iter.owner().is_zero());
    }

    #[test]
    fn test_wildcard_walks_list_order() {
        let (universe, a, x, y) = sample();
        let mut iter = universe.ownerships(issuance_id(a, "QX"), OwnershipSelect::any());

        // head insertion: latest child first
        let mut seen = Vec::new();
        while !iter.reached_end() {
            seen.push(iter.owner());
            iter.next();
        }
        assert_eq!(seen, vec![y, y, x, a]);
        assert_eq!(iter.issuer(), a);
    }

    #[test]
    fn test_wildcard_with_contract_filter() {
        let (universe, a, x, y) = sample();
        let mut iter =
            universe.ownerships(issuance_id(a, "QX"), OwnershipSelect::by_managing_contract(2));
        assert!(!iter.reached_end());
        assert_eq!(iter.owner(), y);
        assert_eq!(iter.number_of_owned_shares(), 200);
        assert_eq!(iter.ownership_managing_contract(), Some(2));
        assert!(!iter.next());
        assert!(iter.reached_end());

        let mut under_one =
            universe.ownerships(issuance_id(a, "QX"), OwnershipSelect::by_managing_contract(1));
        let mut owners = Vec::new();
        while !under_one.reached_end() {
            owners.push(under_one.owner());
            under_one.next();
        }
        // Y's contract-1 record was fully drained but remains listed
        assert_eq!(owners, vec![y, x, a]);
    }

    #[test]
    fn test_exact_owner_yields_all_contract_variants() {
        let (universe, a, _, y) = sample();
        let mut iter = universe.ownerships(issuance_id(a, "QX"), OwnershipSelect::by_owner(y));

        let mut contracts = Vec::new();
        while !iter.reached_end() {
            contracts.push(iter.ownership_managing_contract().unwrap());
            iter.next();
        }
        contracts.sort_unstable();
        assert_eq!(contracts, vec![1, 2]);
    }

    #[test]
    fn test_exact_owner_and_contract_miss() {
        let (universe, a, x, _) = sample();
        // X holds under contract 1, not 2
        let iter = universe.ownerships(issuance_id(a, "QX"), OwnershipSelect::exact(x, 2));
        assert!(iter.reached_end());
    }

    #[test]
    fn test_next_after_end_stays_at_end() {
        let (universe, a, x, _) = sample();
        let mut iter = universe.ownerships(issuance_id(a, "QX"), OwnershipSelect::by_owner(x));
        assert!(!iter.reached_end());
        while iter.next() {}
        assert!(iter.reached_end());
        assert!(!iter.next());
        assert!(!iter.next());
        assert!(iter.reached_end());
    }

    // ==================== Possession iteration ====================

    #[test]
    fn test_possession_wildcards_cover_all_records() {
        let (universe, a, _, _) = sample();
        let mut iter = universe.possessions(
            issuance_id(a, "QX"),
            OwnershipSelect::any(),
            PossessionSelect::any(),
        );

        let mut total = 0;
        let mut records = 0;
        while !iter.reached_end() {
            total += iter.number_of_possessed_shares();
            records += 1;
            iter.next();
        }
        assert_eq!(total, 676);
        // a:376, x:100, y:0 (drained), y:200
        assert_eq!(records, 4);
    }

    #[test]
    fn test_possession_exact_possessor() {
        let (universe, a, x, _) = sample();
        let mut iter = universe.possessions(
            issuance_id(a, "QX"),
            OwnershipSelect::any(),
            PossessionSelect::by_possessor(x),
        );
        assert!(!iter.reached_end());
        assert_eq!(iter.possessor(), x);
        assert_eq!(iter.number_of_possessed_shares(), 100);
        assert_eq!(iter.owner(), x);
        assert!(!iter.next());
    }

    #[test]
    fn test_possession_contract_filter() {
        let (universe, a, _, y) = sample();
        let mut iter = universe.possessions(
            issuance_id(a, "QX"),
            OwnershipSelect::any(),
            PossessionSelect::by_managing_contract(2),
        );
        assert_eq!(iter.possessor(), y);
        assert_eq!(iter.number_of_possessed_shares(), 200);
        assert_eq!(iter.possession_managing_contract(), Some(2));
        assert!(!iter.next());
        assert!(iter.reached_end());
    }

    #[test]
    fn test_possession_unknown_issuance() {
        let (universe, _, _, _) = sample();
        let mut iter = universe.possessions(
            issuance_id(PublicKey::from_u64(0xFF), "QX"),
            OwnershipSelect::any(),
            PossessionSelect::any(),
        );
        assert!(iter.reached_end());
        assert!(!iter.next());
        assert_eq!(iter.number_of_possessed_shares(), -1);
    }
}
