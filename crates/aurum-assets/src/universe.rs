//! The asset universe: a fixed-capacity, open-addressed record store.
//!
//! All three record kinds share one table. Placement probes linearly from
//! the record key's 32-bit seed; probes terminate at the first empty slot,
//! and slots are never emptied once written. Two side arrays thread
//! intrusive child lists through the table: the children of an issuance are
//! its ownerships, the children of an ownership are its possessions.

use crate::cell::{AssetCell, AssetIndex, Issuance, Ownership, Possession};
use crate::error::{UniverseError, UniverseResult, ERR_AMOUNT_OUT_OF_RANGE, ERR_UNIVERSE_FULL};
use crate::iter::{OwnershipIterator, PossessionIterator};
use crate::select::{AssetIssuanceId, OwnershipSelect, PossessionSelect};
use aurum_primitives::{AssetName, PublicKey, UnitOfMeasurement, MAX_AMOUNT};
use tracing::{debug, trace};

/// Indices of the records created by a successful issuance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IssuedAsset {
    /// The issuance cell.
    pub issuance: AssetIndex,
    /// The issuer's initial ownership cell.
    pub ownership: AssetIndex,
    /// The issuer's initial possession cell.
    pub possession: AssetIndex,
}

/// Fixed-capacity store of issuance, ownership and possession records.
///
/// The universe performs no locking of its own; the concurrency shell
/// ([`AssetLedger`](crate::AssetLedger)) serializes access behind a single
/// exclusive lock.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Universe {
    cells: Vec<AssetCell>,
    first_child: Vec<Option<AssetIndex>>,
    next_sibling: Vec<Option<AssetIndex>>,
    mask: usize,
    population: usize,
}

impl Universe {
    /// Create an empty universe. Capacity must be a non-zero power of two
    /// within the addressable index range; it never changes afterwards.
    pub fn with_capacity(capacity: usize) -> UniverseResult<Self> {
        if capacity == 0 || !capacity.is_power_of_two() {
            return Err(UniverseError::BadCapacity(capacity));
        }
        if capacity > (u32::MAX as usize) + 1 {
            return Err(UniverseError::CapacityTooLarge(capacity));
        }
        Ok(Self {
            cells: vec![AssetCell::Empty; capacity],
            first_child: vec![None; capacity],
            next_sibling: vec![None; capacity],
            mask: capacity - 1,
            population: 0,
        })
    }

    /// Number of slots in the table.
    pub fn capacity(&self) -> usize {
        self.cells.len()
    }

    /// Number of occupied slots.
    pub fn population(&self) -> usize {
        self.population
    }

    /// Number of slots still available for new records.
    pub fn free_slots(&self) -> usize {
        self.capacity() - self.population
    }

    /// The cell at a given index.
    pub fn cell(&self, index: AssetIndex) -> &AssetCell {
        &self.cells[index.slot()]
    }

    /// Iterate over every slot with its index. Checkpointing and audits
    /// scan the table this way.
    pub fn iter_cells(&self) -> impl Iterator<Item = (AssetIndex, &AssetCell)> {
        self.cells
            .iter()
            .enumerate()
            .map(|(slot, cell)| (AssetIndex::new(slot), cell))
    }

    pub(crate) fn cell_at(&self, slot: usize) -> &AssetCell {
        &self.cells[slot]
    }

    pub(crate) fn mask(&self) -> usize {
        self.mask
    }

    pub(crate) fn first_child(&self, parent: AssetIndex) -> Option<AssetIndex> {
        self.first_child[parent.slot()]
    }

    pub(crate) fn next_sibling(&self, child: AssetIndex) -> Option<AssetIndex> {
        self.next_sibling[child.slot()]
    }

    // ==================== Primary lookup ====================

    /// Locate the issuance with the given issuer and name.
    pub fn find_issuance(&self, issuer: &PublicKey, name: AssetName) -> Option<AssetIndex> {
        let start = issuer.hash_seed() as usize & self.mask;
        for step in 0..=self.mask {
            let slot = (start + step) & self.mask;
            match &self.cells[slot] {
                AssetCell::Empty => return None,
                AssetCell::Issuance(issuance)
                    if issuance.name == name && issuance.public_key == *issuer =>
                {
                    return Some(AssetIndex::new(slot));
                }
                _ => {}
            }
        }
        None
    }

    /// Locate an ownership of the given issuance held by `owner`, under any
    /// managing contract.
    pub fn find_ownership(&self, issuance: AssetIndex, owner: &PublicKey) -> Option<AssetIndex> {
        self.probe_ownership(issuance, owner, None)
    }

    /// Locate a possession of the given ownership held by `possessor`,
    /// under any managing contract.
    pub fn find_possession(
        &self,
        ownership: AssetIndex,
        possessor: &PublicKey,
    ) -> Option<AssetIndex> {
        self.probe_possession(ownership, possessor, None)
    }

    pub(crate) fn probe_ownership(
        &self,
        issuance: AssetIndex,
        owner: &PublicKey,
        managing_contract: Option<u16>,
    ) -> Option<AssetIndex> {
        let start = owner.hash_seed() as usize & self.mask;
        for step in 0..=self.mask {
            let slot = (start + step) & self.mask;
            match &self.cells[slot] {
                AssetCell::Empty => return None,
                AssetCell::Ownership(ownership)
                    if ownership.issuance_index == issuance
                        && ownership.public_key == *owner
                        && managing_contract.is_none_or(|mc| ownership.managing_contract == mc) =>
                {
                    return Some(AssetIndex::new(slot));
                }
                _ => {}
            }
        }
        None
    }

    pub(crate) fn probe_possession(
        &self,
        ownership: AssetIndex,
        possessor: &PublicKey,
        managing_contract: Option<u16>,
    ) -> Option<AssetIndex> {
        let start = possessor.hash_seed() as usize & self.mask;
        for step in 0..=self.mask {
            let slot = (start + step) & self.mask;
            match &self.cells[slot] {
                AssetCell::Empty => return None,
                AssetCell::Possession(possession)
                    if possession.ownership_index == ownership
                        && possession.public_key == *possessor
                        && managing_contract.is_none_or(|mc| possession.managing_contract == mc) =>
                {
                    return Some(AssetIndex::new(slot));
                }
                _ => {}
            }
        }
        None
    }

    // ==================== Iteration ====================

    /// Enumerate ownerships of an issuance matching a selector. The caller
    /// must keep the universe locked for the iterator's lifetime.
    pub fn ownerships(
        &self,
        issuance: AssetIssuanceId,
        select: OwnershipSelect,
    ) -> OwnershipIterator<'_> {
        OwnershipIterator::new(self, issuance, select)
    }

    /// Enumerate possessions of an issuance matching ownership and
    /// possession selectors. The caller must keep the universe locked for
    /// the iterator's lifetime.
    pub fn possessions(
        &self,
        issuance: AssetIssuanceId,
        ownership: OwnershipSelect,
        possession: PossessionSelect,
    ) -> PossessionIterator<'_> {
        PossessionIterator::new(self, issuance, ownership, possession)
    }

    // ==================== Allocation ====================

    fn install(&mut self, seed: u32, cell: AssetCell) -> Option<AssetIndex> {
        let start = seed as usize & self.mask;
        for step in 0..=self.mask {
            let slot = (start + step) & self.mask;
            if self.cells[slot].is_empty() {
                self.cells[slot] = cell;
                self.population += 1;
                return Some(AssetIndex::new(slot));
            }
        }
        None
    }

    fn link_child(&mut self, parent: AssetIndex, child: AssetIndex) {
        self.next_sibling[child.slot()] = self.first_child[parent.slot()];
        self.first_child[parent.slot()] = Some(child);
    }

    fn add_ownership_shares(&mut self, index: AssetIndex, delta: i64) {
        let ownership = self.cells[index.slot()].as_ownership_mut();
        debug_assert!(ownership.is_some());
        if let Some(ownership) = ownership {
            ownership.shares += delta;
        }
    }

    fn add_possession_shares(&mut self, index: AssetIndex, delta: i64) {
        let possession = self.cells[index.slot()].as_possession_mut();
        debug_assert!(possession.is_some());
        if let Some(possession) = possession {
            possession.shares += delta;
        }
    }

    // ==================== Mutators ====================

    /// Create an issuance together with the issuer's initial ownership and
    /// possession, all probed from the issuer's seed and linked as a
    /// two-level child chain.
    ///
    /// The issuer may be zero here: contract self-issuances use the zero
    /// key. Caller-identity policy lives in the contract-facing shell.
    pub fn issue_asset(
        &mut self,
        issuer: PublicKey,
        name: AssetName,
        decimals: i8,
        unit: UnitOfMeasurement,
        shares: i64,
        managing_contract: u16,
    ) -> UniverseResult<IssuedAsset> {
        if shares <= 0 || shares > MAX_AMOUNT {
            return Err(UniverseError::InvalidShareCount(shares));
        }
        if self.find_issuance(&issuer, name).is_some() {
            return Err(UniverseError::AlreadyIssued { issuer, name });
        }
        if self.free_slots() < 3 {
            return Err(UniverseError::Full);
        }

        let seed = issuer.hash_seed();
        let issuance = self
            .install(
                seed,
                AssetCell::Issuance(Issuance {
                    public_key: issuer,
                    name,
                    decimals,
                    unit,
                }),
            )
            .ok_or(UniverseError::Full)?;
        let ownership = self
            .install(
                seed,
                AssetCell::Ownership(Ownership {
                    public_key: issuer,
                    issuance_index: issuance,
                    managing_contract,
                    shares,
                }),
            )
            .ok_or(UniverseError::Full)?;
        self.link_child(issuance, ownership);
        let possession = self
            .install(
                seed,
                AssetCell::Possession(Possession {
                    public_key: issuer,
                    ownership_index: ownership,
                    managing_contract,
                    shares,
                }),
            )
            .ok_or(UniverseError::Full)?;
        self.link_child(ownership, possession);

        debug!(%name, issuer = %issuer, shares, managing_contract, "asset issued");
        Ok(IssuedAsset {
            issuance,
            ownership,
            possession,
        })
    }

    /// Transfer both ownership and possession of `shares` shares to
    /// `new_holder`.
    ///
    /// Return protocol: on success, the share count remaining in the source
    /// possession; `shares` out of range yields [`ERR_AMOUNT_OUT_OF_RANGE`];
    /// a missing issuance/ownership/possession (which includes a managing
    /// contract other than `contract_index`) yields `-shares`; a shortfall
    /// yields the (negative) difference; no room for the destination
    /// records yields [`ERR_UNIVERSE_FULL`].
    #[allow(clippy::too_many_arguments)]
    pub fn transfer_share_ownership_and_possession(
        &mut self,
        name: AssetName,
        issuer: &PublicKey,
        owner: &PublicKey,
        possessor: &PublicKey,
        shares: i64,
        new_holder: &PublicKey,
        contract_index: u16,
    ) -> i64 {
        if shares <= 0 || shares > MAX_AMOUNT {
            return ERR_AMOUNT_OUT_OF_RANGE;
        }
        let Some(issuance) = self.find_issuance(issuer, name) else {
            return -shares;
        };
        let Some(ownership) = self.probe_ownership(issuance, owner, Some(contract_index)) else {
            return -shares;
        };
        let Some(possession) = self.probe_possession(ownership, possessor, Some(contract_index))
        else {
            return -shares;
        };
        let held = match self.cells[possession.slot()].as_possession() {
            Some(record) => record.shares,
            None => return -shares,
        };
        if held < shares {
            return held - shares;
        }

        match self.move_shares(
            ownership,
            possession,
            new_holder,
            new_holder,
            contract_index,
            contract_index,
            shares,
        ) {
            Ok(_) => {
                debug!(%name, from = %possessor, to = %new_holder, shares, "shares transferred");
                held - shares
            }
            Err(_) => ERR_UNIVERSE_FULL,
        }
    }

    /// Move `shares` shares from a source (ownership, possession) pair to
    /// the records identified by the destination keys and managing
    /// contracts, creating destination records as needed.
    ///
    /// The source possession must hold at least `shares`; callers check.
    /// Either both destination records end up in place and the counts move,
    /// or nothing is written.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn move_shares(
        &mut self,
        src_ownership: AssetIndex,
        src_possession: AssetIndex,
        dst_owner: &PublicKey,
        dst_possessor: &PublicKey,
        dst_owner_contract: u16,
        dst_possession_contract: u16,
        shares: i64,
    ) -> UniverseResult<(AssetIndex, AssetIndex)> {
        let issuance = match self.cells[src_ownership.slot()].as_ownership() {
            Some(ownership) => ownership.issuance_index,
            None => {
                return Err(UniverseError::Inconsistent(format!(
                    "cell {src_ownership} is not an ownership"
                )))
            }
        };

        let found_ownership = self.probe_ownership(issuance, dst_owner, Some(dst_owner_contract));
        let found_possession = found_ownership.and_then(|ownership| {
            self.probe_possession(ownership, dst_possessor, Some(dst_possession_contract))
        });
        let needed = match (found_ownership, found_possession) {
            (Some(_), Some(_)) => 0,
            (Some(_), None) => 1,
            (None, _) => 2,
        };
        if self.free_slots() < needed {
            return Err(UniverseError::Full);
        }

        let dst_ownership = match found_ownership {
            Some(index) => index,
            None => {
                let index = self
                    .install(
                        dst_owner.hash_seed(),
                        AssetCell::Ownership(Ownership {
                            public_key: *dst_owner,
                            issuance_index: issuance,
                            managing_contract: dst_owner_contract,
                            shares: 0,
                        }),
                    )
                    .ok_or(UniverseError::Full)?;
                self.link_child(issuance, index);
                index
            }
        };
        let dst_possession = match found_possession {
            Some(index) => index,
            None => {
                let index = self
                    .install(
                        dst_possessor.hash_seed(),
                        AssetCell::Possession(Possession {
                            public_key: *dst_possessor,
                            ownership_index: dst_ownership,
                            managing_contract: dst_possession_contract,
                            shares: 0,
                        }),
                    )
                    .ok_or(UniverseError::Full)?;
                self.link_child(dst_ownership, index);
                index
            }
        };

        self.add_possession_shares(src_possession, -shares);
        self.add_ownership_shares(src_ownership, -shares);
        self.add_ownership_shares(dst_ownership, shares);
        self.add_possession_shares(dst_possession, shares);

        trace!(
            src = %src_possession,
            dst = %dst_possession,
            shares,
            "shares moved"
        );
        Ok((dst_ownership, dst_possession))
    }

    // ==================== Consistency audit ====================

    /// Verify the structural invariants of the whole table: probe
    /// reachability and key uniqueness of every record, parent/child tags,
    /// exactly-once child-list membership, per-ownership share sums and
    /// non-negative counts.
    ///
    /// Intended for tests and diagnostics, not hot paths.
    pub fn check_consistency(&self) -> UniverseResult<()> {
        for (slot, cell) in self.cells.iter().enumerate() {
            match cell {
                AssetCell::Empty => {}
                AssetCell::Issuance(issuance) => {
                    if self
                        .find_issuance(&issuance.public_key, issuance.name)
                        .map(AssetIndex::slot)
                        != Some(slot)
                    {
                        return Err(UniverseError::Inconsistent(format!(
                            "issuance #{slot} unreachable or duplicated"
                        )));
                    }
                    self.check_children(slot, |cell| {
                        cell.as_ownership()
                            .map(|ownership| ownership.issuance_index.slot())
                    })?;
                }
                AssetCell::Ownership(ownership) => {
                    if !matches!(
                        self.cells[ownership.issuance_index.slot()],
                        AssetCell::Issuance(_)
                    ) {
                        return Err(UniverseError::Inconsistent(format!(
                            "ownership #{slot} has non-issuance parent"
                        )));
                    }
                    if self
                        .probe_ownership(
                            ownership.issuance_index,
                            &ownership.public_key,
                            Some(ownership.managing_contract),
                        )
                        .map(AssetIndex::slot)
                        != Some(slot)
                    {
                        return Err(UniverseError::Inconsistent(format!(
                            "ownership #{slot} unreachable or duplicated"
                        )));
                    }
                    if ownership.shares < 0 {
                        return Err(UniverseError::Inconsistent(format!(
                            "ownership #{slot} has negative shares"
                        )));
                    }
                    if self.list_occurrences(ownership.issuance_index.slot(), slot) != 1 {
                        return Err(UniverseError::Inconsistent(format!(
                            "ownership #{slot} not exactly once on its issuance's list"
                        )));
                    }
                    let possessed = self.check_children(slot, |cell| {
                        cell.as_possession()
                            .map(|possession| possession.ownership_index.slot())
                    })?;
                    if possessed != ownership.shares {
                        return Err(UniverseError::Inconsistent(format!(
                            "ownership #{slot} shares {} != possessed sum {possessed}",
                            ownership.shares
                        )));
                    }
                }
                AssetCell::Possession(possession) => {
                    if !matches!(
                        self.cells[possession.ownership_index.slot()],
                        AssetCell::Ownership(_)
                    ) {
                        return Err(UniverseError::Inconsistent(format!(
                            "possession #{slot} has non-ownership parent"
                        )));
                    }
                    if self
                        .probe_possession(
                            possession.ownership_index,
                            &possession.public_key,
                            Some(possession.managing_contract),
                        )
                        .map(AssetIndex::slot)
                        != Some(slot)
                    {
                        return Err(UniverseError::Inconsistent(format!(
                            "possession #{slot} unreachable or duplicated"
                        )));
                    }
                    if possession.shares < 0 {
                        return Err(UniverseError::Inconsistent(format!(
                            "possession #{slot} has negative shares"
                        )));
                    }
                    if self.list_occurrences(possession.ownership_index.slot(), slot) != 1 {
                        return Err(UniverseError::Inconsistent(format!(
                            "possession #{slot} not exactly once on its ownership's list"
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Walk a parent's child list checking every child points back at the
    /// parent via `back_link`, and return the sum of the children's shares.
    fn check_children(
        &self,
        parent: usize,
        back_link: impl Fn(&AssetCell) -> Option<usize>,
    ) -> UniverseResult<i64> {
        let mut sum = 0i64;
        let mut cursor = self.first_child[parent];
        let mut steps = 0usize;
        while let Some(index) = cursor {
            if steps > self.cells.len() {
                return Err(UniverseError::Inconsistent(format!(
                    "child list of #{parent} does not terminate"
                )));
            }
            if back_link(&self.cells[index.slot()]) != Some(parent) {
                return Err(UniverseError::Inconsistent(format!(
                    "cell {index} on child list of #{parent} does not point back"
                )));
            }
            sum += match &self.cells[index.slot()] {
                AssetCell::Ownership(ownership) => ownership.shares,
                AssetCell::Possession(possession) => possession.shares,
                _ => 0,
            };
            cursor = self.next_sibling[index.slot()];
            steps += 1;
        }
        Ok(sum)
    }

    fn list_occurrences(&self, parent: usize, child: usize) -> usize {
        let mut count = 0;
        let mut cursor = self.first_child[parent];
        let mut steps = 0usize;
        while let Some(index) = cursor {
            if steps > self.cells.len() {
                return count;
            }
            if index.slot() == child {
                count += 1;
            }
            cursor = self.next_sibling[index.slot()];
            steps += 1;
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn name(s: &str) -> AssetName {
        AssetName::from_str(s).unwrap()
    }

    fn universe() -> Universe {
        Universe::with_capacity(64).unwrap()
    }

    // ==================== Construction ====================

    #[test]
    fn test_capacity_must_be_power_of_two() {
        assert!(matches!(
            Universe::with_capacity(0),
            Err(UniverseError::BadCapacity(0))
        ));
        assert!(matches!(
            Universe::with_capacity(48),
            Err(UniverseError::BadCapacity(48))
        ));
        assert!(Universe::with_capacity(64).is_ok());
    }

    // ==================== Issuance ====================

    #[test]
    fn test_issue_and_find() {
        let mut universe = universe();
        let issuer = PublicKey::from_u64(0xA1);
        let issued = universe
            .issue_asset(issuer, name("QX"), 0, UnitOfMeasurement::NONE, 676, 1)
            .unwrap();

        assert_eq!(universe.population(), 3);
        assert_eq!(universe.find_issuance(&issuer, name("QX")), Some(issued.issuance));
        assert_eq!(
            universe.find_ownership(issued.issuance, &issuer),
            Some(issued.ownership)
        );
        assert_eq!(
            universe.find_possession(issued.ownership, &issuer),
            Some(issued.possession)
        );
        universe.check_consistency().unwrap();
    }

    #[test]
    fn test_issue_duplicate_rejected() {
        let mut universe = universe();
        let issuer = PublicKey::from_u64(0xA1);
        universe
            .issue_asset(issuer, name("QX"), 0, UnitOfMeasurement::NONE, 676, 1)
            .unwrap();
        let before = universe.clone();

        let result = universe.issue_asset(issuer, name("QX"), 0, UnitOfMeasurement::NONE, 10, 1);
        assert!(matches!(result, Err(UniverseError::AlreadyIssued { .. })));
        assert_eq!(universe, before);
    }

    #[test]
    fn test_issue_share_range() {
        let mut universe = universe();
        let issuer = PublicKey::from_u64(0xA1);
        assert!(matches!(
            universe.issue_asset(issuer, name("QX"), 0, UnitOfMeasurement::NONE, 0, 1),
            Err(UniverseError::InvalidShareCount(0))
        ));
        assert!(matches!(
            universe.issue_asset(issuer, name("QX"), 0, UnitOfMeasurement::NONE, MAX_AMOUNT + 1, 1),
            Err(UniverseError::InvalidShareCount(_))
        ));
        assert_eq!(universe.population(), 0);
    }

    #[test]
    fn test_issue_same_name_different_issuers() {
        let mut universe = universe();
        universe
            .issue_asset(PublicKey::from_u64(1), name("QX"), 0, UnitOfMeasurement::NONE, 10, 1)
            .unwrap();
        universe
            .issue_asset(PublicKey::from_u64(2), name("QX"), 0, UnitOfMeasurement::NONE, 20, 1)
            .unwrap();
        universe.check_consistency().unwrap();
    }

    #[test]
    fn test_issue_when_nearly_full() {
        // capacity 8: two issuances take 6 slots, the third cannot fit
        let mut universe = Universe::with_capacity(8).unwrap();
        universe
            .issue_asset(PublicKey::from_u64(1), name("AAA"), 0, UnitOfMeasurement::NONE, 5, 0)
            .unwrap();
        universe
            .issue_asset(PublicKey::from_u64(2), name("BBB"), 0, UnitOfMeasurement::NONE, 5, 0)
            .unwrap();
        let before = universe.clone();
        assert!(matches!(
            universe.issue_asset(PublicKey::from_u64(3), name("CCC"), 0, UnitOfMeasurement::NONE, 5, 0),
            Err(UniverseError::Full)
        ));
        assert_eq!(universe, before);
    }

    #[test]
    fn test_colliding_seeds_probe_forward() {
        let mut universe = universe();
        // same low 32 bits, different identities
        let a = PublicKey::from_u64(0x0000_0000_0000_0005);
        let b = PublicKey::from_u64(0x0001_0000_0000_0005);
        universe
            .issue_asset(a, name("AAA"), 0, UnitOfMeasurement::NONE, 10, 0)
            .unwrap();
        universe
            .issue_asset(b, name("BBB"), 0, UnitOfMeasurement::NONE, 20, 0)
            .unwrap();

        let found_a = universe.find_issuance(&a, name("AAA")).unwrap();
        let found_b = universe.find_issuance(&b, name("BBB")).unwrap();
        assert_ne!(found_a, found_b);
        assert!(universe.find_issuance(&a, name("BBB")).is_none());
        universe.check_consistency().unwrap();
    }

    // ==================== Transfer ====================

    fn issue_qx(universe: &mut Universe) -> (PublicKey, IssuedAsset) {
        let issuer = PublicKey::from_u64(0xA1);
        let issued = universe
            .issue_asset(issuer, name("QX"), 0, UnitOfMeasurement::NONE, 676, 1)
            .unwrap();
        (issuer, issued)
    }

    #[test]
    fn test_transfer_success_returns_remaining() {
        let mut universe = universe();
        let (issuer, issued) = issue_qx(&mut universe);
        let holder = PublicKey::from_u64(0xB2);

        let remaining = universe.transfer_share_ownership_and_possession(
            name("QX"),
            &issuer,
            &issuer,
            &issuer,
            100,
            &holder,
            1,
        );
        assert_eq!(remaining, 576);

        let dst_ownership = universe.find_ownership(issued.issuance, &holder).unwrap();
        let dst_possession = universe.find_possession(dst_ownership, &holder).unwrap();
        assert_eq!(universe.cell(dst_possession).as_possession().unwrap().shares, 100);
        assert_eq!(universe.cell(issued.possession).as_possession().unwrap().shares, 576);
        assert_eq!(universe.cell(issued.ownership).as_ownership().unwrap().shares, 576);
        universe.check_consistency().unwrap();
    }

    #[test]
    fn test_transfer_shortfall() {
        let mut universe = universe();
        let (issuer, _) = issue_qx(&mut universe);
        let holder = PublicKey::from_u64(0xB2);
        universe.transfer_share_ownership_and_possession(
            name("QX"), &issuer, &issuer, &issuer, 100, &holder, 1,
        );
        let before = universe.clone();

        let code = universe.transfer_share_ownership_and_possession(
            name("QX"), &issuer, &issuer, &issuer, 1000, &holder, 1,
        );
        assert_eq!(code, 576 - 1000);
        assert_eq!(universe, before);
    }

    #[test]
    fn test_transfer_missing_records() {
        let mut universe = universe();
        let (issuer, _) = issue_qx(&mut universe);
        let stranger = PublicKey::from_u64(0xC3);

        // unknown asset
        assert_eq!(
            universe.transfer_share_ownership_and_possession(
                name("NOPE"), &issuer, &issuer, &issuer, 5, &stranger, 1,
            ),
            -5
        );
        // unknown owner
        assert_eq!(
            universe.transfer_share_ownership_and_possession(
                name("QX"), &issuer, &stranger, &issuer, 5, &stranger, 1,
            ),
            -5
        );
    }

    #[test]
    fn test_transfer_wrong_managing_contract() {
        let mut universe = universe();
        let (issuer, _) = issue_qx(&mut universe);
        let holder = PublicKey::from_u64(0xB2);
        let before = universe.clone();

        // records are managed by contract 1, caller is contract 2
        assert_eq!(
            universe.transfer_share_ownership_and_possession(
                name("QX"), &issuer, &issuer, &issuer, 5, &holder, 2,
            ),
            -5
        );
        assert_eq!(universe, before);
    }

    #[test]
    fn test_transfer_amount_out_of_range() {
        let mut universe = universe();
        let (issuer, _) = issue_qx(&mut universe);
        let holder = PublicKey::from_u64(0xB2);
        assert_eq!(
            universe.transfer_share_ownership_and_possession(
                name("QX"), &issuer, &issuer, &issuer, 0, &holder, 1,
            ),
            ERR_AMOUNT_OUT_OF_RANGE
        );
        assert_eq!(
            universe.transfer_share_ownership_and_possession(
                name("QX"), &issuer, &issuer, &issuer, MAX_AMOUNT + 1, &holder, 1,
            ),
            ERR_AMOUNT_OUT_OF_RANGE
        );
    }

    #[test]
    fn test_transfer_back_reuses_records() {
        let mut universe = universe();
        let (issuer, _) = issue_qx(&mut universe);
        let holder = PublicKey::from_u64(0xB2);
        universe.transfer_share_ownership_and_possession(
            name("QX"), &issuer, &issuer, &issuer, 100, &holder, 1,
        );
        let population = universe.population();

        // moving shares back must reuse existing records
        let remaining = universe.transfer_share_ownership_and_possession(
            name("QX"), &holder, &holder, &holder, 40, &issuer, 1,
        );
        // holder is not the issuer of QX
        assert_eq!(remaining, -40);

        let remaining = universe.transfer_share_ownership_and_possession(
            name("QX"), &issuer, &holder, &holder, 40, &issuer, 1,
        );
        assert_eq!(remaining, 60);
        assert_eq!(universe.population(), population);
        universe.check_consistency().unwrap();
    }

    #[test]
    fn test_transfer_full_drain_retains_record() {
        let mut universe = universe();
        let (issuer, issued) = issue_qx(&mut universe);
        let holder = PublicKey::from_u64(0xB2);

        let remaining = universe.transfer_share_ownership_and_possession(
            name("QX"), &issuer, &issuer, &issuer, 676, &holder, 1,
        );
        assert_eq!(remaining, 0);
        // drained records stay in the table with zero shares
        assert_eq!(universe.cell(issued.possession).as_possession().unwrap().shares, 0);
        assert_eq!(universe.cell(issued.ownership).as_ownership().unwrap().shares, 0);
        universe.check_consistency().unwrap();
    }

    #[test]
    fn test_transfer_universe_full() {
        let mut universe = Universe::with_capacity(8).unwrap();
        let issuer = PublicKey::from_u64(1);
        universe
            .issue_asset(issuer, name("AAA"), 0, UnitOfMeasurement::NONE, 10, 0)
            .unwrap();
        universe
            .issue_asset(PublicKey::from_u64(2), name("BBB"), 0, UnitOfMeasurement::NONE, 10, 0)
            .unwrap();

        // 6 of 8 slots used; destination needs 2
        assert_eq!(universe.free_slots(), 2);
        let remaining = universe.transfer_share_ownership_and_possession(
            name("AAA"), &issuer, &issuer, &issuer, 4, &PublicKey::from_u64(3), 0,
        );
        assert_eq!(remaining, 6);
        universe.check_consistency().unwrap();

        // now the table is full and a fresh destination cannot fit
        let before = universe.clone();
        let code = universe.transfer_share_ownership_and_possession(
            name("AAA"), &issuer, &issuer, &issuer, 2, &PublicKey::from_u64(4), 0,
        );
        assert_eq!(code, ERR_UNIVERSE_FULL);
        assert_eq!(universe, before);
    }

    // ==================== Rights moves ====================

    #[test]
    fn test_move_shares_splits_by_managing_contract() {
        let mut universe = universe();
        let (issuer, issued) = issue_qx(&mut universe);

        // move 200 shares under managing contract 2, same holder
        let (dst_ownership, dst_possession) = universe
            .move_shares(issued.ownership, issued.possession, &issuer, &issuer, 2, 2, 200)
            .unwrap();
        assert_ne!(dst_ownership, issued.ownership);

        assert_eq!(universe.cell(issued.ownership).as_ownership().unwrap().shares, 476);
        assert_eq!(universe.cell(dst_ownership).as_ownership().unwrap().shares, 200);
        assert_eq!(universe.cell(dst_possession).as_possession().unwrap().managing_contract, 2);
        universe.check_consistency().unwrap();

        // the two ownership records only differ by managing contract
        assert_eq!(
            universe.probe_ownership(issued.issuance, &issuer, Some(1)),
            Some(issued.ownership)
        );
        assert_eq!(
            universe.probe_ownership(issued.issuance, &issuer, Some(2)),
            Some(dst_ownership)
        );
    }
}
