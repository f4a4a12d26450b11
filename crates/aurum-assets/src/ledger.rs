//! Contract-facing surface of the asset universe.
//!
//! [`AssetLedger`] wraps the universe in the process-wide exclusive lock
//! and exposes the operations contracts call: issuance, transfer,
//! management-rights acquisition/release, dividend distribution and the
//! read-only queries. Every entry point acquires the lock for its full
//! critical section; the lock is released on every exit path by guard drop.

use crate::error::ERR_AMOUNT_OUT_OF_RANGE;
use crate::select::{AssetIssuanceId, OwnershipSelect, PossessionSelect};
use crate::traits::{
    AbortCode, ContractHost, EnergyLedger, QuTransfer, RightsHooks, RightsTransferInput,
};
use crate::universe::Universe;
use crate::AssetIndex;
use aurum_primitives::{AssetName, PublicKey, UnitOfMeasurement, MAX_AMOUNT, NUMBER_OF_COMPUTORS};
use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, warn};

/// Identity of the contract invocation driving a ledger call.
#[derive(Clone, Debug)]
pub struct CallContext {
    /// Index of the executing contract.
    pub contract_index: u16,
    /// Identity of the executing contract.
    pub contract_id: PublicKey,
    /// Identity that invoked the contract.
    pub invocator: PublicKey,
    /// Reward forwarded to counterparty pre-hooks.
    pub invocation_reward: i64,
}

/// The asset universe behind its exclusive lock.
pub struct AssetLedger {
    universe: Mutex<Universe>,
}

/// Locate the (issuance, ownership, possession) chain for records managed
/// by the given contracts.
fn locate_managed_chain(
    universe: &Universe,
    name: AssetName,
    issuer: &PublicKey,
    owner: &PublicKey,
    possessor: &PublicKey,
    owner_contract: u16,
    possession_contract: u16,
) -> Option<(AssetIndex, AssetIndex, AssetIndex)> {
    let issuance = universe.find_issuance(issuer, name)?;
    let ownership = universe.probe_ownership(issuance, owner, Some(owner_contract))?;
    let possession = universe.probe_possession(ownership, possessor, Some(possession_contract))?;
    Some((issuance, ownership, possession))
}

impl AssetLedger {
    /// Wrap a universe. Done once at node startup.
    pub fn new(universe: Universe) -> Self {
        Self {
            universe: Mutex::new(universe),
        }
    }

    /// Acquire the universe lock directly. Embedders that drive iterators
    /// themselves hold this guard for the whole enumeration.
    pub fn lock(&self) -> MutexGuard<'_, Universe> {
        self.universe.lock()
    }

    /// Run a closure under the universe lock.
    pub fn with_universe<R>(&self, f: impl FnOnce(&Universe) -> R) -> R {
        f(&self.universe.lock())
    }

    // ==================== Read-only queries ====================

    /// Whether an issuance with this issuer and (packed) name exists.
    pub fn is_asset_issued(&self, issuer: &PublicKey, name: u64) -> bool {
        let Ok(name) = AssetName::from_packed(name) else {
            return false;
        };
        self.universe.lock().find_issuance(issuer, name).is_some()
    }

    /// Sum of possessed shares over all records matching the selectors.
    pub fn number_of_shares(
        &self,
        issuance: AssetIssuanceId,
        ownership: OwnershipSelect,
        possession: PossessionSelect,
    ) -> i64 {
        let universe = self.universe.lock();
        let mut iter = universe.possessions(issuance, ownership, possession);
        let mut total = 0;
        while !iter.reached_end() {
            total += iter.number_of_possessed_shares();
            iter.next();
        }
        total
    }

    /// Shares possessed by `possessor` for `owner` under the given managing
    /// contracts; 0 when no such record exists.
    pub fn number_of_possessed_shares(
        &self,
        name: u64,
        issuer: PublicKey,
        owner: PublicKey,
        possessor: PublicKey,
        owner_contract: u16,
        possession_contract: u16,
    ) -> i64 {
        let Ok(name) = AssetName::from_packed(name) else {
            return 0;
        };
        self.number_of_shares(
            AssetIssuanceId::new(issuer, name),
            OwnershipSelect::exact(owner, owner_contract),
            PossessionSelect::exact(possessor, possession_contract),
        )
    }

    // ==================== Mutators ====================

    /// Issue a new asset. Returns the share count on success, 0 on any
    /// validation failure or duplicate.
    ///
    /// The issuer must be the executing contract or its invocator; the
    /// zero identity cannot issue through this surface.
    pub fn issue_asset(
        &self,
        ctx: &CallContext,
        name: u64,
        issuer: PublicKey,
        decimals: i8,
        shares: i64,
        unit: u64,
    ) -> i64 {
        let Ok(name) = AssetName::from_packed(name) else {
            return 0;
        };
        let Ok(unit) = UnitOfMeasurement::from_packed(unit) else {
            return 0;
        };
        if issuer.is_zero() || (issuer != ctx.contract_id && issuer != ctx.invocator) {
            return 0;
        }
        if shares <= 0 || shares > MAX_AMOUNT {
            return 0;
        }

        let mut universe = self.universe.lock();
        match universe.issue_asset(issuer, name, decimals, unit, shares, ctx.contract_index) {
            Ok(_) => shares,
            Err(error) => {
                debug!(%error, asset = %name, "asset issuance rejected");
                0
            }
        }
    }

    /// Transfer ownership and possession of `shares` shares to
    /// `new_holder`.
    ///
    /// Returns the remaining source possession count on success;
    /// [`ERR_AMOUNT_OUT_OF_RANGE`] for a share count outside the valid
    /// range; `-shares` when a record is missing or managed by another
    /// contract; the negative difference on a shortfall;
    /// [`ERR_UNIVERSE_FULL`](crate::ERR_UNIVERSE_FULL) when the destination
    /// records cannot be allocated.
    pub fn transfer_share_ownership_and_possession(
        &self,
        ctx: &CallContext,
        name: u64,
        issuer: PublicKey,
        owner: PublicKey,
        possessor: PublicKey,
        shares: i64,
        new_holder: PublicKey,
    ) -> i64 {
        if shares <= 0 || shares > MAX_AMOUNT {
            return ERR_AMOUNT_OUT_OF_RANGE;
        }
        let Ok(name) = AssetName::from_packed(name) else {
            return -shares;
        };
        self.universe.lock().transfer_share_ownership_and_possession(
            name,
            &issuer,
            &owner,
            &possessor,
            shares,
            &new_holder,
            ctx.contract_index,
        )
    }

    /// Acquire management rights over `shares` shares currently managed by
    /// the source contracts, moving them under the executing contract.
    ///
    /// Two-phase protocol: the current possession-managing contract is
    /// asked via its pre-hook (receiving the invocation reward) and may
    /// veto; on approval the records move and the post-hook is notified.
    /// Hooks run outside the universe lock, so the state is re-validated
    /// between the pre-hook and the move.
    #[allow(clippy::too_many_arguments)]
    pub fn acquire_shares<H>(
        &self,
        ctx: &CallContext,
        host: &mut H,
        name: u64,
        issuer: PublicKey,
        owner: PublicKey,
        possessor: PublicKey,
        shares: i64,
        source_owner_contract: u16,
        source_possession_contract: u16,
    ) -> bool
    where
        H: ContractHost + RightsHooks,
    {
        if shares <= 0 || shares > MAX_AMOUNT || ctx.invocation_reward < 0 {
            return false;
        }
        let Ok(name) = AssetName::from_packed(name) else {
            return false;
        };
        let counterparty = source_possession_contract;
        if u32::from(counterparty) >= host.contract_count() {
            return false;
        }

        // the records must exist with enough shares before bothering the
        // counterparty
        {
            let universe = self.universe.lock();
            let Some((_, _, possession)) = locate_managed_chain(
                &universe,
                name,
                &issuer,
                &owner,
                &possessor,
                source_owner_contract,
                source_possession_contract,
            ) else {
                return false;
            };
            let held = universe
                .cell(possession)
                .as_possession()
                .map_or(0, |record| record.shares);
            if held < shares {
                return false;
            }
        }

        let input = RightsTransferInput {
            name,
            issuer,
            owner,
            possessor,
            shares,
            destination_owner_contract: ctx.contract_index,
            destination_possession_contract: ctx.contract_index,
        };
        if !host.pre_acquire(counterparty, &input, ctx.invocation_reward) {
            return false;
        }

        // the pre-hook ran unlocked; re-validate before mutating
        let moved = {
            let mut universe = self.universe.lock();
            match locate_managed_chain(
                &universe,
                name,
                &issuer,
                &owner,
                &possessor,
                source_owner_contract,
                source_possession_contract,
            ) {
                Some((_, ownership, possession)) => {
                    let held = universe
                        .cell(possession)
                        .as_possession()
                        .map_or(0, |record| record.shares);
                    held >= shares
                        && universe
                            .move_shares(
                                ownership,
                                possession,
                                &owner,
                                &possessor,
                                ctx.contract_index,
                                ctx.contract_index,
                                shares,
                            )
                            .is_ok()
                }
                None => false,
            }
        };
        if !moved {
            warn!(asset = %name, "rights acquisition invalidated between hooks");
            return false;
        }

        host.post_acquire(counterparty, &input);
        debug!(
            asset = %name,
            owner = %owner,
            shares,
            from = source_possession_contract,
            to = ctx.contract_index,
            "management rights acquired"
        );
        true
    }

    /// Release management rights over `shares` shares managed by the
    /// executing contract to the destination contracts.
    ///
    /// Mirror of [`acquire_shares`](Self::acquire_shares): the destination
    /// possession-managing contract is the hooked counterparty and may
    /// refuse the hand-over.
    #[allow(clippy::too_many_arguments)]
    pub fn release_shares<H>(
        &self,
        ctx: &CallContext,
        host: &mut H,
        name: u64,
        issuer: PublicKey,
        owner: PublicKey,
        possessor: PublicKey,
        shares: i64,
        destination_owner_contract: u16,
        destination_possession_contract: u16,
    ) -> bool
    where
        H: ContractHost + RightsHooks,
    {
        if shares <= 0 || shares > MAX_AMOUNT || ctx.invocation_reward < 0 {
            return false;
        }
        let Ok(name) = AssetName::from_packed(name) else {
            return false;
        };
        let counterparty = destination_possession_contract;
        if u32::from(destination_owner_contract) >= host.contract_count()
            || u32::from(destination_possession_contract) >= host.contract_count()
        {
            return false;
        }

        {
            let universe = self.universe.lock();
            let Some((_, _, possession)) = locate_managed_chain(
                &universe,
                name,
                &issuer,
                &owner,
                &possessor,
                ctx.contract_index,
                ctx.contract_index,
            ) else {
                return false;
            };
            let held = universe
                .cell(possession)
                .as_possession()
                .map_or(0, |record| record.shares);
            if held < shares {
                return false;
            }
        }

        let input = RightsTransferInput {
            name,
            issuer,
            owner,
            possessor,
            shares,
            destination_owner_contract,
            destination_possession_contract,
        };
        if !host.pre_release(counterparty, &input, ctx.invocation_reward) {
            return false;
        }

        let moved = {
            let mut universe = self.universe.lock();
            match locate_managed_chain(
                &universe,
                name,
                &issuer,
                &owner,
                &possessor,
                ctx.contract_index,
                ctx.contract_index,
            ) {
                Some((_, ownership, possession)) => {
                    let held = universe
                        .cell(possession)
                        .as_possession()
                        .map_or(0, |record| record.shares);
                    held >= shares
                        && universe
                            .move_shares(
                                ownership,
                                possession,
                                &owner,
                                &possessor,
                                destination_owner_contract,
                                destination_possession_contract,
                                shares,
                            )
                            .is_ok()
                }
                None => false,
            }
        };
        if !moved {
            warn!(asset = %name, "rights release invalidated between hooks");
            return false;
        }

        host.post_release(counterparty, &input);
        debug!(
            asset = %name,
            owner = %owner,
            shares,
            from = ctx.contract_index,
            to = destination_possession_contract,
            "management rights released"
        );
        true
    }

    /// Pay `amount_per_share` to every possessor of the executing
    /// contract's self-issuance.
    ///
    /// The contract's energy is debited by `amount_per_share *
    /// NUMBER_OF_COMPUTORS` up front; the walk over the issuance's
    /// ownership and possession lists then credits each possessor in
    /// proportion to its shares, recording and logging every transfer. The
    /// walk stops once all shares have been paid. A refusing action tracker
    /// aborts the contract call.
    pub fn distribute_dividends<E>(
        &self,
        ctx: &CallContext,
        env: &mut E,
        amount_per_share: i64,
    ) -> bool
    where
        E: EnergyLedger + ContractHost,
    {
        if amount_per_share < 0 {
            return false;
        }
        let Some(total) = amount_per_share.checked_mul(NUMBER_OF_COMPUTORS) else {
            return false;
        };
        if total > MAX_AMOUNT {
            return false;
        }
        let Some(name) = env.asset_name(ctx.contract_index) else {
            return false;
        };
        let Some(index) = env.spectrum_index(&ctx.contract_id) else {
            return false;
        };
        if env.energy(index) < total {
            return false;
        }

        let universe = self.universe.lock();
        if universe.find_issuance(&PublicKey::ZERO, name).is_none() {
            return false;
        }
        if !env.decrease_energy(index, total) {
            return false;
        }

        let mut iter = universe.possessions(
            AssetIssuanceId::new(PublicKey::ZERO, name),
            OwnershipSelect::any(),
            PossessionSelect::any(),
        );
        let mut paid_shares: i64 = 0;
        while !iter.reached_end() && paid_shares < NUMBER_OF_COMPUTORS {
            let held = iter.number_of_possessed_shares();
            if held > 0 {
                let possessor = iter.possessor();
                let amount = amount_per_share * held;
                env.increase_energy(&possessor, amount);
                let transfer = QuTransfer {
                    source: ctx.contract_id,
                    destination: possessor,
                    amount,
                };
                if !env.add_qu_transfer(&transfer) {
                    env.abort(AbortCode::TooManyActions);
                    return false;
                }
                env.log_qu_transfer(transfer);
                paid_shares += held;
            }
            iter.next();
        }

        debug!(
            contract = ctx.contract_index,
            amount_per_share, total, "dividends distributed"
        );
        true
    }
}
