//! Interfaces to the node subsystems surrounding the universe.
//!
//! The ledger core never owns account balances, the contract registry, the
//! action tracker or cross-contract calls; it drives them through these
//! traits. Implementations must be non-blocking and bounded: they are
//! called while the universe lock is held (hooks excepted, which run
//! outside the lock).

use aurum_primitives::{AssetName, PublicKey};

/// Index of an account in the spectrum (the per-account energy store).
pub type SpectrumIndex = usize;

/// Per-account energy balances, maintained by the spectrum subsystem.
pub trait EnergyLedger {
    /// Resolve an identity to its spectrum slot, if it has one.
    fn spectrum_index(&self, id: &PublicKey) -> Option<SpectrumIndex>;

    /// Current balance of a spectrum slot.
    fn energy(&self, index: SpectrumIndex) -> i64;

    /// Credit an identity, creating its slot if needed.
    fn increase_energy(&mut self, id: &PublicKey, amount: i64);

    /// Debit a slot. Returns false (without debiting) on insufficient
    /// balance.
    fn decrease_energy(&mut self, index: SpectrumIndex, amount: i64) -> bool;
}

/// A single native-currency transfer recorded during contract execution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuTransfer {
    /// Paying identity.
    pub source: PublicKey,
    /// Receiving identity.
    pub destination: PublicKey,
    /// Amount moved.
    pub amount: i64,
}

/// Reasons a ledger operation tells the runtime to terminate the calling
/// contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AbortCode {
    /// The action tracker has no room left for transfer records.
    TooManyActions,
}

/// Contract registry, action tracker, transfer log and abort channel of the
/// hosting node.
pub trait ContractHost {
    /// Number of registered contracts.
    fn contract_count(&self) -> u32;

    /// Self-issuance asset name of a contract, if registered.
    fn asset_name(&self, contract_index: u16) -> Option<AssetName>;

    /// Record a transfer with the action tracker. Returns false when the
    /// tracker is out of room.
    fn add_qu_transfer(&mut self, transfer: &QuTransfer) -> bool;

    /// Append a transfer to the node log.
    fn log_qu_transfer(&mut self, transfer: QuTransfer);

    /// Tell the runtime to terminate the calling contract.
    fn abort(&mut self, code: AbortCode);
}

/// Input handed to a counterparty contract's management-rights hooks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RightsTransferInput {
    /// Asset name.
    pub name: AssetName,
    /// Asset issuer.
    pub issuer: PublicKey,
    /// Owner whose records are affected.
    pub owner: PublicKey,
    /// Possessor whose records are affected.
    pub possessor: PublicKey,
    /// Number of shares whose management moves.
    pub shares: i64,
    /// Contract that will manage the ownership record afterwards.
    pub destination_owner_contract: u16,
    /// Contract that will manage the possession record afterwards.
    pub destination_possession_contract: u16,
}

/// Two-phase notification protocol for management-rights transfers.
///
/// The pre-hook may veto; the post-hook is a notification sent after the
/// records have moved. Both run outside the universe lock.
pub trait RightsHooks {
    /// Ask the counterparty to approve an acquisition, transferring the
    /// invocation reward. True means proceed.
    fn pre_acquire(
        &mut self,
        contract_index: u16,
        input: &RightsTransferInput,
        invocation_reward: i64,
    ) -> bool;

    /// Notify the counterparty that the acquisition happened.
    fn post_acquire(&mut self, contract_index: u16, input: &RightsTransferInput);

    /// Ask the counterparty to accept a release, transferring the
    /// invocation reward. True means proceed.
    fn pre_release(
        &mut self,
        contract_index: u16,
        input: &RightsTransferInput,
        invocation_reward: i64,
    ) -> bool;

    /// Notify the counterparty that the release happened.
    fn post_release(&mut self, contract_index: u16, input: &RightsTransferInput);
}
