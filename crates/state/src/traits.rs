//! Narrow state interfaces.

use parexec_chain_types::LogEntry;
use parexec_primitives::prelude::*;

use crate::InertOp;

/// Point reads of account state.
pub trait StateReader {
    fn balance(&self, addr: &Address) -> U256;

    fn nonce(&self, addr: &Address) -> u64;

    /// Returns the code of the account, empty if it has none.
    fn code(&self, addr: &Address) -> Bytes;

    /// Returns the value of a slot, zero if it was never written.
    fn storage(&self, addr: &Address, slot: &StorageKey) -> StorageValue;
}

/// Read and write access used by the state transition of one transaction.
pub trait ExecState: StateReader {
    /// Value of a slot as of the start of the current transaction, ignoring
    /// any write the transaction has made.
    fn committed_storage(&self, addr: &Address, slot: &StorageKey) -> StorageValue;

    fn add_balance(&mut self, addr: &Address, amount: U256);

    fn sub_balance(&mut self, addr: &Address, amount: U256);

    fn set_nonce(&mut self, addr: &Address, nonce: u64);

    fn set_code(&mut self, addr: &Address, code: Bytes);

    /// Writes a slot.  Writing zero clears it.
    fn set_storage(&mut self, addr: &Address, slot: StorageKey, value: StorageValue);

    fn emit_log(&mut self, log: LogEntry);

    /// Credits a transaction fee to the block's coinbase.
    fn pay_fee(&mut self, coinbase: &Address, fee: U256);

    /// Accepts a capability the four transaction kinds never need.  Always a
    /// no-op.
    fn inert(&mut self, op: InertOp) {
        let _ = op;
    }
}

/// Source of immutable views that can be shared across worker threads.
pub trait SnapshotProvider {
    type Snapshot: StateReader + Clone + Send + Sync + 'static;

    /// Returns a view reflecting every write applied so far.  Later writes to
    /// `self` must not be visible through it.
    fn snapshot(&self) -> Self::Snapshot;
}

/// The state a block is executed against.
pub trait CanonicalState: ExecState + SnapshotProvider + Clone {
    /// Closes the current transaction: the pre-transaction values seen by
    /// [`ExecState::committed_storage`] move forward and empty accounts are
    /// dropped.
    fn finalize_tx(&mut self);

    /// Drains logs emitted since the last call.
    fn take_logs(&mut self) -> Vec<LogEntry>;

    fn state_root(&self) -> B256;
}
