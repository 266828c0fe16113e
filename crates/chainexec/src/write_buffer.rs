//! Per-transaction overlay over a level snapshot.

use std::{collections::BTreeMap, fmt};

use parexec_chain_types::LogEntry;
use parexec_primitives::prelude::*;
use parexec_state::{ExecState, InertOp, StateReader};
use tracing::*;

#[derive(Clone, Debug, Default)]
struct AccountWrites {
    /// Snapshot balance, captured on first balance write.
    orig_balance: Option<U256>,
    balance: Option<U256>,
    nonce: Option<u64>,
    code: Option<Bytes>,
    storage: BTreeMap<StorageKey, StorageValue>,
}

/// Writes of one transaction, detached from the snapshot they were made on.
#[derive(Clone, Debug, Default)]
pub struct PendingWrites {
    accounts: BTreeMap<Address, AccountWrites>,
    logs: Vec<LogEntry>,
    fee: U256,
}

impl PendingWrites {
    /// Applies everything to `dst` and credits the fee to `coinbase`.
    ///
    /// Balances go in as the difference against the snapshot, so that fees
    /// credited to an account by earlier merges of the same level survive.
    /// Everything else is written as is.
    pub fn merge<D: ExecState>(self, dst: &mut D, coinbase: &Address) {
        for (addr, w) in self.accounts {
            if let (Some(orig), Some(cur)) = (w.orig_balance, w.balance) {
                if cur >= orig {
                    dst.add_balance(&addr, cur - orig);
                } else {
                    dst.sub_balance(&addr, orig - cur);
                }
            }
            if let Some(nonce) = w.nonce {
                dst.set_nonce(&addr, nonce);
            }
            if let Some(code) = w.code {
                dst.set_code(&addr, code);
            }
            for (slot, value) in w.storage {
                dst.set_storage(&addr, slot, value);
            }
        }

        for log in self.logs {
            dst.emit_log(log);
        }

        dst.pay_fee(coinbase, self.fee);
    }

    pub fn logs(&self) -> &[LogEntry] {
        &self.logs
    }
}

/// Scratch state of one transaction.  Reads fall through to the snapshot,
/// writes stay here until merged.
pub struct WriteBuffer<S> {
    snapshot: S,
    writes: PendingWrites,
}

impl<S> fmt::Debug for WriteBuffer<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteBuffer")
            .field("writes", &self.writes)
            .finish_non_exhaustive()
    }
}

impl<S: StateReader> WriteBuffer<S> {
    pub fn new(snapshot: S) -> Self {
        Self {
            snapshot,
            writes: PendingWrites::default(),
        }
    }

    /// Drops the snapshot and keeps the writes.
    pub fn detach(self) -> PendingWrites {
        self.writes
    }

    fn account(&self, addr: &Address) -> Option<&AccountWrites> {
        self.writes.accounts.get(addr)
    }

    fn account_mut(&mut self, addr: &Address) -> &mut AccountWrites {
        self.writes.accounts.entry(*addr).or_default()
    }

    fn set_balance(&mut self, addr: &Address, f: impl FnOnce(U256) -> U256) {
        let orig = self.snapshot.balance(addr);
        let w = self.account_mut(addr);
        let cur = w.balance.unwrap_or(orig);
        w.orig_balance.get_or_insert(orig);
        w.balance = Some(f(cur));
    }
}

impl<S: StateReader> StateReader for WriteBuffer<S> {
    fn balance(&self, addr: &Address) -> U256 {
        match self.account(addr).and_then(|w| w.balance) {
            Some(b) => b,
            None => self.snapshot.balance(addr),
        }
    }

    fn nonce(&self, addr: &Address) -> u64 {
        match self.account(addr).and_then(|w| w.nonce) {
            Some(n) => n,
            None => self.snapshot.nonce(addr),
        }
    }

    fn code(&self, addr: &Address) -> Bytes {
        match self.account(addr).and_then(|w| w.code.clone()) {
            Some(c) => c,
            None => self.snapshot.code(addr),
        }
    }

    fn storage(&self, addr: &Address, slot: &StorageKey) -> StorageValue {
        match self.account(addr).and_then(|w| w.storage.get(slot)) {
            Some(v) => *v,
            None => self.snapshot.storage(addr, slot),
        }
    }
}

impl<S: StateReader> ExecState for WriteBuffer<S> {
    fn committed_storage(&self, addr: &Address, slot: &StorageKey) -> StorageValue {
        self.snapshot.storage(addr, slot)
    }

    fn add_balance(&mut self, addr: &Address, amount: U256) {
        self.set_balance(addr, |b| b.wrapping_add(amount));
    }

    fn sub_balance(&mut self, addr: &Address, amount: U256) {
        self.set_balance(addr, |b| b.wrapping_sub(amount));
    }

    fn set_nonce(&mut self, addr: &Address, nonce: u64) {
        self.account_mut(addr).nonce = Some(nonce);
    }

    fn set_code(&mut self, addr: &Address, code: Bytes) {
        self.account_mut(addr).code = Some(code);
    }

    fn set_storage(&mut self, addr: &Address, slot: StorageKey, value: StorageValue) {
        self.account_mut(addr).storage.insert(slot, value);
    }

    fn emit_log(&mut self, log: LogEntry) {
        self.writes.logs.push(log);
    }

    fn pay_fee(&mut self, _coinbase: &Address, fee: U256) {
        self.writes.fee = self.writes.fee.wrapping_add(fee);
    }

    fn inert(&mut self, op: InertOp) {
        trace!(op = op.name(), "overlay ignoring inert op");
    }
}
