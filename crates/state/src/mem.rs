//! In-memory canonical state with copy-on-write snapshots.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    fmt, mem,
    sync::Arc,
};

use parexec_chain_types::LogEntry;
use parexec_primitives::prelude::*;
use tracing::*;

use crate::{
    Account, InertOp, compute_state_root,
    traits::{CanonicalState, ExecState, SnapshotProvider, StateReader},
};

type AccountMap = BTreeMap<Address, Arc<Account>>;

fn read_account<'a>(accounts: &'a AccountMap, addr: &Address) -> Option<&'a Account> {
    accounts.get(addr).map(Arc::as_ref)
}

/// Immutable view of a [`MemState`] at the moment it was taken.
///
/// Cloning shares the underlying map.  The state only copies the map, and
/// then only the accounts it touches, when it is written while a snapshot is
/// alive.
#[derive(Clone)]
pub struct MemSnapshot {
    accounts: Arc<AccountMap>,
}

impl fmt::Debug for MemSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemSnapshot")
            .field("accounts", &self.accounts.len())
            .finish()
    }
}

impl MemSnapshot {
    pub fn account(&self, addr: &Address) -> Option<&Account> {
        read_account(&self.accounts, addr)
    }

    pub fn state_root(&self) -> B256 {
        compute_state_root(self.accounts.iter().map(|(a, acct)| (a, acct.as_ref())))
    }
}

impl StateReader for MemSnapshot {
    fn balance(&self, addr: &Address) -> U256 {
        self.account(addr).map(|a| a.balance).unwrap_or_default()
    }

    fn nonce(&self, addr: &Address) -> u64 {
        self.account(addr).map(|a| a.nonce).unwrap_or_default()
    }

    fn code(&self, addr: &Address) -> Bytes {
        self.account(addr).map(|a| a.code.clone()).unwrap_or_default()
    }

    fn storage(&self, addr: &Address, slot: &StorageKey) -> StorageValue {
        self.account(addr)
            .map(|a| a.get_storage(slot))
            .unwrap_or_default()
    }
}

/// Canonical state held entirely in memory.
#[derive(Clone, Default)]
pub struct MemState {
    accounts: Arc<AccountMap>,

    /// Pre-transaction values of slots written by the current transaction.
    committed: HashMap<(Address, StorageKey), StorageValue>,

    /// Accounts touched by the current transaction, checked for emptiness on
    /// finalize.
    touched: BTreeSet<Address>,

    logs: Vec<LogEntry>,
}

impl fmt::Debug for MemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemState")
            .field("accounts", &self.accounts.len())
            .field("pending_logs", &self.logs.len())
            .finish()
    }
}

impl MemState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a state from genesis accounts, dropping empty ones.
    pub fn from_accounts(accounts: impl IntoIterator<Item = (Address, Account)>) -> Self {
        let map = accounts
            .into_iter()
            .filter(|(_, a)| !a.is_empty())
            .map(|(addr, a)| (addr, Arc::new(a)))
            .collect();
        Self {
            accounts: Arc::new(map),
            ..Default::default()
        }
    }

    pub fn account(&self, addr: &Address) -> Option<&Account> {
        read_account(&self.accounts, addr)
    }

    /// Number of accounts currently held, including ones emptied by the
    /// current transaction.
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn accounts(&self) -> impl Iterator<Item = (&Address, &Account)> + '_ {
        self.accounts.iter().map(|(a, acct)| (a, acct.as_ref()))
    }

    fn account_mut(&mut self, addr: &Address) -> &mut Account {
        self.touched.insert(*addr);
        let map = Arc::make_mut(&mut self.accounts);
        Arc::make_mut(map.entry(*addr).or_default())
    }
}

impl StateReader for MemState {
    fn balance(&self, addr: &Address) -> U256 {
        self.account(addr).map(|a| a.balance).unwrap_or_default()
    }

    fn nonce(&self, addr: &Address) -> u64 {
        self.account(addr).map(|a| a.nonce).unwrap_or_default()
    }

    fn code(&self, addr: &Address) -> Bytes {
        self.account(addr).map(|a| a.code.clone()).unwrap_or_default()
    }

    fn storage(&self, addr: &Address, slot: &StorageKey) -> StorageValue {
        self.account(addr)
            .map(|a| a.get_storage(slot))
            .unwrap_or_default()
    }
}

impl ExecState for MemState {
    fn committed_storage(&self, addr: &Address, slot: &StorageKey) -> StorageValue {
        match self.committed.get(&(*addr, *slot)) {
            Some(v) => *v,
            None => self.storage(addr, slot),
        }
    }

    // Balances wrap so that deltas merged from overlays compose exactly.
    fn add_balance(&mut self, addr: &Address, amount: U256) {
        let acct = self.account_mut(addr);
        acct.balance = acct.balance.wrapping_add(amount);
    }

    fn sub_balance(&mut self, addr: &Address, amount: U256) {
        let acct = self.account_mut(addr);
        acct.balance = acct.balance.wrapping_sub(amount);
    }

    fn set_nonce(&mut self, addr: &Address, nonce: u64) {
        self.account_mut(addr).nonce = nonce;
    }

    fn set_code(&mut self, addr: &Address, code: Bytes) {
        self.account_mut(addr).code = code;
    }

    fn set_storage(&mut self, addr: &Address, slot: StorageKey, value: StorageValue) {
        let prev = self.storage(addr, &slot);
        self.committed.entry((*addr, slot)).or_insert(prev);
        self.account_mut(addr).put_storage(slot, value);
    }

    fn emit_log(&mut self, log: LogEntry) {
        self.logs.push(log);
    }

    fn pay_fee(&mut self, coinbase: &Address, fee: U256) {
        self.add_balance(coinbase, fee);
    }

    fn inert(&mut self, op: InertOp) {
        trace!(op = op.name(), "ignoring inert state op");
    }
}

impl SnapshotProvider for MemState {
    type Snapshot = MemSnapshot;

    fn snapshot(&self) -> MemSnapshot {
        MemSnapshot {
            accounts: Arc::clone(&self.accounts),
        }
    }
}

impl CanonicalState for MemState {
    fn finalize_tx(&mut self) {
        self.committed.clear();
        let touched = mem::take(&mut self.touched);
        let empties: Vec<Address> = touched
            .into_iter()
            .filter(|a| self.account(a).is_some_and(Account::is_empty))
            .collect();
        if !empties.is_empty() {
            let map = Arc::make_mut(&mut self.accounts);
            for addr in empties {
                map.remove(&addr);
            }
        }
    }

    fn take_logs(&mut self) -> Vec<LogEntry> {
        mem::take(&mut self.logs)
    }

    fn state_root(&self) -> B256 {
        compute_state_root(self.accounts())
    }
}
