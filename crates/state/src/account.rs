use std::collections::BTreeMap;

use parexec_primitives::prelude::*;

/// Account record of the in-memory state.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Account {
    pub balance: U256,
    pub nonce: u64,
    pub code: Bytes,

    /// Only nonzero values are kept.
    pub storage: BTreeMap<StorageKey, StorageValue>,
}

impl Account {
    pub fn with_balance(balance: U256) -> Self {
        Self {
            balance,
            ..Default::default()
        }
    }

    /// An account is empty when nothing about it would survive in a state
    /// root.  Storage counts, so registries holding only slots stay alive.
    pub fn is_empty(&self) -> bool {
        self.balance.is_zero() && self.nonce == 0 && self.code.is_empty() && self.storage.is_empty()
    }

    pub fn get_storage(&self, slot: &StorageKey) -> StorageValue {
        self.storage.get(slot).copied().unwrap_or_default()
    }

    pub fn put_storage(&mut self, slot: StorageKey, value: StorageValue) {
        if value.is_zero() {
            self.storage.remove(&slot);
        } else {
            self.storage.insert(slot, value);
        }
    }
}
