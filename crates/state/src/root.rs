use parexec_primitives::{Keccak256, keccak256, prelude::*};

use crate::Account;

/// Commits to every non-empty account in address order.
///
/// Each account contributes its address, balance, nonce, code hash and its
/// nonzero slots in key order, with the slot count in front so that the
/// encoding stays unambiguous.
pub fn compute_state_root<'a, I>(accounts: I) -> B256
where
    I: IntoIterator<Item = (&'a Address, &'a Account)>,
{
    let mut hasher = Keccak256::new();
    for (addr, acct) in accounts {
        if acct.is_empty() {
            continue;
        }
        hasher.update(addr.as_slice());
        hasher.update(acct.balance.to_be_bytes::<32>());
        hasher.update(acct.nonce.to_be_bytes());
        hasher.update(keccak256(&acct.code).as_slice());
        hasher.update((acct.storage.len() as u64).to_be_bytes());
        for (slot, value) in &acct.storage {
            hasher.update(slot.as_slice());
            hasher.update(value.as_slice());
        }
    }
    hasher.finalize()
}
