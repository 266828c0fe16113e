//! Static read/write footprints of transactions.

use std::collections::{BTreeMap, BTreeSet};

use parexec_chain_types::{KvPutPayload, Message, SetCodePayload, TxKind};
use parexec_primitives::{prelude::*, slots};

/// Read and write footprint of one transaction.
///
/// Accesses come at two granularities.  An address-level access stands for
/// the whole account, every slot included; a slot-level access names one
/// storage slot.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AccessSet {
    reads: BTreeSet<Address>,
    writes: BTreeSet<Address>,
    read_slots: BTreeMap<Address, BTreeSet<StorageKey>>,
    write_slots: BTreeMap<Address, BTreeSet<StorageKey>>,
}

impl AccessSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_read(&mut self, addr: Address) {
        self.reads.insert(addr);
    }

    pub fn add_write(&mut self, addr: Address) {
        self.writes.insert(addr);
    }

    pub fn add_read_slot(&mut self, addr: Address, slot: StorageKey) {
        self.read_slots.entry(addr).or_default().insert(slot);
    }

    pub fn add_write_slot(&mut self, addr: Address, slot: StorageKey) {
        self.write_slots.entry(addr).or_default().insert(slot);
    }

    pub fn reads(&self) -> &BTreeSet<Address> {
        &self.reads
    }

    pub fn writes(&self) -> &BTreeSet<Address> {
        &self.writes
    }

    pub fn read_slots(&self) -> &BTreeMap<Address, BTreeSet<StorageKey>> {
        &self.read_slots
    }

    pub fn write_slots(&self) -> &BTreeMap<Address, BTreeSet<StorageKey>> {
        &self.write_slots
    }

    /// Whether this set carries the marker that conflicts with everything.
    pub fn is_universal(&self) -> bool {
        self.writes.contains(&UNIVERSAL_CONFLICT_ADDRESS)
    }

    /// Returns if `self` touches `addr` in any way, at either granularity.
    fn touches_account(&self, addr: &Address) -> bool {
        self.reads.contains(addr)
            || self.writes.contains(addr)
            || self.read_slots.contains_key(addr)
            || self.write_slots.contains_key(addr)
    }

    /// Returns if `self` touches `slot` of `addr`, including through an
    /// address-level access.
    fn touches_slot(&self, addr: &Address, slot: &StorageKey) -> bool {
        self.reads.contains(addr)
            || self.writes.contains(addr)
            || self.read_slots.get(addr).is_some_and(|s| s.contains(slot))
            || self.write_slots.get(addr).is_some_and(|s| s.contains(slot))
    }

    /// Returns if any write of `self` hits an access of `other`.
    fn writes_hit(&self, other: &AccessSet) -> bool {
        self.writes.iter().any(|a| other.touches_account(a))
            || self
                .write_slots
                .iter()
                .any(|(a, slots)| slots.iter().any(|s| other.touches_slot(a, s)))
    }

    /// Two sets conflict iff a write of either one intersects a read or write
    /// of the other.  Symmetric.
    pub fn conflicts(&self, other: &AccessSet) -> bool {
        if self.is_universal() || other.is_universal() {
            return true;
        }
        self.writes_hit(other) || other.writes_hit(self)
    }
}

/// Derives the footprint of `msg` as it would execute in block `number`,
/// without executing it.
///
/// Never fails.  If a TTL cannot be read from the payload the set is marked
/// universal, which serializes the transaction against all others.
pub fn analyze_tx(msg: &Message, number: BlockNumber) -> AccessSet {
    let mut set = AccessSet::new();
    let sender = *msg.sender();
    set.add_write(sender);

    match msg.kind() {
        TxKind::Transfer => {
            if let Some(to) = msg.to() {
                // The recipient's code is inspected before crediting it.
                set.add_read(*to);
                set.add_write(*to);
            }
        }

        TxKind::CodeDeploy => {
            let expire_at = SetCodePayload::decode(msg.payload())
                .ok()
                .and_then(|p| number.checked_add(p.ttl()));
            match expire_at {
                Some(expire_at) => {
                    // The code itself is tracked through the code slot of the
                    // target account.
                    let target = slots::derive_code_address(&sender, msg.nonce());
                    set.add_write_slot(target, slots::code_slot());
                    set.add_write_slot(target, slots::code_created_at_slot());
                    set.add_write_slot(target, slots::code_expire_at_slot());
                    set.add_write_slot(
                        CODE_REGISTRY_ADDRESS,
                        slots::code_expiry_count_slot(expire_at),
                    );
                }
                None => set.add_write(UNIVERSAL_CONFLICT_ADDRESS),
            }
        }

        TxKind::SystemAction => {
            set.add_write(VALIDATOR_REGISTRY_ADDRESS);
        }

        TxKind::KvPut => match KvPutPayload::decode(msg.payload()) {
            Ok(p) => match number.checked_add(p.ttl()) {
                Some(expire_at) => {
                    set.add_write_slot(sender, slots::kv_record_slot(p.namespace(), p.key()));
                    set.add_write_slot(KV_ROUTER_ADDRESS, slots::kv_expiry_count_slot(expire_at));
                }
                None => set.add_write(UNIVERSAL_CONFLICT_ADDRESS),
            },
            Err(_) => set.add_write(UNIVERSAL_CONFLICT_ADDRESS),
        },
    }

    set
}

#[cfg(test)]
mod tests {
    use parexec_chain_types::{ActionKind, SysAction};
    use proptest::prelude::*;

    use super::*;

    fn addr(b: u8) -> Address {
        Address::repeat_byte(b)
    }

    fn kv(sender: Address, key: &[u8], ttl: u64) -> Message {
        let payload = KvPutPayload::new("ns", Bytes::copy_from_slice(key), Bytes::new(), ttl)
            .encode()
            .expect("test: encode");
        Message::kv_put(sender, payload, 100_000, 0)
    }

    #[test]
    fn test_transfer_footprint() {
        let set = analyze_tx(&Message::transfer(addr(1), addr(2), U256::from(1), 21_000, 0), 5);
        assert!(set.writes().contains(&addr(1)));
        assert!(set.writes().contains(&addr(2)));
        assert!(set.reads().contains(&addr(2)));
        assert!(!set.is_universal());
    }

    #[test]
    fn test_disjoint_transfers_do_not_conflict() {
        let a = analyze_tx(&Message::transfer(addr(1), addr(2), U256::ZERO, 21_000, 0), 5);
        let b = analyze_tx(&Message::transfer(addr(3), addr(4), U256::ZERO, 21_000, 0), 5);
        assert!(!a.conflicts(&b));
        let c = analyze_tx(&Message::transfer(addr(5), addr(2), U256::ZERO, 21_000, 0), 5);
        assert!(a.conflicts(&c));
    }

    #[test]
    fn test_kv_bucket_collision() {
        let a = analyze_tx(&kv(addr(1), b"x", 10), 5);
        let b = analyze_tx(&kv(addr(2), b"y", 10), 5);
        let c = analyze_tx(&kv(addr(3), b"z", 11), 5);
        assert!(a.conflicts(&b));
        assert!(!a.conflicts(&c));
    }

    #[test]
    fn test_address_access_covers_slots() {
        let mut slot_writer = AccessSet::new();
        slot_writer.add_write_slot(addr(9), B256::repeat_byte(1));
        let mut reader = AccessSet::new();
        reader.add_read(addr(9));
        assert!(slot_writer.conflicts(&reader));
        assert!(reader.conflicts(&slot_writer));

        let mut other_slot = AccessSet::new();
        other_slot.add_read_slot(addr(9), B256::repeat_byte(2));
        assert!(!slot_writer.conflicts(&other_slot));
    }

    #[test]
    fn test_bad_ttl_is_universal() {
        let bad = analyze_tx(&Message::kv_put(addr(1), Bytes::from_static(b"junk"), 50_000, 0), 5);
        assert!(bad.is_universal());
        let other = analyze_tx(&Message::transfer(addr(7), addr(8), U256::ZERO, 21_000, 0), 5);
        assert!(bad.conflicts(&other));
        assert!(other.conflicts(&bad));

        let overflow = analyze_tx(&kv(addr(1), b"x", u64::MAX), 5);
        assert!(overflow.is_universal());
    }

    #[test]
    fn test_system_actions_always_conflict() {
        let sa = SysAction::new(ActionKind::NodeUnstake, None)
            .encode()
            .expect("test: encode");
        let a = analyze_tx(&Message::system_action(addr(1), U256::ZERO, sa.clone(), 200_000, 0), 5);
        let b = analyze_tx(&Message::system_action(addr(2), U256::ZERO, sa, 200_000, 0), 5);
        assert!(a.conflicts(&b));
    }

    #[test]
    fn test_code_deploy_targets_differ_per_nonce() {
        let payload = SetCodePayload::new(3, Bytes::from_static(b"c"))
            .encode()
            .expect("test: encode");
        let a = analyze_tx(&Message::code_deploy(addr(1), payload.clone(), 100_000, 0), 5);
        let b = analyze_tx(&Message::code_deploy(addr(2), payload, 100_000, 0), 5);
        // Same expiry bucket in the code registry.
        assert!(a.conflicts(&b));
        let target = slots::derive_code_address(&addr(1), 0);
        assert!(a.write_slots().contains_key(&target));
    }

    proptest! {
        #[test]
        fn test_conflicts_symmetric(s1 in 0u8..6, r1 in 0u8..6, s2 in 0u8..6, r2 in 0u8..6) {
            let a = analyze_tx(&Message::transfer(addr(s1), addr(r1), U256::ZERO, 21_000, 0), 1);
            let b = analyze_tx(&Message::transfer(addr(s2), addr(r2), U256::ZERO, 21_000, 0), 1);
            prop_assert_eq!(a.conflicts(&b), b.conflicts(&a));
            let shared = s1 == s2 || s1 == r2 || r1 == s2 || r1 == r2;
            prop_assert_eq!(a.conflicts(&b), shared);
        }
    }
}
