//! Storage slot derivations.
//!
//! Every derivation hashes a domain tag followed by length-delimited or
//! fixed-width inputs, so slots from different derivations never collide in
//! practice.  The expiry index layout is shared by the KV router and the code
//! registry: a bucket per expiry height, holding a `count` and two arrays
//! (`owner[i]`, `record[i]`) indexed by insertion order.

use alloy_primitives::{Address, B256, Keccak256};

use crate::BlockNumber;

const KV_RECORD_TAG: &[u8] = b"pxc.kv.record";
const KV_EXPIRY_BUCKET_TAG: &[u8] = b"pxc.kv.expiry.bucket";
const CODE_EXPIRY_BUCKET_TAG: &[u8] = b"pxc.code.expiry.bucket";
const CODE_ADDRESS_TAG: &[u8] = b"pxc.code.address";
const CODE_SLOT_TAG: &[u8] = b"pxc.code";
const CODE_CREATED_AT_TAG: &[u8] = b"pxc.code.createdAt";
const CODE_EXPIRE_AT_TAG: &[u8] = b"pxc.code.expireAt";
const VALIDATOR_TAG: &[u8] = b"pxc.validator";
const TOTAL_STAKE_TAG: &[u8] = b"pxc.validator.totalStake";

fn hash_parts(parts: &[&[u8]]) -> B256 {
    let mut hasher = Keccak256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize()
}

fn len_prefix(bytes: &[u8]) -> [u8; 8] {
    (bytes.len() as u64).to_be_bytes()
}

/// Base slot of a KV record, scoped under its owner account.
pub fn kv_record_slot(namespace: &str, key: &[u8]) -> B256 {
    let ns = namespace.as_bytes();
    hash_parts(&[KV_RECORD_TAG, &len_prefix(ns), ns, &len_prefix(key), key])
}

/// Metadata field of a record (`valueLen`, `createdAt`, `expireAt`, `exists`).
pub fn record_meta_slot(base: &B256, field: &str) -> B256 {
    hash_parts(&[base.as_slice(), &[0x00], field.as_bytes()])
}

/// The `index`-th 32-byte chunk of a record value.
pub fn value_chunk_slot(base: &B256, index: u64) -> B256 {
    hash_parts(&[base.as_slice(), &[0x00], b"valueChunk", &index.to_be_bytes()])
}

pub fn kv_expiry_bucket(expire_at: BlockNumber) -> B256 {
    hash_parts(&[KV_EXPIRY_BUCKET_TAG, &expire_at.to_be_bytes()])
}

pub fn code_expiry_bucket(expire_at: BlockNumber) -> B256 {
    hash_parts(&[CODE_EXPIRY_BUCKET_TAG, &expire_at.to_be_bytes()])
}

/// Number of entries in a bucket. This is the slot two writers into the same
/// bucket always collide on.
pub fn bucket_count_slot(bucket: &B256) -> B256 {
    hash_parts(&[bucket.as_slice(), &[0x00], b"bucket", &[0x00], b"count"])
}

pub fn bucket_owner_slot(bucket: &B256, index: u64) -> B256 {
    hash_parts(&[bucket.as_slice(), &[0x00], b"owner", &index.to_be_bytes()])
}

pub fn bucket_record_slot(bucket: &B256, index: u64) -> B256 {
    hash_parts(&[bucket.as_slice(), &[0x00], b"record", &index.to_be_bytes()])
}

/// Count slot of the KV router bucket for `expire_at`.
pub fn kv_expiry_count_slot(expire_at: BlockNumber) -> B256 {
    bucket_count_slot(&kv_expiry_bucket(expire_at))
}

/// Count slot of the code registry bucket for `expire_at`.
pub fn code_expiry_count_slot(expire_at: BlockNumber) -> B256 {
    bucket_count_slot(&code_expiry_bucket(expire_at))
}

/// Address code gets installed at by a code deploy from `sender` at `nonce`.
pub fn derive_code_address(sender: &Address, nonce: u64) -> Address {
    let h = hash_parts(&[CODE_ADDRESS_TAG, sender.as_slice(), &nonce.to_be_bytes()]);
    Address::from_slice(&h[12..])
}

/// Pseudo-slot standing for an account's code in access sets. Code is not
/// stored in it.
pub fn code_slot() -> B256 {
    hash_parts(&[CODE_SLOT_TAG])
}

pub fn code_created_at_slot() -> B256 {
    hash_parts(&[CODE_CREATED_AT_TAG])
}

pub fn code_expire_at_slot() -> B256 {
    hash_parts(&[CODE_EXPIRE_AT_TAG])
}

/// Per-validator field in the validator registry (`registered`, `commission`,
/// `stake`).
pub fn validator_field_slot(validator: &Address, field: &str) -> B256 {
    hash_parts(&[VALIDATOR_TAG, validator.as_slice(), &[0x00], field.as_bytes()])
}

pub fn total_stake_slot() -> B256 {
    hash_parts(&[TOTAL_STAKE_TAG])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_slot_is_length_delimited() {
        // "ab" + "c" must not collide with "a" + "bc".
        assert_ne!(kv_record_slot("ab", b"c"), kv_record_slot("a", b"bc"));
        assert_eq!(kv_record_slot("ns", b"k"), kv_record_slot("ns", b"k"));
    }

    #[test]
    fn test_expiry_buckets_are_domain_separated() {
        assert_ne!(kv_expiry_count_slot(100), code_expiry_count_slot(100));
        assert_ne!(kv_expiry_count_slot(100), kv_expiry_count_slot(101));
        assert_eq!(kv_expiry_count_slot(100), kv_expiry_count_slot(100));

        let bucket = kv_expiry_bucket(5);
        assert_ne!(bucket_owner_slot(&bucket, 0), bucket_record_slot(&bucket, 0));
        assert_ne!(bucket_owner_slot(&bucket, 0), bucket_owner_slot(&bucket, 1));
    }

    #[test]
    fn test_code_address_depends_on_nonce() {
        let sender = Address::with_last_byte(1);
        let a0 = derive_code_address(&sender, 0);
        let a1 = derive_code_address(&sender, 1);
        assert_ne!(a0, a1);
        assert_ne!(a0, sender);
        assert_eq!(a0, derive_code_address(&sender, 0));
    }

    #[test]
    fn test_fixed_slots_distinct() {
        let slots = [
            code_slot(),
            code_created_at_slot(),
            code_expire_at_slot(),
            total_stake_slot(),
        ];
        for (i, a) in slots.iter().enumerate() {
            for b in &slots[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
