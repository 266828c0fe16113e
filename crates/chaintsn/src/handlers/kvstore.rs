//! TTL-bound key-value records.
//!
//! A record lives in the sender's own storage under a base slot derived from
//! `(namespace, key)`: four metadata fields plus the value split into 32-byte
//! chunks.  The KV router indexes it under its expiry height.

use parexec_chain_types::{KvPutPayload, LogEntry};
use parexec_params::ttl_gas;
use parexec_primitives::{prelude::*, slots, word};
use parexec_state::{ExecState, StateReader};

use super::{TxEnv, push_expiry_entry};
use crate::{errors::TxFailure, events, gas::GasMeter};

pub const FIELD_EXISTS: &str = "exists";
pub const FIELD_VALUE_LEN: &str = "valueLen";
pub const FIELD_CREATED_AT: &str = "createdAt";
pub const FIELD_EXPIRE_AT: &str = "expireAt";

fn chunk_count(len: u64) -> u64 {
    len.div_ceil(32)
}

pub(crate) fn apply<S: ExecState>(
    state: &mut S,
    meter: &mut GasMeter,
    env: &TxEnv<'_>,
) -> Result<u64, TxFailure> {
    if !env.msg.value().is_zero() {
        return Err(TxFailure::NonZeroValue);
    }

    let payload = KvPutPayload::decode(env.msg.payload())?;
    meter.charge(ttl_gas(payload.ttl(), env.chain.gas.kv_ttl_block_gas)?)?;

    let created_at = env.ctx.number();
    let expire_at = created_at
        .checked_add(payload.ttl())
        .ok_or(TxFailure::TtlOverflow)?;

    let owner = *env.sender();
    let base = slots::kv_record_slot(payload.namespace(), payload.key());
    let meta = |field| slots::record_meta_slot(&base, field);

    // Overwrites are judged against the record as it was when the message
    // started, not against anything written since.
    let existed = word::word_to_bool(&state.committed_storage(&owner, &meta(FIELD_EXISTS)));
    let old_len = word::word_to_u64(&state.storage(&owner, &meta(FIELD_VALUE_LEN)));

    let value = payload.value();
    let new_chunks = chunk_count(value.len() as u64);
    for (i, chunk) in value.chunks(32).enumerate() {
        let mut w = [0u8; 32];
        w[..chunk.len()].copy_from_slice(chunk);
        state.set_storage(
            &owner,
            slots::value_chunk_slot(&base, i as u64),
            B256::from(w),
        );
    }
    for i in new_chunks..chunk_count(old_len) {
        state.set_storage(&owner, slots::value_chunk_slot(&base, i), B256::ZERO);
    }

    state.set_storage(&owner, meta(FIELD_EXISTS), word::bool_to_word(true));
    state.set_storage(
        &owner,
        meta(FIELD_VALUE_LEN),
        word::u64_to_word(value.len() as u64),
    );
    state.set_storage(&owner, meta(FIELD_CREATED_AT), word::u64_to_word(created_at));
    state.set_storage(&owner, meta(FIELD_EXPIRE_AT), word::u64_to_word(expire_at));

    push_expiry_entry(
        state,
        &KV_ROUTER_ADDRESS,
        &slots::kv_expiry_bucket(expire_at),
        &owner,
        base,
    );

    state.emit_log(LogEntry::new(
        KV_ROUTER_ADDRESS,
        vec![events::kv_put_topic(), word::address_to_word(&owner), base],
        word::u64_to_word(expire_at).0.to_vec().into(),
    ));

    Ok(if existed {
        env.chain.gas.kv_overwrite_refund
    } else {
        0
    })
}

/// Reads back a record's value from `owner`'s storage, if it exists.
pub fn read_record<S: StateReader>(
    state: &S,
    owner: &Address,
    namespace: &str,
    key: &[u8],
) -> Option<Vec<u8>> {
    let base = slots::kv_record_slot(namespace, key);
    let meta = |field| slots::record_meta_slot(&base, field);
    if !word::word_to_bool(&state.storage(owner, &meta(FIELD_EXISTS))) {
        return None;
    }
    let len = word::word_to_u64(&state.storage(owner, &meta(FIELD_VALUE_LEN))) as usize;
    let mut out = Vec::with_capacity(len);
    for i in 0..chunk_count(len as u64) {
        out.extend_from_slice(state.storage(owner, &slots::value_chunk_slot(&base, i)).as_slice());
    }
    out.truncate(len);
    Some(out)
}
