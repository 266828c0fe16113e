use parexec_chain_types::{LogEntry, SetCodePayload};
use parexec_params::ttl_gas;
use parexec_primitives::{prelude::*, slots, word};
use parexec_state::ExecState;

use super::{TxEnv, push_expiry_entry};
use crate::{errors::TxFailure, events, gas::GasMeter};

/// Installs TTL-bound code at the address derived from the sender and its
/// pre-message nonce, and indexes it under its expiry height.
pub(crate) fn apply<S: ExecState>(
    state: &mut S,
    meter: &mut GasMeter,
    env: &TxEnv<'_>,
) -> Result<u64, TxFailure> {
    if !env.msg.value().is_zero() {
        return Err(TxFailure::NonZeroValue);
    }

    let payload = SetCodePayload::decode(env.msg.payload())?;
    let max = env.chain.max_code_size;
    if payload.code().len() > max {
        return Err(TxFailure::CodeTooLarge {
            size: payload.code().len(),
            max,
        });
    }

    meter.charge(ttl_gas(payload.ttl(), env.chain.gas.code_ttl_block_gas)?)?;

    let created_at = env.ctx.number();
    let expire_at = created_at
        .checked_add(payload.ttl())
        .ok_or(TxFailure::TtlOverflow)?;

    let target = slots::derive_code_address(env.sender(), env.nonce);
    if !state.code(&target).is_empty() {
        return Err(TxFailure::CodeExists(target));
    }

    state.set_code(&target, payload.code().clone());
    state.set_storage(
        &target,
        slots::code_created_at_slot(),
        word::u64_to_word(created_at),
    );
    state.set_storage(
        &target,
        slots::code_expire_at_slot(),
        word::u64_to_word(expire_at),
    );
    push_expiry_entry(
        state,
        &CODE_REGISTRY_ADDRESS,
        &slots::code_expiry_bucket(expire_at),
        env.sender(),
        word::address_to_word(&target),
    );

    state.emit_log(LogEntry::new(
        target,
        vec![
            events::code_deployed_topic(),
            word::address_to_word(env.sender()),
        ],
        word::u64_to_word(expire_at).0.to_vec().into(),
    ));
    Ok(0)
}
