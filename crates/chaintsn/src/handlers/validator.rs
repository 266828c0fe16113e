//! Validator registry driven by system actions.
//!
//! Every field lives in the storage of [`VALIDATOR_REGISTRY_ADDRESS`], and
//! staked funds sit in its balance, so any two system actions touch the same
//! account.

use parexec_chain_types::{ActionKind, LogEntry, NodeRegisterPayload, SysAction};
use parexec_primitives::{keccak256, prelude::*, slots, word};
use parexec_state::{ExecState, StateReader};

use super::TxEnv;
use crate::{errors::TxFailure, events, gas::GasMeter};

pub const MAX_COMMISSION_BPS: u16 = 5_000;

/// Self-stake at which a node becomes active.
pub const MIN_NODE_STAKE: U256 = U256::from_limbs([10_000, 0, 0, 0]);

/// Blocks between an unstake and the recorded unlock height.
pub const UNSTAKE_LOCK_BLOCKS: u64 = 100;

pub const FIELD_REGISTERED: &str = "registered";
pub const FIELD_COMMISSION: &str = "commission";
pub const FIELD_SELF_STAKE: &str = "selfStake";
pub const FIELD_ACTIVE: &str = "active";
pub const FIELD_UNLOCK_AT: &str = "unlockAt";

fn field(state: &impl StateReader, node: &Address, name: &str) -> B256 {
    state.storage(
        &VALIDATOR_REGISTRY_ADDRESS,
        &slots::validator_field_slot(node, name),
    )
}

fn set_field(state: &mut impl ExecState, node: &Address, name: &str, value: B256) {
    state.set_storage(
        &VALIDATOR_REGISTRY_ADDRESS,
        slots::validator_field_slot(node, name),
        value,
    );
}

pub fn self_stake(state: &impl StateReader, node: &Address) -> U256 {
    word::word_to_u256(&field(state, node, FIELD_SELF_STAKE))
}

pub fn is_active(state: &impl StateReader, node: &Address) -> bool {
    word::word_to_bool(&field(state, node, FIELD_ACTIVE))
}

pub fn is_registered(state: &impl StateReader, node: &Address) -> bool {
    word::word_to_bool(&field(state, node, FIELD_REGISTERED))
}

pub fn total_stake(state: &impl StateReader) -> U256 {
    word::word_to_u256(&state.storage(&VALIDATOR_REGISTRY_ADDRESS, &slots::total_stake_slot()))
}

fn set_total_stake(state: &mut impl ExecState, v: U256) {
    state.set_storage(
        &VALIDATOR_REGISTRY_ADDRESS,
        slots::total_stake_slot(),
        word::u256_to_word(v),
    );
}

fn decode_node_payload(sa: &SysAction) -> Result<NodeRegisterPayload, TxFailure> {
    let p: NodeRegisterPayload = sa.decode_payload()?;
    if p.commission_bps > MAX_COMMISSION_BPS {
        return Err(TxFailure::CommissionTooHigh(p.commission_bps));
    }
    Ok(p)
}

/// Moves `amount` from the node into the registry and credits its stake.
fn stake(state: &mut impl ExecState, node: &Address, amount: U256) {
    state.sub_balance(node, amount);
    state.add_balance(&VALIDATOR_REGISTRY_ADDRESS, amount);

    let new_self = self_stake(state, node).saturating_add(amount);
    set_field(state, node, FIELD_SELF_STAKE, word::u256_to_word(new_self));
    let total = total_stake(state).saturating_add(amount);
    set_total_stake(state, total);
    if new_self >= MIN_NODE_STAKE {
        set_field(state, node, FIELD_ACTIVE, word::bool_to_word(true));
    }
}

pub(crate) fn apply<S: ExecState>(
    state: &mut S,
    meter: &mut GasMeter,
    env: &TxEnv<'_>,
) -> Result<u64, TxFailure> {
    meter.charge(env.chain.gas.sys_action_gas)?;

    let sa = SysAction::decode(env.msg.payload())?;
    let kind = sa
        .kind()
        .ok_or_else(|| TxFailure::UnknownAction(sa.action.clone()))?;

    let node = *env.sender();
    let value = env.msg.value();

    match kind {
        ActionKind::NodeRegister => {
            let p = decode_node_payload(&sa)?;
            set_field(state, &node, FIELD_REGISTERED, word::bool_to_word(true));
            set_field(
                state,
                &node,
                FIELD_COMMISSION,
                word::u64_to_word(p.commission_bps as u64),
            );
            if !value.is_zero() {
                stake(state, &node, value);
            }
        }

        ActionKind::NodeStake => {
            if value.is_zero() {
                return Err(TxFailure::ZeroStake);
            }
            let p = decode_node_payload(&sa)?;
            // Commission can only be picked with the first stake.
            if self_stake(state, &node).is_zero() {
                set_field(
                    state,
                    &node,
                    FIELD_COMMISSION,
                    word::u64_to_word(p.commission_bps as u64),
                );
            }
            stake(state, &node, value);
        }

        ActionKind::NodeUnstake => {
            let amount = self_stake(state, &node);
            if amount.is_zero() {
                return Err(TxFailure::NoStake);
            }
            let unlock_at = env.ctx.number().saturating_add(UNSTAKE_LOCK_BLOCKS);

            set_field(state, &node, FIELD_SELF_STAKE, B256::ZERO);
            set_field(state, &node, FIELD_ACTIVE, B256::ZERO);
            set_field(state, &node, FIELD_UNLOCK_AT, word::u64_to_word(unlock_at));
            let total = total_stake(state).saturating_sub(amount);
            set_total_stake(state, total);

            state.sub_balance(&VALIDATOR_REGISTRY_ADDRESS, amount);
            state.add_balance(&node, amount);
        }
    }

    state.emit_log(LogEntry::new(
        VALIDATOR_REGISTRY_ADDRESS,
        vec![
            events::sys_action_topic(),
            word::address_to_word(&node),
            keccak256(kind.name().as_bytes()),
        ],
        word::u256_to_word(value).0.to_vec().into(),
    ));
    Ok(0)
}
