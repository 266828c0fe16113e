use parexec_chain_types::{
    ActionKind, BlockContext, KvPutPayload, Message, NodeRegisterPayload, SetCodePayload,
    SysAction,
};
use parexec_chaintsn::{TsnError, TxFailure, apply_message, kvstore, validator};
use parexec_params::{ChainConfig, intrinsic_gas};
use parexec_primitives::{prelude::*, slots, word};
use parexec_state::{Account, CanonicalState, ExecState, MemState, StateReader};

const COINBASE: Address = Address::repeat_byte(0xcb);

fn alice() -> Address {
    Address::repeat_byte(0xa1)
}

fn bob() -> Address {
    Address::repeat_byte(0xb0)
}

fn ctx() -> BlockContext {
    BlockContext::new(10, COINBASE, 1_700_000_000)
}

fn funded(amount: u64) -> MemState {
    MemState::from_accounts([(alice(), Account::with_balance(U256::from(amount)))])
}

fn kv_msg(nonce: u64, key: &[u8], value: &[u8], ttl: u64) -> Message {
    let payload = KvPutPayload::new("app", Bytes::copy_from_slice(key), Bytes::copy_from_slice(value), ttl)
        .encode()
        .expect("test: encode kv");
    Message::kv_put(alice(), payload, 200_000, nonce)
}

#[test]
fn test_transfer_moves_value_and_pays_fee() {
    let chain = ChainConfig::default();
    let mut st = funded(1_000_000);
    let msg = Message::transfer(alice(), bob(), U256::from(500), 30_000, 0).with_gas_price(U256::from(2));

    let out = apply_message(&mut st, &msg, &ctx(), &chain).expect("test: apply");
    st.finalize_tx();

    assert!(out.is_success());
    assert_eq!(out.gas_used(), 21_000);
    assert_eq!(st.balance(&bob()), U256::from(500));
    assert_eq!(st.balance(&COINBASE), U256::from(42_000));
    assert_eq!(st.balance(&alice()), U256::from(1_000_000 - 500 - 42_000));
    assert_eq!(st.nonce(&alice()), 1);
    assert_eq!(st.take_logs().len(), 1);
}

#[test]
fn test_rejections_leave_state_untouched() {
    let chain = ChainConfig::default();
    let mut st = funded(50_000);
    let root = st.state_root();

    let bad_nonce = Message::transfer(alice(), bob(), U256::from(1), 21_000, 3);
    assert_eq!(
        apply_message(&mut st, &bad_nonce, &ctx(), &chain),
        Err(TsnError::NonceMismatch { expected: 0, got: 3 })
    );

    let too_poor = Message::transfer(alice(), bob(), U256::from(40_000), 21_000, 0)
        .with_gas_price(U256::from(1));
    assert!(matches!(
        apply_message(&mut st, &too_poor, &ctx(), &chain),
        Err(TsnError::InsufficientFunds { .. })
    ));

    let low_gas = Message::transfer(alice(), bob(), U256::from(1), 20_999, 0);
    assert_eq!(
        apply_message(&mut st, &low_gas, &ctx(), &chain),
        Err(TsnError::IntrinsicGasTooLow {
            limit: 20_999,
            want: 21_000
        })
    );

    let overflow = Message::transfer(alice(), bob(), U256::MAX, 21_000, 0)
        .with_gas_price(U256::from(1));
    assert_eq!(
        apply_message(&mut st, &overflow, &ctx(), &chain),
        Err(TsnError::CostOverflow)
    );

    st.finalize_tx();
    assert_eq!(st.state_root(), root);
    assert!(st.take_logs().is_empty());
}

#[test]
fn test_transfer_to_code_fails_but_charges_gas() {
    let chain = ChainConfig::default();
    let mut st = funded(100_000);
    st.set_code(&bob(), Bytes::from_static(b"\x60\x00"));
    st.finalize_tx();

    let msg = Message::transfer(alice(), bob(), U256::from(7), 25_000, 0).with_gas_price(U256::from(1));
    let out = apply_message(&mut st, &msg, &ctx(), &chain).expect("test: apply");
    st.finalize_tx();

    assert_eq!(out.failure(), Some(&TxFailure::ContractNotSupported));
    assert_eq!(out.gas_used(), 21_000);
    assert_eq!(st.balance(&bob()), U256::ZERO);
    assert_eq!(st.balance(&alice()), U256::from(100_000 - 21_000));
    assert_eq!(st.nonce(&alice()), 1);
    assert!(st.take_logs().is_empty());
}

#[test]
fn test_code_deploy_installs_and_indexes() {
    let chain = ChainConfig::default();
    let mut st = funded(1_000_000);
    let code = Bytes::from_static(b"\xde\xad\xbe\xef");
    let payload = SetCodePayload::new(50, code.clone()).encode().expect("test: encode");
    let msg = Message::code_deploy(alice(), payload.clone(), 100_000, 0);

    let out = apply_message(&mut st, &msg, &ctx(), &chain).expect("test: apply");
    st.finalize_tx();
    assert!(out.is_success(), "{:?}", out.failure());

    let want_gas = intrinsic_gas(&chain.gas, &payload, true).expect("test: gas")
        + 50 * chain.gas.code_ttl_block_gas;
    assert_eq!(out.gas_used(), want_gas);

    let target = slots::derive_code_address(&alice(), 0);
    assert_eq!(st.code(&target), code);
    assert_eq!(
        word::word_to_u64(&st.storage(&target, &slots::code_expire_at_slot())),
        60
    );
    assert_eq!(
        word::word_to_u64(&st.storage(&CODE_REGISTRY_ADDRESS, &slots::code_expiry_count_slot(60))),
        1
    );
    let bucket = slots::code_expiry_bucket(60);
    assert_eq!(
        st.storage(&CODE_REGISTRY_ADDRESS, &slots::bucket_record_slot(&bucket, 0)),
        word::address_to_word(&target)
    );
}

#[test]
fn test_code_deploy_rejects_value_and_oversize() {
    let chain = ChainConfig {
        max_code_size: 2,
        ..Default::default()
    };
    let mut st = funded(1_000_000);

    let payload = SetCodePayload::new(5, Bytes::from_static(b"abc")).encode().expect("test: encode");
    let msg = Message::code_deploy(alice(), payload, 100_000, 0);
    let out = apply_message(&mut st, &msg, &ctx(), &chain).expect("test: apply");
    assert_eq!(out.failure(), Some(&TxFailure::CodeTooLarge { size: 3, max: 2 }));

    let garbage = Message::code_deploy(alice(), Bytes::from_static(b"\xff"), 100_000, 1);
    let out = apply_message(&mut st, &garbage, &ctx(), &chain).expect("test: apply");
    assert!(matches!(out.failure(), Some(TxFailure::InvalidPayload(_))));
    st.finalize_tx();

    assert_eq!(st.nonce(&alice()), 2);
    assert!(st.account(&slots::derive_code_address(&alice(), 0)).is_none());
}

#[test]
fn test_kv_put_overwrite_earns_capped_refund() {
    let chain = ChainConfig::default();
    let mut st = funded(10_000_000);

    let first = kv_msg(0, b"k", &[7u8; 70], 20);
    let out1 = apply_message(&mut st, &first, &ctx(), &chain).expect("test: apply");
    st.finalize_tx();
    assert!(out1.is_success());
    let want1 = intrinsic_gas(&chain.gas, first.payload(), false).expect("test: gas") + 20;
    assert_eq!(out1.gas_used(), want1);
    assert_eq!(
        kvstore::read_record(&st, &alice(), "app", b"k"),
        Some(vec![7u8; 70])
    );

    let second = kv_msg(1, b"k", b"short", 20);
    let out2 = apply_message(&mut st, &second, &ctx(), &chain).expect("test: apply");
    st.finalize_tx();
    let raw2 = intrinsic_gas(&chain.gas, second.payload(), false).expect("test: gas") + 20;
    let refund = chain.gas.kv_overwrite_refund.min(raw2 / chain.gas.refund_quotient);
    assert_eq!(out2.gas_used(), raw2 - refund);
    assert_eq!(
        kvstore::read_record(&st, &alice(), "app", b"k"),
        Some(b"short".to_vec())
    );

    // Stale chunks of the longer value are cleared.
    let base = slots::kv_record_slot("app", b"k");
    assert_eq!(st.storage(&alice(), &slots::value_chunk_slot(&base, 2)), B256::ZERO);

    // Both puts expire at the same height and share the bucket.
    assert_eq!(
        word::word_to_u64(&st.storage(&KV_ROUTER_ADDRESS, &slots::kv_expiry_count_slot(30))),
        2
    );
}

#[test]
fn test_kv_put_with_value_fails() {
    let chain = ChainConfig::default();
    let mut st = funded(10_000_000);
    let payload = KvPutPayload::new("app", Bytes::from_static(b"k"), Bytes::new(), 1)
        .encode()
        .expect("test: encode");
    let msg = Message::new(
        alice(),
        Some(KV_ROUTER_ADDRESS),
        U256::from(1),
        100_000,
        U256::ZERO,
        0,
        payload,
    );
    let out = apply_message(&mut st, &msg, &ctx(), &chain).expect("test: apply");
    assert_eq!(out.failure(), Some(&TxFailure::NonZeroValue));
    assert_eq!(kvstore::read_record(&st, &alice(), "app", b"k"), None);
}

fn sys_msg(nonce: u64, value: u64, action: SysAction, gas: u64) -> Message {
    Message::system_action(
        alice(),
        U256::from(value),
        action.encode().expect("test: encode"),
        gas,
        nonce,
    )
}

#[test]
fn test_validator_stake_and_unstake() {
    let chain = ChainConfig::default();
    let mut st = funded(1_000_000);

    let register = SysAction::new(
        ActionKind::NodeRegister,
        Some(serde_json::to_value(NodeRegisterPayload {
            endpoint: None,
            commission_bps: 100,
        })
        .expect("test: json")),
    );
    let out = apply_message(&mut st, &sys_msg(0, 0, register, 300_000), &ctx(), &chain)
        .expect("test: apply");
    st.finalize_tx();
    assert!(out.is_success());
    assert!(validator::is_registered(&st, &alice()));
    assert!(!validator::is_active(&st, &alice()));

    let stake = SysAction::new(ActionKind::NodeStake, None);
    let out = apply_message(&mut st, &sys_msg(1, 20_000, stake, 300_000), &ctx(), &chain)
        .expect("test: apply");
    st.finalize_tx();
    assert!(out.is_success());
    assert_eq!(validator::self_stake(&st, &alice()), U256::from(20_000));
    assert_eq!(validator::total_stake(&st), U256::from(20_000));
    assert!(validator::is_active(&st, &alice()));
    assert_eq!(st.balance(&VALIDATOR_REGISTRY_ADDRESS), U256::from(20_000));

    let before = st.balance(&alice());
    let unstake = SysAction::new(ActionKind::NodeUnstake, None);
    let out = apply_message(&mut st, &sys_msg(2, 0, unstake, 300_000), &ctx(), &chain)
        .expect("test: apply");
    st.finalize_tx();
    assert!(out.is_success());
    assert_eq!(st.balance(&alice()), before + U256::from(20_000));
    assert!(validator::self_stake(&st, &alice()).is_zero());
    assert!(!validator::is_active(&st, &alice()));
    assert_eq!(st.balance(&VALIDATOR_REGISTRY_ADDRESS), U256::ZERO);
}

#[test]
fn test_validator_failures() {
    let chain = ChainConfig::default();
    let mut st = funded(1_000_000);

    let unstake = SysAction::new(ActionKind::NodeUnstake, None);
    let out = apply_message(&mut st, &sys_msg(0, 0, unstake, 300_000), &ctx(), &chain)
        .expect("test: apply");
    assert_eq!(out.failure(), Some(&TxFailure::NoStake));

    let unknown = SysAction {
        action: "AGENT_REGISTER".to_owned(),
        payload: None,
    };
    let msg = sys_msg(1, 0, unknown, 300_000);
    let out = apply_message(&mut st, &msg, &ctx(), &chain).expect("test: apply");
    assert_eq!(
        out.failure(),
        Some(&TxFailure::UnknownAction("AGENT_REGISTER".to_owned()))
    );
    let intrinsic = intrinsic_gas(&chain.gas, msg.payload(), false).expect("test: gas");
    assert_eq!(out.gas_used(), intrinsic + chain.gas.sys_action_gas);

    // Not enough gas for the flat action cost burns the whole limit.
    let stake = SysAction::new(ActionKind::NodeStake, None);
    let msg = sys_msg(2, 5, stake, 50_000);
    let out = apply_message(&mut st, &msg, &ctx(), &chain).expect("test: apply");
    assert_eq!(out.failure(), Some(&TxFailure::OutOfGas));
    assert_eq!(out.gas_used(), 50_000);
    st.finalize_tx();
    assert!(validator::self_stake(&st, &alice()).is_zero());
}

proptest::proptest! {
    #[test]
    fn test_transfer_conserves_balance(
        value in 0u64..2_000_000,
        price in 0u64..5,
        gas_limit in 21_000u64..60_000,
    ) {
        let chain = ChainConfig::default();
        let mut st = funded(1_000_000);
        let msg = Message::transfer(alice(), bob(), U256::from(value), gas_limit, 0)
            .with_gas_price(U256::from(price));

        let total = |st: &MemState| st.balance(&alice()) + st.balance(&bob()) + st.balance(&COINBASE);
        let before = total(&st);
        let res = apply_message(&mut st, &msg, &ctx(), &chain);
        st.finalize_tx();

        proptest::prop_assert_eq!(total(&st), before);
        if let Ok(out) = res {
            proptest::prop_assert_eq!(st.balance(&COINBASE), U256::from(out.gas_used() * price));
            proptest::prop_assert_eq!(st.nonce(&alice()), 1);
        } else {
            proptest::prop_assert_eq!(st.nonce(&alice()), 0);
        }
    }
}
