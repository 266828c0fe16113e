//! Kind-specific parts of message application.
//!
//! Each handler charges its gas and checks everything it can before the first
//! write, so a failing handler leaves state exactly as the common prologue
//! left it.  `Ok` carries the refund the handler asks for, before capping.

use parexec_chain_types::{BlockContext, Message};
use parexec_params::ChainConfig;
use parexec_primitives::prelude::*;
use parexec_state::ExecState;

pub mod kvstore;
pub(crate) mod setcode;
pub(crate) mod transfer;
pub mod validator;

/// Everything a handler may consult besides state.
#[derive(Debug)]
pub(crate) struct TxEnv<'a> {
    pub(crate) msg: &'a Message,
    pub(crate) ctx: &'a BlockContext,
    pub(crate) chain: &'a ChainConfig,

    /// Sender nonce before the message bumped it.
    pub(crate) nonce: u64,
}

impl TxEnv<'_> {
    pub(crate) fn sender(&self) -> &Address {
        self.msg.sender()
    }
}

/// Appends an entry to an expiry bucket held by `registry`.
pub(crate) fn push_expiry_entry<S: ExecState>(
    state: &mut S,
    registry: &Address,
    bucket: &B256,
    owner: &Address,
    record: B256,
) {
    use parexec_primitives::{slots, word};

    let count_slot = slots::bucket_count_slot(bucket);
    let count = word::word_to_u64(&state.storage(registry, &count_slot));
    state.set_storage(
        registry,
        slots::bucket_owner_slot(bucket, count),
        word::address_to_word(owner),
    );
    state.set_storage(registry, slots::bucket_record_slot(bucket, count), record);
    state.set_storage(registry, count_slot, word::u64_to_word(count.saturating_add(1)));
}
