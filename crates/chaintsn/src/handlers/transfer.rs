use parexec_chain_types::LogEntry;
use parexec_primitives::{prelude::*, word};
use parexec_state::ExecState;

use super::TxEnv;
use crate::{errors::TxFailure, events, gas::GasMeter};

/// Moves value between plain accounts.  Accounts with code only accept code
/// calls, which do not exist here.
pub(crate) fn apply<S: ExecState>(
    state: &mut S,
    _meter: &mut GasMeter,
    env: &TxEnv<'_>,
) -> Result<u64, TxFailure> {
    let to = env.msg.to().ok_or(TxFailure::ContractNotSupported)?;
    if !env.msg.payload().is_empty() || !state.code(to).is_empty() {
        return Err(TxFailure::ContractNotSupported);
    }

    let value = env.msg.value();
    state.sub_balance(env.sender(), value);
    state.add_balance(to, value);

    state.emit_log(LogEntry::new(
        *to,
        vec![
            events::transfer_topic(),
            word::address_to_word(env.sender()),
            word::address_to_word(to),
        ],
        word::u256_to_word(value).0.to_vec().into(),
    ));
    Ok(0)
}
