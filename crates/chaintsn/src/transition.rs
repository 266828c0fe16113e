//! Message application.

use parexec_chain_types::{BlockContext, Message, TxKind};
use parexec_params::{ChainConfig, intrinsic_gas};
use parexec_primitives::prelude::*;
use parexec_state::{ExecState, InertOp};
use tracing::*;

use crate::{
    errors::{TsnError, TxFailure},
    gas::GasMeter,
    handlers::{self, TxEnv},
};

/// Result of a message that made it past validation.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TxOutcome {
    gas_used: u64,
    failure: Option<TxFailure>,
}

impl TxOutcome {
    pub fn gas_used(&self) -> u64 {
        self.gas_used
    }

    pub fn failure(&self) -> Option<&TxFailure> {
        self.failure.as_ref()
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

/// Applies one message to `state`.
///
/// Returns `Err` if the message is rejected outright, in which case `state`
/// has not been touched.  Otherwise the sender paid for gas, its nonce moved
/// forward, the unused gas was refunded and the fee for the gas used was
/// paid to the coinbase, whether or not the kind-specific part succeeded.
///
/// Does not touch the block gas pool, admission is the caller's job.
pub fn apply_message<S: ExecState>(
    state: &mut S,
    msg: &Message,
    ctx: &BlockContext,
    chain: &ChainConfig,
) -> Result<TxOutcome, TsnError> {
    let sender = *msg.sender();
    let kind = msg.kind();

    let nonce = state.nonce(&sender);
    if msg.nonce() != nonce {
        return Err(TsnError::NonceMismatch {
            expected: nonce,
            got: msg.nonce(),
        });
    }
    let next_nonce = nonce.checked_add(1).ok_or(TsnError::NonceExhausted)?;

    let gas_cost = U256::from(msg.gas_limit())
        .checked_mul(msg.gas_price())
        .ok_or(TsnError::CostOverflow)?;
    let upfront = gas_cost
        .checked_add(msg.value())
        .ok_or(TsnError::CostOverflow)?;
    let balance = state.balance(&sender);
    if balance < upfront {
        return Err(TsnError::InsufficientFunds {
            have: balance,
            want: upfront,
        });
    }

    let intrinsic = intrinsic_gas(&chain.gas, msg.payload(), kind == TxKind::CodeDeploy)?;
    if intrinsic > msg.gas_limit() {
        return Err(TsnError::IntrinsicGasTooLow {
            limit: msg.gas_limit(),
            want: intrinsic,
        });
    }

    // Buy gas.
    state.sub_balance(&sender, gas_cost);
    state.set_nonce(&sender, next_nonce);
    state.inert(InertOp::WarmAddress(sender));
    if let Some(to) = msg.to() {
        state.inert(InertOp::WarmAddress(*to));
    }

    let mut meter = GasMeter::new(msg.gas_limit());
    meter.charge(intrinsic).map_err(|_| TsnError::IntrinsicGasTooLow {
        limit: msg.gas_limit(),
        want: intrinsic,
    })?;

    let env = TxEnv {
        msg,
        ctx,
        chain,
        nonce,
    };
    let res = match kind {
        TxKind::Transfer => handlers::transfer::apply(state, &mut meter, &env),
        TxKind::CodeDeploy => handlers::setcode::apply(state, &mut meter, &env),
        TxKind::KvPut => handlers::kvstore::apply(state, &mut meter, &env),
        TxKind::SystemAction => handlers::validator::apply(state, &mut meter, &env),
    };

    let failure = match res {
        Ok(refund) => {
            let quotient = chain.gas.refund_quotient.max(1);
            let capped = refund.min(meter.used() / quotient);
            if capped > 0 {
                state.inert(InertOp::AddRefund(capped));
            }
            meter.refund(capped);
            None
        }
        Err(failure) => {
            if failure == TxFailure::OutOfGas {
                meter.exhaust();
            }
            debug!(%sender, ?kind, %failure, "message failed");
            Some(failure)
        }
    };

    // Cannot overflow, both are bounded by `gas_cost`.
    let gas_used = meter.used();
    let leftover = U256::from(meter.remaining()) * msg.gas_price();
    state.add_balance(&sender, leftover);
    state.pay_fee(ctx.coinbase(), U256::from(gas_used) * msg.gas_price());

    Ok(TxOutcome { gas_used, failure })
}
