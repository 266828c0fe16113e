//! Deterministic block and state generators for tests and benchmarks.

use parexec_chain_types::{
    ActionKind, BlockContext, KvPutPayload, Message, NodeRegisterPayload, SetCodePayload,
    SysAction,
};
use parexec_primitives::prelude::*;
use parexec_state::{Account, MemState};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Balance every generated account starts with.
pub const GENESIS_BALANCE: u64 = 1_000_000_000_000;

/// Coinbase used by [`test_ctx`].  Never a generated sender.
pub const TEST_COINBASE: Address = Address::repeat_byte(0xcb);

pub const TRANSFER_GAS: u64 = 30_000;
pub const PAYLOAD_GAS: u64 = 200_000;
pub const SYS_ACTION_GAS: u64 = 300_000;

/// Address of the `i`-th generated account.
pub fn account(i: usize) -> Address {
    Address::left_padding_from(&(i as u64 + 1).to_be_bytes())
}

/// State with `n` accounts funded with [`GENESIS_BALANCE`].
pub fn genesis_state(n: usize) -> MemState {
    MemState::from_accounts(
        (0..n).map(|i| (account(i), Account::with_balance(U256::from(GENESIS_BALANCE)))),
    )
}

pub fn test_ctx(number: BlockNumber) -> BlockContext {
    BlockContext::new(number, TEST_COINBASE, 1_700_000_000 + number * 2)
}

pub fn kv_put_msg(sender: Address, nonce: u64, key: &[u8], value: &[u8], ttl: u64) -> Message {
    let payload = KvPutPayload::new(
        "test",
        Bytes::copy_from_slice(key),
        Bytes::copy_from_slice(value),
        ttl,
    );
    // Encoding only fails on a zero ttl, which leaves an empty payload the
    // handler rejects.  Callers use that to build broken messages.
    let bytes = payload.encode().unwrap_or_default();
    Message::kv_put(sender, bytes, PAYLOAD_GAS, nonce)
}

pub fn deploy_msg(sender: Address, nonce: u64, code: &[u8], ttl: u64) -> Message {
    let bytes = SetCodePayload::new(ttl, Bytes::copy_from_slice(code))
        .encode()
        .unwrap_or_default();
    Message::code_deploy(sender, bytes, PAYLOAD_GAS, nonce)
}

pub fn sys_action_msg(sender: Address, nonce: u64, kind: ActionKind, value: u64) -> Message {
    let payload = match kind {
        ActionKind::NodeRegister => serde_json::to_value(NodeRegisterPayload {
            endpoint: None,
            commission_bps: 500,
        })
        .ok(),
        _ => None,
    };
    let bytes = SysAction::new(kind, payload).encode().unwrap_or_default();
    Message::system_action(sender, U256::from(value), bytes, SYS_ACTION_GAS, nonce)
}

/// Relative weights of the four kinds.
#[derive(Clone, Debug)]
pub struct TxMix {
    pub transfer: u32,
    pub code_deploy: u32,
    pub kv_put: u32,
    pub system_action: u32,
}

impl Default for TxMix {
    fn default() -> Self {
        Self {
            transfer: 6,
            code_deploy: 1,
            kv_put: 2,
            system_action: 1,
        }
    }
}

impl TxMix {
    pub fn transfers_only() -> Self {
        Self {
            transfer: 1,
            code_deploy: 0,
            kv_put: 0,
            system_action: 0,
        }
    }

    fn total(&self) -> u32 {
        self.transfer + self.code_deploy + self.kv_put + self.system_action
    }
}

/// Shape of a generated block.
#[derive(Clone, Debug)]
pub struct BlockSpec {
    pub txs: usize,
    pub accounts: usize,
    pub mix: TxMix,

    /// Chance that a sender is drawn from a small set of hot accounts.
    pub hot_rate: f64,

    /// Chance that a message is broken on purpose.
    pub invalid_rate: f64,

    /// Whether messages pay a nonzero gas price.
    pub priced: bool,
}

impl Default for BlockSpec {
    fn default() -> Self {
        Self {
            txs: 64,
            accounts: 32,
            mix: TxMix::default(),
            hot_rate: 0.2,
            invalid_rate: 0.05,
            priced: true,
        }
    }
}

/// Seeded generator of blocks over [`genesis_state`] accounts.
#[derive(Debug)]
pub struct BlockGenerator {
    rng: ChaCha8Rng,
    nonces: Vec<u64>,
}

impl BlockGenerator {
    pub fn new(seed: u64, accounts: usize) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            nonces: vec![0; accounts.max(1)],
        }
    }

    fn random_bytes(&mut self, max_len: usize) -> Vec<u8> {
        let len = self.rng.gen_range(0..=max_len);
        (0..len).map(|_| self.rng.gen_range(0..=u8::MAX)).collect()
    }

    fn pick_sender(&mut self, hot_rate: f64) -> usize {
        let n = self.nonces.len();
        if n > 2 && self.rng.gen_bool(hot_rate) {
            self.rng.gen_range(0..2)
        } else {
            self.rng.gen_range(0..n)
        }
    }

    /// Generates one block.  Nonces carry over between calls so consecutive
    /// blocks chain.
    pub fn generate(&mut self, spec: &BlockSpec) -> Vec<Message> {
        let total = spec.mix.total().max(1);
        (0..spec.txs).map(|_| self.generate_tx(spec, total)).collect()
    }

    fn generate_tx(&mut self, spec: &BlockSpec, total: u32) -> Message {
        let s = self.pick_sender(spec.hot_rate);
        let sender = account(s);
        let nonce = self.nonces[s];
        let broken = self.rng.gen_bool(spec.invalid_rate);

        let roll = self.rng.gen_range(0..total);
        let mix = &spec.mix;
        let mut msg = if roll < mix.transfer {
            let to = account(self.rng.gen_range(0..self.nonces.len()));
            let value = U256::from(self.rng.gen_range(0..1_000u64));
            Message::transfer(sender, to, value, TRANSFER_GAS, nonce)
        } else if roll < mix.transfer + mix.code_deploy {
            let code = self.random_bytes(64);
            deploy_msg(sender, nonce, &code, self.rng.gen_range(1..8))
        } else if roll < mix.transfer + mix.code_deploy + mix.kv_put {
            let key = [self.rng.gen_range(0..4u8)];
            let value = self.random_bytes(96);
            kv_put_msg(sender, nonce, &key, &value, self.rng.gen_range(1..8))
        } else {
            let (kind, value) = match self.rng.gen_range(0..3) {
                0 => (ActionKind::NodeRegister, 0),
                1 => (ActionKind::NodeStake, self.rng.gen_range(1..20_000u64)),
                _ => (ActionKind::NodeUnstake, 0),
            };
            sys_action_msg(sender, nonce, kind, value)
        };

        if broken {
            msg = self.break_message(msg);
        } else {
            self.nonces[s] += 1;
        }

        if spec.priced {
            let price = U256::from(self.rng.gen_range(0..4u64));
            msg = msg.with_gas_price(price);
        }
        msg
    }

    /// Breaks a message in one of a few ways.  Broken messages never advance
    /// the tracked nonce, whether or not they end up rejected.
    fn break_message(&mut self, msg: Message) -> Message {
        match self.rng.gen_range(0..3) {
            0 => Message::new(
                *msg.sender(),
                msg.to().copied(),
                msg.value(),
                msg.gas_limit(),
                msg.gas_price(),
                msg.nonce() + 7,
                msg.payload().clone(),
            ),
            1 => Message::new(
                *msg.sender(),
                msg.to().copied(),
                msg.value(),
                1_000,
                msg.gas_price(),
                msg.nonce(),
                msg.payload().clone(),
            ),
            _ => Message::new(
                *msg.sender(),
                msg.to().copied(),
                msg.value(),
                msg.gas_limit(),
                msg.gas_price(),
                msg.nonce() + 1_000,
                Bytes::from_static(b"\xc3garbage"),
            ),
        }
    }
}

/// Shortcut for a single seeded block with fresh genesis state.
pub fn generate_block(seed: u64, spec: &BlockSpec) -> (MemState, Vec<Message>) {
    let state = genesis_state(spec.accounts);
    let txs = BlockGenerator::new(seed, spec.accounts).generate(spec);
    (state, txs)
}
