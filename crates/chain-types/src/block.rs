use parexec_primitives::prelude::*;

/// Block info context.
///
/// Everything the state transition needs to know about the enclosing block,
/// which is known before any transaction runs.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct BlockContext {
    number: BlockNumber,
    coinbase: Address,
    timestamp: u64,
}

impl BlockContext {
    pub fn new(number: BlockNumber, coinbase: Address, timestamp: u64) -> Self {
        Self {
            number,
            coinbase,
            timestamp,
        }
    }

    pub fn number(&self) -> BlockNumber {
        self.number
    }

    /// Account credited with transaction fees.
    pub fn coinbase(&self) -> &Address {
        &self.coinbase
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }
}
