use parexec_primitives::prelude::*;

/// A log as emitted by the state transition, before it is placed in a block.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LogEntry {
    address: Address,
    topics: Vec<B256>,
    data: Bytes,
}

impl LogEntry {
    pub fn new(address: Address, topics: Vec<B256>, data: Bytes) -> Self {
        Self {
            address,
            topics,
            data,
        }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn topics(&self) -> &[B256] {
        &self.topics
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }
}

/// A log positioned within its block.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Log {
    entry: LogEntry,
    tx_index: usize,

    /// Index among all logs of the block.
    log_index: usize,
}

impl Log {
    pub fn new(entry: LogEntry, tx_index: usize, log_index: usize) -> Self {
        Self {
            entry,
            tx_index,
            log_index,
        }
    }

    pub fn entry(&self) -> &LogEntry {
        &self.entry
    }

    pub fn tx_index(&self) -> usize {
        self.tx_index
    }

    pub fn log_index(&self) -> usize {
        self.log_index
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ReceiptStatus {
    Success,
    Failed,
}

/// Result of one transaction, built in block order.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Receipt {
    status: ReceiptStatus,
    gas_used: u64,
    cumulative_gas_used: u64,
    logs: Vec<Log>,
    tx_index: usize,
}

impl Receipt {
    pub fn new(
        status: ReceiptStatus,
        gas_used: u64,
        cumulative_gas_used: u64,
        logs: Vec<Log>,
        tx_index: usize,
    ) -> Self {
        Self {
            status,
            gas_used,
            cumulative_gas_used,
            logs,
            tx_index,
        }
    }

    pub fn status(&self) -> ReceiptStatus {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.status == ReceiptStatus::Success
    }

    pub fn gas_used(&self) -> u64 {
        self.gas_used
    }

    pub fn cumulative_gas_used(&self) -> u64 {
        self.cumulative_gas_used
    }

    pub fn logs(&self) -> &[Log] {
        &self.logs
    }

    pub fn tx_index(&self) -> usize {
        self.tx_index
    }
}
