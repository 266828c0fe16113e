use parexec_primitives::prelude::*;

/// Operations of a general contract VM that no transaction kind here can
/// reach.  They exist so callers written against a wider state interface
/// have somewhere to send them, and they are never recorded.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum InertOp {
    DestroyAccount(Address),
    IterateStorage(Address),
    RecordPreimage(B256),
    AddRefund(u64),
    SubRefund(u64),
    WarmAddress(Address),
    WarmSlot(Address, StorageKey),
}

impl InertOp {
    pub fn name(&self) -> &'static str {
        match self {
            Self::DestroyAccount(_) => "destroy_account",
            Self::IterateStorage(_) => "iterate_storage",
            Self::RecordPreimage(_) => "record_preimage",
            Self::AddRefund(_) => "add_refund",
            Self::SubRefund(_) => "sub_refund",
            Self::WarmAddress(_) => "warm_address",
            Self::WarmSlot(..) => "warm_slot",
        }
    }
}
