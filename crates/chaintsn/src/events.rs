//! Log topics emitted by the transaction kinds.

use parexec_primitives::{B256, keccak256};

pub fn transfer_topic() -> B256 {
    keccak256(b"Transfer(address,address,uint256)")
}

pub fn code_deployed_topic() -> B256 {
    keccak256(b"CodeDeployed(address,address,uint64)")
}

pub fn kv_put_topic() -> B256 {
    keccak256(b"KvPut(address,bytes32,uint64)")
}

pub fn sys_action_topic() -> B256 {
    keccak256(b"SystemAction(address,bytes32)")
}
