//! Collection of generic internal data types that are used widely.
//!
//! Everything here is plain data: the fixed system addresses, the 32-byte
//! state word conversions and the storage slot derivations shared by the
//! state transition and the access-set analyzer. The two sides must agree
//! on every slot bit-for-bit, so both only ever go through this crate.

pub mod addresses;
pub mod slots;
pub mod word;

pub use alloy_primitives::{Address, B256, Bytes, Keccak256, U256, keccak256};

/// Key of a storage slot within an account.
pub type StorageKey = B256;

/// Value held in a storage slot.
pub type StorageValue = B256;

/// Height of a block.
pub type BlockNumber = u64;

pub mod prelude {
    pub use crate::{
        Address, B256, BlockNumber, Bytes, StorageKey, StorageValue, U256, addresses::*,
    };
}
