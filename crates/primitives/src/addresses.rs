//! Fixed addresses with protocol meaning.
//!
//! The first three are recipient sentinels: a message sent to one of them is
//! not a transfer but selects the system-action or KV-put handler. The
//! registries own the shared index state those handlers maintain.

use alloy_primitives::{Address, address};

/// Recipient sentinel selecting the system/validator action handler.
pub const SYSTEM_ACTION_ADDRESS: Address = address!("0x0000000000000000000000000000000050585331");

/// Owner of all validator registry state and of staked funds.
pub const VALIDATOR_REGISTRY_ADDRESS: Address =
    address!("0x0000000000000000000000000000000050585332");

/// Recipient sentinel selecting the KV-put handler. Also owns the KV expiry
/// bucket index.
pub const KV_ROUTER_ADDRESS: Address = address!("0x000000000000000000000000000000005058564b");

/// Owner of the code-deploy expiry bucket index.
pub const CODE_REGISTRY_ADDRESS: Address = address!("0x0000000000000000000000000000000050584352");

/// Sentinel that never holds state. An access set writing it conflicts with
/// every other access set.
pub const UNIVERSAL_CONFLICT_ADDRESS: Address =
    address!("0xffffffffffffffffffffffffffffffffffffffff");

/// Returns if the address is one of the fixed protocol addresses above.
pub fn is_system_address(addr: &Address) -> bool {
    [
        SYSTEM_ACTION_ADDRESS,
        VALIDATOR_REGISTRY_ADDRESS,
        KV_ROUTER_ADDRESS,
        CODE_REGISTRY_ADDRESS,
        UNIVERSAL_CONFLICT_ADDRESS,
    ]
    .contains(addr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_addresses_are_distinct() {
        let all = [
            SYSTEM_ACTION_ADDRESS,
            VALIDATOR_REGISTRY_ADDRESS,
            KV_ROUTER_ADDRESS,
            CODE_REGISTRY_ADDRESS,
            UNIVERSAL_CONFLICT_ADDRESS,
        ];
        for (i, a) in all.iter().enumerate() {
            assert!(is_system_address(a));
            for b in &all[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert!(!is_system_address(&Address::with_last_byte(7)));
    }
}
