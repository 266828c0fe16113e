//! Conversions between scalar values and 32-byte state words.
//!
//! Integers are stored big-endian in the low bytes of the word, addresses are
//! right-aligned in the last 20 bytes.

use alloy_primitives::{Address, B256, U256};

pub fn u64_to_word(v: u64) -> B256 {
    let mut word = B256::ZERO;
    word.0[24..].copy_from_slice(&v.to_be_bytes());
    word
}

/// Reads the low 8 bytes of the word. Higher bytes are ignored.
pub fn word_to_u64(word: &B256) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&word.0[24..]);
    u64::from_be_bytes(buf)
}

pub fn u256_to_word(v: U256) -> B256 {
    B256::from(v.to_be_bytes::<32>())
}

pub fn word_to_u256(word: &B256) -> U256 {
    U256::from_be_bytes(word.0)
}

pub fn address_to_word(addr: &Address) -> B256 {
    addr.into_word()
}

pub fn word_to_address(word: &B256) -> Address {
    Address::from_word(*word)
}

pub fn bool_to_word(v: bool) -> B256 {
    let mut word = B256::ZERO;
    word.0[31] = v as u8;
    word
}

pub fn word_to_bool(word: &B256) -> bool {
    word.0[31] != 0
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    proptest! {
        #[test]
        fn test_u64_word_roundtrip(v in any::<u64>()) {
            prop_assert_eq!(word_to_u64(&u64_to_word(v)), v);
        }
    }

    #[test]
    fn test_word_layouts() {
        let w = u64_to_word(0x0102);
        assert_eq!(w.0[30], 0x01);
        assert_eq!(w.0[31], 0x02);
        assert!(w.0[..24].iter().all(|b| *b == 0));

        let addr = Address::with_last_byte(0xab);
        let aw = address_to_word(&addr);
        assert!(aw.0[..12].iter().all(|b| *b == 0));
        assert_eq!(word_to_address(&aw), addr);

        assert_eq!(word_to_u256(&u256_to_word(U256::from(77u64))), U256::from(77u64));
        assert!(word_to_bool(&bool_to_word(true)));
        assert_eq!(bool_to_word(false), B256::ZERO);
    }
}
