//! Primitive types and address helpers shared across the crate.
//!
//! Addresses are 20-byte EVM addresses. On the wire they travel as 32-byte
//! words, left-padded with zeros.

use ethereum_types::{Address, H256};

use crate::error::{OmniError, Result};

/// Ledger identifier. Only unique within a configured set of paired chains.
pub type ChainId = u32;

/// Plain value credit.
pub const PT_SEND: u8 = 0;
/// Value credit followed by a receiver hook invocation.
pub const PT_SEND_AND_CALL: u8 = 1;

/// Parse a `0x`-prefixed (or bare) 40 hex character address.
pub fn parse_address(value: &str) -> Result<Address> {
    let hex_part = value.strip_prefix("0x").unwrap_or(value);
    let bytes = hex::decode(hex_part)
        .map_err(|e| OmniError::InvalidPayload(format!("invalid address '{}': {}", value, e)))?;
    if bytes.len() != 20 {
        return Err(OmniError::InvalidPayload(format!(
            "address '{}' must be 20 bytes, got {}",
            value,
            bytes.len()
        )));
    }
    Ok(Address::from_slice(&bytes))
}

/// Left-pad an address into a 32-byte word.
pub fn address_to_bytes32(address: &Address) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address.as_bytes());
    word
}

/// Read an address from a 32-byte word, rejecting non-zero padding.
pub fn bytes32_to_address(word: &[u8]) -> Result<Address> {
    if word.len() != 32 {
        return Err(OmniError::InvalidPayload(format!(
            "address word must be 32 bytes, got {}",
            word.len()
        )));
    }
    if word[..12].iter().any(|b| *b != 0) {
        return Err(OmniError::InvalidPayload(
            "address word has non-zero padding".to_string(),
        ));
    }
    Ok(Address::from_slice(&word[12..]))
}

/// `0x`-prefixed lowercase hex, used in log lines.
pub fn hex_address(address: &Address) -> String {
    format!("0x{}", hex::encode(address.as_bytes()))
}

/// `0x`-prefixed lowercase hex of a hash.
pub fn hex_hash(hash: &H256) -> String {
    format!("0x{}", hex::encode(hash.as_bytes()))
}
