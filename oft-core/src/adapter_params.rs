//! Adapter params: gas and airdrop hints attached to a cross-chain send.
//!
//! ## Wire format
//!
//! - Version 1 (34 bytes): `u16 version | u256 gas`
//! - Version 2 (86 bytes): `u16 version | u256 gas | u256 nativeForDst | address receiver`
//!
//! All integers are big-endian.

use ethereum_types::{Address, U256};

use crate::error::{OmniError, Result};

const V1_LEN: usize = 2 + 32;
const V2_LEN: usize = 2 + 32 + 32 + 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterParams {
    /// Gas top-up only.
    V1 { gas: U256 },
    /// Gas plus a native airdrop to `native_receiver` on the destination.
    V2 {
        gas: U256,
        native_for_dst: U256,
        native_receiver: Address,
    },
}

impl AdapterParams {
    pub const VERSION_1: u16 = 1;
    pub const VERSION_2: u16 = 2;

    pub fn v1(gas: u64) -> Self {
        AdapterParams::V1 {
            gas: U256::from(gas),
        }
    }

    pub fn version(&self) -> u16 {
        match self {
            AdapterParams::V1 { .. } => Self::VERSION_1,
            AdapterParams::V2 { .. } => Self::VERSION_2,
        }
    }

    /// Gas allotted to destination execution.
    pub fn gas(&self) -> U256 {
        match self {
            AdapterParams::V1 { gas } | AdapterParams::V2 { gas, .. } => *gas,
        }
    }

    /// Native amount to airdrop on the destination (zero for version 1).
    pub fn airdrop(&self) -> U256 {
        match self {
            AdapterParams::V1 { .. } => U256::zero(),
            AdapterParams::V2 { native_for_dst, .. } => *native_for_dst,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(V2_LEN);
        out.extend_from_slice(&self.version().to_be_bytes());
        push_word(&mut out, self.gas());
        if let AdapterParams::V2 {
            native_for_dst,
            native_receiver,
            ..
        } = self
        {
            push_word(&mut out, *native_for_dst);
            out.extend_from_slice(native_receiver.as_bytes());
        }
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 2 {
            return Err(OmniError::InvalidAdapterParams(
                "too short to carry a version".to_string(),
            ));
        }
        let version = u16::from_be_bytes([bytes[0], bytes[1]]);
        match version {
            Self::VERSION_1 => {
                if bytes.len() != V1_LEN {
                    return Err(OmniError::InvalidAdapterParams(format!(
                        "version 1 expects {} bytes, got {}",
                        V1_LEN,
                        bytes.len()
                    )));
                }
                Ok(AdapterParams::V1 {
                    gas: U256::from_big_endian(&bytes[2..34]),
                })
            }
            Self::VERSION_2 => {
                if bytes.len() != V2_LEN {
                    return Err(OmniError::InvalidAdapterParams(format!(
                        "version 2 expects {} bytes, got {}",
                        V2_LEN,
                        bytes.len()
                    )));
                }
                Ok(AdapterParams::V2 {
                    gas: U256::from_big_endian(&bytes[2..34]),
                    native_for_dst: U256::from_big_endian(&bytes[34..66]),
                    native_receiver: Address::from_slice(&bytes[66..86]),
                })
            }
            other => Err(OmniError::InvalidAdapterParams(format!(
                "unsupported version {}",
                other
            ))),
        }
    }
}

fn push_word(out: &mut Vec<u8>, value: U256) {
    let mut word = [0u8; 32];
    value.to_big_endian(&mut word);
    out.extend_from_slice(&word);
}
