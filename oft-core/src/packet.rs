//! Token packet codec.
//!
//! ## Wire format
//!
//! ```text
//! PT_SEND          : u8 type | bytes32 to | u64 amountSD                                  (41 bytes)
//! PT_SEND_AND_CALL : u8 type | bytes32 to | u64 amountSD | bytes32 from | u64 gasForCall | payload
//! ```
//!
//! Amounts travel in shared decimals; integers are big-endian.

use ethereum_types::Address;

use crate::error::{OmniError, Result};
use crate::types::{address_to_bytes32, bytes32_to_address, PT_SEND, PT_SEND_AND_CALL};

const SEND_LEN: usize = 1 + 32 + 8;
const SEND_AND_CALL_HEADER_LEN: usize = SEND_LEN + 32 + 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenPacket {
    Send {
        to: Address,
        amount_sd: u64,
    },
    SendAndCall {
        to: Address,
        amount_sd: u64,
        from: Address,
        gas_for_call: u64,
        payload: Vec<u8>,
    },
}

impl TokenPacket {
    pub fn packet_type(&self) -> u8 {
        match self {
            TokenPacket::Send { .. } => PT_SEND,
            TokenPacket::SendAndCall { .. } => PT_SEND_AND_CALL,
        }
    }

    pub fn to(&self) -> Address {
        match self {
            TokenPacket::Send { to, .. } | TokenPacket::SendAndCall { to, .. } => *to,
        }
    }

    pub fn amount_sd(&self) -> u64 {
        match self {
            TokenPacket::Send { amount_sd, .. } | TokenPacket::SendAndCall { amount_sd, .. } => {
                *amount_sd
            }
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(SEND_AND_CALL_HEADER_LEN);
        out.push(self.packet_type());
        out.extend_from_slice(&address_to_bytes32(&self.to()));
        out.extend_from_slice(&self.amount_sd().to_be_bytes());
        if let TokenPacket::SendAndCall {
            from,
            gas_for_call,
            payload,
            ..
        } = self
        {
            out.extend_from_slice(&address_to_bytes32(from));
            out.extend_from_slice(&gas_for_call.to_be_bytes());
            out.extend_from_slice(payload);
        }
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let packet_type = *bytes
            .first()
            .ok_or_else(|| OmniError::InvalidPayload("empty packet".to_string()))?;
        match packet_type {
            PT_SEND => {
                if bytes.len() != SEND_LEN {
                    return Err(OmniError::InvalidPayload(format!(
                        "send packet must be {} bytes, got {}",
                        SEND_LEN,
                        bytes.len()
                    )));
                }
                Ok(TokenPacket::Send {
                    to: bytes32_to_address(&bytes[1..33])?,
                    amount_sd: read_u64(&bytes[33..41]),
                })
            }
            PT_SEND_AND_CALL => {
                if bytes.len() < SEND_AND_CALL_HEADER_LEN {
                    return Err(OmniError::InvalidPayload(format!(
                        "send-and-call packet needs at least {} bytes, got {}",
                        SEND_AND_CALL_HEADER_LEN,
                        bytes.len()
                    )));
                }
                Ok(TokenPacket::SendAndCall {
                    to: bytes32_to_address(&bytes[1..33])?,
                    amount_sd: read_u64(&bytes[33..41]),
                    from: bytes32_to_address(&bytes[41..73])?,
                    gas_for_call: read_u64(&bytes[73..81]),
                    payload: bytes[81..].to_vec(),
                })
            }
            other => Err(OmniError::InvalidPayload(format!(
                "unknown packet type {}",
                other
            ))),
        }
    }
}

fn read_u64(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(bytes);
    u64::from_be_bytes(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_and_call_layout_offsets() {
        let packet = TokenPacket::SendAndCall {
            to: Address::from_low_u64_be(0xaa),
            amount_sd: 7,
            from: Address::from_low_u64_be(0xbb),
            gas_for_call: 300_000,
            payload: vec![1, 2, 3],
        };
        let bytes = packet.encode();

        assert_eq!(bytes.len(), SEND_AND_CALL_HEADER_LEN + 3);
        assert_eq!(bytes[0], PT_SEND_AND_CALL);
        assert_eq!(bytes[32], 0xaa, "to is right-aligned in its word");
        assert_eq!(read_u64(&bytes[33..41]), 7);
        assert_eq!(bytes[72], 0xbb, "from is right-aligned in its word");
        assert_eq!(read_u64(&bytes[73..81]), 300_000);
        assert_eq!(&bytes[81..], &[1, 2, 3]);
    }

    #[test]
    fn test_send_rejects_trailing_bytes() {
        let mut bytes = TokenPacket::Send {
            to: Address::from_low_u64_be(1),
            amount_sd: 1,
        }
        .encode();
        bytes.push(0);

        assert!(matches!(
            TokenPacket::decode(&bytes),
            Err(OmniError::InvalidPayload(_))
        ));
    }
}
