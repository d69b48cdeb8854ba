//! Guardian-signed attestations (VAAs)
//!
//! # Format
//!
//! - version: u8, always 1
//! - guardian_set_index: u32
//! - signatures: u8 count, then per signature a guardian index (u8) and a
//!   65-byte recoverable secp256k1 signature
//! - body:
//!   - timestamp: u32
//!   - nonce: u32
//!   - emitter_chain: u16
//!   - emitter_address: bytes32
//!   - sequence: u64
//!   - consistency_level: u8
//!   - payload: remaining bytes
//!
//! Guardians sign `keccak256(keccak256(body))`.

use alloy_primitives::{keccak256, Bytes, FixedBytes, B256};
use serde::{Deserialize, Serialize};

use super::UniversalAddress;
use crate::layout::{serialize, Layout, LayoutError, LengthPrefix, Payload, Record, Schema, Value};

pub const VAA_VERSION: u8 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardianSignature {
    pub guardian_index: u8,
    pub signature: FixedBytes<65>,
}

/// A quorum-signed attestation with payload type `P`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vaa<P = Bytes> {
    pub guardian_set_index: u32,
    pub signatures: Vec<GuardianSignature>,
    pub timestamp: u32,
    pub nonce: u32,
    pub emitter_chain: u16,
    pub emitter_address: UniversalAddress,
    pub sequence: u64,
    pub consistency_level: u8,
    pub payload: P,
}

fn signature_layout() -> Layout {
    Layout::new().uint("guardian_index", 1).bytes("signature", 65)
}

fn body_layout<P: Payload>() -> Layout {
    Layout::new()
        .uint("timestamp", 4)
        .uint("nonce", 4)
        .uint("emitter_chain", 2)
        .bytes("emitter_address", 32)
        .uint("sequence", 8)
        .uint("consistency_level", 1)
        .tail("payload", P::slot_layout())
}

impl<P: Payload> Vaa<P> {
    fn body_value(&self) -> Value {
        Record::new()
            .with("timestamp", self.timestamp)
            .with("nonce", self.nonce)
            .with("emitter_chain", self.emitter_chain)
            .with("emitter_address", self.emitter_address.as_b256())
            .with("sequence", self.sequence)
            .with("consistency_level", self.consistency_level)
            .with("payload", self.payload.to_slot_value())
            .into()
    }

    /// The signed portion of the attestation.
    pub fn body(&self) -> Result<Vec<u8>, LayoutError> {
        serialize(&body_layout::<P>(), &self.body_value())
    }

    /// Hash guardians sign over.
    pub fn digest(&self) -> Result<B256, LayoutError> {
        Ok(keccak256(keccak256(self.body()?)))
    }

    /// Re-interprets the payload through another payload type.
    pub fn reinterpret<Q: Payload>(&self) -> Result<Vaa<Q>, LayoutError> {
        Vaa::<Q>::decode(&self.encode()?)
    }
}

impl<P: Payload> Schema for Vaa<P> {
    fn layout() -> Layout {
        Layout::new()
            .constant("version", [VAA_VERSION])
            .uint("guardian_set_index", 4)
            .array("signatures", LengthPrefix::U8, signature_layout())
            .nested("body", body_layout::<P>())
    }

    fn to_value(&self) -> Value {
        let signatures: Vec<Value> = self
            .signatures
            .iter()
            .map(|signature| {
                Record::new()
                    .with("guardian_index", signature.guardian_index)
                    .with("signature", signature.signature)
                    .into()
            })
            .collect();

        Record::new()
            .with("guardian_set_index", self.guardian_set_index)
            .with("signatures", signatures)
            .with("body", self.body_value())
            .into()
    }

    fn from_value(value: Value) -> Result<Self, LayoutError> {
        let mut record = value.try_into_record("vaa")?;
        let signatures = record
            .take_list("signatures")?
            .into_iter()
            .map(|item| {
                let mut signature = item.try_into_record("signatures")?;
                Ok(GuardianSignature {
                    guardian_index: signature.take_uint("guardian_index")?,
                    signature: signature.take_fixed("signature")?,
                })
            })
            .collect::<Result<Vec<_>, LayoutError>>()?;

        let mut body = record.take_record("body")?;
        Ok(Self {
            guardian_set_index: record.take_uint("guardian_set_index")?,
            signatures,
            timestamp: body.take_uint("timestamp")?,
            nonce: body.take_uint("nonce")?,
            emitter_chain: body.take_uint("emitter_chain")?,
            emitter_address: UniversalAddress::from(body.take_fixed::<32>("emitter_address")?),
            sequence: body.take_uint("sequence")?,
            consistency_level: body.take_uint("consistency_level")?,
            payload: P::from_slot_value(body.take_value("payload")?)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{
        Chain, ManagerMessage, NativeTokenTransfer, TransceiverMessage, TrimmedAmount,
        WormholeTransferMessage,
    };
    use alloy_primitives::hex;

    fn sample_vaa() -> Vaa {
        Vaa {
            guardian_set_index: 4,
            signatures: vec![
                GuardianSignature {
                    guardian_index: 0,
                    signature: FixedBytes::repeat_byte(0x01),
                },
                GuardianSignature {
                    guardian_index: 13,
                    signature: FixedBytes::repeat_byte(0x02),
                },
            ],
            timestamp: 1_700_000_000,
            nonce: 0,
            emitter_chain: Chain::Ethereum.id(),
            emitter_address: UniversalAddress::from([0xEE; 32]),
            sequence: 42,
            consistency_level: 1,
            payload: Bytes::from_static(&[0xCA, 0xFE]),
        }
    }

    #[test]
    fn test_vaa_roundtrip() {
        let vaa = sample_vaa();
        let bytes = vaa.encode().unwrap();
        assert_eq!(bytes[0], VAA_VERSION);
        assert_eq!(bytes.len(), 1 + 4 + 1 + 2 * 66 + 51 + 2);
        assert_eq!(Vaa::<Bytes>::decode(&bytes).unwrap(), vaa);
    }

    #[test]
    fn test_body_excludes_signatures() {
        let vaa = sample_vaa();
        let body = vaa.body().unwrap();
        let bytes = vaa.encode().unwrap();
        assert!(bytes.ends_with(&body));
        insta::assert_snapshot!(
            hex::encode(&body[..14]),
            @"6553f100000000000002eeeeeeee"
        );
    }

    #[test]
    fn test_digest_is_double_keccak() {
        let vaa = sample_vaa();
        let body = vaa.body().unwrap();
        assert_eq!(vaa.digest().unwrap(), keccak256(keccak256(&body)));

        let mut resigned = vaa.clone();
        resigned.signatures.clear();
        assert_eq!(resigned.digest().unwrap(), vaa.digest().unwrap());
    }

    #[test]
    fn test_rejects_unknown_version() {
        let mut bytes = sample_vaa().encode().unwrap();
        bytes[0] = 2;
        assert!(matches!(
            Vaa::<Bytes>::decode(&bytes),
            Err(LayoutError::DiscriminatorMismatch { field: "version", .. })
        ));
    }

    #[test]
    fn test_typed_payload() {
        let transfer: WormholeTransferMessage = TransceiverMessage {
            source_manager: UniversalAddress::from([1; 32]),
            recipient_manager: UniversalAddress::from([2; 32]),
            manager_payload: ManagerMessage {
                id: B256::with_last_byte(1),
                sender: UniversalAddress::from([3; 32]),
                payload: NativeTokenTransfer::new(
                    TrimmedAmount::new(5, 8),
                    UniversalAddress::from([4; 32]),
                    UniversalAddress::from([5; 32]),
                    Chain::Arbitrum,
                ),
            },
            transceiver_payload: Bytes::new(),
        };
        let raw = Vaa {
            payload: Bytes::from(transfer.encode().unwrap()),
            ..sample_vaa()
        };

        let typed: Vaa<WormholeTransferMessage> = raw.reinterpret().unwrap();
        assert_eq!(typed.payload, transfer);
        assert_eq!(typed.digest().unwrap(), raw.digest().unwrap());
    }

    #[test]
    fn test_truncated_signature_rejected() {
        let bytes = sample_vaa().encode().unwrap();
        assert!(matches!(
            Vaa::<Bytes>::decode(&bytes[..40]),
            Err(LayoutError::ShortBuffer {
                field: "signature",
                ..
            })
        ));
    }
}
