//! NTT wire message types
//!
//! Every message is described as a [`Layout`] and encoded through the
//! generic codec. Discriminated messages start with a fixed 4-byte prefix
//! which doubles as a magic number: decoding bytes of one message type with
//! another type's schema always fails on the prefix.
//!
//! # Nesting
//!
//! ```text
//! TransceiverMessage (0x9945FF10)
//! ├── source_manager / recipient_manager
//! ├── manager_payload (u16 length)  ──► ManagerMessage
//! │                                     ├── id / sender
//! │                                     └── payload (u16 length) ──► NativeTokenTransfer (0x994E5454)
//! └── transceiver_payload (u16 length)
//! ```
//!
//! Payload slots are generic: [`Bytes`] keeps a slot raw, any [`Schema`]
//! type decodes it structurally.

use alloy_primitives::{hex, keccak256, Bytes, B256};
use serde::{Deserialize, Serialize};

use super::{Chain, TrimmedAmount, UniversalAddress};
use crate::layout::{
    deserialize, Layout, LayoutError, LengthPrefix, Payload, Record, Schema, Value,
};

/// Prefix of a [`NativeTokenTransfer`] payload.
pub const NATIVE_TOKEN_TRANSFER_PREFIX: [u8; 4] = [0x99, 0x4E, 0x54, 0x54];
/// Prefix of a [`TransceiverMessage`].
pub const WORMHOLE_TRANSCEIVER_MESSAGE_PREFIX: [u8; 4] = [0x99, 0x45, 0xFF, 0x10];
/// Prefix of a [`TransceiverInfo`] announcement.
pub const TRANSCEIVER_INFO_PREFIX: [u8; 4] = [0x9C, 0x23, 0xBD, 0x3B];
/// Prefix of a [`TransceiverRegistration`].
pub const TRANSCEIVER_REGISTRATION_PREFIX: [u8; 4] = [0x18, 0xFC, 0x67, 0xC2];

fn address_field(record: &mut Record, name: &'static str) -> Result<UniversalAddress, LayoutError> {
    Ok(UniversalAddress::from(record.take_fixed::<32>(name)?))
}

/// A single token movement.
///
/// # Format
///
/// - prefix: 0x994E5454 (4 bytes)
/// - trimmed amount: decimals u8, amount u64 (9 bytes)
/// - source_token: bytes32
/// - to: bytes32, recipient on the destination chain
/// - to_chain: u16, Wormhole chain id of the destination
///
/// Total fixed size: 4 + 9 + 32 + 32 + 2 = 79 bytes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeTokenTransfer {
    pub trimmed_amount: TrimmedAmount,
    pub source_token: UniversalAddress,
    pub to: UniversalAddress,
    /// Kept as the raw id so transfers to chains unknown to this crate still
    /// decode; see [`NativeTokenTransfer::recipient_chain`].
    pub to_chain: u16,
}

impl NativeTokenTransfer {
    pub const SIZE: usize = 79;

    pub fn new(
        trimmed_amount: TrimmedAmount,
        source_token: UniversalAddress,
        to: UniversalAddress,
        to_chain: Chain,
    ) -> Self {
        Self {
            trimmed_amount,
            source_token,
            to,
            to_chain: to_chain.id(),
        }
    }

    pub fn recipient_chain(&self) -> Option<Chain> {
        Chain::from_id(self.to_chain)
    }
}

impl Schema for NativeTokenTransfer {
    fn layout() -> Layout {
        Layout::new()
            .constant("prefix", NATIVE_TOKEN_TRANSFER_PREFIX)
            .nested("trimmed_amount", TrimmedAmount::layout())
            .bytes("source_token", 32)
            .bytes("to", 32)
            .uint("to_chain", 2)
    }

    fn to_value(&self) -> Value {
        Record::new()
            .with("trimmed_amount", self.trimmed_amount.to_value())
            .with("source_token", self.source_token.as_b256())
            .with("to", self.to.as_b256())
            .with("to_chain", self.to_chain)
            .into()
    }

    fn from_value(value: Value) -> Result<Self, LayoutError> {
        let mut record = value.try_into_record("native_token_transfer")?;
        Ok(Self {
            trimmed_amount: TrimmedAmount::from_value(record.take_value("trimmed_amount")?)?,
            source_token: address_field(&mut record, "source_token")?,
            to: address_field(&mut record, "to")?,
            to_chain: record.take_uint("to_chain")?,
        })
    }
}

/// Envelope a manager attaches to every outbound message.
///
/// `P` selects how the payload is interpreted; the default keeps it raw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerMessage<P = Bytes> {
    /// Sequence number assigned by the source manager, left-padded.
    pub id: B256,
    pub sender: UniversalAddress,
    pub payload: P,
}

impl<P: Payload> ManagerMessage<P> {
    /// Replay-protection key: `keccak256(u16 source chain id ‖ encoded message)`.
    pub fn digest(&self, source_chain: u16) -> Result<B256, LayoutError> {
        let encoded = self.encode()?;
        let mut preimage = Vec::with_capacity(2 + encoded.len());
        preimage.extend_from_slice(&source_chain.to_be_bytes());
        preimage.extend_from_slice(&encoded);
        Ok(keccak256(preimage))
    }

    /// Re-interprets the payload through another payload type.
    pub fn reinterpret<Q: Payload>(&self) -> Result<ManagerMessage<Q>, LayoutError> {
        ManagerMessage::<Q>::decode(&self.encode()?)
    }
}

impl<P: Payload> Schema for ManagerMessage<P> {
    fn layout() -> Layout {
        Layout::new()
            .bytes("id", 32)
            .bytes("sender", 32)
            .prefixed("payload", LengthPrefix::U16, P::slot_layout())
    }

    fn to_value(&self) -> Value {
        Record::new()
            .with("id", self.id)
            .with("sender", self.sender.as_b256())
            .with("payload", self.payload.to_slot_value())
            .into()
    }

    fn from_value(value: Value) -> Result<Self, LayoutError> {
        let mut record = value.try_into_record("manager_message")?;
        Ok(Self {
            id: record.take_fixed("id")?,
            sender: address_field(&mut record, "sender")?,
            payload: P::from_slot_value(record.take_value("payload")?)?,
        })
    }
}

/// Message a transceiver publishes on behalf of a manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransceiverMessage<M = Bytes, T = Bytes> {
    pub source_manager: UniversalAddress,
    pub recipient_manager: UniversalAddress,
    pub manager_payload: M,
    pub transceiver_payload: T,
}

impl<M: Payload, T: Payload> Schema for TransceiverMessage<M, T> {
    fn layout() -> Layout {
        Layout::new()
            .constant("prefix", WORMHOLE_TRANSCEIVER_MESSAGE_PREFIX)
            .bytes("source_manager", 32)
            .bytes("recipient_manager", 32)
            .prefixed("manager_payload", LengthPrefix::U16, M::slot_layout())
            .prefixed("transceiver_payload", LengthPrefix::U16, T::slot_layout())
    }

    fn to_value(&self) -> Value {
        Record::new()
            .with("source_manager", self.source_manager.as_b256())
            .with("recipient_manager", self.recipient_manager.as_b256())
            .with("manager_payload", self.manager_payload.to_slot_value())
            .with("transceiver_payload", self.transceiver_payload.to_slot_value())
            .into()
    }

    fn from_value(value: Value) -> Result<Self, LayoutError> {
        let mut record = value.try_into_record("transceiver_message")?;
        Ok(Self {
            source_manager: address_field(&mut record, "source_manager")?,
            recipient_manager: address_field(&mut record, "recipient_manager")?,
            manager_payload: M::from_slot_value(record.take_value("manager_payload")?)?,
            transceiver_payload: T::from_slot_value(record.take_value("transceiver_payload")?)?,
        })
    }
}

/// The attestation payload of a Wormhole-transceiver token transfer.
pub type WormholeTransferMessage = TransceiverMessage<ManagerMessage<NativeTokenTransfer>, Bytes>;

/// Custody mode of a manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ManagerMode {
    Locking = 0,
    Burning = 1,
}

impl TryFrom<u8> for ManagerMode {
    type Error = LayoutError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Locking),
            1 => Ok(Self::Burning),
            other => Err(LayoutError::InvalidValue {
                field: "manager_mode",
                reason: format!("unknown manager mode {other}"),
            }),
        }
    }
}

/// Announcement a transceiver publishes when it is initialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransceiverInfo {
    pub manager_address: UniversalAddress,
    pub manager_mode: ManagerMode,
    pub token_address: UniversalAddress,
    pub token_decimals: u8,
}

impl Schema for TransceiverInfo {
    fn layout() -> Layout {
        Layout::new()
            .constant("prefix", TRANSCEIVER_INFO_PREFIX)
            .bytes("manager_address", 32)
            .uint("manager_mode", 1)
            .bytes("token_address", 32)
            .uint("token_decimals", 1)
    }

    fn to_value(&self) -> Value {
        Record::new()
            .with("manager_address", self.manager_address.as_b256())
            .with("manager_mode", self.manager_mode as u8)
            .with("token_address", self.token_address.as_b256())
            .with("token_decimals", self.token_decimals)
            .into()
    }

    fn from_value(value: Value) -> Result<Self, LayoutError> {
        let mut record = value.try_into_record("transceiver_info")?;
        Ok(Self {
            manager_address: address_field(&mut record, "manager_address")?,
            manager_mode: ManagerMode::try_from(record.take_uint::<u8>("manager_mode")?)?,
            token_address: address_field(&mut record, "token_address")?,
            token_decimals: record.take_uint("token_decimals")?,
        })
    }
}

/// Registration of a peer transceiver on another chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransceiverRegistration {
    pub chain: u16,
    pub transceiver_address: UniversalAddress,
}

impl Schema for TransceiverRegistration {
    fn layout() -> Layout {
        Layout::new()
            .constant("prefix", TRANSCEIVER_REGISTRATION_PREFIX)
            .uint("chain", 2)
            .bytes("transceiver_address", 32)
    }

    fn to_value(&self) -> Value {
        Record::new()
            .with("chain", self.chain)
            .with("transceiver_address", self.transceiver_address.as_b256())
            .into()
    }

    fn from_value(value: Value) -> Result<Self, LayoutError> {
        let mut record = value.try_into_record("transceiver_registration")?;
        Ok(Self {
            chain: record.take_uint("chain")?,
            transceiver_address: address_field(&mut record, "transceiver_address")?,
        })
    }
}

/// Per-transceiver instruction passed alongside a transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransceiverInstruction {
    /// Index of the transceiver in the manager's registry.
    pub index: u8,
    pub payload: Bytes,
}

impl TransceiverInstruction {
    /// Instruction for the Wormhole transceiver.
    pub fn wormhole(index: u8, should_skip_relayer_send: bool) -> Result<Self, LayoutError> {
        let payload = WormholeTransceiverInstruction {
            should_skip_relayer_send,
        }
        .encode()?;
        Ok(Self {
            index,
            payload: payload.into(),
        })
    }
}

impl Schema for TransceiverInstruction {
    fn layout() -> Layout {
        Layout::new()
            .uint("index", 1)
            .prefixed("payload", LengthPrefix::U8, None)
    }

    fn to_value(&self) -> Value {
        Record::new()
            .with("index", self.index)
            .with("payload", self.payload.clone())
            .into()
    }

    fn from_value(value: Value) -> Result<Self, LayoutError> {
        let mut record = value.try_into_record("transceiver_instruction")?;
        Ok(Self {
            index: record.take_uint("index")?,
            payload: record.take_bytes("payload")?,
        })
    }
}

/// Ordered list of instructions, one per enabled transceiver at most.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransceiverInstructions(pub Vec<TransceiverInstruction>);

impl Schema for TransceiverInstructions {
    fn layout() -> Layout {
        Layout::new().array("instructions", LengthPrefix::U8, TransceiverInstruction::layout())
    }

    fn to_value(&self) -> Value {
        let items: Vec<Value> = self.0.iter().map(Schema::to_value).collect();
        Record::new().with("instructions", items).into()
    }

    fn from_value(value: Value) -> Result<Self, LayoutError> {
        let mut record = value.try_into_record("transceiver_instructions")?;
        record
            .take_list("instructions")?
            .into_iter()
            .map(TransceiverInstruction::from_value)
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

/// Wormhole-transceiver specific instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WormholeTransceiverInstruction {
    /// Publish the message without requesting standard relaying.
    pub should_skip_relayer_send: bool,
}

impl Schema for WormholeTransceiverInstruction {
    fn layout() -> Layout {
        Layout::new().uint("should_skip_relayer_send", 1)
    }

    fn to_value(&self) -> Value {
        Record::new()
            .with("should_skip_relayer_send", self.should_skip_relayer_send)
            .into()
    }

    fn from_value(value: Value) -> Result<Self, LayoutError> {
        let mut record = value.try_into_record("wormhole_transceiver_instruction")?;
        Ok(Self {
            should_skip_relayer_send: record.take_bool("should_skip_relayer_send")?,
        })
    }
}

/// The known catalogue of discriminated NTT messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NttMessage {
    NativeTokenTransfer(NativeTokenTransfer),
    TransceiverMessage(TransceiverMessage),
    TransceiverInfo(TransceiverInfo),
    TransceiverRegistration(TransceiverRegistration),
}

impl NttMessage {
    /// Decodes by dispatching on the leading 4-byte prefix.
    pub fn decode(bytes: &[u8]) -> Result<Self, LayoutError> {
        let prefix: [u8; 4] = bytes
            .get(..4)
            .and_then(|slice| slice.try_into().ok())
            .ok_or(LayoutError::ShortBuffer {
                field: "prefix",
                needed: 4,
                remaining: bytes.len(),
            })?;

        match prefix {
            NATIVE_TOKEN_TRANSFER_PREFIX => {
                NativeTokenTransfer::decode(bytes).map(Self::NativeTokenTransfer)
            }
            WORMHOLE_TRANSCEIVER_MESSAGE_PREFIX => {
                TransceiverMessage::decode(bytes).map(Self::TransceiverMessage)
            }
            TRANSCEIVER_INFO_PREFIX => TransceiverInfo::decode(bytes).map(Self::TransceiverInfo),
            TRANSCEIVER_REGISTRATION_PREFIX => {
                TransceiverRegistration::decode(bytes).map(Self::TransceiverRegistration)
            }
            unknown => Err(LayoutError::UnknownDiscriminator(hex::encode(unknown))),
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, LayoutError> {
        match self {
            Self::NativeTokenTransfer(message) => message.encode(),
            Self::TransceiverMessage(message) => message.encode(),
            Self::TransceiverInfo(message) => message.encode(),
            Self::TransceiverRegistration(message) => message.encode(),
        }
    }

    pub fn prefix(&self) -> [u8; 4] {
        match self {
            Self::NativeTokenTransfer(_) => NATIVE_TOKEN_TRANSFER_PREFIX,
            Self::TransceiverMessage(_) => WORMHOLE_TRANSCEIVER_MESSAGE_PREFIX,
            Self::TransceiverInfo(_) => TRANSCEIVER_INFO_PREFIX,
            Self::TransceiverRegistration(_) => TRANSCEIVER_REGISTRATION_PREFIX,
        }
    }
}

/// Decodes a raw slot once its type is known.
pub fn decode_slot<P: Payload>(raw: &Bytes) -> Result<P, LayoutError> {
    match P::slot_layout() {
        Some(layout) => P::from_slot_value(deserialize(&layout, raw)?),
        None => P::from_slot_value(Value::Bytes(raw.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ChainFamily;
    use alloy_primitives::address;
    use rstest::rstest;

    fn sample_transfer() -> NativeTokenTransfer {
        NativeTokenTransfer::new(
            TrimmedAmount::new(123_456_789, 8),
            UniversalAddress::from([0x11; 32]),
            UniversalAddress::from([0x22; 32]),
            Chain::Solana,
        )
    }

    fn sample_manager_message() -> ManagerMessage<NativeTokenTransfer> {
        ManagerMessage {
            id: B256::with_last_byte(7),
            sender: UniversalAddress::from(address!("742d35Cc6634C0532925a3b844Bc9e7595f8fA0d")),
            payload: sample_transfer(),
        }
    }

    fn sample_wormhole_transfer() -> WormholeTransferMessage {
        TransceiverMessage {
            source_manager: UniversalAddress::from([0xAA; 32]),
            recipient_manager: UniversalAddress::from([0xBB; 32]),
            manager_payload: sample_manager_message(),
            transceiver_payload: Bytes::new(),
        }
    }

    #[test]
    fn test_native_token_transfer_bytes() {
        let bytes = sample_transfer().encode().unwrap();
        assert_eq!(bytes.len(), NativeTokenTransfer::SIZE);
        assert_eq!(&bytes[..4], &NATIVE_TOKEN_TRANSFER_PREFIX);
        assert_eq!(bytes[4], 0x08);
        assert_eq!(&bytes[5..13], &hex::decode("00000000075BCD15").unwrap()[..]);
        assert_eq!(&bytes[13..45], &[0x11; 32]);
        assert_eq!(&bytes[45..77], &[0x22; 32]);
        assert_eq!(&bytes[77..], &[0x00, 0x01]);
        assert_eq!(NativeTokenTransfer::layout().fixed_size(), Some(79));
    }

    #[test]
    fn test_manager_message_roundtrip() {
        let message = sample_manager_message();
        let bytes = message.encode().unwrap();
        assert_eq!(bytes.len(), 32 + 32 + 2 + NativeTokenTransfer::SIZE);
        assert_eq!(ManagerMessage::<NativeTokenTransfer>::decode(&bytes).unwrap(), message);

        let raw = ManagerMessage::<Bytes>::decode(&bytes).unwrap();
        assert_eq!(raw.payload.len(), NativeTokenTransfer::SIZE);
        assert_eq!(raw.encode().unwrap(), bytes);
        assert_eq!(
            decode_slot::<NativeTokenTransfer>(&raw.payload).unwrap(),
            sample_transfer()
        );
        assert_eq!(raw.reinterpret::<NativeTokenTransfer>().unwrap(), message);
    }

    #[test]
    fn test_digest_binds_chain_and_message() {
        let message = sample_manager_message();
        let ethereum = message.digest(Chain::Ethereum.id()).unwrap();
        assert_ne!(ethereum, message.digest(Chain::Arbitrum.id()).unwrap());

        let mut preimage = vec![0x00, 0x02];
        preimage.extend(message.encode().unwrap());
        assert_eq!(ethereum, keccak256(preimage));

        // raw and typed views hash identically
        let raw: ManagerMessage = message.reinterpret().unwrap();
        assert_eq!(raw.digest(Chain::Ethereum.id()).unwrap(), ethereum);
    }

    #[test]
    fn test_wormhole_transfer_roundtrip() {
        let message = sample_wormhole_transfer();
        let bytes = message.encode().unwrap();
        assert_eq!(&bytes[..4], &WORMHOLE_TRANSCEIVER_MESSAGE_PREFIX);
        assert_eq!(WormholeTransferMessage::decode(&bytes).unwrap(), message);

        match NttMessage::decode(&bytes).unwrap() {
            NttMessage::TransceiverMessage(raw) => {
                assert_eq!(raw.source_manager, message.source_manager);
                let inner: ManagerMessage<NativeTokenTransfer> =
                    decode_slot(&raw.manager_payload).unwrap();
                assert_eq!(inner, message.manager_payload);
            }
            other => panic!("unexpected message {other:?}"),
        }
    }

    #[test]
    fn test_transceiver_info_roundtrip() {
        let info = TransceiverInfo {
            manager_address: UniversalAddress::from([1; 32]),
            manager_mode: ManagerMode::Burning,
            token_address: UniversalAddress::from([2; 32]),
            token_decimals: 18,
        };
        let bytes = info.encode().unwrap();
        assert_eq!(bytes.len(), 4 + 32 + 1 + 32 + 1);
        assert_eq!(NttMessage::decode(&bytes).unwrap(), NttMessage::TransceiverInfo(info));
    }

    #[test]
    fn test_transceiver_info_rejects_unknown_mode() {
        let mut bytes = TransceiverInfo {
            manager_address: UniversalAddress::ZERO,
            manager_mode: ManagerMode::Locking,
            token_address: UniversalAddress::ZERO,
            token_decimals: 6,
        }
        .encode()
        .unwrap();
        bytes[36] = 9;
        assert!(matches!(
            TransceiverInfo::decode(&bytes),
            Err(LayoutError::InvalidValue {
                field: "manager_mode",
                ..
            })
        ));
    }

    #[test]
    fn test_transceiver_registration_bytes() {
        let registration = TransceiverRegistration {
            chain: Chain::Solana.id(),
            transceiver_address: UniversalAddress::parse(
                ChainFamily::Solana,
                "So11111111111111111111111111111111111111112",
            )
            .unwrap(),
        };
        let bytes = registration.encode().unwrap();
        insta::assert_snapshot!(
            hex::encode(&bytes[..6]),
            @"18fc67c20001"
        );
        assert_eq!(TransceiverRegistration::decode(&bytes).unwrap(), registration);
    }

    #[rstest]
    #[case(NATIVE_TOKEN_TRANSFER_PREFIX)]
    #[case(WORMHOLE_TRANSCEIVER_MESSAGE_PREFIX)]
    #[case(TRANSCEIVER_REGISTRATION_PREFIX)]
    fn test_foreign_prefix_rejected_by_transceiver_info(#[case] prefix: [u8; 4]) {
        let mut bytes = vec![0u8; 70];
        bytes[..4].copy_from_slice(&prefix);
        assert!(matches!(
            TransceiverInfo::decode(&bytes),
            Err(LayoutError::DiscriminatorMismatch { field: "prefix", .. })
        ));
    }

    #[test]
    fn test_native_token_transfer_rejects_info_prefix() {
        let mut bytes = sample_transfer().encode().unwrap();
        bytes[..4].copy_from_slice(&TRANSCEIVER_INFO_PREFIX);
        let err = NativeTokenTransfer::decode(&bytes).unwrap_err();
        assert_eq!(
            err,
            LayoutError::DiscriminatorMismatch {
                field: "prefix",
                expected: "994e5454".to_string(),
                found: "9c23bd3b".to_string(),
            }
        );
    }

    #[test]
    fn test_unknown_discriminator() {
        assert_eq!(
            NttMessage::decode(&[0xDE, 0xAD, 0xBE, 0xEF, 0x00]).unwrap_err(),
            LayoutError::UnknownDiscriminator("deadbeef".to_string())
        );
        assert!(matches!(
            NttMessage::decode(&[0x99, 0x4E]),
            Err(LayoutError::ShortBuffer { .. })
        ));
    }

    #[test]
    fn test_ntt_message_reencodes_identically() {
        let bytes = sample_wormhole_transfer().encode().unwrap();
        let decoded = NttMessage::decode(&bytes).unwrap();
        assert_eq!(decoded.prefix(), WORMHOLE_TRANSCEIVER_MESSAGE_PREFIX);
        assert_eq!(decoded.encode().unwrap(), bytes);
    }

    #[test]
    fn test_instructions_encoding() {
        let instructions = TransceiverInstructions(vec![
            TransceiverInstruction::wormhole(0, true).unwrap(),
            TransceiverInstruction {
                index: 3,
                payload: Bytes::from_static(&[0xAB, 0xCD]),
            },
        ]);
        let bytes = instructions.encode().unwrap();
        insta::assert_snapshot!(hex::encode(&bytes), @"020001010302abcd");
        assert_eq!(TransceiverInstructions::decode(&bytes).unwrap(), instructions);
        assert_eq!(TransceiverInstructions::default().encode().unwrap(), vec![0]);
    }

    #[test]
    fn test_wormhole_instruction_rejects_non_boolean() {
        assert!(WormholeTransceiverInstruction::decode(&[2]).is_err());
        assert!(
            WormholeTransceiverInstruction::decode(&[1])
                .unwrap()
                .should_skip_relayer_send
        );
    }
}
