//! NTT protocol types and definitions
//!
//! This module contains the protocol-level types of Native Token Transfers:
//! chain identifiers, universal addresses, trimmed amounts, the wire message
//! catalogue, attestations and rate-limit accounting.

mod address;
mod amount;
mod chain;
mod message;
mod rate_limit;
pub mod registry;
mod trimmed;
mod vaa;

pub use address::{AddressError, UniversalAddress};
pub use amount::{format_units, parse_units};
pub use chain::{Chain, ChainFamily, Network};
pub use message::{
    decode_slot, ManagerMessage, ManagerMode, NativeTokenTransfer, NttMessage,
    TransceiverInfo, TransceiverInstruction, TransceiverInstructions, TransceiverMessage,
    TransceiverRegistration, WormholeTransceiverInstruction, WormholeTransferMessage,
    NATIVE_TOKEN_TRANSFER_PREFIX, TRANSCEIVER_INFO_PREFIX, TRANSCEIVER_REGISTRATION_PREFIX,
    WORMHOLE_TRANSCEIVER_MESSAGE_PREFIX,
};
pub use rate_limit::{QueuedInboundTransfer, QueuedOutboundTransfer, RateLimitState};
pub use registry::LayoutRegistry;
pub use trimmed::{TrimmedAmount, TRIMMED_DECIMALS};
pub use vaa::{GuardianSignature, Vaa, VAA_VERSION};
