use std::fmt;

use alloy_primitives::{Bytes, B256};
use serde::{Deserialize, Serialize};

use super::params::ValidatedTransfer;
use crate::error::{NttError, Result};
use crate::layout::Schema;
use crate::protocol::{
    Chain, QueuedInboundTransfer, UniversalAddress, Vaa, WormholeTransferMessage,
};
use crate::traits::TransactionId;

/// Lifecycle of one transfer.
///
/// The derived ordering is the order states are reached in; tracking never
/// moves a record backwards. `Queued` only appears when the destination
/// window had no capacity for the transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TransferState {
    SourceInitiated,
    SourceFinalized,
    Attested,
    Redeemed,
    Queued,
    DestinationFinalized,
}

impl TransferState {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SourceInitiated => "source_initiated",
            Self::SourceFinalized => "source_finalized",
            Self::Attested => "attested",
            Self::Redeemed => "redeemed",
            Self::Queued => "queued",
            Self::DestinationFinalized => "destination_finalized",
        }
    }

    pub const fn is_final(self) -> bool {
        matches!(self, Self::DestinationFinalized)
    }
}

impl fmt::Display for TransferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies an attestation by its emitter and sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttestationId {
    pub emitter_chain: u16,
    pub emitter_address: UniversalAddress,
    pub sequence: u64,
}

/// A quorum-signed attestation of the source transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attestation {
    pub id: AttestationId,
    /// Raw signed attestation, submitted as-is on redeem.
    pub vaa: Bytes,
    /// Manager-message digest the destination manager tracks the transfer by.
    pub digest: B256,
    pub message: WormholeTransferMessage,
}

impl Attestation {
    /// Decodes a raw VAA carrying a wormhole transfer message.
    pub fn from_vaa(raw: Bytes) -> Result<Self> {
        let vaa = Vaa::<WormholeTransferMessage>::decode(&raw)?;
        let digest = vaa.payload.manager_payload.digest(vaa.emitter_chain)?;
        Ok(Self {
            id: AttestationId {
                emitter_chain: vaa.emitter_chain,
                emitter_address: vaa.emitter_address,
                sequence: vaa.sequence,
            },
            vaa: raw,
            digest,
            message: vaa.payload,
        })
    }
}

/// Client-side record of one transfer.
///
/// Created by `initiate` and advanced only by `track`. Serializable so a
/// caller may persist it and resume tracking later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRecord {
    pub state: TransferState,
    pub transfer: ValidatedTransfer,
    pub origin_txids: Vec<TransactionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attestation: Option<Attestation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queued: Option<QueuedInboundTransfer>,
}

impl TransferRecord {
    pub fn new(transfer: ValidatedTransfer, origin_txids: Vec<TransactionId>) -> Self {
        Self {
            state: TransferState::SourceInitiated,
            transfer,
            origin_txids,
            attestation: None,
            queued: None,
        }
    }

    pub fn source_chain(&self) -> Chain {
        self.transfer.source_chain
    }

    pub fn destination_chain(&self) -> Chain {
        self.transfer.destination_chain
    }

    /// The transaction that emitted the transfer message (the last one sent).
    pub fn origin_txid(&self) -> Result<&TransactionId> {
        self.origin_txids
            .last()
            .ok_or_else(|| NttError::InvalidState("record has no origin transaction".to_string()))
    }

    pub fn attestation(&self) -> Result<&Attestation> {
        self.attestation.as_ref().ok_or_else(|| {
            NttError::InvalidState(format!("record in state {} is not attested", self.state))
        })
    }

    pub fn is_finalized(&self) -> bool {
        self.state.is_final()
    }

    /// Moves the record forward to `state`.
    pub(crate) fn advance(&mut self, state: TransferState) -> Result<()> {
        if state < self.state {
            return Err(NttError::InvalidState(format!(
                "cannot move from {} back to {}",
                self.state, state
            )));
        }
        self.state = state;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_order() {
        use TransferState::*;
        let states = [
            SourceInitiated,
            SourceFinalized,
            Attested,
            Redeemed,
            Queued,
            DestinationFinalized,
        ];
        assert!(states.windows(2).all(|pair| pair[0] < pair[1]));
        assert!(DestinationFinalized.is_final());
        assert!(!Queued.is_final());
    }

    #[test]
    fn test_state_serializes_by_name() {
        let json = serde_json::to_string(&TransferState::Queued).unwrap();
        insta::assert_snapshot!(json, @r#""Queued""#);
    }
}
