//! Core trait abstractions for NTT transfers.
//!
//! These traits are the seams between the transfer engine and the outside
//! world: the per-chain manager deployment ([`NttAdapter`]), the key holder
//! that signs and broadcasts ([`Signer`]), the attestation service
//! ([`AttestationSource`]) and time ([`Clock`]). Production implementations
//! live in [`crate::providers`]; in-memory fakes live in [`crate::testing`].
//!
//! The engine never signs or broadcasts by itself. Adapters only build
//! unsigned transactions and hand them to an injected [`Signer`].

use std::fmt;
use std::time::{Duration, Instant};

use alloy_primitives::{Bytes, B256, U256};
use async_trait::async_trait;
use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::protocol::{
    Chain, QueuedInboundTransfer, QueuedOutboundTransfer, TransceiverInstructions, UniversalAddress,
};

/// A broadcast transaction on a specific chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId {
    pub chain: Chain,
    pub txid: String,
}

impl TransactionId {
    pub fn new(chain: Chain, txid: impl Into<String>) -> Self {
        Self {
            chain,
            txid: txid.into(),
        }
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.chain, self.txid)
    }
}

/// Everything an adapter needs to build an outbound transfer.
#[derive(Builder, Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    /// Account the tokens are taken from.
    pub sender: UniversalAddress,
    /// Amount in source-token base units.
    pub amount: U256,
    pub destination: Chain,
    pub recipient: UniversalAddress,
    #[builder(default)]
    pub instructions: TransceiverInstructions,
    /// Queue instead of reverting when outbound capacity is exhausted.
    #[builder(default)]
    pub should_queue: bool,
    /// Native value attached to pay for delivery.
    #[builder(default)]
    pub delivery_price: U256,
    /// Destination-native base units the relayer delivers to the recipient.
    /// Included in `delivery_price`.
    #[builder(default)]
    pub gas_drop_off: U256,
}

/// The Chain Adapter contract: one NTT manager deployment on one chain.
///
/// Reads go straight to the chain. Writes return unsigned transactions of
/// the adapter's [`NttAdapter::Transaction`] type; several may be returned
/// when a prerequisite (such as a token approval) is needed first.
///
/// Capacities are reported in base units of the local token.
#[async_trait]
pub trait NttAdapter: Send + Sync {
    type Transaction: Clone + fmt::Debug + Send + Sync;

    fn chain(&self) -> Chain;

    fn manager_address(&self) -> UniversalAddress;

    async fn token_decimals(&self) -> Result<u8>;

    async fn get_current_outbound_capacity(&self) -> Result<U256>;

    async fn get_current_inbound_capacity(&self, source_chain: Chain) -> Result<U256>;

    /// Sliding-window length in seconds.
    async fn get_rate_limit_duration(&self) -> Result<u64>;

    /// The queued inbound transfer for a manager-message digest, if any.
    async fn get_inbound_queued_transfer(&self, digest: B256)
        -> Result<Option<QueuedInboundTransfer>>;

    async fn is_message_approved(&self, digest: B256) -> Result<bool>;

    async fn is_message_executed(&self, digest: B256) -> Result<bool>;

    /// Native-token price of delivering to `destination` with `instructions`,
    /// including `gas_drop_off` destination-native base units for the
    /// recipient.
    ///
    /// Adapters that cannot deliver a drop-off fail with
    /// [`NttError::GasDropOffUnsupported`](crate::NttError::GasDropOffUnsupported)
    /// for any non-zero `gas_drop_off`.
    async fn quote_delivery_price(
        &self,
        destination: Chain,
        instructions: &TransceiverInstructions,
        gas_drop_off: U256,
    ) -> Result<U256>;

    async fn is_transaction_finalized(&self, txid: &str) -> Result<bool>;

    /// The outbound queue entry created by source transaction `txid`, while
    /// it is still waiting for capacity. `None` when the transaction did not
    /// queue or the entry was already completed.
    async fn get_outbound_queued_transfer(
        &self,
        txid: &str,
    ) -> Result<Option<QueuedOutboundTransfer>>;

    /// How much the manager may currently pull from `owner`.
    async fn allowance(&self, owner: UniversalAddress) -> Result<U256>;

    async fn transfer(&self, request: &TransferRequest) -> Result<Vec<Self::Transaction>>;

    /// Submits attestations to the destination transceivers.
    async fn redeem(
        &self,
        attestations: &[Bytes],
        payer: UniversalAddress,
    ) -> Result<Vec<Self::Transaction>>;

    async fn set_peer(
        &self,
        peer_chain: Chain,
        peer_manager: UniversalAddress,
        decimals: u8,
        inbound_limit: U256,
    ) -> Result<Self::Transaction>;

    async fn complete_inbound_queued_transfer(
        &self,
        digest: B256,
        payer: UniversalAddress,
    ) -> Result<Self::Transaction>;

    /// Releases a queued outbound transfer once its expiry passed. The
    /// release emits the transfer message, so `delivery_price` is attached
    /// as on [`NttAdapter::transfer`].
    async fn complete_outbound_queued_transfer(
        &self,
        queued: &QueuedOutboundTransfer,
        payer: UniversalAddress,
        delivery_price: U256,
    ) -> Result<Self::Transaction>;
}

/// Signs and broadcasts transactions of type `T`.
///
/// Implementations submit the transactions in order, waiting for each to be
/// included before sending the next.
#[async_trait]
pub trait Signer<T>: Send + Sync {
    fn chain(&self) -> Chain;

    fn address(&self) -> UniversalAddress;

    async fn sign_and_send(&self, transactions: Vec<T>) -> Result<Vec<TransactionId>>;
}

/// Source of quorum-signed attestations.
///
/// A single lookup: `Ok(None)` means the attestation does not exist yet.
/// Waiting is the caller's job.
#[async_trait]
pub trait AttestationSource: Send + Sync {
    async fn fetch_attestation(&self, chain: Chain, txid: &str) -> Result<Option<Bytes>>;
}

/// Trait for time-based operations.
///
/// Abstracting sleep and time queries lets tests fast-forward through
/// polling loops and timeouts without waiting.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Asynchronously sleeps for the given duration.
    async fn sleep(&self, duration: Duration);

    /// Monotonic time, used for timeouts.
    fn now(&self) -> Instant;

    /// Wall-clock seconds since the Unix epoch, used against on-chain
    /// timestamps such as queue expiries.
    fn unix_time(&self) -> u64;
}
