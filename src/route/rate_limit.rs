use alloy_primitives::{B256, U256};
use tracing::{debug, info};

use crate::error::{NttError, Result};
use crate::layout::Payload;
use crate::protocol::{
    Chain, ManagerMessage, QueuedInboundTransfer, QueuedOutboundTransfer, UniversalAddress,
};
use crate::traits::NttAdapter;

/// Read-only view of one manager's rate limits and queues.
///
/// The writes it exposes build release transactions and refuse to do so
/// before the queue entry expired.
#[derive(Debug)]
pub struct RateLimitQuery<'a, A> {
    adapter: &'a A,
}

impl<A> Clone for RateLimitQuery<'_, A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<A> Copy for RateLimitQuery<'_, A> {}

impl<'a, A: NttAdapter> RateLimitQuery<'a, A> {
    pub fn new(adapter: &'a A) -> Self {
        Self { adapter }
    }

    pub fn chain(&self) -> Chain {
        self.adapter.chain()
    }

    pub async fn get_current_outbound_capacity(&self) -> Result<U256> {
        self.adapter.get_current_outbound_capacity().await
    }

    pub async fn get_current_inbound_capacity(&self, source_chain: Chain) -> Result<U256> {
        self.adapter.get_current_inbound_capacity(source_chain).await
    }

    /// Window length in seconds.
    pub async fn get_rate_limit_duration(&self) -> Result<u64> {
        self.adapter.get_rate_limit_duration().await
    }

    /// Looks up the queue entry for a message sent from `source_chain`.
    pub async fn get_inbound_queued_transfer<P: Payload + Sync>(
        &self,
        source_chain: Chain,
        message: &ManagerMessage<P>,
    ) -> Result<Option<QueuedInboundTransfer>> {
        let digest = message.digest(source_chain.id())?;
        self.get_inbound_queued_transfer_by_digest(digest).await
    }

    pub async fn get_inbound_queued_transfer_by_digest(
        &self,
        digest: B256,
    ) -> Result<Option<QueuedInboundTransfer>> {
        self.adapter.get_inbound_queued_transfer(digest).await
    }

    /// Whether the entry for `digest` exists and may be released at `now`.
    pub async fn is_queued_transfer_ready(&self, digest: B256, now: u64) -> Result<bool> {
        Ok(self
            .get_inbound_queued_transfer_by_digest(digest)
            .await?
            .is_some_and(|queued| queued.is_ready(now)))
    }

    /// Builds the release transaction for a queued inbound transfer.
    ///
    /// Fails with [`NttError::QueuedTransferNotReady`] until `now` reaches
    /// the entry's expiry.
    pub async fn complete_inbound_queued_transfer(
        &self,
        digest: B256,
        payer: UniversalAddress,
        now: u64,
    ) -> Result<A::Transaction> {
        let queued = self
            .get_inbound_queued_transfer_by_digest(digest)
            .await?
            .ok_or_else(|| {
                NttError::InvalidState(format!("no queued inbound transfer for {digest}"))
            })?;

        if !queued.is_ready(now) {
            debug!(
                digest = %digest,
                expiry = queued.rate_limit_expiry_timestamp,
                now = now,
                event = "queued_transfer_not_ready"
            );
            return Err(NttError::QueuedTransferNotReady {
                expiry: queued.rate_limit_expiry_timestamp,
                now,
            });
        }

        info!(
            digest = %digest,
            chain = %self.chain(),
            event = "queued_transfer_release_built"
        );
        self.adapter
            .complete_inbound_queued_transfer(digest, payer)
            .await
    }

    /// Looks up the outbound queue entry created by the source transaction `txid`.
    pub async fn get_outbound_queued_transfer(
        &self,
        txid: &str,
    ) -> Result<Option<QueuedOutboundTransfer>> {
        self.adapter.get_outbound_queued_transfer(txid).await
    }

    /// Builds the release transaction for a transfer held in the outbound queue.
    ///
    /// # Arguments
    ///
    /// * `txid` - Source transaction that queued the transfer
    /// * `payer` - Account submitting the release
    /// * `delivery_price` - Value attached for the transceivers, as quoted
    /// * `now` - Current unix time in seconds
    ///
    /// # Returns
    ///
    /// The unsigned release transaction, or [`NttError::QueuedTransferNotReady`]
    /// while the entry's expiry lies ahead of `now`.
    pub async fn complete_outbound_queued_transfer(
        &self,
        txid: &str,
        payer: UniversalAddress,
        delivery_price: U256,
        now: u64,
    ) -> Result<(QueuedOutboundTransfer, A::Transaction)> {
        let queued = self
            .get_outbound_queued_transfer(txid)
            .await?
            .ok_or_else(|| {
                NttError::InvalidState(format!("no queued outbound transfer for {txid}"))
            })?;

        if !queued.is_ready(now) {
            debug!(
                queue_sequence = queued.queue_sequence,
                expiry = queued.rate_limit_expiry_timestamp,
                now = now,
                event = "queued_transfer_not_ready"
            );
            return Err(NttError::QueuedTransferNotReady {
                expiry: queued.rate_limit_expiry_timestamp,
                now,
            });
        }

        info!(
            queue_sequence = queued.queue_sequence,
            chain = %self.chain(),
            event = "outbound_release_built"
        );
        let transaction = self
            .adapter
            .complete_outbound_queued_transfer(&queued, payer, delivery_price)
            .await?;
        Ok((queued, transaction))
    }
}
