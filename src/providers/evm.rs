//! EVM chain adapter backed by an Alloy provider.

use std::str::FromStr;

use alloy_network::{Ethereum, ReceiptResponse};
use alloy_primitives::{Address, Bytes, TxHash, B256, U256};
use alloy_provider::Provider;
use alloy_rpc_types::{BlockNumberOrTag, TransactionRequest};
use async_trait::async_trait;
use tracing::{debug, info, instrument, trace};

use crate::contracts::{
    resolve_binding, Erc20Contract, NttManagerContract, TransferCall, WormholeTransceiverContract,
};
use crate::error::{NttError, Result, ValidationError};
use crate::layout::Schema;
use crate::protocol::{
    Chain, QueuedInboundTransfer, QueuedOutboundTransfer, TransceiverInstructions, TrimmedAmount,
    UniversalAddress,
};
use crate::route::{ChainDeployment, TransceiverKind};
use crate::spans;
use crate::traits::{NttAdapter, TransferRequest};

/// [`NttAdapter`] for an NTT manager deployed on an EVM chain.
///
/// # Examples
///
/// ```rust,no_run
/// use ntt_rs::providers::EvmNttAdapter;
/// use ntt_rs::{Chain, NttRouteConfig};
/// use alloy_provider::ProviderBuilder;
///
/// # async fn example(config: NttRouteConfig) -> Result<(), Box<dyn std::error::Error>> {
/// let provider = ProviderBuilder::new()
///     .connect("https://ethereum-sepolia-rpc.publicnode.com")
///     .await?;
/// let deployment = config.deployment(Chain::Sepolia)?;
/// let adapter = EvmNttAdapter::connect(Chain::Sepolia, provider, deployment).await?;
/// # Ok(())
/// # }
/// ```
pub struct EvmNttAdapter<P: Provider<Ethereum>> {
    chain: Chain,
    provider: P,
    manager: NttManagerContract<P>,
    token: Erc20Contract<P>,
    transceiver: WormholeTransceiverContract<P>,
}

fn evm_address(chain: Chain, address: &UniversalAddress) -> Result<Address> {
    address.to_evm().map_err(|e| {
        ValidationError::InvalidAddress {
            chain,
            reason: e.to_string(),
        }
        .into()
    })
}

impl<P: Provider<Ethereum> + Clone> EvmNttAdapter<P> {
    /// Connects to the deployment of `chain`.
    ///
    /// # Arguments
    ///
    /// * `chain` - EVM chain the deployment lives on
    /// * `provider` - Alloy provider connected to that chain
    /// * `deployment` - Manager, token and transceiver addresses from the route configuration
    ///
    /// # Returns
    ///
    /// An adapter bound to the manager version the contract reports.
    ///
    /// Fails with [`NttError::ChainNotSupported`] for non-EVM chains,
    /// [`NttError::NetworkMismatch`] when the provider serves a different
    /// chain and [`NttError::UnsupportedVersion`] when the manager's version
    /// has no binding.
    pub async fn connect(chain: Chain, provider: P, deployment: &ChainDeployment) -> Result<Self> {
        let expected = chain
            .evm_chain_id()
            .ok_or_else(|| NttError::ChainNotSupported {
                chain: chain.to_string(),
            })?;

        let actual = provider.get_chain_id().await?;
        if actual != expected {
            return Err(NttError::NetworkMismatch { expected, actual });
        }

        let manager_address = evm_address(chain, &deployment.manager_address(chain)?)?;
        let token_address = evm_address(chain, &deployment.token_address(chain)?)?;
        let transceiver_address = evm_address(
            chain,
            &deployment.transceiver_address(chain, TransceiverKind::Wormhole)?,
        )?;

        let version = NttManagerContract::read_version(manager_address, provider.clone()).await?;
        let abi = {
            let span = spans::resolve_binding(chain, &version);
            let _guard = span.enter();
            let abi = resolve_binding(&version).inspect_err(|e| spans::record_error(e))?;
            span.record("binding", tracing::field::debug(&abi));
            abi
        };
        let manager = NttManagerContract::new(manager_address, provider.clone(), abi);

        info!(
            chain = %chain,
            manager = %manager_address,
            token = %token_address,
            transceiver = %transceiver_address,
            event = "evm_adapter_connected"
        );

        Ok(Self {
            chain,
            token: Erc20Contract::new(token_address, provider.clone()),
            transceiver: WormholeTransceiverContract::new(transceiver_address, provider.clone()),
            manager,
            provider,
        })
    }
}

impl<P: Provider<Ethereum>> EvmNttAdapter<P> {
    /// Returns a reference to the underlying Alloy provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Returns the manager bindings for direct contract access.
    pub fn manager(&self) -> &NttManagerContract<P> {
        &self.manager
    }

    fn encode_instructions(instructions: &TransceiverInstructions) -> Result<Bytes> {
        Ok(Bytes::from(instructions.encode()?))
    }
}

/// Managers price delivery per transceiver and have no notion of a
/// recipient gas drop-off.
fn reject_gas_drop_off(chain: Chain, gas_drop_off: U256) -> Result<()> {
    if gas_drop_off.is_zero() {
        return Ok(());
    }
    debug!(
        chain = %chain,
        gas_drop_off = %gas_drop_off,
        event = "gas_drop_off_rejected"
    );
    Err(NttError::GasDropOffUnsupported { chain })
}

#[async_trait]
impl<P> NttAdapter for EvmNttAdapter<P>
where
    P: Provider<Ethereum> + Clone + Send + Sync + 'static,
{
    type Transaction = TransactionRequest;

    fn chain(&self) -> Chain {
        self.chain
    }

    fn manager_address(&self) -> UniversalAddress {
        self.manager.address().into()
    }

    async fn token_decimals(&self) -> Result<u8> {
        self.manager.token_decimals().await
    }

    #[instrument(skip(self), fields(chain = %self.chain))]
    async fn get_current_outbound_capacity(&self) -> Result<U256> {
        self.manager.current_outbound_capacity().await
    }

    #[instrument(skip(self), fields(chain = %self.chain))]
    async fn get_current_inbound_capacity(&self, source_chain: Chain) -> Result<U256> {
        self.manager.current_inbound_capacity(source_chain.id()).await
    }

    async fn get_rate_limit_duration(&self) -> Result<u64> {
        self.manager.rate_limit_duration().await
    }

    /// Reads the inbound queue entry for `digest`. A zero timestamp means
    /// there is none.
    #[instrument(skip(self), fields(chain = %self.chain, digest = %digest))]
    async fn get_inbound_queued_transfer(
        &self,
        digest: B256,
    ) -> Result<Option<QueuedInboundTransfer>> {
        let entry = self.manager.inbound_queued_transfer(digest).await?;
        if entry.tx_timestamp == 0 {
            trace!("No queued inbound transfer");
            return Ok(None);
        }

        let duration = self.manager.rate_limit_duration().await?;
        let queued = QueuedInboundTransfer::new(
            entry.recipient.into(),
            TrimmedAmount::from_packed(entry.packed_amount)?,
            entry.tx_timestamp,
            duration,
        );
        debug!(
            expiry = queued.rate_limit_expiry_timestamp,
            event = "queued_inbound_transfer_found"
        );
        Ok(Some(queued))
    }

    async fn is_message_approved(&self, digest: B256) -> Result<bool> {
        self.manager.is_message_approved(digest).await
    }

    async fn is_message_executed(&self, digest: B256) -> Result<bool> {
        self.manager.is_message_executed(digest).await
    }

    /// Quotes delivery through the manager's `quoteDeliveryPrice`.
    ///
    /// # Errors
    ///
    /// [`NttError::GasDropOffUnsupported`] for any non-zero `gas_drop_off`.
    #[instrument(skip(self, instructions), fields(chain = %self.chain, destination = %destination))]
    async fn quote_delivery_price(
        &self,
        destination: Chain,
        instructions: &TransceiverInstructions,
        gas_drop_off: U256,
    ) -> Result<U256> {
        reject_gas_drop_off(self.chain, gas_drop_off)?;
        let encoded = Self::encode_instructions(instructions)?;
        self.manager
            .quote_delivery_price(destination.id(), encoded)
            .await
    }

    /// A transaction is final once its block is at or below the chain's
    /// `finalized` block.
    #[instrument(skip(self), fields(chain = %self.chain))]
    async fn is_transaction_finalized(&self, txid: &str) -> Result<bool> {
        let hash = TxHash::from_str(txid)?;
        let Some(receipt) = self.provider.get_transaction_receipt(hash).await? else {
            trace!("Transaction receipt not found");
            return Ok(false);
        };
        let Some(block_number) = receipt.block_number() else {
            return Ok(false);
        };

        let finalized = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Finalized)
            .await?
            .map(|block| block.header.number);

        debug!(
            block_number = block_number,
            finalized_block = ?finalized,
            event = "finality_checked"
        );
        Ok(finalized.is_some_and(|finalized| block_number <= finalized))
    }

    /// Finds the queue handle in the receipt of `txid`, then reads the
    /// entry. Completed and cancelled entries read back with a zero
    /// timestamp and are reported as `None`.
    #[instrument(skip(self), fields(chain = %self.chain))]
    async fn get_outbound_queued_transfer(
        &self,
        txid: &str,
    ) -> Result<Option<QueuedOutboundTransfer>> {
        let hash = TxHash::from_str(txid)?;
        let Some(receipt) = self.provider.get_transaction_receipt(hash).await? else {
            trace!("Transaction receipt not found");
            return Ok(None);
        };
        let Some(queue_sequence) = self.manager.outbound_queue_sequence(&receipt)? else {
            return Ok(None);
        };

        let entry = self.manager.outbound_queued_transfer(queue_sequence).await?;
        if entry.tx_timestamp == 0 {
            debug!(
                queue_sequence = queue_sequence,
                event = "outbound_queue_entry_released"
            );
            return Ok(None);
        }

        let duration = self.manager.rate_limit_duration().await?;
        let queued = QueuedOutboundTransfer {
            queue_sequence,
            sender: entry.sender.into(),
            recipient: entry.recipient.into(),
            recipient_chain: entry.recipient_chain,
            amount: TrimmedAmount::from_packed(entry.packed_amount)?,
            tx_timestamp: entry.tx_timestamp,
            rate_limit_expiry_timestamp: entry.tx_timestamp.saturating_add(duration),
        };
        debug!(
            queue_sequence = queue_sequence,
            expiry = queued.rate_limit_expiry_timestamp,
            event = "queued_outbound_transfer_found"
        );
        Ok(Some(queued))
    }

    /// Token allowance `owner` granted the manager.
    async fn allowance(&self, owner: UniversalAddress) -> Result<U256> {
        let owner = evm_address(self.chain, &owner)?;
        self.token.allowance(owner, self.manager.address()).await
    }

    /// Builds `transfer`, preceded by an `approve` when the manager's
    /// allowance is short.
    ///
    /// # Errors
    ///
    /// [`NttError::GasDropOffUnsupported`] when the request carries a
    /// non-zero gas drop-off.
    async fn transfer(&self, request: &TransferRequest) -> Result<Vec<TransactionRequest>> {
        reject_gas_drop_off(self.chain, request.gas_drop_off)?;
        let sender = evm_address(self.chain, &request.sender)?;
        let manager = self.manager.address();

        let mut transactions = Vec::with_capacity(2);
        if self.token.allowance(sender, manager).await? < request.amount {
            transactions.push(
                self.token
                    .approve_transaction(sender, manager, request.amount),
            );
        }

        transactions.push(self.manager.transfer_transaction(TransferCall {
            from: sender,
            amount: request.amount,
            recipient_chain: request.destination.id(),
            recipient: request.recipient.as_b256(),
            refund_address: request.sender.as_b256(),
            should_queue: request.should_queue,
            instructions: Self::encode_instructions(&request.instructions)?,
            value: request.delivery_price,
        }));
        Ok(transactions)
    }

    /// One `receiveMessage` call on the Wormhole transceiver per VAA.
    async fn redeem(
        &self,
        attestations: &[Bytes],
        payer: UniversalAddress,
    ) -> Result<Vec<TransactionRequest>> {
        let payer = evm_address(self.chain, &payer)?;
        Ok(attestations
            .iter()
            .map(|vaa| {
                self.transceiver
                    .receive_message_transaction(payer, vaa.clone())
            })
            .collect())
    }

    /// Builds `setPeer`. The transaction has no `from`, since only the
    /// manager's owner may send it.
    async fn set_peer(
        &self,
        peer_chain: Chain,
        peer_manager: UniversalAddress,
        decimals: u8,
        inbound_limit: U256,
    ) -> Result<TransactionRequest> {
        let mut transaction = self.manager.set_peer_transaction(
            Address::ZERO,
            peer_chain.id(),
            peer_manager.as_b256(),
            decimals,
            inbound_limit,
        );
        transaction.from = None;
        Ok(transaction)
    }

    async fn complete_inbound_queued_transfer(
        &self,
        digest: B256,
        payer: UniversalAddress,
    ) -> Result<TransactionRequest> {
        let payer = evm_address(self.chain, &payer)?;
        Ok(self
            .manager
            .complete_inbound_queued_transfer_transaction(payer, digest))
    }

    /// Builds `completeOutboundQueuedTransfer`, paying `delivery_price` to
    /// the transceivers as the original transfer would have.
    async fn complete_outbound_queued_transfer(
        &self,
        queued: &QueuedOutboundTransfer,
        payer: UniversalAddress,
        delivery_price: U256,
    ) -> Result<TransactionRequest> {
        let payer = evm_address(self.chain, &payer)?;
        Ok(self.manager.complete_outbound_queued_transfer_transaction(
            payer,
            queued.queue_sequence,
            delivery_price,
        ))
    }
}
