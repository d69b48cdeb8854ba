// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! NTT manager contract bindings
//!
//! Managers changed their `transfer` ABI between releases: 1.1 added a
//! refund address. Everything the SDK reads kept the same ABI, so reads go
//! through the 1.0 bindings and only `transfer` dispatches on the deployed
//! version.
//!
//! The deployed version (from `version()`) is matched against
//! [`BINDINGS`], newest first: a binding fits when the major version is
//! equal and the deployed minor version is at least the binding's.

use std::collections::HashMap;
use std::sync::{OnceLock, RwLock};

use alloy_network::Ethereum;
use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_provider::Provider;
use alloy_rpc_types::{TransactionReceipt, TransactionRequest};
use alloy_sol_types::{sol, SolEvent};
use tracing::{debug, info};

use crate::error::{NttError, Result};
use NttManagerV1_0::{
    InboundQueuedTransfer, NttManagerV1_0Instance, OutboundQueuedTransfer, OutboundTransferQueued,
};
use NttManagerV1_1::NttManagerV1_1Instance;

/// ABI generation of a deployed manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ManagerAbi {
    V1_0,
    V1_1,
}

/// Known bindings, newest first.
pub const BINDINGS: [(&str, ManagerAbi); 2] = [("1.1.0", ManagerAbi::V1_1), ("1.0.0", ManagerAbi::V1_0)];

fn parse_version(version: &str) -> Option<(u64, u64)> {
    let version = version.trim().trim_start_matches('v');
    let mut parts = version.split(|c: char| c == '.' || c == '-' || c == '+');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next()?.parse().ok()?;
    Some((major, minor))
}

fn select_binding(version: &str) -> Result<ManagerAbi> {
    let (major, minor) =
        parse_version(version).ok_or_else(|| NttError::UnsupportedVersion(version.to_string()))?;

    BINDINGS
        .iter()
        .find_map(|(binding, abi)| {
            let (binding_major, binding_minor) = parse_version(binding)?;
            (binding_major == major && minor >= binding_minor).then_some(*abi)
        })
        .ok_or_else(|| NttError::UnsupportedVersion(version.to_string()))
}

/// Resolves the binding for a deployed version string.
///
/// Each version string is resolved at most once per process.
pub fn resolve_binding(version: &str) -> Result<ManagerAbi> {
    static RESOLVED: OnceLock<RwLock<HashMap<String, ManagerAbi>>> = OnceLock::new();
    let resolved = RESOLVED.get_or_init(Default::default);

    if let Some(abi) = resolved
        .read()
        .ok()
        .and_then(|cache| cache.get(version).copied())
    {
        return Ok(abi);
    }

    let abi = select_binding(version)?;
    if let Ok(mut cache) = resolved.write() {
        cache.entry(version.to_string()).or_insert(abi);
    }
    debug!(version = version, binding = ?abi, event = "manager_binding_resolved");
    Ok(abi)
}

/// A queued inbound transfer as stored by the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueuedTransferEntry {
    /// Packed trimmed amount, `amount << 8 | decimals`.
    pub packed_amount: u128,
    pub tx_timestamp: u64,
    pub recipient: Address,
}

impl From<InboundQueuedTransfer> for QueuedTransferEntry {
    fn from(entry: InboundQueuedTransfer) -> Self {
        Self {
            packed_amount: entry.amount.to::<u128>(),
            tx_timestamp: entry.txTimestamp,
            recipient: entry.recipient,
        }
    }
}

/// A queued outbound transfer as stored by the manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundQueueEntry {
    /// Packed trimmed amount, `amount << 8 | decimals`.
    pub packed_amount: u128,
    pub tx_timestamp: u64,
    pub recipient: B256,
    pub recipient_chain: u16,
    pub sender: Address,
}

impl From<OutboundQueuedTransfer> for OutboundQueueEntry {
    fn from(entry: OutboundQueuedTransfer) -> Self {
        Self {
            packed_amount: entry.amount.to::<u128>(),
            tx_timestamp: entry.txTimestamp,
            recipient: entry.recipient,
            recipient_chain: entry.recipientChain,
            sender: entry.sender,
        }
    }
}

/// Arguments of a manager `transfer` call.
#[derive(Debug, Clone)]
pub struct TransferCall {
    pub from: Address,
    pub amount: U256,
    pub recipient_chain: u16,
    pub recipient: B256,
    /// Ignored by 1.0 managers.
    pub refund_address: B256,
    pub should_queue: bool,
    pub instructions: Bytes,
    /// Delivery payment attached to the call.
    pub value: U256,
}

/// NTT manager contract wrapper
///
/// Reads call the chain; `*_transaction` methods only build unsigned
/// requests for a signer.
///
/// # Example
///
/// ```rust,no_run
/// use ntt_rs::contracts::{resolve_binding, NttManagerContract};
/// use alloy_primitives::address;
/// use alloy_provider::ProviderBuilder;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let provider = ProviderBuilder::new().connect("http://localhost:8545").await?;
/// let address = address!("1111111111111111111111111111111111111111");
///
/// let version = NttManagerContract::read_version(address, provider.clone()).await?;
/// let manager = NttManagerContract::new(address, provider, resolve_binding(&version)?);
/// let capacity = manager.current_outbound_capacity().await?;
/// # Ok(())
/// # }
/// ```
pub struct NttManagerContract<P: Provider<Ethereum>> {
    abi: ManagerAbi,
    instance: NttManagerV1_0Instance<P>,
    v1_1: NttManagerV1_1Instance<P>,
}

impl<P: Provider<Ethereum> + Clone> NttManagerContract<P> {
    /// Create a new manager wrapper for an already resolved binding
    pub fn new(address: Address, provider: P, abi: ManagerAbi) -> Self {
        debug!(
            contract_address = %address,
            binding = ?abi,
            event = "ntt_manager_contract_initialized"
        );
        Self {
            abi,
            instance: NttManagerV1_0Instance::new(address, provider.clone()),
            v1_1: NttManagerV1_1Instance::new(address, provider),
        }
    }

    /// Reads `version()` from the manager at `address`.
    ///
    /// Every release exposes `version()` with the same ABI, so this works
    /// before a binding is chosen.
    pub async fn read_version(address: Address, provider: P) -> Result<String> {
        let version = NttManagerV1_0Instance::new(address, provider)
            .version()
            .call()
            .await?;
        info!(
            contract_address = %address,
            version = %version,
            event = "ntt_manager_version_read"
        );
        Ok(version)
    }
}

impl<P: Provider<Ethereum>> NttManagerContract<P> {
    pub fn abi(&self) -> ManagerAbi {
        self.abi
    }

    pub fn address(&self) -> Address {
        *self.instance.address()
    }

    /// The token the manager locks or burns.
    pub async fn token(&self) -> Result<Address> {
        Ok(self.instance.token().call().await?)
    }

    pub async fn token_decimals(&self) -> Result<u8> {
        Ok(self.instance.tokenDecimals().call().await?)
    }

    /// Get the current outbound capacity
    ///
    /// # Returns
    ///
    /// The amount, in token base units, that may leave the chain right now
    pub async fn current_outbound_capacity(&self) -> Result<U256> {
        Ok(self.instance.getCurrentOutboundCapacity().call().await?)
    }

    /// Get the current inbound capacity from a peer
    ///
    /// # Arguments
    ///
    /// * `chain_id` - Wormhole chain id of the sending peer
    ///
    /// # Returns
    ///
    /// The amount, in token base units, that may arrive from that peer right now
    pub async fn current_inbound_capacity(&self, chain_id: u16) -> Result<U256> {
        Ok(self
            .instance
            .getCurrentInboundCapacity(chain_id)
            .call()
            .await?)
    }

    /// Sliding-window length in seconds.
    pub async fn rate_limit_duration(&self) -> Result<u64> {
        Ok(self.instance.rateLimitDuration().call().await?)
    }

    /// The queue entry for `digest`; a zero timestamp means no entry.
    pub async fn inbound_queued_transfer(&self, digest: B256) -> Result<QueuedTransferEntry> {
        let entry = self.instance.getInboundQueuedTransfer(digest).call().await?;
        Ok(entry.into())
    }

    /// Get a queued outbound transfer
    ///
    /// # Arguments
    ///
    /// * `queue_sequence` - Handle from the `OutboundTransferQueued` event
    ///
    /// # Returns
    ///
    /// The stored entry; a zero timestamp means it was completed, cancelled
    /// or never existed
    pub async fn outbound_queued_transfer(&self, queue_sequence: u64) -> Result<OutboundQueueEntry> {
        let entry = self
            .instance
            .getOutboundQueuedTransfer(queue_sequence)
            .call()
            .await?;
        Ok(entry.into())
    }

    /// Extracts the outbound queue handle from a transfer receipt
    ///
    /// # Arguments
    ///
    /// * `receipt` - Receipt of a `transfer` call
    ///
    /// # Returns
    ///
    /// The queue sequence when the transfer was queued by this manager,
    /// `None` when it went out directly
    pub fn outbound_queue_sequence(&self, receipt: &TransactionReceipt) -> Result<Option<u64>> {
        let manager = self.address();
        let queued_log = receipt.inner.logs().iter().find(|log| {
            log.address() == manager
                && log
                    .topics()
                    .first()
                    .is_some_and(|topic| *topic == OutboundTransferQueued::SIGNATURE_HASH)
        });
        let Some(log) = queued_log else {
            return Ok(None);
        };

        let (queue_sequence,) = OutboundTransferQueued::abi_decode_data(&log.data().data)?;
        debug!(
            queue_sequence = queue_sequence,
            event = "outbound_transfer_queued_log_found"
        );
        Ok(Some(queue_sequence))
    }

    pub async fn is_message_approved(&self, digest: B256) -> Result<bool> {
        Ok(self.instance.isMessageApproved(digest).call().await?)
    }

    pub async fn is_message_executed(&self, digest: B256) -> Result<bool> {
        Ok(self.instance.isMessageExecuted(digest).call().await?)
    }

    /// Quote the delivery price across all enabled transceivers
    ///
    /// # Arguments
    ///
    /// * `chain_id` - Wormhole chain id of the destination
    /// * `instructions` - Encoded transceiver instructions
    ///
    /// # Returns
    ///
    /// The total native value to attach to `transfer`
    pub async fn quote_delivery_price(&self, chain_id: u16, instructions: Bytes) -> Result<U256> {
        let quote = self
            .instance
            .quoteDeliveryPrice(chain_id, instructions)
            .call()
            .await?;
        debug!(
            recipient_chain = chain_id,
            transceivers = quote.prices.len(),
            total_price = %quote.totalPrice,
            event = "delivery_price_quoted"
        );
        Ok(quote.totalPrice)
    }

    /// Create a `transfer` transaction for the deployed ABI
    ///
    /// This creates but does not send the transaction. 1.0 managers take no
    /// refund address; 1.1 and later do.
    ///
    /// # Arguments
    ///
    /// * `call` - Transfer arguments, sender and attached value
    ///
    /// # Returns
    ///
    /// A `TransactionRequest` ready to be signed and sent
    pub fn transfer_transaction(&self, call: TransferCall) -> TransactionRequest {
        info!(
            from = %call.from,
            amount = %call.amount,
            recipient_chain = call.recipient_chain,
            recipient = %call.recipient,
            should_queue = call.should_queue,
            binding = ?self.abi,
            event = "transfer_transaction_created"
        );

        match self.abi {
            ManagerAbi::V1_0 => self
                .instance
                .transfer(
                    call.amount,
                    call.recipient_chain,
                    call.recipient,
                    call.should_queue,
                    call.instructions,
                )
                .from(call.from)
                .value(call.value)
                .into_transaction_request(),
            ManagerAbi::V1_1 => self
                .v1_1
                .transfer(
                    call.amount,
                    call.recipient_chain,
                    call.recipient,
                    call.refund_address,
                    call.should_queue,
                    call.instructions,
                )
                .from(call.from)
                .value(call.value)
                .into_transaction_request(),
        }
    }

    /// Create a transaction releasing a queued inbound transfer
    ///
    /// # Arguments
    ///
    /// * `from` - Any account; the tokens go to the queued recipient
    /// * `digest` - Manager-message digest of the queued transfer
    ///
    /// # Returns
    ///
    /// A `TransactionRequest` ready to be signed and sent
    pub fn complete_inbound_queued_transfer_transaction(
        &self,
        from: Address,
        digest: B256,
    ) -> TransactionRequest {
        info!(
            from = %from,
            digest = %digest,
            event = "complete_queued_transaction_created"
        );
        self.instance
            .completeInboundQueuedTransfer(digest)
            .from(from)
            .into_transaction_request()
    }

    /// Create a transaction releasing a queued outbound transfer
    ///
    /// The release emits the transfer message, so it pays for delivery
    /// like `transfer` does.
    ///
    /// # Arguments
    ///
    /// * `from` - The account that signs and pays
    /// * `queue_sequence` - Handle from the `OutboundTransferQueued` event
    /// * `value` - Delivery payment attached to the call
    ///
    /// # Returns
    ///
    /// A `TransactionRequest` ready to be signed and sent
    pub fn complete_outbound_queued_transfer_transaction(
        &self,
        from: Address,
        queue_sequence: u64,
        value: U256,
    ) -> TransactionRequest {
        info!(
            from = %from,
            queue_sequence = queue_sequence,
            value = %value,
            event = "complete_outbound_queued_transaction_created"
        );
        self.instance
            .completeOutboundQueuedTransfer(queue_sequence)
            .from(from)
            .value(value)
            .into_transaction_request()
    }

    /// Create a `setPeer` transaction
    ///
    /// Owner-only on chain.
    ///
    /// # Arguments
    ///
    /// * `from` - The manager owner
    /// * `chain_id` - Wormhole chain id of the peer
    /// * `peer` - Peer manager as a universal address
    /// * `decimals` - Token decimals on the peer chain
    /// * `inbound_limit` - Inbound rate limit from the peer, in local base units
    ///
    /// # Returns
    ///
    /// A `TransactionRequest` ready to be signed and sent
    pub fn set_peer_transaction(
        &self,
        from: Address,
        chain_id: u16,
        peer: B256,
        decimals: u8,
        inbound_limit: U256,
    ) -> TransactionRequest {
        info!(
            from = %from,
            peer_chain = chain_id,
            peer = %peer,
            decimals = decimals,
            inbound_limit = %inbound_limit,
            event = "set_peer_transaction_created"
        );
        self.instance
            .setPeer(chain_id, peer, decimals, inbound_limit)
            .from(from)
            .into_transaction_request()
    }
}

sol!(
    #[allow(missing_docs)]
    #[sol(rpc)]
    contract NttManagerV1_0 {
        struct InboundQueuedTransfer {
            uint72 amount;
            uint64 txTimestamp;
            address recipient;
        }

        struct OutboundQueuedTransfer {
            bytes32 recipient;
            bytes32 refundAddress;
            uint72 amount;
            uint64 txTimestamp;
            uint16 recipientChain;
            address sender;
            bytes transceiverInstructions;
        }

        event OutboundTransferQueued(uint64 queueSequence);

        function version() external view returns (string memory);
        function token() external view returns (address);
        function tokenDecimals() external view returns (uint8);
        function getCurrentOutboundCapacity() external view returns (uint256);
        function getCurrentInboundCapacity(uint16 chainId) external view returns (uint256);
        function rateLimitDuration() external view returns (uint64);
        function getInboundQueuedTransfer(bytes32 digest) external view returns (InboundQueuedTransfer memory);
        function getOutboundQueuedTransfer(uint64 queueSequence) external view returns (OutboundQueuedTransfer memory);
        function isMessageApproved(bytes32 digest) external view returns (bool);
        function isMessageExecuted(bytes32 digest) external view returns (bool);
        function quoteDeliveryPrice(uint16 recipientChain, bytes memory transceiverInstructions)
            external view returns (uint256[] memory prices, uint256 totalPrice);

        function transfer(
            uint256 amount,
            uint16 recipientChain,
            bytes32 recipient,
            bool shouldQueue,
            bytes memory transceiverInstructions
        ) external payable returns (uint64 sequence);
        function completeInboundQueuedTransfer(bytes32 digest) external;
        function completeOutboundQueuedTransfer(uint64 queueSequence) external payable returns (uint64);
        function setPeer(uint16 peerChainId, bytes32 peerContract, uint8 decimals, uint256 inboundLimit) external;
    }
);

sol!(
    #[allow(missing_docs)]
    #[sol(rpc)]
    contract NttManagerV1_1 {
        function transfer(
            uint256 amount,
            uint16 recipientChain,
            bytes32 recipient,
            bytes32 refundAddress,
            bool shouldQueue,
            bytes memory transceiverInstructions
        ) external payable returns (uint64 sequence);
    }
);
