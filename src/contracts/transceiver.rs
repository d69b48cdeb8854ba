//! Wormhole transceiver bindings
//!
//! Inbound transfers are redeemed by handing the VAA to the destination
//! transceiver, which verifies it against the core bridge and forwards the
//! manager message to its manager.

use alloy_network::Ethereum;
use alloy_primitives::{Address, Bytes, B256};
use alloy_provider::Provider;
use alloy_rpc_types::TransactionRequest;
use alloy_sol_types::sol;
use tracing::info;

use crate::error::Result;
use WormholeTransceiver::WormholeTransceiverInstance;

pub struct WormholeTransceiverContract<P: Provider<Ethereum>> {
    instance: WormholeTransceiverInstance<P>,
}

impl<P: Provider<Ethereum>> WormholeTransceiverContract<P> {
    pub fn new(address: Address, provider: P) -> Self {
        Self {
            instance: WormholeTransceiverInstance::new(address, provider),
        }
    }

    pub fn address(&self) -> Address {
        *self.instance.address()
    }

    /// Whether this VAA hash was already consumed by the transceiver.
    pub async fn is_vaa_consumed(&self, hash: B256) -> Result<bool> {
        Ok(self.instance.isVAAConsumed(hash).call().await?)
    }

    /// Unsigned `receiveMessage(vaa)` sent from `from`.
    pub fn receive_message_transaction(&self, from: Address, vaa: Bytes) -> TransactionRequest {
        info!(
            from = %from,
            transceiver = %self.address(),
            vaa_len = vaa.len(),
            event = "receive_message_transaction_created"
        );
        self.instance
            .receiveMessage(vaa)
            .from(from)
            .into_transaction_request()
    }
}

sol!(
    #[allow(missing_docs)]
    #[sol(rpc)]
    contract WormholeTransceiver {
        function receiveMessage(bytes memory encodedMessage) external;
        function isVAAConsumed(bytes32 hash) external view returns (bool);
    }
);
