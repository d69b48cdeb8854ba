//! Wallet-backed signer for EVM transactions.

use alloy_network::{Ethereum, ReceiptResponse};
use alloy_primitives::Address;
use alloy_provider::Provider;
use alloy_rpc_types::TransactionRequest;
use async_trait::async_trait;
use tracing::{debug, info, instrument};

use crate::error::{NttError, Result};
use crate::protocol::{Chain, UniversalAddress};
use crate::traits::{Signer, TransactionId};

/// Sends transactions through a provider that carries a wallet.
///
/// Each transaction is sent after the previous one is mined, so an approval
/// is in place before the transfer that depends on it.
///
/// ```rust,no_run
/// use ntt_rs::providers::EvmSigner;
/// use ntt_rs::Chain;
/// use alloy_provider::ProviderBuilder;
/// use alloy_signer_local::PrivateKeySigner;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let wallet: PrivateKeySigner = std::env::var("PRIVATE_KEY")?.parse()?;
/// let address = wallet.address();
/// let provider = ProviderBuilder::new()
///     .wallet(wallet)
///     .connect("https://ethereum-sepolia-rpc.publicnode.com")
///     .await?;
/// let signer = EvmSigner::new(Chain::Sepolia, address, provider);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct EvmSigner<P> {
    chain: Chain,
    address: Address,
    provider: P,
}

impl<P: Provider<Ethereum>> EvmSigner<P> {
    pub fn new(chain: Chain, address: Address, provider: P) -> Self {
        Self {
            chain,
            address,
            provider,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}

#[async_trait]
impl<P> Signer<TransactionRequest> for EvmSigner<P>
where
    P: Provider<Ethereum> + Clone + Send + Sync + 'static,
{
    fn chain(&self) -> Chain {
        self.chain
    }

    fn address(&self) -> UniversalAddress {
        self.address.into()
    }

    #[instrument(skip(self, transactions), fields(chain = %self.chain, tx_count = transactions.len()))]
    async fn sign_and_send(
        &self,
        transactions: Vec<TransactionRequest>,
    ) -> Result<Vec<TransactionId>> {
        let mut txids = Vec::with_capacity(transactions.len());

        for mut transaction in transactions {
            if transaction.from.is_none() {
                transaction.from = Some(self.address);
            }

            let pending = self.provider.send_transaction(transaction).await?;
            let hash = *pending.tx_hash();
            debug!(tx_hash = %hash, event = "transaction_sent");

            let receipt = pending
                .get_receipt()
                .await
                .map_err(|e| NttError::Provider(e.to_string()))?;
            if !receipt.status() {
                return Err(NttError::ContractCall(format!("transaction {hash} reverted")));
            }

            info!(
                tx_hash = %hash,
                block_number = ?receipt.block_number(),
                event = "transaction_confirmed"
            );
            txids.push(TransactionId::new(self.chain, hash.to_string()));
        }

        Ok(txids)
    }
}
