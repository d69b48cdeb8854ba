// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! ERC20 bindings for the token a manager locks or burns
//!
//! Managers pull tokens with `transferFrom`, so the sender must have
//! approved the manager for at least the transfer amount beforehand.

use alloy_network::Ethereum;
use alloy_primitives::{Address, U256};
use alloy_provider::Provider;
use alloy_rpc_types::TransactionRequest;
use alloy_sol_types::sol;
use tracing::{debug, info};

use crate::error::Result;
use Erc20::Erc20Instance;

/// Token wrapper used by the EVM adapter.
///
/// ```rust,no_run
/// use ntt_rs::contracts::Erc20Contract;
/// use alloy_primitives::{address, U256};
/// use alloy_provider::ProviderBuilder;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let provider = ProviderBuilder::new().connect("http://localhost:8545").await?;
/// let token = Erc20Contract::new(address!("2222222222222222222222222222222222222222"), provider);
///
/// let owner = address!("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
/// let manager = address!("1111111111111111111111111111111111111111");
/// if token.allowance(owner, manager).await? < U256::from(1_000u64) {
///     let _approve = token.approve_transaction(owner, manager, U256::from(1_000u64));
/// }
/// # Ok(())
/// # }
/// ```
pub struct Erc20Contract<P: Provider<Ethereum>> {
    instance: Erc20Instance<P>,
}

impl<P: Provider<Ethereum>> Erc20Contract<P> {
    pub fn new(address: Address, provider: P) -> Self {
        debug!(
            contract_address = %address,
            event = "erc20_contract_initialized"
        );
        Self {
            instance: Erc20Instance::new(address, provider),
        }
    }

    pub fn address(&self) -> Address {
        *self.instance.address()
    }

    pub async fn decimals(&self) -> Result<u8> {
        Ok(self.instance.decimals().call().await?)
    }

    /// Amount `spender` may currently pull from `owner`.
    pub async fn allowance(&self, owner: Address, spender: Address) -> Result<U256> {
        let allowance = self.instance.allowance(owner, spender).call().await?;
        debug!(
            owner = %owner,
            spender = %spender,
            allowance = %allowance,
            token = %self.address(),
            event = "allowance_retrieved"
        );
        Ok(allowance)
    }

    pub async fn balance_of(&self, account: Address) -> Result<U256> {
        Ok(self.instance.balanceOf(account).call().await?)
    }

    /// Unsigned `approve(spender, amount)` sent from `owner`.
    pub fn approve_transaction(
        &self,
        owner: Address,
        spender: Address,
        amount: U256,
    ) -> TransactionRequest {
        info!(
            owner = %owner,
            spender = %spender,
            amount = %amount,
            token = %self.address(),
            event = "approve_transaction_created"
        );
        self.instance
            .approve(spender, amount)
            .from(owner)
            .into_transaction_request()
    }
}

sol!(
    #[allow(missing_docs)]
    #[sol(rpc)]
    contract Erc20 {
        function decimals() external view returns (uint8);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
        function balanceOf(address account) external view returns (uint256);
    }
);
