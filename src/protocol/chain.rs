//! Wormhole chain identifiers
//!
//! NTT messages identify chains by their 16-bit Wormhole chain id, which is
//! unrelated to the EVM chain id. This module provides a strongly-typed enum
//! over the chains this crate knows how to route between, together with the
//! chain family (address format) and network each belongs to.
//!
//! Reference: <https://wormhole.com/docs/products/reference/chain-ids/>

use std::fmt;
use std::str::FromStr;

use alloy_chains::NamedChain;
use serde::{Deserialize, Serialize};

/// Address format family of a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChainFamily {
    Evm,
    Solana,
    Sui,
    Aptos,
}

impl ChainFamily {
    /// Length of a native address for this family.
    #[inline]
    pub const fn native_address_len(self) -> usize {
        match self {
            Self::Evm => 20,
            Self::Solana | Self::Sui | Self::Aptos => 32,
        }
    }

    /// Decimals of the family's native gas token.
    #[inline]
    pub const fn native_decimals(self) -> u8 {
        match self {
            Self::Evm => 18,
            Self::Solana | Self::Sui => 9,
            Self::Aptos => 8,
        }
    }
}

impl fmt::Display for ChainFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Evm => "Evm",
            Self::Solana => "Solana",
            Self::Sui => "Sui",
            Self::Aptos => "Aptos",
        };
        f.write_str(name)
    }
}

/// Deployment network a chain belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Network {
    Mainnet,
    Testnet,
    Devnet,
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Mainnet => "Mainnet",
            Self::Testnet => "Testnet",
            Self::Devnet => "Devnet",
        };
        f.write_str(name)
    }
}

/// Wormhole chain identifier
///
/// # Example
///
/// ```rust
/// use ntt_rs::Chain;
///
/// assert_eq!(Chain::Ethereum.id(), 2);
/// assert_eq!(Chain::from_id(1), Some(Chain::Solana));
/// assert_eq!(Chain::from_id(9999), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u16)]
#[non_exhaustive]
pub enum Chain {
    Solana = 1,
    Ethereum = 2,
    Bsc = 4,
    Polygon = 5,
    Avalanche = 6,
    Sui = 21,
    Aptos = 22,
    Arbitrum = 23,
    Optimism = 24,
    Base = 30,
    Sepolia = 10002,
    ArbitrumSepolia = 10003,
    BaseSepolia = 10004,
    OptimismSepolia = 10005,
}

impl Chain {
    pub const ALL: [Chain; 14] = [
        Self::Solana,
        Self::Ethereum,
        Self::Bsc,
        Self::Polygon,
        Self::Avalanche,
        Self::Sui,
        Self::Aptos,
        Self::Arbitrum,
        Self::Optimism,
        Self::Base,
        Self::Sepolia,
        Self::ArbitrumSepolia,
        Self::BaseSepolia,
        Self::OptimismSepolia,
    ];

    /// The 16-bit Wormhole chain id carried on the wire.
    #[inline]
    pub const fn id(self) -> u16 {
        self as u16
    }

    #[inline]
    pub const fn from_id(id: u16) -> Option<Self> {
        match id {
            1 => Some(Self::Solana),
            2 => Some(Self::Ethereum),
            4 => Some(Self::Bsc),
            5 => Some(Self::Polygon),
            6 => Some(Self::Avalanche),
            21 => Some(Self::Sui),
            22 => Some(Self::Aptos),
            23 => Some(Self::Arbitrum),
            24 => Some(Self::Optimism),
            30 => Some(Self::Base),
            10002 => Some(Self::Sepolia),
            10003 => Some(Self::ArbitrumSepolia),
            10004 => Some(Self::BaseSepolia),
            10005 => Some(Self::OptimismSepolia),
            _ => None,
        }
    }

    pub const fn family(self) -> ChainFamily {
        match self {
            Self::Solana => ChainFamily::Solana,
            Self::Sui => ChainFamily::Sui,
            Self::Aptos => ChainFamily::Aptos,
            _ => ChainFamily::Evm,
        }
    }

    /// Network the chain id belongs to.
    ///
    /// Non-EVM chains share one Wormhole id across networks and report
    /// `Mainnet`; callers route them by configuration instead.
    pub const fn network(self) -> Network {
        match self {
            Self::Sepolia | Self::ArbitrumSepolia | Self::BaseSepolia | Self::OptimismSepolia => {
                Network::Testnet
            }
            _ => Network::Mainnet,
        }
    }

    pub const fn is_evm(self) -> bool {
        matches!(self.family(), ChainFamily::Evm)
    }

    /// The EVM network of this chain, if it is an EVM chain.
    pub const fn named_chain(self) -> Option<NamedChain> {
        match self {
            Self::Ethereum => Some(NamedChain::Mainnet),
            Self::Bsc => Some(NamedChain::BinanceSmartChain),
            Self::Polygon => Some(NamedChain::Polygon),
            Self::Avalanche => Some(NamedChain::Avalanche),
            Self::Arbitrum => Some(NamedChain::Arbitrum),
            Self::Optimism => Some(NamedChain::Optimism),
            Self::Base => Some(NamedChain::Base),
            Self::Sepolia => Some(NamedChain::Sepolia),
            Self::ArbitrumSepolia => Some(NamedChain::ArbitrumSepolia),
            Self::BaseSepolia => Some(NamedChain::BaseSepolia),
            Self::OptimismSepolia => Some(NamedChain::OptimismSepolia),
            Self::Solana | Self::Sui | Self::Aptos => None,
        }
    }

    /// EVM chain id (as reported by `eth_chainId`), if any.
    pub fn evm_chain_id(self) -> Option<u64> {
        self.named_chain().map(|chain| chain as u64)
    }

    pub fn from_named_chain(chain: NamedChain) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|candidate| candidate.named_chain() == Some(chain))
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Solana => "Solana",
            Self::Ethereum => "Ethereum",
            Self::Bsc => "Bsc",
            Self::Polygon => "Polygon",
            Self::Avalanche => "Avalanche",
            Self::Sui => "Sui",
            Self::Aptos => "Aptos",
            Self::Arbitrum => "Arbitrum",
            Self::Optimism => "Optimism",
            Self::Base => "Base",
            Self::Sepolia => "Sepolia",
            Self::ArbitrumSepolia => "ArbitrumSepolia",
            Self::BaseSepolia => "BaseSepolia",
            Self::OptimismSepolia => "OptimismSepolia",
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Chain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|chain| chain.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown chain: {s}"))
    }
}

impl From<Chain> for u16 {
    fn from(chain: Chain) -> Self {
        chain.id()
    }
}

impl TryFrom<u16> for Chain {
    type Error = String;

    fn try_from(id: u16) -> Result<Self, Self::Error> {
        Self::from_id(id).ok_or_else(|| format!("unknown chain id: {id}"))
    }
}
