//! # ntt-rs
//!
//! A Rust SDK for Native Token Transfers (NTT): moving one token between
//! manager deployments on different chains, with per-chain rate limits and
//! Wormhole attestations carrying the transfer message.
//!
//! The crate has two halves:
//!
//! - **Wire formats.** A declarative [`layout`] engine and the NTT message
//!   catalogue built on it ([`protocol`]): transfers, transceiver messages,
//!   registrations, VAAs and trimmed amounts, all byte-exact.
//! - **Routes.** [`ManualNttRoute`] and [`AutomaticNttRoute`] validate a
//!   transfer, quote it, submit it through a [`traits::Signer`], and track it
//!   from the source transaction to destination finality.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use ntt_rs::providers::{EvmNttAdapter, EvmSigner, TokioClock, WormholescanAttestationSource};
//! use ntt_rs::{Chain, ManualNttRoute, NttRouteConfig, TransferParams};
//! use alloy_provider::ProviderBuilder;
//! use alloy_signer_local::PrivateKeySigner;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = NttRouteConfig::from_env()?;
//! let wallet: PrivateKeySigner = std::env::var("PRIVATE_KEY")?.parse()?;
//! let me = wallet.address();
//!
//! let sepolia = ProviderBuilder::new()
//!     .wallet(wallet.clone())
//!     .connect("https://ethereum-sepolia-rpc.publicnode.com")
//!     .await?;
//! let base = ProviderBuilder::new()
//!     .wallet(wallet)
//!     .connect("https://sepolia.base.org")
//!     .await?;
//!
//! let route = ManualNttRoute::builder()
//!     .source(EvmNttAdapter::connect(Chain::Sepolia, sepolia.clone(), config.deployment(Chain::Sepolia)?).await?)
//!     .destination(EvmNttAdapter::connect(Chain::BaseSepolia, base.clone(), config.deployment(Chain::BaseSepolia)?).await?)
//!     .attestations(WormholescanAttestationSource::for_network(config.network)?)
//!     .clock(TokioClock::new())
//!     .config(config)
//!     .build();
//!
//! let params = TransferParams::builder()
//!     .source_chain(Chain::Sepolia)
//!     .destination_chain(Chain::BaseSepolia)
//!     .amount("1.5")
//!     .sender(me.into())
//!     .recipient(me.into())
//!     .build();
//!
//! let validated = route.validate(&params)?;
//! let quote = route.quote(&validated).await?;
//! let record = route.initiate(&EvmSigner::new(Chain::Sepolia, me, sepolia), &quote).await?;
//!
//! let mut updates = Box::pin(route.track(record, None));
//! let mut latest = None;
//! while let Some(update) = updates.next().await {
//!     latest = Some(update?);
//! }
//! # let _ = (latest, base);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`layout`]: declarative binary layouts
//! - [`protocol`]: chains, addresses, amounts, messages, VAAs, rate limits
//! - [`route`]: validation, quoting, initiation, tracking and completion
//! - [`contracts`]: Alloy bindings for EVM deployments
//! - [`providers`]: production [`traits`] implementations
//! - [`testing`]: in-memory fakes for tests
//! - [`spans`]: tracing span constructors

pub mod contracts;
mod error;
pub mod layout;
pub mod protocol;
pub mod providers;
pub mod route;
pub mod spans;
pub mod testing;
pub mod traits;

pub use error::{NttError, Result, ValidationError};
pub use protocol::{
    format_units, parse_units, Chain, ChainFamily, Network, TrimmedAmount, UniversalAddress,
};
pub use route::{
    AutomaticNttRoute, ManualNttRoute, NttRoute, NttRouteConfig, PollingConfig, Quote,
    RateLimitQuery, TransferParams, TransferRecord, TransferState,
};
pub use traits::{AttestationSource, Clock, NttAdapter, Signer, TransactionId, TransferRequest};
