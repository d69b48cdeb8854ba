use std::time::Duration;

use thiserror::Error;

use crate::layout::LayoutError;
use crate::protocol::Chain;

/// Errors raised while validating transfer parameters.
///
/// These are always surfaced before any network call is made and are never
/// worth retrying with the same input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid decimal amount: {0:?}")]
    InvalidAmount(String),

    #[error("amount {amount} has more precision than {decimals} decimals allow")]
    Precision { amount: String, decimals: u8 },

    #[error("amount must be greater than zero")]
    ZeroAmount,

    #[error("no NTT deployment configured for {0}")]
    MissingContracts(Chain),

    #[error("source and destination chains must differ, both are {0}")]
    SameChain(Chain),

    #[error("chain {chain} belongs to {actual} but the route is configured for {expected}")]
    WrongNetwork {
        chain: Chain,
        expected: crate::protocol::Network,
        actual: crate::protocol::Network,
    },

    #[error("gas drop-off {requested} exceeds the configured maximum {max}")]
    GasDropOffTooLarge { requested: String, max: String },

    #[error("invalid address for {chain}: {reason}")]
    InvalidAddress { chain: Chain, reason: String },
}

#[derive(Error, Debug)]
pub enum NttError {
    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Quote failed: {reason}")]
    Quote { reason: String },

    #[error("Timed out after {waited:?} waiting for {waiting_for}")]
    Timeout {
        waited: Duration,
        waiting_for: &'static str,
    },

    #[error("Network mismatch: adapter expects chain id {expected} but provider reports {actual}")]
    NetworkMismatch { expected: u64, actual: u64 },

    #[error("Amount {amount} does not fit a trimmed amount at {decimals} decimals")]
    AmountTooLarge { amount: String, decimals: u8 },

    #[error("{chain} manager cannot deliver a gas drop-off")]
    GasDropOffUnsupported { chain: Chain },

    #[error("Decimals mismatch: {left} vs {right}")]
    DecimalsMismatch { left: u8, right: u8 },

    #[error("Destination amount {destination} differs from untrimmed amount {untrimmed}")]
    RoundingMismatch {
        destination: String,
        untrimmed: String,
    },

    #[error("Chain not supported: {chain}")]
    ChainNotSupported { chain: String },

    #[error("Unsupported contract version: {0}")]
    UnsupportedVersion(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Contract call failed: {0}")]
    ContractCall(String),

    #[error("Attestation failed: {reason}")]
    AttestationFailed { reason: String },

    #[error("Rate limit exceeded, retry after {retry_after_seconds} seconds")]
    RateLimitExceeded { retry_after_seconds: u64 },

    #[error("Queued transfer not releasable until {expiry}, now {now}")]
    QueuedTransferNotReady { expiry: u64, now: u64 },

    #[error("Invalid transfer state: {0}")]
    InvalidState(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid URL: {reason}")]
    InvalidUrl { reason: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("RPC error: {0}")]
    Rpc(#[from] alloy_json_rpc::RpcError<alloy_transport::TransportErrorKind>),

    #[error("ABI encoding/decoding error: {0}")]
    Abi(#[from] alloy_sol_types::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Hex conversion error: {0}")]
    Hex(#[from] alloy_primitives::hex::FromHexError),

    #[error("Base64 decoding error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl NttError {
    /// Returns true when repeating the same call later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Quote { .. }
                | Self::Timeout { .. }
                | Self::RateLimitExceeded { .. }
                | Self::Network(_)
                | Self::Rpc(_)
                | Self::Provider(_)
                | Self::QueuedTransferNotReady { .. }
        )
    }
}

impl From<alloy_contract::Error> for NttError {
    fn from(error: alloy_contract::Error) -> Self {
        Self::ContractCall(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, NttError>;
