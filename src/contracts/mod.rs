//! EVM contract bindings
//!
//! Alloy-generated bindings for the contracts an EVM NTT deployment is made
//! of, wrapped in instrumented, typed interfaces:
//!
//! - [`NttManagerContract`]: rate limits, queues, delivery quotes and the
//!   version-dependent `transfer` entry point
//! - [`WormholeTransceiverContract`]: VAA redemption
//! - [`Erc20Contract`]: allowance and approval of the managed token
//!
//! Write methods only build [`alloy_rpc_types::TransactionRequest`]s;
//! signing belongs to a [`crate::Signer`].

mod erc20;
pub mod ntt_manager;
mod transceiver;

pub use erc20::Erc20Contract;
pub use ntt_manager::{
    resolve_binding, ManagerAbi, NttManagerContract, OutboundQueueEntry, QueuedTransferEntry,
    TransferCall, BINDINGS,
};
pub use transceiver::WormholeTransceiverContract;
