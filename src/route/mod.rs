// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! Transfer routes
//!
//! A route moves one token between two NTT deployments. It validates the
//! user's intent, prices it, submits the source transactions, tracks the
//! transfer through attestation to destination finality and, on manual
//! routes, completes it on the destination chain.

mod config;
mod ntt;
mod params;
mod quote;
mod rate_limit;
mod state;

pub use config::{
    ChainDeployment, NttRouteConfig, PollingConfig, TransceiverConfig, TransceiverKind,
    NTT_ROUTE_CONFIG_ENV, OPERATIONS_PATH, WORMHOLESCAN_API, WORMHOLESCAN_API_TESTNET,
};
pub use ntt::{Automatic, AutomaticNttRoute, Manual, ManualNttRoute, NttRoute, RoutePolicy};
pub use params::{TransferOptions, TransferParams, ValidatedTransfer};
pub use quote::Quote;
pub use rate_limit::RateLimitQuery;
pub use state::{Attestation, AttestationId, TransferRecord, TransferState};
