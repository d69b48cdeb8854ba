use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use super::params::ValidatedTransfer;
use crate::protocol::{format_units, TransceiverInstructions};

/// Priced transfer, handed unchanged to `initiate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub transfer: ValidatedTransfer,
    pub instructions: TransceiverInstructions,
    /// Source-native value attached to the transfer call.
    pub delivery_price: U256,
    /// What the relayer charges; present on automatic routes only.
    pub relay_fee: Option<U256>,
    /// Destination-native base units delivered to the recipient.
    pub destination_gas_drop_off: U256,
    /// The source window has no room; the transfer will sit in the
    /// outbound queue.
    pub outbound_queued: bool,
    /// Source window length in seconds when `outbound_queued` is set; the
    /// sender may release the transfer once it elapsed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outbound_queue_delay: Option<u64>,
    /// The destination window has no room; the transfer will be queued on
    /// arrival for one window length.
    pub inbound_queued: bool,
    /// Window length in seconds when `inbound_queued` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inbound_queue_delay: Option<u64>,
}

impl Quote {
    pub fn source_amount(&self) -> U256 {
        self.transfer.source_amount
    }

    pub fn destination_amount(&self) -> U256 {
        self.transfer.destination_amount
    }

    /// Relay fee in whole source-native units.
    pub fn display_relay_fee(&self) -> Option<String> {
        let decimals = self.transfer.source_chain.family().native_decimals();
        self.relay_fee.map(|fee| format_units(fee, decimals))
    }
}
