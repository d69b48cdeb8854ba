//! Rate-limit accounting
//!
//! Managers cap the value that may leave (outbound) or arrive from a given
//! peer (inbound) per sliding window. Capacity refills linearly from the
//! remaining capacity at the last transfer back up to the limit over one
//! window length.

use serde::{Deserialize, Serialize};

use super::{TrimmedAmount, UniversalAddress};
use crate::layout::{Layout, LayoutError, Record, Schema, Value};

/// Sliding-window state as stored on chain.
///
/// The layout mirrors the Solana account data, so integers are
/// little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitState {
    pub limit: u64,
    pub capacity_at_last_tx: u64,
    pub last_tx_timestamp: u64,
}

impl RateLimitState {
    /// A full window.
    pub fn new(limit: u64, now: u64) -> Self {
        Self {
            limit,
            capacity_at_last_tx: limit,
            last_tx_timestamp: now,
        }
    }

    /// Spendable capacity at `now` for a window of `duration` seconds.
    ///
    /// `min(limit, capacity_at_last_tx + (now - last_tx_timestamp) * limit / duration)`;
    /// a zero duration disables limiting and always reports the full limit.
    pub fn capacity_at(&self, now: u64, duration: u64) -> u64 {
        if duration == 0 {
            return self.limit;
        }
        let elapsed = now.saturating_sub(self.last_tx_timestamp);
        let refill = u128::from(elapsed) * u128::from(self.limit) / u128::from(duration);
        let capacity = u128::from(self.capacity_at_last_tx) + refill;
        capacity.min(u128::from(self.limit)) as u64
    }

    /// Debits `amount` if the window allows it.
    ///
    /// Returns false and leaves the state untouched otherwise.
    pub fn try_consume(&mut self, amount: u64, now: u64, duration: u64) -> bool {
        let capacity = self.capacity_at(now, duration);
        if amount > capacity {
            return false;
        }
        self.capacity_at_last_tx = capacity - amount;
        self.last_tx_timestamp = now;
        true
    }

    /// Credits `amount` back, never exceeding the limit.
    pub fn refill(&mut self, amount: u64, now: u64, duration: u64) {
        let capacity = self.capacity_at(now, duration);
        self.capacity_at_last_tx = capacity.saturating_add(amount).min(self.limit);
        self.last_tx_timestamp = now;
    }

    /// Changes the limit, shifting current capacity by the same delta.
    pub fn set_limit(&mut self, limit: u64, now: u64, duration: u64) {
        let capacity = self.capacity_at(now, duration);
        self.capacity_at_last_tx = if limit >= self.limit {
            capacity.saturating_add(limit - self.limit)
        } else {
            capacity.saturating_sub(self.limit - limit)
        }
        .min(limit);
        self.limit = limit;
        self.last_tx_timestamp = now;
    }
}

impl Schema for RateLimitState {
    fn layout() -> Layout {
        Layout::new()
            .uint_le("limit", 8)
            .uint_le("capacity_at_last_tx", 8)
            .uint_le("last_tx_timestamp", 8)
    }

    fn to_value(&self) -> Value {
        Record::new()
            .with("limit", self.limit)
            .with("capacity_at_last_tx", self.capacity_at_last_tx)
            .with("last_tx_timestamp", self.last_tx_timestamp)
            .into()
    }

    fn from_value(value: Value) -> Result<Self, LayoutError> {
        let mut record = value.try_into_record("rate_limit_state")?;
        Ok(Self {
            limit: record.take_uint("limit")?,
            capacity_at_last_tx: record.take_uint("capacity_at_last_tx")?,
            last_tx_timestamp: record.take_uint("last_tx_timestamp")?,
        })
    }
}

/// An inbound transfer held back because the window had no capacity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedInboundTransfer {
    pub recipient: UniversalAddress,
    pub amount: TrimmedAmount,
    /// Seconds since the epoch when the transfer was queued.
    pub tx_timestamp: u64,
    /// Earliest time the transfer may be completed.
    pub rate_limit_expiry_timestamp: u64,
}

impl QueuedInboundTransfer {
    pub fn new(
        recipient: UniversalAddress,
        amount: TrimmedAmount,
        tx_timestamp: u64,
        rate_limit_duration: u64,
    ) -> Self {
        Self {
            recipient,
            amount,
            tx_timestamp,
            rate_limit_expiry_timestamp: tx_timestamp.saturating_add(rate_limit_duration),
        }
    }

    pub fn is_ready(&self, now: u64) -> bool {
        now >= self.rate_limit_expiry_timestamp
    }
}

/// An outbound transfer held back because the source window had no
/// capacity. The sender's tokens are already locked or burned; the transfer
/// message is only emitted once the entry is completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedOutboundTransfer {
    /// Manager-assigned handle used to complete the entry.
    pub queue_sequence: u64,
    pub sender: UniversalAddress,
    pub recipient: UniversalAddress,
    /// Wormhole chain id of the destination.
    pub recipient_chain: u16,
    pub amount: TrimmedAmount,
    pub tx_timestamp: u64,
    pub rate_limit_expiry_timestamp: u64,
}

impl QueuedOutboundTransfer {
    pub fn is_ready(&self, now: u64) -> bool {
        now >= self.rate_limit_expiry_timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const DAY: u64 = 86_400;

    #[rstest]
    #[case(0, 0)]
    #[case(DAY / 4, 250)]
    #[case(DAY / 2, 500)]
    #[case(DAY, 1_000)]
    #[case(DAY * 3, 1_000)]
    fn test_linear_refill(#[case] elapsed: u64, #[case] expected: u64) {
        let state = RateLimitState {
            limit: 1_000,
            capacity_at_last_tx: 0,
            last_tx_timestamp: 10,
        };
        assert_eq!(state.capacity_at(10 + elapsed, DAY), expected);
    }

    #[test]
    fn test_zero_duration_is_unlimited() {
        let state = RateLimitState {
            limit: 7,
            capacity_at_last_tx: 0,
            last_tx_timestamp: 0,
        };
        assert_eq!(state.capacity_at(0, 0), 7);
    }

    #[test]
    fn test_consume_and_refill() {
        let mut state = RateLimitState::new(100, 0);
        assert!(state.try_consume(60, 0, DAY));
        assert_eq!(state.capacity_at(0, DAY), 40);
        assert!(!state.try_consume(41, 0, DAY));
        assert_eq!(state.capacity_at(0, DAY), 40);

        state.refill(100, 0, DAY);
        assert_eq!(state.capacity_at(0, DAY), 100);
    }

    #[test]
    fn test_set_limit_shifts_capacity() {
        let mut state = RateLimitState::new(100, 0);
        assert!(state.try_consume(30, 0, DAY));
        state.set_limit(200, 0, DAY);
        assert_eq!(state.capacity_at(0, DAY), 170);
        state.set_limit(50, 0, DAY);
        assert_eq!(state.capacity_at(0, DAY), 20);
    }

    #[test]
    fn test_little_endian_account_layout() {
        let state = RateLimitState {
            limit: 1,
            capacity_at_last_tx: 2,
            last_tx_timestamp: 0x0102,
        };
        let bytes = state.encode().unwrap();
        insta::assert_snapshot!(
            alloy_primitives::hex::encode(&bytes),
            @"010000000000000002000000000000000201000000000000"
        );
        assert_eq!(RateLimitState::decode(&bytes).unwrap(), state);
    }

    #[test]
    fn test_queued_transfer_expiry() {
        let queued = QueuedInboundTransfer::new(
            UniversalAddress::ZERO,
            TrimmedAmount::new(5, 8),
            1_000,
            DAY,
        );
        assert_eq!(queued.rate_limit_expiry_timestamp, 1_000 + DAY);
        assert!(!queued.is_ready(1_000 + DAY - 1));
        assert!(queued.is_ready(1_000 + DAY));
    }
}
