//! Trimmed token amounts
//!
//! Token amounts cross chains with at most [`TRIMMED_DECIMALS`] decimal
//! digits so that every chain, whatever its native token precision, can
//! represent the transferred value exactly. Any precision beyond that
//! ("dust") stays on the source chain.

use std::cmp::Ordering;
use std::fmt;

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use super::amount::{format_units, parse_units_truncating};
use crate::error::{NttError, Result};
use crate::layout::{Layout, LayoutError, Record, Schema, Value};

/// Maximum number of decimals carried on the wire.
pub const TRIMMED_DECIMALS: u8 = 8;

/// A token amount with at most [`TRIMMED_DECIMALS`] decimals.
///
/// Two amounts are only comparable after scaling to the lesser of their
/// decimals; see [`TrimmedAmount::cmp_normalized`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrimmedAmount {
    pub amount: u64,
    pub decimals: u8,
}

/// `10^exp`, or `None` past `10^77`.
fn pow10(exp: u8) -> Option<U256> {
    U256::from(10u64).checked_pow(U256::from(exp))
}

// Powers beyond U256 exceed every amount: the quotient is zero and the
// remainder is the amount itself.
fn div_pow10(amount: U256, exp: u8) -> U256 {
    pow10(exp).map_or(U256::ZERO, |divisor| amount / divisor)
}

fn rem_pow10(amount: U256, exp: u8) -> U256 {
    pow10(exp).map_or(amount, |divisor| amount % divisor)
}

impl TrimmedAmount {
    pub const fn new(amount: u64, decimals: u8) -> Self {
        Self { amount, decimals }
    }

    pub const fn zero(decimals: u8) -> Self {
        Self::new(0, decimals)
    }

    pub const fn is_zero(&self) -> bool {
        self.amount == 0
    }

    /// Decimals an amount moving between two tokens is trimmed to.
    pub fn target_decimals(from_decimals: u8, to_decimals: u8) -> u8 {
        TRIMMED_DECIMALS.min(from_decimals).min(to_decimals)
    }

    /// Trims a base-unit amount at `from_decimals` for delivery to a token
    /// with `to_decimals`, truncating dust.
    ///
    /// ```rust
    /// use ntt_rs::TrimmedAmount;
    /// use alloy_primitives::U256;
    ///
    /// let amount = U256::from(1_234_567_890_123_450_000u128);
    /// let trimmed = TrimmedAmount::trim(amount, 18, 18).unwrap();
    /// assert_eq!(trimmed, TrimmedAmount::new(123_456_789, 8));
    /// ```
    pub fn trim(amount: U256, from_decimals: u8, to_decimals: u8) -> Result<Self> {
        let target = Self::target_decimals(from_decimals, to_decimals);
        let scaled = div_pow10(amount, from_decimals - target);
        let amount = u64::try_from(scaled).map_err(|_| NttError::AmountTooLarge {
            amount: amount.to_string(),
            decimals: from_decimals,
        })?;
        Ok(Self::new(amount, target))
    }

    /// Returns true when [`TrimmedAmount::trim`] would discard non-zero dust.
    pub fn has_dust(amount: U256, from_decimals: u8, to_decimals: u8) -> bool {
        let target = Self::target_decimals(from_decimals, to_decimals);
        rem_pow10(amount, from_decimals - target) != U256::ZERO
    }

    /// Parses a decimal string at a token's `decimals`, truncating to the
    /// trimmed precision.
    ///
    /// ```rust
    /// use ntt_rs::TrimmedAmount;
    ///
    /// let trimmed = TrimmedAmount::parse("1.23456789012345", 18).unwrap();
    /// assert_eq!(trimmed, TrimmedAmount::new(123_456_789, 8));
    /// ```
    pub fn parse(amount: &str, decimals: u8) -> Result<Self> {
        let target = TRIMMED_DECIMALS.min(decimals);
        let units = parse_units_truncating(amount, target)?;
        Self::trim(units, target, target)
    }

    /// Scales back to base units of a token with `to_decimals`.
    ///
    /// Fails with [`NttError::AmountTooLarge`] when the result does not fit
    /// in a `U256`.
    pub fn untrim(&self, to_decimals: u8) -> Result<U256> {
        let amount = U256::from(self.amount);
        match to_decimals.cmp(&self.decimals) {
            Ordering::Equal => Ok(amount),
            Ordering::Greater => pow10(to_decimals - self.decimals)
                .and_then(|factor| amount.checked_mul(factor))
                .ok_or_else(|| NttError::AmountTooLarge {
                    amount: self.to_string(),
                    decimals: to_decimals,
                }),
            Ordering::Less => Ok(div_pow10(amount, self.decimals - to_decimals)),
        }
    }

    /// Rescales to `to_decimals` (never more than [`TRIMMED_DECIMALS`]).
    pub fn scale(&self, to_decimals: u8) -> Result<Self> {
        let target = to_decimals.min(TRIMMED_DECIMALS);
        let scaled = self.untrim(target)?;
        let amount = u64::try_from(scaled).map_err(|_| NttError::AmountTooLarge {
            amount: scaled.to_string(),
            decimals: target,
        })?;
        Ok(Self::new(amount, target))
    }

    /// Compares after scaling both sides to the lesser decimals.
    pub fn cmp_normalized(&self, other: &Self) -> Ordering {
        let decimals = self.decimals.min(other.decimals);
        let normalize = |amount: &Self| div_pow10(U256::from(amount.amount), amount.decimals - decimals);
        normalize(self).cmp(&normalize(other))
    }

    pub fn checked_add(self, other: Self) -> Result<Self> {
        self.check_decimals(&other)?;
        let amount = self
            .amount
            .checked_add(other.amount)
            .ok_or_else(|| NttError::AmountTooLarge {
                amount: format!("{} + {}", self.amount, other.amount),
                decimals: self.decimals,
            })?;
        Ok(Self::new(amount, self.decimals))
    }

    pub fn checked_sub(self, other: Self) -> Result<Self> {
        self.check_decimals(&other)?;
        let amount = self
            .amount
            .checked_sub(other.amount)
            .ok_or_else(|| NttError::InvalidState(format!(
                "cannot subtract {} from {}",
                other.amount, self.amount
            )))?;
        Ok(Self::new(amount, self.decimals))
    }

    fn check_decimals(&self, other: &Self) -> Result<()> {
        if self.decimals != other.decimals {
            return Err(NttError::DecimalsMismatch {
                left: self.decimals,
                right: other.decimals,
            });
        }
        Ok(())
    }

    /// Packed `uint72` storage form: `amount << 8 | decimals`.
    pub fn to_packed(&self) -> u128 {
        (u128::from(self.amount) << 8) | u128::from(self.decimals)
    }

    pub fn from_packed(packed: u128) -> Result<Self> {
        let amount = u64::try_from(packed >> 8).map_err(|_| NttError::AmountTooLarge {
            amount: packed.to_string(),
            decimals: (packed & 0xFF) as u8,
        })?;
        Ok(Self::new(amount, (packed & 0xFF) as u8))
    }
}

impl fmt::Display for TrimmedAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_units(U256::from(self.amount), self.decimals))
    }
}

impl Schema for TrimmedAmount {
    fn layout() -> Layout {
        Layout::new().uint("decimals", 1).uint("amount", 8)
    }

    fn to_value(&self) -> Value {
        Record::new()
            .with("decimals", self.decimals)
            .with("amount", self.amount)
            .into()
    }

    fn from_value(value: Value) -> std::result::Result<Self, LayoutError> {
        let mut record = value.try_into_record("trimmed_amount")?;
        Ok(Self {
            decimals: record.take_uint("decimals")?,
            amount: record.take_uint("amount")?,
        })
    }
}
