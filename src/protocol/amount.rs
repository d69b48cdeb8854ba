//! Decimal amount strings and base units

use alloy_primitives::U256;

use crate::error::ValidationError;

/// Splits a decimal string into its integer and fractional digits.
fn split_decimal(amount: &str) -> Result<(&str, &str), ValidationError> {
    let invalid = || ValidationError::InvalidAmount(amount.to_string());
    let trimmed = amount.trim();
    let (int, frac) = match trimmed.split_once('.') {
        Some((int, frac)) => (int, frac),
        None => (trimmed, ""),
    };
    if int.is_empty() && frac.is_empty() {
        return Err(invalid());
    }
    if !int.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    Ok((int, frac))
}

fn digits_to_u256(amount: &str, digits: &str) -> Result<U256, ValidationError> {
    if digits.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(digits, 10).map_err(|_| ValidationError::InvalidAmount(amount.to_string()))
}

/// Parses a decimal string into base units at `decimals`.
///
/// Fails with [`ValidationError::Precision`] when the fractional part has
/// more digits than `decimals` and any of the excess digits are non-zero.
///
/// ```rust
/// use ntt_rs::parse_units;
/// use alloy_primitives::U256;
///
/// assert_eq!(parse_units("1.5", 6).unwrap(), U256::from(1_500_000u64));
/// assert!(parse_units("1.0000001", 6).is_err());
/// ```
pub fn parse_units(amount: &str, decimals: u8) -> Result<U256, ValidationError> {
    let (int, frac) = split_decimal(amount)?;
    let decimals_usize = decimals as usize;

    let frac = if frac.len() > decimals_usize {
        let (kept, dropped) = frac.split_at(decimals_usize);
        if dropped.bytes().any(|b| b != b'0') {
            return Err(ValidationError::Precision {
                amount: amount.to_string(),
                decimals,
            });
        }
        kept.to_string()
    } else {
        format!("{frac:0<decimals_usize$}")
    };

    let scale = U256::from(10u64)
        .checked_pow(U256::from(decimals))
        .ok_or_else(|| ValidationError::InvalidAmount(amount.to_string()))?;
    let int_units = digits_to_u256(amount, int)?
        .checked_mul(scale)
        .ok_or_else(|| ValidationError::InvalidAmount(amount.to_string()))?;
    int_units
        .checked_add(digits_to_u256(amount, &frac)?)
        .ok_or_else(|| ValidationError::InvalidAmount(amount.to_string()))
}

/// Parses a decimal string into base units, discarding digits beyond
/// `decimals`.
pub(crate) fn parse_units_truncating(amount: &str, decimals: u8) -> Result<U256, ValidationError> {
    let (int, frac) = split_decimal(amount)?;
    let kept = &frac[..frac.len().min(decimals as usize)];
    let normalized = format!("{}.{}", if int.is_empty() { "0" } else { int }, kept);
    parse_units(&normalized, decimals)
}

/// Formats base units as a decimal string without trailing zeros.
///
/// ```rust
/// use ntt_rs::format_units;
/// use alloy_primitives::U256;
///
/// assert_eq!(format_units(U256::from(1_500_000u64), 6), "1.5");
/// assert_eq!(format_units(U256::from(7u64), 0), "7");
/// ```
pub fn format_units(amount: U256, decimals: u8) -> String {
    let digits = amount.to_string();
    let decimals = decimals as usize;
    if decimals == 0 {
        return digits;
    }

    let padded = format!("{digits:0>width$}", width = decimals + 1);
    let (int, frac) = padded.split_at(padded.len() - decimals);
    let frac = frac.trim_end_matches('0');
    if frac.is_empty() {
        int.to_string()
    } else {
        format!("{int}.{frac}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1", 6, 1_000_000)]
    #[case("0.000001", 6, 1)]
    #[case(".5", 1, 5)]
    #[case("2.", 2, 200)]
    #[case("1.500000000", 6, 1_500_000)]
    #[case("  42  ", 0, 42)]
    fn test_parse_units(#[case] input: &str, #[case] decimals: u8, #[case] expected: u64) {
        assert_eq!(parse_units(input, decimals).unwrap(), U256::from(expected));
    }

    #[rstest]
    #[case("")]
    #[case(".")]
    #[case("-1")]
    #[case("1.2.3")]
    #[case("1e18")]
    fn test_parse_units_rejects_malformed(#[case] input: &str) {
        assert!(matches!(
            parse_units(input, 18),
            Err(ValidationError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_parse_units_precision_error() {
        assert_eq!(
            parse_units("1.123", 2).unwrap_err(),
            ValidationError::Precision {
                amount: "1.123".to_string(),
                decimals: 2
            }
        );
    }

    #[test]
    fn test_parse_units_rejects_unrepresentable_decimals() {
        assert!(matches!(
            parse_units("1", 78),
            Err(ValidationError::InvalidAmount(_))
        ));
        assert_eq!(parse_units("0", 77).unwrap(), U256::ZERO);
    }

    #[test]
    fn test_truncating_parse() {
        assert_eq!(
            parse_units_truncating("1.23456789012345", 8).unwrap(),
            U256::from(123_456_789u64)
        );
    }

    #[rstest]
    #[case(0, 18, "0")]
    #[case(1, 18, "0.000000000000000001")]
    #[case(1_234_567_890_123_450_000, 18, "1.23456789012345")]
    #[case(100, 2, "1")]
    fn test_format_units(#[case] amount: u128, #[case] decimals: u8, #[case] expected: &str) {
        assert_eq!(format_units(U256::from(amount), decimals), expected);
    }
}
