use alloy_primitives::U256;
use bon::Builder;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::config::NttRouteConfig;
use crate::error::{NttError, Result, ValidationError};
use crate::protocol::{format_units, parse_units, Chain, TrimmedAmount, UniversalAddress};

/// Parameters for an NTT transfer, as entered by a user.
#[derive(Builder, Debug, Clone)]
pub struct TransferParams {
    source_chain: Chain,
    destination_chain: Chain,
    /// Decimal amount in whole tokens, e.g. `"1.5"`.
    #[builder(into)]
    amount: String,
    sender: UniversalAddress,
    recipient: UniversalAddress,
    /// Native gas to deliver to the recipient, in whole destination-native
    /// units. Automatic routes only.
    #[builder(into)]
    gas_drop_off: Option<String>,
    /// Queue instead of reverting when outbound capacity is exhausted.
    #[builder(default)]
    should_queue: bool,
}

impl TransferParams {
    pub fn source_chain(&self) -> Chain {
        self.source_chain
    }

    pub fn destination_chain(&self) -> Chain {
        self.destination_chain
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }

    pub fn sender(&self) -> UniversalAddress {
        self.sender
    }

    pub fn recipient(&self) -> UniversalAddress {
        self.recipient
    }

    pub fn gas_drop_off(&self) -> Option<&str> {
        self.gas_drop_off.as_deref()
    }

    pub fn should_queue(&self) -> bool {
        self.should_queue
    }
}

/// Options fixed by validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferOptions {
    /// A relayer redeems on the destination chain.
    pub automatic: bool,
    /// Destination-native base units delivered with the transfer.
    pub gas_drop_off: U256,
    pub should_queue: bool,
}

/// Transfer parameters checked against the route configuration.
///
/// Holding one means every local rule passed; quoting and initiating only
/// add network state on top.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedTransfer {
    pub source_chain: Chain,
    pub destination_chain: Chain,
    pub source_manager: UniversalAddress,
    pub source_token: UniversalAddress,
    pub destination_manager: UniversalAddress,
    pub sender: UniversalAddress,
    pub recipient: UniversalAddress,
    /// The decimal string as entered.
    pub amount: String,
    pub source_decimals: u8,
    pub destination_decimals: u8,
    /// Base units debited on the source chain.
    pub source_amount: U256,
    /// What travels on the wire.
    pub trimmed_amount: TrimmedAmount,
    /// Base units credited on the destination chain.
    pub destination_amount: U256,
    pub options: TransferOptions,
}

impl ValidatedTransfer {
    /// Source amount formatted in whole tokens.
    pub fn display_source_amount(&self) -> String {
        format_units(self.source_amount, self.source_decimals)
    }

    pub fn display_destination_amount(&self) -> String {
        format_units(self.destination_amount, self.destination_decimals)
    }
}

fn check_address(
    chain: Chain,
    address: &UniversalAddress,
) -> std::result::Result<(), ValidationError> {
    address
        .to_native(chain.family())
        .map(|_| ())
        .map_err(|e| ValidationError::InvalidAddress {
            chain,
            reason: e.to_string(),
        })
}

/// Checks `params` against `config` without touching the network.
pub(crate) fn validate_transfer(
    params: &TransferParams,
    config: &NttRouteConfig,
    automatic: bool,
) -> Result<ValidatedTransfer> {
    let source_chain = params.source_chain;
    let destination_chain = params.destination_chain;

    if source_chain == destination_chain {
        return Err(ValidationError::SameChain(source_chain).into());
    }

    for chain in [source_chain, destination_chain] {
        if chain.is_evm() && chain.network() != config.network {
            return Err(ValidationError::WrongNetwork {
                chain,
                expected: config.network,
                actual: chain.network(),
            }
            .into());
        }
    }

    let source = config.deployment(source_chain)?;
    let destination = config.deployment(destination_chain)?;

    check_address(source_chain, &params.sender)?;
    check_address(destination_chain, &params.recipient)?;

    let source_amount = parse_units(&params.amount, source.decimals)?;
    if source_amount.is_zero() {
        return Err(ValidationError::ZeroAmount.into());
    }

    if TrimmedAmount::has_dust(source_amount, source.decimals, destination.decimals) {
        return Err(ValidationError::Precision {
            amount: params.amount.clone(),
            decimals: TrimmedAmount::target_decimals(source.decimals, destination.decimals),
        }
        .into());
    }
    let trimmed_amount = TrimmedAmount::trim(source_amount, source.decimals, destination.decimals)?;

    // Re-parse at destination precision; the result must agree with what the
    // destination manager will mint from the trimmed amount.
    let untrimmed = trimmed_amount.untrim(destination.decimals)?;
    let destination_amount =
        parse_units(&params.amount, destination.decimals).map_err(|_| NttError::RoundingMismatch {
            destination: params.amount.clone(),
            untrimmed: untrimmed.to_string(),
        })?;
    if destination_amount != untrimmed {
        return Err(NttError::RoundingMismatch {
            destination: destination_amount.to_string(),
            untrimmed: untrimmed.to_string(),
        });
    }

    let native_decimals = destination_chain.family().native_decimals();
    let gas_drop_off = match params.gas_drop_off.as_deref() {
        None => U256::ZERO,
        Some(requested) => {
            let units = parse_units(requested, native_decimals)?;
            let max = if automatic {
                destination
                    .max_gas_drop_off_units(native_decimals)?
                    .unwrap_or(U256::ZERO)
            } else {
                U256::ZERO
            };
            if units > max {
                return Err(ValidationError::GasDropOffTooLarge {
                    requested: requested.to_string(),
                    max: format_units(max, native_decimals),
                }
                .into());
            }
            units
        }
    };

    debug!(
        source_chain = %source_chain,
        destination_chain = %destination_chain,
        trimmed_amount = %trimmed_amount,
        automatic = automatic,
        event = "transfer_validated"
    );

    Ok(ValidatedTransfer {
        source_chain,
        destination_chain,
        source_manager: source.manager_address(source_chain)?,
        source_token: source.token_address(source_chain)?,
        destination_manager: destination.manager_address(destination_chain)?,
        sender: params.sender,
        recipient: params.recipient,
        amount: params.amount.clone(),
        source_decimals: source.decimals,
        destination_decimals: destination.decimals,
        source_amount,
        trimmed_amount,
        destination_amount,
        options: TransferOptions {
            automatic,
            gas_drop_off,
            should_queue: params.should_queue,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Network;
    use alloy_primitives::{address, Address};
    use rstest::rstest;

    fn config(source_decimals: u8, destination_decimals: u8) -> NttRouteConfig {
        NttRouteConfig::from_json(&format!(
            r#"{{
                "network": "Testnet",
                "chains": {{
                    "Sepolia": {{
                        "manager": "0x1111111111111111111111111111111111111111",
                        "token": "0x2222222222222222222222222222222222222222",
                        "decimals": {source_decimals}
                    }},
                    "BaseSepolia": {{
                        "manager": "0x4444444444444444444444444444444444444444",
                        "token": "0x5555555555555555555555555555555555555555",
                        "decimals": {destination_decimals},
                        "max_gas_drop_off": "0.01"
                    }}
                }}
            }}"#
        ))
        .unwrap()
    }

    fn params(amount: &str) -> TransferParams {
        TransferParams::builder()
            .source_chain(Chain::Sepolia)
            .destination_chain(Chain::BaseSepolia)
            .amount(amount)
            .sender(address!("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa").into())
            .recipient(address!("bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb").into())
            .build()
    }

    #[test]
    fn test_validate_computes_amounts() {
        let validated = validate_transfer(&params("1.5"), &config(18, 6), false).unwrap();
        assert_eq!(validated.source_amount, U256::from(1_500_000_000_000_000_000u128));
        assert_eq!(validated.trimmed_amount, TrimmedAmount::new(1_500_000, 6));
        assert_eq!(validated.destination_amount, U256::from(1_500_000u64));
        assert_eq!(validated.display_destination_amount(), "1.5");
        assert!(!validated.options.automatic);
    }

    #[rstest]
    #[case("1.23456789012345", 18, 18, 8)]
    #[case("0.0000001", 18, 6, 6)]
    fn test_dust_is_rejected(
        #[case] amount: &str,
        #[case] source_decimals: u8,
        #[case] destination_decimals: u8,
        #[case] target: u8,
    ) {
        let err = validate_transfer(
            &params(amount),
            &config(source_decimals, destination_decimals),
            false,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            NttError::Validation(ValidationError::Precision { decimals, .. }) if decimals == target
        ));
    }

    #[test]
    fn test_more_precision_than_source_token() {
        let err = validate_transfer(&params("1.1234567"), &config(6, 18), false).unwrap_err();
        assert!(matches!(
            err,
            NttError::Validation(ValidationError::Precision { decimals: 6, .. })
        ));
    }

    #[test]
    fn test_zero_amount() {
        let err = validate_transfer(&params("0.000"), &config(18, 18), false).unwrap_err();
        assert!(matches!(err, NttError::Validation(ValidationError::ZeroAmount)));
    }

    #[test]
    fn test_same_chain() {
        let params = TransferParams::builder()
            .source_chain(Chain::Sepolia)
            .destination_chain(Chain::Sepolia)
            .amount("1")
            .sender(Address::ZERO.into())
            .recipient(Address::ZERO.into())
            .build();
        let err = validate_transfer(&params, &config(18, 18), false).unwrap_err();
        assert!(matches!(
            err,
            NttError::Validation(ValidationError::SameChain(Chain::Sepolia))
        ));
    }

    #[test]
    fn test_wrong_network() {
        let params = TransferParams::builder()
            .source_chain(Chain::Ethereum)
            .destination_chain(Chain::BaseSepolia)
            .amount("1")
            .sender(Address::ZERO.into())
            .recipient(Address::ZERO.into())
            .build();
        let err = validate_transfer(&params, &config(18, 18), false).unwrap_err();
        assert!(matches!(
            err,
            NttError::Validation(ValidationError::WrongNetwork {
                chain: Chain::Ethereum,
                expected: Network::Testnet,
                actual: Network::Mainnet,
            })
        ));
    }

    #[test]
    fn test_missing_contracts() {
        let params = TransferParams::builder()
            .source_chain(Chain::Sepolia)
            .destination_chain(Chain::ArbitrumSepolia)
            .amount("1")
            .sender(Address::ZERO.into())
            .recipient(Address::ZERO.into())
            .build();
        let err = validate_transfer(&params, &config(18, 18), false).unwrap_err();
        assert!(matches!(
            err,
            NttError::Validation(ValidationError::MissingContracts(Chain::ArbitrumSepolia))
        ));
    }

    #[test]
    fn test_recipient_must_fit_destination_family() {
        let params = TransferParams::builder()
            .source_chain(Chain::Sepolia)
            .destination_chain(Chain::BaseSepolia)
            .amount("1")
            .sender(Address::ZERO.into())
            .recipient(UniversalAddress::from([0xff; 32]))
            .build();
        let err = validate_transfer(&params, &config(18, 18), false).unwrap_err();
        assert!(matches!(
            err,
            NttError::Validation(ValidationError::InvalidAddress {
                chain: Chain::BaseSepolia,
                ..
            })
        ));
    }

    #[rstest]
    #[case(true, "0.01", true)]
    #[case(true, "0.02", false)]
    #[case(false, "0.01", false)]
    #[case(false, "0", true)]
    fn test_gas_drop_off_limits(
        #[case] automatic: bool,
        #[case] drop_off: &str,
        #[case] accepted: bool,
    ) {
        let params = TransferParams::builder()
            .source_chain(Chain::Sepolia)
            .destination_chain(Chain::BaseSepolia)
            .amount("1")
            .sender(Address::ZERO.into())
            .recipient(Address::ZERO.into())
            .gas_drop_off(drop_off)
            .build();
        let result = validate_transfer(&params, &config(18, 18), automatic);
        assert_eq!(result.is_ok(), accepted, "{result:?}");
        if !accepted {
            assert!(matches!(
                result.unwrap_err(),
                NttError::Validation(ValidationError::GasDropOffTooLarge { .. })
            ));
        }
    }
}
