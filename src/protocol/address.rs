//! Chain-agnostic 32-byte addresses

use std::fmt;

use alloy_primitives::{hex, Address, B256};
use serde::{Deserialize, Serialize};

use super::ChainFamily;

/// Errors converting between native and universal addresses.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("{family} addresses are {expected} bytes, got {actual}")]
    InvalidLength {
        family: ChainFamily,
        expected: usize,
        actual: usize,
    },

    #[error("universal address {0} has non-zero padding for a shorter native format")]
    NonZeroPadding(B256),

    #[error("cannot parse {family} address {input:?}: {reason}")]
    Parse {
        family: ChainFamily,
        input: String,
        reason: String,
    },
}

/// A 32-byte address every native chain address embeds into by left-padding
/// with zeros.
///
/// # Example
///
/// ```rust
/// use ntt_rs::{ChainFamily, UniversalAddress};
/// use alloy_primitives::address;
///
/// let evm = address!("742d35Cc6634C0532925a3b844Bc9e7595f8fA0d");
/// let universal = UniversalAddress::from_native(ChainFamily::Evm, evm.as_slice()).unwrap();
/// assert_eq!(universal.to_native(ChainFamily::Evm).unwrap(), evm.as_slice());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct UniversalAddress(B256);

impl UniversalAddress {
    pub const ZERO: Self = Self(B256::ZERO);

    pub const fn new(bytes: B256) -> Self {
        Self(bytes)
    }

    /// Embeds a native address, left-padding to 32 bytes.
    ///
    /// Fails unless the native bytes are exactly the family's address
    /// length, so that [`to_native`](Self::to_native) gives them back.
    pub fn from_native(family: ChainFamily, native: &[u8]) -> Result<Self, AddressError> {
        let expected = family.native_address_len();
        if native.len() != expected {
            return Err(AddressError::InvalidLength {
                family,
                expected,
                actual: native.len(),
            });
        }
        let mut bytes = [0u8; 32];
        bytes[32 - native.len()..].copy_from_slice(native);
        Ok(Self(B256::from(bytes)))
    }

    /// Extracts the native address; the padding region must be zero.
    pub fn to_native(&self, family: ChainFamily) -> Result<Vec<u8>, AddressError> {
        let len = family.native_address_len();
        let (padding, native) = self.0.as_slice().split_at(32 - len);
        if padding.iter().any(|byte| *byte != 0) {
            return Err(AddressError::NonZeroPadding(self.0));
        }
        Ok(native.to_vec())
    }

    pub fn to_evm(&self) -> Result<Address, AddressError> {
        self.to_native(ChainFamily::Evm)
            .map(|bytes| Address::from_slice(&bytes))
    }

    /// Parses a native address string: hex for EVM, base58 for Solana,
    /// and 0x-prefixed hex for Sui and Aptos.
    pub fn parse(family: ChainFamily, input: &str) -> Result<Self, AddressError> {
        let parse_error = |reason: String| AddressError::Parse {
            family,
            input: input.to_string(),
            reason,
        };

        let native = match family {
            ChainFamily::Evm => input
                .parse::<Address>()
                .map_err(|e| parse_error(e.to_string()))?
                .to_vec(),
            ChainFamily::Solana => bs58::decode(input)
                .into_vec()
                .map_err(|e| parse_error(e.to_string()))?,
            ChainFamily::Sui | ChainFamily::Aptos => {
                let digits = input.trim_start_matches("0x");
                // short-form Move addresses such as 0x1
                let padded = format!("{digits:0>64}");
                hex::decode(padded).map_err(|e| parse_error(e.to_string()))?
            }
        };
        Self::from_native(family, &native)
    }

    /// Formats as the family's native string form.
    pub fn to_native_string(&self, family: ChainFamily) -> Result<String, AddressError> {
        let native = self.to_native(family)?;
        Ok(match family {
            ChainFamily::Evm => Address::from_slice(&native).to_checksum(None),
            ChainFamily::Solana => bs58::encode(native).into_string(),
            ChainFamily::Sui | ChainFamily::Aptos => format!("0x{}", hex::encode(native)),
        })
    }

    pub fn as_b256(&self) -> B256 {
        self.0
    }

    pub fn as_slice(&self) -> &[u8] {
        self.0.as_slice()
    }

    pub fn is_zero(&self) -> bool {
        self.0 == B256::ZERO
    }
}

impl From<B256> for UniversalAddress {
    fn from(bytes: B256) -> Self {
        Self(bytes)
    }
}

impl From<[u8; 32]> for UniversalAddress {
    fn from(bytes: [u8; 32]) -> Self {
        Self(B256::from(bytes))
    }
}

impl From<Address> for UniversalAddress {
    fn from(address: Address) -> Self {
        Self(address.into_word())
    }
}

impl From<UniversalAddress> for B256 {
    fn from(address: UniversalAddress) -> Self {
        address.0
    }
}

impl fmt::Display for UniversalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}
