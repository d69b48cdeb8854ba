use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{NttError, Result, ValidationError};
use crate::protocol::{parse_units, Chain, Network, UniversalAddress};

/// Wormholescan API environment URLs
///
/// See <https://wormholescan.io/#/developers/api-doc>
///
pub const WORMHOLESCAN_API: &str = "https://api.wormholescan.io";
pub const WORMHOLESCAN_API_TESTNET: &str = "https://api.testnet.wormholescan.io";

/// Operations endpoint, queried by source transaction hash.
pub const OPERATIONS_PATH: &str = "/api/v1/operations";

/// Environment variable holding the route configuration (JSON or a path).
pub const NTT_ROUTE_CONFIG_ENV: &str = "NTT_ROUTE_CONFIG";

/// Configuration for polling external state while tracking a transfer.
///
/// # Examples
///
/// ```rust
/// use ntt_rs::PollingConfig;
///
/// // Use defaults (60 attempts, 30 second intervals)
/// let config = PollingConfig::default();
///
/// // Customize polling behavior
/// let config = PollingConfig::default()
///     .with_max_attempts(20)
///     .with_poll_interval_secs(10);
///
/// // Preset for fast-finality chains (60 attempts, 2 second intervals)
/// let config = PollingConfig::fast_finality();
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Attempts a caller-chosen timeout is usually derived from.
    pub max_attempts: u32,
    /// Seconds to wait between polls of the same external source.
    pub poll_interval_secs: u64,
}

impl Default for PollingConfig {
    /// Guardians attest after source finality, which takes up to ~20
    /// minutes on Ethereum.
    ///
    /// - `max_attempts`: 60
    /// - `poll_interval_secs`: 30
    fn default() -> Self {
        Self {
            max_attempts: 60,
            poll_interval_secs: 30,
        }
    }
}

impl PollingConfig {
    /// Preset for chains with fast finality and for local testing.
    ///
    /// - `max_attempts`: 60
    /// - `poll_interval_secs`: 2
    pub fn fast_finality() -> Self {
        Self {
            max_attempts: 60,
            poll_interval_secs: 2,
        }
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn with_poll_interval_secs(mut self, secs: u64) -> Self {
        self.poll_interval_secs = secs;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// `max_attempts * poll_interval_secs`.
    ///
    /// ```rust
    /// use ntt_rs::PollingConfig;
    ///
    /// assert_eq!(PollingConfig::default().total_timeout().as_secs(), 30 * 60);
    /// ```
    pub fn total_timeout(&self) -> Duration {
        Duration::from_secs(self.max_attempts as u64 * self.poll_interval_secs)
    }
}

/// Kind of a transceiver attached to a manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransceiverKind {
    Wormhole,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransceiverConfig {
    #[serde(rename = "type")]
    pub kind: TransceiverKind,
    pub address: String,
}

/// One chain's NTT deployment.
///
/// Addresses are kept in the chain's native string form and parsed on use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainDeployment {
    pub manager: String,
    pub token: String,
    pub decimals: u8,
    #[serde(default)]
    pub transceivers: Vec<TransceiverConfig>,
    /// Largest destination gas drop-off, in native units (e.g. "0.1").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_gas_drop_off: Option<String>,
}

impl ChainDeployment {
    fn parse_address(&self, chain: Chain, value: &str) -> Result<UniversalAddress> {
        UniversalAddress::parse(chain.family(), value).map_err(|e| {
            ValidationError::InvalidAddress {
                chain,
                reason: e.to_string(),
            }
            .into()
        })
    }

    pub fn manager_address(&self, chain: Chain) -> Result<UniversalAddress> {
        self.parse_address(chain, &self.manager)
    }

    pub fn token_address(&self, chain: Chain) -> Result<UniversalAddress> {
        self.parse_address(chain, &self.token)
    }

    /// Address of the first transceiver of `kind`.
    pub fn transceiver_address(
        &self,
        chain: Chain,
        kind: TransceiverKind,
    ) -> Result<UniversalAddress> {
        let transceiver = self
            .transceivers
            .iter()
            .find(|transceiver| transceiver.kind == kind)
            .ok_or_else(|| {
                NttError::InvalidConfig(format!("no {kind:?} transceiver configured for {chain}"))
            })?;
        self.parse_address(chain, &transceiver.address)
    }

    /// Maximum gas drop-off in base units of the chain's native token.
    pub fn max_gas_drop_off_units(&self, native_decimals: u8) -> Result<Option<alloy_primitives::U256>> {
        self.max_gas_drop_off
            .as_deref()
            .map(|value| parse_units(value, native_decimals).map_err(NttError::from))
            .transpose()
    }
}

/// NTT deployments a route may use, keyed by chain.
///
/// ```rust
/// use ntt_rs::{Chain, Network, NttRouteConfig};
///
/// let config = NttRouteConfig::from_json(r#"{
///     "network": "Testnet",
///     "chains": {
///         "Sepolia": {
///             "manager": "0x1111111111111111111111111111111111111111",
///             "token": "0x2222222222222222222222222222222222222222",
///             "decimals": 18,
///             "transceivers": [
///                 { "type": "wormhole", "address": "0x3333333333333333333333333333333333333333" }
///             ]
///         }
///     }
/// }"#).unwrap();
///
/// assert_eq!(config.network, Network::Testnet);
/// assert!(config.deployment(Chain::Sepolia).is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NttRouteConfig {
    pub network: Network,
    pub chains: BTreeMap<Chain, ChainDeployment>,
}

impl NttRouteConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.check()?;
        debug!(
            network = %config.network,
            chains = config.chains.len(),
            event = "route_config_loaded"
        );
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&json)
    }

    /// Loads from `NTT_ROUTE_CONFIG`, reading `.env` first if present.
    ///
    /// The variable may hold inline JSON or a path to a JSON file.
    pub fn from_env() -> Result<Self> {
        // a missing .env file is fine
        let _ = dotenvy::dotenv();
        let value = std::env::var(NTT_ROUTE_CONFIG_ENV).map_err(|_| {
            NttError::InvalidConfig(format!("{NTT_ROUTE_CONFIG_ENV} is not set"))
        })?;

        if value.trim_start().starts_with('{') {
            Self::from_json(&value)
        } else {
            Self::from_file(value.trim())
        }
    }

    pub fn deployment(&self, chain: Chain) -> std::result::Result<&ChainDeployment, ValidationError> {
        self.chains
            .get(&chain)
            .ok_or(ValidationError::MissingContracts(chain))
    }

    fn check(&self) -> Result<()> {
        for (chain, deployment) in &self.chains {
            deployment.manager_address(*chain)?;
            deployment.token_address(*chain)?;
            for transceiver in &deployment.transceivers {
                deployment.parse_address(*chain, &transceiver.address)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"{
        "network": "Testnet",
        "chains": {
            "Sepolia": {
                "manager": "0x1111111111111111111111111111111111111111",
                "token": "0x2222222222222222222222222222222222222222",
                "decimals": 18,
                "transceivers": [
                    { "type": "wormhole", "address": "0x3333333333333333333333333333333333333333" }
                ],
                "max_gas_drop_off": "0.05"
            },
            "Solana": {
                "manager": "nTTh3bZ5Aer6xboWZe39RDEft4MeVxSQ8D1EYAyLNor",
                "token": "So11111111111111111111111111111111111111112",
                "decimals": 9
            }
        }
    }"#;

    #[test]
    fn test_default_config() {
        let config = PollingConfig::default();
        assert_eq!(config.max_attempts, 60);
        assert_eq!(config.poll_interval_secs, 30);
        assert_eq!(config.total_timeout(), Duration::from_secs(1800));
    }

    #[test]
    fn test_builder_methods() {
        let config = PollingConfig::fast_finality()
            .with_max_attempts(10)
            .with_poll_interval_secs(3);
        assert_eq!(config.poll_interval(), Duration::from_secs(3));
        assert_eq!(config.total_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_parse_route_config() {
        let config = NttRouteConfig::from_json(CONFIG).unwrap();
        assert_eq!(config.network, Network::Testnet);

        let sepolia = config.deployment(Chain::Sepolia).unwrap();
        assert_eq!(sepolia.decimals, 18);
        assert_eq!(
            sepolia.max_gas_drop_off_units(18).unwrap(),
            Some(alloy_primitives::U256::from(50_000_000_000_000_000u64))
        );
        assert!(sepolia
            .transceiver_address(Chain::Sepolia, TransceiverKind::Wormhole)
            .is_ok());

        let solana = config.deployment(Chain::Solana).unwrap();
        assert!(solana.transceivers.is_empty());
        assert!(solana
            .transceiver_address(Chain::Solana, TransceiverKind::Wormhole)
            .is_err());
    }

    #[test]
    fn test_missing_deployment() {
        let config = NttRouteConfig::from_json(CONFIG).unwrap();
        assert_eq!(
            config.deployment(Chain::Base).unwrap_err(),
            ValidationError::MissingContracts(Chain::Base)
        );
    }

    #[test]
    fn test_invalid_address_rejected_at_load() {
        let json = CONFIG.replace(
            "0x1111111111111111111111111111111111111111",
            "0x1111",
        );
        assert!(matches!(
            NttRouteConfig::from_json(&json),
            Err(NttError::Validation(ValidationError::InvalidAddress {
                chain: Chain::Sepolia,
                ..
            }))
        ));
    }

    #[test]
    fn test_config_file() {
        let path = std::env::temp_dir().join(format!("ntt-route-{}.json", std::process::id()));
        std::fs::write(&path, CONFIG).unwrap();
        let config = NttRouteConfig::from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(config.chains.len(), 2);
    }
}
