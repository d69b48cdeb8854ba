//! Wormholescan API attestation source.

use alloy_primitives::Bytes;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, trace, Instrument, Span};
use url::Url;

use crate::error::{NttError, Result};
use crate::protocol::{Chain, Network};
use crate::route::{OPERATIONS_PATH, WORMHOLESCAN_API, WORMHOLESCAN_API_TESTNET};
use crate::spans;
use crate::traits::AttestationSource;

/// Fetches signed VAAs for source transactions from Wormholescan.
///
/// # Examples
///
/// ```rust,no_run
/// use ntt_rs::providers::WormholescanAttestationSource;
/// use ntt_rs::traits::AttestationSource;
/// use ntt_rs::Chain;
///
/// # async fn example() -> Result<(), ntt_rs::NttError> {
/// let source = WormholescanAttestationSource::testnet()?;
/// let vaa = source
///     .fetch_attestation(Chain::Sepolia, "0x5f3b1c9a1e0c4bd28f62f10f0a0d97b3d1f62c4b8b2fb0b0a8c1d2e3f4a5b6c7")
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct WormholescanAttestationSource {
    base_url: Url,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct OperationsResponse {
    #[serde(default)]
    operations: Vec<Operation>,
}

#[derive(Debug, Deserialize)]
struct Operation {
    #[serde(default)]
    vaa: Option<OperationVaa>,
}

#[derive(Debug, Deserialize)]
struct OperationVaa {
    raw: String,
}

/// Extracts the first signed VAA from an operations response.
fn parse_operations(body: &str) -> Result<Option<Bytes>> {
    let response: OperationsResponse = serde_json::from_str(body)?;
    response
        .operations
        .into_iter()
        .find_map(|operation| operation.vaa)
        .map(|vaa| -> Result<Bytes> { Ok(Bytes::from(STANDARD.decode(vaa.raw)?)) })
        .transpose()
}

impl WormholescanAttestationSource {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| NttError::InvalidUrl {
            reason: format!("{base_url}: {e}"),
        })?;
        Ok(Self {
            base_url,
            client: Client::new(),
        })
    }

    pub fn mainnet() -> Result<Self> {
        Self::new(WORMHOLESCAN_API)
    }

    pub fn testnet() -> Result<Self> {
        Self::new(WORMHOLESCAN_API_TESTNET)
    }

    /// Devnet has no public Wormholescan deployment.
    pub fn for_network(network: Network) -> Result<Self> {
        match network {
            Network::Mainnet => Self::mainnet(),
            Network::Testnet => Self::testnet(),
            Network::Devnet => Err(NttError::InvalidConfig(
                "no Wormholescan API for Devnet".to_string(),
            )),
        }
    }

    /// Operations lookup URL for a source transaction.
    pub fn operations_url(&self, txid: &str) -> Result<Url> {
        let mut url = self
            .base_url
            .join(OPERATIONS_PATH)
            .map_err(|e| NttError::InvalidUrl {
                reason: e.to_string(),
            })?;
        url.query_pairs_mut().append_pair("txHash", txid);
        Ok(url)
    }

    async fn fetch(&self, url: Url) -> Result<Option<Bytes>> {
        trace!(url = %url, "Requesting operations from Wormholescan");
        let response = self.client.get(url).send().await?;

        let status = response.status();
        Span::current().record("http.status_code", status.as_u16());

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(300);

            debug!(retry_after_seconds = retry_after, event = "wormholescan_rate_limited");
            return Err(NttError::RateLimitExceeded {
                retry_after_seconds: retry_after,
            });
        }

        // Not indexed yet.
        if status == reqwest::StatusCode::NOT_FOUND {
            debug!(event = "operation_not_found");
            return Ok(None);
        }

        response.error_for_status_ref()?;
        let body = response.text().await?;
        let vaa = parse_operations(&body)?;
        debug!(
            found = vaa.is_some(),
            event = "operations_response_parsed"
        );
        Ok(vaa)
    }
}

#[async_trait]
impl AttestationSource for WormholescanAttestationSource {
    async fn fetch_attestation(&self, chain: Chain, txid: &str) -> Result<Option<Bytes>> {
        let url = self.operations_url(txid)?;
        let span = spans::fetch_attestation(&url, chain);

        async {
            self.fetch(url)
                .await
                .inspect_err(|e| spans::record_error(e))
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operations_url() {
        let source = WormholescanAttestationSource::testnet().unwrap();
        let url = source.operations_url("0xabc123").unwrap();
        insta::assert_snapshot!(url.as_str(), @"https://api.testnet.wormholescan.io/api/v1/operations?txHash=0xabc123");
    }

    #[test]
    fn test_devnet_has_no_api() {
        assert!(matches!(
            WormholescanAttestationSource::for_network(Network::Devnet),
            Err(NttError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            WormholescanAttestationSource::new("not a url"),
            Err(NttError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_parse_signed_operation() {
        let body = r#"{"operations":[{"id":"10002/abc/1","vaa":{"raw":"AQID","guardianSetIndex":0}}]}"#;
        let vaa = parse_operations(body).unwrap().unwrap();
        assert_eq!(vaa.as_ref(), &[1, 2, 3]);
    }

    #[test]
    fn test_parse_unsigned_operation() {
        assert_eq!(parse_operations(r#"{"operations":[{"id":"10002/abc/1"}]}"#).unwrap(), None);
        assert_eq!(parse_operations(r#"{"operations":[]}"#).unwrap(), None);
        assert_eq!(parse_operations("{}").unwrap(), None);
    }

    #[test]
    fn test_parse_rejects_bad_base64() {
        let body = r#"{"operations":[{"vaa":{"raw":"not base64!"}}]}"#;
        assert!(matches!(parse_operations(body), Err(NttError::Base64(_))));
    }
}
