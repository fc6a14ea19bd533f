//! DexScreener token lookups.

use super::TokenInfoProvider;
use crate::error::{DataError, check_status};
use async_trait::async_trait;
use clmm_keeper_domain::entities::TokenInfo;
use clmm_keeper_domain::value_objects::Price;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://api.dexscreener.com/latest/dex";
const WRAPPED_SOL: &str = "So11111111111111111111111111111111111111112";

#[derive(Debug, Deserialize)]
struct TokensResponse {
    #[serde(default)]
    pairs: Option<Vec<DexPair>>,
}

/// One trading pair as listed by DexScreener.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DexPair {
    pub dex_id: String,
    pub base_token: DexToken,
    pub quote_token: DexToken,
    #[serde(default)]
    pub price_native: Option<String>,
    #[serde(default)]
    pub price_usd: Option<String>,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DexToken {
    pub address: String,
    pub symbol: String,
}

impl DexPair {
    fn quoted_in_sol(&self) -> bool {
        self.quote_token.symbol == "SOL"
    }

    fn is_clmm(&self) -> bool {
        self.labels.iter().any(|l| l == "CLMM")
    }

    fn to_token_info(&self) -> TokenInfo {
        TokenInfo {
            symbol: self.base_token.symbol.clone(),
            address: self.base_token.address.clone(),
            price_native: Price::new(parse_decimal(self.price_native.as_deref())),
            price_usd: Price::new(parse_decimal(self.price_usd.as_deref())),
            market_cap: self
                .market_cap
                .and_then(Decimal::from_f64)
                .unwrap_or(Decimal::ZERO),
        }
    }
}

fn parse_decimal(raw: Option<&str>) -> Decimal {
    raw.and_then(|s| Decimal::from_str(s).ok())
        .unwrap_or(Decimal::ZERO)
}

/// Picks the pair a token is priced from.
///
/// Preference: a Raydium pair quoted in SOL that is not a CLMM pool, then any
/// non-CLMM pair quoted in SOL, then the first pair listed.
#[must_use]
pub fn select_pair(pairs: &[DexPair]) -> Option<&DexPair> {
    pairs
        .iter()
        .find(|p| p.dex_id == "raydium" && p.quoted_in_sol() && !p.is_clmm())
        .or_else(|| pairs.iter().find(|p| p.quoted_in_sol() && !p.is_clmm()))
        .or_else(|| pairs.first())
}

/// [`TokenInfoProvider`] backed by the DexScreener public API.
#[derive(Debug, Clone)]
pub struct DexScreenerProvider {
    client: reqwest::Client,
    base_url: String,
}

impl DexScreenerProvider {
    /// Provider against the public endpoint.
    pub fn new() -> Result<Self, DataError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Provider against a custom endpoint.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, DataError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// All pairs listed for a token.
    pub async fn pairs(&self, address: &str) -> Result<Vec<DexPair>, DataError> {
        let url = format!("{}/tokens/{}", self.base_url, address);
        debug!(url = %url, "Fetching DexScreener pairs");

        let response = self.client.get(&url).send().await?;
        let response = check_status("dexscreener", response).await?;
        let body: TokensResponse = response
            .json()
            .await
            .map_err(|e| DataError::Decode(e.to_string()))?;

        match body.pairs {
            Some(pairs) if !pairs.is_empty() => Ok(pairs),
            _ => Err(DataError::NoPairs(address.to_string())),
        }
    }

    /// Token info, surfacing the failure instead of the sentinel.
    pub async fn try_token_info(&self, address: &str) -> Result<TokenInfo, DataError> {
        let pairs = self.pairs(address).await?;
        select_pair(&pairs)
            .map(DexPair::to_token_info)
            .ok_or_else(|| DataError::NoPairs(address.to_string()))
    }
}

#[async_trait]
impl TokenInfoProvider for DexScreenerProvider {
    async fn token_info(&self, address: &str) -> TokenInfo {
        match self.try_token_info(address).await {
            Ok(info) => info,
            Err(e) => {
                warn!(token = %address, error = %e, "Token lookup failed");
                TokenInfo::unknown(address)
            }
        }
    }

    async fn sol_price_usd(&self) -> Decimal {
        match self.pairs(WRAPPED_SOL).await {
            Ok(pairs) => pairs
                .first()
                .map(|p| parse_decimal(p.price_usd.as_deref()))
                .unwrap_or(Decimal::ZERO),
            Err(e) => {
                warn!(error = %e, "SOL price lookup failed");
                Decimal::ZERO
            }
        }
    }
}
