//! Jupiter swap API client.

use crate::error::{DataError, check_status};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://lite-api.jup.ag/swap/v1";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QuoteRequest<'a> {
    input_mint: &'a str,
    output_mint: &'a str,
    amount: String,
    slippage_bps: u16,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummary {
    in_amount: String,
    out_amount: String,
    #[serde(default)]
    price_impact_pct: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SwapRequest<'a> {
    user_public_key: &'a str,
    quote_response: &'a Value,
    wrap_and_unwrap_sol: bool,
    dynamic_compute_unit_limit: bool,
    prioritization_fee_lamports: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SwapResponse {
    swap_transaction: String,
}

/// A swap quote.
///
/// The raw response is kept whole because the swap endpoint expects it back
/// unchanged.
#[derive(Debug, Clone)]
pub struct Quote {
    /// Input amount in base units.
    pub in_amount: u64,
    /// Expected output amount in base units.
    pub out_amount: u64,
    /// Price impact in percent, as reported.
    pub price_impact_pct: String,
    /// Untouched quote payload.
    pub raw: Value,
}

impl Quote {
    fn from_raw(raw: Value) -> Result<Self, DataError> {
        let summary: QuoteSummary =
            serde_json::from_value(raw.clone()).map_err(|e| DataError::Decode(e.to_string()))?;
        let parse = |field: &str, s: &str| {
            s.parse::<u64>()
                .map_err(|e| DataError::Decode(format!("{field}: {e}")))
        };
        Ok(Self {
            in_amount: parse("inAmount", &summary.in_amount)?,
            out_amount: parse("outAmount", &summary.out_amount)?,
            price_impact_pct: summary.price_impact_pct.unwrap_or_default(),
            raw,
        })
    }
}

/// Client for the Jupiter quote and swap endpoints.
#[derive(Debug, Clone)]
pub struct JupiterClient {
    client: reqwest::Client,
    base_url: String,
}

impl JupiterClient {
    /// Client against the public endpoint.
    pub fn new() -> Result<Self, DataError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Client against a custom endpoint.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, DataError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Quotes swapping `amount` base units of `input_mint` into `output_mint`.
    pub async fn quote(
        &self,
        input_mint: &str,
        output_mint: &str,
        amount: u64,
        slippage_bps: u16,
    ) -> Result<Quote, DataError> {
        let request = QuoteRequest {
            input_mint,
            output_mint,
            amount: amount.to_string(),
            slippage_bps,
        };
        let response = self
            .client
            .get(format!("{}/quote", self.base_url))
            .query(&request)
            .send()
            .await?;
        let raw: Value = check_status("jupiter", response)
            .await?
            .json()
            .await
            .map_err(|e| DataError::Decode(e.to_string()))?;

        let quote = Quote::from_raw(raw)?;
        debug!(
            input = %input_mint,
            in_amount = quote.in_amount,
            out_amount = quote.out_amount,
            impact = %quote.price_impact_pct,
            "Jupiter quote"
        );
        Ok(quote)
    }

    /// Requests the serialized swap transaction (base64) for a quote.
    pub async fn swap_transaction(
        &self,
        quote: &Quote,
        user: &str,
        prioritization_fee_lamports: u64,
    ) -> Result<String, DataError> {
        let request = SwapRequest {
            user_public_key: user,
            quote_response: &quote.raw,
            wrap_and_unwrap_sol: true,
            dynamic_compute_unit_limit: true,
            prioritization_fee_lamports,
        };
        let response = self
            .client
            .post(format!("{}/swap", self.base_url))
            .json(&request)
            .send()
            .await?;
        let body: SwapResponse = check_status("jupiter", response)
            .await?
            .json()
            .await
            .map_err(|e| DataError::Decode(e.to_string()))?;
        Ok(body.swap_transaction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_quote_keeps_raw_payload() {
        let raw = json!({
            "inputMint": "mint1",
            "inAmount": "1000000",
            "outputMint": "So11111111111111111111111111111111111111112",
            "outAmount": "4200",
            "otherAmountThreshold": "3990",
            "priceImpactPct": "0.0012",
            "routePlan": []
        });
        let quote = Quote::from_raw(raw.clone()).unwrap();

        assert_eq!(quote.in_amount, 1_000_000);
        assert_eq!(quote.out_amount, 4_200);
        assert_eq!(quote.price_impact_pct, "0.0012");
        assert_eq!(quote.raw, raw);
    }

    #[test]
    fn test_quote_rejects_non_numeric_amount() {
        let raw = json!({"inAmount": "abc", "outAmount": "1"});
        assert!(matches!(Quote::from_raw(raw), Err(DataError::Decode(_))));
    }

    #[test]
    fn test_swap_request_shape() {
        let quote = json!({"inAmount": "1"});
        let request = SwapRequest {
            user_public_key: "user",
            quote_response: &quote,
            wrap_and_unwrap_sol: true,
            dynamic_compute_unit_limit: true,
            prioritization_fee_lamports: 300_000,
        };
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["userPublicKey"], "user");
        assert_eq!(value["quoteResponse"]["inAmount"], "1");
        assert_eq!(value["prioritizationFeeLamports"], 300_000);
        assert_eq!(value["wrapAndUnwrapSol"], true);
    }

    #[test]
    fn test_quote_request_query() {
        let request = QuoteRequest {
            input_mint: "a",
            output_mint: "b",
            amount: 5.to_string(),
            slippage_bps: 500,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["slippageBps"], 500);
        assert_eq!(value["amount"], "5");
    }
}
