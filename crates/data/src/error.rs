use thiserror::Error;

/// Error from an HTTP data provider.
#[derive(Debug, Error)]
pub enum DataError {
    /// The request never got a response.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Provider answered with HTTP 429.
    #[error("rate limited by {provider}")]
    RateLimited {
        /// Provider name.
        provider: &'static str,
    },
    /// Any other non-success status.
    #[error("{provider} returned {status}: {body}")]
    Status {
        /// Provider name.
        provider: &'static str,
        /// HTTP status code.
        status: u16,
        /// Response body, if readable.
        body: String,
    },
    /// The response body did not have the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),
    /// DexScreener knows no pair for the token.
    #[error("no pairs listed for {0}")]
    NoPairs(String),
}

/// Turns a non-success response into a [`DataError`].
pub(crate) async fn check_status(
    provider: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, DataError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(DataError::RateLimited { provider });
    }
    let body = response.text().await.unwrap_or_default();
    Err(DataError::Status {
        provider,
        status: status.as_u16(),
        body,
    })
}
