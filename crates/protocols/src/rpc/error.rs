//! Errors surfaced by RPC calls.

use solana_client::client_error::{ClientError, ClientErrorKind};
use thiserror::Error;

/// Error from a single remote call.
///
/// Pool slots never fail on their own; every endpoint or proxy problem
/// reaches the borrower as one of these.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChainError {
    /// Network, proxy or provider failure.
    #[error("transport error: {0}")]
    Transport(String),
    /// Provider answered with HTTP 429 / "Too Many Requests".
    #[error("rate limited: {0}")]
    RateLimited(String),
    /// The node rejected the request or transaction.
    #[error("rejected: {0}")]
    Rejected(String),
    /// A response could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),
    /// Signing the transaction failed.
    #[error("signing error: {0}")]
    Signing(String),
    /// An instruction could not be built.
    #[error("instruction error: {0}")]
    Instruction(String),
}

impl ChainError {
    /// Whether the error is a transport-level failure (including throttling).
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::RateLimited(_))
    }
}

/// Whether a message looks like provider throttling.
#[must_use]
pub fn is_rate_limit_message(message: &str) -> bool {
    message.contains("429") || message.contains("Too Many Requests")
}

impl From<ClientError> for ChainError {
    fn from(err: ClientError) -> Self {
        let message = err.to_string();
        match err.kind() {
            ClientErrorKind::Reqwest(e) if e.status().map(|s| s.as_u16()) == Some(429) => {
                Self::RateLimited(message)
            }
            ClientErrorKind::TransactionError(_) | ClientErrorKind::RpcError(_) => {
                Self::Rejected(message)
            }
            ClientErrorKind::SerdeJson(_) => Self::Decode(message),
            ClientErrorKind::SigningError(_) => Self::Signing(message),
            _ => Self::Transport(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_detection() {
        assert!(is_rate_limit_message("HTTP status client error (429 Too Many Requests)"));
        assert!(is_rate_limit_message("Server responded with 429"));
        assert!(is_rate_limit_message("Too Many Requests for url"));
        assert!(!is_rate_limit_message("connection reset by peer"));
    }

    #[test]
    fn test_transport_classification() {
        assert!(ChainError::RateLimited("429".into()).is_transport());
        assert!(ChainError::Transport("timeout".into()).is_transport());
        assert!(!ChainError::Rejected("blockhash not found".into()).is_transport());
    }

    #[test]
    fn test_node_error_mentioning_429_is_rejected() {
        let err = ClientError::from(ClientErrorKind::RpcError(
            solana_client::rpc_request::RpcError::ForUser("need 429 more lamports".into()),
        ));
        let classified = ChainError::from(err);
        assert!(matches!(classified, ChainError::Rejected(_)));
        assert!(!classified.is_transport());
    }

    #[test]
    fn test_custom_error_mentioning_429_is_plain_transport() {
        let err = ClientError::from(ClientErrorKind::Custom(
            "slot 4290001 not available".into(),
        ));
        assert!(matches!(ChainError::from(err), ChainError::Transport(_)));
    }
}
