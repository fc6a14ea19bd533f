//! HTTP market data for the CLMM keeper.
//!
//! - [`providers::DexScreenerProvider`]: token info and SOL price lookups
//! - [`providers::JupiterClient`]: swap quotes and serialized swap transactions

/// Error type for data providers.
pub mod error;
/// Remote data providers.
pub mod providers;

pub use error::DataError;
pub use providers::{DexScreenerProvider, JupiterClient, TokenInfoProvider};
