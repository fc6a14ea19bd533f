//! Solana access layer for the CLMM keeper.
//!
//! This crate provides:
//! - [`rpc`]: the RPC trait, its `RpcClient` implementation and the connection pool
//! - [`compute_budget`]: priority fee injection
//! - [`instructions`]: System, Token and Associated Token instructions
//! - [`transaction`]: the build-sign-submit pipeline
//! - [`orca`]: Orca Whirlpool layouts and position transactions

pub mod compute_budget;
pub mod instructions;
pub mod orca;
pub mod prelude;
pub mod rpc;
pub mod transaction;
