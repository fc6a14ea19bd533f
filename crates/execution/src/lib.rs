//! Execution layer of the keeper.
//!
//! This crate moves funds and manages positions on behalf of a set of
//! wallets:
//! - Wallet registry and key handling
//! - Token and SOL consolidation, SOL distribution
//! - Compensating liquidation through Jupiter
//! - The position auto-check loop

/// Prelude module for convenient imports.
pub mod prelude;

/// Bounded concurrent fan-out.
pub mod fanout;
/// Priority fee schedule.
pub mod fees;
/// Compensating liquidation.
pub mod liquidation;
/// Jitter and inter-transaction delays.
pub mod pacing;
/// Per-item and per-wallet outcomes.
pub mod report;
/// Position auto-check.
pub mod strategy;
/// Transfer and consolidation engine.
pub mod transfer;
/// Wallet management.
pub mod wallet;

#[cfg(test)]
mod testing;
