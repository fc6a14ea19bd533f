//! Orca Whirlpool protocol adapter.
//!
//! This module provides functionality to interact with Orca Whirlpool pools:
//! - Read pool and position state
//! - Close positions and open new ones

/// Executor for on-chain operations.
pub mod executor;
/// Orca whirlpool account structures.
pub mod whirlpool;

pub use executor::{
    ConfirmationMode, LoadedPool, LoadedPosition, OpenPositionParams, WhirlpoolExecutor,
};
pub use whirlpool::{LayoutError, Position, WHIRLPOOL_PROGRAM_ID, Whirlpool};
