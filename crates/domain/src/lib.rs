//! Core domain types shared by the keeper crates.
//!
//! Nothing in here talks to the network: these are the value objects the
//! RPC layer, the transfer engine and the auto-check loop pass around.

/// Domain entities (tokens, positions).
pub mod entities;
/// Keeper-wide enumerations.
pub mod enums;
/// Domain error type.
pub mod error;
/// Display helpers.
pub mod format;
/// Value objects (lamports, prices, ranges).
pub mod value_objects;

pub use error::DomainError;
