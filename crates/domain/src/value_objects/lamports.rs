//! Native SOL amounts in their smallest unit.
//!
//! All native-currency arithmetic is done on integer lamports. Conversions
//! from display units always truncate, so a derived amount can never exceed
//! what the caller asked for.

use crate::DomainError;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of lamports in one SOL.
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// An amount of native SOL expressed in lamports.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Lamports(pub u64);

impl Lamports {
    /// Zero lamports.
    pub const ZERO: Self = Self(0);

    /// Converts a SOL amount to lamports, truncating sub-lamport dust.
    ///
    /// # Errors
    /// Returns an error for negative amounts or amounts above `u64::MAX` lamports.
    pub fn from_sol(sol: Decimal) -> Result<Self, DomainError> {
        if sol.is_sign_negative() && !sol.is_zero() {
            return Err(DomainError::InvalidAmount(format!("{sol} SOL is negative")));
        }
        (sol * Decimal::from(LAMPORTS_PER_SOL))
            .trunc()
            .to_u64()
            .map(Self)
            .ok_or_else(|| DomainError::InvalidAmount(format!("{sol} SOL does not fit in u64")))
    }

    /// Returns the amount in SOL.
    #[must_use]
    pub fn to_sol(self) -> Decimal {
        Decimal::from(self.0) / Decimal::from(LAMPORTS_PER_SOL)
    }

    /// Raw lamport value.
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }

    /// Subtracts `other`, returning `None` when the result would be zero or negative.
    #[must_use]
    pub fn positive_remainder(self, other: Lamports) -> Option<Lamports> {
        self.0.checked_sub(other.0).filter(|v| *v > 0).map(Self)
    }

    /// Splits the amount evenly across `parts` recipients, flooring each share.
    ///
    /// Returns `None` when `parts` is zero.
    #[must_use]
    pub fn split_evenly(self, parts: usize) -> Option<Lamports> {
        if parts == 0 {
            return None;
        }
        Some(Self(self.0 / parts as u64))
    }
}

impl From<u64> for Lamports {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

impl fmt::Display for Lamports {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} SOL", self.to_sol().normalize())
    }
}
