use crate::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What the auto-checker does with a position that left its range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AutoCheckAction {
    /// Withdraw and close.
    Close,
    /// Close, then open again around the current price.
    Reopen,
}

/// Distribution of liquidity across the range when (re)opening.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LiquidityShape {
    #[default]
    Spot,
    Curve,
    BidAsk,
}

/// Outcome of evaluating a position against a policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Hold,
    Close,
    Reopen,
}

impl Decision {
    /// Whether the decision needs a transaction.
    #[must_use]
    pub fn requires_transaction(&self) -> bool {
        !matches!(self, Decision::Hold)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Hold => write!(f, "hold"),
            Decision::Close => write!(f, "close"),
            Decision::Reopen => write!(f, "close and reopen"),
        }
    }
}

impl FromStr for AutoCheckAction {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "close" | "1" => Ok(Self::Close),
            "reopen" | "2" => Ok(Self::Reopen),
            other => Err(DomainError::UnknownVariant {
                kind: "auto-check action",
                value: other.to_string(),
            }),
        }
    }
}

impl FromStr for LiquidityShape {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "spot" | "1" => Ok(Self::Spot),
            "curve" | "2" => Ok(Self::Curve),
            "bidask" | "3" => Ok(Self::BidAsk),
            other => Err(DomainError::UnknownVariant {
                kind: "liquidity shape",
                value: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_action_and_shape() {
        assert_eq!("reopen".parse::<AutoCheckAction>().unwrap(), AutoCheckAction::Reopen);
        assert_eq!("1".parse::<AutoCheckAction>().unwrap(), AutoCheckAction::Close);
        assert_eq!("bid-ask".parse::<LiquidityShape>().unwrap(), LiquidityShape::BidAsk);
        assert!("sideways".parse::<LiquidityShape>().is_err());
    }

    #[test]
    fn test_decision_requires_transaction() {
        assert!(!Decision::Hold.requires_transaction());
        assert!(Decision::Close.requires_transaction());
        assert!(Decision::Reopen.requires_transaction());
    }
}
