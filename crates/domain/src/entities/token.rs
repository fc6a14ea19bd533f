use crate::value_objects::Price;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Market snapshot for a token as reported by a price/pool lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub symbol: String,
    pub address: String,
    pub price_native: Price,
    pub price_usd: Price,
    pub market_cap: Decimal,
}

impl TokenInfo {
    /// Sentinel returned when a lookup fails: symbol `"Unknown"`, all numbers zero.
    pub fn unknown(address: impl Into<String>) -> Self {
        Self {
            symbol: "Unknown".to_string(),
            address: address.into(),
            price_native: Price::default(),
            price_usd: Price::default(),
            market_cap: Decimal::ZERO,
        }
    }

    #[must_use]
    pub fn is_unknown(&self) -> bool {
        self.symbol == "Unknown" && self.price_native.is_zero() && self.price_usd.is_zero()
    }
}

/// One SPL token account held by a wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBalance {
    /// Token account address.
    pub account: String,
    /// Mint address.
    pub mint: String,
    /// Raw amount in base units.
    pub amount: u64,
    /// Mint decimals.
    pub decimals: u8,
}

impl TokenBalance {
    /// Amount in whole token units.
    #[must_use]
    pub fn ui_amount(&self) -> Decimal {
        Decimal::from_i128_with_scale(i128::from(self.amount), u32::from(self.decimals))
    }

    /// Whether the balance is strictly greater than `whole_units` tokens.
    ///
    /// Compared in base units, so `5` is not above a threshold of `5` while
    /// `5.000001` is.
    #[must_use]
    pub fn exceeds_whole_units(&self, whole_units: u64) -> bool {
        let scale = 10u128.checked_pow(u32::from(self.decimals));
        match scale {
            Some(scale) => u128::from(self.amount) > u128::from(whole_units) * scale,
            // More decimals than u128 can scale: nothing held can exceed a whole unit.
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn balance(amount: u64, decimals: u8) -> TokenBalance {
        TokenBalance {
            account: "acc".to_string(),
            mint: "mint".to_string(),
            amount,
            decimals,
        }
    }

    #[test]
    fn test_dust_threshold_boundary() {
        assert!(!balance(5_000_000, 6).exceeds_whole_units(5));
        assert!(balance(5_000_001, 6).exceeds_whole_units(5));
        assert!(!balance(4_999_999, 6).exceeds_whole_units(5));
        assert!(!balance(5, 0).exceeds_whole_units(5));
        assert!(balance(6, 0).exceeds_whole_units(5));
    }

    #[test]
    fn test_ui_amount() {
        assert_eq!(balance(5_000_001, 6).ui_amount(), dec!(5.000001));
        assert_eq!(balance(42, 0).ui_amount(), dec!(42));
    }

    #[test]
    fn test_unknown_sentinel() {
        let info = TokenInfo::unknown("So11111111111111111111111111111111111111112");
        assert!(info.is_unknown());
        assert_eq!(info.market_cap, Decimal::ZERO);
    }
}
