//! Human-readable number formatting for console output.

use rust_decimal::Decimal;

/// Formats large numbers with a K/M/B suffix and two decimals.
///
/// Values at or below one thousand are returned unchanged.
pub fn format_compact(value: Decimal) -> String {
    let thousand = Decimal::from(1_000);
    let million = Decimal::from(1_000_000);
    let billion = Decimal::from(1_000_000_000);

    if value > billion {
        format!("{:.2}B", value / billion)
    } else if value > million {
        format!("{:.2}M", value / million)
    } else if value > thousand {
        format!("{:.2}K", value / thousand)
    } else {
        value.normalize().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_format_compact() {
        assert_eq!(format_compact(dec!(950)), "950");
        assert_eq!(format_compact(dec!(1500)), "1.50K");
        assert_eq!(format_compact(dec!(2345678)), "2.35M");
        assert_eq!(format_compact(dec!(7100000000)), "7.10B");
    }
}
