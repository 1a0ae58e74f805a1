//! Unit conversions between USD, native units, and token amounts
//!
//! All arithmetic is exact `Decimal` math. Conversions into native units
//! truncate toward zero, matching on-chain integer semantics.

use crate::error::{AnalysisError, Result};
use rust_decimal::prelude::*;
use rust_decimal::Decimal;

/// 10^decimals as a Decimal
///
/// Errors when the scale factor exceeds the supported mantissa range
/// (anything a real SPL mint uses is far below it).
fn pow10(decimals: u32) -> Result<Decimal> {
    let factor = 10u128
        .checked_pow(decimals)
        .and_then(Decimal::from_u128)
        .ok_or_else(|| AnalysisError::Overflow(format!("10^{decimals} exceeds supported range")))?;
    Ok(factor)
}

/// Convert a USD notional to native token units
///
/// `$10M` of a `$200` token with 9 decimals = 50,000 tokens
/// = 50,000,000,000,000 native units. The fractional remainder is
/// truncated, never rounded up.
pub fn usd_to_native(amount_usd: Decimal, price_usd: Decimal, decimals: u32) -> Result<u128> {
    if price_usd <= Decimal::ZERO {
        return Err(AnalysisError::InvalidPrice(price_usd));
    }

    let tokens = amount_usd
        .checked_div(price_usd)
        .ok_or_else(|| AnalysisError::Overflow(format!("{amount_usd} / {price_usd}")))?;

    let native = tokens
        .checked_mul(pow10(decimals)?)
        .ok_or_else(|| AnalysisError::Overflow(format!("{tokens} * 10^{decimals}")))?;

    native
        .trunc()
        .to_u128()
        .ok_or_else(|| AnalysisError::Overflow(format!("{native} does not fit in native units")))
}

/// Convert native token units back to USD at the given price
pub fn native_to_usd(amount_native: u128, price_usd: Decimal, decimals: u32) -> Result<Decimal> {
    let tokens = native_to_tokens(amount_native, decimals)?;
    tokens
        .checked_mul(price_usd)
        .ok_or_else(|| AnalysisError::Overflow(format!("{tokens} * {price_usd}")))
}

/// Convert native token units to a whole-token amount
pub fn native_to_tokens(amount_native: u128, decimals: u32) -> Result<Decimal> {
    let native = Decimal::from_u128(amount_native)
        .ok_or_else(|| AnalysisError::Overflow(format!("{amount_native} native units")))?;
    native
        .checked_div(pow10(decimals)?)
        .ok_or_else(|| AnalysisError::Overflow(format!("{amount_native} / 10^{decimals}")))
}

/// Realized price per token for a swap, zero when undefined
pub fn effective_price(output_usd: Decimal, swap_size_tokens: Decimal) -> Decimal {
    if swap_size_tokens <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    output_usd
        .checked_div(swap_size_tokens)
        .unwrap_or(Decimal::ZERO)
}

/// Format a USD amount for display: `$1.00M`, `$50.00K`, `$12.34`
pub fn format_usd(amount: Decimal) -> String {
    if amount >= Decimal::from(1_000_000) {
        format!("${:.2}M", amount / Decimal::from(1_000_000))
    } else if amount >= Decimal::from(1_000) {
        format!("${:.2}K", amount / Decimal::from(1_000))
    } else {
        format!("${amount:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_usd_to_native_exact() {
        // $10M of a $200 token with 9 decimals -> 50,000 tokens in lamport-like units
        let native = usd_to_native(dec!(10_000_000), dec!(200), 9).unwrap();
        assert_eq!(native, 50_000_000_000_000);
    }

    #[test]
    fn test_usd_to_native_truncates_toward_zero() {
        // $100 at $3 with 6 decimals: 33.333... tokens -> 33333333 units, never rounded up
        let native = usd_to_native(dec!(100), dec!(3), 6).unwrap();
        assert_eq!(native, 33_333_333);
    }

    #[test]
    fn test_usd_to_native_rejects_zero_price() {
        let err = usd_to_native(dec!(1_000_000), Decimal::ZERO, 9).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidPrice(_)));
    }

    #[test]
    fn test_usd_to_native_rejects_negative_price() {
        let err = usd_to_native(dec!(1_000_000), dec!(-5), 9).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidPrice(_)));
    }

    #[test]
    fn test_round_trip_within_one_native_unit() {
        // A repeating-decimal price exercises the truncation bound at every scale
        let amount = dec!(1_000_000);
        let price = dec!(3);

        for decimals in 0..=18u32 {
            let native = usd_to_native(amount, price, decimals).unwrap();
            let back = native_to_usd(native, price, decimals).unwrap();

            let tolerance = price / pow10(decimals).unwrap();
            assert!(
                (amount - back).abs() <= tolerance,
                "decimals {}: {} -> {} -> {} (tolerance {})",
                decimals,
                amount,
                native,
                back,
                tolerance
            );
            assert!(back <= amount, "truncation must never overshoot");
        }
    }

    #[test]
    fn test_native_to_tokens() {
        assert_eq!(native_to_tokens(5_000_000_000_000, 9).unwrap(), dec!(5000));
        assert_eq!(native_to_tokens(1_500_000, 6).unwrap(), dec!(1.5));
        assert_eq!(native_to_tokens(0, 9).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_native_to_usd() {
        // 995,000,000,000 USDC units at $1 with 6 decimals = $995,000
        let usd = native_to_usd(995_000_000_000, dec!(1), 6).unwrap();
        assert_eq!(usd, dec!(995_000));
    }

    #[test]
    fn test_effective_price() {
        assert_eq!(effective_price(dec!(995_000), dec!(5000)), dec!(199));
        assert_eq!(effective_price(dec!(995_000), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(effective_price(Decimal::ZERO, dec!(5000)), Decimal::ZERO);
    }

    #[test]
    fn test_pow10_out_of_range() {
        assert!(pow10(9).is_ok());
        assert!(pow10(28).is_ok());
        assert!(matches!(pow10(40), Err(AnalysisError::Overflow(_))));
    }

    #[test]
    fn test_format_usd() {
        assert_eq!(format_usd(dec!(1_000_000)), "$1.00M");
        assert_eq!(format_usd(dec!(50_000_000)), "$50.00M");
        assert_eq!(format_usd(dec!(5_000)), "$5.00K");
        assert_eq!(format_usd(dec!(1_000)), "$1.00K");
        assert_eq!(format_usd(dec!(12.34)), "$12.34");
        assert_eq!(format_usd(dec!(0.5)), "$0.50");
    }
}
