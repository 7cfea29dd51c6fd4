//! Decimal ether to wei conversion.
//!
//! The UI speaks decimal ether; the endpoint speaks wei (1 ether = 10^18
//! wei). Conversion is checked: malformed input, more than 18 fractional
//! digits, and overflow are all rejected rather than rounded.

use thiserror::Error;

use crate::types::Wei;

/// Number of wei in one ether.
pub const WEI_PER_ETHER: u128 = 1_000_000_000_000_000_000;

const DECIMALS: usize = 18;

/// Unit conversion error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitsError {
    #[error("Empty amount")]
    Empty,
    #[error("Malformed decimal amount: {0}")]
    Malformed(String),
    #[error("More than {DECIMALS} fractional digits: {0}")]
    TooPrecise(String),
    #[error("Amount out of range: {0}")]
    Overflow(String),
}

/// Parse a decimal ether string into wei.
///
/// Accepts `"1"`, `"0.5"`, `".25"`, `"1."`. Signs, exponents, and
/// thousands separators are not accepted.
///
/// # Errors
/// Returns error on empty, malformed, over-precise, or overflowing input.
pub fn parse_ether(amount: &str) -> Result<Wei, UnitsError> {
    let amount = amount.trim();
    if amount.is_empty() {
        return Err(UnitsError::Empty);
    }

    let (int_part, frac_part) = match amount.split_once('.') {
        Some((i, f)) => (i, f),
        None => (amount, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(UnitsError::Malformed(amount.to_string()));
    }
    if !int_part.chars().all(|c| c.is_ascii_digit())
        || !frac_part.chars().all(|c| c.is_ascii_digit())
    {
        return Err(UnitsError::Malformed(amount.to_string()));
    }
    if frac_part.len() > DECIMALS {
        return Err(UnitsError::TooPrecise(amount.to_string()));
    }

    let overflow = || UnitsError::Overflow(amount.to_string());

    let int_wei = if int_part.is_empty() {
        0
    } else {
        int_part
            .parse::<u128>()
            .map_err(|_| overflow())?
            .checked_mul(WEI_PER_ETHER)
            .ok_or_else(overflow)?
    };

    let frac_wei = if frac_part.is_empty() {
        0
    } else {
        let scale = 10u128.pow((DECIMALS - frac_part.len()) as u32);
        // Fits: at most 18 digits.
        frac_part.parse::<u128>().map_err(|_| overflow())? * scale
    };

    int_wei.checked_add(frac_wei).map(Wei).ok_or_else(overflow)
}

/// Format a wei quantity as a decimal ether string.
///
/// Trailing fractional zeros are trimmed; whole amounts render with no
/// decimal point (`"1"`, `"0.5"`, `"0"`).
#[must_use]
pub fn format_ether(value: Wei) -> String {
    let whole = value.0 / WEI_PER_ETHER;
    let frac = value.0 % WEI_PER_ETHER;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{frac:018}");
    format!("{whole}.{}", frac.trim_end_matches('0'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_whole_and_fractional() {
        assert_eq!(parse_ether("1").unwrap(), Wei(WEI_PER_ETHER));
        assert_eq!(parse_ether("0.5").unwrap(), Wei(WEI_PER_ETHER / 2));
        assert_eq!(parse_ether(".25").unwrap(), Wei(WEI_PER_ETHER / 4));
        assert_eq!(parse_ether("2.").unwrap(), Wei(2 * WEI_PER_ETHER));
        assert_eq!(parse_ether("0").unwrap(), Wei::ZERO);
        assert_eq!(
            parse_ether("0.000000000000000001").unwrap(),
            Wei(1),
        );
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(parse_ether(""), Err(UnitsError::Empty));
        assert_eq!(parse_ether("   "), Err(UnitsError::Empty));
        assert!(matches!(parse_ether("."), Err(UnitsError::Malformed(_))));
        assert!(matches!(parse_ether("1.2.3"), Err(UnitsError::Malformed(_))));
        assert!(matches!(parse_ether("-1"), Err(UnitsError::Malformed(_))));
        assert!(matches!(parse_ether("1e18"), Err(UnitsError::Malformed(_))));
        assert!(matches!(
            parse_ether("0.0000000000000000001"),
            Err(UnitsError::TooPrecise(_))
        ));
    }

    #[test]
    fn rejects_overflow() {
        // u128::MAX wei is ~3.4e20 ether.
        assert!(matches!(
            parse_ether("999999999999999999999999"),
            Err(UnitsError::Overflow(_))
        ));
    }

    #[test]
    fn formats_ether() {
        assert_eq!(format_ether(Wei::ZERO), "0");
        assert_eq!(format_ether(Wei(WEI_PER_ETHER)), "1");
        assert_eq!(format_ether(Wei(WEI_PER_ETHER / 2)), "0.5");
        assert_eq!(format_ether(Wei(1)), "0.000000000000000001");
        assert_eq!(format_ether(Wei(WEI_PER_ETHER * 3 / 2)), "1.5");
    }

    #[test]
    fn roundtrip() {
        for s in ["1", "0.5", "12.345", "0.000000000000000042"] {
            assert_eq!(format_ether(parse_ether(s).unwrap()), s);
        }
    }
}
