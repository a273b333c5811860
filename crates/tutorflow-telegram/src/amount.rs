//! Validation of typed payment amounts.

use thiserror::Error;

/// Why a typed amount was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("no amount given")]
    Empty,

    #[error("'{0}' is not a number")]
    NotANumber(String),

    #[error("amount cannot be negative")]
    Negative,
}

/// Parse an operator-typed amount such as `40`, `35.50` or `35,50`.
pub fn parse_amount(input: &str) -> Result<f64, AmountError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AmountError::Empty);
    }

    let normalized = trimmed.replace(',', ".");
    let value: f64 = normalized
        .parse()
        .map_err(|_| AmountError::NotANumber(trimmed.to_string()))?;

    // f64 parsing also accepts "NaN" and "inf".
    if !value.is_finite() {
        return Err(AmountError::NotANumber(trimmed.to_string()));
    }
    // Also catches "-0", which compares equal to zero.
    if value.is_sign_negative() {
        return Err(AmountError::Negative);
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_separators() {
        assert_eq!(parse_amount("35.50"), Ok(35.5));
        assert_eq!(parse_amount("35,50"), Ok(35.5));
        assert_eq!(parse_amount(" 40 "), Ok(40.0));
        assert_eq!(parse_amount("0"), Ok(0.0));
    }

    #[test]
    fn test_rejects_text() {
        assert_eq!(parse_amount("abc"), Err(AmountError::NotANumber("abc".into())));
        assert_eq!(parse_amount("forty"), Err(AmountError::NotANumber("forty".into())));
        assert_eq!(parse_amount("1,2,3"), Err(AmountError::NotANumber("1,2,3".into())));
        assert!(parse_amount("NaN").is_err());
        assert!(parse_amount("inf").is_err());
    }

    #[test]
    fn test_rejects_empty_and_negative() {
        assert_eq!(parse_amount(""), Err(AmountError::Empty));
        assert_eq!(parse_amount("   "), Err(AmountError::Empty));
        assert_eq!(parse_amount("-5"), Err(AmountError::Negative));
        assert_eq!(parse_amount("-0"), Err(AmountError::Negative));
        assert_eq!(parse_amount("-0,00"), Err(AmountError::Negative));
    }
}
