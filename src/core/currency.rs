//! Currency conversion abstractions

use crate::core::error::ValuationError;
use async_trait::async_trait;
use rust_decimal::Decimal;

/// Currencies offered to users when entering holdings: (code, name, symbol).
pub const SUPPORTED_CURRENCIES: [(&str, &str, &str); 7] = [
    ("USD", "US Dollar", "$"),
    ("EUR", "Euro", "€"),
    ("GBP", "British Pound", "£"),
    ("JPY", "Japanese Yen", "¥"),
    ("CAD", "Canadian Dollar", "C$"),
    ("AUD", "Australian Dollar", "A$"),
    ("CNY", "Chinese Yuan", "¥"),
];

/// Exchange rate lookup used by the valuation engine.
///
/// Implementations must return exactly `1` when `from == to` without any
/// cache lookup or external call.
#[async_trait]
pub trait FxProvider: Send + Sync {
    async fn get_rate(&self, from: &str, to: &str) -> Result<Decimal, ValuationError>;
}

/// Raw external FX source, one call per currency pair.
#[async_trait]
pub trait FxSource: Send + Sync {
    fn name(&self) -> &str;

    async fn exchange_rate(&self, from: &str, to: &str) -> Result<Decimal, ValuationError>;
}

/// Accepts only three uppercase ASCII letters.
pub fn validate_currency_code(code: &str) -> Result<(), ValuationError> {
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_uppercase()) {
        Ok(())
    } else {
        Err(ValuationError::Validation(format!(
            "Invalid ISO 4217 currency code: {code:?}"
        )))
    }
}

/// Trims and uppercases user input, then validates it.
pub fn normalize_currency_code(code: &str) -> Result<String, ValuationError> {
    let normalized = code.trim().to_uppercase();
    validate_currency_code(&normalized)?;
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_currency_code() {
        assert!(validate_currency_code("USD").is_ok());
        assert!(validate_currency_code("usd").is_err());
        assert!(validate_currency_code("US").is_err());
        assert!(validate_currency_code("US1").is_err());
        assert!(validate_currency_code("").is_err());
    }

    #[test]
    fn test_normalize_currency_code() {
        assert_eq!(normalize_currency_code(" cny ").unwrap(), "CNY");
        assert!(normalize_currency_code("dollars").is_err());
    }
}
