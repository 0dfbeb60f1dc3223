use crate::utils::error::{FxError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

const FLAG_URL_TEMPLATE: &str =
    "https://wise.com/public-resources/assets/flags/rectangle/{code}.png";

/// Uppercase currency ticker such as `USD`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn new(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty()
            || trimmed.len() > 8
            || !trimmed.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(FxError::InvalidCurrencyCode {
                value: value.to_string(),
            });
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CurrencyCode {
    type Err = FxError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = FxError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

/// Rates quoted against a single base currency.
#[derive(Debug, Clone, PartialEq)]
pub struct RateTable {
    base: CurrencyCode,
    rates: HashMap<CurrencyCode, f64>,
    fetched_at: DateTime<Utc>,
}

impl RateTable {
    /// 所有匯率必須是有限的正數，否則整張表視為無效
    pub fn new(base: CurrencyCode, rates: HashMap<CurrencyCode, f64>) -> Result<Self> {
        if let Some((code, rate)) = rates.iter().find(|(_, r)| !r.is_finite() || **r <= 0.0) {
            return Err(FxError::fetch(format!(
                "rate for {} against {} is not a positive number: {}",
                code, base, rate
            )));
        }

        Ok(Self {
            base,
            rates,
            fetched_at: Utc::now(),
        })
    }

    pub fn base(&self) -> &CurrencyCode {
        &self.base
    }

    pub fn rate(&self, target: &CurrencyCode) -> Option<f64> {
        self.rates.get(target).copied()
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Currency {
    pub code: CurrencyCode,
    pub name: String,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub symbol_native: Option<String>,
    #[serde(default)]
    pub name_plural: Option<String>,
    #[serde(default)]
    pub decimal_digits: Option<u32>,
}

impl Currency {
    pub fn flag_url(&self) -> String {
        FLAG_URL_TEMPLATE.replace("{code}", &self.code.as_str().to_ascii_lowercase())
    }

    pub fn matches(&self, keyword: &str) -> bool {
        self.code.as_str().to_lowercase().contains(keyword)
            || self.name.to_lowercase().contains(keyword)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConversionRequest {
    pub base: CurrencyCode,
    pub target: CurrencyCode,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionResult {
    pub base: CurrencyCode,
    pub target: CurrencyCode,
    pub amount: f64,
    pub rate: f64,
    pub display: String,
}

/// Which side of the pair the currency picker is choosing for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerSlot {
    Base,
    Target,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(s: &str) -> CurrencyCode {
        CurrencyCode::new(s).unwrap()
    }

    #[test]
    fn test_currency_code_normalizes_case() {
        assert_eq!(code(" usd ").as_str(), "USD");
        assert!(CurrencyCode::new("").is_err());
        assert!(CurrencyCode::new("U S").is_err());
    }

    #[test]
    fn test_rate_table_rejects_non_positive_rates() {
        let mut rates = HashMap::new();
        rates.insert(code("EUR"), 0.91);
        rates.insert(code("JPY"), 0.0);
        assert!(matches!(
            RateTable::new(code("USD"), rates),
            Err(FxError::FetchError { .. })
        ));

        let mut rates = HashMap::new();
        rates.insert(code("EUR"), f64::NAN);
        assert!(RateTable::new(code("USD"), rates).is_err());
    }

    #[test]
    fn test_rate_table_lookup() {
        let mut rates = HashMap::new();
        rates.insert(code("EUR"), 0.9123);
        let table = RateTable::new(code("USD"), rates).unwrap();

        assert_eq!(table.rate(&code("EUR")), Some(0.9123));
        assert_eq!(table.rate(&code("GBP")), None);
        assert_eq!(table.base().as_str(), "USD");
    }

    #[test]
    fn test_flag_url_uses_lowercase_code() {
        let currency = Currency {
            code: code("EUR"),
            name: "Euro".to_string(),
            symbol: Some("€".to_string()),
            symbol_native: None,
            name_plural: None,
            decimal_digits: Some(2),
        };
        assert_eq!(
            currency.flag_url(),
            "https://wise.com/public-resources/assets/flags/rectangle/eur.png"
        );
        assert!(currency.matches("eur"));
        assert!(currency.matches("eu"));
        assert!(!currency.matches("dollar"));
    }

    #[test]
    fn test_currency_deserializes_from_api_shape() {
        let json = serde_json::json!({
            "symbol": "$",
            "name": "US Dollar",
            "symbol_native": "$",
            "decimal_digits": 2,
            "rounding": 0,
            "code": "USD",
            "name_plural": "US dollars"
        });
        let currency: Currency = serde_json::from_value(json).unwrap();
        assert_eq!(currency.code.as_str(), "USD");
        assert_eq!(currency.name_plural.as_deref(), Some("US dollars"));
    }
}
