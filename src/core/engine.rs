use crate::core::{ConversionRequest, ConversionResult, CurrencyCode, RateSource, RateStore};
use crate::utils::error::{FxError, Result};
use std::sync::Arc;

const FALLBACK_AMOUNT: f64 = 1.0;

/// Parses a user-typed amount. Anything that is not a finite positive number
/// becomes 1.
pub fn parse_amount(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(amount) => sanitize_amount(amount),
        Err(_) => FALLBACK_AMOUNT,
    }
}

fn sanitize_amount(amount: f64) -> f64 {
    if amount.is_finite() && amount > 0.0 {
        amount
    } else {
        FALLBACK_AMOUNT
    }
}

pub fn format_display(base: &CurrencyCode, rate: f64, target: &CurrencyCode) -> String {
    format!("1 {} = {:.4} {}", base, rate, target)
}

/// Exchanges base and target; the previous target amount becomes the new input.
pub fn swap_pair(
    base: &CurrencyCode,
    target: &CurrencyCode,
    last_target_amount: Option<f64>,
) -> ConversionRequest {
    ConversionRequest {
        base: target.clone(),
        target: base.clone(),
        amount: last_target_amount.map_or(FALLBACK_AMOUNT, sanitize_amount),
    }
}

pub struct ConversionEngine<S: RateSource> {
    store: Arc<RateStore<S>>,
}

impl<S: RateSource> Clone for ConversionEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: RateSource> ConversionEngine<S> {
    pub fn new(store: Arc<RateStore<S>>) -> Self {
        Self { store }
    }

    pub async fn convert(&self, request: &ConversionRequest) -> Result<ConversionResult> {
        let table = self.store.get_rates(&request.base).await?;

        let rate = table
            .rate(&request.target)
            .ok_or_else(|| FxError::UnknownCurrencyError {
                base: request.base.to_string(),
                target: request.target.to_string(),
            })?;

        let amount = sanitize_amount(request.amount);
        tracing::debug!(
            base = %request.base,
            target = %request.target,
            amount,
            rate,
            fetched_at = %table.fetched_at(),
            "Converted amount"
        );

        Ok(ConversionResult {
            base: request.base.clone(),
            target: request.target.clone(),
            amount: amount * rate,
            rate,
            display: format_display(&request.base, rate, &request.target),
        })
    }

    /// Convenience for raw input straight from a text field.
    pub async fn convert_raw(
        &self,
        base: &CurrencyCode,
        target: &CurrencyCode,
        raw_amount: &str,
    ) -> Result<ConversionResult> {
        let request = ConversionRequest {
            base: base.clone(),
            target: target.clone(),
            amount: parse_amount(raw_amount),
        };
        self.convert(&request).await
    }
}
