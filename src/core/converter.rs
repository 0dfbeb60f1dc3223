use crate::core::engine::{parse_amount, swap_pair, ConversionEngine};
use crate::core::{
    ConversionRequest, ConversionResult, Currency, CurrencyCode, CurrencySource, PickerSlot,
    RateSource,
};
use crate::utils::error::{FxError, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

/// Everything the widget needs to remember between user actions.
#[derive(Debug, Clone)]
pub struct AppState {
    pub base: CurrencyCode,
    pub target: CurrencyCode,
    pub open_picker: Option<PickerSlot>,
    pub currencies: Vec<Currency>,
    pub keyword: String,
    pub filtered: Vec<Currency>,
    pub last_target_amount: Option<f64>,
}

impl AppState {
    pub fn new(base: CurrencyCode, target: CurrencyCode) -> Self {
        Self {
            base,
            target,
            open_picker: None,
            currencies: Vec::new(),
            keyword: String::new(),
            filtered: Vec::new(),
            last_target_amount: None,
        }
    }

    /// Loaded currencies minus the selected base and target.
    pub fn available_currencies(&self) -> Vec<Currency> {
        self.currencies
            .iter()
            .filter(|c| c.code != self.base && c.code != self.target)
            .cloned()
            .collect()
    }

    fn refresh_filtered(&mut self) {
        let keyword = self.keyword.trim().to_lowercase();
        self.filtered = self
            .available_currencies()
            .into_iter()
            .filter(|c| c.matches(&keyword))
            .collect();
    }
}

/// Message shown to the user when a conversion cannot be displayed.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusMessage {
    pub message: String,
    pub suggestion: &'static str,
    pub retryable: bool,
}

impl From<&FxError> for StatusMessage {
    fn from(error: &FxError) -> Self {
        Self {
            message: error.user_friendly_message(),
            suggestion: error.recovery_suggestion(),
            retryable: error.is_retryable(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Applied(ConversionResult),
    /// A newer request was issued while this one was waiting on the network.
    Superseded,
    Failed(StatusMessage),
}

/// Coordinates the currency picker, the selected pair and conversions.
///
/// Each conversion takes a ticket from a monotonically increasing counter;
/// when it resolves, only the holder of the latest ticket is applied.
pub struct Converter<R: RateSource, C: CurrencySource> {
    engine: ConversionEngine<R>,
    currency_source: C,
    state: Mutex<AppState>,
    latest_request: AtomicU64,
}

impl<R: RateSource, C: CurrencySource> Converter<R, C> {
    pub fn new(
        engine: ConversionEngine<R>,
        currency_source: C,
        base: CurrencyCode,
        target: CurrencyCode,
    ) -> Self {
        Self {
            engine,
            currency_source,
            state: Mutex::new(AppState::new(base, target)),
            latest_request: AtomicU64::new(0),
        }
    }

    pub async fn state(&self) -> AppState {
        self.state.lock().await.clone()
    }

    /// Fetches the currency list once and resets the picker contents.
    pub async fn load_currencies(&self) -> Result<usize> {
        let mut currencies = self.currency_source.fetch_currencies().await?;
        currencies.sort_by(|a, b| a.code.cmp(&b.code));

        let mut state = self.state.lock().await;
        state.currencies = currencies;
        state.refresh_filtered();
        tracing::info!("✅ Loaded {} currencies", state.currencies.len());
        Ok(state.currencies.len())
    }

    pub async fn available_currencies(&self) -> Vec<Currency> {
        self.state.lock().await.available_currencies()
    }

    pub async fn filter(&self, keyword: &str) -> Vec<Currency> {
        let mut state = self.state.lock().await;
        state.keyword = keyword.to_string();
        state.refresh_filtered();
        state.filtered.clone()
    }

    pub async fn open_picker(&self, slot: PickerSlot) {
        let mut state = self.state.lock().await;
        state.open_picker = Some(slot);
    }

    /// 關閉選單時一併清除搜尋關鍵字
    pub async fn close_picker(&self) {
        let mut state = self.state.lock().await;
        state.open_picker = None;
        state.keyword.clear();
        state.refresh_filtered();
    }

    /// Assigns `code` to the open picker slot and closes the picker.
    pub async fn select(&self, code: &CurrencyCode) -> Result<()> {
        let mut state = self.state.lock().await;
        let slot = state.open_picker.ok_or(FxError::NoPickerOpen)?;

        if !state.currencies.is_empty() && !state.available_currencies().iter().any(|c| &c.code == code)
        {
            return Err(FxError::InvalidCurrencyCode {
                value: code.to_string(),
            });
        }

        match slot {
            PickerSlot::Base => state.base = code.clone(),
            PickerSlot::Target => state.target = code.clone(),
        }
        tracing::debug!(slot = ?slot, code = %code, "Currency selected");

        state.open_picker = None;
        state.keyword.clear();
        state.last_target_amount = None;
        state.refresh_filtered();
        Ok(())
    }

    pub async fn set_pair(&self, base: CurrencyCode, target: CurrencyCode) {
        let mut state = self.state.lock().await;
        state.base = base;
        state.target = target;
        state.last_target_amount = None;
        state.refresh_filtered();
    }

    /// Swaps the selected pair and returns the request the swap implies.
    pub async fn swap(&self) -> ConversionRequest {
        let mut state = self.state.lock().await;
        let request = swap_pair(&state.base, &state.target, state.last_target_amount);
        state.base = request.base.clone();
        state.target = request.target.clone();
        state.refresh_filtered();
        request
    }

    pub async fn swap_and_convert(&self) -> Outcome {
        let request = self.swap().await;
        self.convert_request(request).await
    }

    /// Converts the raw amount for the currently selected pair.
    pub async fn request_conversion(&self, raw_amount: &str) -> Outcome {
        let request = {
            let state = self.state.lock().await;
            ConversionRequest {
                base: state.base.clone(),
                target: state.target.clone(),
                amount: parse_amount(raw_amount),
            }
        };
        self.convert_request(request).await
    }

    pub async fn convert_request(&self, request: ConversionRequest) -> Outcome {
        let ticket = self.latest_request.fetch_add(1, Ordering::SeqCst) + 1;
        let result = self.engine.convert(&request).await;

        if self.latest_request.load(Ordering::SeqCst) != ticket {
            tracing::debug!(
                ticket,
                base = %request.base,
                target = %request.target,
                "Discarding superseded conversion"
            );
            return Outcome::Superseded;
        }

        match result {
            Ok(result) => {
                self.state.lock().await.last_target_amount = Some(result.amount);
                Outcome::Applied(result)
            }
            Err(e) => {
                // 換算失敗後，舊的結果不再代表目前的幣別組合
                self.state.lock().await.last_target_amount = None;
                tracing::warn!(
                    "❌ Conversion {} -> {} failed: {} (Category: {:?})",
                    request.base,
                    request.target,
                    e,
                    e.category()
                );
                Outcome::Failed(StatusMessage::from(&e))
            }
        }
    }
}
