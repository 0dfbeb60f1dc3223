use crate::domain::model::{Currency, CurrencyCode, RateTable};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Sole external dependency of the rate store.
#[async_trait]
pub trait RateSource: Send + Sync {
    async fn fetch_rates(&self, base: &CurrencyCode) -> Result<RateTable>;
}

/// One-shot list of the currencies the rate source knows about.
#[async_trait]
pub trait CurrencySource: Send + Sync {
    async fn fetch_currencies(&self) -> Result<Vec<Currency>>;
}

pub trait ConfigProvider: Send + Sync {
    fn api_endpoint(&self) -> &str;
    fn api_key(&self) -> Option<&str>;
    fn timeout_seconds(&self) -> u64;
    fn default_base(&self) -> &str;
    fn default_target(&self) -> &str;
}
