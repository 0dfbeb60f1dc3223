use crate::core::{ConfigProvider, Currency, CurrencyCode, CurrencySource, RateSource, RateTable};
use crate::utils::error::{FxError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://api.freecurrencyapi.com/v1";
const HOSTED_API_HOST: &str = "api.freecurrencyapi.com";

/// The hosted freecurrencyapi service rejects requests without an `apikey`.
pub fn requires_api_key(endpoint: &str) -> bool {
    url::Url::parse(endpoint)
        .ok()
        .and_then(|url| url.host_str().map(|host| host.eq_ignore_ascii_case(HOSTED_API_HOST)))
        .unwrap_or(false)
}

/// freecurrencyapi.com 的回應都包在 `data` 欄位裡
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

/// HTTP client for freecurrencyapi-compatible endpoints.
#[derive(Debug, Clone)]
pub struct FreeCurrencyApi {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl FreeCurrencyApi {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            api_key,
        }
    }

    pub fn from_config<C: ConfigProvider + ?Sized>(config: &C) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds()))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.api_endpoint().to_string(),
            api_key: config.api_key().map(str::to_string),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint.trim_end_matches('/'), path)
    }

    async fn get_data<T: DeserializeOwned>(&self, path: &str, params: &[(&str, &str)]) -> Result<T> {
        let url = self.url(path);
        let mut request = self.client.get(&url);

        if let Some(key) = &self.api_key {
            request = request.query(&[("apikey", key.as_str())]);
        }
        if !params.is_empty() {
            request = request.query(params);
        }

        tracing::debug!("Making API request to: {}", url);
        let response = request.send().await?;
        let status = response.status();
        tracing::debug!("API response status: {}", status);

        if !status.is_success() {
            return Err(FxError::fetch(format!("HTTP error! status: {}", status)));
        }

        let body = response.text().await?;
        let envelope: Envelope<T> = serde_json::from_str(&body)
            .map_err(|e| FxError::fetch(format!("Malformed response from {}: {}", path, e)))?;
        Ok(envelope.data)
    }
}

#[async_trait]
impl RateSource for FreeCurrencyApi {
    async fn fetch_rates(&self, base: &CurrencyCode) -> Result<RateTable> {
        let raw: HashMap<String, f64> = self
            .get_data("latest", &[("base_currency", base.as_str())])
            .await?;

        let mut rates = HashMap::with_capacity(raw.len());
        for (code, rate) in raw {
            let code = CurrencyCode::new(&code)
                .map_err(|_| FxError::fetch(format!("Unexpected currency code in rates: '{}'", code)))?;
            rates.insert(code, rate);
        }

        RateTable::new(base.clone(), rates)
    }
}

#[async_trait]
impl CurrencySource for FreeCurrencyApi {
    async fn fetch_currencies(&self) -> Result<Vec<Currency>> {
        let raw: HashMap<String, Currency> = self.get_data("currencies", &[]).await?;
        Ok(raw.into_values().collect())
    }
}
