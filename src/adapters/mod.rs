// Adapters layer: concrete implementations for external systems.

pub mod http;

pub use http::{requires_api_key, FreeCurrencyApi, DEFAULT_ENDPOINT};
