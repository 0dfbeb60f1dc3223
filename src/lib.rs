pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::FreeCurrencyApi;
pub use config::{toml_config::TomlConfig, CliConfig};
pub use core::{
    converter::{Converter, Outcome, StatusMessage},
    engine::ConversionEngine,
    RateStore,
};
pub use utils::error::{FxError, Result};
