pub mod converter;
pub mod engine;
pub mod rate_store;

pub use crate::domain::model::{
    ConversionRequest, ConversionResult, Currency, CurrencyCode, PickerSlot, RateTable,
};
pub use crate::domain::ports::{ConfigProvider, CurrencySource, RateSource};
pub use crate::utils::error::Result;
pub use rate_store::RateStore;
