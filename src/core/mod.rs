//! Core business logic: rates, conversion and history

pub mod config;
pub mod convert;
pub mod currency;
pub mod error;
pub mod history;
pub mod log;
pub mod rate;

// Re-export main types for cleaner imports
pub use convert::{ConversionRequest, ConversionResult, convert};
pub use currency::{CurrencyCode, RateTable};
pub use error::{ConversionError, RateError};
pub use rate::{RateProvider, RateRecord, RateSeries};
