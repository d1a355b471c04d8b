//! Core business logic abstractions

pub mod cache;
pub mod config;
pub mod conversion;
pub mod currency;
pub mod error;
pub mod fees;
pub mod log;
pub mod quote;
pub mod rate;

// Re-export main types for cleaner imports
pub use conversion::{ConversionRequest, ConversionResult, ConversionSteps, Converter};
pub use currency::Currency;
pub use error::{ConversionError, QuoteResult};
pub use fees::FeePolicy;
pub use quote::QuoteService;
pub use rate::{Rate, RateProvider};
