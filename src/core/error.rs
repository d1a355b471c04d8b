//! Error types for quoting a conversion.

use thiserror::Error;

/// Pipeline stage whose residual balance would turn negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeStage {
    Bank,
    Platform,
    Spread,
}

impl std::fmt::Display for FeeStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FeeStage::Bank => "bank fee",
            FeeStage::Platform => "platform fee",
            FeeStage::Spread => "spread",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while building or computing a quote.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    /// Amount is zero, negative, non-numeric or too large to compute with.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// A fee fraction is outside `[0, 1)` or a configured bound is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Rate is missing, non-positive, stale, or could not be fetched.
    #[error("Rate unavailable for {currency}: {reason}")]
    RateUnavailable { currency: String, reason: String },

    /// A fee stage would leave a negative balance.
    #[error("Fee exceeds amount at {stage} stage")]
    FeeExceedsAmount { stage: FeeStage },

    /// Currency code is empty or malformed.
    #[error("Invalid currency code: {0:?}")]
    InvalidCurrency(String),
}

impl ConversionError {
    pub fn rate_unavailable(currency: impl Into<String>, reason: impl Into<String>) -> Self {
        ConversionError::RateUnavailable {
            currency: currency.into(),
            reason: reason.into(),
        }
    }

    /// Short, stable name of the failure kind for display.
    pub fn kind(&self) -> &'static str {
        match self {
            ConversionError::InvalidAmount(_) => "InvalidAmount",
            ConversionError::InvalidConfiguration(_) => "InvalidConfiguration",
            ConversionError::RateUnavailable { .. } => "RateUnavailable",
            ConversionError::FeeExceedsAmount { .. } => "FeeExceedsAmount",
            ConversionError::InvalidCurrency(_) => "InvalidCurrency",
        }
    }
}

/// Result type for quoting operations.
pub type QuoteResult<T> = Result<T, ConversionError>;
