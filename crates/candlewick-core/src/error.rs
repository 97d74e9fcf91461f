use thiserror::Error;

use crate::Symbol;

/// Validation errors for domain-type construction in `candlewick-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },

    #[error("trade date must be 8 digits in YYYYMMDD form: '{value}'")]
    InvalidTradeDate { value: String },

    #[error("timestamp must be RFC3339 or ISO 8601: '{value}'")]
    InvalidTimestamp { value: String },

    #[error("request_id must be at least 8 characters")]
    InvalidRequestId,
    #[error("error code cannot be empty")]
    EmptyErrorCode,
    #[error("error message cannot be empty")]
    EmptyErrorMessage,
}

/// Per-symbol failures of the series pipeline.
///
/// Every variant is recoverable at symbol granularity: batch callers record
/// the failure next to the symbol and keep going.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SeriesError {
    #[error("no data file for symbol {symbol}")]
    NotFound { symbol: Symbol },

    #[error("malformed data for symbol {symbol}: {reason}")]
    MalformedData { symbol: Symbol, reason: String },

    #[error("symbol {symbol} has no record with complete price fields")]
    NoValidData { symbol: Symbol },
}

impl SeriesError {
    pub fn malformed(symbol: &Symbol, reason: impl Into<String>) -> Self {
        Self::MalformedData {
            symbol: symbol.clone(),
            reason: reason.into(),
        }
    }

    pub fn symbol(&self) -> &Symbol {
        match self {
            Self::NotFound { symbol }
            | Self::MalformedData { symbol, .. }
            | Self::NoValidData { symbol } => symbol,
        }
    }

    pub const fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::MalformedData { .. } => "malformed_data",
            Self::NoValidData { .. } => "no_valid_data",
        }
    }

    /// Malformed data is usually a file caught mid-overwrite by the refresh
    /// process; the other failures do not go away on their own.
    pub const fn retryable(&self) -> bool {
        matches!(self, Self::MalformedData { .. })
    }
}
