//! Stock series service: the three read operations plus their batch forms.

use crate::loader::SeriesLoader;
use crate::sanitize::latest_valid;
use crate::window::select_window;
use crate::{LatestValidRecord, Period, Series, SeriesError, Symbol};

/// Symbols served by the batch endpoints unless configured otherwise.
pub const DEFAULT_TRACKED_SYMBOLS: [&str; 6] =
    ["688111", "002230", "688777", "688375", "688169", "688120"];

/// Result for one symbol of a batch call.
#[derive(Debug, Clone, PartialEq)]
pub enum SymbolOutcome<T> {
    Ok { code: Symbol, data: T },
    Err { code: Symbol, error: SeriesError },
}

impl<T> SymbolOutcome<T> {
    fn from_result(code: &Symbol, result: Result<T, SeriesError>) -> Self {
        match result {
            Ok(data) => Self::Ok {
                code: code.clone(),
                data,
            },
            Err(error) => Self::Err {
                code: code.clone(),
                error,
            },
        }
    }

    pub fn code(&self) -> &Symbol {
        match self {
            Self::Ok { code, .. } | Self::Err { code, .. } => code,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Ok { data, .. } => Some(data),
            Self::Err { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&SeriesError> {
        match self {
            Self::Ok { .. } => None,
            Self::Err { error, .. } => Some(error),
        }
    }
}

/// Read-only access to per-symbol series. Every call re-reads the file.
#[derive(Debug, Clone)]
pub struct StockService {
    loader: SeriesLoader,
    tracked: Vec<Symbol>,
}

impl StockService {
    pub fn new(loader: SeriesLoader, tracked: Vec<Symbol>) -> Self {
        Self { loader, tracked }
    }

    pub fn loader(&self) -> &SeriesLoader {
        &self.loader
    }

    pub fn tracked(&self) -> &[Symbol] {
        &self.tracked
    }

    pub fn get_latest(&self, symbol: &Symbol) -> Result<LatestValidRecord, SeriesError> {
        latest_valid(self.loader.load(symbol)?)
    }

    /// Full series, oldest first.
    pub fn get_full_series(&self, symbol: &Symbol) -> Result<Series, SeriesError> {
        let mut series = self.loader.load(symbol)?;
        series.sort_ascending();
        Ok(series)
    }

    pub fn get_window(&self, symbol: &Symbol, period: &Period) -> Result<Series, SeriesError> {
        Ok(select_window(self.loader.load(symbol)?, period))
    }

    /// Latest valid record for every tracked symbol. A failing symbol is
    /// reported in place and never aborts the rest of the batch.
    pub fn latest_for_tracked(&self) -> Vec<SymbolOutcome<LatestValidRecord>> {
        self.batch(|symbol| self.get_latest(symbol))
    }

    pub fn full_series_for_tracked(&self) -> Vec<SymbolOutcome<Series>> {
        self.batch(|symbol| self.get_full_series(symbol))
    }

    fn batch<T, F>(&self, mut fetch: F) -> Vec<SymbolOutcome<T>>
    where
        F: FnMut(&Symbol) -> Result<T, SeriesError>,
    {
        self.tracked
            .iter()
            .map(|symbol| {
                let result = fetch(symbol);
                if let Err(error) = &result {
                    tracing::warn!(symbol = %symbol, code = error.code(), %error, "symbol skipped in batch");
                }
                SymbolOutcome::from_result(symbol, result)
            })
            .collect()
    }
}

/// Parsed [`DEFAULT_TRACKED_SYMBOLS`].
pub fn default_tracked_symbols() -> Vec<Symbol> {
    DEFAULT_TRACKED_SYMBOLS
        .iter()
        .filter_map(|code| Symbol::parse(code).ok())
        .collect()
}
