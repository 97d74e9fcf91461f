//! CSV time-series loader.
//!
//! Files are produced out-of-band by the data-fetch script, one per symbol
//! at `<data_dir>/<symbol>.csv`. Columns are located by header name so the
//! producer may reorder them or append extra ones.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord};

use crate::sanitize::coerce_numeric;
use crate::{DailyRecord, Series, SeriesError, Symbol, TradeDate};

const TRADE_DATE: &[&str] = &["trade_date"];
const SYMBOL: &[&str] = &["ts_code", "symbol"];
const OPEN: &[&str] = &["open"];
const HIGH: &[&str] = &["high"];
const LOW: &[&str] = &["low"];
const CLOSE: &[&str] = &["close"];
const CHANGE: &[&str] = &["change"];
const PCT_CHANGE: &[&str] = &["pct_change", "pct_chg"];
const VOLUME: &[&str] = &["vol", "volume"];
const AMOUNT: &[&str] = &["amount"];
const AMPLITUDE: &[&str] = &["amplitude"];
const TURNOVER: &[&str] = &["exchange_rate", "turnover_rate", "turnover"];

/// Reads per-symbol CSV files from a data directory.
#[derive(Debug, Clone)]
pub struct SeriesLoader {
    data_dir: PathBuf,
}

impl SeriesLoader {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn path_for(&self, symbol: &Symbol) -> PathBuf {
        self.data_dir.join(format!("{symbol}.csv"))
    }

    /// Parse every row of the symbol's file, in file order.
    ///
    /// Any structural problem fails the whole load with `MalformedData`;
    /// callers may retry since the file can be mid-overwrite.
    pub fn load(&self, symbol: &Symbol) -> Result<Series, SeriesError> {
        let path = self.path_for(symbol);
        let file = File::open(&path).map_err(|error| match error.kind() {
            ErrorKind::NotFound => SeriesError::NotFound {
                symbol: symbol.clone(),
            },
            _ => SeriesError::malformed(symbol, format!("cannot open {}: {error}", path.display())),
        })?;

        tracing::debug!(symbol = %symbol, path = %path.display(), "loading series");

        let mut reader = ReaderBuilder::new().has_headers(true).from_reader(file);
        let headers = reader
            .headers()
            .map_err(|error| SeriesError::malformed(symbol, format!("unreadable header: {error}")))?
            .clone();
        let columns = Columns::resolve(&headers).map_err(|reason| SeriesError::malformed(symbol, reason))?;

        let mut records = Vec::new();
        let mut seen = HashSet::new();
        let mut duplicates = 0usize;

        for (index, row) in reader.records().enumerate() {
            // Header is line 1.
            let line = index + 2;
            let row = row.map_err(|error| SeriesError::malformed(symbol, format!("line {line}: {error}")))?;
            let record = columns
                .parse_row(&row, symbol)
                .map_err(|reason| SeriesError::malformed(symbol, format!("line {line}: {reason}")))?;

            if !seen.insert(record.trade_date) {
                duplicates += 1;
            }
            records.push(record);
        }

        if duplicates > 0 {
            tracing::warn!(symbol = %symbol, duplicates, "series contains repeated trade dates");
        }

        Ok(Series::new(symbol.clone(), records))
    }

    /// Symbols with a backing file, sorted. Stems that are not valid symbols
    /// are skipped.
    pub fn list_symbols(&self) -> Result<Vec<Symbol>, std::io::Error> {
        let mut symbols = Vec::new();
        for entry in fs::read_dir(&self.data_dir)? {
            let path = entry?.path();
            let is_csv = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
            if !is_csv || !path.is_file() {
                continue;
            }

            if let Some(symbol) = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| Symbol::parse(stem).ok())
            {
                symbols.push(symbol);
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}

/// Column positions resolved from the header row.
#[derive(Debug, Clone, Copy)]
struct Columns {
    trade_date: usize,
    symbol: Option<usize>,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    change: usize,
    pct_change: usize,
    volume: Option<usize>,
    amount: Option<usize>,
    amplitude: Option<usize>,
    turnover: Option<usize>,
}

impl Columns {
    fn resolve(headers: &StringRecord) -> Result<Self, String> {
        Ok(Self {
            trade_date: require_column(headers, TRADE_DATE)?,
            symbol: find_column(headers, SYMBOL),
            open: require_column(headers, OPEN)?,
            high: require_column(headers, HIGH)?,
            low: require_column(headers, LOW)?,
            close: require_column(headers, CLOSE)?,
            change: require_column(headers, CHANGE)?,
            pct_change: require_column(headers, PCT_CHANGE)?,
            volume: find_column(headers, VOLUME),
            amount: find_column(headers, AMOUNT),
            amplitude: find_column(headers, AMPLITUDE),
            turnover: find_column(headers, TURNOVER),
        })
    }

    fn parse_row(&self, row: &StringRecord, requested: &Symbol) -> Result<DailyRecord, String> {
        let raw_date = row.get(self.trade_date).unwrap_or_default();
        let trade_date = TradeDate::parse(raw_date).map_err(|error| error.to_string())?;

        // Blank or unusable codes fall back to the symbol the file is named for.
        let symbol = self
            .symbol
            .and_then(|index| row.get(index))
            .and_then(|raw| Symbol::parse(raw).ok())
            .unwrap_or_else(|| requested.clone());

        let cell = |index: usize| row.get(index).and_then(coerce_numeric);
        let numeric = |column: Option<usize>| column.and_then(cell);
        let optional = |column: Option<usize>| column.map(cell);

        Ok(DailyRecord {
            symbol,
            trade_date,
            open: cell(self.open),
            high: cell(self.high),
            low: cell(self.low),
            close: cell(self.close),
            change: cell(self.change),
            pct_change: cell(self.pct_change),
            volume: numeric(self.volume),
            amount: numeric(self.amount),
            amplitude: optional(self.amplitude),
            turnover_rate: optional(self.turnover),
        })
    }
}

fn require_column(headers: &StringRecord, names: &[&str]) -> Result<usize, String> {
    find_column(headers, names).ok_or_else(|| format!("missing required column {}", names.join(" or ")))
}

fn find_column(headers: &StringRecord, names: &[&str]) -> Option<usize> {
    headers.iter().position(|header| {
        let header = header.trim().trim_start_matches('\u{feff}');
        names.iter().any(|name| header.eq_ignore_ascii_case(name))
    })
}
