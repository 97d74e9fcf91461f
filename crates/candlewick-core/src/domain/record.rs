use serde::{Deserialize, Serialize};

use crate::{Symbol, TradeDate};

/// One trading day for one symbol.
///
/// Every numeric field is `None` when the source cell was empty, non-finite
/// or not a number; `Some` only ever holds a finite value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    #[serde(rename = "ts_code")]
    pub symbol: Symbol,
    pub trade_date: TradeDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub change: Option<f64>,
    pub pct_change: Option<f64>,
    #[serde(rename = "vol")]
    pub volume: Option<f64>,
    pub amount: Option<f64>,
    /// `None` when the file has no amplitude column, `Some(None)` when the
    /// column exists but the cell is missing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amplitude: Option<Option<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turnover_rate: Option<Option<f64>>,
}

impl DailyRecord {
    /// Record with every numeric field missing.
    pub fn empty(symbol: Symbol, trade_date: TradeDate) -> Self {
        Self {
            symbol,
            trade_date,
            open: None,
            high: None,
            low: None,
            close: None,
            change: None,
            pct_change: None,
            volume: None,
            amount: None,
            amplitude: None,
            turnover_rate: None,
        }
    }
}

/// Records of one symbol. Built fresh from the backing file on every read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub symbol: Symbol,
    pub records: Vec<DailyRecord>,
}

impl Series {
    pub fn new(symbol: Symbol, records: Vec<DailyRecord>) -> Self {
        Self { symbol, records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Stable sort, oldest first.
    pub fn sort_ascending(&mut self) {
        self.records.sort_by_key(|record| record.trade_date);
    }

    /// Stable sort, newest first.
    pub fn sort_descending(&mut self) {
        self.records
            .sort_by(|left, right| right.trade_date.cmp(&left.trade_date));
    }

    pub fn latest_date(&self) -> Option<TradeDate> {
        self.records.iter().map(|record| record.trade_date).max()
    }

    pub fn is_ascending(&self) -> bool {
        self.records
            .windows(2)
            .all(|pair| pair[0].trade_date <= pair[1].trade_date)
    }
}

/// Most recent record whose required price fields are all present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LatestValidRecord(DailyRecord);

impl LatestValidRecord {
    /// Only the sanitizer hands these out, after checking validity.
    pub(crate) fn new_unchecked(record: DailyRecord) -> Self {
        Self(record)
    }

    pub fn record(&self) -> &DailyRecord {
        &self.0
    }
}
