//! Numeric coercion and latest-valid-record selection.
//!
//! Upstream files occasionally end with placeholder rows (a suspended
//! trading day, a partially written refresh). Those rows stay in the series,
//! but are never reported as the latest quote.

use crate::{DailyRecord, LatestValidRecord, Series, SeriesError};

/// Fields that must all be present for a record to count as valid.
pub const REQUIRED_FIELDS: [&str; 6] = ["close", "open", "high", "low", "pct_change", "change"];

/// Coerce a raw CSV cell into a finite float.
///
/// Empty cells, parse failures, `NaN` and infinities are all missing.
pub fn coerce_numeric(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    trimmed
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

impl DailyRecord {
    /// Names of required fields that are missing, in [`REQUIRED_FIELDS`] order.
    pub fn missing_required(&self) -> Vec<&'static str> {
        let values = [
            self.close,
            self.open,
            self.high,
            self.low,
            self.pct_change,
            self.change,
        ];

        REQUIRED_FIELDS
            .iter()
            .zip(values)
            .filter(|(_, value)| value.is_none())
            .map(|(name, _)| *name)
            .collect()
    }

    pub fn is_fully_valid(&self) -> bool {
        self.missing_required().is_empty()
    }
}

/// Newest record whose required fields are all present.
pub fn latest_valid(mut series: Series) -> Result<LatestValidRecord, SeriesError> {
    series.sort_descending();

    let Series { symbol, records } = series;
    for record in records {
        if record.is_fully_valid() {
            return Ok(LatestValidRecord::new_unchecked(record));
        }

        tracing::debug!(
            symbol = %symbol,
            trade_date = %record.trade_date,
            missing = ?record.missing_required(),
            "skipping incomplete record"
        );
    }

    Err(SeriesError::NoValidData { symbol })
}
