//! Candlestick windowing over a full series.

use crate::{Period, Series};

/// Trailing sub-series for `period`, oldest first.
///
/// `Day` keeps every record dated on the newest trade date, which allows for
/// intraday rows even though the current files are daily. Count-based
/// windows return fewer records when the series is shorter. An unrecognized
/// period returns the full series.
pub fn select_window(mut series: Series, period: &Period) -> Series {
    series.sort_ascending();

    match period {
        Period::Day => {
            if let Some(latest) = series.latest_date() {
                series.records.retain(|record| record.trade_date == latest);
            }
        }
        Period::Week | Period::Month | Period::Year => {
            if let Some(limit) = period.record_limit() {
                let skip = series.records.len().saturating_sub(limit);
                series.records.drain(..skip);
            }
        }
        Period::Unrecognized(_) => {}
    }

    series
}
