//! # Domain Models
//!
//! Types shared by the loader, sanitizer and window selector.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Symbol`] | Validated stock code, safe to use as a file stem |
//! | [`TradeDate`] | Calendar date encoded as `YYYYMMDD` |
//! | [`DailyRecord`] | One trading day with nullable numeric fields |
//! | [`Series`] | All records of one symbol |
//! | [`LatestValidRecord`] | Newest record with complete price fields |
//! | [`Period`] | Candlestick window tag |
//! | [`UtcDateTime`] | UTC timestamp |

mod period;
mod record;
mod symbol;
mod timestamp;
mod trade_date;

pub use period::Period;
pub use record::{DailyRecord, LatestValidRecord, Series};
pub use symbol::Symbol;
pub use timestamp::UtcDateTime;
pub use trade_date::TradeDate;
