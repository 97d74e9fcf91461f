//! # Candlewick Core
//!
//! Read path for pre-fetched daily stock data.
//!
//! ## Overview
//!
//! Daily bars are produced out-of-band as one CSV file per symbol. This
//! crate turns those files into typed series and answers three questions
//! about them:
//!
//! - **Latest**: the newest record whose price fields are all present
//! - **Full series**: every record, oldest first
//! - **Window**: a trailing day/week/month/year slice for candlestick charts
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`domain`] | Symbols, trade dates, records, series, periods |
//! | [`loader`] | CSV loader keyed by symbol |
//! | [`sanitize`] | Numeric coercion and latest-valid selection |
//! | [`window`] | Candlestick window selection |
//! | [`service`] | Per-symbol and batch operations |
//! | [`envelope`] | Response envelope with metadata and structured errors |
//! | [`error`] | Core error types |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use candlewick_core::{default_tracked_symbols, Period, SeriesLoader, StockService, Symbol};
//!
//! let service = StockService::new(SeriesLoader::new("data"), default_tracked_symbols());
//! let symbol = Symbol::parse("688111")?;
//!
//! let week = service.get_window(&symbol, &Period::Week)?;
//! println!("{} records", week.len());
//!
//! for outcome in service.latest_for_tracked() {
//!     match outcome.error() {
//!         Some(error) => eprintln!("{}: {error}", outcome.code()),
//!         None => println!("{}: ok", outcome.code()),
//!     }
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Error Handling
//!
//! Every failure of the read path is a [`SeriesError`] scoped to one symbol:
//!
//! | Variant | Meaning | Retryable |
//! |---------|---------|-----------|
//! | `NotFound` | No backing file | no |
//! | `MalformedData` | Bad date, broken CSV, file mid-overwrite | yes |
//! | `NoValidData` | No record with complete price fields | no |

pub mod domain;
pub mod envelope;
pub mod error;
pub mod loader;
pub mod sanitize;
pub mod service;
pub mod window;

pub use domain::{DailyRecord, LatestValidRecord, Period, Series, Symbol, TradeDate, UtcDateTime};
pub use envelope::{Envelope, EnvelopeError, EnvelopeMeta, Status};
pub use error::{SeriesError, ValidationError};
pub use loader::SeriesLoader;
pub use sanitize::{coerce_numeric, latest_valid, REQUIRED_FIELDS};
pub use service::{default_tracked_symbols, StockService, SymbolOutcome, DEFAULT_TRACKED_SYMBOLS};
pub use window::select_window;
