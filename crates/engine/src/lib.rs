//! Household budget engine.
//!
//! A [`RecordStore`] owns the incomes and expense lines of one backing sheet,
//! saves the whole sheet through [`Persistence`] after every change and hands
//! out [`Metrics`] for the derived figures.

pub use codec::{CsvCodec, TableCodec};
pub use error::{EngineError, ErrorKind, LoadError, SaveError};
pub use metrics::{
    CategoryTotals, Dashboard, IncomeLine, Metrics, Summary, UtilizationStatus, VarianceLine,
    is_open_due, variance,
};
pub use money::Amount;
pub use ops::{Outcome, PLACEHOLDER_SUBCATEGORY, RecordStore, RecordStoreBuilder};
pub use persistence::{DEFAULT_RETENTION, Persistence, SaveInfo};
pub use records::{ExpenseKey, ExpenseRecord, IncomeRecord};
pub use table::{COLUMNS, REQUIRED_COLUMNS, Row, Table};

pub mod codec;
mod error;
pub mod metrics;
mod money;
mod ops;
pub mod persistence;
pub mod records;
pub mod table;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
