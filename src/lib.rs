#![warn(missing_docs)]
//! Библиотека учёта личного портфеля акций: доходность позиций, сводка и
//! советы по усреднению или сокращению позиции.

mod aggregate;
mod approx;
mod config;
mod error;
mod formula;
mod simulate;
mod store;
mod substitute;
mod types;
mod utils;

pub use crate::aggregate::{
    adjustment_formula, earn_rate, enrich, index_quotes, merge_quotes, quotes_from_reader,
    summarize,
};
pub use crate::approx::{Approximation, SearchOptions, find_approx};
pub use crate::config::{AdvisorConfig, default_stocks};
pub use crate::error::{AdvisorError, FormulaError};
pub use crate::formula::{BinaryOp, Expr, MAX_DEPTH, VARIABLE, evaluate};
pub use crate::simulate::{SimulationLeg, SimulationSettings};
pub use crate::store::{
    FileStore, KeyValueStore, MemoryStore, PAGE_VIEW_KEY, PortfolioStore, STOCKS_KEY,
};
pub use crate::substitute::substitute;
pub use crate::types::*;
pub use crate::utils::{RoundTo, normalize_symbol, normalize_symbols, to_multiple};
