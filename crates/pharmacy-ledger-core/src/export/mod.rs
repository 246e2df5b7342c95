//! Export of sale history.

mod sales_csv;

pub use sales_csv::*;
