//! Domain models for the pharmacy ledger.

mod medicine;
mod sale;
mod stock;

pub use medicine::*;
pub use sale::*;
pub use stock::*;
