//! Core data models for the match ledger.

mod army;
mod ids;
mod match_record;

pub use army::*;
pub use ids::*;
pub use match_record::*;
