//! # Match Ledger
//!
//! A local match-result ledger for tabletop wargames with WTC scoring and
//! win-rate statistics.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (armies, detachments, matches)
//! - **scoring**: WTC score derivation from primary points
//! - **reconcile**: Child-collection reconciliation for army edits
//! - **filter**: Match filtering, month derivation, dropdown options and sorting
//! - **calculate**: Win/loss summaries, matchup tables and monthly series
//! - **storage**: Ledger persistence (JSONL, in-memory)
//! - **ledger**: Read and write operations over a store
//! - **report**: Plain-text rendering
//! - **config**: Configuration loading and validation

pub mod calculate;
pub mod config;
pub mod filter;
pub mod ledger;
pub mod models;
pub mod reconcile;
pub mod report;
pub mod scoring;
pub mod storage;

pub use models::*;
