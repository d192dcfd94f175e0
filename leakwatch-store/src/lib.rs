//! Leakwatch Store
//!
//! Owns the domain watchlist:
//! - Add-if-absent / remove-if-present mutations behind a lock
//! - Read-only snapshots handed to the analysis core
//! - JSON persistence for the CLI

pub mod watchlist;

pub use watchlist::*;
