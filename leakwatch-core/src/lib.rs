//! Leakwatch Core - IOC extraction and risk scoring for leaked text
//!
//! This crate provides the analysis primitives:
//! - Indicator extraction (emails, domains, IPv4 addresses, URLs)
//! - Rule-based risk scoring with a capped 0-100 score
//! - Configuration tables (denylist, keyword patterns, trust labels, weights)
//! - Document and report types shared with the pipeline
//!
//! Both [`Extractor`] and [`Scorer`] are pure: no I/O, no shared mutable state.

pub mod config;
pub mod document;
pub mod error;
pub mod indicators;
pub mod scoring;

pub use config::*;
pub use document::*;
pub use error::*;
pub use indicators::*;
pub use scoring::*;

/// Upper bound of a risk score
pub const MAX_SCORE: u8 = 100;

/// Score at or above which a leak is considered high risk
pub const HIGH_RISK_THRESHOLD: u8 = 75;

/// Score at or above which a leak is considered medium risk
pub const MEDIUM_RISK_THRESHOLD: u8 = 40;

/// Default freshness window in hours
pub const DEFAULT_FRESHNESS_HOURS: i64 = 24;
