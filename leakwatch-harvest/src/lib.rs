//! Leakwatch Harvest
//!
//! Sources that turn raw text into [`Document`](leakwatch_core::Document)s:
//! - Built-in sample leak for demos
//! - Local files and directories
//! - Raw paste URLs over HTTP, with timeout and retry

pub mod source;
pub mod file;
pub mod http;

pub use source::*;
pub use file::*;
pub use http::*;
