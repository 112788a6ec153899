//! Shared types for the sentinel governance monitor: the error taxonomy,
//! structured trace events, the RPC request envelope, layered
//! configuration, and small value types referenced by more than one crate.
//!
//! Everything here is pure data and has no async runtime or I/O dependency,
//! so it can be pulled into any of the other crates (and the binary)
//! without pulling their dependencies along with it.

pub mod config;
pub mod error;
pub mod operation;
pub mod trace;
pub mod types;

pub use error::{Error, ErrorCode, ErrorResponse, Recovery, Result};
