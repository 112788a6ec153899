//! HTTP transport and CLI for the governance monitor (spec §6).
//!
//! This crate is intentionally thin: every operation's semantics live in
//! `sentinel-governance`; this crate only turns HTTP requests into
//! [`sentinel_domain::operation::Request`] values and formats the result.

pub mod api;
pub mod cli;
pub mod state;
