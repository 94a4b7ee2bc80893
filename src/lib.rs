//! Passively observe TCP traffic, reconstruct PostgreSQL v3 wire-protocol
//! streams, and report slow-query latency statistics.
//!
//! The binary entry point lives in `main.rs`; this crate exposes the
//! pieces it wires together:
//!
//! - [`protocol`]: byte-order helpers and the message decoder (components
//!   A, B).
//! - [`flow`]: the per-flow parser and flow registry (components C, E).
//! - [`capture`]: packet capture, TCP reassembly, and the stream adapter
//!   (components D, H).
//! - [`stats`]: the statistics aggregator and reporter (components F, G).
//! - [`cli`]: command-line flags (component I).
//! - [`app`]: orchestration wiring the above into a running process.

pub mod app;
pub mod buffer_pool;
pub mod capture;
pub mod cli;
pub mod error;
pub mod flow;
pub mod protocol;
pub mod stats;

pub use error::{Error, Result};
