//! Horizon - a DNS resolver and forwarding proxy.
//!
//! This library exposes the wire-format decoder and the query
//! multiplexing core for benchmarking and testing.

pub mod config;
pub mod inflight;
pub mod mux;
pub mod resolver;
pub mod wire;
