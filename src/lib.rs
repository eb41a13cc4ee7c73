//! Introskip - HLS byte-range proxy that skips or splices out intros
//!
//! This library crate exposes the core functionality for integration testing.

pub mod config;
pub mod probe;
pub mod proxy;
pub mod server;
