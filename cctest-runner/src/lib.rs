//! cctest runner library.
//!
//! Exposes the lifecycle controller and built-in cases for integration
//! testing. In production, `cctest` is used as a binary (main.rs).

pub mod cases;
pub mod cli;
pub mod error;
pub mod lifecycle;
pub mod logging;
pub mod metrics_server;
