//! logcount pipeline library entry.
//!
//! Hosts filter plugins: loads the pipeline document, instantiates plugins by
//! name from the registry, feeds them matching messages, drives their tickers,
//! and forwards what they inject. Consumed by the binary (`main.rs`) and by
//! integration tests.

pub mod config;
pub mod filters;
pub mod plugin;
pub mod registry;
pub mod router;
pub mod runner;
pub mod runtime;
pub mod sink;
