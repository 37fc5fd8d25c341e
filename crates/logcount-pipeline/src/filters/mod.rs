//! Built-in filter plugins.

pub mod counter;

pub use counter::{CounterFilterConfig, LogCounterFilter};
