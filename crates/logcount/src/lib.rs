//! Top-level facade crate for logcount.
//!
//! Re-exports the core types and the pipeline library so users can depend on a single crate.

pub mod core {
    pub use logcount_core::*;
}

pub mod pipeline {
    pub use logcount_pipeline::*;
}
