//! notealign: deterministic clinical-note alignment against admission
//! guideline criteria.
//!
//! The library is the pipeline; the binary wraps it in a small axum service.
//! See [`pipeline::alignment::AlignmentEngine`] for the entry point.

pub mod config;
pub mod pipeline;
pub mod server;

pub use pipeline::alignment::{AlignmentEngine, AlignmentReport};
