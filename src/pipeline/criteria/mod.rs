//! Canonical admission criteria and the matching heuristics over them.

pub mod catalog;
pub mod matcher;
pub mod types;
