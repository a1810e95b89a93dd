//! Deterministic note-to-report pipeline.
//!
//! Stages run in a fixed order under [`alignment::AlignmentEngine`]:
//! normalize the note, extract clinical features, evaluate every canonical
//! criterion, reconcile to one record per criterion, aggregate the score,
//! determine severity, and render the narrative. Every stage is a pure
//! function over its inputs.

pub mod alignment;
pub mod criteria;
pub mod extraction;
pub mod guideline;
pub mod narrative;
pub mod normalize;
pub mod scoring;
pub mod severity;
