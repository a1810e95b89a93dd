//! Clinical feature extraction from normalized note text.

pub mod clinical;
pub mod types;
