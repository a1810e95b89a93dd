//! Score aggregation over the reconciled evaluation list.

use serde::{Deserialize, Serialize};

use super::criteria::types::{EvaluatedCriterion, MatchStatus};

/// Admission decision derived from one request's evaluations. Never
/// persisted.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionDecision {
    pub total_score: u32,
    pub max_possible_score: u32,
    /// Rounded percentage of the maximum, 0 for an empty criteria set.
    pub percentage: u32,
    /// Existence check over Met criteria, NOT a percentage threshold: a
    /// single Met criterion recommends admission regardless of overall score.
    pub admission_recommended: bool,
}

/// Sum per-criterion contributions into the admission decision.
pub fn compute_admission_decision(evaluated: &[EvaluatedCriterion]) -> AdmissionDecision {
    let total_score: u32 = evaluated.iter().map(|e| e.score_contribution).sum();
    let max_possible_score = evaluated.len() as u32 * 5;
    let percentage = if max_possible_score > 0 {
        (f64::from(total_score) / f64::from(max_possible_score) * 100.0).round() as u32
    } else {
        0
    };
    let admission_recommended = evaluated.iter().any(|e| e.status == MatchStatus::Met);

    AdmissionDecision { total_score, max_possible_score, percentage, admission_recommended }
}
