//! Pipeline coordinator.
//!
//! Owns the read-only criteria catalog and drives one request through
//! normalize, extract, match, reconcile, score, severity, and narrative,
//! packaging everything into the wire report. The engine holds no mutable
//! state, so one instance serves concurrent requests without synchronization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::criteria::catalog::CriteriaCatalog;
use super::criteria::matcher::evaluate_all;
use super::criteria::types::{CanonicalCriterion, CriterionCategory, EvaluatedCriterion, MatchStatus};
use super::extraction::clinical::extract_clinical_features;
use super::guideline::parse_guideline_sections;
use super::narrative::build_justification;
use super::normalize::normalize_note;
use super::scoring::compute_admission_decision;
use super::severity::{determine_severity, SeverityDetermination};

/// Canonical criterion echoed back in the report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CriterionSummary {
    pub id: String,
    pub text: String,
    pub category: CriterionCategory,
}

/// Per-criterion outcome row of the report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CriterionOutcome {
    pub criterion_id: String,
    /// The guideline statement being evaluated.
    pub guideline: String,
    /// Documentation action for the reviewer.
    pub action: String,
    pub status: MatchStatus,
    pub score_contribution: u32,
}

/// Full admission-support report for one note.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AlignmentReport {
    /// Canonical criteria in configured order.
    pub extracted_criteria: Vec<CriterionSummary>,
    /// One row per canonical criterion, same order.
    pub evaluated_criteria: Vec<CriterionOutcome>,
    pub overall_score_percent: u32,
    pub admission_recommended: bool,
    pub narrative_text: String,
    /// Evidence and suggested-language detail behind `evaluated_criteria`.
    pub evaluation_details: Vec<EvaluatedCriterion>,
    pub determination: SeverityDetermination,
    /// Bounded JSON preview of the uploaded guideline's sections, empty when
    /// no guideline text was provided.
    pub guideline_sections_preview: String,
    pub generated_at: DateTime<Utc>,
}

/// Stateless engine over an injected catalog.
pub struct AlignmentEngine {
    catalog: CriteriaCatalog,
}

impl AlignmentEngine {
    pub fn new(catalog: CriteriaCatalog) -> Self {
        Self { catalog }
    }

    /// Engine over the built-in canonical criteria table.
    pub fn with_canonical() -> Self {
        Self::new(CriteriaCatalog::canonical())
    }

    pub fn catalog(&self) -> &CriteriaCatalog {
        &self.catalog
    }

    /// Run the full pipeline over one note and optional guideline text.
    ///
    /// Infallible: malformed or empty input degrades to an all-Missing report
    /// with a zero score, never an error.
    pub fn run(&self, doctor_notes: &str, guideline_text: &str) -> AlignmentReport {
        let normalized = normalize_note(doctor_notes);
        let features = extract_clinical_features(&normalized);

        let raw = evaluate_all(self.catalog.as_slice(), &features);
        let reconciled = reconcile(self.catalog.as_slice(), raw);

        let decision = compute_admission_decision(&reconciled);
        let determination = determine_severity(&features);

        let sections = parse_guideline_sections(guideline_text);
        let narrative = build_justification(&features, &reconciled, &decision, &determination);

        tracing::info!(
            criteria = reconciled.len(),
            met = reconciled.iter().filter(|e| e.status == MatchStatus::Met).count(),
            score_percent = decision.percentage,
            admission_recommended = decision.admission_recommended,
            severity_level = %determination.level,
            "alignment complete"
        );

        AlignmentReport {
            extracted_criteria: self
                .catalog
                .iter()
                .map(|c| CriterionSummary {
                    id: c.id.clone(),
                    text: c.text.clone(),
                    category: c.category,
                })
                .collect(),
            evaluated_criteria: reconciled
                .iter()
                .zip(self.catalog.iter())
                .map(|(e, c)| CriterionOutcome {
                    criterion_id: e.criterion_id.clone(),
                    guideline: e.criterion_text.clone(),
                    action: c.action_text(),
                    status: e.status,
                    score_contribution: e.score_contribution,
                })
                .collect(),
            overall_score_percent: decision.percentage,
            admission_recommended: decision.admission_recommended,
            narrative_text: narrative.render_text(),
            evaluation_details: reconciled,
            determination,
            guideline_sections_preview: sections.preview(),
            generated_at: Utc::now(),
        }
    }
}

/// Force exactly one evaluation per canonical criterion, in catalog order.
///
/// The matcher may in principle emit zero, one, or duplicate entries per
/// criterion. Lookup is by id first, then by a 40-character prefix of the
/// criterion text; anything still unmatched becomes a Missing/0 placeholder.
/// The first matching entry wins when duplicates exist.
fn reconcile(
    catalog: &[CanonicalCriterion],
    evaluated: Vec<EvaluatedCriterion>,
) -> Vec<EvaluatedCriterion> {
    catalog
        .iter()
        .map(|criterion| {
            let prefix: String = criterion.text.chars().take(40).collect();
            evaluated
                .iter()
                .find(|e| e.criterion_id == criterion.id)
                .or_else(|| {
                    evaluated.iter().find(|e| {
                        let candidate: String = e.criterion_text.chars().take(40).collect();
                        candidate == prefix
                    })
                })
                .cloned()
                .unwrap_or_else(|| EvaluatedCriterion::missing_for(criterion))
        })
        .collect()
}
