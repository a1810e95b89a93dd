use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Clinical domain a guideline criterion belongs to. Drives which
/// deterministic rule branch evaluates a criterion with no keyword list.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CriterionCategory {
    Respiratory,
    Hemodynamic,
    Neurologic,
    Laboratory,
    Imaging,
    Outpatient,
    Escalation,
    Functional,
    Comorbidity,
    RiskScore,
    RiskFactor,
    Other,
}

/// One canonical admission-guideline statement. Loaded once at process start
/// and read-only thereafter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CanonicalCriterion {
    pub id: String,
    pub text: String,
    pub category: CriterionCategory,
    /// Ordered keyword list; empty means the category rules decide.
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Short documentation action shown to the reviewer.
    #[serde(default)]
    pub action: String,
}

impl CanonicalCriterion {
    /// Short action text, falling back to a 120-char text prefix when no
    /// explicit action is configured.
    pub fn action_text(&self) -> String {
        if !self.action.is_empty() {
            return self.action.clone();
        }
        self.text.chars().take(120).collect()
    }
}

/// Three-value match outcome for a criterion.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub enum MatchStatus {
    Met,
    Partial,
    #[default]
    Missing,
}

/// Incoming status text always funnels through [`normalize_status`], so a
/// synonym like "satisfied" or a malformed value can never smuggle a fourth
/// status into the pipeline.
impl<'de> Deserialize<'de> for MatchStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(normalize_status(&raw))
    }
}

impl MatchStatus {
    /// Fixed score table: Met=5, Partial=2, Missing=0. Not configurable per
    /// criterion.
    pub fn score_contribution(self) -> u32 {
        match self {
            MatchStatus::Met => 5,
            MatchStatus::Partial => 2,
            MatchStatus::Missing => 0,
        }
    }
}

/// Collapse arbitrary status text onto the three-value enum.
///
/// This is the single normalization point used by the matcher, the
/// reconciliation step, and the aggregator. Synonyms "yes"/"true"/"satisfied"
/// count as Met, anything containing "part" counts as Partial, and everything
/// else collapses to Missing.
pub fn normalize_status(raw: &str) -> MatchStatus {
    let s = raw.trim().to_lowercase();
    match s.as_str() {
        "met" | "yes" | "true" | "satisfied" => MatchStatus::Met,
        _ if s.contains("part") => MatchStatus::Partial,
        _ => MatchStatus::Missing,
    }
}

/// Per-request evaluation of one canonical criterion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EvaluatedCriterion {
    pub criterion_id: String,
    pub criterion_text: String,
    pub category: CriterionCategory,
    pub status: MatchStatus,
    /// Matched fragments joined with " ; ". Empty when nothing matched.
    pub evidence_found: String,
    /// Documentation-improvement hint, populated only when status is Missing.
    pub suggested_language: String,
    pub score_contribution: u32,
}

impl EvaluatedCriterion {
    /// The Missing/0 placeholder used for reconciliation gaps and evaluation
    /// failures. Indistinguishable from "no evidence found" on purpose.
    pub fn missing_for(criterion: &CanonicalCriterion) -> Self {
        Self {
            criterion_id: criterion.id.clone(),
            criterion_text: criterion.text.clone(),
            category: criterion.category,
            status: MatchStatus::Missing,
            evidence_found: String::new(),
            suggested_language: suggested_language_for(&criterion.text),
            score_contribution: 0,
        }
    }
}

/// Documentation hint attached to Missing criteria.
pub fn suggested_language_for(criterion_text: &str) -> String {
    let trimmed = criterion_text.trim();
    if trimmed.is_empty() {
        "Consider documenting relevant clinical findings.".to_string()
    } else {
        format!("Consider documenting: {trimmed}")
    }
}

/// Criteria configuration errors. The catalog is the one piece of state the
/// pipeline cannot conservatively default; a broken catalog fails the whole
/// request rather than producing a misleading all-Missing report.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Criteria catalog is empty")]
    Empty,

    #[error("Criteria catalog failed to parse: {0}")]
    Parse(#[from] serde_json::Error),
}
