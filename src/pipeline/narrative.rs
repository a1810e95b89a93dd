//! Payer-style justification narrative.
//!
//! Pure string assembly from already-computed fields: no decisions are made
//! here. Four labeled sections come back to the coordinator, which joins the
//! non-blank ones with double newlines. Missing inputs elide their sentences
//! rather than erroring, so rendering can never fail a request.

use serde::{Deserialize, Serialize};

use super::criteria::types::{EvaluatedCriterion, MatchStatus};
use super::extraction::types::{ExtractedFeatures, Gender};
use super::scoring::AdmissionDecision;
use super::severity::SeverityDetermination;

/// The four narrative sections, in render order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NarrativeSections {
    pub clinical_summary: String,
    pub medical_necessity_justification: String,
    pub risk_stratification: String,
    pub conclusion: String,
}

impl NarrativeSections {
    /// Concatenate the sections in fixed order, skipping blank ones, with
    /// double-newline separation.
    pub fn render_text(&self) -> String {
        [
            &self.clinical_summary,
            &self.medical_necessity_justification,
            &self.risk_stratification,
            &self.conclusion,
        ]
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
    }
}

/// Oxford-style list: "a", "a, and b", "a, b, and c".
fn format_list(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [only] => only.clone(),
        [head @ .., last] => format!("{}, and {last}", head.join(", ")),
    }
}

/// Assemble the narrative from one request's computed artifacts.
pub fn build_justification(
    features: &ExtractedFeatures,
    evaluated: &[EvaluatedCriterion],
    decision: &AdmissionDecision,
    severity: &SeverityDetermination,
) -> NarrativeSections {
    NarrativeSections {
        clinical_summary: clinical_summary(features),
        medical_necessity_justification: medical_necessity(evaluated, decision),
        risk_stratification: risk_stratification(severity),
        conclusion: conclusion(decision),
    }
}

fn clinical_summary(features: &ExtractedFeatures) -> String {
    let mut paragraphs: Vec<String> = Vec::new();

    // Demographics + chief complaint.
    let mut intro = match (features.age, features.gender) {
        (Some(age), Gender::Female) => format!("The patient is an {age}-year-old female"),
        (Some(age), Gender::Male) => format!("The patient is an {age}-year-old male"),
        (Some(age), Gender::Unknown) => format!("The patient is an {age}-year-old individual"),
        (None, _) => "The patient".to_string(),
    };
    if !features.comorbidities.is_empty() {
        intro.push_str(&format!(
            " with a history of {}",
            format_list(&features.comorbidities)
        ));
    }
    match features.symptom_duration_days {
        Some(days) => intro.push_str(&format!(
            " who presented to the emergency department with a {days}-day history of \
             respiratory symptoms."
        )),
        None => intro.push_str(
            " who presented to the emergency department with progressive respiratory symptoms.",
        ),
    }
    intro.push_str(
        " The patient sought emergency evaluation due to ongoing symptom progression \
         and concern for worsening respiratory status.",
    );
    paragraphs.push(intro);

    // Symptom progression.
    if !features.symptoms.is_empty() {
        let symptom_text = format_list(&features.symptoms);
        let para = match features.symptom_duration_days {
            Some(days) => format!(
                "Per documentation, symptoms including {symptom_text} had been present for \
                 approximately {days} days and were progressively worsening despite \
                 conservative measures. The progressive nature of symptoms raised concern \
                 for an evolving lower respiratory tract infection."
            ),
            None => format!(
                "Per documentation, symptoms included {symptom_text} with progressive \
                 worsening, suggesting an acute infectious or inflammatory respiratory \
                 process."
            ),
        };
        paragraphs.push(para);
    }
    if features.outpatient_failure {
        paragraphs.push(
            "Per documentation, the patient had been treated in the outpatient setting; \
             however, symptoms worsened despite recent therapy, consistent with failure of \
             outpatient management."
                .to_string(),
        );
    }

    // Emergency department findings.
    let mut ed_lines: Vec<String> = Vec::new();
    if let Some(spo2) = features.lowest_spo2 {
        ed_lines.push(format!(
            "Emergency department monitoring demonstrated oxygen desaturation to {spo2}%, \
             indicating objective hypoxemia at the time of presentation."
        ));
    }
    if features.oxygen_requirement {
        ed_lines.push(
            "Supplemental oxygen therapy was required to restore and maintain adequate \
             oxygen saturation, reflecting clinically significant respiratory compromise."
                .to_string(),
        );
    }
    if !ed_lines.is_empty() {
        paragraphs.push(ed_lines.join(" "));
    }

    // Imaging + laboratory findings.
    let mut objective_lines: Vec<String> = Vec::new();
    if !features.imaging_findings.is_empty() {
        objective_lines.push(format!(
            "Chest imaging demonstrated findings consistent with {}, supporting the \
             diagnosis of an acute pulmonary infectious process.",
            format_list(&features.imaging_findings)
        ));
    }
    if let Some(wbc) = features.labs.wbc {
        objective_lines.push(format!(
            "Laboratory evaluation revealed leukocytosis with a white blood cell count of \
             {wbc}, supporting the presence of systemic inflammatory response."
        ));
    }
    if features.iv_antibiotics {
        objective_lines.push(
            "Given the severity of presentation, broad-spectrum intravenous antibiotics \
             were initiated in the emergency department for empiric treatment of suspected \
             bacterial pneumonia."
                .to_string(),
        );
    }
    if !objective_lines.is_empty() {
        paragraphs.push(objective_lines.join(" "));
    }

    // Medical necessity summary.
    let mut components: Vec<String> = Vec::new();
    if features.lowest_spo2.is_some_and(|v| v < 90) {
        components.push("documented hypoxemia requiring supplemental oxygen".to_string());
    }
    if !features.imaging_findings.is_empty() {
        components.push("radiographic evidence of pneumonia".to_string());
    }
    if features.outpatient_failure {
        components.push("failure of outpatient therapy".to_string());
    }
    if features.labs.wbc.is_some() {
        components.push("laboratory evidence of bacterial infection".to_string());
    }
    if !components.is_empty() {
        paragraphs.push(format!(
            "In summary, this patient demonstrates {}, in the setting of progressive \
             respiratory symptoms. These findings collectively support the need for \
             inpatient-level monitoring and management.",
            components.join(", ")
        ));
    }

    paragraphs.join("\n\n")
}

fn medical_necessity(evaluated: &[EvaluatedCriterion], decision: &AdmissionDecision) -> String {
    let met: Vec<&EvaluatedCriterion> =
        evaluated.iter().filter(|e| e.status == MatchStatus::Met).collect();
    let partial_count = evaluated.iter().filter(|e| e.status == MatchStatus::Partial).count();
    if met.is_empty() && partial_count == 0 {
        return String::new();
    }

    let mut lines = vec![format!(
        "Guideline alignment identified {} of {} admission criteria as fully met and {} as \
         partially supported, for an overall alignment of {}%.",
        met.len(),
        evaluated.len(),
        partial_count,
        decision.percentage
    )];
    for e in met {
        if e.evidence_found.is_empty() {
            lines.push(format!("Fully met: {}.", e.criterion_text));
        } else {
            lines.push(format!("Fully met: {} ({}).", e.criterion_text, e.evidence_found));
        }
    }
    lines.join(" ")
}

fn risk_stratification(severity: &SeverityDetermination) -> String {
    if severity.risk_factors.is_empty() && severity.triggers.is_empty() {
        return String::new();
    }
    let mut parts: Vec<String> = Vec::new();
    if !severity.triggers.is_empty() {
        parts.push(format!(
            "Severity triggers documented: {}.",
            format_list(&severity.triggers)
        ));
    }
    if !severity.risk_factors.is_empty() {
        parts.push(format!(
            "Risk factors identified: {}.",
            format_list(&severity.risk_factors)
        ));
    }
    parts.push(format!(
        "Composite severity assessment: {} (severity score {}, risk score {}).",
        severity.level, severity.severity_score, severity.risk_score
    ));
    if severity.unsafe_discharge {
        parts.push(format!(
            "Discharge is considered unsafe at this time due to {}.",
            format_list(&severity.unsafe_reasons)
        ));
    }
    parts.join(" ")
}

fn conclusion(decision: &AdmissionDecision) -> String {
    if decision.admission_recommended {
        format!(
            "Overall admission criteria alignment is {}%. Based on objective clinical \
             findings and risk profile, inpatient admission is medically appropriate.",
            decision.percentage
        )
    } else {
        format!(
            "Overall admission criteria alignment is {}%. Objective findings do not \
             currently satisfy an admission criterion; continued observation with \
             improved documentation is advised.",
            decision.percentage
        )
    }
}
