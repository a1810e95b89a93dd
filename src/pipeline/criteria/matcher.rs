//! Criterion matching: decides Met / Partial / Missing per canonical
//! criterion against one note's extracted features.
//!
//! Two evaluation paths. Criteria with a keyword list run keyword search
//! against a flattened corpus of the note plus every extracted signal.
//! Criteria without keywords fall through category-specific deterministic
//! rules, with criterion-text indicators selecting a branch when the category
//! alone does not. Either way the outcome collapses onto the three-value
//! status enum and the fixed 5/2/0 score table.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use super::types::{
    suggested_language_for, CanonicalCriterion, CriterionCategory, EvaluatedCriterion,
    MatchStatus,
};
use crate::pipeline::extraction::types::ExtractedFeatures;

static WORD_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w+\b").expect("Invalid token regex"));
static CRITERION_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-zA-Z0-9%\-]+").expect("Invalid criterion token regex"));

const PULMONARY_INDICATORS: [&str; 12] = [
    "oxygen", "o2 sat", "hypox", "desat", "saturation", "respiratory", "tachypnea",
    "crackles", "pneumonia", "infiltrate", "consolidation", "bilateral",
];
const IMAGING_INDICATORS: [&str; 6] =
    ["pneumonia", "x-ray", "cxr", "ct", "consolidation", "infiltrate"];
const LAB_INDICATORS: [&str; 8] =
    ["wbc", "white blood", "leukocyt", "lactate", "bun", "creatinine", "gfr", "inr"];
const RENAL_INDICATORS: [&str; 3] = ["bun", "creatinine", "gfr"];
const ESCALATION_INDICATORS: [&str; 7] =
    ["iv", "intravenous", "vancomycin", "cefepime", "piperacillin", "zosyn", "broad-spectrum"];
const HEMODYNAMIC_INDICATORS: [&str; 5] =
    ["blood pressure", "sbp", "hypotension", "tachycardia", "arrhythmia"];
const FUNCTIONAL_INDICATORS: [&str; 5] = ["assisted living", "dnr", "dni", "homebound", "nursing"];
const COMORBIDITY_INDICATORS: [&str; 6] = ["comorbid", "htn", "afib", "diabetes", "ckd", "dvt"];

/// Lowercase corpus the keyword matcher searches: the note text plus
/// stringified list/map/scalar features plus the names of every set flag.
pub fn build_search_corpus(features: &ExtractedFeatures) -> String {
    let mut parts: Vec<String> = Vec::new();

    if !features.raw_text.is_empty() {
        parts.push(features.raw_text.clone());
    }
    if !features.symptoms.is_empty() {
        parts.push(features.symptoms.join(" "));
    }
    if !features.imaging_findings.is_empty() {
        parts.push(features.imaging_findings.join(" "));
    }
    let lab_terms: Vec<String> = features
        .labs
        .entries()
        .iter()
        .filter_map(|(name, value)| value.map(|v| format!("{name} {v}")))
        .collect();
    if !lab_terms.is_empty() {
        parts.push(lab_terms.join(" "));
    }
    let mut vital_terms: Vec<String> = Vec::new();
    if let (Some(sys), Some(dia)) = (features.vitals.bp_systolic, features.vitals.bp_diastolic) {
        vital_terms.push(format!("bp {sys}/{dia}"));
    }
    if let Some(hr) = features.vitals.heart_rate {
        vital_terms.push(format!("hr {hr}"));
    }
    if let Some(rr) = features.vitals.respiratory_rate {
        vital_terms.push(format!("rr {rr}"));
    }
    if !vital_terms.is_empty() {
        parts.push(vital_terms.join(" "));
    }
    if !features.comorbidities.is_empty() {
        parts.push(features.comorbidities.join(" "));
    }
    if !features.spo2_values.is_empty() {
        let spo2: Vec<String> = features.spo2_values.iter().map(|v| v.to_string()).collect();
        parts.push(spo2.join(" "));
    }
    for (name, set) in features.flag_tokens() {
        if set {
            parts.push(name.to_string());
        }
    }

    parts.join("\n").to_lowercase()
}

/// Keyword search with three fallbacks per keyword: full substring, token
/// containment, then a truncated 6-char prefix as a last resort. Returns the
/// matched keywords in their original spelling.
///
/// The token probe is subsumed by the substring probe (every corpus token is
/// a corpus substring) but stays in the chain to match the deployed
/// heuristics step for step.
pub fn match_keywords<'a>(keywords: &'a [String], corpus: &str) -> Vec<&'a str> {
    if keywords.is_empty() || corpus.is_empty() {
        return Vec::new();
    }
    let mut matches = Vec::new();
    for kw in keywords {
        let k = kw.trim().to_lowercase();
        if k.is_empty() {
            continue;
        }
        if corpus.contains(&k) {
            matches.push(kw.as_str());
            continue;
        }
        if WORD_TOKEN.find_iter(corpus).any(|tok| tok.as_str().contains(&k)) {
            matches.push(kw.as_str());
            continue;
        }
        let prefix: String = k.chars().take(6).collect();
        if prefix.chars().count() >= 3 && corpus.contains(&prefix) {
            matches.push(kw.as_str());
        }
    }
    matches
}

/// Evaluate one criterion. Infallible by construction: any rule that finds
/// nothing degrades to Missing/0 rather than an error, so one criterion can
/// never abort the batch.
pub fn evaluate_criterion(
    criterion: &CanonicalCriterion,
    features: &ExtractedFeatures,
    corpus: &str,
) -> EvaluatedCriterion {
    let mut evidence: Vec<String> = Vec::new();

    let status = if !criterion.keywords.is_empty() {
        keyword_status(criterion, corpus, &mut evidence)
    } else {
        category_status(criterion, features, corpus, &mut evidence)
    };

    let suggested_language = if status == MatchStatus::Missing {
        suggested_language_for(&criterion.text)
    } else {
        String::new()
    };

    EvaluatedCriterion {
        criterion_id: criterion.id.clone(),
        criterion_text: criterion.text.clone(),
        category: criterion.category,
        status,
        evidence_found: evidence.join(" ; "),
        suggested_language,
        score_contribution: status.score_contribution(),
    }
}

/// Evaluate every catalog criterion against one feature record.
pub fn evaluate_all(
    criteria: &[CanonicalCriterion],
    features: &ExtractedFeatures,
) -> Vec<EvaluatedCriterion> {
    let corpus = build_search_corpus(features);
    let evaluated: Vec<EvaluatedCriterion> = criteria
        .iter()
        .map(|c| evaluate_criterion(c, features, &corpus))
        .collect();
    tracing::debug!(count = evaluated.len(), "Criteria evaluated");
    evaluated
}

fn keyword_status(
    criterion: &CanonicalCriterion,
    corpus: &str,
    evidence: &mut Vec<String>,
) -> MatchStatus {
    let matched = match_keywords(&criterion.keywords, corpus);
    if matched.is_empty() {
        return MatchStatus::Missing;
    }
    evidence.extend(matched.iter().map(|m| m.to_string()));
    let distinct: HashSet<String> = matched.iter().map(|m| m.to_lowercase()).collect();
    if distinct.len() >= 2 {
        MatchStatus::Met
    } else {
        MatchStatus::Partial
    }
}

fn text_has_any(text: &str, indicators: &[&str]) -> bool {
    indicators.iter().any(|i| text.contains(i))
}

fn category_status(
    criterion: &CanonicalCriterion,
    features: &ExtractedFeatures,
    corpus: &str,
    evidence: &mut Vec<String>,
) -> MatchStatus {
    let text = criterion.text.trim().to_lowercase();

    if criterion.category == CriterionCategory::Respiratory
        || text_has_any(&text, &PULMONARY_INDICATORS)
    {
        respiratory_status(features, evidence)
    } else if criterion.category == CriterionCategory::Imaging
        || text_has_any(&text, &IMAGING_INDICATORS)
    {
        if features.imaging_findings.is_empty() {
            MatchStatus::Missing
        } else {
            evidence.push("Radiographic evidence documented".to_string());
            MatchStatus::Met
        }
    } else if criterion.category == CriterionCategory::Laboratory
        || text_has_any(&text, &LAB_INDICATORS)
    {
        laboratory_status(&text, features, evidence)
    } else if criterion.category == CriterionCategory::Outpatient
        || text.contains("outpatient")
        || text.contains("failed")
    {
        if features.outpatient_failure {
            evidence.push("Outpatient therapy failure documented".to_string());
            MatchStatus::Met
        } else {
            MatchStatus::Missing
        }
    } else if criterion.category == CriterionCategory::Escalation
        || text_has_any(&text, &ESCALATION_INDICATORS)
    {
        if features.iv_antibiotics {
            evidence.push("IV broad-spectrum antibiotics initiated".to_string());
            MatchStatus::Met
        } else {
            MatchStatus::Missing
        }
    } else if criterion.category == CriterionCategory::Hemodynamic
        || text_has_any(&text, &HEMODYNAMIC_INDICATORS)
    {
        hemodynamic_status(features, evidence)
    } else if criterion.category == CriterionCategory::Functional
        || text_has_any(&text, &FUNCTIONAL_INDICATORS)
    {
        functional_status(features, evidence)
    } else if criterion.category == CriterionCategory::Comorbidity
        || text_has_any(&text, &COMORBIDITY_INDICATORS)
    {
        if features.comorbidities.is_empty() {
            MatchStatus::Missing
        } else {
            evidence
                .push(format!("Comorbidities present: {}", features.comorbidities.join(", ")));
            MatchStatus::Partial
        }
    } else {
        // Last resort: tokenize the criterion text and probe the corpus.
        let token_hits: Vec<&str> = CRITERION_TOKEN
            .find_iter(&text)
            .map(|m| m.as_str())
            .filter(|tok| corpus.contains(*tok))
            .collect();
        if token_hits.is_empty() {
            MatchStatus::Missing
        } else {
            evidence.push(token_hits.join(" "));
            MatchStatus::Partial
        }
    }
}

fn respiratory_status(features: &ExtractedFeatures, evidence: &mut Vec<String>) -> MatchStatus {
    let spo2 = features.lowest_spo2;
    if features.hypoxemia || spo2.is_some_and(|v| v < 90) {
        match spo2 {
            Some(v) => evidence.push(format!("Lowest SpO2={v}")),
            None => evidence.push("Hypoxemia documented".to_string()),
        }
        return MatchStatus::Met;
    }
    let borderline_spo2 = spo2.is_some_and(|v| (90..94).contains(&v));
    if features.oxygen_requirement
        || features.tachypnea
        || features.crackles
        || features.bilateral_pneumonia
        || borderline_spo2
    {
        if features.oxygen_requirement {
            evidence.push("Supplemental oxygen documented".to_string());
        }
        if features.tachypnea {
            evidence.push("Tachypnea documented".to_string());
        }
        if features.crackles {
            evidence.push("Exam: crackles".to_string());
        }
        if features.bilateral_pneumonia {
            evidence.push("Bilateral pulmonary involvement".to_string());
        }
        return MatchStatus::Partial;
    }
    MatchStatus::Missing
}

fn laboratory_status(
    text: &str,
    features: &ExtractedFeatures,
    evidence: &mut Vec<String>,
) -> MatchStatus {
    let labs = &features.labs;
    let mut status = if text_has_any(text, &RENAL_INDICATORS) {
        if labs.bun.is_some_and(|v| v > 40.0) {
            evidence.push(format!("BUN={}", labs.bun.unwrap_or_default()));
            MatchStatus::Met
        } else if labs.creatinine.is_some_and(|v| v > 1.5) {
            evidence.push(format!("Creatinine={}", labs.creatinine.unwrap_or_default()));
            MatchStatus::Met
        } else if labs.gfr.is_some_and(|v| v < 60.0) {
            evidence.push(format!("GFR={}", labs.gfr.unwrap_or_default()));
            MatchStatus::Partial
        } else {
            MatchStatus::Missing
        }
    } else {
        // General infection labs: leukocytosis thresholds.
        match labs.wbc {
            Some(wbc) if wbc >= 12.0 => {
                evidence.push(format!("WBC={wbc}"));
                MatchStatus::Met
            }
            Some(wbc) if wbc >= 10.0 => {
                evidence.push(format!("WBC={wbc}"));
                MatchStatus::Partial
            }
            _ => MatchStatus::Missing,
        }
    };

    // Coagulation concern elevates to Met regardless of the sub-status above.
    if labs.inr.is_some_and(|v| v > 2.0) {
        evidence.push(format!("INR={}", labs.inr.unwrap_or_default()));
        status = MatchStatus::Met;
    }
    status
}

fn hemodynamic_status(features: &ExtractedFeatures, evidence: &mut Vec<String>) -> MatchStatus {
    if let Some(sbp) = features.vitals.bp_systolic {
        if sbp < 90 {
            evidence.push(format!("SBP={sbp}"));
            return MatchStatus::Met;
        }
    }
    if let Some(hr) = features.vitals.heart_rate {
        if hr > 120 {
            evidence.push(format!("HR={hr}"));
            return MatchStatus::Partial;
        }
    }
    MatchStatus::Missing
}

fn functional_status(features: &ExtractedFeatures, evidence: &mut Vec<String>) -> MatchStatus {
    if features.assisted_living || features.dnr_dni || features.distress {
        if features.assisted_living {
            evidence.push("Assisted living residency".to_string());
        }
        if features.dnr_dni {
            evidence.push("DNR/DNI documented".to_string());
        }
        if features.distress {
            evidence.push("Clinically distressed / frail appearing".to_string());
        }
        return MatchStatus::Partial;
    }
    MatchStatus::Missing
}
