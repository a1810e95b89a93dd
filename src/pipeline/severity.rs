//! Deterministic severity and risk stratification.
//!
//! Runs alongside the criterion matcher on the same feature record and feeds
//! the risk-stratification narrative section. Weights are fixed; the banded
//! level string is advisory wording for the reviewer, not the admission
//! recommendation (that stays the Met-existence check in scoring).

use serde::{Deserialize, Serialize};

use super::extraction::types::ExtractedFeatures;

/// Severity/risk read-out for one note.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SeverityDetermination {
    pub triggers: Vec<String>,
    pub severity_score: u32,
    pub risk_score: u32,
    /// severity + risk, capped at 100.
    pub total_score: u32,
    pub risk_factors: Vec<String>,
    pub unsafe_discharge: bool,
    pub unsafe_reasons: Vec<String>,
    pub level: String,
}

/// Compute the severity determination for one feature record.
pub fn determine_severity(features: &ExtractedFeatures) -> SeverityDetermination {
    let mut triggers: Vec<String> = Vec::new();
    let mut severity_score: u32 = 0;

    let trigger = |label: &str, weight: u32, triggers: &mut Vec<String>, score: &mut u32| {
        triggers.push(label.to_string());
        *score += weight;
    };

    if features.hypoxemia {
        trigger("Hypoxemia", 40, &mut triggers, &mut severity_score);
    }
    if features.oxygen_requirement {
        trigger("Oxygen requirement", 25, &mut triggers, &mut severity_score);
    }
    if features.tachypnea {
        trigger("Tachypnea", 10, &mut triggers, &mut severity_score);
    }
    let radiographic = features
        .imaging_findings
        .iter()
        .any(|f| matches!(f.as_str(), "pneumonia" | "infiltrate" | "consolidation"));
    if radiographic {
        trigger("Radiographic pneumonia", 15, &mut triggers, &mut severity_score);
    }
    if features.bilateral_pneumonia {
        trigger("Bilateral pneumonia", 10, &mut triggers, &mut severity_score);
    }
    if features.labs.wbc.is_some_and(|v| v >= 12.0) {
        trigger("Leukocytosis", 10, &mut triggers, &mut severity_score);
    }
    if features.labs.bun.is_some_and(|v| v > 40.0) {
        trigger("Elevated BUN", 5, &mut triggers, &mut severity_score);
    }
    if features.labs.gfr.is_some_and(|v| v < 60.0) {
        trigger("Reduced GFR", 5, &mut triggers, &mut severity_score);
    }
    if features.labs.creatinine.is_some_and(|v| v > 1.5) {
        trigger("Elevated creatinine", 5, &mut triggers, &mut severity_score);
    }
    if features.labs.inr.is_some_and(|v| v > 2.0) {
        trigger("Elevated INR", 5, &mut triggers, &mut severity_score);
    }
    if features.iv_antibiotics {
        trigger("IV antibiotic therapy", 15, &mut triggers, &mut severity_score);
    }

    let mut risk_score: u32 = 0;
    let mut risk_factors: Vec<String> = Vec::new();
    match features.age {
        Some(age) if age >= 75 => {
            risk_score += 5;
            risk_factors.push("Advanced age \u{2265} 75".to_string());
        }
        Some(age) if age >= 65 => {
            risk_score += 3;
            risk_factors.push("Age \u{2265} 65".to_string());
        }
        _ => {}
    }
    if !features.comorbidities.is_empty() {
        risk_score += 5;
        risk_factors.push("Multiple comorbidities".to_string());
    }
    if features.assisted_living {
        risk_score += 3;
        risk_factors.push("Assisted living residency".to_string());
    }
    if features.dnr_dni {
        risk_score += 3;
        risk_factors.push("DNR/DNI status".to_string());
    }

    let mut unsafe_discharge = false;
    let mut unsafe_reasons: Vec<String> = Vec::new();
    if features.hypoxemia {
        unsafe_discharge = true;
        unsafe_reasons.push("Hypoxemia".to_string());
    }
    if features.oxygen_requirement && features.lowest_spo2.is_some_and(|v| v < 92) {
        unsafe_discharge = true;
        unsafe_reasons.push("Oxygen dependency".to_string());
    }
    if features.bilateral_pneumonia && features.tachypnea {
        unsafe_discharge = true;
        unsafe_reasons.push("High respiratory burden".to_string());
    }

    let total_score = (severity_score + risk_score).min(100);

    let level = if unsafe_discharge {
        "Inpatient - Unsafe for discharge"
    } else if total_score >= 70 {
        "Inpatient - Strong guideline support"
    } else if total_score >= 50 {
        "Inpatient - Guideline supported"
    } else if total_score >= 35 {
        "Inpatient - Consider admission"
    } else {
        "Observation / outpatient"
    }
    .to_string();

    SeverityDetermination {
        triggers,
        severity_score,
        risk_score,
        total_score,
        risk_factors,
        unsafe_discharge,
        unsafe_reasons,
        level,
    }
}
