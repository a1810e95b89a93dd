//! Canonical admission-guideline criteria.
//!
//! The catalog is process-wide, read-only reference data: built once at
//! startup (or parsed from a JSON config) and injected into the alignment
//! engine. There is no implicit module-level fallback; a caller without a
//! catalog has nothing to evaluate against.

use serde::{Deserialize, Serialize};

use super::types::{CanonicalCriterion, CatalogError, CriterionCategory};

/// Ordered, immutable set of canonical criteria.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CriteriaCatalog {
    criteria: Vec<CanonicalCriterion>,
}

impl CriteriaCatalog {
    /// Build a catalog from an explicit criterion list. Fails on an empty
    /// list — an empty catalog would make every note score 0/0 and silently
    /// recommend against admission.
    pub fn new(criteria: Vec<CanonicalCriterion>) -> Result<Self, CatalogError> {
        if criteria.is_empty() {
            return Err(CatalogError::Empty);
        }
        Ok(Self { criteria })
    }

    /// Parse a catalog from JSON configuration (an array of criteria).
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let criteria: Vec<CanonicalCriterion> = serde_json::from_str(json)?;
        Self::new(criteria)
    }

    /// The built-in inpatient pneumonia admission criteria set.
    pub fn canonical() -> Self {
        Self { criteria: canonical_criteria() }
    }

    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    /// Criteria in configured order.
    pub fn iter(&self) -> impl Iterator<Item = &CanonicalCriterion> {
        self.criteria.iter()
    }

    pub fn as_slice(&self) -> &[CanonicalCriterion] {
        &self.criteria
    }
}

fn criterion(
    id: &str,
    text: &str,
    category: CriterionCategory,
    keywords: &[&str],
    action: &str,
) -> CanonicalCriterion {
    CanonicalCriterion {
        id: id.to_string(),
        text: text.to_string(),
        category,
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
        action: action.to_string(),
    }
}

fn canonical_criteria() -> Vec<CanonicalCriterion> {
    vec![
        criterion(
            "MCG-R1",
            "Hypoxemia (SpO2 < 90%) or need for supplemental oxygen",
            CriterionCategory::Respiratory,
            &[
                "hypoxemia",
                "spo2",
                "o2 sat",
                "oxygen saturation",
                "supplemental oxygen",
                "nasal cannula",
                "desaturat",
            ],
            "Document lowest SpO2 value and oxygen support requirement.",
        ),
        criterion(
            "MCG-H1",
            "Hemodynamic instability (systolic BP < 90 or need for vasopressors)",
            CriterionCategory::Hemodynamic,
            &["sbp < 90", "hypotension", "vasopressor"],
            "Document persistent hypotension or vasopressor requirement.",
        ),
        criterion(
            "MCG-N1",
            "Altered mental status that is severe or persistent",
            CriterionCategory::Neurologic,
            &["altered mental", "confusion", "lethargy", "somnolent", "disoriented", "coma"],
            "Document severity and persistence of altered mental status.",
        ),
        criterion(
            "MCG-D1",
            "Dehydration that is severe or persistent",
            CriterionCategory::Other,
            &["dehydration", "orthostasis", "dry mucosa"],
            "Document severity of dehydration and need for IV fluids.",
        ),
        criterion(
            "MCG-R2",
            "Ventilatory assistance needed (eg mechanical ventilation, noninvasive ventilation)",
            CriterionCategory::Respiratory,
            &["intubation", "mechanical ventilation", "bipap", "cpap", "ventilator"],
            "Document requirement for mechanical or noninvasive ventilatory support.",
        ),
        criterion(
            "MCG-B1",
            "Bacteremia (if blood cultures performed)",
            CriterionCategory::Laboratory,
            &["positive blood culture", "bacteremia"],
            "Document positive blood culture if obtained.",
        ),
        criterion(
            "MCG-R3",
            "Moderate-risk-category or high-risk-category patient (PSI IV/V or CURB-65 \u{2265} 3)",
            CriterionCategory::RiskScore,
            &["psi iv", "psi v", "curb-65", "curb 65"],
            "Document PSI class IV/V or CURB-65 score \u{2265} 3.",
        ),
        criterion(
            "MCG-R4",
            "Respiratory finding (eg tachypnea) that persists despite observation care",
            CriterionCategory::Respiratory,
            &["tachypnea", "respiratory rate", "respiratory distress"],
            "Document respiratory findings persisting despite observation.",
        ),
        criterion(
            "MCG-C1",
            "Complicated pleural effusions (eg empyema, loculated)",
            CriterionCategory::Imaging,
            &["pleural effusion", "empyema", "loculated"],
            "Document complicated pleural effusion findings.",
        ),
        criterion(
            "MCG-R6",
            "Presence of risk factor for poor outcome (eg gross hemoptysis, cavitary infiltrate, \
             neuromuscular weakness, cystic fibrosis)",
            CriterionCategory::RiskFactor,
            &["hemoptysis", "cavitary infiltrate", "neuromuscular weakness", "cystic fibrosis"],
            "Document risk factors associated with poor outcome.",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_catalog_has_ten_criteria() {
        let catalog = CriteriaCatalog::canonical();
        assert_eq!(catalog.len(), 10);
    }

    #[test]
    fn canonical_ids_are_unique_and_stable() {
        let catalog = CriteriaCatalog::canonical();
        let ids: Vec<&str> = catalog.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids[0], "MCG-R1");
        assert_eq!(ids[8], "MCG-C1");
        let mut deduped = ids.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), ids.len());
    }

    #[test]
    fn every_canonical_criterion_has_keywords_and_action() {
        for c in CriteriaCatalog::canonical().iter() {
            assert!(!c.keywords.is_empty(), "criterion {} has no keywords", c.id);
            assert!(!c.action.is_empty(), "criterion {} has no action", c.id);
        }
    }

    #[test]
    fn empty_catalog_is_rejected() {
        assert!(matches!(CriteriaCatalog::new(vec![]), Err(CatalogError::Empty)));
    }

    #[test]
    fn catalog_parses_from_json_config() {
        let json = r#"[
            {
                "id": "CFG-1",
                "text": "Custom criterion",
                "category": "Respiratory",
                "keywords": ["hypoxemia"],
                "action": "Document it."
            }
        ]"#;
        let catalog = CriteriaCatalog::from_json(json).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.as_slice()[0].id, "CFG-1");
        assert_eq!(catalog.as_slice()[0].category, CriterionCategory::Respiratory);
    }

    #[test]
    fn json_keywords_and_action_default_when_absent() {
        let json = r#"[{ "id": "CFG-2", "text": "No keywords here", "category": "Other" }]"#;
        let catalog = CriteriaCatalog::from_json(json).unwrap();
        assert!(catalog.as_slice()[0].keywords.is_empty());
        assert!(catalog.as_slice()[0].action.is_empty());
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(CriteriaCatalog::from_json("not json"), Err(CatalogError::Parse(_))));
    }

    #[test]
    fn empty_json_array_is_rejected() {
        assert!(matches!(CriteriaCatalog::from_json("[]"), Err(CatalogError::Empty)));
    }
}
