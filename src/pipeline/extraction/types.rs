use serde::{Deserialize, Serialize};

/// Patient gender as documented in the note.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    #[default]
    Unknown,
}

/// Vital signs pulled from the note. Every field is independently optional;
/// absence means "not documented", never "normal".
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct VitalSigns {
    pub bp_systolic: Option<u32>,
    pub bp_diastolic: Option<u32>,
    pub heart_rate: Option<u32>,
    pub respiratory_rate: Option<u32>,
}

/// Lab panel. Each value is captured by its own label-anchored pattern and is
/// independently optional.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct LabPanel {
    pub wbc: Option<f64>,
    pub bun: Option<f64>,
    pub creatinine: Option<f64>,
    pub gfr: Option<f64>,
    pub inr: Option<f64>,
    pub sodium: Option<f64>,
    pub potassium: Option<f64>,
    pub calcium: Option<f64>,
    pub ast: Option<f64>,
    pub alt: Option<f64>,
    pub lactate: Option<f64>,
}

impl LabPanel {
    /// Named view over all panel slots, in stable order. Used when the
    /// matcher flattens the panel into its search corpus.
    pub fn entries(&self) -> [(&'static str, Option<f64>); 11] {
        [
            ("wbc", self.wbc),
            ("bun", self.bun),
            ("creatinine", self.creatinine),
            ("gfr", self.gfr),
            ("inr", self.inr),
            ("sodium", self.sodium),
            ("potassium", self.potassium),
            ("calcium", self.calcium),
            ("ast", self.ast),
            ("alt", self.alt),
            ("lactate", self.lactate),
        ]
    }
}

/// Everything the feature extractor recovers from one note.
///
/// Boolean flags default to false when not textually evidenced; a missing
/// regex match is "not documented", never a negative assertion.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExtractedFeatures {
    /// Normalized single-line note text the features came from.
    pub raw_text: String,
    pub age: Option<u32>,
    pub gender: Gender,
    pub symptoms: Vec<String>,
    pub symptom_duration_days: Option<u32>,
    pub vitals: VitalSigns,
    /// All standalone percent tokens in the plausible SpO2 range [30, 100].
    pub spo2_values: Vec<u32>,
    pub lowest_spo2: Option<u32>,
    /// Derived: lowest SpO2 < 90.
    pub hypoxemia: bool,
    pub oxygen_requirement: bool,
    pub tachypnea: bool,
    pub labs: LabPanel,
    pub imaging_findings: Vec<String>,
    /// Derived: "bilateral" and "pneumonia" both present.
    pub bilateral_pneumonia: bool,
    pub comorbidities: Vec<String>,
    pub distress: bool,
    pub crackles: bool,
    pub dnr_dni: bool,
    pub assisted_living: bool,
    pub iv_antibiotics: bool,
    pub outpatient_failure: bool,
}

impl ExtractedFeatures {
    /// The boolean flags the matcher folds into its search corpus, paired
    /// with the token emitted when the flag is set.
    pub fn flag_tokens(&self) -> [(&'static str, bool); 9] {
        [
            ("hypoxemia", self.hypoxemia),
            ("oxygen_requirement", self.oxygen_requirement),
            ("tachypnea", self.tachypnea),
            ("bilateral_pneumonia", self.bilateral_pneumonia),
            ("iv_antibiotics", self.iv_antibiotics),
            ("dnr_dni", self.dnr_dni),
            ("assisted_living", self.assisted_living),
            ("crackles", self.crackles),
            ("distress", self.distress),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_conservative() {
        let f = ExtractedFeatures::default();
        assert_eq!(f.gender, Gender::Unknown);
        assert!(f.age.is_none());
        assert!(!f.hypoxemia);
        assert!(!f.oxygen_requirement);
        assert!(!f.outpatient_failure);
        assert!(f.symptoms.is_empty());
        assert!(f.labs.wbc.is_none());
    }

    #[test]
    fn lab_entries_cover_full_panel() {
        let labs = LabPanel { wbc: Some(12.4), ..Default::default() };
        let entries = labs.entries();
        assert_eq!(entries.len(), 11);
        assert_eq!(entries[0], ("wbc", Some(12.4)));
        assert_eq!(entries[10].0, "lactate");
    }

    #[test]
    fn flag_tokens_reflect_set_flags() {
        let f = ExtractedFeatures { hypoxemia: true, crackles: true, ..Default::default() };
        let set: Vec<&str> = f
            .flag_tokens()
            .iter()
            .filter(|(_, on)| *on)
            .map(|(name, _)| *name)
            .collect();
        assert_eq!(set, vec!["hypoxemia", "crackles"]);
    }

    #[test]
    fn gender_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Gender::Female).unwrap(), "\"female\"");
        assert_eq!(serde_json::to_string(&Gender::Unknown).unwrap(), "\"unknown\"");
    }
}
