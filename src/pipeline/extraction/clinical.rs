//! Deterministic clinical feature extraction from normalized note text.
//!
//! Every field has an independent regex or vocabulary rule against the
//! lowercased note. Rules never consult each other's output except for two
//! derived flags (hypoxemia from the lowest SpO2; bilateral pneumonia from
//! term co-occurrence). A rule with no match leaves its field at the
//! conservative default and the pipeline continues.

use std::sync::LazyLock;

use regex::Regex;

use super::types::{ExtractedFeatures, Gender, LabPanel, VitalSigns};
use crate::pipeline::normalize::normalize_note;

static AGE: LazyLock<Regex> =
    LazyLock::new(|| compile(r"\b(\d{2,3})[- ]?year[- ]?old\b"));
static DURATION_WEEKS: LazyLock<Regex> = LazyLock::new(|| compile(r"x\s*(\d+)\s*week"));
static DURATION_DAYS: LazyLock<Regex> = LazyLock::new(|| compile(r"x\s*(\d+)\s*day"));
static BLOOD_PRESSURE: LazyLock<Regex> = LazyLock::new(|| compile(r"(\d{2,3})/(\d{2,3})"));
static HEART_RATE: LazyLock<Regex> = LazyLock::new(|| compile(r"heart rate\s*(\d{2,3})"));
static RESP_RATE: LazyLock<Regex> =
    LazyLock::new(|| compile(r"\b(?:respiratory rate|rr)\s*(\d{2})"));

/// Generic percent-valued token. Shared between the SpO2 scan (range
/// [30, 100]) and the tachypnea scan (two-digit, range (10, 40)). Both scans
/// inherit the same false-positive exposure: any "NN%" in the note is a
/// candidate, whether or not it is a saturation or a respiratory rate.
/// Kept as two independently bounded rules for parity with the deployed
/// heuristics; see the duration overwrite note below for the same policy.
static PERCENT_TOKEN: LazyLock<Regex> = LazyLock::new(|| compile(r"(\d{2,3})\s*%"));
static TWO_DIGIT_PERCENT: LazyLock<Regex> = LazyLock::new(|| compile(r"\b(\d{2})\s*%"));

static OUTPATIENT_FAILURE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\bfailed outpatient\b",
        r"\bfailure of outpatient\b",
        r"\bworsen(?:ed|ing).*antibiotic\b",
        r"\bfailed.*azithromycin\b",
    ]
    .iter()
    .map(|p| compile(p))
    .collect()
});

/// Label-anchored numeric capture per lab. Lazy `.*?` lets the value sit a
/// few tokens after the label ("WBC count of 12.4"). "lactate" is textually
/// keyed to "lactic acid" because that is how the source notes spell it.
static LAB_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    vec![
        ("wbc", compile(r"\bwbc.*?(\d{1,3}\.\d+|\d{1,3})")),
        ("bun", compile(r"\bbun.*?(\d{1,3})")),
        ("creatinine", compile(r"\bcreatinine.*?(\d{1,3}\.\d+)")),
        ("gfr", compile(r"\bgfr.*?(\d{1,3})")),
        ("inr", compile(r"\binr.*?(\d\.\d+)")),
        ("sodium", compile(r"\bsodium.*?(\d{2,3})")),
        ("potassium", compile(r"\bpotassium.*?(\d\.\d+)")),
        ("calcium", compile(r"\bcalcium.*?(\d\.\d+)")),
        ("ast", compile(r"\bast.*?(\d{1,3})")),
        ("alt", compile(r"\balt.*?(\d{1,3})")),
        ("lactate", compile(r"\blactic acid.*?(\d\.\d+)")),
    ]
});

const SYMPTOM_VOCAB: [&str; 5] =
    ["cough", "shortness of breath", "fever", "chills", "chest pain"];
const IMAGING_VOCAB: [&str; 3] = ["pneumonia", "infiltrate", "bilateral"];
const COMORBIDITY_VOCAB: [&str; 6] =
    ["hypertension", "afib", "ckd", "aki", "dvt", "hypothyroidism"];
const IV_ANTIBIOTIC_MARKERS: [&str; 4] = ["vancomycin", "cefepime", "iv piggy", "iv push"];
const OXYGEN_MARKERS: [&str; 3] = ["l nasal cannula", "placed on", "o2 supplement"];

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("Invalid clinical extraction regex")
}

fn capture_u32(re: &Regex, text: &str) -> Option<u32> {
    re.captures(text).and_then(|c| c.get(1)).and_then(|m| m.as_str().parse().ok())
}

fn capture_f64(re: &Regex, text: &str) -> Option<f64> {
    re.captures(text).and_then(|c| c.get(1)).and_then(|m| m.as_str().parse().ok())
}

/// Extract the full clinical feature record from a raw note.
///
/// Best-effort and order-independent across fields; malformed numerics leave
/// their field unset rather than failing the note.
pub fn extract_clinical_features(notes: &str) -> ExtractedFeatures {
    let text = normalize_note(notes);
    let lower = text.to_lowercase();

    let age = capture_u32(&AGE, &lower);

    // Leading space guards against matching inside other words; the female
    // check runs first so "female" never satisfies the " male" probe.
    let gender = if lower.contains(" female") {
        Gender::Female
    } else if lower.contains(" male") {
        Gender::Male
    } else {
        Gender::Unknown
    };

    let symptoms: Vec<String> = SYMPTOM_VOCAB
        .iter()
        .filter(|term| lower.contains(*term))
        .map(|term| term.to_string())
        .collect();

    // Sequential evaluation: a day-count match overwrites a week-count match
    // when both are present. Known quirk of the deployed extractor, kept for
    // output compatibility.
    let mut symptom_duration_days = capture_u32(&DURATION_WEEKS, &lower).map(|w| w * 7);
    if let Some(days) = capture_u32(&DURATION_DAYS, &lower) {
        symptom_duration_days = Some(days);
    }

    let mut vitals = VitalSigns::default();
    if let Some(caps) = BLOOD_PRESSURE.captures(&lower) {
        vitals.bp_systolic = caps.get(1).and_then(|m| m.as_str().parse().ok());
        vitals.bp_diastolic = caps.get(2).and_then(|m| m.as_str().parse().ok());
    }
    vitals.heart_rate = capture_u32(&HEART_RATE, &lower);
    vitals.respiratory_rate = capture_u32(&RESP_RATE, &lower);

    let rr_candidates: Vec<u32> = TWO_DIGIT_PERCENT
        .captures_iter(&lower)
        .filter_map(|c| c.get(1).and_then(|m| m.as_str().parse::<u32>().ok()))
        .filter(|v| *v > 10 && *v < 40)
        .collect();
    let tachypnea = rr_candidates.iter().any(|v| *v >= 22);

    let spo2_values: Vec<u32> = PERCENT_TOKEN
        .captures_iter(&lower)
        .filter_map(|c| c.get(1).and_then(|m| m.as_str().parse::<u32>().ok()))
        .filter(|v| (30..=100).contains(v))
        .collect();
    let lowest_spo2 = spo2_values.iter().copied().min();
    let hypoxemia = lowest_spo2.is_some_and(|v| v < 90);

    let oxygen_requirement = OXYGEN_MARKERS.iter().any(|m| lower.contains(m));

    let mut labs = LabPanel::default();
    for (name, re) in LAB_PATTERNS.iter() {
        let value = capture_f64(re, &lower);
        match *name {
            "wbc" => labs.wbc = value,
            "bun" => labs.bun = value,
            "creatinine" => labs.creatinine = value,
            "gfr" => labs.gfr = value,
            "inr" => labs.inr = value,
            "sodium" => labs.sodium = value,
            "potassium" => labs.potassium = value,
            "calcium" => labs.calcium = value,
            "ast" => labs.ast = value,
            "alt" => labs.alt = value,
            "lactate" => labs.lactate = value,
            _ => {}
        }
    }

    let imaging_findings: Vec<String> = IMAGING_VOCAB
        .iter()
        .filter(|term| lower.contains(*term))
        .map(|term| term.to_string())
        .collect();
    let bilateral_pneumonia = lower.contains("bilateral") && lower.contains("pneumonia");

    let distress = lower.contains("moderate distress") || lower.contains("chronically ill");
    let crackles = lower.contains("crackles");
    let dnr_dni = lower.contains("dnr") || lower.contains("dni");
    let assisted_living = lower.contains("assisted living");

    let iv_antibiotics = IV_ANTIBIOTIC_MARKERS.iter().any(|m| lower.contains(m));

    let comorbidities: Vec<String> = COMORBIDITY_VOCAB
        .iter()
        .filter(|term| lower.contains(*term))
        .map(|term| term.to_string())
        .collect();

    let outpatient_failure = OUTPATIENT_FAILURE.iter().any(|re| re.is_match(&lower));

    ExtractedFeatures {
        raw_text: text,
        age,
        gender,
        symptoms,
        symptom_duration_days,
        vitals,
        spo2_values,
        lowest_spo2,
        hypoxemia,
        oxygen_requirement,
        tachypnea,
        labs,
        imaging_findings,
        bilateral_pneumonia,
        comorbidities,
        distress,
        crackles,
        dnr_dni,
        assisted_living,
        iv_antibiotics,
        outpatient_failure,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO_A: &str =
        "Patient is an 82-year-old female. Oxygen saturation dropped to 89%. \
         Placed on 2 L nasal cannula. WBC 12.4. Chest x-ray demonstrates right \
         lower lobe pneumonia. Started on IV Zosyn.";

    // =================================================================
    // DEMOGRAPHICS
    // =================================================================

    #[test]
    fn age_hyphenated() {
        let f = extract_clinical_features("82-year-old female");
        assert_eq!(f.age, Some(82));
    }

    #[test]
    fn age_spaced() {
        let f = extract_clinical_features("a 67 year old gentleman");
        assert_eq!(f.age, Some(67));
    }

    #[test]
    fn age_requires_two_digits() {
        let f = extract_clinical_features("9-year-old");
        assert_eq!(f.age, None);
    }

    #[test]
    fn gender_female_takes_precedence() {
        // "female" contains "male"; the leading-space female probe runs first.
        let f = extract_clinical_features("the female patient");
        assert_eq!(f.gender, Gender::Female);
    }

    #[test]
    fn gender_male_detected() {
        let f = extract_clinical_features("a 70-year-old male smoker");
        assert_eq!(f.gender, Gender::Male);
    }

    #[test]
    fn gender_unknown_when_absent() {
        let f = extract_clinical_features("patient presents with cough");
        assert_eq!(f.gender, Gender::Unknown);
    }

    // =================================================================
    // SYMPTOMS + DURATION
    // =================================================================

    #[test]
    fn symptoms_from_fixed_vocabulary() {
        let f = extract_clinical_features("productive cough, fever and chills, denies chest pain");
        assert_eq!(f.symptoms, vec!["cough", "fever", "chills", "chest pain"]);
    }

    #[test]
    fn duration_weeks_converted_to_days() {
        let f = extract_clinical_features("cough x 2 weeks");
        assert_eq!(f.symptom_duration_days, Some(14));
    }

    #[test]
    fn duration_days_direct() {
        let f = extract_clinical_features("fever x 5 days");
        assert_eq!(f.symptom_duration_days, Some(5));
    }

    #[test]
    fn duration_day_pattern_overwrites_week_pattern() {
        // Sequential evaluation quirk: both present, day count wins.
        let f = extract_clinical_features("cough x 2 weeks, worse x 3 days");
        assert_eq!(f.symptom_duration_days, Some(3));
    }

    // =================================================================
    // VITALS
    // =================================================================

    #[test]
    fn blood_pressure_pair() {
        let f = extract_clinical_features("BP 142/88 on arrival");
        assert_eq!(f.vitals.bp_systolic, Some(142));
        assert_eq!(f.vitals.bp_diastolic, Some(88));
    }

    #[test]
    fn heart_rate_captured() {
        let f = extract_clinical_features("heart rate 118, afebrile");
        assert_eq!(f.vitals.heart_rate, Some(118));
    }

    #[test]
    fn respiratory_rate_via_rr_label() {
        let f = extract_clinical_features("rr 24, labored");
        assert_eq!(f.vitals.respiratory_rate, Some(24));
    }

    // =================================================================
    // SPO2 / TACHYPNEA (shared percent-token scan)
    // =================================================================

    #[test]
    fn lowest_spo2_retained_and_hypoxemia_derived() {
        let f = extract_clinical_features("sats 94%, dropped to 87% overnight");
        assert_eq!(f.spo2_values, vec![94, 87]);
        assert_eq!(f.lowest_spo2, Some(87));
        assert!(f.hypoxemia);
    }

    #[test]
    fn spo2_at_90_is_not_hypoxemia() {
        let f = extract_clinical_features("oxygen saturation 90%");
        assert_eq!(f.lowest_spo2, Some(90));
        assert!(!f.hypoxemia);
    }

    #[test]
    fn percent_outside_spo2_range_ignored() {
        let f = extract_clinical_features("neutrophils 12%");
        assert!(f.spo2_values.is_empty());
        assert_eq!(f.lowest_spo2, None);
    }

    #[test]
    fn tachypnea_from_percent_scan() {
        // The tachypnea rule reuses the percent-token scan bounded to (10, 40).
        // A "24%" token trips it even when it is not a respiratory rate.
        let f = extract_clinical_features("bands 24%");
        assert!(f.tachypnea);
    }

    #[test]
    fn no_tachypnea_below_22() {
        let f = extract_clinical_features("bands 18%");
        assert!(!f.tachypnea);
    }

    // =================================================================
    // OXYGEN + ESCALATION
    // =================================================================

    #[test]
    fn oxygen_requirement_from_nasal_cannula() {
        let f = extract_clinical_features("placed on 2 L nasal cannula");
        assert!(f.oxygen_requirement);
    }

    #[test]
    fn iv_antibiotics_from_vancomycin() {
        let f = extract_clinical_features("started vancomycin and cefepime");
        assert!(f.iv_antibiotics);
    }

    #[test]
    fn outpatient_failure_from_failed_azithromycin() {
        let f = extract_clinical_features("symptoms worsened, failed outpatient azithromycin");
        assert!(f.outpatient_failure);
    }

    #[test]
    fn outpatient_failure_absent_by_default() {
        let f = extract_clinical_features("treated as outpatient with improvement");
        assert!(!f.outpatient_failure);
    }

    // =================================================================
    // LABS
    // =================================================================

    #[test]
    fn lab_panel_label_anchored() {
        let f = extract_clinical_features(
            "WBC 14.2, BUN 48, creatinine 1.8, GFR 42, INR 2.4, sodium 131, \
             potassium 3.2, calcium 8.1, AST 88, ALT 92, lactic acid 2.6",
        );
        assert_eq!(f.labs.wbc, Some(14.2));
        assert_eq!(f.labs.bun, Some(48.0));
        assert_eq!(f.labs.creatinine, Some(1.8));
        assert_eq!(f.labs.gfr, Some(42.0));
        assert_eq!(f.labs.inr, Some(2.4));
        assert_eq!(f.labs.sodium, Some(131.0));
        assert_eq!(f.labs.potassium, Some(3.2));
        assert_eq!(f.labs.calcium, Some(8.1));
        assert_eq!(f.labs.ast, Some(88.0));
        assert_eq!(f.labs.alt, Some(92.0));
        assert_eq!(f.labs.lactate, Some(2.6));
    }

    #[test]
    fn lactate_keyed_to_lactic_acid_label() {
        let f = extract_clinical_features("lactate 3.1");
        assert_eq!(f.labs.lactate, None);
        let f = extract_clinical_features("lactic acid 3.1");
        assert_eq!(f.labs.lactate, Some(3.1));
    }

    #[test]
    fn absent_labs_stay_unset() {
        let f = extract_clinical_features("no labs drawn");
        assert_eq!(f.labs, LabPanel::default());
    }

    // =================================================================
    // IMAGING + EXAM + COMORBIDITIES
    // =================================================================

    #[test]
    fn imaging_vocabulary_and_bilateral_flag() {
        let f = extract_clinical_features("CXR shows bilateral infiltrates concerning for pneumonia");
        assert_eq!(f.imaging_findings, vec!["pneumonia", "infiltrate", "bilateral"]);
        assert!(f.bilateral_pneumonia);
    }

    #[test]
    fn bilateral_without_pneumonia_not_flagged() {
        let f = extract_clinical_features("bilateral lower extremity edema");
        assert!(!f.bilateral_pneumonia);
        assert_eq!(f.imaging_findings, vec!["bilateral"]);
    }

    #[test]
    fn exam_flags() {
        let f = extract_clinical_features(
            "chronically ill appearing, crackles at the bases, DNR/DNI, resides in assisted living",
        );
        assert!(f.distress);
        assert!(f.crackles);
        assert!(f.dnr_dni);
        assert!(f.assisted_living);
    }

    #[test]
    fn comorbidities_from_fixed_vocabulary() {
        let f = extract_clinical_features("history of hypertension, afib and CKD");
        assert_eq!(f.comorbidities, vec!["hypertension", "afib", "ckd"]);
    }

    // =================================================================
    // SCENARIOS + EDGE CASES
    // =================================================================

    #[test]
    fn scenario_a_full_record() {
        let f = extract_clinical_features(SCENARIO_A);
        assert_eq!(f.age, Some(82));
        assert_eq!(f.gender, Gender::Female);
        assert_eq!(f.lowest_spo2, Some(89));
        assert!(f.hypoxemia);
        assert!(f.oxygen_requirement);
        assert!(f.imaging_findings.contains(&"pneumonia".to_string()));
        assert_eq!(f.labs.wbc, Some(12.4));
    }

    #[test]
    fn empty_note_yields_defaults() {
        let f = extract_clinical_features("");
        assert_eq!(f, ExtractedFeatures::default());
    }

    #[test]
    fn garbage_input_never_panics() {
        let f = extract_clinical_features("%%%% 9999/0 \u{200b}\u{fffd} x week old");
        assert!(!f.hypoxemia);
        assert_eq!(f.age, None);
    }

    #[test]
    fn extraction_is_idempotent() {
        let a = extract_clinical_features(SCENARIO_A);
        let b = extract_clinical_features(SCENARIO_A);
        assert_eq!(a, b);
    }
}
