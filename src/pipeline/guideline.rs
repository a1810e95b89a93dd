//! Guideline document sectioning.
//!
//! Uploaded guideline documents arrive as plain text (the binary-to-text step
//! lives outside this crate). The parser slices that text into named sections
//! so the report can echo a structured preview. Evaluation itself always runs
//! against the canonical catalog; nothing here feeds the matcher.

use serde::{Deserialize, Serialize};

/// One named section of a guideline document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GuidelineSection {
    pub name: String,
    pub lines: Vec<String>,
}

/// Sectioned guideline text, in document order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GuidelineSections {
    pub sections: Vec<GuidelineSection>,
}

const ADMISSION_SECTION: &str = "admissionCriteria";
const PREVIEW_LIMIT: usize = 8_000;

impl GuidelineSections {
    /// Lines of the admission-criteria section (always present, possibly
    /// empty).
    pub fn admission_criteria(&self) -> &[String] {
        self.sections
            .iter()
            .find(|s| s.name == ADMISSION_SECTION)
            .map(|s| s.lines.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.sections.iter().all(|s| s.lines.is_empty())
    }

    /// Compact JSON preview, truncated to a bounded length for the report.
    pub fn preview(&self) -> String {
        if self.is_empty() {
            return String::new();
        }
        let rendered = serde_json::to_string(&self.sections).unwrap_or_default();
        rendered.chars().take(PREVIEW_LIMIT).collect()
    }
}

fn is_admission_header(low: &str) -> bool {
    low.contains("admission criteria")
        || low.starts_with("criteria")
        || low.contains("clinical indications")
        || low.contains("indications for admission")
        || (low.contains("criteria") && (low.contains("pneumonia") || low.contains("admission")))
}

fn is_generic_header(line: &str) -> bool {
    if line.ends_with(':') {
        return true;
    }
    let has_alpha = line.chars().any(|c| c.is_alphabetic());
    let all_upper = !line.chars().any(|c| c.is_lowercase());
    has_alpha && all_upper && line.split_whitespace().count() < 6
}

/// Split guideline text into named sections. Header lines open a section and
/// are not kept as content; everything before the first header lands in
/// "general".
pub fn parse_guideline_sections(text: &str) -> GuidelineSections {
    let mut result = GuidelineSections::default();
    let push_section = |name: &str, result: &mut GuidelineSections| -> usize {
        if let Some(idx) = result.sections.iter().position(|s| s.name == name) {
            return idx;
        }
        result.sections.push(GuidelineSection { name: name.to_string(), lines: vec![] });
        result.sections.len() - 1
    };

    let mut current = push_section("general", &mut result);

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let low = line.to_lowercase();
        if is_admission_header(&low) {
            current = push_section(ADMISSION_SECTION, &mut result);
            continue;
        }
        if is_generic_header(line) {
            let name: String = low.replace(' ', "_").chars().take(40).collect();
            current = push_section(&name, &mut result);
            continue;
        }
        result.sections[current].lines.push(line.to_string());
    }

    // The admission section always exists so downstream lookups are total.
    push_section(ADMISSION_SECTION, &mut result);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_still_has_admission_section() {
        let parsed = parse_guideline_sections("");
        assert!(parsed.admission_criteria().is_empty());
        assert!(parsed.is_empty());
        assert_eq!(parsed.preview(), "");
    }

    #[test]
    fn admission_header_collects_following_lines() {
        let text = "Community Acquired Pneumonia\n\
                    Admission Criteria\n\
                    Hypoxemia with SpO2 below 90\n\
                    Failure of outpatient therapy\n";
        let parsed = parse_guideline_sections(text);
        assert_eq!(
            parsed.admission_criteria(),
            ["Hypoxemia with SpO2 below 90", "Failure of outpatient therapy"]
        );
    }

    #[test]
    fn header_line_is_not_content() {
        let parsed = parse_guideline_sections("Admission criteria for pneumonia\nLine one\n");
        assert!(!parsed
            .admission_criteria()
            .iter()
            .any(|l| l.to_lowercase().contains("admission criteria")));
        assert_eq!(parsed.admission_criteria(), ["Line one"]);
    }

    #[test]
    fn colon_header_opens_generic_section() {
        let text = "Dosing guidance:\nUse weight-based dosing\n";
        let parsed = parse_guideline_sections(text);
        let section = parsed.sections.iter().find(|s| s.name == "dosing_guidance:").unwrap();
        assert_eq!(section.lines, ["Use weight-based dosing"]);
    }

    #[test]
    fn all_caps_short_line_opens_generic_section() {
        let text = "OVERVIEW\nThis guideline covers inpatient admission.\n";
        let parsed = parse_guideline_sections(text);
        let section = parsed.sections.iter().find(|s| s.name == "overview").unwrap();
        assert_eq!(section.lines.len(), 1);
    }

    #[test]
    fn preamble_lands_in_general() {
        let text = "Published 2024\nAdmission Criteria\nSpO2 below 90\n";
        let parsed = parse_guideline_sections(text);
        let general = parsed.sections.iter().find(|s| s.name == "general").unwrap();
        assert_eq!(general.lines, ["Published 2024"]);
    }

    #[test]
    fn preview_is_bounded() {
        let long_line = "criteria line ".repeat(2000);
        let text = format!("Admission Criteria\n{long_line}\n");
        let parsed = parse_guideline_sections(&text);
        assert!(parsed.preview().chars().count() <= 8_000);
        assert!(!parsed.preview().is_empty());
    }
}
