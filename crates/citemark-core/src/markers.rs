//! Inline citation markers in generated text
//!
//! Two marker forms appear in report drafts and are matched by separate
//! patterns. Validation looks at bare `[[ID]]` markers; repair only touches
//! the linked form `[[ID]](#ref-<tool>-<n>)` that the report renderer emits.
//! Keep them separate: folding them together changes what repair strips.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

/// `[[ID]]`
pub static REFERENCE_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\[([A-Z]+-\d+-?\d*)\]\]").expect("valid marker pattern"));

/// `[[ID]](#ref-<tool>-<n>)`
pub static LINKED_REFERENCE_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[\[([A-Z]+-\d+-?\d*)\]\]\(#ref-[a-z]+-\d+-?\d*\)")
        .expect("valid linked marker pattern")
});

/// Outcome of checking the markers in a text against the store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Known ids, in order of appearance (repeats kept)
    pub valid_citations: Vec<String>,
    /// Unknown ids, in order of appearance (repeats kept)
    pub invalid_citations: Vec<String>,
    pub is_valid: bool,
    pub total_found: usize,
}

/// Ids referenced by `[[ID]]` markers, in order of appearance
pub fn find_references(text: &str) -> Vec<&str> {
    REFERENCE_MARKER
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect()
}

/// Partition the markers of `text` with a membership test
pub fn validate_with<F>(text: &str, exists: F) -> ValidationReport
where
    F: Fn(&str) -> bool,
{
    let found = find_references(text);
    let (valid, invalid): (Vec<&str>, Vec<&str>) =
        found.iter().copied().partition(|id| exists(id));

    ValidationReport {
        is_valid: invalid.is_empty(),
        total_found: found.len(),
        valid_citations: valid.into_iter().map(str::to_string).collect(),
        invalid_citations: invalid.into_iter().map(str::to_string).collect(),
    }
}

/// Remove linked markers whose id fails the membership test
pub fn strip_unknown_links<F>(text: &str, exists: F) -> String
where
    F: Fn(&str) -> bool,
{
    LINKED_REFERENCE_MARKER
        .replace_all(text, |caps: &Captures| {
            if exists(&caps[1]) {
                caps[0].to_string()
            } else {
                String::new()
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known(id: &str) -> bool {
        matches!(id, "CIT-1-01" | "PLAN-02")
    }

    #[test]
    fn test_validate_partitions_in_order() {
        let report = validate_with("see [[CIT-1-01]] and [[CIT-9-99]]", known);
        assert_eq!(report.valid_citations, vec!["CIT-1-01"]);
        assert_eq!(report.invalid_citations, vec!["CIT-9-99"]);
        assert!(!report.is_valid);
        assert_eq!(report.total_found, 2);
    }

    #[test]
    fn test_validate_empty_text() {
        let report = validate_with("no markers here [CIT-1-01]", known);
        assert!(report.is_valid);
        assert_eq!(report.total_found, 0);
    }

    #[test]
    fn test_validate_matches_plan_ids_and_linked_form() {
        let report = validate_with("[[PLAN-02]](#ref-rag-1) [[PLAN-02]]", known);
        assert_eq!(report.valid_citations, vec!["PLAN-02", "PLAN-02"]);
        assert!(report.is_valid);
    }

    #[test]
    fn test_strip_unknown_links_only() {
        let text = "A [[CIT-1-01]](#ref-rag-1-01) B [[CIT-9-99]](#ref-web-9-99) C [[CIT-9-99]]";
        assert_eq!(
            strip_unknown_links(text, known),
            "A [[CIT-1-01]](#ref-rag-1-01) B  C [[CIT-9-99]]"
        );
    }

    #[test]
    fn test_strip_requires_lowercase_letter_anchor() {
        // Underscored tool names do not match the anchor pattern and are left alone
        let text = "[[CIT-9-99]](#ref-web_search-9-99)";
        assert_eq!(strip_unknown_links(text, known), text);
    }
}
