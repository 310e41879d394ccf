use serde::Serialize;

use crate::diagnostic::{
    Diagnostic, DiagnosticSeverity, E_MISSING_SECTION, E_SECTION_LIMIT, E_UNCLOSED_SECTION,
    W_EMPTY_SECTION,
};
use crate::patterns::PatternKind;
use crate::scanner::{DEFAULT_SCAN_LIMIT, ExtractError, Malformed, MalformedReason, Occurrences};
use crate::source_map::SourceMap;
use crate::span::Span;

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
}

impl ValidationReport {
    /// Errors first, then warnings, each in text order.
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.errors.iter().chain(self.warnings.iter())
    }

    /// Folds another report into this one, keeping both lists sorted by offset.
    pub fn merge(&mut self, other: ValidationReport) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
        self.errors.sort_by_key(|diag| diag.offset);
        self.warnings.sort_by_key(|diag| diag.offset);
        self.valid = self.errors.is_empty();
    }
}

/// Reports structural problems for `trigger` without replacing anything.
///
/// Known triggers are checked against their own section count; any other
/// trigger is expected to carry a single section.
pub fn validate_pattern(text: &str, trigger: &str) -> ValidationReport {
    let section_count = PatternKind::from_trigger(trigger)
        .map(PatternKind::section_count)
        .unwrap_or(1);
    validate_pattern_with(text, trigger, section_count, DEFAULT_SCAN_LIMIT)
}

/// Validates every known pattern kind and merges the results.
pub fn validate_all(text: &str, limit: usize) -> ValidationReport {
    let mut report = ValidationReport {
        valid: true,
        ..Default::default()
    };
    for kind in PatternKind::ALL {
        report.merge(validate_pattern_with(
            text,
            kind.trigger(),
            kind.section_count(),
            limit,
        ));
    }
    report
}

pub fn validate_pattern_with(
    text: &str,
    trigger: &str,
    section_count: usize,
    limit: usize,
) -> ValidationReport {
    let source_map = SourceMap::new(text);
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for occurrence in Occurrences::new(text, trigger, section_count, limit) {
        match occurrence {
            Ok(found) => {
                for (index, section) in found.sections.iter().enumerate() {
                    if section.trim().is_empty() {
                        warnings.push(Diagnostic::new(
                            found.start_index,
                            source_map.range(found.span()),
                            DiagnosticSeverity::Warning,
                            W_EMPTY_SECTION,
                            format!("section {} of `{}` is empty", index + 1, trigger),
                        ));
                    }
                }
            }
            Err(malformed) => {
                errors.push(malformed_diagnostic(
                    &source_map,
                    trigger,
                    section_count,
                    malformed,
                ));
            }
        }
    }

    ValidationReport {
        valid: errors.is_empty(),
        errors,
        warnings,
    }
}

fn malformed_diagnostic(
    source_map: &SourceMap<'_>,
    trigger: &str,
    section_count: usize,
    malformed: Malformed,
) -> Diagnostic {
    let section = malformed.section_index + 1;
    let (code, message) = match malformed.reason {
        MalformedReason::Extract(ExtractError::Unclosed { .. }) => (
            E_UNCLOSED_SECTION,
            format!("unclosed bracket in section {} of `{}`", section, trigger),
        ),
        MalformedReason::Extract(ExtractError::LimitExceeded { limit }) => (
            E_SECTION_LIMIT,
            format!(
                "section {} of `{}` has no closing bracket within {} bytes",
                section, trigger, limit
            ),
        ),
        MalformedReason::MissingSection => (
            E_MISSING_SECTION,
            format!(
                "`{}` expects {} sections but only {} found",
                trigger, section_count, malformed.section_index
            ),
        ),
    };
    let span = Span {
        start: malformed.start,
        end: malformed.stop.max(malformed.start),
    };
    Diagnostic::new(
        malformed.start,
        source_map.range(span),
        DiagnosticSeverity::Error,
        code,
        message,
    )
}

#[cfg(test)]
mod tests {
    use super::{validate_all, validate_pattern};
    use crate::diagnostic::{E_MISSING_SECTION, E_SECTION_LIMIT, E_UNCLOSED_SECTION, W_EMPTY_SECTION};

    #[test]
    fn unclosed_marker_is_an_error() {
        let report = validate_pattern("[?][cfg][unclosed", "[?]");
        assert!(!report.valid);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].code, E_UNCLOSED_SECTION);
        assert_eq!(report.errors[0].offset, 0);
        assert!(report.errors[0].message.contains("section 2"));
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn missing_second_section_is_an_error() {
        let report = validate_pattern("see [m][1] here", "[m]");
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].code, E_MISSING_SECTION);
        assert_eq!(report.errors[0].offset, 4);
        assert_eq!(report.errors[0].range.start.character, 4);
    }

    #[test]
    fn well_formed_text_is_valid() {
        let report = validate_pattern("a [+][b] c [+][d [e]]", "[+]");
        assert!(report.valid);
        assert!(report.errors.is_empty());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn empty_sections_warn_but_stay_valid() {
        let report = validate_pattern("[m][][note]", "[m]");
        assert!(report.valid);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].code, W_EMPTY_SECTION);
    }

    #[test]
    fn limit_is_reported_separately() {
        let text = format!("[+][{}", "x".repeat(20));
        let report = super::validate_pattern_with(&text, "[+]", 1, 8);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].code, E_SECTION_LIMIT);
    }

    #[test]
    fn all_kinds_merge_in_text_order() {
        let text = "[+][open\n[m][1] [?][a][b]";
        let report = validate_all(text, 10_000);
        let codes: Vec<_> = report.errors.iter().map(|diag| diag.code).collect();
        assert_eq!(codes, vec![E_UNCLOSED_SECTION, E_MISSING_SECTION]);
        assert_eq!(report.errors[1].range.start.line, 1);
    }
}
