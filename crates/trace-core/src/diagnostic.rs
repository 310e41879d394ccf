use serde::Serialize;

use crate::source_map::Range;

pub const E_UNCLOSED_SECTION: &str = "E_UNCLOSED_SECTION";
pub const E_SECTION_LIMIT: &str = "E_SECTION_LIMIT";
pub const E_MISSING_SECTION: &str = "E_MISSING_SECTION";

pub const W_EMPTY_SECTION: &str = "W_EMPTY_SECTION";

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    /// Byte offset of the trigger occurrence the diagnostic is about.
    pub offset: usize,
    pub range: Range,
    pub severity: DiagnosticSeverity,
    pub code: &'static str,
    pub message: String,
}

impl Diagnostic {
    pub fn new(
        offset: usize,
        range: Range,
        severity: DiagnosticSeverity,
        code: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            offset,
            range,
            severity,
            code,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == DiagnosticSeverity::Error
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Error,
    Warning,
}

impl DiagnosticSeverity {
    pub fn label(self) -> &'static str {
        match self {
            DiagnosticSeverity::Error => "error",
            DiagnosticSeverity::Warning => "warning",
        }
    }
}
