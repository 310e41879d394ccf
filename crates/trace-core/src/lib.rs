mod config;
mod diagnostic;
mod patterns;
mod process;
mod replace;
mod scanner;
mod source_map;
mod span;
mod validate;

pub use config::{ConfigError, MarginSide, ProcessorConfig};
pub use diagnostic::{
    Diagnostic, DiagnosticSeverity, E_MISSING_SECTION, E_SECTION_LIMIT, E_UNCLOSED_SECTION,
    W_EMPTY_SECTION,
};
pub use patterns::{
    InteractiveMarker, Marginalia, ParagraphExtension, PatternKind, find_interactive_markers,
    find_marginalia_patterns, find_paragraph_extensions,
};
pub use process::{MarginaliaConfig, ProcessResult, ProcessStats, Processor, parse_data_attrs};
pub use replace::replace_matches;
pub use scanner::{
    DEFAULT_SCAN_LIMIT, ExtractError, Match, Scanner, Section, extract_section,
    extract_section_within, find_pattern,
};
pub use source_map::{Position, Range, SourceMap};
pub use span::{Span, SpanError};
pub use validate::{ValidationReport, validate_all, validate_pattern, validate_pattern_with};
