use serde::Serialize;
use thiserror::Error;
use tracing::{debug, trace};

use crate::span::Span;

/// How far section extraction may scan past its opening bracket before it
/// gives up on finding the matching close.
pub const DEFAULT_SCAN_LIMIT: usize = 10_000;

/// One fully parsed occurrence of a trigger and all of its sections.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Match<'a> {
    pub full_match: &'a str,
    pub sections: Vec<&'a str>,
    pub start_index: usize,
    pub end_index: usize,
}

impl<'a> Match<'a> {
    pub fn span(&self) -> Span {
        Span {
            start: self.start_index,
            end: self.end_index,
        }
    }

    pub fn section(&self, index: usize) -> Option<&'a str> {
        self.sections.get(index).copied()
    }
}

/// Content of a single bracketed section and the offset just past its `]`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Section<'a> {
    pub content: &'a str,
    pub end: usize,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
pub enum ExtractError {
    #[error("unclosed bracket (depth {depth} at end of text)")]
    Unclosed { depth: usize },
    #[error("no closing bracket within {limit} bytes")]
    LimitExceeded { limit: usize },
}

/// Extracts the section whose opening `[` sits right before `start`, using
/// the default scan limit.
pub fn extract_section(text: &str, start: usize) -> Result<Section<'_>, ExtractError> {
    extract_section_within(text, start, DEFAULT_SCAN_LIMIT)
}

pub fn extract_section_within(
    text: &str,
    start: usize,
    limit: usize,
) -> Result<Section<'_>, ExtractError> {
    if start > text.len() || !text.is_char_boundary(start) {
        return Err(ExtractError::Unclosed { depth: 1 });
    }
    // The opening bracket has already been consumed by the caller.
    let mut depth = 1usize;
    for (distance, &byte) in text.as_bytes()[start..].iter().enumerate() {
        if distance >= limit {
            return Err(ExtractError::LimitExceeded { limit });
        }
        match byte {
            b'[' => depth += 1,
            b']' => {
                depth -= 1;
                if depth == 0 {
                    let close = start + distance;
                    return Ok(Section {
                        content: &text[start..close],
                        end: close + 1,
                    });
                }
            }
            _ => {}
        }
    }
    Err(ExtractError::Unclosed { depth })
}

/// Finds every `trigger` followed by `section_count` bracketed sections,
/// left to right, with the default scan limit.
pub fn find_pattern<'a>(text: &'a str, trigger: &str, section_count: usize) -> Vec<Match<'a>> {
    Scanner::default().find(text, trigger, section_count)
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Scanner {
    limit: usize,
}

impl Default for Scanner {
    fn default() -> Self {
        Self {
            limit: DEFAULT_SCAN_LIMIT,
        }
    }
}

impl Scanner {
    pub fn with_limit(limit: usize) -> Self {
        Self { limit }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn find<'a>(&self, text: &'a str, trigger: &str, section_count: usize) -> Vec<Match<'a>> {
        let mut matches = Vec::new();
        for occurrence in Occurrences::new(text, trigger, section_count, self.limit) {
            match occurrence {
                Ok(found) => {
                    trace!(
                        trigger,
                        start = found.start_index,
                        end = found.end_index,
                        "pattern matched"
                    );
                    matches.push(found);
                }
                Err(malformed) => {
                    debug!(
                        trigger,
                        offset = malformed.start,
                        section = malformed.section_index,
                        reason = %malformed.reason,
                        "skipping malformed pattern"
                    );
                }
            }
        }
        matches
    }
}

/// Why a trigger occurrence could not supply all of its sections.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
pub(crate) enum MalformedReason {
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error("next section does not start with `[`")]
    MissingSection,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Malformed {
    /// Offset of the trigger.
    pub start: usize,
    /// Where scanning stopped: end of text, the limit, or the character that
    /// should have opened the next section.
    pub stop: usize,
    /// Zero-based index of the section that failed.
    pub section_index: usize,
    pub reason: MalformedReason,
}

/// Walks trigger occurrences in order, yielding either a complete match or
/// the reason the occurrence was abandoned.
pub(crate) struct Occurrences<'a> {
    text: &'a str,
    opener: String,
    step: usize,
    section_count: usize,
    limit: usize,
    cursor: usize,
}

impl<'a> Occurrences<'a> {
    pub(crate) fn new(text: &'a str, trigger: &str, section_count: usize, limit: usize) -> Self {
        let mut opener = String::with_capacity(trigger.len() + 1);
        opener.push_str(trigger);
        opener.push('[');
        // A failed occurrence resumes one character past its start.
        let step = opener.chars().next().map(char::len_utf8).unwrap_or(1);
        Self {
            text,
            opener,
            step,
            section_count,
            limit,
            cursor: 0,
        }
    }

    fn abandon(&mut self, malformed: Malformed) -> Option<Result<Match<'a>, Malformed>> {
        self.cursor = malformed.start + self.step;
        Some(Err(malformed))
    }
}

impl<'a> Iterator for Occurrences<'a> {
    type Item = Result<Match<'a>, Malformed>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.section_count == 0 || self.cursor >= self.text.len() {
            return None;
        }
        let start = self.cursor + self.text[self.cursor..].find(&self.opener)?;
        let mut pos = start + self.opener.len();
        let mut sections = Vec::with_capacity(self.section_count);

        loop {
            match extract_section_within(self.text, pos, self.limit) {
                Ok(section) => {
                    sections.push(section.content);
                    pos = section.end;
                }
                Err(err) => {
                    let stop = match err {
                        ExtractError::Unclosed { .. } => self.text.len(),
                        ExtractError::LimitExceeded { limit } => (pos + limit).min(self.text.len()),
                    };
                    return self.abandon(Malformed {
                        start,
                        stop,
                        section_index: sections.len(),
                        reason: err.into(),
                    });
                }
            }
            if sections.len() == self.section_count {
                break;
            }
            if self.text.as_bytes().get(pos) != Some(&b'[') {
                return self.abandon(Malformed {
                    start,
                    stop: pos,
                    section_index: sections.len(),
                    reason: MalformedReason::MissingSection,
                });
            }
            pos += 1;
        }

        self.cursor = pos;
        Some(Ok(Match {
            full_match: &self.text[start..pos],
            sections,
            start_index: start,
            end_index: pos,
        }))
    }
}
