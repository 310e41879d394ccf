use serde::Serialize;

use crate::scanner::{Match, Scanner};

/// The three bracket patterns the theme understands.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternKind {
    /// `[m][config][content]`
    Marginalia,
    /// `[?][actionConfig][content]`
    Interactive,
    /// `[+][content]`
    Extension,
}

impl PatternKind {
    /// Every kind, in the order validation walks them.
    pub const ALL: [PatternKind; 3] = [
        PatternKind::Marginalia,
        PatternKind::Interactive,
        PatternKind::Extension,
    ];

    pub fn trigger(self) -> &'static str {
        match self {
            PatternKind::Marginalia => "[m]",
            PatternKind::Interactive => "[?]",
            PatternKind::Extension => "[+]",
        }
    }

    pub fn section_count(self) -> usize {
        match self {
            PatternKind::Marginalia | PatternKind::Interactive => 2,
            PatternKind::Extension => 1,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PatternKind::Marginalia => "marginalia",
            PatternKind::Interactive => "interactive",
            PatternKind::Extension => "extension",
        }
    }

    pub fn from_trigger(trigger: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.trigger() == trigger)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractiveMarker<'a> {
    pub action_config: &'a str,
    pub content: &'a str,
    #[serde(flatten)]
    pub matched: Match<'a>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Marginalia<'a> {
    pub config: &'a str,
    pub content: &'a str,
    #[serde(flatten)]
    pub matched: Match<'a>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ParagraphExtension<'a> {
    pub content: &'a str,
    #[serde(flatten)]
    pub matched: Match<'a>,
}

impl Scanner {
    pub fn interactive_markers<'a>(&self, text: &'a str) -> Vec<InteractiveMarker<'a>> {
        self.find_kind(text, PatternKind::Interactive)
            .into_iter()
            .filter_map(|matched| {
                let action_config = matched.section(0)?;
                let content = matched.section(1)?;
                Some(InteractiveMarker {
                    action_config,
                    content,
                    matched,
                })
            })
            .collect()
    }

    pub fn marginalia<'a>(&self, text: &'a str) -> Vec<Marginalia<'a>> {
        self.find_kind(text, PatternKind::Marginalia)
            .into_iter()
            .filter_map(|matched| {
                let config = matched.section(0)?;
                let content = matched.section(1)?;
                Some(Marginalia {
                    config,
                    content,
                    matched,
                })
            })
            .collect()
    }

    pub fn paragraph_extensions<'a>(&self, text: &'a str) -> Vec<ParagraphExtension<'a>> {
        self.find_kind(text, PatternKind::Extension)
            .into_iter()
            .filter_map(|matched| {
                let content = matched.section(0)?;
                Some(ParagraphExtension { content, matched })
            })
            .collect()
    }

    pub fn find_kind<'a>(&self, text: &'a str, kind: PatternKind) -> Vec<Match<'a>> {
        self.find(text, kind.trigger(), kind.section_count())
    }
}

pub fn find_interactive_markers(text: &str) -> Vec<InteractiveMarker<'_>> {
    Scanner::default().interactive_markers(text)
}

pub fn find_marginalia_patterns(text: &str) -> Vec<Marginalia<'_>> {
    Scanner::default().marginalia(text)
}

pub fn find_paragraph_extensions(text: &str) -> Vec<ParagraphExtension<'_>> {
    Scanner::default().paragraph_extensions(text)
}
