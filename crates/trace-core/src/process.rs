use ammonia::Builder;
use once_cell::sync::Lazy;
use serde::Serialize;
use tracing::{debug, trace};

use crate::config::{MarginSide, ProcessorConfig};
use crate::patterns::PatternKind;
use crate::replace::replace_matches;
use crate::scanner::{Match, Scanner};

/// Content nested deeper than this is inserted without further rendering.
const MAX_NESTING: usize = 8;

/// Allow-list for section content: ammonia's defaults plus the markup the
/// processor itself generates.
static SANITIZER: Lazy<Builder<'static>> = Lazy::new(|| {
    let mut builder = Builder::default();
    builder
        .add_tags(&["button"])
        .add_generic_attributes(&[
            "class",
            "id",
            "role",
            "hidden",
            "tabindex",
            "aria-controls",
            "aria-expanded",
            "type",
        ])
        .add_generic_attribute_prefixes(&["data-"]);
    builder
});

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct ProcessStats {
    pub marginalia: usize,
    pub interactive: usize,
    pub extensions: usize,
}

impl ProcessStats {
    pub fn total(&self) -> usize {
        self.marginalia + self.interactive + self.extensions
    }

    fn bump(&mut self, kind: PatternKind) -> usize {
        let counter = match kind {
            PatternKind::Marginalia => &mut self.marginalia,
            PatternKind::Interactive => &mut self.interactive,
            PatternKind::Extension => &mut self.extensions,
        };
        *counter += 1;
        *counter
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ProcessResult {
    pub html: String,
    pub stats: ProcessStats,
}

/// Turns bracket patterns in an HTML fragment into theme markup.
#[derive(Clone, Debug)]
pub struct Processor {
    config: ProcessorConfig,
    scanner: Scanner,
}

impl Default for Processor {
    fn default() -> Self {
        Self::new(ProcessorConfig::default())
    }
}

impl Processor {
    pub fn new(config: ProcessorConfig) -> Self {
        let scanner = config.scanner();
        Self { config, scanner }
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    pub fn process(&self, html: &str) -> ProcessResult {
        let mut stats = ProcessStats::default();
        let html = self.render_text(html, 0, &mut stats);
        debug!(
            marginalia = stats.marginalia,
            interactive = stats.interactive,
            extensions = stats.extensions,
            "processed fragment"
        );
        ProcessResult { html, stats }
    }

    /// Renders one nesting level. Only the source text is scanned, never
    /// generated markup; patterns inside another match are left to the
    /// recursive content render.
    fn render_text(&self, text: &str, depth: usize, stats: &mut ProcessStats) -> String {
        let found = self.outermost_matches(text);
        if found.is_empty() {
            return text.to_string();
        }
        debug!(count = found.len(), depth, "rendering level");

        // Render front to back so numbering follows the text, then splice.
        let rendered: Vec<String> = found
            .iter()
            .map(|(kind, matched)| self.render_match(*kind, matched, depth, stats))
            .collect();
        let matches: Vec<Match<'_>> = found.into_iter().map(|(_, matched)| matched).collect();
        replace_matches(text, &matches, |found| {
            matches
                .binary_search_by_key(&found.start_index, |candidate| candidate.start_index)
                .ok()
                .and_then(|index| rendered.get(index).cloned())
                .unwrap_or_else(|| found.full_match.to_string())
        })
    }

    /// Matches of every enabled kind in text order, minus those that start
    /// inside an earlier match.
    fn outermost_matches<'a>(&self, text: &'a str) -> Vec<(PatternKind, Match<'a>)> {
        let mut candidates: Vec<(PatternKind, Match<'a>)> = PatternKind::ALL
            .into_iter()
            .filter(|kind| self.config.enabled(*kind))
            .flat_map(|kind| {
                self.scanner
                    .find_kind(text, kind)
                    .into_iter()
                    .map(move |found| (kind, found))
            })
            .collect();
        candidates.sort_by(|(_, a), (_, b)| {
            a.start_index
                .cmp(&b.start_index)
                .then(b.end_index.cmp(&a.end_index))
        });

        let mut covered = 0;
        let mut outermost = Vec::with_capacity(candidates.len());
        for (kind, found) in candidates {
            if found.start_index < covered {
                trace!(
                    kind = kind.name(),
                    start = found.start_index,
                    "nested match left to its parent"
                );
                continue;
            }
            covered = found.end_index;
            outermost.push((kind, found));
        }
        outermost
    }

    fn render_match(
        &self,
        kind: PatternKind,
        found: &Match<'_>,
        depth: usize,
        stats: &mut ProcessStats,
    ) -> String {
        let number = stats.bump(kind);
        let last = found.sections.len().saturating_sub(1);
        let config = if kind.section_count() > 1 {
            found.section(0).unwrap_or_default()
        } else {
            ""
        };
        let content = self.render_content(found.section(last).unwrap_or_default(), depth, stats);
        match kind {
            PatternKind::Marginalia => self.marginalia_html(number, config, &content),
            PatternKind::Interactive => self.interactive_html(number, config, &content),
            PatternKind::Extension => self.extension_html(number, &content),
        }
    }

    fn render_content(&self, content: &str, depth: usize, stats: &mut ProcessStats) -> String {
        let content = if self.config.sanitize {
            SANITIZER.clean(content).to_string()
        } else {
            content.to_string()
        };
        if depth + 1 >= MAX_NESTING {
            return content;
        }
        self.render_text(&content, depth + 1, stats)
    }

    fn marginalia_html(&self, number: usize, config: &str, content: &str) -> String {
        let prefix = &self.config.class_prefix;
        let note = MarginaliaConfig::parse(config, self.config.marginalia_side);
        let id = format!("{}marginalia-{}", prefix, number);
        format!(
            "<sup class=\"{p}marginalia-anchor\"><a href=\"#{id}\">{n}</a></sup>\
<span class=\"{p}marginalia {p}marginalia-voice-{v} {p}marginalia-{side}\" id=\"{id}\" role=\"note\" data-voice=\"{v}\"{attrs}>{content}</span>",
            p = prefix,
            id = id,
            n = number,
            v = note.voice,
            side = note.side.as_str(),
            attrs = data_attrs(&note.attrs),
            content = content,
        )
    }

    fn interactive_html(&self, number: usize, config: &str, content: &str) -> String {
        let prefix = &self.config.class_prefix;
        let attrs = parse_data_attrs(config);
        let id = format!("{}interactive-{}", prefix, number);
        format!(
            "<span class=\"{p}interactive-marker\" role=\"button\" tabindex=\"0\" aria-controls=\"{id}\"{attrs}>?</span>\
<span class=\"{p}interactive-content\" id=\"{id}\" hidden>{content}</span>",
            p = prefix,
            id = id,
            attrs = data_attrs(&attrs),
            content = content,
        )
    }

    fn extension_html(&self, number: usize, content: &str) -> String {
        let prefix = &self.config.class_prefix;
        let id = format!("{}extension-{}", prefix, number);
        format!(
            "<span class=\"{p}paragraph-extension\">\
<button type=\"button\" class=\"{p}extension-toggle\" aria-expanded=\"false\" aria-controls=\"{id}\">+</button>\
<span class=\"{p}extension-content\" id=\"{id}\" hidden>{content}</span></span>",
            p = prefix,
            id = id,
            content = content,
        )
    }
}

/// Parsed `[m]` config: `voice`, margin side, and any extra `key:value` pairs.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MarginaliaConfig {
    pub voice: u32,
    pub side: MarginSide,
    pub attrs: Vec<(String, String)>,
}

impl MarginaliaConfig {
    /// Voices are numbered from 1; a voice of `0`, bare or as `voice:0`,
    /// reads as voice 1.
    pub fn parse(raw: &str, default_side: MarginSide) -> Self {
        let mut voice = 1;
        let mut side = default_side;
        let mut rest = Vec::new();
        for token in raw.split('|').map(str::trim).filter(|token| !token.is_empty()) {
            if let Ok(number) = token.parse::<u32>() {
                voice = number.max(1);
            } else if let Some(parsed) = MarginSide::from_token(token) {
                side = parsed;
            } else {
                rest.push(token);
            }
        }

        let mut attrs = Vec::new();
        for (key, value) in parse_data_attrs(&rest.join("|")) {
            match key.as_str() {
                "voice" => {
                    if let Ok(number) = value.parse::<u32>() {
                        voice = number.max(1);
                    }
                }
                "side" => {
                    if let Some(parsed) = MarginSide::from_token(&value) {
                        side = parsed;
                    }
                }
                _ => attrs.push((key, value)),
            }
        }
        Self { voice, side, attrs }
    }
}

/// Splits `key:value|flag` into attribute pairs. Keys are lowercased and
/// reduced to `[a-z0-9-]`; a repeated key keeps its first position and its
/// last value.
pub fn parse_data_attrs(raw: &str) -> Vec<(String, String)> {
    let mut attrs: Vec<(String, String)> = Vec::new();
    for entry in raw.split('|') {
        let (key, value) = match entry.split_once(':') {
            Some((key, value)) => (key, value.trim()),
            None => (entry, "true"),
        };
        let key: String = key
            .trim()
            .chars()
            .filter(|ch| ch.is_ascii_alphanumeric() || *ch == '-')
            .map(|ch| ch.to_ascii_lowercase())
            .collect();
        if key.is_empty() {
            continue;
        }
        match attrs.iter_mut().find(|(existing, _)| *existing == key) {
            Some(slot) => slot.1 = value.to_string(),
            None => attrs.push((key, value.to_string())),
        }
    }
    attrs
}

fn data_attrs(attrs: &[(String, String)]) -> String {
    attrs
        .iter()
        .map(|(key, value)| format!(" data-{}=\"{}\"", key, escape_attr(value)))
        .collect()
}

fn escape_attr(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}
