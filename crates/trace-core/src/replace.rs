use tracing::debug;

use crate::scanner::Match;

/// Replaces every match with the replacer's output, leaving all other text
/// untouched.
///
/// Matches are spliced from the end of the string backward, so the offsets of
/// the matches still waiting to be applied never move. A match that falls
/// outside `text` or overlaps one that was already applied is left alone.
pub fn replace_matches<'a, F>(text: &str, matches: &[Match<'a>], mut replacer: F) -> String
where
    F: FnMut(&Match<'a>) -> String,
{
    let mut ordered: Vec<&Match<'a>> = matches.iter().collect();
    ordered.sort_by(|a, b| b.start_index.cmp(&a.start_index));

    let mut out = text.to_string();
    // Everything before `untouched` still equals the input.
    let mut untouched = text.len();
    for found in ordered {
        let span = found.span();
        if span.start > span.end
            || span.end > untouched
            || !text.is_char_boundary(span.start)
            || !text.is_char_boundary(span.end)
        {
            debug!(
                start = span.start,
                end = span.end,
                "skipping match outside replaceable text"
            );
            continue;
        }
        let replacement = replacer(found);
        out.replace_range(span.start..span.end, &replacement);
        untouched = span.start;
    }
    out
}
