//! Inline prosody tags understood by animated speech.
//!
//! Tags are written between backslashes, e.g. `\style=joyful\ Bravo! \pau=400\`.

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Style(String),
    /// Pause in milliseconds.
    Pause(u32),
    /// Speaking rate in percent.
    Speed(u32),
    /// A tag this crate does not interpret, kept verbatim.
    Other(String),
}

fn parse_tag(tag: &str) -> Segment {
    match tag.split_once('=') {
        Some(("style", name)) if !name.is_empty() => Segment::Style(name.to_string()),
        Some(("pau", ms)) => ms
            .parse()
            .map(Segment::Pause)
            .unwrap_or_else(|_| Segment::Other(tag.to_string())),
        Some(("rspd", pct)) => pct
            .parse()
            .map(Segment::Speed)
            .unwrap_or_else(|_| Segment::Other(tag.to_string())),
        _ => Segment::Other(tag.to_string()),
    }
}

fn push_text(out: &mut Vec<Segment>, text: &str) {
    let text = text.trim();
    if !text.is_empty() {
        out.push(Segment::Text(text.to_string()));
    }
}

/// Splits `input` into text runs and tags.
///
/// An unterminated tag is kept as text.
pub fn parse_markup(input: &str) -> Vec<Segment> {
    let mut out = Vec::new();
    let mut rest = input;
    while let Some(start) = rest.find('\\') {
        let after = &rest[start + 1..];
        let Some(len) = after.find('\\') else {
            break;
        };
        push_text(&mut out, &rest[..start]);
        out.push(parse_tag(&after[..len]));
        rest = &after[len + 1..];
    }
    push_text(&mut out, rest);
    out
}

/// The spoken words without any tags.
pub fn plain_text(input: &str) -> String {
    parse_markup(input)
        .into_iter()
        .filter_map(|s| match s {
            Segment::Text(t) => Some(t),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Total time spent in explicit pauses.
pub fn pause_ms(segments: &[Segment]) -> u32 {
    segments
        .iter()
        .map(|s| match s {
            Segment::Pause(ms) => *ms,
            _ => 0,
        })
        .sum()
}
