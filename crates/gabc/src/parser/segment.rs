//! Splits a gabc document into header and body, and the body into
//! (text, music) segments.

use crate::error::GabcError;
use crate::feedback::FeedbackCollector;

/// Lyric text followed by the music span in parentheses after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub music: String,
}

/// Split on the first line that is exactly `%%`.
pub fn split_document<'a>(input: &'a str, collector: &mut FeedbackCollector) -> (&'a str, &'a str) {
    let mut offset = 0;
    for line in input.split_inclusive('\n') {
        if line.trim_end() == "%%" {
            return (&input[..offset], &input[offset + line.len()..]);
        }
        offset += line.len();
    }
    collector.warning_with_suggestion(
        "No '%%' line between header and body, reading everything as body",
        "Add a line containing only %% after the header",
    );
    ("", input)
}

/// Drop `%` comments and fold the body onto one line.
///
/// A commented line loses its newline along with the comment.
pub fn strip_comments(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    for line in body.split_inclusive('\n') {
        match line.find('%') {
            Some(pos) => out.push_str(&line[..pos]),
            None => {
                let content = line.trim_end_matches(['\n', '\r']);
                out.push_str(content);
                if content.len() != line.len() {
                    out.push(' ');
                }
            }
        }
    }
    out.retain(|c| c != '\r');
    out
}

/// Cut the body into segments, removing `[...]` custom commands from music.
pub fn segments(body: &str, collector: &mut FeedbackCollector) -> Result<Vec<Segment>, GabcError> {
    let mut segments = Vec::new();
    let mut rest = body;

    while !rest.is_empty() {
        collector.set_segment(segments.len());
        let Some(open) = rest.find(['(', ')']) else {
            if !rest.trim().is_empty() {
                collector.warning(format!("Text '{}' has no music and is dropped", rest.trim()));
            }
            break;
        };
        if rest[open..].starts_with(')') {
            return Err(GabcError::malformed(format!(
                "')' without matching '(' after '{}'",
                rest[..open].trim()
            )));
        }

        let text = &rest[..open];
        let after = &rest[open + 1..];
        let close = after
            .find(['(', ')'])
            .ok_or_else(|| GabcError::malformed(format!("unclosed '(' after '{}'", text.trim())))?;
        if after[close..].starts_with('(') {
            return Err(GabcError::malformed(format!(
                "nested '(' in music '{}'",
                &after[..close]
            )));
        }

        let music = strip_commands(&after[..close], collector)?;
        segments.push(Segment {
            text: text.chars().filter(|&c| c != '{' && c != '}').collect(),
            music,
        });
        rest = &after[close + 1..];
    }

    Ok(segments)
}

fn strip_commands(music: &str, collector: &mut FeedbackCollector) -> Result<String, GabcError> {
    let mut out = String::with_capacity(music.len());
    let mut rest = music;
    while let Some(open) = rest.find(['[', ']']) {
        if rest[open..].starts_with(']') {
            return Err(GabcError::malformed(format!("']' without matching '[' in '{}'", music)));
        }
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let close = after
            .find(']')
            .ok_or_else(|| GabcError::malformed(format!("unclosed '[' in '{}'", music)))?;
        collector.info(format!("Custom command [{}] ignored", &after[..close]));
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    Ok(out)
}
