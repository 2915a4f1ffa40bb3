//! Lyric text cleanup and alert scanning.
//!
//! gabc syllables carry a small tag language: `<i>`, `<b>`, `<u>`, `<c>` and
//! `<e>` for styling, `<v>` for verbatim TeX, and `<sp>` for liturgical
//! specials such as ℟ and ℣.

const STYLE_TAGS: [&str; 5] = ["i", "b", "u", "c", "e"];

const SPECIALS: [(&str, &str); 16] = [
    ("R/", "℟"),
    ("V/", "℣"),
    ("ae", "æ"),
    ("'ae", "ǽ"),
    ("'æ", "ǽ"),
    ("AE", "Æ"),
    ("'AE", "Ǽ"),
    ("'Æ", "Ǽ"),
    ("oe", "œ"),
    ("'oe", "œ́"),
    ("'œ", "œ́"),
    ("OE", "Œ"),
    ("'OE", "Œ́"),
    ("'Œ", "Œ́"),
    ("+", "†"),
    ("*", "✠"),
];

/// Strip styling tags, drop `<v>` spans and expand `<sp>` specials.
pub fn clean(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        let Some(close) = tail.find('>') else {
            out.push_str(tail);
            return out;
        };
        let tag = &tail[1..close];
        let after = &tail[close + 1..];
        rest = match tag {
            "v" | "sp" => {
                let end_tag = format!("</{}>", tag);
                match after.find(&end_tag) {
                    Some(end) => {
                        if tag == "sp" {
                            out.push_str(special(&after[..end]));
                        }
                        &after[end + end_tag.len()..]
                    }
                    None => after,
                }
            }
            t if is_style_tag(t) => after,
            _ => {
                out.push_str(&tail[..=close]);
                after
            }
        };
    }
    out.push_str(rest);
    out
}

fn is_style_tag(tag: &str) -> bool {
    let name = tag.strip_prefix('/').unwrap_or(tag);
    STYLE_TAGS.contains(&name)
}

fn special(code: &str) -> &str {
    SPECIALS
        .iter()
        .find(|(k, _)| *k == code)
        .map_or(code, |(_, v)| *v)
}

/// Alerts that occur in `text`, in the order they were given.
pub fn find_alerts<'a>(text: &str, alerts: &'a [String]) -> Vec<&'a str> {
    alerts
        .iter()
        .filter(|a| !a.is_empty() && text.contains(a.as_str()))
        .map(String::as_str)
        .collect()
}
