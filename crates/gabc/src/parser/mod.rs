//! gabc parser.
//!
//! Header fields are read with winnow, the body is cut into (text, music)
//! segments, and each segment's signs are fed to the score builder in
//! order. Recoverable problems become feedback; anything that leaves the
//! graph inconsistent aborts with a [`GabcError`].

pub mod header;
pub mod segment;
pub mod sign;

use tracing::info;

use crate::builder::ScoreBuilder;
use crate::error::GabcError;
use crate::feedback::{FeedbackCollector, ParseResult};
use crate::score::Score;
use crate::ParseOptions;

/// Parse a gabc document into a score graph.
pub fn parse(input: &str, options: &ParseOptions) -> Result<ParseResult<Score>, GabcError> {
    let mut collector = FeedbackCollector::new();

    let (head, body) = segment::split_document(input, &mut collector);
    let header = header::parse_header(head);
    let body = segment::strip_comments(body);
    let segments = segment::segments(&body, &mut collector)?;

    let mut builder = ScoreBuilder::new(options, &mut collector);
    for (index, segment) in segments.iter().enumerate() {
        builder.push_segment(index, segment)?;
    }
    let score = builder.finish(header);

    info!(
        title = %score.title,
        words = score.words.len(),
        notes = score.notes().count(),
        transposition = score.transposition.value(),
        "parsed score"
    );

    Ok(ParseResult::new(score, collector.into_feedback()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::FeedbackLevel;
    use crate::score::OfficePart;

    #[test]
    fn test_parse_document() {
        let input = "name: Ave;\noffice-part: Antienne;\n%%\n(c4) A(g)ve(hi) (::)\n";
        let result = parse(input, &ParseOptions::default()).unwrap();
        assert_eq!(result.value.title, "Ave");
        assert_eq!(result.value.header.office_part, OfficePart::Antiphona);
        assert_eq!(result.value.notes().count(), 3);
        assert!(!result.has_warnings());
    }

    #[test]
    fn test_manual_title_wins() {
        let options = ParseOptions {
            title: Some("Other".to_string()),
            ..ParseOptions::default()
        };
        let result = parse("name: Ave;\n%%\n(c4) A(g)", &options).unwrap();
        assert_eq!(result.value.title, "Other");
    }

    #[test]
    fn test_default_title() {
        let result = parse("%%\n(c4) A(g)", &ParseOptions::default()).unwrap();
        assert_eq!(result.value.title, "Cantus");
    }

    #[test]
    fn test_trailing_clef_warns() {
        let result = parse("%%\n(c4) A(g) (c3)", &ParseOptions::default()).unwrap();
        let warnings: Vec<_> = result.warnings().collect();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].level, FeedbackLevel::Warning);
        assert!(warnings[0].message.contains("c3"));
    }

    #[test]
    fn test_comments_ignored() {
        let input = "%%\n(c4) A(g) % (h)\nB(i)";
        let result = parse(input, &ParseOptions::default()).unwrap();
        assert_eq!(result.value.notes().count(), 2);
    }
}
