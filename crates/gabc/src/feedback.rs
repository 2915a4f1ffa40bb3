//! Parser feedback (warnings and notices).
//!
//! Recoverable oddities in a score (an ignored custom command, a stray
//! character, an unusual accidental) do not stop parsing. They are collected
//! here and handed back next to the score, and mirrored to `tracing`.

use serde::{Deserialize, Serialize};

/// A single diagnostic attached to a (text, music) segment of the body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub level: FeedbackLevel,
    pub message: String,
    /// Index of the segment the diagnostic belongs to (0 for header issues)
    pub segment: usize,
    pub suggestion: Option<String>,
}

impl Feedback {
    pub fn warning(message: impl Into<String>, segment: usize) -> Self {
        Feedback {
            level: FeedbackLevel::Warning,
            message: message.into(),
            segment,
            suggestion: None,
        }
    }

    pub fn info(message: impl Into<String>, segment: usize) -> Self {
        Feedback {
            level: FeedbackLevel::Info,
            message: message.into(),
            segment,
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedbackLevel {
    /// Parsed with assumptions, may not be what the author intended
    Warning,
    /// Something was deliberately skipped
    Info,
}

/// Collector for feedback during parsing
#[derive(Debug, Default)]
pub struct FeedbackCollector {
    feedback: Vec<Feedback>,
    current_segment: usize,
}

impl FeedbackCollector {
    pub fn new() -> Self {
        FeedbackCollector::default()
    }

    /// Update position tracking (call when moving to the next segment)
    pub fn set_segment(&mut self, segment: usize) {
        self.current_segment = segment;
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        let feedback = Feedback::warning(message, self.current_segment);
        tracing::warn!(segment = feedback.segment, "{}", feedback.message);
        self.feedback.push(feedback);
    }

    pub fn warning_with_suggestion(
        &mut self,
        message: impl Into<String>,
        suggestion: impl Into<String>,
    ) {
        let feedback =
            Feedback::warning(message, self.current_segment).with_suggestion(suggestion);
        tracing::warn!(segment = feedback.segment, "{}", feedback.message);
        self.feedback.push(feedback);
    }

    pub fn info(&mut self, message: impl Into<String>) {
        let feedback = Feedback::info(message, self.current_segment);
        tracing::debug!(segment = feedback.segment, "{}", feedback.message);
        self.feedback.push(feedback);
    }

    pub fn into_feedback(self) -> Vec<Feedback> {
        self.feedback
    }

    pub fn feedback(&self) -> &[Feedback] {
        &self.feedback
    }
}

/// Result of parsing with feedback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseResult<T> {
    pub value: T,
    pub feedback: Vec<Feedback>,
}

impl<T> ParseResult<T> {
    pub fn new(value: T, feedback: Vec<Feedback>) -> Self {
        ParseResult { value, feedback }
    }

    pub fn has_warnings(&self) -> bool {
        self.warnings().next().is_some()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Feedback> {
        self.feedback
            .iter()
            .filter(|f| f.level == FeedbackLevel::Warning)
    }
}
