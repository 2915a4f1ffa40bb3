//! Fatal parse errors.
//!
//! Anything recoverable goes through [`crate::feedback`] instead; these
//! abort construction of the score.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GabcError {
    /// Structurally broken input: unbalanced delimiters, bad clef codes.
    #[error("malformed input: {message}")]
    MalformedInput { message: String },

    /// Well-delimited input whose signs cannot be combined.
    #[error("syntax error in syllable {segment}: {message}")]
    Syntax { message: String, segment: usize },
}

impl GabcError {
    pub fn malformed(message: impl Into<String>) -> Self {
        GabcError::MalformedInput {
            message: message.into(),
        }
    }

    pub fn syntax(message: impl Into<String>, segment: usize) -> Self {
        GabcError::Syntax {
            message: message.into(),
            segment,
        }
    }
}
