//! Request types

use serde::{Deserialize, Serialize};

/// A question about the session's active document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    /// The question to answer
    pub question: String,
}

impl AskRequest {
    /// Create a new request
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
        }
    }

    /// Question with surrounding whitespace removed, `None` when blank
    pub fn trimmed_question(&self) -> Option<&str> {
        let question = self.question.trim();
        (!question.is_empty()).then_some(question)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_questions_are_rejected() {
        assert_eq!(AskRequest::new("  what is this?\n").trimmed_question(), Some("what is this?"));
        assert_eq!(AskRequest::new(" \t ").trimmed_question(), None);
    }
}
