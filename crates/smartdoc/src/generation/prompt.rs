//! Instruction template for answer generation

use crate::error::{Error, Result};

const CONTEXT_PLACEHOLDER: &str = "{context}";
const QUESTION_PLACEHOLDER: &str = "{question}";

/// Default instruction: a document analyst that stays within the context
pub const DEFAULT_TEMPLATE: &str = r#"You are a professional document analyst. Answer the question using only the document context below.
If the answer is not in the document, say so clearly. Be concise and accurate.

Context:
{context}

Question: {question}
Analytical Answer:"#;

/// Piece of a parsed template
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Context,
    Question,
}

/// A fixed instruction string with `{context}` and `{question}` slots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    segments: Vec<Segment>,
}

impl PromptTemplate {
    /// Parse a template; both placeholders must appear at least once
    pub fn new(template: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut rest = template;

        while !rest.is_empty() {
            let next = [
                (rest.find(CONTEXT_PLACEHOLDER), CONTEXT_PLACEHOLDER, Segment::Context),
                (rest.find(QUESTION_PLACEHOLDER), QUESTION_PLACEHOLDER, Segment::Question),
            ]
            .into_iter()
            .filter_map(|(pos, placeholder, segment)| pos.map(|p| (p, placeholder, segment)))
            .min_by_key(|(pos, _, _)| *pos);

            match next {
                Some((pos, placeholder, segment)) => {
                    if pos > 0 {
                        segments.push(Segment::Literal(rest[..pos].to_string()));
                    }
                    segments.push(segment);
                    rest = &rest[pos + placeholder.len()..];
                }
                None => {
                    segments.push(Segment::Literal(rest.to_string()));
                    rest = "";
                }
            }
        }

        for (segment, placeholder) in [
            (Segment::Context, CONTEXT_PLACEHOLDER),
            (Segment::Question, QUESTION_PLACEHOLDER),
        ] {
            if !segments.contains(&segment) {
                return Err(Error::Config(format!(
                    "Prompt template is missing the {} placeholder",
                    placeholder
                )));
            }
        }

        Ok(Self { segments })
    }

    /// Fill in both slots
    ///
    /// Substituted text is inserted verbatim and never re-scanned for
    /// placeholders. Blank context or question is an error.
    pub fn render(&self, context: &str, question: &str) -> Result<String> {
        if context.trim().is_empty() {
            return Err(Error::InvalidRequest(
                "Cannot build a prompt with an empty context".to_string(),
            ));
        }
        if question.trim().is_empty() {
            return Err(Error::InvalidRequest("Question must not be empty".to_string()));
        }

        let mut prompt = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => prompt.push_str(text),
                Segment::Context => prompt.push_str(context),
                Segment::Question => prompt.push_str(question),
            }
        }

        Ok(prompt)
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE).expect("default template has both placeholders")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_template_renders() {
        let prompt = PromptTemplate::default()
            .render("The warranty lasts two years.", "How long is the warranty?")
            .unwrap();

        assert!(prompt.contains("Context:\nThe warranty lasts two years.\n"));
        assert!(prompt.contains("Question: How long is the warranty?\n"));
        assert!(prompt.ends_with("Analytical Answer:"));
    }

    #[test]
    fn test_missing_placeholder_is_rejected() {
        assert!(matches!(
            PromptTemplate::new("Answer {question} please"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            PromptTemplate::new("Context: {context}"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_placeholders_in_values_are_not_expanded() {
        let template = PromptTemplate::new("C={context} Q={question}").unwrap();
        let prompt = template.render("see {question}", "what is {context}?").unwrap();
        assert_eq!(prompt, "C=see {question} Q=what is {context}?");
    }

    #[test]
    fn test_repeated_placeholders() {
        let template = PromptTemplate::new("{question}|{context}|{question}").unwrap();
        assert_eq!(template.render("ctx", "q").unwrap(), "q|ctx|q");
    }

    #[test]
    fn test_blank_values_are_rejected() {
        let template = PromptTemplate::default();
        assert!(matches!(template.render("  ", "q"), Err(Error::InvalidRequest(_))));
        assert!(matches!(template.render("ctx", "\n"), Err(Error::InvalidRequest(_))));
    }
}
