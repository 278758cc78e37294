//! Query and answer payloads shared by both request paths.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

/// A question asked about the documents under `base_path`.
///
/// Serialises as the body of the non-streaming request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaQuery {
    base_path: Utf8PathBuf,
    question: String,
}

impl QaQuery {
    /// Creates a query.
    #[must_use]
    pub fn new(base_path: impl Into<Utf8PathBuf>, question: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            question: question.into(),
        }
    }

    /// Returns the indexed folder the question is about.
    #[must_use]
    pub fn base_path(&self) -> &Utf8Path {
        &self.base_path
    }

    /// Returns the question text.
    #[must_use]
    pub fn question(&self) -> &str {
        &self.question
    }
}

/// Body of a non-streaming answer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QaAnswer {
    #[serde(default)]
    answer: Option<String>,
}

impl QaAnswer {
    /// Creates an answer carrying `text`.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            answer: Some(text.into()),
        }
    }

    /// Creates an answer without an `answer` field.
    #[must_use]
    pub const fn missing() -> Self {
        Self { answer: None }
    }

    /// Returns the answer text; an empty answer counts as absent.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.answer.as_deref().filter(|text| !text.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::{Value, json};

    #[test]
    fn query_serialises_as_fallback_body() {
        let query = QaQuery::new("/docs/reports", "What changed?");

        let body = serde_json::to_value(&query).expect("query should serialise");

        assert_eq!(
            body,
            json!({"base_path": "/docs/reports", "question": "What changed?"})
        );
    }

    #[rstest]
    #[case(json!({"answer": "42"}), Some("42"))]
    #[case(json!({"answer": ""}), None)]
    #[case(json!({"answer": null}), None)]
    #[case(json!({}), None)]
    fn answer_text_treats_empty_as_absent(#[case] body: Value, #[case] expected: Option<&str>) {
        let answer: QaAnswer = serde_json::from_value(body).expect("answer should decode");

        assert_eq!(answer.text(), expected);
    }
}
