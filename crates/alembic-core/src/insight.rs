//! Structured analysis result handed from the analyzer to the writer

use serde::{Deserialize, Serialize};

/// Topic carried by the analyzer's failure sentinel
pub const PROCESSING_ERROR_TOPIC: &str = "Processing Error";

/// Knowledge extracted from one conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightRecord {
    /// Concise title-case summary, becomes the note title
    pub topic: String,
    /// Free-form tags
    pub tags: Vec<String>,
    /// The operational problem being discussed
    pub problem_context: String,
    /// High-level resolution
    pub solution_insight: String,
    /// Checklist, recipe or code that can be reused as-is
    #[serde(default)]
    pub code_snippet: Option<String>,
    /// First-person narrative draft
    pub blog_post: String,
}

impl InsightRecord {
    /// Record returned by an analyzer when analysis failed.
    ///
    /// The pipeline treats it as a normal result so the failure is visible in
    /// the vault instead of being silently dropped.
    pub fn processing_error(description: impl Into<String>) -> Self {
        Self {
            topic: PROCESSING_ERROR_TOPIC.to_string(),
            tags: vec!["error".to_string(), "automation".to_string()],
            problem_context: "An error occurred during LLM analysis.".to_string(),
            solution_insight: description.into(),
            code_snippet: None,
            blog_post: "Analysis failed.".to_string(),
        }
    }

    /// Whether this is the failure sentinel
    pub fn is_processing_error(&self) -> bool {
        self.topic == PROCESSING_ERROR_TOPIC
    }

    /// Snippet if present and not blank
    pub fn code_snippet(&self) -> Option<&str> {
        self.code_snippet
            .as_deref()
            .filter(|snippet| !snippet.trim().is_empty())
    }
}
