//! Conversation analysis for Alembic.
//!
//! [`ChatInsightAnalyzer`] sends normalized conversation text to an
//! OpenAI-compatible chat completions endpoint and parses the reply into an
//! [`alembic_core::InsightRecord`]. Any failure becomes the processing-error
//! record so the pipeline never stalls on the model.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod analyzer;
mod error;
mod models;
pub mod prompt;

pub use analyzer::{parse_record, ChatInsightAnalyzer};
pub use error::{AnalyzerError, AnalyzerResult};
pub use models::ModelPreference;
