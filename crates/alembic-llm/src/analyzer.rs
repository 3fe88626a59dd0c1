//! Chat-completions insight analyzer

use crate::error::{AnalyzerError, AnalyzerResult};
use crate::models::{ModelList, ModelPreference};
use crate::prompt::{strip_code_fence, truncate_chars, user_prompt, SYSTEM_PROMPT};
use alembic_config::LlmConfig;
use alembic_core::{InsightAnalyzer, InsightRecord};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// Longest error body kept in [`AnalyzerError::Status`]
const MAX_ERROR_BODY_CHARS: usize = 500;

/// Timeout for the model listing request
const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(30);

/// [`InsightAnalyzer`] over any OpenAI-compatible `/chat/completions` API.
///
/// Works with Gemini's OpenAI endpoint (the default), OpenRouter, Ollama and
/// OpenAI itself. The model is either configured or discovered once from
/// `GET /models` and reused for the lifetime of the analyzer.
pub struct ChatInsightAnalyzer {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    api_key_env: String,
    configured_model: Option<String>,
    preference: ModelPreference,
    resolved_model: OnceCell<String>,
    max_input_chars: usize,
    timeout: Duration,
}

impl ChatInsightAnalyzer {
    /// Analyzer configured from `config`, reading the key from the
    /// environment variable it names.
    pub fn from_config(config: &LlmConfig) -> Self {
        Self::new(config, config.api_key())
    }

    /// Analyzer with an explicit API key.
    pub fn new(config: &LlmConfig, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            api_key_env: config.api_key_env.clone(),
            configured_model: config.model.clone().filter(|m| !m.trim().is_empty()),
            preference: ModelPreference {
                preferred: config.preferred_models.clone(),
                fallback: config.fallback_model.clone(),
            },
            resolved_model: OnceCell::new(),
            max_input_chars: config.max_input_chars,
            timeout: config.timeout(),
        }
    }

    /// Analyze `text`, surfacing the failure cause.
    pub async fn try_analyze(&self, text: &str) -> AnalyzerResult<InsightRecord> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AnalyzerError::MissingApiKey {
                env_var: self.api_key_env.clone(),
            })?;

        let model = self.model(api_key).await;
        info!(%model, chars = text.chars().count(), "Analyzing conversation");

        let request = ChatRequest {
            model: &model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt(text, self.max_input_chars),
                },
            ],
            temperature: 0.0,
            response_format: ResponseFormat {
                r#type: "json_object",
            },
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&request)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AnalyzerError::Status {
                status: status.as_u16(),
                body: truncate_chars(&body, MAX_ERROR_BODY_CHARS).to_string(),
            });
        }

        let completion: ChatResponse = response.json().await?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(AnalyzerError::EmptyResponse)?;

        parse_record(&content)
    }

    /// Model to use for requests
    async fn model(&self, api_key: &str) -> String {
        if let Some(model) = &self.configured_model {
            return model.clone();
        }

        match self
            .resolved_model
            .get_or_try_init(|| self.discover_model(api_key))
            .await
        {
            Ok(model) => model.clone(),
            Err(e) => {
                warn!(error = %e, fallback = %self.preference.fallback, "Model discovery failed");
                self.preference.fallback.clone()
            }
        }
    }

    async fn discover_model(&self, api_key: &str) -> AnalyzerResult<String> {
        let response = self
            .client
            .get(format!("{}/models", self.base_url))
            .bearer_auth(api_key)
            .timeout(DISCOVERY_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AnalyzerError::Status {
                status: status.as_u16(),
                body: truncate_chars(&body, MAX_ERROR_BODY_CHARS).to_string(),
            });
        }

        let available = response.json::<ModelList>().await?.ids();
        let model = self.preference.choose(&available);
        debug!(available = available.len(), %model, "Resolved model");
        Ok(model)
    }
}

#[async_trait]
impl InsightAnalyzer for ChatInsightAnalyzer {
    async fn analyze(&self, text: &str) -> InsightRecord {
        match self.try_analyze(text).await {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "Analysis failed, returning processing-error record");
                InsightRecord::processing_error(e.to_string())
            }
        }
    }
}

/// Parse model output into a record, tolerating a markdown fence.
pub fn parse_record(content: &str) -> AnalyzerResult<InsightRecord> {
    Ok(serde_json::from_str(strip_code_fence(content))?)
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    r#type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fenced_record() {
        let record = parse_record(
            "```json\n{\"topic\":\"T\",\"tags\":[],\"problem_context\":\"p\",\"solution_insight\":\"s\",\"code_snippet\":null,\"blog_post\":\"b\"}\n```",
        )
        .unwrap();
        assert_eq!(record.topic, "T");
        assert!(record.code_snippet.is_none());
    }

    #[test]
    fn test_schema_mismatch_is_error() {
        assert!(matches!(
            parse_record(r#"{"title":"wrong shape"}"#),
            Err(AnalyzerError::Schema(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_key_yields_sentinel() {
        let analyzer = ChatInsightAnalyzer::new(&LlmConfig::default(), None);

        let record = analyzer.analyze("USER: hi").await;

        assert!(record.is_processing_error());
        assert!(record.solution_insight.contains("GEMINI_API_KEY"));
    }
}
