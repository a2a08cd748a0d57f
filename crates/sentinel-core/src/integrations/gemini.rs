//! Google Gemini analysis advisor.
//!
//! Talks to the `generateContent` REST endpoint. Without an API key the
//! advisor reports itself unavailable and every call returns `Ok(None)`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{AdvisorStatus, AnalysisAdvisor, AnalysisRequest, CodeAnalysisRequest, SuggestionRequest};
use crate::config::GeminiConfig;
use crate::error::{ConnectorError, ConnectorResult};

const SERVICE: &str = "gemini";
const ANALYSIS_MAX_TOKENS: u32 = 1024;
const SUGGESTION_MAX_TOKENS: u32 = 2048;
const CODE_MAX_TOKENS: u32 = 2048;

/// Gemini-backed `AnalysisAdvisor`.
pub struct GeminiAdvisor {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    api_base: String,
    temperature: f32,
}

impl GeminiAdvisor {
    pub fn new(config: &GeminiConfig) -> ConnectorResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let api_key = config.api_key.clone().filter(|k| !k.trim().is_empty());
        if api_key.is_some() {
            info!(model = %config.model, "Gemini advisor configured");
        } else {
            warn!("Gemini API key not configured; AI analysis disabled");
        }

        Ok(Self {
            client,
            api_key,
            model: config.model.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            temperature: config.temperature,
        })
    }

    pub fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    async fn generate(&self, prompt: String, max_tokens: u32) -> ConnectorResult<Option<String>> {
        let Some(api_key) = &self.api_key else {
            return Ok(None);
        };

        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.api_base, self.model, api_key
        );
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                top_p: 0.95,
                top_k: 40,
                max_output_tokens: max_tokens,
            },
        };

        debug!(model = %self.model, max_tokens, "Gemini generateContent");
        let resp = self.client.post(&url).json(&body).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ConnectorError::Status {
                service: SERVICE,
                status: status.as_u16(),
                body,
            });
        }

        let data: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| ConnectorError::invalid_response(SERVICE, e.to_string()))?;

        Ok(data.first_text())
    }
}

#[async_trait]
impl AnalysisAdvisor for GeminiAdvisor {
    async fn analyze_incident(&self, request: &AnalysisRequest) -> ConnectorResult<Option<String>> {
        self.generate(analysis_prompt(request), ANALYSIS_MAX_TOKENS).await
    }

    async fn suggest_resolution(
        &self,
        request: &SuggestionRequest,
    ) -> ConnectorResult<Option<String>> {
        self.generate(suggestion_prompt(request), SUGGESTION_MAX_TOKENS)
            .await
    }

    async fn analyze_code(&self, request: &CodeAnalysisRequest) -> ConnectorResult<Option<String>> {
        self.generate(code_prompt(request), CODE_MAX_TOKENS).await
    }

    fn status(&self) -> AdvisorStatus {
        AdvisorStatus {
            available: self.is_available(),
            provider: SERVICE.to_string(),
            model: self.is_available().then(|| self.model.clone()),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Prompts
// ─────────────────────────────────────────────────────────────────────────────

fn analysis_prompt(request: &AnalysisRequest) -> String {
    let context = request
        .context
        .iter()
        .map(|(key, value)| format!("- {}: {}", key, render_value(value)))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Analyze incident:\nTitle: {}\nDescription: {}\nSeverity: {}\n{}\n\n\
         Provide: root cause, impact, priority, affected components.",
        request.title, request.description, request.severity, context
    )
}

fn suggestion_prompt(request: &SuggestionRequest) -> String {
    format!(
        "Suggest resolution:\nTitle: {}\nDescription: {}\nError: {}\n\n\
         Provide: mitigation steps, fix, testing, prevention.",
        request.title,
        request.description,
        request.error_details.as_deref().unwrap_or("N/A")
    )
}

fn code_prompt(request: &CodeAnalysisRequest) -> String {
    format!(
        "Analyze {lang} code:\n```{lang}\n{code}\n```\nContext: {context}\n\n\
         Identify: bugs, security issues, performance problems, best practices, improvements.",
        lang = request.language,
        code = request.code,
        context = request.context.as_deref().unwrap_or("None"),
    )
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GenerateResponse {
    fn first_text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content.parts.iter().map(|p| p.text.as_str()).collect();
        (!text.trim().is_empty()).then_some(text)
    }
}
