//! Gemini REST client.

use crate::error::{Error, Result};
use crate::functions::{
    self, CATEGORIZE, Categorization, EVENT_SUMMARY, EventSummary, GENERAL_SUMMARY, GeneralSummary,
};
use crate::types::{
    Content, FunctionCallingConfig, FunctionDeclaration, GenerateContentRequest,
    GenerateContentResponse, Tool, ToolConfig,
};
use chrono::NaiveDateTime;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

const CATEGORIZE_INSTRUCTION: &str = "You are an email categorization agent. Analyze the email and determine:
1. Is this email important?
2. What category does it belong to (event or general)?

Be precise and only focus on classification.";

const GENERAL_INSTRUCTION: &str = "You are a general email summarization agent. Provide a comprehensive summary of this email's content, highlighting:
- Key points and main message
- Any action items or important information
- Context and relevance

Be concise but thorough. Use plain sentences, no markdown formatting.";

/// Gemini client bound to one API key and model.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    /// Creates a client for the public endpoint with [`DEFAULT_MODEL`].
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: build_http(DEFAULT_TIMEOUT),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Sets the model name.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Points the client at another base URL (used by tests).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.http = build_http(timeout);
        self
    }

    /// Returns the configured model.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Decides importance and category of an e-mail.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails or the model skips the function call.
    pub async fn categorize(&self, email_text: &str) -> Result<Categorization> {
        self.call(
            CATEGORIZE_INSTRUCTION.to_string(),
            email_text,
            functions::categorize_declaration(),
            CATEGORIZE,
        )
        .await
    }

    /// Extracts event details. `now` anchors relative dates such as "next Friday".
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails or the model skips the function call.
    pub async fn summarize_event(&self, email_text: &str, now: NaiveDateTime) -> Result<EventSummary> {
        let instruction = format!(
            "You are an event summarization agent. Extract all event details from this email including:
- Event name and type
- Date and time (start/end) formatted as YYYY-MM-DD HH:MM
- Summary of the event and email content

Be thorough and accurate with dates and times. Today is {}",
            now.format("%A %Y-%m-%d %H:%M")
        );
        self.call(
            instruction,
            email_text,
            functions::event_summary_declaration(),
            EVENT_SUMMARY,
        )
        .await
    }

    /// Summarizes a non-event e-mail.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails or the model skips the function call.
    pub async fn summarize_general(&self, email_text: &str) -> Result<GeneralSummary> {
        self.call(
            GENERAL_INSTRUCTION.to_string(),
            email_text,
            functions::general_summary_declaration(),
            GENERAL_SUMMARY,
        )
        .await
    }

    async fn call<T: DeserializeOwned>(
        &self,
        instruction: String,
        email_text: &str,
        declaration: FunctionDeclaration,
        function: &'static str,
    ) -> Result<T> {
        let request = GenerateContentRequest {
            system_instruction: Content::text(None, instruction),
            contents: vec![Content::text(Some("user"), email_text)],
            tools: vec![Tool {
                function_declarations: vec![declaration],
            }],
            tool_config: ToolConfig {
                function_calling_config: FunctionCallingConfig {
                    mode: "ANY",
                    allowed_function_names: vec![function],
                },
            },
        };

        let response = self
            .http
            .post(format!(
                "{}/models/{}:generateContent",
                self.base_url, self.model
            ))
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        debug!(status = status.as_u16(), function, "Received Gemini response");

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                401 | 403 => Error::Authentication(status.as_u16()),
                429 => Error::RateLimit,
                code => Error::Api {
                    status: code,
                    message,
                },
            });
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| Error::InvalidResponse(e.to_string()))?;
        let args = body
            .function_args(function)
            .ok_or(Error::NoFunctionCall(function))?;

        serde_json::from_value(args).map_err(|source| Error::InvalidArguments { function, source })
    }
}

fn build_http(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_default()
}
