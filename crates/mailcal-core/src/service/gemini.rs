//! Gemini adapter.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use mailcal_gemini::GeminiClient;

use super::EmailAnalyzer;
use crate::error::{Error, Result};
use crate::triage::{Category, Classification, EventExtraction, GeneralSummary};

/// [`EmailAnalyzer`] backed by Gemini function calling.
#[derive(Debug, Clone)]
pub struct GeminiAnalyzer {
    client: GeminiClient,
}

impl GeminiAnalyzer {
    /// Wraps a client.
    #[must_use]
    pub const fn new(client: GeminiClient) -> Self {
        Self { client }
    }
}

fn upstream(err: mailcal_gemini::Error) -> Error {
    Error::upstream("gemini", err)
}

#[async_trait]
impl EmailAnalyzer for GeminiAnalyzer {
    async fn categorize(&self, text: &str) -> Result<Classification> {
        let verdict = self.client.categorize(text).await.map_err(upstream)?;
        Ok(Classification {
            importance: verdict.importance,
            category: Category::parse(&verdict.category),
        })
    }

    async fn extract_event(&self, text: &str, reference: NaiveDateTime) -> Result<EventExtraction> {
        let event = self
            .client
            .summarize_event(text, reference)
            .await
            .map_err(upstream)?;
        Ok(EventExtraction {
            name: event.event_name,
            kind: event.event_type,
            start: event.event_start,
            end: event.event_end,
            summary: event.event_summary,
        })
    }

    async fn extract_general(&self, text: &str) -> Result<GeneralSummary> {
        let summary = self.client.summarize_general(text).await.map_err(upstream)?;
        Ok(GeneralSummary {
            email_summary: summary.email_summary,
        })
    }
}
