use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use crate::contract::model::{Event, TimeContext};
use crate::domain::error::DomainError;
use crate::domain::ports::TitleSuggester;
use crate::domain::suggestion::build_prompt;

const SERVICE: &str = "suggestions";

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

impl GenerateResponse {
    fn first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()
            .map(|p| p.text)
    }
}

/// Title generation over the Generative Language REST API:
/// `POST <base>/v1beta/models/<model>:generateContent?key=<key>`.
///
/// No deadline here; the suggestion service owns the timeout.
pub struct GeminiSuggester {
    client: reqwest::Client,
    base: Url,
    model: String,
    api_key: String,
    max_context_events: usize,
}

impl GeminiSuggester {
    pub fn new(
        base: Url,
        model: impl Into<String>,
        api_key: impl Into<String>,
        max_context_events: usize,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base,
            model: model.into(),
            api_key: api_key.into(),
            max_context_events,
        }
    }

    fn endpoint(&self) -> Result<Url, DomainError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| DomainError::external(SERVICE, "invalid suggestion base URL"))?
            .pop_if_empty()
            .extend(&["v1beta", "models", &format!("{}:generateContent", self.model)]);
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url)
    }
}

#[async_trait]
impl TitleSuggester for GeminiSuggester {
    #[instrument(
        name = "event_tracker.http.suggestions.generate",
        skip_all,
        fields(model = %self.model, recent = recent.len())
    )]
    async fn suggest(
        &self,
        recent: &[Event],
        time_context: TimeContext,
        location: Option<&str>,
    ) -> Result<String, DomainError> {
        let prompt = build_prompt(recent, time_context, location, self.max_context_events);
        let body = GenerateRequest {
            contents: [Content {
                parts: [Part { text: &prompt }],
            }],
        };

        let response = self
            .client
            .post(self.endpoint()?)
            .json(&body)
            .send()
            .await
            .context("POST generateContent")
            .map_err(|e| DomainError::external(SERVICE, format!("{e:#}")))?;

        if !response.status().is_success() {
            return Err(DomainError::external(
                SERVICE,
                format!("HTTP {}", response.status()),
            ));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| DomainError::external(SERVICE, format!("bad response body: {e}")))?;
        let text = parsed
            .first_text()
            .ok_or_else(|| DomainError::external(SERVICE, "response had no candidates"))?;
        debug!(len = text.len(), "suggestion received");
        Ok(text)
    }
}
