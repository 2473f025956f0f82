use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, instrument};
use url::Url;

use crate::domain::error::DomainError;
use crate::domain::ports::NotificationSender;

const SERVICE: &str = "sms";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize)]
struct OutgoingMessage<'a> {
    to: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    from: Option<&'a str>,
    body: &'a str,
}

/// Sends texts through an HTTP gateway: `POST <gateway>/api/messages`.
pub struct HttpSmsSender {
    client: reqwest::Client,
    gateway: Url,
    sender: Option<String>,
}

impl HttpSmsSender {
    pub fn new(gateway: Url, sender: Option<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build SMS HTTP client")?;
        Ok(Self {
            client,
            gateway,
            sender,
        })
    }

    fn messages_url(&self) -> Result<Url, DomainError> {
        let mut url = self.gateway.clone();
        url.path_segments_mut()
            .map_err(|_| DomainError::external(SERVICE, "invalid gateway base URL"))?
            .pop_if_empty()
            .extend(&["api", "messages"]);
        Ok(url)
    }
}

#[async_trait]
impl NotificationSender for HttpSmsSender {
    #[instrument(
        name = "event_tracker.http.sms.send",
        skip_all,
        fields(gateway = %self.gateway)
    )]
    async fn send(&self, destination: &str, message: &str) -> Result<(), DomainError> {
        let url = self.messages_url()?;
        let payload = OutgoingMessage {
            to: destination,
            from: self.sender.as_deref(),
            body: message,
        };

        let response = self
            .client
            .post(url)
            .json(&payload)
            .send()
            .await
            .context("POST /api/messages")
            .map_err(|e| DomainError::external(SERVICE, format!("{e:#}")))?;

        if !response.status().is_success() {
            return Err(DomainError::external(
                SERVICE,
                format!("HTTP {}", response.status()),
            ));
        }
        debug!("message accepted by gateway");
        Ok(())
    }
}
