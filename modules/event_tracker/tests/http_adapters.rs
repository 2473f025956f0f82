//! Outbound HTTP adapters against a mock server.

use std::sync::Arc;
use std::time::Duration;

use httpmock::prelude::*;
use serde_json::json;
use url::Url;

use event_tracker::config::SuggestionsConfig;
use event_tracker::contract::TimeContext;
use event_tracker::domain::error::DomainError;
use event_tracker::domain::ports::{NotificationSender, TitleSuggester};
use event_tracker::domain::suggestion::SuggestionService;
use event_tracker::infra::notify::HttpSmsSender;
use event_tracker::infra::suggest::GeminiSuggester;

fn gemini(server: &MockServer) -> GeminiSuggester {
    let base = Url::parse(&server.base_url()).unwrap();
    GeminiSuggester::new(base, "gemini-1.5-flash", "test-key", 10)
}

fn candidate(text: &str) -> serde_json::Value {
    json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] })
}

#[tokio::test]
async fn sms_post_carries_destination_and_body() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/messages").json_body(json!({
                "to": "5551234567",
                "from": "EventTracker",
                "body": "Your event 'Lunch' has been deleted."
            }));
            then.status(202);
        })
        .await;

    let sender = HttpSmsSender::new(
        Url::parse(&server.base_url()).unwrap(),
        Some("EventTracker".into()),
    )
    .unwrap();
    let result = sender
        .send("5551234567", "Your event 'Lunch' has been deleted.")
        .await;

    mock.assert_async().await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn sms_gateway_error_surfaces_as_domain_error() {
    let server = MockServer::start_async().await;
    let _mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/messages");
            then.status(500);
        })
        .await;

    let sender = HttpSmsSender::new(Url::parse(&server.base_url()).unwrap(), None).unwrap();
    let result = sender.send("5551234567", "hi").await;

    assert!(matches!(
        result,
        Err(DomainError::ExternalService { ref service, .. }) if service == "sms"
    ));
}

#[tokio::test]
async fn gemini_returns_first_candidate_text() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path_matches(r"/v1beta/models/.+:generateContent")
                .query_param("key", "test-key")
                .body_includes("Morning");
            then.status(200).json_body(candidate("Breakfast Meeting"));
        })
        .await;

    let text = gemini(&server)
        .suggest(&[], TimeContext::Morning, None)
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(text, "Breakfast Meeting");
}

#[tokio::test]
async fn gemini_without_candidates_is_an_error() {
    let server = MockServer::start_async().await;
    let _mock = server
        .mock_async(|when, then| {
            when.method(POST).path_matches(r"/v1beta/models/.+:generateContent");
            then.status(200).json_body(json!({ "candidates": [] }));
        })
        .await;

    let result = gemini(&server)
        .suggest(&[], TimeContext::Anytime, None)
        .await;
    assert!(matches!(result, Err(DomainError::ExternalService { .. })));
}

#[tokio::test]
async fn suggestion_service_cleans_remote_text() {
    let server = MockServer::start_async().await;
    let _mock = server
        .mock_async(|when, then| {
            when.method(POST).path_matches(r"/v1beta/models/.+:generateContent");
            then.status(200)
                .json_body(candidate("Title: \"Evening Jog\"\nsecond line"));
        })
        .await;

    let config = SuggestionsConfig {
        api_key: Some("test-key".into()),
        ..SuggestionsConfig::default()
    };
    let remote: Arc<dyn TitleSuggester> = Arc::new(gemini(&server));
    let service = SuggestionService::new(Some(remote), config);

    let title = service
        .suggest_title(&[], TimeContext::Evening, Some("Park"))
        .await;
    assert_eq!(title, "Evening Jog");
}

#[tokio::test]
async fn slow_remote_falls_back_after_deadline() {
    let server = MockServer::start_async().await;
    let _mock = server
        .mock_async(|when, then| {
            when.method(POST).path_matches(r"/v1beta/models/.+:generateContent");
            then.status(200)
                .delay(Duration::from_millis(1500))
                .json_body(candidate("Too Late"));
        })
        .await;

    let config = SuggestionsConfig {
        api_key: Some("test-key".into()),
        timeout_ms: 100,
        ..SuggestionsConfig::default()
    };
    let remote: Arc<dyn TitleSuggester> = Arc::new(gemini(&server));
    let service = SuggestionService::new(Some(remote), config);

    let title = service
        .suggest_title(&[], TimeContext::Afternoon, None)
        .await;
    assert_ne!(title, "Too Late");
    assert!(!title.is_empty());
}
