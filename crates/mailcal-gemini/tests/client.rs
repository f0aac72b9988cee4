//! Gemini client against a mock API server.

#![allow(clippy::unwrap_used)]

use chrono::NaiveDate;
use mailcal_gemini::{Error, GeminiClient};
use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MODEL_PATH: &str = "/models/gemini-2.5-flash:generateContent";

fn client(server: &MockServer) -> GeminiClient {
    GeminiClient::new("test-key").with_base_url(server.uri())
}

fn function_call(name: &str, args: Value) -> Value {
    json!({
        "candidates": [{
            "content": {
                "role": "model",
                "parts": [{"functionCall": {"name": name, "args": args}}]
            }
        }]
    })
}

#[tokio::test]
async fn categorize_forces_function_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_partial_json(json!({
            "toolConfig": {"functionCallingConfig": {"mode": "ANY"}},
            "contents": [{"role": "user", "parts": [{"text": "Party on Friday"}]}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(function_call(
            "CategorizeEmails",
            json!({"importance": true, "category": "event"}),
        )))
        .expect(1)
        .mount(&server)
        .await;

    let verdict = client(&server).categorize("Party on Friday").await.unwrap();
    assert!(verdict.importance);
    assert_eq!(verdict.category, "event");
}

#[tokio::test]
async fn summarize_event_decodes_arguments() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(function_call(
            "EventSummary",
            json!({
                "event_name": "Board review",
                "event_type": "meeting",
                "event_start": "2025-07-29 14:30",
                "event_summary": "Quarterly board review"
            }),
        )))
        .mount(&server)
        .await;

    let now = NaiveDate::from_ymd_opt(2025, 7, 28)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap();
    let event = client(&server)
        .summarize_event("Board review tomorrow 2:30pm", now)
        .await
        .unwrap();

    assert_eq!(event.event_name, "Board review");
    assert_eq!(event.event_start, "2025-07-29 14:30");
    assert!(event.event_end.is_none());
}

#[tokio::test]
async fn event_prompt_mentions_today() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(function_call(
            "EventSummary",
            json!({"event_name": "x", "event_start": "2025-07-29 10:00"}),
        )))
        .mount(&server)
        .await;

    let now = NaiveDate::from_ymd_opt(2025, 7, 28)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap();
    client(&server).summarize_event("x", now).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    let instruction = body["systemInstruction"]["parts"][0]["text"].as_str().unwrap();
    assert!(instruction.contains("Today is Monday 2025-07-28 09:00"));
}

#[tokio::test]
async fn missing_function_call_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"parts": [{"text": "I cannot help"}]}}]
        })))
        .mount(&server)
        .await;

    let err = client(&server).summarize_general("hello").await.unwrap_err();
    assert!(matches!(err, Error::NoFunctionCall("GeneralSummary")));
}

#[tokio::test]
async fn malformed_arguments_are_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(function_call(
            "GeneralSummary",
            json!({"summary": "wrong field"}),
        )))
        .mount(&server)
        .await;

    let err = client(&server).summarize_general("hello").await.unwrap_err();
    assert!(matches!(err, Error::InvalidArguments { function: "GeneralSummary", .. }));
}

#[tokio::test]
async fn status_codes_map_to_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(ResponseTemplate::new(403).set_body_string("API key not valid"))
        .mount(&server)
        .await;
    assert!(matches!(
        client(&server).categorize("x").await,
        Err(Error::Authentication(403))
    ));

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;
    assert!(matches!(client(&server).categorize("x").await, Err(Error::RateLimit)));
}
