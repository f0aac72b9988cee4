//! Calendar and userinfo clients against a mock API server.

#![allow(clippy::unwrap_used)]

use chrono::{NaiveDate, TimeZone, Utc};
use mailcal_google::{CalendarClient, Error, NewEvent, RetryPolicy, UserInfoClient};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> CalendarClient {
    CalendarClient::new()
        .with_base_url(server.uri())
        .with_retry(RetryPolicy::none())
}

#[tokio::test]
async fn timezone_reads_primary_calendar() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/calendars/primary"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "me@example.com",
            "timeZone": "Australia/Sydney"
        })))
        .mount(&server)
        .await;

    let tz = client(&server).timezone("tok").await.unwrap();
    assert_eq!(tz.as_deref(), Some("Australia/Sydney"));
}

#[tokio::test]
async fn list_events_sends_window_and_page_size() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/calendars/primary/events"))
        .and(query_param("timeMin", "2025-07-29T00:00:00+00:00"))
        .and(query_param("timeMax", "2025-07-30T00:00:00+00:00"))
        .and(query_param("maxResults", "10"))
        .and(query_param("singleEvents", "true"))
        .and(query_param("orderBy", "startTime"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {"id": "a", "summary": "Ours", "description": "{\"v\":1,\"email_id\":\"m1\"}"},
                {"id": "b", "summary": "Theirs"}
            ]
        })))
        .mount(&server)
        .await;

    let min = Utc.with_ymd_and_hms(2025, 7, 29, 0, 0, 0).unwrap().fixed_offset();
    let max = Utc.with_ymd_and_hms(2025, 7, 30, 0, 0, 0).unwrap().fixed_offset();
    let events = client(&server).list_events("tok", min, max, 10).await.unwrap();

    assert_eq!(events.len(), 2);
    assert_eq!(events[0].description.as_deref(), Some("{\"v\":1,\"email_id\":\"m1\"}"));
    assert!(events[1].description.is_none());
}

#[tokio::test]
async fn insert_event_posts_local_times() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/calendars/primary/events"))
        .and(body_partial_json(json!({
            "summary": "Team dinner",
            "start": {"dateTime": "2025-07-29T19:00:00", "timeZone": "UTC"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "evt1",
            "summary": "Team dinner",
            "htmlLink": "https://calendar.google.com/event?eid=evt1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let start = NaiveDate::from_ymd_opt(2025, 7, 29)
        .unwrap()
        .and_hms_opt(19, 0, 0)
        .unwrap();
    let event = NewEvent::timed("Team dinner", "{}", start, start + chrono::Duration::hours(2), "UTC");
    let created = client(&server).insert_event("tok", &event).await.unwrap();

    assert_eq!(created.id, "evt1");
    assert_eq!(
        created.html_link.as_deref(),
        Some("https://calendar.google.com/event?eid=evt1")
    );
}

#[tokio::test]
async fn insert_failure_is_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/calendars/primary/events"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad request"))
        .mount(&server)
        .await;

    let start = NaiveDate::from_ymd_opt(2025, 7, 29)
        .unwrap()
        .and_hms_opt(19, 0, 0)
        .unwrap();
    let event = NewEvent::timed("x", "{}", start, start + chrono::Duration::hours(1), "UTC");
    let err = client(&server).insert_event("tok", &event).await.unwrap_err();
    assert!(matches!(err, Error::Api { status: 400, ref message } if message == "bad request"));
}

#[tokio::test]
async fn userinfo_returns_email() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/userinfo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "1",
            "email": "me@example.com"
        })))
        .mount(&server)
        .await;

    let email = UserInfoClient::new()
        .with_base_url(server.uri())
        .email("tok")
        .await
        .unwrap();
    assert_eq!(email.as_deref(), Some("me@example.com"));
}

#[tokio::test]
async fn userinfo_honours_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/userinfo"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "email": "me@example.com" }))
                .set_delay(std::time::Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let err = UserInfoClient::new()
        .with_base_url(server.uri())
        .with_timeout(std::time::Duration::from_millis(50))
        .email("tok")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Http(ref e) if e.is_timeout()), "{err}");
}
