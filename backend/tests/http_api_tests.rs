//! End-to-end tests of the JSON API, driven through the router with a pinned
//! clock.
#![cfg(feature = "http-server")]

mod support;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use meeting_planner::clock::FixedClock;
use meeting_planner::db::LocalRepository;
use meeting_planner::http::{create_router, AppState};
use meeting_planner::services::slot_validator::SlotValidator;
use support::{monday_morning, monday_utc};

struct TestApp {
    router: Router,
    repo: LocalRepository,
    clock: Arc<FixedClock>,
}

impl TestApp {
    fn new() -> Self {
        Self::in_zone(chrono_tz::UTC)
    }

    fn in_zone(tz: chrono_tz::Tz) -> Self {
        let repo = LocalRepository::new();
        let clock = Arc::new(FixedClock::new(monday_morning()));
        let state = AppState::new(
            Arc::new(repo.clone()),
            SlotValidator::submission(tz),
            SlotValidator::preview(tz),
            clock.clone(),
        );
        Self {
            router: create_router(state),
            repo,
            clock,
        }
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        user: Option<(i64, &str)>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some((id, role)) = user {
            builder = builder
                .header("X-User-Id", id.to_string())
                .header("X-User-Role", role);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }
}

const ORGANIZER: Option<(i64, &str)> = Some((1, "organizer"));

fn meeting_form(slots: &[(&str, &str)]) -> Value {
    json!({
        "title": "Design review",
        "description": "",
        "start_times": slots.iter().map(|(s, _)| *s).collect::<Vec<_>>(),
        "end_times": slots.iter().map(|(_, e)| *e).collect::<Vec<_>>(),
    })
}

#[tokio::test]
async fn create_then_fetch_meeting() {
    let app = TestApp::new();
    let (status, created) = app
        .send(
            Method::POST,
            "/v1/meetings",
            ORGANIZER,
            Some(meeting_form(&[
                ("2024-06-04T13:00", "2024-06-04T14:00"),
                ("2024-06-04T09:00", "2024-06-04T10:30"),
            ])),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["meeting"]["title"], "Design review");
    assert_eq!(created["meeting"]["description"], Value::Null);
    assert_eq!(created["slots"][0]["start_time"], "2024-06-04T09:00:00.000Z");
    assert_eq!(created["slots"][1]["end_time"], "2024-06-04T14:00:00.000Z");

    let id = created["meeting"]["meeting_id"].as_i64().unwrap();
    let (status, fetched) = app
        .send(Method::GET, &format!("/v1/meetings/{id}"), ORGANIZER, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn refused_submission_echoes_form_and_stores_nothing() {
    let app = TestApp::new();
    let form = meeting_form(&[
        ("2024-06-04T09:00", "2024-06-04T10:00"),
        ("2024-06-04T10:00", "2024-06-04T13:00"),
    ]);
    let (status, body) = app
        .send(Method::POST, "/v1/meetings", ORGANIZER, Some(form.clone()))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "DURATION_TOO_LONG");
    assert_eq!(body["ordinal"], 2);
    assert!(body["message"].as_str().unwrap().starts_with("Slot 2"));
    assert_eq!(body["form"]["start_times"], form["start_times"]);
    assert_eq!(body["form"]["title"], "Design review");
    assert_eq!(app.repo.meeting_count(), 0);
}

#[tokio::test]
async fn empty_submission_has_no_ordinal() {
    let app = TestApp::new();
    let (status, body) = app
        .send(
            Method::POST,
            "/v1/meetings",
            ORGANIZER,
            Some(json!({ "title": "Nothing proposed" })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "EMPTY_OR_MISMATCHED_COUNT");
    assert!(body.get("ordinal").is_none());
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let app = TestApp::new();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/v1/meetings")
        .header("X-User-Id", "1")
        .header("X-User-Role", "organizer")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"title\": "))
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn identity_headers_are_required_and_checked() {
    let app = TestApp::new();

    let (status, body) = app.send(Method::GET, "/v1/meetings", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, _) = app
        .send(Method::GET, "/v1/meetings", Some((1, "admin")), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn participants_cannot_create_and_see_no_meetings() {
    let app = TestApp::new();
    app.send(
        Method::POST,
        "/v1/meetings",
        ORGANIZER,
        Some(meeting_form(&[("2024-06-04T09:00", "2024-06-04T10:00")])),
    )
    .await;

    let participant = Some((1, "participant"));
    let (status, body) = app
        .send(
            Method::POST,
            "/v1/meetings",
            participant,
            Some(meeting_form(&[("2024-06-04T09:00", "2024-06-04T10:00")])),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let (status, body) = app.send(Method::GET, "/v1/meetings", participant, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 0);

    let (_, body) = app.send(Method::GET, "/v1/meetings", ORGANIZER, None).await;
    assert_eq!(body["total"], 1);
}

#[tokio::test]
async fn list_is_newest_first() {
    let app = TestApp::new();
    for title in ["first", "second", "third"] {
        let mut form = meeting_form(&[("2024-06-04T09:00", "2024-06-04T10:00")]);
        form["title"] = json!(title);
        let (status, _) = app
            .send(Method::POST, "/v1/meetings", ORGANIZER, Some(form))
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, body) = app.send(Method::GET, "/v1/meetings", ORGANIZER, None).await;
    let titles: Vec<&str> = body["meetings"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["third", "second", "first"]);
}

#[tokio::test]
async fn delete_enforces_ownership() {
    let app = TestApp::new();
    let (_, created) = app
        .send(
            Method::POST,
            "/v1/meetings",
            ORGANIZER,
            Some(meeting_form(&[("2024-06-04T09:00", "2024-06-04T10:00")])),
        )
        .await;
    let uri = format!(
        "/v1/meetings/{}",
        created["meeting"]["meeting_id"].as_i64().unwrap()
    );

    let (status, _) = app
        .send(Method::DELETE, &uri, Some((2, "organizer")), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.send(Method::DELETE, &uri, ORGANIZER, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], 1);

    let (status, body) = app.send(Method::DELETE, &uri, ORGANIZER, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
    assert_eq!(app.repo.slot_count(), 0);
}

#[tokio::test]
async fn unknown_or_invalid_meeting_ids() {
    let app = TestApp::new();
    let (status, _) = app
        .send(Method::GET, "/v1/meetings/404", ORGANIZER, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .send(Method::GET, "/v1/meetings/abc", ORGANIZER, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn preview_reports_verdict_with_status_ok() {
    let app = TestApp::new();

    let (status, body) = app
        .send(
            Method::POST,
            "/v1/slots/preview",
            None,
            Some(json!({ "start": "2024-06-04T09:00", "end": "2024-06-04T10:00" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], true);
    assert_eq!(body["slot"]["start"], "2024-06-04T09:00:00.000Z");

    let (status, body) = app
        .send(
            Method::POST,
            "/v1/slots/preview",
            None,
            Some(json!({ "start": "2024-06-08T09:00", "end": "2024-06-08T10:00" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], false);
    assert_eq!(body["code"], "WEEKEND_NOT_ALLOWED");
    assert!(body.get("slot").is_none());
}

#[tokio::test]
async fn preview_has_no_grace_window_but_submission_does() {
    let app = TestApp::new();
    app.clock.set(monday_utc(10, 3));

    let (_, body) = app
        .send(
            Method::POST,
            "/v1/slots/preview",
            None,
            Some(json!({ "start": "2024-06-03T10:00", "end": "2024-06-03T11:00" })),
        )
        .await;
    assert_eq!(body["code"], "IN_PAST");

    let (status, _) = app
        .send(
            Method::POST,
            "/v1/meetings",
            ORGANIZER,
            Some(meeting_form(&[("2024-06-03T10:00", "2024-06-03T11:00")])),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn local_times_are_read_in_the_configured_zone() {
    let app = TestApp::in_zone(chrono_tz::America::New_York);

    let (status, created) = app
        .send(
            Method::POST,
            "/v1/meetings",
            ORGANIZER,
            Some(meeting_form(&[("2024-06-04T09:00", "2024-06-04T10:00")])),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["slots"][0]["start_time"], "2024-06-04T13:00:00.000Z");
}
