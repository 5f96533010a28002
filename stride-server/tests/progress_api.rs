use anyhow::Result;
use axum::http::StatusCode;
use serde_json::{Value, json};

#[path = "support/mod.rs"]
mod support;
use support::{LEARNER, build_test_app, learner, learner_header};

fn sample(position: f64, observed_at: &str) -> Value {
    json!({
        "current_position_seconds": position,
        "total_duration_seconds": 500.0,
        "observed_at": observed_at,
    })
}

#[tokio::test]
async fn health_reports_backend() -> Result<()> {
    let app = build_test_app()?;

    let response = app.server.get("/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body, json!({"status": "ok", "backend": "memory"}));
    Ok(())
}

#[tokio::test]
async fn requests_without_learner_header_are_rejected() -> Result<()> {
    let app = build_test_app()?;

    let response = app
        .server
        .post("/api/v1/progress/record")
        .json(&json!({
            "course_id": "rust-101",
            "unit_id": "intro",
            "sample": sample(10.0, "2024-05-06T09:00:00Z"),
        }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["error"]["status"], 401);
    Ok(())
}

#[tokio::test]
async fn recording_past_threshold_completes_unit_and_updates_enrollment() -> Result<()> {
    let app = build_test_app()?;

    let response = app
        .server
        .post("/api/v1/progress/record")
        .add_header(learner_header(), learner(LEARNER))
        .json(&json!({
            "course_id": "rust-101",
            "unit_id": "intro",
            "sample": sample(450.0, "2024-05-06T09:00:00Z"),
        }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["status"], "success");
    let record = &body["data"];
    assert_eq!(record["watch_time_seconds"], 450.0);
    assert_eq!(record["completion_percentage"], 90.0);
    assert_eq!(record["status"], "completed");

    let enrollment = app.enrollment_of(LEARNER);
    let response = app
        .server
        .get(&format!("/api/v1/enrollments/{}/progress", enrollment.id))
        .add_header(learner_header(), learner(LEARNER))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["enrollment"]["overall_percentage"], 50);
    assert_eq!(body["data"]["enrollment"]["status"], "active");
    assert_eq!(body["data"]["units"].as_array().map(Vec::len), Some(1));
    Ok(())
}

#[tokio::test]
async fn ingest_errors_map_to_http_statuses() -> Result<()> {
    let app = build_test_app()?;

    let invalid = app
        .server
        .post("/api/v1/progress/record")
        .add_header(learner_header(), learner(LEARNER))
        .json(&json!({
            "course_id": "rust-101",
            "unit_id": "intro",
            "sample": sample(-5.0, "2024-05-06T09:00:00Z"),
        }))
        .await;
    invalid.assert_status(StatusCode::BAD_REQUEST);

    let unknown_unit = app
        .server
        .post("/api/v1/progress/record")
        .add_header(learner_header(), learner(LEARNER))
        .json(&json!({
            "course_id": "rust-101",
            "unit_id": "missing",
            "sample": sample(5.0, "2024-05-06T09:00:00Z"),
        }))
        .await;
    unknown_unit.assert_status(StatusCode::NOT_FOUND);

    let not_enrolled = app
        .server
        .post("/api/v1/progress/record")
        .add_header(learner_header(), learner("stranger"))
        .json(&json!({
            "course_id": "rust-101",
            "unit_id": "intro",
            "sample": sample(5.0, "2024-05-06T09:00:00Z"),
        }))
        .await;
    not_enrolled.assert_status(StatusCode::FORBIDDEN);

    let malformed = app
        .server
        .post("/api/v1/progress/record")
        .add_header(learner_header(), learner(LEARNER))
        .json(&json!({"course_id": "rust-101"}))
        .await;
    malformed.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    assert!(app.progress.is_empty());
    Ok(())
}

#[tokio::test]
async fn batch_isolates_failing_items() -> Result<()> {
    let app = build_test_app()?;

    let response = app
        .server
        .post("/api/v1/progress/batch")
        .add_header(learner_header(), learner(LEARNER))
        .json(&json!({
            "course_id": "rust-101",
            "items": [
                {"unit_id": "intro", "sample": sample(120.0, "2024-05-06T09:00:00Z")},
                {"unit_id": "ghost", "sample": sample(30.0, "2024-05-06T09:01:00Z")},
                {"unit_id": "advanced", "sample": sample(60.0, "2024-05-06T09:02:00Z")},
            ],
        }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    let outcome = &body["data"];
    assert_eq!(outcome["succeeded"], 2);
    assert_eq!(outcome["failed"], 1);
    assert_eq!(outcome["results"][1]["ok"], false);
    assert_eq!(outcome["results"][1]["unit_id"], "ghost");
    assert_eq!(app.progress.len(), 2);
    Ok(())
}

#[tokio::test]
async fn batch_from_unenrolled_learner_fails_wholesale() -> Result<()> {
    let app = build_test_app()?;

    let response = app
        .server
        .post("/api/v1/progress/batch")
        .add_header(learner_header(), learner("stranger"))
        .json(&json!({
            "course_id": "rust-101",
            "items": [
                {"unit_id": "intro", "sample": sample(120.0, "2024-05-06T09:00:00Z")},
            ],
        }))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
    assert!(app.progress.is_empty());
    Ok(())
}

#[tokio::test]
async fn continue_watching_lists_open_units_newest_first() -> Result<()> {
    let app = build_test_app()?;

    for (unit, position, observed_at) in [
        ("intro", 100.0, "2024-05-06T09:00:00Z"),
        ("advanced", 200.0, "2024-05-06T10:00:00Z"),
        ("bonus", 290.0, "2024-05-06T11:00:00Z"),
    ] {
        app.server
            .post("/api/v1/progress/record")
            .add_header(learner_header(), learner(LEARNER))
            .json(&json!({
                "course_id": "rust-101",
                "unit_id": unit,
                "sample": {
                    "current_position_seconds": position,
                    "total_duration_seconds": 500.0,
                    "observed_at": observed_at,
                },
            }))
            .await
            .assert_status_ok();
    }

    let response = app
        .server
        .get("/api/v1/progress/continue")
        .add_header(learner_header(), learner(LEARNER))
        .add_query_param("course_id", "rust-101")
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    let units: Vec<&str> = body["data"]
        .as_array()
        .expect("array of records")
        .iter()
        .filter_map(|record| record["unit_id"].as_str())
        .collect();
    // bonus is 300s long in the catalog, so 290s completes it
    assert_eq!(units, vec!["advanced", "intro"]);
    assert_eq!(body["data"][0]["resume_position_seconds"], 200.0);

    let limited = app
        .server
        .get("/api/v1/progress/continue")
        .add_header(learner_header(), learner(LEARNER))
        .add_query_param("limit", 1)
        .await;
    let body: Value = limited.json();
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
    Ok(())
}

#[tokio::test]
async fn analytics_reports_course_activity() -> Result<()> {
    let app = build_test_app()?;

    app.server
        .post("/api/v1/progress/record")
        .add_header(learner_header(), learner(LEARNER))
        .json(&json!({
            "course_id": "rust-101",
            "unit_id": "intro",
            "sample": sample(450.0, "2024-05-06T09:00:00Z"),
        }))
        .await
        .assert_status_ok();

    let response = app
        .server
        .get("/api/v1/progress/analytics")
        .add_header(learner_header(), learner(LEARNER))
        .add_query_param("course_id", "rust-101")
        .add_query_param("start", "2024-05-01")
        .add_query_param("end", "2024-05-07")
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    let report = &body["data"];
    assert_eq!(report["learner_id"], LEARNER);
    assert_eq!(report["daily_activity"].as_array().map(Vec::len), Some(7));
    assert_eq!(report["active_days"], 1);
    assert_eq!(report["units_completed"], 1);
    assert_eq!(report["streak"]["longest"], 1);
    assert_eq!(report["recommendations"]["next_unit"], "advanced");
    Ok(())
}

#[tokio::test]
async fn analytics_rejects_inverted_window() -> Result<()> {
    let app = build_test_app()?;

    let response = app
        .server
        .get("/api/v1/progress/analytics")
        .add_header(learner_header(), learner(LEARNER))
        .add_query_param("start", "2024-05-07")
        .add_query_param("end", "2024-05-01")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    Ok(())
}
