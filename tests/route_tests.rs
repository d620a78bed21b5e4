// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Route tests: health check, task-endpoint guarding, single-flight.

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use tower::ServiceExt;
use waypoint_drops::config::DROPS_QUEUE_NAME;

fn refresh_request(queue_header: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri("/tasks/refresh-drops");
    if let Some(name) = queue_header {
        builder = builder.header("x-cloudtasks-queuename", name);
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let (app, _state, _feed) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("X-Content-Type-Options").unwrap(),
        "nosniff"
    );
}

#[tokio::test]
async fn test_refresh_without_queue_header_is_forbidden() {
    let (app, _state, feed) = common::create_test_app();

    let response = app.oneshot(refresh_request(None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(feed.fetch_count(), 0, "no pipeline pass should run");
}

#[tokio::test]
async fn test_refresh_with_wrong_queue_name_is_forbidden() {
    let (app, _state, feed) = common::create_test_app();

    let response = app
        .oneshot(refresh_request(Some("some-other-queue")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(feed.fetch_count(), 0);
}

#[tokio::test]
async fn test_refresh_with_valid_queue_header_runs_pass() {
    let (app, _state, feed) = common::create_test_app();

    let response = app
        .oneshot(refresh_request(Some(DROPS_QUEUE_NAME)))
        .await
        .unwrap();

    // Empty canned feed: the pass runs and finishes cleanly.
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(feed.fetch_count(), 1);
}

#[tokio::test]
async fn test_overlapping_trigger_is_skipped() {
    let (app, state, feed) = common::create_test_app();

    // Simulate a pass already in flight.
    let _guard = state.refresh_lock.lock().await;

    let response = app
        .oneshot(refresh_request(Some(DROPS_QUEUE_NAME)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK, "skip is not an error");
    assert_eq!(feed.fetch_count(), 0, "the overlapping pass must not run");
}
