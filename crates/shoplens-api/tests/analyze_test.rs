//! Integration tests for the analytics queries.

mod common;

use axum::Router;
use axum::http::StatusCode;
use chrono::TimeDelta;
use serde_json::{Value, json};

async fn track(app: &Router, event: Value) {
    let (status, _) = common::post_json(app, "/api/track", &event).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_two_users_viewing_product_count_once() {
    // Arrange
    let app = common::build_test_app();
    track(&app.router, json!({ "userId": "u1", "event": "view", "productId": "p1" })).await;
    track(&app.router, json!({ "userId": "u2", "event": "view", "productId": "p1" })).await;

    // Act
    let (status, json) = common::get_json(&app.router, "/api/analyze/products").await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["top_products"][0]["product_id"], "p1");
    assert_eq!(json["top_products"][0]["event_count"], 1);
    assert_eq!(json["total_events"], 1);
    assert_eq!(json["popular_events"]["view"], 2);
}

#[tokio::test]
async fn test_purchase_reports_approximate_revenue() {
    // Arrange
    let app = common::build_test_app();
    track(
        &app.router,
        json!({
            "userId": "u1",
            "event": "purchase",
            "productId": "p1",
            "price": 10.0,
            "quantity": 2
        }),
    )
    .await;

    // Act
    let (status, json) = common::get_json(&app.router, "/api/analyze/summary").await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["top_products"][0]["approximate_revenue"], 20.0);
    assert_eq!(json["total_approximate_revenue"], 20.0);
    assert_eq!(json["revenue_is_approximate"], true);
    assert_eq!(json["window_hours"], 30);
}

#[tokio::test]
async fn test_limit_caps_top_products() {
    let app = common::build_test_app();
    for product in ["p1", "p2", "p3"] {
        track(&app.router, json!({ "userId": "u1", "event": "view", "productId": product })).await;
    }

    let (_, limited) = common::get_json(&app.router, "/api/analyze/products?limit=2").await;
    let (_, capped) = common::get_json(&app.router, "/api/analyze/products?limit=5000").await;

    assert_eq!(limited["top_products"].as_array().unwrap().len(), 2);
    assert_eq!(limited["total_events"], 3);
    assert_eq!(capped["top_products"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_search_terms_are_counted() {
    // Arrange
    let app = common::build_test_app();
    for query in ["red shoes", "red shoes", "socks"] {
        track(&app.router, json!({ "userId": "u1", "event": "search", "searchQuery": query })).await;
    }

    // Act
    let (status, json) = common::get_json(&app.router, "/api/analyze/search").await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["search_terms"], json!({ "red shoes": 2, "socks": 1 }));
}

#[tokio::test]
async fn test_events_leave_summary_after_window() {
    // Arrange
    let app = common::build_test_app();
    track(&app.router, json!({ "userId": "u1", "event": "view", "productId": "p1" })).await;

    // Act
    app.clock.advance(TimeDelta::hours(30));
    let (_, json) = common::get_json(&app.router, "/api/analyze/summary").await;

    // Assert
    assert!(json["top_products"].as_array().unwrap().is_empty());
    assert_eq!(json["total_events"], 0);
    assert_eq!(json["popular_events"], json!({}));
}

#[tokio::test]
async fn test_repeat_write_slides_window() {
    let app = common::build_test_app();
    let event = json!({ "userId": "u1", "event": "view", "productId": "p1" });
    track(&app.router, event.clone()).await;
    app.clock.advance(TimeDelta::hours(20));
    track(&app.router, event).await;

    app.clock.advance(TimeDelta::hours(20));
    let (_, json) = common::get_json(&app.router, "/api/analyze/products").await;

    assert_eq!(json["top_products"][0]["product_id"], "p1");
    assert_eq!(json["top_products"][0]["event_count"], 1);
}
