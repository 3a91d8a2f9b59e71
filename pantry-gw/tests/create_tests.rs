//! Integration tests for the product-creation pipeline

mod helpers;

use axum::http::StatusCode;
use helpers::*;
use serde_json::json;
use std::sync::atomic::Ordering;
use tower::util::ServiceExt;

#[tokio::test]
async fn create_with_defaults() {
    let stub = spawn_stub().await;
    let app = gateway(&stub);

    let response = app
        .oneshot(post_request(
            "/enriched/products/create",
            &json!({"name": "Oat Milk"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = extract_json(response.into_body()).await;
    assert!(body["id"].as_i64().unwrap() >= 100);
    assert_eq!(body["name"], "Oat Milk");
    assert_eq!(body["location"], "Pantry");
    assert_eq!(stub.state.product_creates.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn create_with_explicit_fields() {
    let stub = spawn_stub().await;
    let app = gateway(&stub);

    let response = app
        .oneshot(post_request(
            "/enriched/products/create",
            &json!({
                "name": "Cream",
                "location": "fridge",
                "qu_purchase": "pack",
                "product_group": "dairy"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["location"], "Fridge");

    // The backend received the resolved IDs, not the names
    let products = stub.state.products.lock().unwrap();
    let created = products.iter().find(|p| p["name"] == "Cream").unwrap();
    assert_eq!(created["location_id"], 2);
    assert_eq!(created["qu_id_purchase"], 2);
    assert_eq!(created["qu_id_stock"], 1);
    assert_eq!(created["product_group_id"], 1);
}

#[tokio::test]
async fn duplicate_name_conflicts_without_a_write() {
    let stub = spawn_stub().await;
    let app = gateway(&stub);

    // Equal after normalization to the existing "Milk"
    let response = app
        .oneshot(post_request(
            "/enriched/products/create",
            &json!({"name": "  MILK! "}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "product_exists");
    assert_eq!(stub.state.product_creates.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unknown_unit_role_fails_closed() {
    let stub = spawn_stub().await;
    let app = gateway(&stub);

    let response = app
        .oneshot(post_request(
            "/enriched/products/create",
            &json!({"name": "Flour", "qu_purchase": "Bogus Unit"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "invalid_quantity_unit");
    assert_eq!(body["details"]["role"], "purchase");
    assert_eq!(body["details"]["name"], "Bogus Unit");
    // Nothing reached the backend
    assert_eq!(stub.state.product_creates.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unknown_location_fails_closed() {
    let stub = spawn_stub().await;
    let app = gateway(&stub);

    let response = app
        .oneshot(post_request(
            "/enriched/products/create",
            &json!({"name": "Flour", "location": "Garage"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "invalid_location");
    assert_eq!(stub.state.product_creates.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unknown_product_group_fails_closed() {
    let stub = spawn_stub().await;
    let app = gateway(&stub);

    let response = app
        .oneshot(post_request(
            "/enriched/products/create",
            &json!({"name": "Flour", "product_group": "Snacks"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "invalid_product_group");
    assert_eq!(stub.state.product_creates.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn creation_invalidates_the_product_cache() {
    let stub = spawn_stub().await;
    let app = gateway(&stub);

    // Warm the product cache
    let response = app
        .clone()
        .oneshot(get_request("/enriched/products/search?q=milk"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(post_request(
            "/enriched/products/create",
            &json!({"name": "Oat Milk"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    // A resolution right after creation must already see the new product
    let response = app
        .oneshot(get_request("/enriched/products/search?q=oat%20milk"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    let matches = body["matches"].as_array().unwrap();
    assert_eq!(matches[0]["name"], "Oat Milk");
    assert_eq!(matches[0]["score"], 100);
    // The stale cached collection was dropped, forcing a refetch
    assert!(stub.state.product_fetches.load(Ordering::SeqCst) >= 2);
}
