//! Integration tests for checkout and order lookup.

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use driftwood_integration_tests::{MockVendor, coffee_product, test_state};

async fn send_json(app: axum::Router, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .expect("request"),
        )
        .await
        .expect("response");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn checkout_creates_session_with_usage_metadata() {
    let vendor = MockVendor::with_products(vec![coffee_product("prod_a", "House Blend", 100)]);
    let app = driftwood_storefront::app(test_state(vendor.clone()));

    let (status, body) = send_json(
        app,
        "POST",
        "/api/checkout",
        json!({ "items": [
            { "variant_id": "prod_a-1lb", "quantity": 2 },
            { "variant_id": "prod_a-4oz", "quantity": 3 },
        ]}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["session_id"], "sess_test_1");
    assert_eq!(body["checkout_url"], "https://vendor.example/pay/sess_test_1");

    let checkouts = vendor.checkouts.lock().expect("lock");
    assert_eq!(checkouts.len(), 1);
    assert_eq!(checkouts[0].lines.len(), 2);
    // 2 x 1lb (4 units) + 3 x 4oz (1 unit) = 11 base units
    assert_eq!(checkouts[0].usage.len(), 1);
    assert_eq!(checkouts[0].usage[0].base_units, 11);
}

#[tokio::test]
async fn checkout_clamps_to_available_pool() {
    // 8 base units can cover only two 1lb bags
    let vendor = MockVendor::with_products(vec![coffee_product("prod_a", "House Blend", 8)]);
    let app = driftwood_storefront::app(test_state(vendor.clone()));

    let (status, _) = send_json(
        app,
        "POST",
        "/api/checkout",
        json!({ "items": [{ "variant_id": "prod_a-1lb", "quantity": 5 }] }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let checkouts = vendor.checkouts.lock().expect("lock");
    assert_eq!(checkouts[0].lines[0].quantity, 2);
    assert_eq!(checkouts[0].usage[0].base_units, 8);
}

#[tokio::test]
async fn checkout_rejects_empty_cart() {
    let vendor = MockVendor::with_products(vec![]);
    let app = driftwood_storefront::app(test_state(vendor));

    let (status, _) = send_json(app, "POST", "/api/checkout", json!({ "items": [] })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn checkout_rejects_cart_of_unknown_variants() {
    let vendor = MockVendor::with_products(vec![coffee_product("prod_a", "House Blend", 100)]);
    let app = driftwood_storefront::app(test_state(vendor));

    let (status, _) = send_json(
        app,
        "POST",
        "/api/checkout",
        json!({ "items": [{ "variant_id": "discontinued", "quantity": 1 }] }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn order_lookup_returns_summary() {
    let vendor = MockVendor::with_products(vec![]);
    let app = driftwood_storefront::app(test_state(vendor));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/orders/sess_test_1")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let body: Value = serde_json::from_slice(&bytes).expect("json");
    assert_eq!(body["total_cents"], 4800);
    assert_eq!(body["customer_email"], "customer@example.com");
    assert_eq!(body["item_count"], 2);
}

#[tokio::test]
async fn order_lookup_maps_missing_to_404() {
    let vendor = MockVendor::with_products(vec![]);
    let app = driftwood_storefront::app(test_state(vendor));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/orders/sess_missing")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
