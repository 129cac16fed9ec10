//! Integration tests for the cart validation endpoint.
//!
//! The router is driven in-process with `tower::ServiceExt::oneshot`
//! against a mock vendor, so these run without any external services.

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use driftwood_integration_tests::{MockVendor, coffee_product, test_state};

async fn post_validate(app: axum::Router, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/cart/validate")
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
    let value = serde_json::from_slice(&bytes).expect("json");
    (status, value)
}

fn line(product: &str, variant: &str, nickname: &str, quantity: u32, multiplier: u32) -> Value {
    json!({
        "line_item_id": format!("{product}:{variant}"),
        "product_id": product,
        "variant_id": variant,
        "product_name": "House Blend",
        "nickname": nickname,
        "unit_price_cents": 1200,
        "quantity": quantity,
        "base_unit_multiplier": multiplier,
        "cached_max_quantity": { "kind": "unlimited" }
    })
}

#[tokio::test]
async fn validate_clamps_over_limit_lines() {
    // 40 base units, one 1lb line (4 units each) asking for 25
    let vendor = MockVendor::with_products(vec![coffee_product("prod_a", "House Blend", 40)]);
    let app = driftwood_storefront::app(test_state(vendor));

    let (status, body) = post_validate(
        app,
        json!({ "lines": [line("prod_a", "prod_a-1lb", "1lb", 25, 4)] }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["lines"][0]["quantity"], 10);
    assert_eq!(body["adjusted"][0]["from"], 25);
    assert_eq!(body["adjusted"][0]["to"], 10);
    assert!(body["removed"].as_array().expect("removed").is_empty());
}

#[tokio::test]
async fn validate_removes_lines_for_missing_products() {
    let vendor = MockVendor::with_products(vec![coffee_product("prod_a", "House Blend", 40)]);
    let app = driftwood_storefront::app(test_state(vendor));

    let (status, body) = post_validate(
        app,
        json!({ "lines": [
            line("prod_a", "prod_a-4oz", "4oz", 2, 1),
            line("prod_gone", "prod_gone-4oz", "4oz", 1, 1),
        ]}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["lines"].as_array().expect("lines").len(), 1);
    assert_eq!(body["removed"].as_array().expect("removed").len(), 1);
    assert_eq!(body["removed"][0]["line_item_id"], "prod_gone:prod_gone-4oz");
}

#[tokio::test]
async fn validate_is_idempotent() {
    let vendor = MockVendor::with_products(vec![coffee_product("prod_a", "House Blend", 40)]);
    let state = test_state(vendor);

    let (_, first) = post_validate(
        driftwood_storefront::app(state.clone()),
        json!({ "lines": [line("prod_a", "prod_a-1lb", "1lb", 25, 4)] }),
    )
    .await;
    assert!(!first["adjusted"].as_array().expect("adjusted").is_empty());

    // Feed the corrected cart straight back in; nothing should change
    let (_, second) = post_validate(
        driftwood_storefront::app(state),
        json!({ "lines": first["lines"] }),
    )
    .await;
    assert!(second["adjusted"].as_array().expect("adjusted").is_empty());
    assert!(second["removed"].as_array().expect("removed").is_empty());
    assert_eq!(second["lines"], first["lines"]);
}

#[tokio::test]
async fn validate_reports_batched_messages() {
    let vendor = MockVendor::with_products(vec![coffee_product("prod_a", "House Blend", 4)]);
    let app = driftwood_storefront::app(test_state(vendor));

    let (_, body) = post_validate(
        app,
        json!({ "lines": [
            line("prod_a", "prod_a-1lb", "1lb", 3, 4),
            line("prod_b", "prod_b-4oz", "4oz", 1, 1),
        ]}),
    )
    .await;

    // One removal message, one adjustment message
    let messages = body["messages"].as_array().expect("messages");
    assert_eq!(messages.len(), 2);
}
