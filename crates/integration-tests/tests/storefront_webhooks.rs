//! Integration tests for the vendor webhook endpoint.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use driftwood_integration_tests::{MockVendor, TEST_WEBHOOK_SECRET, coffee_product, test_state};
use driftwood_storefront::vendor::sign_payload;

async fn deliver(app: axum::Router, body: &str, signature: Option<&str>) -> StatusCode {
    let mut request = Request::builder().method("POST").uri("/webhooks/vendor");
    if let Some(signature) = signature {
        request = request.header("vendor-signature", signature);
    }
    let response = app
        .oneshot(request.body(Body::from(body.to_string())).expect("request"))
        .await
        .expect("response");
    response.status()
}

#[tokio::test]
async fn unsigned_delivery_is_rejected() {
    let vendor = MockVendor::with_products(vec![]);
    let app = driftwood_storefront::app(test_state(vendor));

    let status = deliver(app, r#"{"type":"product.updated"}"#, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn wrong_secret_is_rejected() {
    let vendor = MockVendor::with_products(vec![]);
    let app = driftwood_storefront::app(test_state(vendor));

    let body = r#"{"type":"product.updated"}"#;
    let signature = sign_payload(
        "whsec_not_the_real_secret",
        body.as_bytes(),
        chrono::Utc::now().timestamp(),
    );
    let status = deliver(app, body, Some(&signature)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn stale_timestamp_is_rejected() {
    let vendor = MockVendor::with_products(vec![]);
    let app = driftwood_storefront::app(test_state(vendor));

    let body = r#"{"type":"product.updated"}"#;
    let signature = sign_payload(
        TEST_WEBHOOK_SECRET,
        body.as_bytes(),
        chrono::Utc::now().timestamp() - 600,
    );
    let status = deliver(app, body, Some(&signature)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_event_type_is_acknowledged() {
    let vendor = MockVendor::with_products(vec![]);
    let app = driftwood_storefront::app(test_state(vendor));

    let body = r#"{"type":"invoice.finalized"}"#;
    let signature = sign_payload(
        TEST_WEBHOOK_SECRET,
        body.as_bytes(),
        chrono::Utc::now().timestamp(),
    );
    let status = deliver(app, body, Some(&signature)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn completed_checkout_decrements_inventory() {
    let vendor = MockVendor::with_products(vec![coffee_product("prod_a", "House Blend", 100)]);
    let app = driftwood_storefront::app(test_state(vendor.clone()));

    let body = json!({
        "type": "checkout.session.completed",
        "data": { "object": {
            "id": "sess_test_1",
            "metadata": { "usage:prod_a": "12" }
        }}
    })
    .to_string();
    let signature = sign_payload(
        TEST_WEBHOOK_SECRET,
        body.as_bytes(),
        chrono::Utc::now().timestamp(),
    );
    let status = deliver(app, &body, Some(&signature)).await;
    assert_eq!(status, StatusCode::OK);

    let decrements = vendor.decrements.lock().expect("lock");
    assert_eq!(decrements.len(), 1);
    assert_eq!(decrements[0].0.as_str(), "prod_a");
    assert_eq!(decrements[0].1, 12);

    let products = vendor.products.lock().expect("lock");
    assert_eq!(products[0].inventory.total_base_units, Some(88));
}

#[tokio::test]
async fn malformed_usage_metadata_is_swallowed() {
    let vendor = MockVendor::with_products(vec![coffee_product("prod_a", "House Blend", 100)]);
    let app = driftwood_storefront::app(test_state(vendor.clone()));

    let body = json!({
        "type": "checkout.session.completed",
        "data": { "object": { "metadata": { "usage:prod_a": "lots" } } }
    })
    .to_string();
    let signature = sign_payload(
        TEST_WEBHOOK_SECRET,
        body.as_bytes(),
        chrono::Utc::now().timestamp(),
    );
    let status = deliver(app, &body, Some(&signature)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(vendor.decrements.lock().expect("lock").is_empty());
}
