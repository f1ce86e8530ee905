//! Integration tests for checkout and order history.

#![allow(clippy::indexing_slicing)]

use axum::http::StatusCode;
use serde_json::{Value, json};

use tidewear_integration_tests::TestContext;
use tidewear_server::models::Product;

fn line(product: &Product, quantity: i64) -> Value {
    json!({
        "product": product.id,
        "name": product.name,
        "quantity": quantity,
        "price": product.price,
    })
}

#[tokio::test]
async fn test_stock_is_taken_and_refused_when_short() {
    let ctx = TestContext::new();
    let token = ctx.customer_token("buyer@example.com").await;
    let jacket = ctx.add_product("Pique Biker Jacket", 6724, "Men", 10).await;

    // Two lines on the same product, 7 units in total
    let response = ctx
        .server
        .post("/orders")
        .authorization_bearer(&token)
        .json(&json!({
            "orderItems": [line(&jacket, 4), line(&jacket, 3)],
            "totalPrice": 470.68,
        }))
        .await;
    response.assert_status(StatusCode::CREATED);

    let order: Value = response.json();
    assert!(order["id"].as_str().is_some());
    assert_eq!(order["orderItems"].as_array().map(Vec::len), Some(2));
    assert_eq!(order["orderItems"][0]["quantity"], 4);
    assert_eq!(order["orderItems"][0]["name"], "Pique Biker Jacket");
    assert_eq!(order["totalPrice"], 470.68);
    assert_eq!(ctx.stock_of(&jacket).await, 3);

    // 5 more cannot be covered by the remaining 3
    let response = ctx
        .server
        .post("/orders")
        .authorization_bearer(&token)
        .json(&json!({ "orderItems": [line(&jacket, 5)], "totalPrice": 336.20 }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["message"], "Not enough stock for product: Pique Biker Jacket");
    assert_eq!(ctx.stock_of(&jacket).await, 3);
}

#[tokio::test]
async fn test_order_is_all_or_nothing() {
    let ctx = TestContext::new();
    let token = ctx.customer_token("buyer@example.com").await;
    let cap = ctx.add_product("Diagonal Textured Cap", 6090, "Men", 25).await;
    let boots = ctx.add_product("Ankle Boots", 9849, "Shoes", 1).await;

    let response = ctx
        .server
        .post("/orders")
        .authorization_bearer(&token)
        .json(&json!({
            "orderItems": [line(&cap, 2), line(&boots, 2)],
            "totalPrice": 318.78,
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    assert_eq!(ctx.stock_of(&cap).await, 25);
    assert_eq!(ctx.stock_of(&boots).await, 1);
}

#[tokio::test]
async fn test_unknown_product_is_not_found() {
    let ctx = TestContext::new();
    let token = ctx.customer_token("buyer@example.com").await;
    let missing = "0b9d7c1e-4a3f-4c2b-9e8d-1f2a3b4c5d6e";

    let response = ctx
        .server
        .post("/orders")
        .authorization_bearer(&token)
        .json(&json!({
            "orderItems": [{ "product": missing, "name": "Ghost", "quantity": 1, "price": 1.0 }],
            "totalPrice": 1.0,
        }))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["message"], format!("Product with ID {missing} not found"));
}

#[tokio::test]
async fn test_order_validation() {
    let ctx = TestContext::new();
    let token = ctx.customer_token("buyer@example.com").await;
    let cap = ctx.add_product("Diagonal Textured Cap", 6090, "Men", 25).await;

    let response = ctx
        .server
        .post("/orders")
        .authorization_bearer(&token)
        .json(&json!({ "orderItems": [], "totalPrice": 0 }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["message"], "No order items");

    for bad_line in [line(&cap, 0), line(&cap, -2)] {
        let response = ctx
            .server
            .post("/orders")
            .authorization_bearer(&token)
            .json(&json!({ "orderItems": [bad_line], "totalPrice": 60.90 }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    assert_eq!(ctx.stock_of(&cap).await, 25);
}

#[tokio::test]
async fn test_out_of_range_prices_are_rejected() {
    let ctx = TestContext::new();
    let token = ctx.customer_token("buyer@example.com").await;
    let cap = ctx.add_product("Diagonal Textured Cap", 6090, "Men", 25).await;
    let huge = "79228162514264337593543950335";

    for body in [
        json!({
            "orderItems": [{ "product": cap.id, "name": cap.name, "quantity": 2, "price": huge }],
            "totalPrice": 121.80,
        }),
        json!({ "orderItems": [line(&cap, 1)], "totalPrice": huge }),
        json!({ "orderItems": [line(&cap, 1)], "totalPrice": 10_000_000_000_u64 }),
    ] {
        let response = ctx
            .server
            .post("/orders")
            .authorization_bearer(&token)
            .json(&body)
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    assert_eq!(ctx.stock_of(&cap).await, 25);
}

#[tokio::test]
async fn test_line_totals_past_the_largest_price_still_place() {
    let ctx = TestContext::new();
    let token = ctx.customer_token("buyer@example.com").await;
    let cap = ctx.add_product("Diagonal Textured Cap", 6090, "Men", 25).await;

    // Each field fits; only the computed subtotal would not
    let response = ctx
        .server
        .post("/orders")
        .authorization_bearer(&token)
        .json(&json!({
            "orderItems": [{ "product": cap.id, "name": cap.name, "quantity": 2, "price": "9999999999.99" }],
            "totalPrice": 60.90,
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    assert_eq!(ctx.stock_of(&cap).await, 23);
}

#[tokio::test]
async fn test_checkout_requires_token_before_body() {
    let ctx = TestContext::new();

    let response = ctx
        .server
        .post("/orders")
        .text("{not json")
        .content_type("application/json")
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_order_history() {
    let ctx = TestContext::new();
    let alice = ctx.customer_token("alice@example.com").await;
    let bob = ctx.customer_token("bob@example.com").await;
    let admin = ctx.admin_token("owner@example.com").await;
    let cap = ctx.add_product("Diagonal Textured Cap", 6090, "Men", 25).await;
    let scarf = ctx.add_product("Basic Flowing Scarf", 2628, "Women", 5).await;

    ctx.server
        .post("/orders")
        .authorization_bearer(&alice)
        .json(&json!({ "orderItems": [line(&cap, 1), line(&scarf, 2)], "totalPrice": 113.46 }))
        .await
        .assert_status(StatusCode::CREATED);

    // The scarf leaves the catalog; the order keeps its snapshot
    ctx.server
        .delete(&format!("/admin/products/{}", scarf.id))
        .authorization_bearer(&admin)
        .await
        .assert_status_ok();

    let history: Vec<Value> = ctx
        .server
        .get("/orders/my-orders")
        .authorization_bearer(&alice)
        .await
        .json();
    assert_eq!(history.len(), 1);

    let items = &history[0]["orderItems"];
    assert_eq!(items[0]["product"]["name"], "Diagonal Textured Cap");
    assert_eq!(items[0]["product"]["quantity"], 24);
    assert!(items[1]["product"].is_null());
    assert_eq!(items[1]["name"], "Basic Flowing Scarf");
    assert_eq!(items[1]["quantity"], 2);

    let history: Vec<Value> = ctx
        .server
        .get("/orders/my-orders")
        .authorization_bearer(&bob)
        .await
        .json();
    assert!(history.is_empty());
}
