//! Integration tests for placeholder pages and health checks.

use serde_json::Value;

use tidewear_integration_tests::TestContext;

#[tokio::test]
async fn test_placeholder_pages() {
    let ctx = TestContext::new();

    for (path, message) in [
        ("/", "This is Home Page"),
        ("/shop", "This is Shop Page"),
        ("/blog", "This is Blog Page"),
        ("/contacts", "This is Contact Page"),
    ] {
        let response = ctx.server.get(path).await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["message"], message, "{path}");
    }
}

#[tokio::test]
async fn test_health_endpoints() {
    let ctx = TestContext::new();

    let response = ctx.server.get("/health").await;
    response.assert_status_ok();
    response.assert_text("ok");

    ctx.server.get("/health/ready").await.assert_status_ok();
}
