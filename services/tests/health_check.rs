mod common;

use axum::http::StatusCode;
use panel_services::database::MemoryStore;

#[tokio::test]
async fn test_health_check_integration() {
    // Case 1: Connected
    let server = common::create_test_app();
    let response = server.get("/is-health").await;
    response.assert_status(StatusCode::OK);
    response.assert_text("OK");

    // Case 2: Disconnected
    let server =
        common::create_test_app_with(MemoryStore::disconnected(), common::default_registry());
    let response = server.get("/is-health").await;
    response.assert_status(StatusCode::BAD_GATEWAY);
}
