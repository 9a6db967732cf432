mod common;

use axum::http::StatusCode;
use serde_json::Value;

fn names(body: &Value) -> Vec<&str> {
    body["rows"]
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["name"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn list_filters_and_projects_display_values() {
    let server = common::create_test_app();

    let response = server.get("/admin/info/users?name=ja").await;
    response.assert_status_ok();
    let body = response.json::<Value>();

    assert_eq!(body["table"], "users");
    assert_eq!(body["total"], 2);
    assert_eq!(names(&body), vec!["Jane", "Jack"]);
    assert_eq!(body["rows"][0]["gender"], "women");
    assert_eq!(body["rows"][0]["personality"], "handsome");
    assert_eq!(body["capabilities"]["exportable"], true);
    assert_eq!(body["actions"].as_array().unwrap().len(), 9);
}

#[tokio::test]
async fn list_normalizes_paging_and_sorts() {
    let server = common::create_test_app();

    let body = server
        .get("/admin/info/users?__sort=id&__sort_type=asc&__page=0&__page_size=7")
        .await
        .json::<Value>();

    assert_eq!(body["page"], 1);
    assert_eq!(body["page_size"], 10);
    assert_eq!(body["page_count"], 1);
    assert_eq!(names(&body), vec!["Jack", "Jane", "Bob", "Alice"]);

    let body = server.get("/admin/info/users?__page=2").await.json::<Value>();
    assert_eq!(body["total"], 4);
    assert!(body["rows"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn list_resolves_joins_and_keeps_orphans() {
    let server = common::create_test_app();

    let body = server
        .get("/admin/info/posts?__sort_type=asc")
        .await
        .json::<Value>();
    let rows = body["rows"].as_array().unwrap();

    assert_eq!(rows.len(), 5);
    assert_eq!(rows[0]["name"], "Ada Lovelace");
    assert_eq!(rows[1]["name"], "Grace Hopper");
    assert_eq!(rows[4]["title"], "Orphaned post");
    assert_eq!(rows[4]["name"], "");
}

#[tokio::test]
async fn custom_source_reports_its_own_total() {
    let server = common::create_test_app();

    let body = server.get("/admin/info/external").await.json::<Value>();

    assert_eq!(body["total"], 10);
    assert_eq!(body["page_count"], 1);
    assert_eq!(body["rows"].as_array().unwrap().len(), 4);
    assert_eq!(body["rows"][0]["title"], "This is a title");
}

#[tokio::test]
async fn labels_follow_the_request_language() {
    let server = common::create_test_app();

    let body = server.get("/admin/info/users?lang=cn").await.json::<Value>();
    assert_eq!(body["title"], "用户");
    let gender_of_jane = body["rows"]
        .as_array()
        .unwrap()
        .iter()
        .find(|row| row["name"] == "Jane")
        .map(|row| row["gender"].clone());
    assert_eq!(gender_of_jane, Some(Value::from("女")));

    let body = server
        .get("/admin/info/users")
        .add_header(
            axum::http::header::ACCEPT_LANGUAGE,
            axum::http::HeaderValue::from_static("cn"),
        )
        .await
        .json::<Value>();
    assert_eq!(body["title"], "用户");
}

#[tokio::test]
async fn unknown_table_is_not_found() {
    let server = common::create_test_app();

    let response = server.get("/admin/info/nope").await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["error"], "not_found");
}

#[tokio::test]
async fn detail_reads_one_row() {
    let server = common::create_test_app();

    let body = server
        .get("/admin/info/authors/detail?pk=2")
        .await
        .json::<Value>();
    assert_eq!(body["row"]["name"], "Grace Hopper");
    assert_eq!(body["primary_key"], "id");

    let body = server
        .get("/admin/info/external/detail?pk=10")
        .await
        .json::<Value>();
    assert_eq!(body["row"]["title"], "This is a title");

    server
        .get("/admin/info/authors/detail")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    server
        .get("/admin/info/authors/detail?pk=99")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn menu_lists_every_table() {
    let server = common::create_test_app();

    let body = server.get("/admin/menu").await.json::<Value>();
    let items = body.as_array().unwrap();

    assert_eq!(items.len(), 5);
    assert_eq!(items[0]["name"], "authors");
    assert_eq!(items[0]["url"], "/admin/info/authors");
    assert_eq!(items[4]["title"], "Users");
}
