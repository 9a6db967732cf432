//! Shared test utilities for integration tests.
//!
//! The seeded store mirrors `migrations/0002_seed_demo_rows.sql`, so the
//! in-process tests and a freshly migrated SQLite file agree on the data.

#![allow(dead_code)]

use axum_test::TestServer;
use panel_services::{
    config::Config,
    database::MemoryStore,
    registry::Registry,
    routes,
    table::{Row, Value},
    tables,
};

pub const PREFIX: &str = "/admin";

fn row<const N: usize>(pairs: [(&str, Value); N]) -> Row {
    pairs
        .into_iter()
        .map(|(field, value)| (field.to_owned(), value))
        .collect()
}

fn text(s: &str) -> Value {
    Value::from(s)
}

pub fn seeded_store() -> MemoryStore {
    let authors = [
        (1, "Ada", "Lovelace", "ada@example.com", "1815-12-10"),
        (2, "Grace", "Hopper", "grace@example.com", "1906-12-09"),
        (3, "Alan", "Turing", "alan@example.com", "1912-06-23"),
        (4, "Edsger", "Dijkstra", "edsger@example.com", "1930-05-11"),
    ]
    .into_iter()
    .map(|(id, first, last, email, birthdate)| {
        row([
            ("id", Value::Int(id)),
            ("first_name", text(first)),
            ("last_name", text(last)),
            ("email", text(email)),
            ("birthdate", text(birthdate)),
            ("added", text("2024-01-05 09:00:00")),
        ])
    })
    .collect();

    let posts = [
        (1, 1, "Notes on the Analytical Engine"),
        (2, 2, "Compilers for everyone"),
        (3, 3, "Computing machinery"),
        (4, 4, "Go To considered harmful"),
        (5, 9, "Orphaned post"),
    ]
    .into_iter()
    .map(|(id, author_id, title)| {
        row([
            ("id", Value::Int(id)),
            ("author_id", Value::Int(author_id)),
            ("title", text(title)),
            ("description", text("")),
            ("content", text("<p></p>")),
            ("date", text("2024-02-01 08:00:00")),
        ])
    })
    .collect();

    let users = [
        (1, "Jack", 0, "beijing", 0, "2024-03-01 09:00:00"),
        (2, "Jane", 1, "london", 2, "2024-03-02 10:00:00"),
        (3, "Bob", 0, "new york", 1, "2024-03-03 11:00:00"),
        (4, "Alice", 1, "toronto", 3, "2024-03-04 12:00:00"),
    ]
    .into_iter()
    .map(|(id, name, gender, city, country, created_at)| {
        row([
            ("id", Value::Int(id)),
            ("name", text(name)),
            ("gender", Value::Int(gender)),
            ("city", text(city)),
            ("ip", text(&format!("127.0.0.{id}"))),
            ("phone", text(&format!("1330000000{}", id - 1))),
            ("country", Value::Int(country)),
            ("avatar", text("")),
            ("created_at", text(created_at)),
            ("updated_at", text(created_at)),
        ])
    })
    .collect();

    let profile = vec![row([
        ("id", Value::Int(1)),
        ("uuid", text("7a1c9f6e-0b2d-4c83-9f51-1d2e3f4a5b6c")),
        ("photos", text("https://example.com/a.png")),
        ("finish_state", Value::Int(0)),
        ("finish_progress", Value::Int(10)),
        ("pass", Value::Int(1)),
        ("resume", text("files/resume-jack.pdf")),
        ("resume_size", Value::Int(20480)),
    ])];

    let statistics = vec![row([
        ("id", Value::Int(1)),
        ("cpu", Value::Int(100)),
        ("likes", Value::Int(41410)),
        ("sales", Value::Int(760)),
        ("new_members", Value::Int(2000)),
    ])];

    MemoryStore::new()
        .with_table("authors", authors)
        .with_table("posts", posts)
        .with_table("users", users)
        .with_table("profile", profile)
        .with_table("statistics", statistics)
}

/// Test server over the seeded store and the stock tables.
pub fn create_test_app() -> TestServer {
    create_test_app_with(seeded_store(), default_registry())
}

pub fn create_test_app_with(store: MemoryStore, registry: Registry) -> TestServer {
    let app = routes(store, registry, Config::new_for_test());
    TestServer::new(app).unwrap()
}

pub fn default_registry() -> Registry {
    tables::default_registry().unwrap()
}
