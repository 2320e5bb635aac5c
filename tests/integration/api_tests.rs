//! API integration tests

use std::path::{Path, PathBuf};

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tempfile::TempDir;

use bookshelf_server::{api, config::AppConfig, repository::Repository, AppState};

/// Server bound to an ephemeral port with its own backing file
struct TestServer {
    base_url: String,
    path: PathBuf,
    _dir: TempDir,
}

impl TestServer {
    async fn start() -> Self {
        Self::start_with(AppConfig::default()).await
    }

    async fn start_with(config: AppConfig) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("books.json");
        let base_url = serve(config, &path).await;
        Self {
            base_url,
            path,
            _dir: dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

async fn serve(mut config: AppConfig, path: &Path) -> String {
    config.storage.path = path.to_path_buf();
    let repository = Repository::open(&config.storage).expect("Failed to open book storage");
    let app = api::create_router(AppState::new(config, repository));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("No local address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    format!("http://{}", addr)
}

fn book(title: &str) -> Value {
    json!({
        "title": title,
        "author": "Test Yazarı",
        "isbn": "1111222233",
        "publishedDate": "2025-01-01",
        "available": true
    })
}

async fn create(client: &Client, server: &TestServer, body: &Value) -> Value {
    let response = client
        .post(server.url("/api/books"))
        .json(body)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await.expect("Failed to parse response")
}

#[tokio::test]
async fn test_create_book() {
    let server = TestServer::start().await;
    let client = Client::new();

    let response = client
        .post(server.url("/api/books"))
        .json(&book("Jest ile Test"))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::CREATED);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["id"].is_string());
    assert_eq!(body["title"], "Jest ile Test");
    assert_eq!(body["createdAt"], body["updatedAt"]);
}

#[tokio::test]
async fn test_create_without_title_is_rejected() {
    let server = TestServer::start().await;
    let client = Client::new();

    let response = client
        .post(server.url("/api/books"))
        .json(&json!({
            "author": "Test Yazarı",
            "isbn": "1111222233",
            "publishedDate": "2025-01-01",
            "available": true
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["message"], "Ungültige Eingabedaten");
    assert_eq!(
        body["errors"],
        json!(["Titel ist erforderlich und muss mindestens 3 Zeichen lang sein."])
    );

    let list: Value = client
        .get(server.url("/api/books"))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn test_create_reports_all_violations() {
    let server = TestServer::start().await;
    let client = Client::new();

    let response = client
        .post(server.url("/api/books"))
        .json(&json!({
            "title": "Ok",
            "author": "Test Yazarı",
            "isbn": "12-34",
            "publishedDate": "2025-13-01",
            "available": "yes"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["errors"].as_array().map(Vec::len), Some(4));
}

#[tokio::test]
async fn test_malformed_json_is_a_bad_request() {
    let server = TestServer::start().await;
    let client = Client::new();

    let response = client
        .post(server.url("/api/books"))
        .header("Content-Type", "application/json")
        .body("{\"title\": ")
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["message"], "Ungültige Eingabedaten");
}

#[tokio::test]
async fn test_list_books() {
    let server = TestServer::start().await;
    let client = Client::new();

    create(&client, &server, &book("Das erste Buch")).await;

    let response = client
        .get(server.url("/api/books"))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body.as_array().map(Vec::len), Some(1));
    assert_eq!(body[0]["title"], "Das erste Buch");
}

#[tokio::test]
async fn test_get_book_round_trip() {
    let server = TestServer::start().await;
    let client = Client::new();

    let created = create(&client, &server, &book("Das erste Buch")).await;
    let id = created["id"].as_str().expect("No book ID");

    let response = client
        .get(server.url(&format!("/api/books/{}", id)))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::OK);
    let fetched: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn test_get_unknown_book() {
    let server = TestServer::start().await;
    let client = Client::new();

    for id in ["3f1c2b8e-0000-4000-8000-000000000000", "gibt-es-nicht"] {
        let response = client
            .get(server.url(&format!("/api/books/{}", id)))
            .send()
            .await
            .expect("Failed to send request");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body: Value = response.json().await.expect("Failed to parse response");
        assert_eq!(body, json!({ "message": "Buch nicht gefunden" }));
    }
}

#[tokio::test]
async fn test_update_book() {
    let server = TestServer::start().await;
    let client = Client::new();

    let created = create(&client, &server, &book("Das erste Buch")).await;
    let id = created["id"].as_str().expect("No book ID");

    let mut changes = book("Das zweite Buch");
    changes["available"] = json!(false);
    changes["id"] = json!("ignoriert");

    let response = client
        .put(server.url(&format!("/api/books/{}", id)))
        .json(&changes)
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::OK);
    let updated: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(updated["id"], created["id"]);
    assert_eq!(updated["title"], "Das zweite Buch");
    assert_eq!(updated["available"], false);
    assert_eq!(updated["createdAt"], created["createdAt"]);
}

#[tokio::test]
async fn test_update_requires_full_payload() {
    let server = TestServer::start().await;
    let client = Client::new();

    let created = create(&client, &server, &book("Das erste Buch")).await;
    let id = created["id"].as_str().expect("No book ID");

    let response = client
        .put(server.url(&format!("/api/books/{}", id)))
        .json(&json!({ "available": false }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["message"], "Ungültige Eingabedaten");
}

#[tokio::test]
async fn test_update_unknown_book() {
    let server = TestServer::start().await;
    let client = Client::new();

    let response = client
        .put(server.url("/api/books/3f1c2b8e-0000-4000-8000-000000000000"))
        .json(&book("Das erste Buch"))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["message"], "Buch nicht gefunden");
}

#[tokio::test]
async fn test_delete_book() {
    let server = TestServer::start().await;
    let client = Client::new();

    let created = create(&client, &server, &book("Das erste Buch")).await;
    let url = server.url(&format!("/api/books/{}", created["id"].as_str().expect("No book ID")));

    let response = client.delete(&url).send().await.expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(response.bytes().await.expect("Failed to read body").is_empty());

    let response = client.get(&url).send().await.expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = client.delete(&url).send().await.expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["message"], "Buch nicht gefunden");
}

#[tokio::test]
async fn test_unknown_route() {
    let server = TestServer::start().await;
    let client = Client::new();

    let response = client
        .get(server.url("/api/authors"))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body, json!({ "message": "Ressource nicht gefunden" }));
}

#[tokio::test]
async fn test_unsupported_method_on_known_path() {
    let server = TestServer::start().await;
    let client = Client::new();

    let requests = [
        client.patch(server.url("/api/books")),
        client.post(server.url("/api/books/3f1c2b8e-0000-4000-8000-000000000000")),
        client.delete(server.url("/health")),
    ];

    for request in requests {
        let response = request.send().await.expect("Failed to send request");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body: Value = response.json().await.expect("Failed to parse response");
        assert_eq!(body, json!({ "message": "Ressource nicht gefunden" }));
    }
}

#[tokio::test]
async fn test_array_body_is_rejected() {
    let server = TestServer::start().await;
    let client = Client::new();

    let response = client
        .post(server.url("/api/books"))
        .json(&json!(["Jest ile Test", "Test Yazarı", "1111222233", "2025-01-01", true]))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["message"], "Ungültige Eingabedaten");
    assert_eq!(body["errors"].as_array().map(Vec::len), Some(5));
}

#[tokio::test]
async fn test_published_date_round_trips_unchanged() {
    let server = TestServer::start().await;
    let client = Client::new();

    let mut unpadded = book("Das erste Buch");
    unpadded["publishedDate"] = json!("2025-1-1");
    let response = client
        .post(server.url("/api/books"))
        .json(&unpadded)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let created = create(&client, &server, &book("Das erste Buch")).await;
    let id = created["id"].as_str().expect("No book ID");
    let fetched: Value = client
        .get(server.url(&format!("/api/books/{}", id)))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(fetched["publishedDate"], "2025-01-01");
}

#[tokio::test]
async fn test_changes_are_flushed_and_reloaded() {
    let server = TestServer::start().await;
    let client = Client::new();

    let first = create(&client, &server, &book("Das erste Buch")).await;
    let second = create(&client, &server, &book("Das zweite Buch")).await;
    client
        .delete(server.url(&format!("/api/books/{}", first["id"].as_str().expect("No book ID"))))
        .send()
        .await
        .expect("Failed to send request");

    let on_disk: Value = serde_json::from_str(
        &std::fs::read_to_string(&server.path).expect("Backing file missing"),
    )
    .expect("Backing file is not JSON");
    assert_eq!(on_disk, json!([second.clone()]));

    // A second server on the same file sees the same collection
    let base_url = serve(AppConfig::default(), &server.path).await;
    let list: Value = client
        .get(format!("{}/api/books", base_url))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(list, json!([second]));
}

#[tokio::test]
async fn test_readiness_reports_book_count() {
    let server = TestServer::start().await;
    let client = Client::new();

    create(&client, &server, &book("Das erste Buch")).await;

    let body: Value = client
        .get(server.url("/ready"))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(body["status"], "ready");
    assert_eq!(body["books"], 1);
}

#[tokio::test]
async fn test_cors_allows_only_configured_origin() {
    let mut config = AppConfig::default();
    config.cors.enabled = true;
    config.cors.origin = "http://localhost:3000".to_string();
    let server = TestServer::start_with(config).await;
    let client = Client::new();

    let response = client
        .get(server.url("/api/books"))
        .header("Origin", "http://localhost:3000")
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("http://localhost:3000")
    );

    let response = client
        .get(server.url("/api/books"))
        .header("Origin", "http://evil.example")
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.headers().get("access-control-allow-origin").is_none());
}
