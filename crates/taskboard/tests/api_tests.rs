//! End-to-end tests for the Taskboard HTTP API.
//!
//! Each test starts the real router on a random port with the in-memory
//! store and the demo accounts. The chat-completion endpoint is a wiremock
//! server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Days, Local, NaiveDateTime};
use reqwest::{header, StatusCode};
use serde_json::{json, Value};
use taskboard::seed::seed_demo_users;
use taskboard::{build_router, AppState, Config, MemoryStorage, Storage};
use tokio::net::TcpListener;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// =============================================================================
// Harness
// =============================================================================

struct TestApp {
    addr: SocketAddr,
    client: reqwest::Client,
}

impl TestApp {
    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn login(&self, email: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/auth/login"))
            .form(&[("username", email), ("password", password)])
            .send()
            .await
            .expect("Failed to send request")
    }

    async fn admin_token(&self) -> String {
        let body: Value = self
            .login("admin@example.com", "admin123")
            .await
            .json()
            .await
            .unwrap();
        body["access_token"].as_str().unwrap().to_string()
    }

    async fn create_task(&self, token: &str, body: Value) -> Value {
        let response = self
            .client
            .post(self.url("/tasks/"))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        response.json().await.unwrap()
    }

    async fn ask(&self, token: &str, question: &str) -> reqwest::Response {
        self.client
            .post(self.url("/chat/query"))
            .bearer_auth(token)
            .json(&json!({ "question": question }))
            .send()
            .await
            .unwrap()
    }
}

/// Start the API. With `llm`, chat calls go to that mock server.
async fn spawn_app(llm: Option<&MockServer>, chat_timeout: Duration) -> TestApp {
    let mut config = Config::new("test-secret");
    config.bcrypt_cost = 4;
    config.chat.timeout = chat_timeout;
    if let Some(server) = llm {
        config.chat.api_key = Some("test-key".to_string());
        config.chat.api_url = format!("{}/chat/completions", server.uri());
    }

    let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
    let state = AppState::new(&config, storage.clone()).unwrap();
    seed_demo_users(storage.as_ref(), &state.hasher).await.unwrap();

    let app = build_router(state, Duration::from_secs(10));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        addr,
        client: reqwest::Client::new(),
    }
}

fn days_from_today(offset: i64) -> NaiveDateTime {
    let today = Local::now().date_naive();
    let day = if offset >= 0 {
        today.checked_add_days(Days::new(offset.unsigned_abs()))
    } else {
        today.checked_sub_days(Days::new(offset.unsigned_abs()))
    };
    day.unwrap().and_hms_opt(10, 0, 0).unwrap()
}

fn iso(dt: NaiveDateTime) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S").to_string()
}

fn completion(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{ "message": { "role": "assistant", "content": content } }]
    }))
}

// =============================================================================
// Health and authentication
// =============================================================================

#[tokio::test]
async fn test_health() {
    let app = spawn_app(None, Duration::from_secs(5)).await;
    let response = app.client.get(app.url("/health")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn test_login_issues_bearer_token() {
    let app = spawn_app(None, Duration::from_secs(5)).await;
    let response = app.login("budi@example.com", "password").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["token_type"], "bearer");
    assert!(body["access_token"].as_str().unwrap().contains('.'));
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() {
    let app = spawn_app(None, Duration::from_secs(5)).await;

    for (email, password) in [
        ("budi@example.com", "wrong-password"),
        ("nobody@example.com", "password"),
    ] {
        let response = app.login(email, password).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["detail"], "Incorrect email or password");
    }
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = spawn_app(None, Duration::from_secs(5)).await;

    let response = app.client.get(app.url("/tasks/")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["detail"], "Not authenticated");

    let response = app
        .client
        .get(app.url("/users"))
        .bearer_auth("garbage.token.value")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["detail"], "Could not validate credentials");
}

// =============================================================================
// Users
// =============================================================================

#[tokio::test]
async fn test_create_and_list_users() {
    let app = spawn_app(None, Duration::from_secs(5)).await;
    let token = app.admin_token().await;

    let response = app
        .client
        .post(app.url("/users/"))
        .bearer_auth(&token)
        .json(&json!({ "name": "Rina", "email": "rina@example.com", "password": "secret1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: Value = response.json().await.unwrap();
    assert_eq!(created["name"], "Rina");
    assert!(created.get("password_hash").is_none());

    let response = app
        .client
        .post(app.url("/users"))
        .bearer_auth(&token)
        .json(&json!({ "name": "Rina Lain", "email": "rina@example.com", "password": "secret1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["detail"], "Email already registered");

    let users: Vec<Value> = app
        .client
        .get(app.url("/users/"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(users.len(), 4);
    assert_eq!(users[0]["email"], "rina@example.com");

    // The new account can log in.
    let response = app.login("rina@example.com", "secret1").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_create_user_validation() {
    let app = spawn_app(None, Duration::from_secs(5)).await;
    let token = app.admin_token().await;

    let response = app
        .client
        .post(app.url("/users/"))
        .bearer_auth(&token)
        .json(&json!({ "name": "Rina", "email": "rina@example.com", "password": "123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// =============================================================================
// Tasks
// =============================================================================

#[tokio::test]
async fn test_task_lifecycle() {
    let app = spawn_app(None, Duration::from_secs(5)).await;
    let token = app.admin_token().await;

    let users: Vec<Value> = app
        .client
        .get(app.url("/users/"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let siti = users.iter().find(|u| u["name"] == "Siti").unwrap();

    let deadline = iso(days_from_today(3));
    let created = app
        .create_task(
            &token,
            json!({
                "title": "Laporan keuangan",
                "description": "Q3",
                "deadline": deadline,
                "assignee_id": siti["id"],
            }),
        )
        .await;
    assert_eq!(created["status"], "Todo");
    assert_eq!(created["assignee_name"], "Siti");
    assert_eq!(created["deadline"], deadline);
    let id = created["id"].as_i64().unwrap();

    let response = app
        .client
        .put(app.url(&format!("/tasks/{id}")))
        .bearer_auth(&token)
        .json(&json!({ "status": "In Progress", "deadline": null }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated: Value = response.json().await.unwrap();
    assert_eq!(updated["status"], "In Progress");
    assert_eq!(updated["deadline"], Value::Null);
    assert_eq!(updated["title"], "Laporan keuangan");
    assert_eq!(updated["assignee_name"], "Siti");

    let fetched: Value = app
        .client
        .get(app.url(&format!("/tasks/{id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched, updated);

    let response = app
        .client
        .delete(app.url(&format!("/tasks/{id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .client
        .get(app.url(&format!("/tasks/{id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["detail"], "Task not found");
}

#[tokio::test]
async fn test_unknown_assignee_is_not_found() {
    let app = spawn_app(None, Duration::from_secs(5)).await;
    let token = app.admin_token().await;

    let response = app
        .client
        .post(app.url("/tasks/"))
        .bearer_auth(&token)
        .json(&json!({ "title": "Orphan", "assignee_id": 999 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["detail"], "Assignee not found");

    let task = app.create_task(&token, json!({ "title": "Real" })).await;
    let response = app
        .client
        .put(app.url(&format!("/tasks/{}", task["id"])))
        .bearer_auth(&token)
        .json(&json!({ "assignee_id": 999 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_task_validation_errors() {
    let app = spawn_app(None, Duration::from_secs(5)).await;
    let token = app.admin_token().await;

    let response = app
        .client
        .post(app.url("/tasks"))
        .bearer_auth(&token)
        .json(&json!({ "title": "x".repeat(151) }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["detail"], "title cannot exceed 150 characters");

    let response = app
        .client
        .post(app.url("/tasks"))
        .bearer_auth(&token)
        .json(&json!({ "title": "Bad status", "status": "Blocked" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = app
        .client
        .put(app.url("/tasks/12345"))
        .bearer_auth(&token)
        .json(&json!({ "title": "Missing" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let app = spawn_app(None, Duration::from_secs(5)).await;
    let token = app.admin_token().await;

    let response = app
        .client
        .post(app.url("/tasks/"))
        .bearer_auth(&token)
        .header(header::ORIGIN, "http://localhost:3000")
        .json(&json!({ "title": "Big", "description": "x".repeat(1024 * 1024 + 16) }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    let body: Value = response.json().await.unwrap();
    assert!(body["detail"].is_string());

    let tasks: Value = app
        .client
        .get(app.url("/tasks/"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(tasks, json!([]));
}

// =============================================================================
// Chat
// =============================================================================

#[tokio::test]
async fn test_chat_overdue_question_sends_only_late_open_tasks() {
    let llm = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(completion("Ada 1 task yang terlambat: Laporan keuangan."))
        .expect(1)
        .mount(&llm)
        .await;

    let app = spawn_app(Some(&llm), Duration::from_secs(5)).await;
    let token = app.admin_token().await;

    let yesterday = iso(days_from_today(-1));
    app.create_task(
        &token,
        json!({ "title": "Laporan keuangan", "deadline": yesterday }),
    )
    .await;
    app.create_task(
        &token,
        json!({ "title": "Arsip dokumen", "deadline": yesterday, "status": "Done" }),
    )
    .await;
    app.create_task(
        &token,
        json!({ "title": "Presentasi klien", "deadline": iso(days_from_today(4)) }),
    )
    .await;

    let response = app.ask(&token, "task apa yang terlambat?").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["answer"], "Ada 1 task yang terlambat: Laporan keuangan.");

    let requests = llm.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let sent: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(sent["model"], "deepseek-chat");
    assert_eq!(sent["max_tokens"], 1000);
    assert_eq!(sent["messages"][0]["role"], "system");
    let prompt = sent["messages"][1]["content"].as_str().unwrap();
    assert!(prompt.starts_with("Pertanyaan user: task apa yang terlambat?"));
    assert!(prompt.contains("Laporan keuangan"));
    assert!(prompt.contains("TERLAMBAT 1 hari"));
    assert!(!prompt.contains("Arsip dokumen"));
    assert!(!prompt.contains("Presentasi klien"));
    assert_eq!(
        requests[0].headers.get("authorization").unwrap(),
        "Bearer test-key"
    );
}

#[tokio::test]
async fn test_chat_falls_back_to_all_tasks() {
    let llm = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(completion("Tidak ada task untuk hari ini."))
        .expect(1)
        .mount(&llm)
        .await;

    let app = spawn_app(Some(&llm), Duration::from_secs(5)).await;
    let token = app.admin_token().await;
    app.create_task(
        &token,
        json!({ "title": "Rapat mingguan", "deadline": iso(days_from_today(10)) }),
    )
    .await;

    let response = app.ask(&token, "apa deadline hari ini?").await;
    assert_eq!(response.status(), StatusCode::OK);

    let requests = llm.received_requests().await.unwrap();
    let sent: Value = serde_json::from_slice(&requests[0].body).unwrap();
    let prompt = sent["messages"][1]["content"].as_str().unwrap();
    assert!(prompt.contains("Rapat mingguan"));
}

#[tokio::test]
async fn test_chat_timeout_answers_busy_apology() {
    let llm = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(completion("too late").set_delay(Duration::from_secs(3)))
        .mount(&llm)
        .await;

    let app = spawn_app(Some(&llm), Duration::from_millis(300)).await;
    let token = app.admin_token().await;
    app.create_task(&token, json!({ "title": "Deploy" })).await;

    let response = app.ask(&token, "berapa task yang ada?").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body["answer"],
        "Maaf, server sedang sibuk. Silakan coba lagi dalam beberapa saat."
    );
}

#[tokio::test]
async fn test_chat_rate_limit_answers_apology() {
    let llm = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&llm)
        .await;

    let app = spawn_app(Some(&llm), Duration::from_secs(5)).await;
    let token = app.admin_token().await;
    app.create_task(&token, json!({ "title": "Deploy" })).await;

    let body: Value = app.ask(&token, "status?").await.json().await.unwrap();
    assert_eq!(
        body["answer"],
        "Maaf, terlalu banyak permintaan. Silakan tunggu sebentar dan coba lagi."
    );
}

#[tokio::test]
async fn test_chat_without_tasks_skips_model() {
    let llm = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(completion("unused"))
        .expect(0)
        .mount(&llm)
        .await;

    let app = spawn_app(Some(&llm), Duration::from_secs(5)).await;
    let token = app.admin_token().await;

    let body: Value = app
        .ask(&token, "task apa yang belum selesai?")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(
        body["answer"],
        "Saat ini tidak ada task yang tersedia di sistem. Silakan tambahkan task terlebih dahulu."
    );
}

#[tokio::test]
async fn test_chat_without_api_key_answers_generic_apology() {
    let app = spawn_app(None, Duration::from_secs(5)).await;
    let token = app.admin_token().await;
    app.create_task(&token, json!({ "title": "Deploy" })).await;

    let body: Value = app.ask(&token, "status?").await.json().await.unwrap();
    assert_eq!(body["answer"], "Maaf, terjadi kesalahan. Silakan coba lagi.");
}

#[tokio::test]
async fn test_chat_rejects_blank_question() {
    let app = spawn_app(None, Duration::from_secs(5)).await;
    let token = app.admin_token().await;

    let response = app.ask(&token, "   ").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["detail"], "Pertanyaan tidak boleh kosong");
}
