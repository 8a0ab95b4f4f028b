use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use pawmedbot::core::config::{AppConfig, AppPaths};
use pawmedbot::core::errors::ApiError;
use pawmedbot::llm::types::ChatRequest;
use pawmedbot::llm::{LlmProvider, LlmService};
use pawmedbot::server;
use pawmedbot::state::AppState;

struct FakeModel {
    prompts: Mutex<Vec<String>>,
}

fn embed_text(text: &str) -> Vec<f32> {
    let mut v = vec![0.0f32; 16];
    for word in text.to_lowercase().split(|c: char| !c.is_alphanumeric()) {
        if word.is_empty() {
            continue;
        }
        let bucket = word.bytes().map(|b| b as usize).sum::<usize>() % 16;
        v[bucket] += 1.0;
    }
    v
}

#[async_trait]
impl LlmProvider for FakeModel {
    fn name(&self) -> &str {
        "fake"
    }

    async fn health_check(&self) -> Result<bool, ApiError> {
        Ok(true)
    }

    async fn list_models(&self) -> Result<Vec<String>, ApiError> {
        Ok(vec!["phi3:mini".to_string()])
    }

    async fn chat(&self, request: ChatRequest, _model_id: &str) -> Result<String, ApiError> {
        let prompt = request
            .messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        self.prompts.lock().unwrap().push(prompt);
        Ok("Keep your dog hydrated and call a vet if vomiting continues.".to_string())
    }

    async fn embed(&self, inputs: &[String], _model_id: &str) -> Result<Vec<Vec<f32>>, ApiError> {
        Ok(inputs.iter().map(|s| embed_text(s)).collect())
    }
}

struct TestApp {
    _dir: tempfile::TempDir,
    router: Router,
    model: Arc<FakeModel>,
}

async fn app() -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let paths = Arc::new(AppPaths::rooted_at(dir.path()));
    std::fs::write(
        paths.documents_dir.join("dogs.txt"),
        "Dog vomiting: withhold food for a few hours and offer small sips of water.\n\n\
         Puppy vaccines start at six to eight weeks.",
    )
    .unwrap();

    let model = Arc::new(FakeModel {
        prompts: Mutex::new(Vec::new()),
    });
    let settings = AppConfig::default();
    let llm = LlmService::with_provider(model.clone(), settings.llm.clone());
    let state = AppState::build(paths, settings, llm).await.unwrap();

    let report = state.indexer.ensure_index().await.unwrap();
    assert!(report.rebuilt);
    assert!(report.chunks >= 1);

    TestApp {
        _dir: dir,
        router: server::router(state),
        model,
    }
}

async fn call(
    router: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn send_raw(
    router: &Router,
    uri: &str,
    token: Option<&str>,
    content_type: Option<&str>,
    body: &str,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(Method::POST).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    if let Some(content_type) = content_type {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }
    let request = builder.body(Body::from(body.to_string())).unwrap();

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn signup_and_login(router: &Router) -> String {
    let (status, body) = call(
        router,
        Method::POST,
        "/api/auth/signup",
        None,
        Some(json!({
            "name": "Ada",
            "email": "ada@example.com",
            "password": "woof123",
            "confirm_password": "woof123"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Signup successful! You can now log in.");

    let (status, body) = call(
        router,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({"email": "ADA@example.com", "password": "woof123"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["name"], "Ada");
    assert!(body["user"].get("password_hash").is_none());
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_and_status_are_public() {
    let app = app().await;

    let (status, body) = call(&app.router, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = call(&app.router, Method::GET, "/api/status", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["indexed_chunks"].as_u64().unwrap() >= 1);
    assert_eq!(body["llm"]["reachable"], true);
    assert_eq!(body["llm"]["installed_models"], json!(["phi3:mini"]));
}

#[tokio::test]
async fn protected_routes_need_a_session() {
    let app = app().await;

    let (status, body) = call(
        &app.router,
        Method::POST,
        "/api/chat",
        None,
        Some(json!({"message": "my dog is sick"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Please login first.");

    let (status, _) = call(&app.router, Method::GET, "/api/history", Some("bogus"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn signup_and_login_failures() {
    let app = app().await;
    signup_and_login(&app.router).await;

    let (status, body) = call(
        &app.router,
        Method::POST,
        "/api/auth/signup",
        None,
        Some(json!({
            "name": "Other",
            "email": "ada@example.com",
            "password": "x",
            "confirm_password": "x"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Email already exists. Try logging in.");

    let (status, body) = call(
        &app.router,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({"email": "ada@example.com", "password": "nope"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Incorrect password.");

    let (status, body) = call(
        &app.router,
        Method::POST,
        "/api/auth/signup",
        None,
        Some(json!({"name": "", "email": "x@y.z"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Please fill all fields.");
}

#[tokio::test]
async fn chat_history_flow() {
    let app = app().await;
    let token = signup_and_login(&app.router).await;
    let token = Some(token.as_str());

    let (status, body) = call(
        &app.router,
        Method::POST,
        "/api/chat",
        token,
        Some(json!({"message": "hello"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["kind"], "greeting");
    assert!(app.model.prompts.lock().unwrap().is_empty());

    let (status, body) = call(
        &app.router,
        Method::POST,
        "/api/chat",
        token,
        Some(json!({"message": "What is the capital of India?"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["kind"], "off_topic");

    let (status, body) = call(
        &app.router,
        Method::POST,
        "/api/chat",
        token,
        Some(json!({"message": "My dog keeps vomiting, what should I do?"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["kind"], "answer");
    assert_eq!(
        body["reply"],
        "Keep your dog hydrated and call a vet if vomiting continues."
    );
    assert_eq!(body["sources"][0], "dogs.txt");
    {
        let prompts = app.model.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Previous conversation:"));
        assert!(prompts[0].contains("Dog vomiting"));
    }

    let (status, body) = call(&app.router, Method::GET, "/api/history", token, None).await;
    assert_eq!(status, StatusCode::OK);
    let history = body["history"].as_array().unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(
        history[0]["question"],
        "My dog keeps vomiting, what should I do?"
    );
    assert_eq!(history[2]["question"], "hello");

    let (status, body) = call(&app.router, Method::DELETE, "/api/history", token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "All history deleted!");
    assert_eq!(body["deleted"], 3);

    let (_, body) = call(&app.router, Method::GET, "/api/history", token, None).await;
    assert!(body["history"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn profile_updates_and_logout() {
    let app = app().await;
    let token = signup_and_login(&app.router).await;
    let token = Some(token.as_str());

    let (status, body) = call(
        &app.router,
        Method::PATCH,
        "/api/profile/name",
        token,
        Some(json!({"name": "  "})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Name cannot be empty.");

    let (status, body) = call(
        &app.router,
        Method::PATCH,
        "/api/profile/name",
        token,
        Some(json!({"name": "Grace"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Name updated successfully!");

    let (_, body) = call(&app.router, Method::GET, "/api/profile", token, None).await;
    assert_eq!(body["user"]["name"], "Grace");
    assert_eq!(body["user"]["email"], "ada@example.com");

    let (status, body) = call(
        &app.router,
        Method::POST,
        "/api/profile/password",
        token,
        Some(json!({
            "old_password": "wrong",
            "new_password": "bark456",
            "confirm_new_password": "bark456"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Old password is incorrect.");

    let (status, body) = call(
        &app.router,
        Method::POST,
        "/api/profile/password",
        token,
        Some(json!({
            "old_password": "woof123",
            "new_password": "bark456",
            "confirm_new_password": "bark456"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Password changed successfully!");

    let (status, body) = call(&app.router, Method::POST, "/api/auth/logout", token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Goodbye, Grace!");

    let (status, _) = call(&app.router, Method::GET, "/api/profile", token, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn rebuild_reports_counts() {
    let app = app().await;
    let token = signup_and_login(&app.router).await;

    let (status, body) = call(
        &app.router,
        Method::POST,
        "/api/index/rebuild",
        Some(token.as_str()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["report"]["documents"], 1);
    assert_eq!(body["report"]["rebuilt"], true);
}

#[tokio::test]
async fn malformed_bodies_are_json_bad_requests() {
    let app = app().await;

    let (status, body) = send_raw(
        &app.router,
        "/api/auth/signup",
        None,
        Some("application/json"),
        r#"{"name": 5}"#,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Invalid request body"));

    let (status, body) = send_raw(&app.router, "/api/auth/login", None, None, "{}").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let token = signup_and_login(&app.router).await;
    let (status, body) = send_raw(
        &app.router,
        "/api/chat",
        Some(token.as_str()),
        Some("application/json"),
        "{not json",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn session_is_checked_before_the_body() {
    let app = app().await;

    let (status, body) = send_raw(&app.router, "/api/chat", None, None, "hello").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Please login first.");

    let (status, _) = send_raw(
        &app.router,
        "/api/profile/name",
        Some("bogus"),
        Some("application/json"),
        r#"{"name": []}"#,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
