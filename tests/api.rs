use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use teatime::config::Session;
use teatime::db::Database;
use teatime::handler::{AppState, router};
use teatime::scripture;

struct TestApp {
    _dir: TempDir,
    app: Router,
    cookie: Option<String>,
}

impl TestApp {
    async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(&dir.path().join("api.sqlite")).await.unwrap();
        scripture::seed_bundled_topics(&db).await.unwrap();

        let app = router(AppState {
            db: Arc::new(db),
            session: Arc::new(Session::default()),
        });

        TestApp {
            _dir: dir,
            app,
            cookie: None,
        }
    }

    async fn send(&mut self, method: &str, path: &str, body: Option<Value>) -> (StatusCode, Value) {
        match body {
            Some(json) => self.send_raw(method, path, Some("application/json"), json.to_string()).await,
            None => self.send_raw(method, path, None, String::new()).await,
        }
    }

    async fn send_raw(
        &mut self,
        method: &str,
        path: &str,
        content_type: Option<&str>,
        body: String,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        let request = builder.body(Body::from(body)).unwrap();

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();

        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let pair = set_cookie.to_str().unwrap().split(';').next().unwrap().to_string();
            self.cookie = if pair.ends_with('=') { None } else { Some(pair) };
        }

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    async fn get(&mut self, path: &str) -> (StatusCode, Value) {
        self.send("GET", path, None).await
    }

    async fn post(&mut self, path: &str, body: Value) -> (StatusCode, Value) {
        self.send("POST", path, Some(body)).await
    }

    async fn register(&mut self, name: &str, email: &str) -> Value {
        let (status, data) = self
            .post(
                "/api/auth/register",
                json!({ "name": name, "email": email, "password": "secret123" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{data}");
        data
    }
}

#[tokio::test]
async fn test_study_session_flow() {
    let mut app = TestApp::new().await;

    let data = app.register("Tester", "tester@example.com").await;
    assert!(data["user"]["id"].as_i64().is_some());
    assert!(data["user"].get("password_hash").is_none());
    assert!(app.cookie.as_deref().unwrap().starts_with("teatime_session="));

    let (status, data) = app.get("/api/auth/me").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(data["user"]["email"], "tester@example.com");

    let (status, data) = app.get("/api/studies").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(data["studies"].as_array().unwrap().len(), 3);

    let (status, data) = app
        .post(
            "/api/notes",
            json!({ "content": "Integration note", "study_id": "matthew", "reference": "Matthew 5:9" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let note_id = data["note"]["id"].as_i64().unwrap();

    let (status, data) = app.get("/api/notes").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(data["notes"][0]["id"].as_i64(), Some(note_id));

    let (status, data) = app
        .post("/api/progress", json!({ "study_id": "matthew", "day": 1, "completed": true }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(data["days"], json!([1]));

    let (status, data) = app.get("/api/progress?study_id=matthew").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(data["days"], json!([1]));

    let (status, data) = app.get("/api/bible/lookup?reference=John%203:16").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(data["verse"]["book"], "John");
    assert_eq!(data["verse"]["verse"], 16);
    let context: Vec<i64> = data["context"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["verse"].as_i64().unwrap())
        .collect();
    assert_eq!(context, vec![15, 16, 17, 18]);
    assert!(data["topics"].as_array().unwrap().iter().any(|t| t["slug"] == "gospel"));

    let (status, _) = app.post("/api/auth/logout", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert!(app.cookie.is_none());

    let (status, data) = app.get("/api/auth/me").await;
    assert_eq!(status, StatusCode::OK);
    assert!(data["user"].is_null());
}

#[tokio::test]
async fn test_journal_requires_session() {
    let mut app = TestApp::new().await;

    let (status, data) = app.get("/api/notes").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(data["error"], "Authentication required");

    let (status, _) = app.post("/api/bookmarks", json!({ "reference": "Psalm 23:1" })).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    app.cookie = Some("teatime_session=forged".to_string());
    let (status, _) = app.get("/api/progress?study_id=matthew").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_registration_and_login_errors() {
    let mut app = TestApp::new().await;

    let (status, data) = app
        .post("/api/auth/register", json!({ "name": " ", "email": "x@example.com", "password": "p" }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(data["error"], "Name, email, and password are required");

    app.register("First", "dup@example.com").await;
    let (status, data) = app
        .post(
            "/api/auth/register",
            json!({ "name": "Second", "email": "dup@example.com", "password": "other" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(data["error"], "Email already registered");

    let (status, data) = app
        .post("/api/auth/login", json!({ "email": "dup@example.com", "password": "wrong" }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(data["error"], "Invalid credentials");

    let (status, data) = app
        .post("/api/auth/login", json!({ "email": "nobody@example.com", "password": "secret123" }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(data["error"], "Invalid credentials");

    app.cookie = None;
    let (status, data) = app
        .post("/api/auth/login", json!({ "email": " dup@example.com ", "password": "secret123" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(data["user"]["name"], "First");
    assert!(app.cookie.is_some());
}

#[tokio::test]
async fn test_notes_and_bookmarks_belong_to_their_owner() {
    let mut app = TestApp::new().await;

    app.register("Owner", "owner@example.com").await;
    let (_, data) = app.post("/api/notes", json!({ "content": "mine" })).await;
    let note_id = data["note"]["id"].as_i64().unwrap();
    let (status, data) = app.post("/api/bookmarks", json!({ "reference": "Psalm 23:1", "note": "rest" })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(data["bookmark"]["note"], "rest");

    let (status, data) = app.post("/api/notes", json!({ "content": "   " })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(data["error"], "Note content is required");

    let (status, data) = app.post("/api/bookmarks", json!({ "note": "no reference" })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(data["error"], "Reference is required");

    let owner_cookie = app.cookie.clone();
    app.register("Intruder", "intruder@example.com").await;

    let (status, _) = app
        .send("PATCH", &format!("/api/notes/{note_id}"), Some(json!({ "content": "stolen" })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.send("DELETE", &format!("/api/notes/{note_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, data) = app.get("/api/bookmarks").await;
    assert!(data["bookmarks"].as_array().unwrap().is_empty());

    app.cookie = owner_cookie;
    let (_, data) = app.get("/api/notes").await;
    assert_eq!(data["notes"][0]["content"], "mine");

    let (status, data) = app
        .send("PUT", &format!("/api/notes/{note_id}"), Some(json!({ "content": "edited", "reference": "John 3:16" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(data["note"]["content"], "edited");
    assert_eq!(data["note"]["reference"], "John 3:16");
}

#[tokio::test]
async fn test_progress_validation() {
    let mut app = TestApp::new().await;
    app.register("Reader", "reader@example.com").await;

    let (status, data) = app.get("/api/progress").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(data["error"], "study_id is required");

    let (status, data) = app.post("/api/progress", json!({ "study_id": "esther" })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(data["error"], "study_id and day are required");

    app.post("/api/progress", json!({ "study_id": "esther", "day": 2, "completed": true })).await;
    let (_, data) = app
        .post("/api/progress", json!({ "study_id": "esther", "day": 2, "completed": false }))
        .await;
    assert_eq!(data["days"], json!([]));
}

#[tokio::test]
async fn test_lookup_errors() {
    let mut app = TestApp::new().await;

    let (status, data) = app.get("/api/bible/lookup?reference=Psalm%2023").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(data["error"], "reference must include book, chapter, and verse");

    let (status, data) = app.get("/api/bible/lookup").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(data["error"], "reference, or book + chapter + verse are required");

    let (status, data) = app.get("/api/bible/lookup?reference=Obadiah%201:1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(data["error"], "Verse not found");

    let (status, data) = app.get("/api/bible/lookup?book=Psalm&chapter=23&verse=1").await;
    assert_eq!(status, StatusCode::OK);
    let context: Vec<i64> = data["context"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["verse"].as_i64().unwrap())
        .collect();
    assert_eq!(context, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_search() {
    let mut app = TestApp::new().await;

    let (status, data) = app.get("/api/bible/search?q=peacemakers").await;
    assert_eq!(status, StatusCode::OK);
    let results = data["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["book"], "Matthew");
    assert!(results[0]["snippet"].as_str().unwrap().contains("<mark>peacemakers</mark>"));

    let (_, data) = app.get("/api/bible/search?q=fast&testament=OT").await;
    let results = data["results"].as_array().unwrap();
    assert!(!results.is_empty());
    assert!(results.iter().all(|r| r["testament"] == "OT"));

    let (_, data) = app.get("/api/bible/search?q=fast&topic=fasting&book=Matthew").await;
    let verses: Vec<i64> = data["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["verse"].as_i64().unwrap())
        .collect();
    assert_eq!(verses, vec![16, 17]);

    let (_, data) = app.get("/api/bible/search?q=love&filter=salvation").await;
    let results = data["results"].as_array().unwrap();
    assert!(!results.is_empty());
    assert!(results.iter().all(|r| r["book"] == "John" || r["book"] == "1 John"));

    let (status, data) = app.get("/api/bible/search").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(data["error"], "q is required");

    for query in ["AND", "John:3", "%22unbalanced"] {
        let (status, data) = app.get(&format!("/api/bible/search?q={query}")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{query}");
        assert_eq!(data["error"], "invalid search query");
    }
}

#[tokio::test]
async fn test_malformed_requests_get_json_errors() {
    let mut app = TestApp::new().await;

    let body = json!({ "name": "A", "email": "a@example.com", "password": "p" }).to_string();
    let (status, data) = app.send_raw("POST", "/api/auth/register", None, body).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(data["error"].as_str().unwrap().contains("Content-Type"));

    let (status, data) = app
        .send_raw("POST", "/api/auth/register", Some("application/json"), "not json".to_string())
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(data["error"].is_string());

    let (status, data) = app.get("/api/bible/lookup?book=John&chapter=abc&verse=16").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(data["error"].is_string());

    app.register("Reader", "reader@example.com").await;
    let (status, data) = app.send("DELETE", "/api/notes/abc", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(data["error"].is_string());

    let (status, data) = app
        .send_raw("POST", "/api/notes", Some("application/json"), "{\"content\": 5}".to_string())
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(data["error"].is_string());
}

#[tokio::test]
async fn test_topics() {
    let mut app = TestApp::new().await;

    let (status, data) = app.get("/api/topics").await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = data["topics"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap())
        .collect();
    let mut sorted = titles.clone();
    sorted.sort();
    assert_eq!(titles, sorted);

    let (_, data) = app.get("/api/topics?filter=anxiety").await;
    let slugs: Vec<&str> = data["topics"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["slug"].as_str().unwrap())
        .collect();
    assert_eq!(slugs, vec!["fear", "peace"]);
    assert_eq!(data["topics"][0]["filters"], json!(["anxiety", "courage"]));

    let (_, data) = app.get("/api/topics?q=mercy").await;
    assert_eq!(data["topics"][0]["slug"], "justice");

    let (status, data) = app.get("/api/topics/comfort").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(data["topic"]["title"], "Comfort");
    let passages: Vec<String> = data["passages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| format!("{} {}:{}", p["book"].as_str().unwrap(), p["chapter"], p["verse"]))
        .collect();
    assert_eq!(
        passages,
        vec![
            "Matthew 5:4",
            "Psalm 23:1",
            "Psalm 23:2",
            "Psalm 23:3",
            "Psalm 23:4",
            "Psalm 23:5",
            "Psalm 23:6",
        ]
    );

    let (status, data) = app.get("/api/topics/unknown").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(data["error"], "Topic not found");
}

#[tokio::test]
async fn test_studies_and_shell() {
    let mut app = TestApp::new().await;

    let (status, data) = app.get("/api/studies/esther").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(data["study"]["estimatedMinutes"], 15);

    let (status, data) = app.get("/api/studies/leviticus").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(data["error"], "Study not found");

    let (status, data) = app.get("/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(data["status"], "ok");

    let (status, data) = app.get("/api/nowhere").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(data["error"], "Not found");

    let (status, data) = app.post("/api/logs", json!({ "message": "boom", "details": { "line": 3 } })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(data["success"], true);

    let (status, data) = app.post("/api/logs", json!({ "details": "nothing" })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(data["error"], "message is required");

    let request = Request::builder().uri("/studies/matthew").body(Body::empty()).unwrap();
    let response = app.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/html");
}
