use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use bookeasy_api::{AppState, AppStateInner, cars::Catalog, router, storage::Storage};
use bookeasy_db::Database;
use bookeasy_mail::RecordingMailer;

struct TestApp {
    state: AppState,
    mailer: Arc<RecordingMailer>,
    upload_dir: std::path::PathBuf,
}

impl TestApp {
    async fn new() -> Self {
        let mailer = Arc::new(RecordingMailer::new());
        let upload_dir = std::env::temp_dir().join(format!("bookeasy-test-{}", Uuid::new_v4()));
        let state = Arc::new(AppStateInner {
            db: Database::open_in_memory().unwrap(),
            mailer: mailer.clone(),
            uploads: Storage::new(upload_dir.clone()).await.unwrap(),
            catalog: Catalog::seeded(),
            public_url: "http://localhost:8080".into(),
            support_mailbox: "support@bookeasy.test".into(),
        });
        Self {
            state,
            mailer,
            upload_dir,
        }
    }

    fn app(&self) -> Router {
        router(self.state.clone())
    }

    async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        let resp = self.app().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(
            Request::post(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    async fn register(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.post_json(
            "/register",
            json!({
                "first_name": "Alice",
                "last_name": "Smith",
                "email": email,
                "password": password,
            }),
        )
        .await
    }

    /// Token from the most recent confirmation mail.
    fn last_token(&self) -> String {
        let sent = self.mailer.sent();
        let body = &sent.last().expect("no mail sent").body;
        let start = body.find("token=").expect("no token in mail") + "token=".len();
        body[start..].split_whitespace().next().unwrap().to_string()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.upload_dir);
    }
}

#[tokio::test]
async fn register_confirm_login_round_trip() {
    let app = TestApp::new().await;

    let (status, body) = app.register("alice@example.com", "securepassword").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "success");

    let sent = app.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "alice@example.com");
    assert!(sent[0].body.contains("http://localhost:8080/confirm?token="));

    let login = json!({"email": "alice@example.com", "password": "securepassword"});
    let (status, body) = app.post_json("/login", login.clone()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["status"], "fail");

    let token = app.last_token();
    let (status, body) = app.get(&format!("/confirm?token={}", token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");

    let (status, body) = app.post_json("/login", login).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
}

#[tokio::test]
async fn password_is_not_stored_in_plaintext() {
    let app = TestApp::new().await;
    app.register("alice@example.com", "securepassword").await;

    let user = app
        .state
        .db
        .get_user_by_email("alice@example.com")
        .unwrap()
        .unwrap();
    assert_ne!(user.password, "securepassword");
    assert!(user.password.starts_with("$argon2"));
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let app = TestApp::new().await;

    let (status, _) = app.register("dup@example.com", "first-password").await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.register("dup@example.com", "second-password").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["status"], "fail");
    assert_eq!(app.mailer.sent().len(), 1);
}

#[tokio::test]
async fn register_validates_input() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post_json("/register", json!({"email": "x@example.com", "password": "pw"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "fail");

    let (status, body) = app
        .send(
            Request::post("/register")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "fail");
    assert!(app.mailer.sent().is_empty());
}

#[tokio::test]
async fn mail_failure_is_server_error() {
    let app = TestApp::new().await;
    app.mailer.set_failing(true);

    let (status, body) = app.register("nomail@example.com", "securepassword").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn confirmation_token_works_once() {
    let app = TestApp::new().await;
    app.register("once@example.com", "securepassword").await;
    let token = app.last_token();

    let (status, _) = app.get(&format!("/confirm?token={}", token)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.get(&format!("/confirm?token={}", token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "fail");

    let (status, _) = app.get("/confirm").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn tokens_differ_between_users() {
    let app = TestApp::new().await;
    app.register("one@example.com", "securepassword").await;
    let first = app.last_token();
    app.register("two@example.com", "securepassword").await;
    let second = app.last_token();

    assert_ne!(first, second);
}

#[tokio::test]
async fn login_failures() {
    let app = TestApp::new().await;
    app.register("bob@example.com", "right-password").await;

    let (status, _) = app
        .post_json("/login", json!({"email": "ghost@example.com", "password": "x"}))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .post_json("/login", json!({"email": "bob@example.com", "password": "wrong"}))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.post_json("/login", json!({"email": "bob@example.com"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn profile_lookup() {
    let app = TestApp::new().await;
    app.register("carol@example.com", "securepassword").await;

    let (status, body) = app.get("/profile?email=carol@example.com").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"first_name": "Alice", "last_name": "Smith", "email": "carol@example.com"})
    );

    let (status, _) = app.get("/profile?email=nobody@example.com").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.get("/profile").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn message_board() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/messages").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (status, _) = app
        .post_json("/send-chat-message", json!({"message": "hello"}))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = app
        .post_json("/contact", json!({"message": "Ann: ann@example.com - hi"}))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app.post_json("/send-chat-message", json!({"message": ""})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, body) = app.post_json("/contact", json!({"message": "  \n\t "})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "fail");

    let (_, body) = app.get("/messages").await;
    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["content"], "hello");
    let id = list[1]["id"].as_i64().unwrap();

    let (status, body) = app.get(&format!("/messages/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"], "Ann: ann@example.com - hi");

    let (status, _) = app.get("/messages/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, body) = app.get("/messages/abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "fail");

    let (status, body) = app.post_json("/clear-messages", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");

    let (_, body) = app.get("/messages").await;
    assert_eq!(body, json!([]));
}

fn multipart_body(boundary: &str, attachment: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in [("email", "guest@example.com"), ("message", "The car was dirty")] {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((filename, data)) = attachment {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"attachment\"; filename=\"{filename}\"\r\nContent-Type: image/jpeg\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    body
}

fn multipart_request(body: Vec<u8>, boundary: &str) -> Request<Body> {
    Request::post("/send-support-message")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn support_message_with_attachment() {
    let app = TestApp::new().await;
    let boundary = "XBOOKEASYX";
    let body = multipart_body(boundary, Some(("photo.jpg", &[0xff, 0xd8, 0xff, 0xe0][..])));

    let (status, resp) = app.send(multipart_request(body, boundary)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["status"], "success");

    let sent = app.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "support@bookeasy.test");
    assert_eq!(sent[0].subject, "Support Request");
    assert_eq!(sent[0].body, "Email: guest@example.com\nMessage: The car was dirty");
    let attachment = sent[0].attachment.as_ref().unwrap();
    assert_eq!(attachment.filename, "photo.jpg");
    assert_eq!(attachment.content_type, "image/jpeg");
    assert_eq!(attachment.data, vec![0xff, 0xd8, 0xff, 0xe0]);

    let saved: Vec<_> = std::fs::read_dir(&app.upload_dir).unwrap().collect();
    assert_eq!(saved.len(), 1);
}

#[tokio::test]
async fn support_message_without_attachment() {
    let app = TestApp::new().await;
    let boundary = "XBOOKEASYX";

    let (status, _) = app
        .send(multipart_request(multipart_body(boundary, None), boundary))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(app.mailer.sent()[0].attachment.is_none());
}

#[tokio::test]
async fn support_message_requires_fields() {
    let app = TestApp::new().await;
    let boundary = "XBOOKEASYX";
    let body = format!("--{boundary}\r\nContent-Disposition: form-data; name=\"email\"\r\n\r\na@b.c\r\n--{boundary}--\r\n");

    let (status, resp) = app
        .send(multipart_request(body.into_bytes(), boundary))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp["status"], "fail");

    let blank = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"email\"\r\n\r\na@b.c\r\n\
         --{boundary}\r\nContent-Disposition: form-data; name=\"message\"\r\n\r\n   \r\n--{boundary}--\r\n"
    );
    let (status, resp) = app
        .send(multipart_request(blank.into_bytes(), boundary))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp["status"], "fail");
    assert!(app.mailer.sent().is_empty());
}

#[tokio::test]
async fn support_message_too_large() {
    let app = TestApp::new().await;
    let boundary = "XBOOKEASYX";
    let big = vec![0u8; 11 * 1024 * 1024];
    let body = multipart_body(boundary, Some(("huge.jpg", &big[..])));

    let (status, resp) = app.send(multipart_request(body, boundary)).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(resp["status"], "fail");
    assert!(app.mailer.sent().is_empty());
    assert_eq!(std::fs::read_dir(&app.upload_dir).unwrap().count(), 0);
}

#[tokio::test]
async fn car_listing() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/cars").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_pages"], 9);
    assert_eq!(body["current_page"], 1);
    assert_eq!(body["cars"].as_array().unwrap().len(), 3);

    let (_, body) = app.get("/cars?category=Sports&sort=price&page=2").await;
    assert_eq!(body["total_pages"], 2);
    let models: Vec<_> = body["cars"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["model"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(models, ["Porsche 911 Turbo S", "Ferrari F8 Tributo"]);

    let (_, body) = app.get("/cars?page=garbage").await;
    assert_eq!(body["current_page"], 1);
}

#[tokio::test]
async fn undecodable_query_gets_json_fail() {
    let app = TestApp::new().await;

    for uri in [
        "/confirm?token=a&token=b",
        "/profile?email=a@b.c&email=d@e.f",
        "/cars?page=1&page=2",
    ] {
        let (status, body) = app.get(uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["status"], "fail", "{}", uri);
    }
}

#[tokio::test]
async fn admin_adds_car() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post_json(
            "/api/cars/add",
            json!({"model": "Lada Niva", "price": 30, "rating": 3.9, "category": "SUV", "brand": "Lada"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["model"], "Lada Niva");

    let (_, body) = app.get("/api/cars").await;
    assert_eq!(body.as_array().unwrap().len(), 26);

    let (_, body) = app.get("/cars?brand=Lada").await;
    assert_eq!(body["cars"][0]["model"], "Lada Niva");

    let (status, _) = app.post_json("/api/cars/add", json!({"model": "x"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn cors_preflight_is_answered() {
    let app = TestApp::new().await;
    let resp = app
        .app()
        .oneshot(
            Request::options("/login")
                .header(header::ORIGIN, "http://example.com")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(resp.status().is_success());
    assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}
