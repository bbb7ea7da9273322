//! Test helpers: build the router over an in-memory store and drive the
//! registration, login and upload flows.

#![allow(dead_code)]

use axum::http::{header, StatusCode};
use axum_test::multipart::{MultipartForm, Part};
use axum_test::{TestResponse, TestServer};
use image_hoster::config::Config;
use image_hoster::storage::Storage;
use image_hoster::{app, AppState};
use std::sync::Arc;

pub const PASSWORD: &str = "Passw0rd!";
pub const PNG_BYTES: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

pub struct TestApp {
    pub server: TestServer,
    pub storage: Arc<Storage>,
}

pub fn setup_test_app() -> TestApp {
    let config = Config {
        session_secret: "integration-test-secret".to_string(),
        bcrypt_cost: 4,
        ..Config::default()
    };
    let storage = Arc::new(Storage::in_memory());
    let state = Arc::new(AppState::new(storage.clone(), config));
    let server = TestServer::new(app(state)).expect("Failed to create test server");

    TestApp { server, storage }
}

pub fn location(response: &TestResponse) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .expect("Expected a Location header")
        .to_string()
}

pub async fn register(server: &TestServer, username: &str, password: &str) -> TestResponse {
    server
        .post("/users/registration")
        .form(&[("username", username), ("password", password)])
        .await
}

/// Registers and logs in; returns the `Cookie` header value for the session.
pub async fn register_and_login(server: &TestServer, username: &str) -> String {
    let response = register(server, username, PASSWORD).await;
    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);

    let response = server
        .post("/users/login")
        .form(&[("username", username), ("password", PASSWORD)])
        .await;
    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/images");

    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .expect("Expected a session cookie")
        .to_string()
}

pub fn image_form(title: &str, tags: &str) -> MultipartForm {
    MultipartForm::new()
        .add_text("title", title)
        .add_text("description", "taken at dusk")
        .add_text("tags", tags)
}

pub async fn upload_image(server: &TestServer, cookie: &str, title: &str, tags: &str) {
    let part = Part::bytes(PNG_BYTES.to_vec())
        .file_name("image.png")
        .mime_type("image/png");
    let response = server
        .post("/images/upload")
        .add_header("Cookie", cookie)
        .multipart(image_form(title, tags).add_part("file", part))
        .await;

    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/images");
}
