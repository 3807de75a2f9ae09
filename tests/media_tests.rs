// tests/media_tests.rs
//
// Lifecycle of image-bearing records: stored files follow their record, and
// the upload directory never accumulates orphans.

use std::path::PathBuf;

use portal_backend::{
    config::Config,
    routes,
    state::AppState,
    utils::{codes::CodeRegistry, hash::hash_password, mailer::Mailer},
};
use sqlx::sqlite::SqlitePoolOptions;

struct TestApp {
    address: String,
    admin_email: String,
    admin_password: String,
    upload_dir: tempfile::TempDir,
}

async fn spawn_app() -> TestApp {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory SQLite");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let upload_dir = tempfile::tempdir().expect("Failed to create temp upload dir");
    let admin_email = "admin@portal.test".to_string();
    let admin_password = "admin-password".to_string();

    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        admin_email: Some(admin_email.clone()),
        admin_password: Some(admin_password.clone()),
        upload_dir: upload_dir.path().to_str().unwrap().to_string(),
        smtp_host: None,
        smtp_port: 587,
        smtp_username: None,
        smtp_password: None,
        smtp_from: None,
    };

    let hashed = hash_password(&admin_password).unwrap();
    sqlx::query(
        "INSERT INTO users (email, name, age, password, role, is_verified, created_at)
         VALUES (?1, 'Administrator', 30, ?2, 'admin', 1, ?3)",
    )
    .bind(&admin_email)
    .bind(hashed)
    .bind(chrono::Utc::now())
    .execute(&pool)
    .await
    .expect("Failed to seed admin user");

    let state = AppState {
        pool,
        config,
        codes: CodeRegistry::new(),
        mailer: Mailer::unconfigured(),
    };

    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address,
        admin_email,
        admin_password,
        upload_dir,
    }
}

async fn admin_token(app: &TestApp, client: &reqwest::Client) -> String {
    let response = client
        .post(format!("{}/admin/login", app.address))
        .json(&serde_json::json!({
            "email": app.admin_email,
            "password": app.admin_password
        }))
        .send()
        .await
        .expect("Admin login failed");
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    body["token"].as_str().unwrap().to_string()
}

fn image_part(bytes: Vec<u8>, file_name: &str, mime: &str) -> reqwest::multipart::Part {
    reqwest::multipart::Part::bytes(bytes)
        .file_name(file_name.to_string())
        .mime_str(mime)
        .unwrap()
}

fn article_form(title: &str) -> reqwest::multipart::Form {
    reqwest::multipart::Form::new()
        .text("title", title.to_string())
        .text("summary", "A short summary.")
        .text("body", "<p>Body text.</p>")
        .text("category", "local")
}

fn stored_files(app: &TestApp) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(app.upload_dir.path())
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    files.sort();
    files
}

async fn create_article_with_image(
    app: &TestApp,
    client: &reqwest::Client,
    token: &str,
) -> (i64, String) {
    let form = article_form("With image").part(
        "image",
        image_part(b"first-image-bytes".to_vec(), "cover.png", "image/png"),
    );

    let response = client
        .post(format!("{}/admin/articles", app.address))
        .header("Authorization", format!("Bearer {}", token))
        .multipart(form)
        .send()
        .await
        .expect("Create article failed");
    assert_eq!(response.status().as_u16(), 201);
    let body: serde_json::Value = response.json().await.unwrap();
    let id = body["id"].as_i64().unwrap();

    let article: serde_json::Value = client
        .get(format!("{}/article?id={}", app.address, id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let image = article["image"].as_str().unwrap().to_string();
    (id, image)
}

#[tokio::test]
async fn created_article_serves_its_image() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let token = admin_token(&app, &client).await;

    let (_id, image) = create_article_with_image(&app, &client, &token).await;
    assert!(image.starts_with("/uploads/"));
    assert_eq!(stored_files(&app).len(), 1);

    // The stored reference resolves through the public static route.
    let response = client
        .get(format!("{}{}", app.address, image))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(
        response.bytes().await.unwrap().as_ref(),
        b"first-image-bytes" as &[u8]
    );
}

#[tokio::test]
async fn replacing_an_image_deletes_exactly_the_old_file() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let token = admin_token(&app, &client).await;

    let (id, old_image) = create_article_with_image(&app, &client, &token).await;

    let form = reqwest::multipart::Form::new().part(
        "image",
        image_part(b"second-image-bytes".to_vec(), "cover2.png", "image/png"),
    );
    let response = client
        .put(format!("{}/admin/articles/{}", app.address, id))
        .header("Authorization", format!("Bearer {}", token))
        .multipart(form)
        .send()
        .await
        .expect("Update article failed");
    assert_eq!(response.status().as_u16(), 200);

    let article: serde_json::Value = client
        .get(format!("{}/article?id={}", app.address, id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let new_image = article["image"].as_str().unwrap();
    assert_ne!(new_image, old_image);

    // Exactly one file remains and it is the new one.
    let files = stored_files(&app);
    assert_eq!(files.len(), 1);
    assert_eq!(
        files[0].file_name().unwrap().to_str().unwrap(),
        new_image.rsplit('/').next().unwrap()
    );
}

#[tokio::test]
async fn text_only_update_keeps_the_stored_file() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let token = admin_token(&app, &client).await;

    let (id, image) = create_article_with_image(&app, &client, &token).await;

    // An explicit image reference (text, not a file) persists as-is and
    // leaves the file store untouched.
    let form = reqwest::multipart::Form::new()
        .text("title", "Updated title")
        .text("image", image.clone());
    let response = client
        .put(format!("{}/admin/articles/{}", app.address, id))
        .header("Authorization", format!("Bearer {}", token))
        .multipart(form)
        .send()
        .await
        .expect("Update article failed");
    assert_eq!(response.status().as_u16(), 200);

    let article: serde_json::Value = client
        .get(format!("{}/article?id={}", app.address, id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(article["title"], "Updated title");
    assert_eq!(article["image"].as_str().unwrap(), image);
    assert_eq!(stored_files(&app).len(), 1);
}

#[tokio::test]
async fn deleting_a_record_removes_its_file() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let token = admin_token(&app, &client).await;

    let (id, _image) = create_article_with_image(&app, &client, &token).await;
    assert_eq!(stored_files(&app).len(), 1);

    let response = client
        .delete(format!("{}/admin/articles/{}", app.address, id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Delete article failed");
    assert_eq!(response.status().as_u16(), 204);

    assert_eq!(stored_files(&app).len(), 0);

    let response = client
        .get(format!("{}/article?id={}", app.address, id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn rejected_create_leaves_no_orphan_file() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let token = admin_token(&app, &client).await;

    // Missing required fields, but carrying an image: the stored file must
    // be cleaned up when validation fails.
    let form = reqwest::multipart::Form::new()
        .text("title", "Only a title")
        .part(
            "image",
            image_part(b"orphan-bytes".to_vec(), "cover.png", "image/png"),
        );
    let response = client
        .post(format!("{}/admin/articles", app.address))
        .header("Authorization", format!("Bearer {}", token))
        .multipart(form)
        .send()
        .await
        .expect("Create article failed");
    assert_eq!(response.status().as_u16(), 400);
    assert_eq!(stored_files(&app).len(), 0);
}

#[tokio::test]
async fn upload_endpoint_enforces_the_boundary() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let token = admin_token(&app, &client).await;

    // Happy path returns a servable URL.
    let form = reqwest::multipart::Form::new().part(
        "image",
        image_part(b"generic-bytes".to_vec(), "pic.jpg", "image/jpeg"),
    );
    let response = client
        .post(format!("{}/admin/upload", app.address))
        .header("Authorization", format!("Bearer {}", token))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["url"].as_str().unwrap().starts_with("/uploads/"));

    // Non-image MIME is refused.
    let form = reqwest::multipart::Form::new().part(
        "image",
        image_part(b"#!/bin/sh".to_vec(), "script.sh", "text/x-shellscript"),
    );
    let response = client
        .post(format!("{}/admin/upload", app.address))
        .header("Authorization", format!("Bearer {}", token))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 415);

    // Oversized payloads are refused and leave nothing behind.
    let form = reqwest::multipart::Form::new().part(
        "image",
        image_part(vec![0u8; 6 * 1024 * 1024], "big.png", "image/png"),
    );
    let response = client
        .post(format!("{}/admin/upload", app.address))
        .header("Authorization", format!("Bearer {}", token))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 413);

    // Only the happy-path file exists.
    assert_eq!(stored_files(&app).len(), 1);
}

#[tokio::test]
async fn lead_images_follow_the_same_lifecycle() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let form = reqwest::multipart::Form::new()
        .text("name", "Ada Advertiser")
        .text("contact", "ada@ads.example")
        .text("kind", "banner")
        .text("message", "Banner please.")
        .part(
            "image",
            image_part(b"lead-image".to_vec(), "banner.png", "image/png"),
        );
    let response = client
        .post(format!("{}/leads", app.address))
        .multipart(form)
        .send()
        .await
        .expect("Lead submission failed");
    assert_eq!(response.status().as_u16(), 201);
    let body: serde_json::Value = response.json().await.unwrap();
    let id = body["id"].as_i64().unwrap();
    assert_eq!(stored_files(&app).len(), 1);

    let token = admin_token(&app, &client).await;
    let response = client
        .delete(format!("{}/admin/leads/{}", app.address, id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Delete lead failed");
    assert_eq!(response.status().as_u16(), 204);
    assert_eq!(stored_files(&app).len(), 0);
}
