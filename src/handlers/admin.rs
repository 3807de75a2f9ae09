// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Multipart, State},
    http::header,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::SqlitePool;

use crate::{config::Config, error::AppError, models::user::User, utils::uploads::read_multipart};

/// Aggregate counts for the admin dashboard.
/// Admin only.
pub async fn dashboard_stats(
    State(pool): State<SqlitePool>,
) -> Result<impl IntoResponse, AppError> {
    let users = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
        .fetch_one(&pool)
        .await?;
    let articles = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM articles")
        .fetch_one(&pool)
        .await?;
    let leads = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM leads")
        .fetch_one(&pool)
        .await?;
    let pending_leads =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM leads WHERE status = 'pending'")
            .fetch_one(&pool)
            .await?;

    Ok(Json(json!({
        "users": users,
        "articles": articles,
        "leads": leads,
        "pending_leads": pending_leads,
    })))
}

/// Lists all users in the system. The password hash is serde-skipped.
/// Admin only.
pub async fn list_users(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let users = sqlx::query_as::<_, User>(
        "SELECT id, email, name, age, password, role, is_verified, created_at
         FROM users ORDER BY id DESC",
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list users: {:?}", e);
        AppError::from(e)
    })?;

    Ok(Json(users))
}

/// Exports all users as a CSV attachment.
/// Admin only.
pub async fn export_users_csv(
    State(pool): State<SqlitePool>,
) -> Result<impl IntoResponse, AppError> {
    let users = sqlx::query_as::<_, User>(
        "SELECT id, email, name, age, password, role, is_verified, created_at
         FROM users ORDER BY id",
    )
    .fetch_all(&pool)
    .await?;

    let mut csv = String::from("id,email,name,age,role,verified,created_at\n");
    for user in users {
        csv.push_str(&format!(
            "{},{},{},{},{},{},{}\n",
            user.id,
            csv_escape(&user.email),
            csv_escape(&user.name),
            user.age,
            csv_escape(&user.role),
            user.is_verified,
            user.created_at.to_rfc3339(),
        ));
    }

    let headers = [
        (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
        (
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"users.csv\"",
        ),
    ];

    Ok((headers, csv))
}

fn csv_escape(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Stores an uploaded image and returns its public URL, for embedding in
/// article bodies or anywhere else the admin panel needs one.
/// Admin only.
pub async fn upload_image(
    State(config): State<Config>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let form = read_multipart(&config.upload_dir, multipart).await?;

    let url = form
        .stored_image
        .ok_or_else(|| AppError::BadRequest("No image file provided".to_string()))?;

    Ok(Json(json!({ "success": true, "url": url })))
}
