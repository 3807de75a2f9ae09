// src/handlers/article.rs

use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;

use crate::{
    config::Config,
    error::AppError,
    models::article::Article,
    utils::{
        html::clean_html,
        uploads::{delete_image, read_multipart},
    },
};

const ARTICLE_COLUMNS: &str = "id, title, summary, body, category, image, created_at";

/// Query parameters for listing articles.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GetParams {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: String,
}

/// Lists all articles, optionally filtered by category. Public.
pub async fn list_articles(
    State(pool): State<SqlitePool>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    // Unified query handling the optional filter
    let articles = sqlx::query_as::<_, Article>(&format!(
        "SELECT {ARTICLE_COLUMNS} FROM articles
         WHERE (?1 IS NULL OR category = ?1)
         ORDER BY id DESC"
    ))
    .bind(params.category)
    .fetch_all(&pool)
    .await?;

    Ok(Json(articles))
}

/// Retrieves a single article by ID. Public.
pub async fn get_article(
    State(pool): State<SqlitePool>,
    Query(params): Query<GetParams>,
) -> Result<impl IntoResponse, AppError> {
    let article = sqlx::query_as::<_, Article>(&format!(
        "SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = ?1"
    ))
    .bind(params.id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Article not found".to_string()))?;

    Ok(Json(article))
}

/// Full-text-ish search over title, summary and body. Public.
pub async fn search_articles(
    State(pool): State<SqlitePool>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, AppError> {
    let pattern = format!("%{}%", params.q);

    let articles = sqlx::query_as::<_, Article>(&format!(
        "SELECT {ARTICLE_COLUMNS} FROM articles
         WHERE title LIKE ?1 OR summary LIKE ?1 OR body LIKE ?1
         ORDER BY id DESC"
    ))
    .bind(pattern)
    .fetch_all(&pool)
    .await?;

    Ok(Json(articles))
}

/// Creates an article from a multipart form with an optional cover image.
/// Admin only.
pub async fn create_article(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let form = read_multipart(&config.upload_dir, multipart).await?;

    if let Err(e) = form.require_all(&["title", "summary", "body", "category"]) {
        form.discard(&config.upload_dir).await;
        return Err(e);
    }

    let body = clean_html(&form.require("body")?);

    let insert = sqlx::query_scalar::<_, i64>(
        "INSERT INTO articles (title, summary, body, category, image, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         RETURNING id",
    )
    .bind(form.require("title")?)
    .bind(form.require("summary")?)
    .bind(body)
    .bind(form.require("category")?)
    .bind(&form.stored_image)
    .bind(chrono::Utc::now())
    .fetch_one(&pool)
    .await;

    let id = match insert {
        Ok(id) => id,
        Err(e) => {
            // The row never existed, so the file stored above is an orphan.
            form.discard(&config.upload_dir).await;
            tracing::error!("Failed to create article: {:?}", e);
            return Err(AppError::from(e));
        }
    };

    Ok((StatusCode::CREATED, Json(json!({"success": true, "id": id}))))
}

/// Updates an article by ID from a multipart form. Fields are optional; a new
/// image replaces the stored file, an `image` text field keeps a reference
/// as-is without touching the file store.
/// Admin only.
pub async fn update_article(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let existing = sqlx::query_as::<_, Article>(&format!(
        "SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(&pool)
    .await?;

    let Some(existing) = existing else {
        return Err(AppError::NotFound("Article not found".to_string()));
    };

    let form = read_multipart(&config.upload_dir, multipart).await?;

    // Perform updates sequentially if fields are present
    if let Some(title) = form.get("title") {
        sqlx::query("UPDATE articles SET title = ?1 WHERE id = ?2")
            .bind(title)
            .bind(id)
            .execute(&pool)
            .await?;
    }

    if let Some(summary) = form.get("summary") {
        sqlx::query("UPDATE articles SET summary = ?1 WHERE id = ?2")
            .bind(summary)
            .bind(id)
            .execute(&pool)
            .await?;
    }

    if let Some(body) = form.get("body") {
        sqlx::query("UPDATE articles SET body = ?1 WHERE id = ?2")
            .bind(clean_html(&body))
            .bind(id)
            .execute(&pool)
            .await?;
    }

    if let Some(category) = form.get("category") {
        sqlx::query("UPDATE articles SET category = ?1 WHERE id = ?2")
            .bind(category)
            .bind(id)
            .execute(&pool)
            .await?;
    }

    if let Some(reference) = &form.stored_image {
        // Commit the new reference first; the old file is only removed once
        // the row no longer points at it.
        if let Err(e) = sqlx::query("UPDATE articles SET image = ?1 WHERE id = ?2")
            .bind(reference)
            .bind(id)
            .execute(&pool)
            .await
        {
            delete_image(&config.upload_dir, reference).await;
            tracing::error!("Failed to update article image: {:?}", e);
            return Err(AppError::from(e));
        }
        if let Some(old) = &existing.image {
            if old != reference {
                delete_image(&config.upload_dir, old).await;
            }
        }
    } else if let Some(reference) = form.get("image") {
        sqlx::query("UPDATE articles SET image = ?1 WHERE id = ?2")
            .bind(reference)
            .bind(id)
            .execute(&pool)
            .await?;
    }

    Ok(StatusCode::OK)
}

/// Deletes an article by ID, removing its stored image first.
/// Admin only.
pub async fn delete_article(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let existing = sqlx::query_as::<_, Article>(&format!(
        "SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Article not found".to_string()))?;

    if let Some(image) = &existing.image {
        delete_image(&config.upload_dir, image).await;
    }

    let result = sqlx::query("DELETE FROM articles WHERE id = ?1")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete article: {:?}", e);
            AppError::from(e)
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Article not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
