// src/handlers/lead.rs

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
    models::lead::Lead,
    utils::uploads::{delete_image, read_multipart},
};

const LEAD_COLUMNS: &str = "id, name, company, contact, kind, message, image, status, created_at";

/// Submits an advertiser lead from the public form, optionally with an
/// attached image. No auth; the lead lands in 'pending'.
pub async fn submit_lead(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let form = read_multipart(&config.upload_dir, multipart).await?;

    if let Err(e) = form.require_all(&["name", "contact", "kind", "message"]) {
        form.discard(&config.upload_dir).await;
        return Err(e);
    }

    let insert = sqlx::query_scalar::<_, i64>(
        "INSERT INTO leads (name, company, contact, kind, message, image, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'pending', ?7)
         RETURNING id",
    )
    .bind(form.require("name")?)
    .bind(form.get("company").unwrap_or_default())
    .bind(form.require("contact")?)
    .bind(form.require("kind")?)
    .bind(form.require("message")?)
    .bind(&form.stored_image)
    .bind(chrono::Utc::now())
    .fetch_one(&pool)
    .await;

    let id = match insert {
        Ok(id) => id,
        Err(e) => {
            form.discard(&config.upload_dir).await;
            tracing::error!("Failed to create lead: {:?}", e);
            return Err(AppError::from(e));
        }
    };

    Ok((StatusCode::CREATED, Json(json!({"success": true, "id": id}))))
}

/// Query parameters for listing leads.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub status: Option<String>,
}

/// Lists leads, optionally filtered by status.
/// Admin only.
pub async fn list_leads(
    State(pool): State<SqlitePool>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let leads = sqlx::query_as::<_, Lead>(&format!(
        "SELECT {LEAD_COLUMNS} FROM leads
         WHERE (?1 IS NULL OR status = ?1)
         ORDER BY id DESC"
    ))
    .bind(params.status)
    .fetch_all(&pool)
    .await?;

    Ok(Json(leads))
}

/// Updates a lead by ID from a multipart form: text fields, status, and/or
/// image replacement with the same cleanup ordering as articles.
/// Admin only.
pub async fn update_lead(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let existing = sqlx::query_as::<_, Lead>(&format!(
        "SELECT {LEAD_COLUMNS} FROM leads WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(&pool)
    .await?;

    let Some(existing) = existing else {
        return Err(AppError::NotFound("Lead not found".to_string()));
    };

    let form = read_multipart(&config.upload_dir, multipart).await?;

    for field in ["name", "company", "contact", "kind", "message", "status"] {
        if let Some(value) = form.get(field) {
            sqlx::query(&format!("UPDATE leads SET {field} = ?1 WHERE id = ?2"))
                .bind(value)
                .bind(id)
                .execute(&pool)
                .await?;
        }
    }

    if let Some(reference) = &form.stored_image {
        if let Err(e) = sqlx::query("UPDATE leads SET image = ?1 WHERE id = ?2")
            .bind(reference)
            .bind(id)
            .execute(&pool)
            .await
        {
            delete_image(&config.upload_dir, reference).await;
            tracing::error!("Failed to update lead image: {:?}", e);
            return Err(AppError::from(e));
        }
        if let Some(old) = &existing.image {
            if old != reference {
                delete_image(&config.upload_dir, old).await;
            }
        }
    } else if let Some(reference) = form.get("image") {
        sqlx::query("UPDATE leads SET image = ?1 WHERE id = ?2")
            .bind(reference)
            .bind(id)
            .execute(&pool)
            .await?;
    }

    Ok(StatusCode::OK)
}

/// Deletes a lead by ID, removing its stored image first.
/// Admin only.
pub async fn delete_lead(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let existing = sqlx::query_as::<_, Lead>(&format!(
        "SELECT {LEAD_COLUMNS} FROM leads WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Lead not found".to_string()))?;

    if let Some(image) = &existing.image {
        delete_image(&config.upload_dir, image).await;
    }

    let result = sqlx::query("DELETE FROM leads WHERE id = ?1")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete lead: {:?}", e);
            AppError::from(e)
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Lead not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
