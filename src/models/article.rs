// src/models/article.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'articles' table in the database.
///
/// `image` is the public reference of the stored cover file (under /uploads),
/// or null for articles without one.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub summary: String,
    /// Sanitized HTML fragment.
    pub body: String,
    pub category: String,
    pub image: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
