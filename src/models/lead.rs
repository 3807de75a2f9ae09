// src/models/lead.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'leads' table: advertiser submissions from the public form.
///
/// `status` starts at 'pending'; admins move it along (e.g. 'active',
/// 'rejected'). `image` follows the same stored-file lifecycle as articles.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Lead {
    pub id: i64,
    pub name: String,
    pub company: String,
    pub contact: String,
    /// Kind of placement being asked for (banner, sponsored post, ...).
    pub kind: String,
    pub message: String,
    pub image: Option<String>,
    pub status: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
