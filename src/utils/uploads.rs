// src/utils/uploads.rs

use std::collections::HashMap;
use std::path::Path;

use axum::extract::Multipart;
use rand::Rng;

use crate::error::AppError;

/// Hard cap on a single uploaded image.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Public URL prefix under which stored images are served.
pub const PUBLIC_PREFIX: &str = "/uploads";

const ALLOWED_TYPES: [&str; 5] = [
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
];

/// A parsed multipart form: plain text fields plus the image part.
///
/// A file part named `image` is stored immediately and its public reference
/// recorded in `stored_image`. A text part named `image` (no filename) is an
/// explicit "keep this reference" and stays in `fields` untouched.
pub struct ParsedForm {
    pub fields: HashMap<String, String>,
    pub stored_image: Option<String>,
}

impl ParsedForm {
    /// Trimmed, non-empty value of a text field.
    pub fn get(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    pub fn require(&self, name: &str) -> Result<String, AppError> {
        self.get(name)
            .ok_or_else(|| AppError::BadRequest(format!("Missing required field: {}", name)))
    }

    pub fn require_all(&self, names: &[&str]) -> Result<(), AppError> {
        for name in names {
            self.require(name)?;
        }
        Ok(())
    }

    /// Removes the image stored while parsing this form, if any. Called when
    /// validation or the insert fails after the file already landed on disk,
    /// so a rejected request leaves no orphaned file behind.
    pub async fn discard(&self, upload_dir: &str) {
        if let Some(reference) = &self.stored_image {
            delete_image(upload_dir, reference).await;
        }
    }
}

/// Reads every part of a multipart request.
///
/// If anything fails after the image part already landed on disk, the file
/// is removed before the error propagates, so a rejected request cannot
/// orphan a stored file.
pub async fn read_multipart(
    upload_dir: &str,
    multipart: Multipart,
) -> Result<ParsedForm, AppError> {
    let mut form = ParsedForm {
        fields: HashMap::new(),
        stored_image: None,
    };

    match read_parts(upload_dir, multipart, &mut form).await {
        Ok(()) => Ok(form),
        Err(e) => {
            form.discard(upload_dir).await;
            Err(e)
        }
    }
}

async fn read_parts(
    upload_dir: &str,
    mut multipart: Multipart,
    form: &mut ParsedForm,
) -> Result<(), AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = match field.name() {
            Some(n) => n.to_string(),
            None => continue,
        };
        let file_name = field.file_name().map(|f| f.to_string());
        let content_type = field.content_type().map(|c| c.to_string());

        if name == "image" && file_name.as_deref().is_some_and(|f| !f.is_empty()) {
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            if data.is_empty() {
                continue;
            }
            let reference = store_image(
                upload_dir,
                file_name.as_deref().unwrap_or(""),
                content_type.as_deref().unwrap_or(""),
                &data,
            )
            .await?;
            // A repeated image part replaces the earlier one, file included.
            if let Some(previous) = form.stored_image.replace(reference) {
                delete_image(upload_dir, &previous).await;
            }
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            form.fields.insert(name, value);
        }
    }

    Ok(())
}

/// Writes image bytes to the upload directory under a generated collision-free
/// name and returns the public reference (`/uploads/<name>`).
///
/// Size cap and image-only MIME filter are enforced here, at the boundary.
/// The stored name never uses the client's filename beyond a sanitized
/// extension, so path traversal is not expressible.
pub async fn store_image(
    upload_dir: &str,
    original_name: &str,
    content_type: &str,
    data: &[u8],
) -> Result<String, AppError> {
    if data.len() > MAX_IMAGE_BYTES {
        return Err(AppError::TooLarge);
    }
    if !ALLOWED_TYPES.contains(&content_type) {
        return Err(AppError::UnsupportedType(format!(
            "Unsupported image type: {}",
            content_type
        )));
    }

    let ext = sanitized_extension(original_name, content_type);
    let name = format!(
        "{}_{:08x}.{}",
        chrono::Utc::now().timestamp_millis(),
        rand::thread_rng().r#gen::<u32>(),
        ext
    );

    tokio::fs::create_dir_all(upload_dir)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;
    tokio::fs::write(Path::new(upload_dir).join(&name), data)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    Ok(format!("{}/{}", PUBLIC_PREFIX, name))
}

/// Best-effort removal of a previously stored image. Only the file name
/// component of the reference is honored, so a tampered reference cannot
/// reach outside the upload directory. A missing file is a silent no-op;
/// other failures are logged and swallowed.
pub async fn delete_image(upload_dir: &str, reference: &str) {
    let Some(file_name) = Path::new(reference).file_name() else {
        return;
    };
    let path = Path::new(upload_dir).join(file_name);
    if let Err(e) = tokio::fs::remove_file(&path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!("Failed to remove stored image {:?}: {}", path, e);
        }
    }
}

fn sanitized_extension(original_name: &str, content_type: &str) -> String {
    Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .filter(|e| !e.is_empty() && e.len() <= 5 && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| {
            match content_type {
                "image/png" => "png",
                "image/gif" => "gif",
                "image/webp" => "webp",
                _ => "jpg",
            }
            .to_string()
        })
}
