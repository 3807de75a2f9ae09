// src/handlers/auth.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;
use validator::Validate;

use crate::{
    error::AppError,
    models::user::{EmailRequest, LoginRequest, RegisterRequest, ResetPasswordRequest, User,
        VerifyCodeRequest},
    state::AppState,
    utils::{
        codes::CodePurpose,
        hash::{hash_password, verify_password},
        jwt::sign_jwt,
        mailer::Delivery,
    },
};

/// Emails are compared and stored lowercase, always.
fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

async fn find_user_by_email(
    pool: &sqlx::SqlitePool,
    email: &str,
) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, email, name, age, password, role, is_verified, created_at
         FROM users WHERE email = ?1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await
    .map_err(|e| {
        tracing::error!("User lookup failed: {:?}", e);
        AppError::from(e)
    })?;

    Ok(user)
}

/// Issues a code for (email, purpose) and attempts delivery.
///
/// When the mailer runs in simulated mode the code is returned so the
/// handler can surface it in the response; with a real transport it is
/// never exposed.
async fn issue_and_send(
    state: &AppState,
    email: &str,
    purpose: CodePurpose,
) -> Result<Option<String>, AppError> {
    let code = state.codes.issue(email, purpose);

    let (subject, body) = match purpose {
        CodePurpose::Signup => (
            "Your verification code",
            format!(
                "Your verification code is {}. It expires in 10 minutes.",
                code
            ),
        ),
        CodePurpose::PasswordReset => (
            "Your password reset code",
            format!(
                "Your password reset code is {}. It expires in 10 minutes.",
                code
            ),
        ),
    };

    match state.mailer.send(email, subject, body).await? {
        Delivery::Sent => Ok(None),
        Delivery::Simulated => Ok(Some(code)),
    }
}

fn flow_response(message: &str, simulated_code: Option<String>) -> serde_json::Value {
    let mut body = json!({
        "success": true,
        "message": message,
    });
    if let Some(code) = simulated_code {
        body["simulatedCode"] = json!(code);
    }
    body
}

/// Registers a new user.
///
/// Hashes the password using Argon2 before storing it, inserts the account
/// unverified, then issues a signup verification code and attempts delivery.
/// The configured admin email gets the admin role at creation time; nothing
/// else ever assigns it.
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let email = normalize_email(&payload.email);
    let role = if state.config.admin_email.as_deref() == Some(email.as_str()) {
        "admin"
    } else {
        "user"
    };

    let hashed_password = hash_password(&payload.password)?;

    sqlx::query(
        "INSERT INTO users (email, name, age, password, role, is_verified, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6)",
    )
    .bind(&email)
    .bind(payload.name.trim())
    .bind(payload.age)
    .bind(&hashed_password)
    .bind(role)
    .bind(chrono::Utc::now())
    .execute(&state.pool)
    .await
    .map_err(|e| {
        if e.to_string().contains("UNIQUE constraint") {
            AppError::DuplicateEmail(format!("Email '{}' is already registered", email))
        } else {
            tracing::error!("Failed to register user: {:?}", e);
            AppError::from(e)
        }
    })?;

    let simulated = issue_and_send(&state, &email, CodePurpose::Signup).await?;

    Ok((
        StatusCode::CREATED,
        Json(flow_response(
            "Registered. Check your email for the verification code.",
            simulated,
        )),
    ))
}

/// Re-issues a signup verification code for an existing account,
/// overwriting any unexpired prior one.
pub async fn send_verification_code(
    State(state): State<AppState>,
    Json(payload): Json<EmailRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let email = normalize_email(&payload.email);

    find_user_by_email(&state.pool, &email)
        .await?
        .ok_or_else(|| AppError::NotFound("No account with that email".to_string()))?;

    let simulated = issue_and_send(&state, &email, CodePurpose::Signup).await?;

    Ok(Json(flow_response("Verification code sent.", simulated)))
}

/// Consumes a signup verification code and marks the account verified.
///
/// A wrong, expired or never-issued code answers the same way, so this
/// endpoint reveals nothing beyond what register/resend already do.
pub async fn verify_code(
    State(state): State<AppState>,
    Json(payload): Json<VerifyCodeRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let email = normalize_email(&payload.email);

    state
        .codes
        .consume(&email, CodePurpose::Signup, payload.code.trim())?;

    sqlx::query("UPDATE users SET is_verified = 1 WHERE email = ?1")
        .bind(&email)
        .execute(&state.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to mark user verified: {:?}", e);
            AppError::from(e)
        })?;

    Ok(Json(json!({ "success": true })))
}

/// Authenticates a user and returns a JWT token.
///
/// An absent account and a wrong password give the same answer. A correct
/// password on an unverified account is refused until verification.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let email = normalize_email(&payload.email);

    let user = find_user_by_email(&state.pool, &email)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !verify_password(&payload.password, &user.password)? {
        return Err(AppError::InvalidCredentials);
    }

    if !user.is_verified {
        return Err(AppError::NotVerified);
    }

    let token = sign_jwt(
        user.id,
        &user.email,
        &user.role,
        &state.config.jwt_secret,
        state.config.jwt_expiration,
    )?;

    Ok(Json(json!({
        "success": true,
        "token": token,
        "role": user.role,
    })))
}

/// Authenticates the administrator.
///
/// Same credential check as login, then denied unless the email is the one
/// configured admin identity. The issued token carries the admin role.
pub async fn admin_login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let email = normalize_email(&payload.email);

    let user = find_user_by_email(&state.pool, &email)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !verify_password(&payload.password, &user.password)? {
        return Err(AppError::InvalidCredentials);
    }

    if !user.is_verified {
        return Err(AppError::NotVerified);
    }

    if state.config.admin_email.as_deref() != Some(email.as_str()) || user.role != "admin" {
        return Err(AppError::Forbidden(
            "Not the administrator account".to_string(),
        ));
    }

    let token = sign_jwt(
        user.id,
        &user.email,
        &user.role,
        &state.config.jwt_secret,
        state.config.jwt_expiration,
    )?;

    Ok(Json(json!({
        "success": true,
        "token": token,
    })))
}

/// Issues a password-reset code for an existing account.
pub async fn send_password_reset(
    State(state): State<AppState>,
    Json(payload): Json<EmailRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let email = normalize_email(&payload.email);

    find_user_by_email(&state.pool, &email)
        .await?
        .ok_or_else(|| AppError::NotFound("No account with that email".to_string()))?;

    let simulated = issue_and_send(&state, &email, CodePurpose::PasswordReset).await?;

    Ok(Json(flow_response("Password reset code sent.", simulated)))
}

/// Consumes a password-reset code and replaces the stored secret.
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let email = normalize_email(&payload.email);

    state
        .codes
        .consume(&email, CodePurpose::PasswordReset, payload.code.trim())?;

    let hashed_password = hash_password(&payload.new_password)?;

    let result = sqlx::query("UPDATE users SET password = ?1 WHERE email = ?2")
        .bind(&hashed_password)
        .bind(&email)
        .execute(&state.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to reset password: {:?}", e);
            AppError::from(e)
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("No account with that email".to_string()));
    }

    Ok(Json(json!({ "success": true })))
}
