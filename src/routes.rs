// src/routes.rs

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::Method,
    middleware,
    routing::{get, post, put},
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::{
    handlers::{admin, article, auth, lead},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Assembles the main application router.
///
/// * Public auth and read/submit surfaces.
/// * Admin surface nested under /admin, behind the token gate.
/// * Stored images served under /uploads.
/// * Global middleware (Trace, CORS, body limit).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/send-verification-code", post(auth::send_verification_code))
        .route("/verify-code", post(auth::verify_code))
        .route("/login", post(auth::login))
        .route("/send-password-reset", post(auth::send_password_reset))
        .route("/reset-password", post(auth::reset_password));

    let public_routes = Router::new()
        .route("/articles", get(article::list_articles))
        .route("/article", get(article::get_article))
        .route("/search", get(article::search_articles))
        .route("/leads", post(lead::submit_lead));

    let admin_routes = Router::new()
        .route("/login", post(auth::admin_login))
        // Protected admin routes
        .merge(
            Router::new()
                .route("/stats", get(admin::dashboard_stats))
                .route("/users", get(admin::list_users))
                .route("/users/export", get(admin::export_users_csv))
                .route("/upload", post(admin::upload_image))
                .route("/articles", post(article::create_article))
                .route(
                    "/articles/{id}",
                    put(article::update_article).delete(article::delete_article),
                )
                .route("/leads", get(lead::list_leads))
                .route(
                    "/leads/{id}",
                    put(lead::update_lead).delete(lead::delete_lead),
                )
                // Double middleware protection: Auth first, then Admin check
                .layer(middleware::from_fn(admin_middleware))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        );

    Router::new()
        .merge(auth_routes)
        .merge(public_routes)
        .nest("/admin", admin_routes)
        .nest_service("/uploads", ServeDir::new(&state.config.upload_dir))
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(DefaultBodyLimit::max(8 * 1024 * 1024))
        .with_state(state)
}
