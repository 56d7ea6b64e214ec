use axum::{routing::get, routing::post, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::database::manager::DatabaseManager;

pub mod accounts;

pub fn router() -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        // Account API
        .route(
            "/api/accounts",
            post(accounts::create::account_post).get(accounts::get::find_get),
        )
        .route("/api/accounts/claim", post(accounts::claim::claim_post))
        .route("/api/accounts/linked", get(accounts::get::linked_get))
        .route(
            "/api/accounts/:id",
            get(accounts::get::account_get)
                .put(accounts::update::account_put)
                .delete(accounts::delete::account_delete),
        )
        .route("/api/accounts/:id/scrub", post(accounts::scrub::scrub_post))
        // Admin lookups and teardown
        .route(
            "/api/admin/accounts",
            get(accounts::search::account_ids_get)
                .delete(accounts::delete::account_delete_by_email),
        )
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "Sampletrack API",
            "version": version,
            "description": "Private REST API for a citizen-science sample tracking platform",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "accounts": "/api/accounts[/:id] (private)",
                "claim": "/api/accounts/claim (private)",
                "linked": "/api/accounts/linked (private)",
                "scrub": "/api/accounts/:id/scrub (private)",
                "admin": "/api/admin/accounts (restricted)",
            }
        }
    }))
}

async fn health() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}
