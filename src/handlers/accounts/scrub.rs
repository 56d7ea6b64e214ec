use axum::extract::Path;
use axum::{response::IntoResponse, Json};
use serde_json::json;
use uuid::Uuid;

use crate::database::account_repo::AccountRepo;
use crate::database::manager::DatabaseManager;
use crate::error::ApiError;

/// POST /api/accounts/:id/scrub - irreversibly redact all identifying
/// fields while keeping the row for referential and audit purposes.
pub async fn scrub_post(Path(id): Path<Uuid>) -> Result<impl IntoResponse, ApiError> {
    let mut tx = DatabaseManager::begin().await?;
    let mut repo = AccountRepo::new(&mut tx);
    let scrubbed = repo.scrub(id).await?;
    tx.commit().await?;

    tracing::info!(account_id = %id, "scrubbed account");
    Ok(Json(json!({ "success": true, "data": { "scrubbed": scrubbed } })))
}
