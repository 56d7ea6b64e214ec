use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::database::account_repo::AccountRepo;
use crate::database::manager::DatabaseManager;
use crate::error::ApiError;

use super::payload::NewAccountPayload;

/// POST /api/accounts - register an account for a sample-kit holder
pub async fn account_post(
    Json(payload): Json<NewAccountPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let account = payload.into_account()?;

    let mut tx = DatabaseManager::begin().await?;
    let mut repo = AccountRepo::new(&mut tx);
    repo.create_account(&account).await?;

    // Re-read inside the transaction for the store-assigned timestamps.
    let created = repo.get_account(account.id).await?.ok_or_else(|| {
        ApiError::internal_server_error("created account could not be read back")
    })?;
    tx.commit().await?;

    tracing::info!(account_id = %created.id, "created account");
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "data": created }))))
}
