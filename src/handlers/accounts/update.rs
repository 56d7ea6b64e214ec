use axum::extract::Path;
use axum::{response::IntoResponse, Json};
use serde_json::json;
use uuid::Uuid;

use crate::database::account_repo::AccountRepo;
use crate::database::manager::DatabaseManager;
use crate::error::ApiError;

use super::payload::UpdateAccountPayload;

/// PUT /api/accounts/:id - replace the mutable profile fields
pub async fn account_put(
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAccountPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = DatabaseManager::begin().await?;
    let mut repo = AccountRepo::new(&mut tx);

    let mut account = repo
        .get_account(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("account ({}) does not exist", id)))?;
    payload.apply(&mut account)?;

    repo.update_account(&account).await?;
    let updated = repo.get_account(id).await?.ok_or_else(|| {
        ApiError::internal_server_error("updated account could not be read back")
    })?;
    tx.commit().await?;

    Ok(Json(json!({ "success": true, "data": updated })))
}
