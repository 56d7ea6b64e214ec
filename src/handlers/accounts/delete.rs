use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;
use uuid::Uuid;

use crate::database::account_repo::AccountRepo;
use crate::database::manager::DatabaseManager;
use crate::error::ApiError;

/// DELETE /api/accounts/:id - hard delete, admin/teardown path only.
/// End-user deletion goes through the scrub endpoint instead.
pub async fn account_delete(Path(id): Path<Uuid>) -> Result<impl IntoResponse, ApiError> {
    let mut tx = DatabaseManager::begin().await?;
    let mut repo = AccountRepo::new(&mut tx);

    let deleted = repo.delete_account(id).await?;
    if !deleted {
        return Err(ApiError::not_found(format!("account ({}) does not exist", id)));
    }
    tx.commit().await?;

    tracing::info!(account_id = %id, "hard-deleted account");
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct DeleteByEmailQuery {
    pub email: String,
}

/// DELETE /api/admin/accounts?email= - hard delete by exact email
pub async fn account_delete_by_email(
    Query(query): Query<DeleteByEmailQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = DatabaseManager::begin().await?;
    let mut repo = AccountRepo::new(&mut tx);

    let deleted = repo.delete_account_by_email(&query.email).await?;
    if !deleted {
        return Err(ApiError::not_found(format!(
            "no account with email {}",
            query.email
        )));
    }
    tx.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}
