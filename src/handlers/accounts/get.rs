use axum::extract::{Path, Query};
use axum::{response::IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::database::account_repo::AccountRepo;
use crate::database::manager::DatabaseManager;
use crate::error::ApiError;

/// GET /api/accounts/:id - show a single account
pub async fn account_get(Path(id): Path<Uuid>) -> Result<impl IntoResponse, ApiError> {
    let mut tx = DatabaseManager::begin().await?;
    let mut repo = AccountRepo::new(&mut tx);
    let account = repo
        .get_account(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("account ({}) does not exist", id)))?;

    Ok(Json(json!({ "success": true, "data": account })))
}

#[derive(Debug, Deserialize)]
pub struct FindQuery {
    pub email: String,
}

/// GET /api/accounts?email= - exact-match lookup; `data` is null when no
/// account has that email.
pub async fn find_get(Query(query): Query<FindQuery>) -> Result<impl IntoResponse, ApiError> {
    let mut tx = DatabaseManager::begin().await?;
    let mut repo = AccountRepo::new(&mut tx);
    let account = repo.find_account_by_email(&query.email).await?;

    Ok(Json(json!({ "success": true, "data": account })))
}

#[derive(Debug, Deserialize)]
pub struct LinkedQuery {
    pub auth_issuer: String,
    pub auth_sub: String,
}

/// GET /api/accounts/linked - look up the account already claimed by an
/// authenticated identity, if any.
pub async fn linked_get(Query(query): Query<LinkedQuery>) -> Result<impl IntoResponse, ApiError> {
    let mut tx = DatabaseManager::begin().await?;
    let mut repo = AccountRepo::new(&mut tx);
    let account = repo
        .find_linked_account(&query.auth_issuer, &query.auth_sub)
        .await?;

    Ok(Json(json!({ "success": true, "data": account })))
}
