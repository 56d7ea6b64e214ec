use axum::extract::Query;
use axum::{response::IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;

use crate::database::account_repo::AccountRepo;
use crate::database::manager::DatabaseManager;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub email: String,
}

/// GET /api/admin/accounts?email= - case-insensitive substring search over
/// account emails, returning matching ids ordered by email.
pub async fn account_ids_get(Query(query): Query<SearchQuery>) -> Result<impl IntoResponse, ApiError> {
    let mut tx = DatabaseManager::begin().await?;
    let mut repo = AccountRepo::new(&mut tx);
    let ids = repo.get_account_ids_by_email(&query.email).await?;

    Ok(Json(json!({ "success": true, "data": ids })))
}
