use axum::{response::IntoResponse, Json};
use serde_json::json;

use crate::database::account_repo::AccountRepo;
use crate::database::manager::DatabaseManager;
use crate::error::ApiError;

use super::payload::ClaimPayload;

/// POST /api/accounts/claim - attach a verified external identity to an
/// unclaimed legacy account.
///
/// `data` is the now-claimed account, or null when there was nothing to
/// claim (no account with that email, or the identity already owns it).
pub async fn claim_post(Json(payload): Json<ClaimPayload>) -> Result<impl IntoResponse, ApiError> {
    let (email, auth_issuer, auth_sub) = payload.into_parts()?;

    let mut tx = DatabaseManager::begin().await?;
    let mut repo = AccountRepo::new(&mut tx);
    let claimed = repo.claim_legacy_account(&email, &auth_issuer, &auth_sub).await?;
    tx.commit().await?;

    if let Some(account) = &claimed {
        tracing::info!(account_id = %account.id, "claimed legacy account");
    }
    Ok(Json(json!({ "success": true, "data": claimed })))
}
