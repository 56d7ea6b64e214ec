use std::fmt;

use chrono::{DateTime, Utc};
use sqlx::{Postgres, Transaction};
use thiserror::Error;
use uuid::Uuid;

use crate::config;
use crate::database::models::account::{Account, AccountRow, AuthorizationMatch};

// The two uniqueness constraints this repo knows how to translate. Any other
// database failure propagates unchanged.
const CONSTRAINT_EMAIL: &str = "idx_account_email";
const CONSTRAINT_ISSUER_SUB: &str = "idx_account_issuer_sub";

const READ_COLS: &str = "id, email, \
     account_type, auth_issuer, auth_sub, \
     first_name, last_name, \
     street, street2, city, state, post_code, country_code, \
     created_with_kit_id, preferred_language, \
     consent_privacy_terms, creation_time, update_time, \
     latitude, longitude, cannot_geocode";

/// Which uniqueness invariant a conflicting write ran into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictKind {
    EmailTaken(String),
    IdentityClaimed,
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictKind::EmailTaken(email) => write!(f, "Email {} is not available", email),
            ConflictKind::IdentityClaimed => write!(f, "Cannot claim more than one account"),
        }
    }
}

#[derive(Debug, Error)]
pub enum RepoError {
    /// A write would violate email or auth-identity uniqueness. Recoverable
    /// by the caller.
    #[error("{0}")]
    Conflict(ConflictKind),

    #[error("not found: {0}")]
    NotFound(String),

    /// The store holds a state the classifier says is impossible to
    /// reconcile. A defect signal, not a user-facing condition.
    #[error("data integrity: {0}")]
    DataIntegrity(String),

    /// Unrecognized storage failure, surfaced unmodified.
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Maps a violated-constraint name to the conflict it represents. Returns
/// None for constraints this repo does not recognize.
fn conflict_for_constraint(constraint: Option<&str>, email: &str) -> Option<ConflictKind> {
    match constraint {
        Some(CONSTRAINT_EMAIL) => Some(ConflictKind::EmailTaken(email.to_string())),
        Some(CONSTRAINT_ISSUER_SUB) => Some(ConflictKind::IdentityClaimed),
        _ => None,
    }
}

/// Synthetic replacement email for a scrubbed account. The local part is
/// quoted so the embedded ":" from the timestamp stays RFC-valid, and the
/// account id keeps it unique even when many accounts are scrubbed within
/// the same second.
fn scrub_email(id: Uuid, at: DateTime<Utc>, domain: &str) -> String {
    format!("\"{}_{}_scrubbed\"@{}", at.format("%Y-%m-%dT%H:%M:%S%.6f"), id, domain)
}

/// Transactional account store. Every method runs on the caller-supplied
/// transaction; the repo never commits or rolls back, so multi-repo
/// operations (e.g. account creation that also consumes a kit) stay atomic
/// under the caller's control.
///
/// Claim and scrub are a single read-then-write inside that transaction.
/// Serializing concurrent claims against the same row is the caller's
/// isolation choice; run at read-committed or stricter.
pub struct AccountRepo<'t> {
    tx: &'t mut Transaction<'static, Postgres>,
}

impl<'t> AccountRepo<'t> {
    pub fn new(tx: &'t mut Transaction<'static, Postgres>) -> Self {
        Self { tx }
    }

    fn row_to_account(row: AccountRow) -> Result<Account, RepoError> {
        Account::try_from(row).map_err(RepoError::DataIntegrity)
    }

    fn translate_write_error(err: sqlx::Error, email: &str) -> RepoError {
        if let sqlx::Error::Database(ref db) = err {
            if let Some(kind) = conflict_for_constraint(db.constraint(), email) {
                return RepoError::Conflict(kind);
            }
        }
        RepoError::Sqlx(err)
    }

    /// Exact-match lookup; the unique index on email guarantees at most one
    /// result.
    pub async fn find_account_by_email(&mut self, email: &str) -> Result<Option<Account>, RepoError> {
        let sql = format!("SELECT {READ_COLS} FROM account WHERE email = $1");
        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(email)
            .fetch_optional(&mut **self.tx)
            .await?;
        row.map(Self::row_to_account).transpose()
    }

    /// Exact-match lookup on the (issuer, subject) auth identity pair.
    pub async fn find_linked_account(
        &mut self,
        auth_issuer: &str,
        auth_sub: &str,
    ) -> Result<Option<Account>, RepoError> {
        let sql = format!("SELECT {READ_COLS} FROM account WHERE auth_issuer = $1 AND auth_sub = $2");
        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(auth_issuer)
            .bind(auth_sub)
            .fetch_optional(&mut **self.tx)
            .await?;
        row.map(Self::row_to_account).transpose()
    }

    pub async fn get_account(&mut self, account_id: Uuid) -> Result<Option<Account>, RepoError> {
        let sql = format!("SELECT {READ_COLS} FROM account WHERE id = $1");
        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(account_id)
            .fetch_optional(&mut **self.tx)
            .await?;
        row.map(Self::row_to_account).transpose()
    }

    /// Insert a new account. Timestamps are assigned by the store. The two
    /// unique indexes make the conflict check and the insert atomic.
    pub async fn create_account(&mut self, account: &Account) -> Result<bool, RepoError> {
        let result = sqlx::query(
            "INSERT INTO account (\
                 id, email, \
                 account_type, auth_issuer, auth_sub, \
                 first_name, last_name, \
                 street, street2, city, state, post_code, country_code, \
                 preferred_language, latitude, longitude, cannot_geocode, \
                 consent_privacy_terms, created_with_kit_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, \
                     $11, $12, $13, $14, $15, $16, $17, $18, $19)",
        )
        .bind(account.id)
        .bind(&account.email)
        .bind(account.account_type.as_str())
        .bind(&account.auth_issuer)
        .bind(&account.auth_sub)
        .bind(&account.first_name)
        .bind(&account.last_name)
        .bind(&account.address.street)
        .bind(&account.address.street2)
        .bind(&account.address.city)
        .bind(&account.address.state)
        .bind(&account.address.post_code)
        .bind(&account.address.country_code)
        .bind(&account.preferred_language)
        .bind(account.latitude)
        .bind(account.longitude)
        .bind(account.cannot_geocode)
        .bind(account.consent_privacy_terms)
        .bind(&account.created_with_kit_id)
        .execute(&mut **self.tx)
        .await
        .map_err(|e| Self::translate_write_error(e, &account.email))?;

        Ok(result.rows_affected() == 1)
    }

    /// Update the mutable profile and auth fields. `consent_privacy_terms`
    /// and `created_with_kit_id` are write-once and never appear in the SET
    /// list. Returns false when no row matches the id.
    pub async fn update_account(&mut self, account: &Account) -> Result<bool, RepoError> {
        let result = sqlx::query(
            "UPDATE account SET \
                 email = $1, \
                 account_type = $2, \
                 auth_issuer = $3, \
                 auth_sub = $4, \
                 first_name = $5, \
                 last_name = $6, \
                 street = $7, \
                 street2 = $8, \
                 city = $9, \
                 state = $10, \
                 post_code = $11, \
                 country_code = $12, \
                 preferred_language = $13, \
                 latitude = $14, \
                 longitude = $15, \
                 cannot_geocode = $16, \
                 update_time = NOW() \
             WHERE id = $17",
        )
        .bind(&account.email)
        .bind(account.account_type.as_str())
        .bind(&account.auth_issuer)
        .bind(&account.auth_sub)
        .bind(&account.first_name)
        .bind(&account.last_name)
        .bind(&account.address.street)
        .bind(&account.address.street2)
        .bind(&account.address.city)
        .bind(&account.address.state)
        .bind(&account.address.post_code)
        .bind(&account.address.country_code)
        .bind(&account.preferred_language)
        .bind(account.latitude)
        .bind(account.longitude)
        .bind(account.cannot_geocode)
        .bind(account.id)
        .execute(&mut **self.tx)
        .await
        .map_err(|e| Self::translate_write_error(e, &account.email))?;

        Ok(result.rows_affected() == 1)
    }

    /// Hard delete. Test and admin teardown only; end-user deletion goes
    /// through `scrub`.
    pub async fn delete_account(&mut self, account_id: Uuid) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM account WHERE id = $1")
            .bind(account_id)
            .execute(&mut **self.tx)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn delete_account_by_email(&mut self, email: &str) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM account WHERE email = $1")
            .bind(email)
            .execute(&mut **self.tx)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Case-insensitive substring search over emails, ordered by email.
    /// Admin lookup path.
    pub async fn get_account_ids_by_email(&mut self, email: &str) -> Result<Vec<Uuid>, RepoError> {
        let pattern = format!("%{}%", email);
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM account WHERE email ILIKE $1 ORDER BY email",
        )
        .bind(pattern)
        .fetch_all(&mut **self.tx)
        .await?;
        Ok(ids)
    }

    /// Attach the authenticated identity to an unclaimed legacy account.
    ///
    /// Returns the now-claimed account when an unclaimed legacy account
    /// matched the email; returns None when there is nothing to claim (no
    /// account with that email, or the account already carries this exact
    /// identity). A non-legacy account under this email that belongs to a
    /// different identity is inconsistent data and fails loudly.
    pub async fn claim_legacy_account(
        &mut self,
        email: &str,
        auth_issuer: &str,
        auth_sub: &str,
    ) -> Result<Option<Account>, RepoError> {
        let Some(mut found) = self.find_account_by_email(email).await? else {
            return Ok(None);
        };

        match found.matches_auth(email, auth_issuer, auth_sub) {
            AuthorizationMatch::FullMatch => Ok(None),
            AuthorizationMatch::LegacyMatch => {
                found.claim(auth_issuer, auth_sub);
                self.update_account(&found).await?;
                Ok(Some(found))
            }
            AuthorizationMatch::NoMatch => {
                tracing::error!(
                    account_id = %found.id,
                    "inconsistent auth state while claiming legacy account"
                );
                Err(RepoError::DataIntegrity(
                    "Inconsistent data found for provided email".to_string(),
                ))
            }
        }
    }

    /// Remove all identifying information from an account, keeping the row
    /// for referential and audit purposes. The replacement email satisfies
    /// the same uniqueness invariant as a real one.
    pub async fn scrub(&mut self, account_id: Uuid) -> Result<bool, RepoError> {
        let Some(mut account) = self.get_account(account_id).await? else {
            return Err(RepoError::NotFound(format!("account ({}) does not exist", account_id)));
        };

        let email = scrub_email(account.id, Utc::now(), &config::config().scrub.email_domain);
        account.scrub(email);

        self.update_account(&account).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn recognizes_email_constraint() {
        let kind = conflict_for_constraint(Some("idx_account_email"), "jane@example.com");
        assert_eq!(kind, Some(ConflictKind::EmailTaken("jane@example.com".to_string())));
        assert_eq!(
            kind.unwrap().to_string(),
            "Email jane@example.com is not available"
        );
    }

    #[test]
    fn recognizes_issuer_sub_constraint() {
        let kind = conflict_for_constraint(Some("idx_account_issuer_sub"), "jane@example.com");
        assert_eq!(kind, Some(ConflictKind::IdentityClaimed));
        assert_eq!(kind.unwrap().to_string(), "Cannot claim more than one account");
    }

    #[test]
    fn unknown_constraints_are_not_translated() {
        assert_eq!(conflict_for_constraint(Some("fk_account_kit"), "x@y.z"), None);
        assert_eq!(conflict_for_constraint(None, "x@y.z"), None);
    }

    #[test]
    fn scrub_email_is_quoted_and_carries_id() {
        let id = Uuid::new_v4();
        let at = Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap();
        let email = scrub_email(id, at, "redacted.sampletrack.org");
        assert!(email.starts_with('"'));
        assert!(email.ends_with("@redacted.sampletrack.org"));
        assert!(email.contains(&id.to_string()));
        assert!(email.contains("2026-03-14T09:26:53"));
        assert!(email.contains("_scrubbed\"@"));
    }

    #[test]
    fn scrub_emails_differ_for_same_instant() {
        let at = Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap();
        let a = scrub_email(Uuid::new_v4(), at, "redacted.sampletrack.org");
        let b = scrub_email(Uuid::new_v4(), at, "redacted.sampletrack.org");
        assert_ne!(a, b);
    }
}
