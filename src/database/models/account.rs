use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Postal address owned by exactly one account. Compared by field values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub street2: Option<String>,
    pub city: String,
    pub state: String,
    pub post_code: String,
    pub country_code: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Standard,
    Admin,
    Deleted,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Standard => "standard",
            AccountType::Admin => "admin",
            AccountType::Deleted => "deleted",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "standard" => Some(AccountType::Standard),
            "admin" => Some(AccountType::Admin),
            "deleted" => Some(AccountType::Deleted),
            _ => None,
        }
    }
}

/// Outcome of comparing an account's stored auth identity against an incoming
/// (email, issuer, subject) triple. This is the single source of truth for
/// claim eligibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationMatch {
    /// Stored issuer and subject both equal the incoming values; the account
    /// already belongs to this authenticated identity.
    FullMatch,
    /// Stored issuer and subject are both null and the email matches; the
    /// account predates federated auth and may be claimed.
    LegacyMatch,
    /// Anything else, including the inconsistent state where exactly one of
    /// the stored pair is set.
    NoMatch,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub account_type: AccountType,
    pub auth_issuer: Option<String>,
    pub auth_sub: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub address: Address,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub cannot_geocode: bool,
    pub preferred_language: String,
    pub consent_privacy_terms: bool,
    pub created_with_kit_id: Option<String>,
    pub creation_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
}

impl Account {
    /// Classify the incoming identity against this account's stored auth
    /// linkage. Pure and total: every combination of stored state maps to
    /// exactly one variant.
    pub fn matches_auth(&self, email: &str, auth_issuer: &str, auth_sub: &str) -> AuthorizationMatch {
        match (self.auth_issuer.as_deref(), self.auth_sub.as_deref()) {
            (Some(issuer), Some(sub)) if issuer == auth_issuer && sub == auth_sub => {
                AuthorizationMatch::FullMatch
            }
            (None, None) if self.email == email => AuthorizationMatch::LegacyMatch,
            // Covers a differing claimed identity as well as the partial pair,
            // which is never written by this crate but may exist in old data.
            _ => AuthorizationMatch::NoMatch,
        }
    }

    /// Attach an external identity to this account. Always sets the pair
    /// together so the inconsistent one-sided state cannot be written.
    pub fn claim(&mut self, auth_issuer: impl Into<String>, auth_sub: impl Into<String>) {
        self.auth_issuer = Some(auth_issuer.into());
        self.auth_sub = Some(auth_sub.into());
    }

    /// Redact all identifying fields in place. `synthetic_email` must already
    /// be unique; see `AccountRepo::scrub` for how it is derived.
    pub fn scrub(&mut self, synthetic_email: String) {
        self.email = synthetic_email;
        self.account_type = AccountType::Deleted;
        self.auth_issuer = None;
        self.auth_sub = None;
        self.first_name = "scrubbed".to_string();
        self.last_name = "scrubbed".to_string();
        self.address.street = "scrubbed".to_string();
        self.address.street2 = Some("scrubbed".to_string());
        self.address.city = "scrubbed".to_string();
        self.address.state = "NA".to_string();
        self.address.post_code = "scrubbed".to_string();
        self.latitude = None;
        self.longitude = None;
        self.cannot_geocode = false;
    }
}

/// Flat row image of the `account` relation. Conversion into `Account` is
/// where the free-text `account_type` column gets parsed into the enum.
#[derive(Debug, Clone, FromRow)]
pub struct AccountRow {
    pub id: Uuid,
    pub email: String,
    pub account_type: String,
    pub auth_issuer: Option<String>,
    pub auth_sub: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub street: String,
    pub street2: Option<String>,
    pub city: String,
    pub state: String,
    pub post_code: String,
    pub country_code: String,
    pub created_with_kit_id: Option<String>,
    pub preferred_language: String,
    pub consent_privacy_terms: bool,
    pub creation_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub cannot_geocode: bool,
}

impl TryFrom<AccountRow> for Account {
    type Error = String;

    fn try_from(r: AccountRow) -> Result<Self, Self::Error> {
        let account_type = AccountType::from_str(&r.account_type)
            .ok_or_else(|| format!("unknown account_type '{}' on account {}", r.account_type, r.id))?;
        Ok(Account {
            id: r.id,
            email: r.email,
            account_type,
            auth_issuer: r.auth_issuer,
            auth_sub: r.auth_sub,
            first_name: r.first_name,
            last_name: r.last_name,
            address: Address {
                street: r.street,
                street2: r.street2,
                city: r.city,
                state: r.state,
                post_code: r.post_code,
                country_code: r.country_code,
            },
            latitude: r.latitude,
            longitude: r.longitude,
            cannot_geocode: r.cannot_geocode,
            preferred_language: r.preferred_language,
            consent_privacy_terms: r.consent_privacy_terms,
            created_with_kit_id: r.created_with_kit_id,
            creation_time: r.creation_time,
            update_time: r.update_time,
        })
    }
}
