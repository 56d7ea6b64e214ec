use std::collections::HashMap;

use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::database::models::account::{Account, AccountType, Address};
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct AddressPayload {
    pub street: Option<String>,
    pub street2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub post_code: Option<String>,
    pub country_code: Option<String>,
}

/// Body for POST /api/accounts. Every field is optional at the serde level so
/// validation can report all missing fields at once instead of failing on the
/// first one.
#[derive(Debug, Deserialize)]
pub struct NewAccountPayload {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub address: Option<AddressPayload>,
    pub preferred_language: Option<String>,
    pub consent_privacy_terms: Option<bool>,
    pub created_with_kit_id: Option<String>,
    pub auth_issuer: Option<String>,
    pub auth_sub: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub cannot_geocode: Option<bool>,
}

/// Body for PUT /api/accounts/:id. Profile fields only; consent, kit linkage
/// and the auth pair are not updatable through this payload.
#[derive(Debug, Deserialize)]
pub struct UpdateAccountPayload {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub address: Option<AddressPayload>,
    pub preferred_language: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub cannot_geocode: Option<bool>,
}

/// Body for POST /api/accounts/claim. Issuer and subject arrive here already
/// verified by the external identity provider.
#[derive(Debug, Deserialize)]
pub struct ClaimPayload {
    pub email: Option<String>,
    pub auth_issuer: Option<String>,
    pub auth_sub: Option<String>,
}

fn require<T>(
    field: &str,
    value: Option<T>,
    errors: &mut HashMap<String, String>,
) -> Option<T> {
    if value.is_none() {
        errors.insert(field.to_string(), "This field is required".to_string());
    }
    value
}

fn validation(errors: HashMap<String, String>) -> ApiError {
    ApiError::validation_error("Missing required fields", Some(errors))
}

fn address_from_payload(
    payload: Option<AddressPayload>,
    errors: &mut HashMap<String, String>,
) -> Option<Address> {
    let Some(addr) = payload else {
        errors.insert("address".to_string(), "This field is required".to_string());
        return None;
    };
    let street = require("address.street", addr.street, errors);
    let city = require("address.city", addr.city, errors);
    let state = require("address.state", addr.state, errors);
    let post_code = require("address.post_code", addr.post_code, errors);
    let country_code = require("address.country_code", addr.country_code, errors);
    Some(Address {
        street: street?,
        street2: addr.street2,
        city: city?,
        state: state?,
        post_code: post_code?,
        country_code: country_code?,
    })
}

impl NewAccountPayload {
    /// Build a fresh Account, reporting every missing required field by name.
    pub fn into_account(self) -> Result<Account, ApiError> {
        let mut errors = HashMap::new();

        let email = require("email", self.email, &mut errors);
        let first_name = require("first_name", self.first_name, &mut errors);
        let last_name = require("last_name", self.last_name, &mut errors);
        let consent = require("consent_privacy_terms", self.consent_privacy_terms, &mut errors);
        let kit_id = require("created_with_kit_id", self.created_with_kit_id, &mut errors);
        let address = address_from_payload(self.address, &mut errors);

        // The auth pair is all-or-nothing; accepting half of it would write
        // the inconsistent state the classifier treats as corrupt.
        if self.auth_issuer.is_some() != self.auth_sub.is_some() {
            return Err(ApiError::bad_request(
                "auth_issuer and auth_sub must be provided together",
            ));
        }

        if !errors.is_empty() {
            return Err(validation(errors));
        }

        let now = Utc::now();
        Ok(Account {
            id: Uuid::new_v4(),
            email: email.unwrap(),
            account_type: AccountType::Standard,
            auth_issuer: self.auth_issuer,
            auth_sub: self.auth_sub,
            first_name: first_name.unwrap(),
            last_name: last_name.unwrap(),
            address: address.unwrap(),
            latitude: self.latitude,
            longitude: self.longitude,
            cannot_geocode: self.cannot_geocode.unwrap_or(false),
            preferred_language: self.preferred_language.unwrap_or_else(|| "en_US".to_string()),
            consent_privacy_terms: consent.unwrap(),
            created_with_kit_id: Some(kit_id.unwrap()),
            // Placeholders; the store assigns the authoritative timestamps.
            creation_time: now,
            update_time: now,
        })
    }
}

impl UpdateAccountPayload {
    /// Apply the payload onto an existing account. Only mutable profile
    /// fields are touched.
    pub fn apply(self, account: &mut Account) -> Result<(), ApiError> {
        let mut errors = HashMap::new();

        let email = require("email", self.email, &mut errors);
        let first_name = require("first_name", self.first_name, &mut errors);
        let last_name = require("last_name", self.last_name, &mut errors);
        let address = address_from_payload(self.address, &mut errors);

        if !errors.is_empty() {
            return Err(validation(errors));
        }

        account.email = email.unwrap();
        account.first_name = first_name.unwrap();
        account.last_name = last_name.unwrap();
        account.address = address.unwrap();
        if let Some(language) = self.preferred_language {
            account.preferred_language = language;
        }
        account.latitude = self.latitude;
        account.longitude = self.longitude;
        account.cannot_geocode = self.cannot_geocode.unwrap_or(false);
        Ok(())
    }
}

impl ClaimPayload {
    pub fn into_parts(self) -> Result<(String, String, String), ApiError> {
        let mut errors = HashMap::new();
        let email = require("email", self.email, &mut errors);
        let auth_issuer = require("auth_issuer", self.auth_issuer, &mut errors);
        let auth_sub = require("auth_sub", self.auth_sub, &mut errors);
        if !errors.is_empty() {
            return Err(validation(errors));
        }
        Ok((email.unwrap(), auth_issuer.unwrap(), auth_sub.unwrap()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_payload() -> NewAccountPayload {
        NewAccountPayload {
            email: Some("jane@example.com".to_string()),
            first_name: Some("Jane".to_string()),
            last_name: Some("Doe".to_string()),
            address: Some(AddressPayload {
                street: Some("123 Main St".to_string()),
                street2: None,
                city: Some("San Diego".to_string()),
                state: Some("CA".to_string()),
                post_code: Some("92101".to_string()),
                country_code: Some("US".to_string()),
            }),
            preferred_language: None,
            consent_privacy_terms: Some(true),
            created_with_kit_id: Some("kit-0001".to_string()),
            auth_issuer: None,
            auth_sub: None,
            latitude: None,
            longitude: None,
            cannot_geocode: None,
        }
    }

    #[test]
    fn complete_payload_builds_standard_account() {
        let account = full_payload().into_account().unwrap();
        assert_eq!(account.account_type, AccountType::Standard);
        assert_eq!(account.email, "jane@example.com");
        assert_eq!(account.preferred_language, "en_US");
        assert_eq!(account.created_with_kit_id.as_deref(), Some("kit-0001"));
        assert!(account.auth_issuer.is_none());
    }

    #[test]
    fn missing_fields_are_each_reported_by_name() {
        let mut payload = full_payload();
        payload.email = None;
        payload.consent_privacy_terms = None;
        let err = payload.into_account().unwrap_err();
        match err {
            ApiError::ValidationError { field_errors: Some(fields), .. } => {
                assert!(fields.contains_key("email"));
                assert!(fields.contains_key("consent_privacy_terms"));
                assert!(!fields.contains_key("first_name"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn missing_address_subfields_are_reported() {
        let mut payload = full_payload();
        payload.address = Some(AddressPayload {
            street: None,
            street2: None,
            city: Some("San Diego".to_string()),
            state: None,
            post_code: Some("92101".to_string()),
            country_code: Some("US".to_string()),
        });
        let err = payload.into_account().unwrap_err();
        match err {
            ApiError::ValidationError { field_errors: Some(fields), .. } => {
                assert!(fields.contains_key("address.street"));
                assert!(fields.contains_key("address.state"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn one_sided_auth_pair_is_rejected() {
        let mut payload = full_payload();
        payload.auth_issuer = Some("iss1".to_string());
        let err = payload.into_account().unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn update_does_not_touch_write_once_fields() {
        let mut account = full_payload().into_account().unwrap();
        let original_kit = account.created_with_kit_id.clone();
        let update = UpdateAccountPayload {
            email: Some("jane.doe@example.com".to_string()),
            first_name: Some("Jane".to_string()),
            last_name: Some("Doe".to_string()),
            address: Some(AddressPayload {
                street: Some("500 Elm St".to_string()),
                street2: None,
                city: Some("Austin".to_string()),
                state: Some("TX".to_string()),
                post_code: Some("78701".to_string()),
                country_code: Some("US".to_string()),
            }),
            preferred_language: Some("es_MX".to_string()),
            latitude: None,
            longitude: None,
            cannot_geocode: Some(true),
        };
        update.apply(&mut account).unwrap();
        assert_eq!(account.email, "jane.doe@example.com");
        assert_eq!(account.address.city, "Austin");
        assert_eq!(account.preferred_language, "es_MX");
        assert!(account.cannot_geocode);
        assert_eq!(account.created_with_kit_id, original_kit);
        assert!(account.consent_privacy_terms);
    }

    #[test]
    fn claim_payload_requires_all_three_parts() {
        let payload = ClaimPayload {
            email: Some("jane@example.com".to_string()),
            auth_issuer: None,
            auth_sub: Some("sub1".to_string()),
        };
        let err = payload.into_parts().unwrap_err();
        match err {
            ApiError::ValidationError { field_errors: Some(fields), .. } => {
                assert!(fields.contains_key("auth_issuer"));
                assert!(!fields.contains_key("email"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
