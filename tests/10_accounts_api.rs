// HTTP round-trip over the account API. Needs the server binary built and a
// live database behind DATABASE_URL.
//
// Run with: cargo build && DATABASE_URL=postgres://... cargo test -- --ignored

mod common;

use anyhow::Result;
use serde_json::{json, Value};
use uuid::Uuid;

fn account_body(email: &str) -> Value {
    json!({
        "email": email,
        "first_name": "Jane",
        "last_name": "Doe",
        "address": {
            "street": "123 Main St",
            "city": "San Diego",
            "state": "CA",
            "post_code": "92101",
            "country_code": "US"
        },
        "consent_privacy_terms": true,
        "created_with_kit_id": "kit-0001"
    })
}

fn unique_email(tag: &str) -> String {
    format!("{}+{}@api-test.example.com", tag, Uuid::new_v4())
}

#[tokio::test]
#[ignore = "requires the built server binary and a live PostgreSQL via DATABASE_URL"]
async fn create_claim_and_scrub_round_trip() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    // Create a legacy account (no auth pair).
    let email = unique_email("roundtrip");
    let resp = client
        .post(format!("{}/api/accounts", server.base_url))
        .json(&account_body(&email))
        .send()
        .await?;
    assert_eq!(resp.status(), 201);
    let created: Value = resp.json().await?;
    let id = created["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(created["data"]["account_type"], "standard");
    assert!(created["data"]["auth_issuer"].is_null());

    // Claim it for an authenticated identity.
    let resp = client
        .post(format!("{}/api/accounts/claim", server.base_url))
        .json(&json!({ "email": email, "auth_issuer": "iss1", "auth_sub": "sub1" }))
        .send()
        .await?;
    assert_eq!(resp.status(), 200);
    let claimed: Value = resp.json().await?;
    assert_eq!(claimed["data"]["id"], id.as_str());
    assert_eq!(claimed["data"]["auth_issuer"], "iss1");
    assert_eq!(claimed["data"]["auth_sub"], "sub1");

    // Claiming again with the same identity is nothing-to-claim, not an error.
    let resp = client
        .post(format!("{}/api/accounts/claim", server.base_url))
        .json(&json!({ "email": email, "auth_issuer": "iss1", "auth_sub": "sub1" }))
        .send()
        .await?;
    assert_eq!(resp.status(), 200);
    let reclaim: Value = resp.json().await?;
    assert!(reclaim["data"].is_null());

    // The linked lookup resolves the identity to the same account.
    let resp = client
        .get(format!(
            "{}/api/accounts/linked?auth_issuer=iss1&auth_sub=sub1",
            server.base_url
        ))
        .send()
        .await?;
    assert_eq!(resp.status(), 200);
    let linked: Value = resp.json().await?;
    assert_eq!(linked["data"]["id"], id.as_str());

    // Scrub, then verify redaction through a plain GET.
    let resp = client
        .post(format!("{}/api/accounts/{}/scrub", server.base_url, id))
        .send()
        .await?;
    assert_eq!(resp.status(), 200);

    let resp = client
        .get(format!("{}/api/accounts/{}", server.base_url, id))
        .send()
        .await?;
    assert_eq!(resp.status(), 200);
    let scrubbed: Value = resp.json().await?;
    assert_eq!(scrubbed["data"]["account_type"], "deleted");
    assert_eq!(scrubbed["data"]["first_name"], "scrubbed");
    assert!(scrubbed["data"]["auth_issuer"].is_null());

    // Teardown.
    let resp = client
        .delete(format!("{}/api/accounts/{}", server.base_url, id))
        .send()
        .await?;
    assert_eq!(resp.status(), 204);
    Ok(())
}

#[tokio::test]
#[ignore = "requires the built server binary and a live PostgreSQL via DATABASE_URL"]
async fn duplicate_email_is_409_with_distinct_message() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let email = unique_email("conflict");
    let resp = client
        .post(format!("{}/api/accounts", server.base_url))
        .json(&account_body(&email))
        .send()
        .await?;
    assert_eq!(resp.status(), 201);
    let created: Value = resp.json().await?;
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let resp = client
        .post(format!("{}/api/accounts", server.base_url))
        .json(&account_body(&email))
        .send()
        .await?;
    assert_eq!(resp.status(), 409);
    let body: Value = resp.json().await?;
    assert_eq!(body["code"], "CONFLICT");
    assert!(body["message"].as_str().unwrap().contains(&email));

    client
        .delete(format!("{}/api/accounts/{}", server.base_url, id))
        .send()
        .await?;
    Ok(())
}

#[tokio::test]
#[ignore = "requires the built server binary and a live PostgreSQL via DATABASE_URL"]
async fn missing_fields_are_reported_per_field() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/api/accounts", server.base_url))
        .json(&json!({ "first_name": "Jane" }))
        .send()
        .await?;
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await?;
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["field_errors"]["email"], "This field is required");
    assert_eq!(body["field_errors"]["address"], "This field is required");
    Ok(())
}

#[tokio::test]
#[ignore = "requires the built server binary and a live PostgreSQL via DATABASE_URL"]
async fn unknown_account_is_404() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("{}/api/accounts/{}", server.base_url, Uuid::new_v4()))
        .send()
        .await?;
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await?;
    assert_eq!(body["code"], "NOT_FOUND");
    Ok(())
}
