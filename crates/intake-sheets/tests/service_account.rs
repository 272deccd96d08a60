//! Service account grant: JWT assertion signing and the token exchange
//! against a local token endpoint.

use base64::prelude::BASE64_URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{TimeZone, Utc};
use intake_sheets::{ServiceAccountKey, TokenSource, SPREADSHEETS_SCOPE};
use pretty_assertions::assert_eq;
use ring::signature::{UnparsedPublicKey, RSA_PKCS1_2048_8192_SHA256};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use warp::Filter;

const CLIENT_EMAIL: &str = "intake-test@intake-test.iam.gserviceaccount.com";
const PUBLIC_KEY_DER: &[u8] = include_bytes!("fixtures/service-account.pub.der");

fn test_key() -> ServiceAccountKey {
    ServiceAccountKey::from_file(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/fixtures/service-account.json"
    ))
    .unwrap()
}

fn decode_segment(segment: &str) -> Value {
    serde_json::from_slice(&BASE64_URL_SAFE_NO_PAD.decode(segment).unwrap()).unwrap()
}

#[test]
fn assertion_is_a_signed_rs256_jwt() {
    let key = test_key();
    assert_eq!(key.client_email, CLIENT_EMAIL);
    assert_eq!(key.token_uri, "https://oauth2.googleapis.com/token");

    let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let jwt = key.signed_assertion(SPREADSHEETS_SCOPE, now).unwrap();

    let parts: Vec<&str> = jwt.split('.').collect();
    assert_eq!(parts.len(), 3);

    let header = decode_segment(parts[0]);
    assert_eq!(header, json!({ "alg": "RS256", "typ": "JWT" }));

    let claims = decode_segment(parts[1]);
    assert_eq!(claims["iss"], CLIENT_EMAIL);
    assert_eq!(claims["scope"], SPREADSHEETS_SCOPE);
    assert_eq!(claims["aud"], key.token_uri.as_str());
    assert_eq!(claims["iat"], now.timestamp());
    assert_eq!(
        claims["exp"].as_i64().unwrap() - claims["iat"].as_i64().unwrap(),
        3600
    );

    let signing_input = format!("{}.{}", parts[0], parts[1]);
    let signature = BASE64_URL_SAFE_NO_PAD.decode(parts[2]).unwrap();
    UnparsedPublicKey::new(&RSA_PKCS1_2048_8192_SHA256, PUBLIC_KEY_DER)
        .verify(signing_input.as_bytes(), &signature)
        .unwrap();
}

#[test]
fn tampered_claims_fail_verification() {
    let jwt = test_key()
        .signed_assertion(SPREADSHEETS_SCOPE, Utc::now())
        .unwrap();
    let parts: Vec<&str> = jwt.split('.').collect();

    let forged = BASE64_URL_SAFE_NO_PAD.encode(
        serde_json::to_vec(&json!({ "iss": "someone-else@example.com" })).unwrap(),
    );
    let signing_input = format!("{}.{}", parts[0], forged);
    let signature = BASE64_URL_SAFE_NO_PAD.decode(parts[2]).unwrap();
    assert!(UnparsedPublicKey::new(&RSA_PKCS1_2048_8192_SHA256, PUBLIC_KEY_DER)
        .verify(signing_input.as_bytes(), &signature)
        .is_err());
}

/// Token endpoint that checks the grant and hands out numbered tokens
async fn spawn_token_endpoint(expires_in: i64) -> (String, Arc<AtomicUsize>) {
    let fetches = Arc::new(AtomicUsize::new(0));
    let counter = fetches.clone();
    let routes = warp::post()
        .and(warp::path("token"))
        .and(warp::body::form::<HashMap<String, String>>())
        .map(move |form: HashMap<String, String>| {
            assert_eq!(
                form.get("grant_type").map(String::as_str),
                Some("urn:ietf:params:oauth:grant-type:jwt-bearer")
            );
            let assertion = form.get("assertion").cloned().unwrap_or_default();
            let claims = decode_segment(assertion.split('.').nth(1).unwrap_or_default());
            assert_eq!(claims["iss"], CLIENT_EMAIL);

            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            warp::reply::json(&json!({
                "access_token": format!("ya29.token-{n}"),
                "expires_in": expires_in,
                "token_type": "Bearer",
            }))
        });
    let (addr, server) = warp::serve(routes).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);
    (format!("http://{addr}/token"), fetches)
}

#[tokio::test]
async fn token_is_fetched_once_and_cached() {
    let (token_uri, fetches) = spawn_token_endpoint(3600).await;
    let mut key = test_key();
    key.token_uri = token_uri;
    let source = TokenSource::service_account(key);
    let http = reqwest::Client::new();

    let first = source.access_token(&http).await.unwrap();
    let second = source.access_token(&http).await.unwrap();

    assert_eq!(first, "ya29.token-1");
    assert_eq!(second, first);
    assert_eq!(fetches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn token_near_expiry_is_refetched() {
    let (token_uri, fetches) = spawn_token_endpoint(30).await;
    let mut key = test_key();
    key.token_uri = token_uri;
    let source = TokenSource::service_account(key);
    let http = reqwest::Client::new();

    let first = source.access_token(&http).await.unwrap();
    let second = source.access_token(&http).await.unwrap();

    assert_eq!(first, "ya29.token-1");
    assert_eq!(second, "ya29.token-2");
    assert_eq!(fetches.load(Ordering::SeqCst), 2);
}
