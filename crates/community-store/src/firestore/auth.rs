//! OAuth2 bearer tokens for the Firestore REST API.
//!
//! Service accounts authenticate with a self-signed RS256 JWT assertion which
//! is exchanged at the key's token endpoint for a short-lived access token.
//! Tokens are cached until shortly before they expire.

use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::credentials::ServiceAccountKey;
use crate::{Result, StoreError};

/// OAuth2 scope granting Firestore access.
const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";

/// Grant type for the JWT bearer flow.
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Token the Firestore emulator accepts without verification.
const EMULATOR_TOKEN: &str = "owner";

/// Seconds before expiry at which a cached token is considered stale.
const EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Debug, Serialize)]
struct JwtClaims<'a> {
    iss: &'a str,
    sub: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Clone)]
pub(crate) struct CachedToken {
    access_token: String,
    expires_at: i64,
}

/// Source of `Authorization` bearer tokens.
pub(crate) enum TokenSource {
    /// Service-account JWT exchange with caching.
    ServiceAccount {
        key: ServiceAccountKey,
        encoding_key: EncodingKey,
        cache: Mutex<Option<CachedToken>>,
    },
    /// Local emulator, no real authentication.
    Emulator,
}

impl TokenSource {
    /// Prepares a service-account token source. Fails if the private key is
    /// not a valid RSA PEM key.
    pub(crate) fn service_account(key: ServiceAccountKey) -> Result<Self> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| StoreError::Credentials(format!("invalid private key: {e}")))?;

        Ok(Self::ServiceAccount {
            key,
            encoding_key,
            cache: Mutex::new(None),
        })
    }

    /// Returns a bearer token, fetching a new one if needed.
    pub(crate) async fn bearer(&self, http: &reqwest::Client) -> Result<String> {
        let (key, encoding_key, cache) = match self {
            TokenSource::Emulator => return Ok(EMULATOR_TOKEN.to_string()),
            TokenSource::ServiceAccount {
                key,
                encoding_key,
                cache,
            } => (key, encoding_key, cache),
        };

        let cached = cache.lock().clone();
        if let Some(cached) = cached {
            if cached.expires_at > Utc::now().timestamp() + EXPIRY_MARGIN_SECS {
                return Ok(cached.access_token);
            }
        }

        let fresh = fetch_token(http, key, encoding_key).await?;
        let access_token = fresh.access_token.clone();
        *cache.lock() = Some(fresh);

        tracing::debug!(client_email = %key.client_email, "Obtained Firestore access token");
        Ok(access_token)
    }
}

async fn fetch_token(
    http: &reqwest::Client,
    key: &ServiceAccountKey,
    encoding_key: &EncodingKey,
) -> Result<CachedToken> {
    let now = Utc::now();
    let claims = JwtClaims {
        iss: &key.client_email,
        sub: &key.client_email,
        scope: DATASTORE_SCOPE,
        aud: &key.token_uri,
        iat: now.timestamp(),
        exp: (now + Duration::hours(1)).timestamp(),
    };

    let mut header = Header::new(Algorithm::RS256);
    header.kid = key.private_key_id.clone();

    let assertion = encode(&header, &claims, encoding_key)
        .map_err(|e| StoreError::Credentials(format!("failed to sign JWT: {e}")))?;

    let response = http
        .post(&key.token_uri)
        .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
        .send()
        .await
        .map_err(|e| StoreError::Transport(e.to_string()))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(StoreError::Credentials(format!(
            "token request failed with status {status}: {body}"
        )));
    }

    let token: TokenResponse = response
        .json()
        .await
        .map_err(|e| StoreError::Decode(format!("invalid token response: {e}")))?;

    Ok(CachedToken {
        expires_at: Utc::now().timestamp() + token.expires_in,
        access_token: token.access_token,
    })
}
