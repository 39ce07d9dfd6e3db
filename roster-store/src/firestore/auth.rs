//! Service-account access tokens
//!
//! OAuth2 JWT bearer flow: sign a short-lived assertion with the
//! service-account key, exchange it for an access token, cache the token
//! until shortly before it expires.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::settings::ServiceAccount;

/// OAuth scope granting Firestore access
pub const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";

/// Lifetime requested for each assertion (Google's maximum)
const ASSERTION_TTL_SECS: i64 = 3600;

/// Refresh this long before the cached token expires
const REFRESH_MARGIN_SECS: i64 = 60;

/// Fixed bearer accepted by the Firestore emulator
pub const EMULATOR_TOKEN: &str = "owner";

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
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
struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

enum Source {
    ServiceAccount {
        account: ServiceAccount,
        key: EncodingKey,
        cached: Mutex<Option<CachedToken>>,
    },
    Emulator,
}

/// Produces bearer tokens for outgoing requests
pub struct TokenSource {
    source: Source,
}

impl TokenSource {
    /// Parse the private key up front so bad credentials fail at startup
    pub fn service_account(account: ServiceAccount) -> Result<Self> {
        let key = EncodingKey::from_rsa_pem(account.private_key.as_bytes())
            .map_err(|e| StoreError::auth(format!("invalid private key: {e}")))?;
        Ok(Self {
            source: Source::ServiceAccount {
                account,
                key,
                cached: Mutex::new(None),
            },
        })
    }

    /// Token source for the local emulator
    pub fn emulator() -> Self {
        Self {
            source: Source::Emulator,
        }
    }

    /// Current bearer token, exchanging a new one if needed
    pub async fn token(&self, http: &Client) -> Result<String> {
        match &self.source {
            Source::Emulator => Ok(EMULATOR_TOKEN.to_string()),
            Source::ServiceAccount {
                account,
                key,
                cached,
            } => {
                let mut cached = cached.lock().await;
                let now = Utc::now();
                if let Some(token) = cached.as_ref().filter(|t| is_fresh(t, now)) {
                    return Ok(token.value.clone());
                }

                let token = exchange(http, account, key, now).await?;
                let value = token.value.clone();
                *cached = Some(token);
                Ok(value)
            }
        }
    }
}

fn is_fresh(token: &CachedToken, now: DateTime<Utc>) -> bool {
    token.expires_at - Duration::seconds(REFRESH_MARGIN_SECS) > now
}

/// Build the signed assertion sent to the token endpoint
fn sign_assertion(account: &ServiceAccount, key: &EncodingKey, now: DateTime<Utc>) -> Result<String> {
    let iat = now.timestamp();
    let claims = Claims {
        iss: &account.client_email,
        scope: DATASTORE_SCOPE,
        aud: &account.token_uri,
        iat,
        exp: iat + ASSERTION_TTL_SECS,
    };
    jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, key)
        .map_err(|e| StoreError::auth(format!("failed to sign assertion: {e}")))
}

async fn exchange(
    http: &Client,
    account: &ServiceAccount,
    key: &EncodingKey,
    now: DateTime<Utc>,
) -> Result<CachedToken> {
    let assertion = sign_assertion(account, key, now)?;

    debug!(client_email = %account.client_email, "exchanging service-account assertion");
    let response = http
        .post(&account.token_uri)
        .form(&[
            ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
            ("assertion", assertion.as_str()),
        ])
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(StoreError::auth(format!(
            "token endpoint returned {status}: {body}"
        )));
    }

    let token: TokenResponse = response
        .json()
        .await
        .map_err(|e| StoreError::auth(format!("unreadable token response: {e}")))?;

    Ok(CachedToken {
        value: token.access_token,
        expires_at: now + Duration::seconds(token.expires_in),
    })
}
