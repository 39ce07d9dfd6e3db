//! Firestore connection settings
//!
//! Read once from the process environment at startup and handed to the
//! adapter by value. Nothing here is mutated afterwards.
//!
//! Environment variables:
//!   FIREBASE_PROJECT_ID        # project owning the database
//!   FIREBASE_CLIENT_EMAIL      # service-account email
//!   FIREBASE_PRIVATE_KEY       # service-account PEM (literal "\n" allowed)
//!   FIRESTORE_EMULATOR_HOST    # host:port of a local emulator (skips credentials)

use std::fmt;

use crate::error::{Result, StoreError};

pub const PROJECT_ID_VAR: &str = "FIREBASE_PROJECT_ID";
pub const CLIENT_EMAIL_VAR: &str = "FIREBASE_CLIENT_EMAIL";
pub const PRIVATE_KEY_VAR: &str = "FIREBASE_PRIVATE_KEY";
pub const EMULATOR_HOST_VAR: &str = "FIRESTORE_EMULATOR_HOST";

/// Google OAuth2 token endpoint used for the JWT bearer exchange
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Service-account credentials
#[derive(Clone)]
pub struct ServiceAccount {
    pub client_email: String,
    pub private_key: String,
    pub token_uri: String,
}

impl fmt::Debug for ServiceAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccount")
            .field("client_email", &self.client_email)
            .field("private_key", &"<redacted>")
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

/// Where requests are sent
#[derive(Debug, Clone)]
pub enum Endpoint {
    /// firestore.googleapis.com with service-account auth
    Google(ServiceAccount),
    /// Local emulator, no credentials
    Emulator { host: String },
}

/// Everything the Firestore adapter needs to connect
#[derive(Debug, Clone)]
pub struct FirestoreSettings {
    pub project_id: String,
    pub endpoint: Endpoint,
}

impl FirestoreSettings {
    /// Load settings from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let require =
            |key: &str| get(key).ok_or_else(|| StoreError::config(format!("{key} not set")));

        let project_id = require(PROJECT_ID_VAR)?;

        if let Some(host) = get(EMULATOR_HOST_VAR) {
            return Ok(Self {
                project_id,
                endpoint: Endpoint::Emulator { host },
            });
        }

        let client_email = require(CLIENT_EMAIL_VAR)?;
        let private_key = unescape_newlines(&require(PRIVATE_KEY_VAR)?);

        Ok(Self {
            project_id,
            endpoint: Endpoint::Google(ServiceAccount {
                client_email,
                private_key,
                token_uri: DEFAULT_TOKEN_URI.to_string(),
            }),
        })
    }
}

/// Private keys pasted into `.env` files usually carry literal `\n` escapes.
pub fn unescape_newlines(key: &str) -> String {
    key.replace("\\n", "\n")
}
