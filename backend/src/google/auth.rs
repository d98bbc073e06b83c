//! Service-account OAuth2 (JWT bearer grant) for Google APIs.
//!
//! A signed RS256 assertion is exchanged at the key's `token_uri` for an access
//! token, which is cached until one minute before it expires.

use crate::error::ProviderError;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use log::debug;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;

pub const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";
pub const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
pub const GMAIL_SEND_SCOPE: &str = "https://www.googleapis.com/auth/gmail.send";

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: u64 = 3600;
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Deserialize)]
struct ServiceAccountKey {
    client_email: String,
    private_key: String,
    #[serde(default = "default_token_uri")]
    token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

#[derive(Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: u64,
    exp: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    sub: Option<&'a str>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    ASSERTION_LIFETIME_SECS
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

pub struct GoogleAuth {
    client_email: String,
    private_key: SecretString,
    token_uri: String,
    scope: String,
    subject: Option<String>,
    http: Client,
    cached: Mutex<Option<CachedToken>>,
}

impl GoogleAuth {
    pub fn from_key_file(
        path: &Path,
        scopes: &[&str],
        subject: Option<String>,
        http: Client,
    ) -> Result<Self, ProviderError> {
        let content = std::fs::read_to_string(path).map_err(|source| ProviderError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_key_json(&content, scopes, subject, http)
    }

    pub fn from_key_json(
        json: &str,
        scopes: &[&str],
        subject: Option<String>,
        http: Client,
    ) -> Result<Self, ProviderError> {
        let key: ServiceAccountKey = serde_json::from_str(json)
            .map_err(|e| ProviderError::Auth(format!("invalid service account key: {e}")))?;
        if key.client_email.trim().is_empty() || key.private_key.trim().is_empty() {
            return Err(ProviderError::Auth(
                "service account key is missing client_email or private_key".to_string(),
            ));
        }

        Ok(Self {
            client_email: key.client_email,
            private_key: SecretString::from(key.private_key),
            token_uri: key.token_uri,
            scope: scopes.join(" "),
            subject,
            http,
            cached: Mutex::new(None),
        })
    }

    pub fn client_email(&self) -> &str {
        &self.client_email
    }

    fn assertion(&self, now: u64) -> Result<String, ProviderError> {
        let claims = Claims {
            iss: &self.client_email,
            scope: &self.scope,
            aud: &self.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
            sub: self.subject.as_deref(),
        };
        let key = EncodingKey::from_rsa_pem(self.private_key.expose_secret().as_bytes())
            .map_err(|e| ProviderError::Auth(e.to_string()))?;

        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|e| ProviderError::Auth(e.to_string()))
    }

    /// Returns a valid bearer token, minting a new one when the cache is stale.
    pub async fn access_token(&self) -> Result<String, ProviderError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() + EXPIRY_MARGIN < token.expires_at {
                return Ok(token.value.clone());
            }
        }

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| ProviderError::Auth(e.to_string()))?
            .as_secs();
        let assertion = self.assertion(now)?;

        debug!("Requesting access token for {}", self.client_email);
        let response = self
            .http
            .post(&self.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(super::transport("oauth"))?;
        let response = super::check_response("oauth", response).await?;
        let token: TokenResponse = response.json().await.map_err(super::decode("oauth"))?;

        let value = token.access_token.clone();
        *cached = Some(CachedToken {
            value: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        });
        Ok(value)
    }
}
