//! OAuth2 client-credentials token acquisition.

use labhub_config::HubSettings;
use labhub_core::{HubError, HubMode, Result, paths};
use serde::Deserialize;
use time::OffsetDateTime;
use tracing::{debug, warn};

/// A bearer token issued by the hub's authorization server.
#[derive(Clone)]
pub struct Token {
    pub access_token: String,
    pub issued_at: OffsetDateTime,
    /// Lifetime in seconds, when the hub reports one
    pub expires_in: Option<u64>,
}

impl Token {
    pub fn expires_at(&self) -> Option<OffsetDateTime> {
        self.expires_in
            .and_then(|secs| i64::try_from(secs).ok())
            .map(|secs| self.issued_at + time::Duration::seconds(secs))
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &"<redacted>")
            .field("issued_at", &self.issued_at)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Fetches client-credentials tokens. Nothing is cached: every call is a
/// round trip to the token endpoint.
#[derive(Clone)]
pub struct TokenProvider {
    http: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
}

impl TokenProvider {
    /// Validates credentials eagerly; a missing id or secret fails here,
    /// before any request is made.
    pub fn new(settings: &HubSettings, mode: HubMode) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(|e| HubError::transport("failed to build HTTP client", e))?;
        Self::with_client(settings, mode, http)
    }

    /// Same as [`TokenProvider::new`] but shares an existing HTTP client.
    pub fn with_client(settings: &HubSettings, mode: HubMode, http: reqwest::Client) -> Result<Self> {
        let client_id = required(settings.client_id.as_deref(), "hub.client_id")?;
        let client_secret = required(settings.client_secret.as_deref(), "hub.client_secret")?;
        let base_url = mode.select(&settings.testing_url, &settings.production_url);
        Ok(Self {
            http,
            token_url: format!("{base_url}{}", paths::TOKEN),
            client_id,
            client_secret,
        })
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    /// Requests a fresh token.
    ///
    /// A non-200 answer, or a 200 whose body has no usable `access_token`,
    /// is reported as [`HubError::Http`] with the raw body.
    pub async fn get_token(&self) -> Result<Token> {
        let resp = self
            .http
            .post(&self.token_url)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .header("Accept", "application/json")
            .body(form_body(&self.client_id, &self.client_secret))
            .send()
            .await
            .map_err(|e| HubError::transport("token request failed", e))?;

        let status = resp.status().as_u16();
        let body = resp
            .bytes()
            .await
            .map_err(|e| HubError::transport("failed to read token response", e))?;

        if status != 200 {
            warn!(status, body = %String::from_utf8_lossy(&body), "Token endpoint rejected the request");
            return Err(HubError::http(status, body.to_vec()));
        }

        let parsed: Option<TokenResponse> = serde_json::from_slice(&body).ok();
        match parsed {
            Some(TokenResponse {
                access_token: Some(access_token),
                expires_in,
            }) if !access_token.trim().is_empty() => {
                debug!(expires_in = ?expires_in, "Obtained hub access token");
                Ok(Token {
                    access_token,
                    issued_at: OffsetDateTime::now_utc(),
                    expires_in,
                })
            }
            _ => {
                warn!(body = %String::from_utf8_lossy(&body), "Token response has no access_token");
                Err(HubError::http(status, body.to_vec()))
            }
        }
    }
}

impl std::fmt::Debug for TokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenProvider")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

fn required(value: Option<&str>, key: &str) -> Result<String> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(HubError::config(key, format!("{key} is not configured"))),
    }
}

fn form_body(client_id: &str, client_secret: &str) -> String {
    format!(
        "grant_type=client_credentials&client_id={}&client_secret={}",
        urlencoding(client_id),
        urlencoding(client_secret),
    )
}

fn urlencoding(s: &str) -> String {
    url::form_urlencoded::byte_serialize(s.as_bytes()).collect()
}
