//! Authenticated GET/POST against the hub.

use labhub_config::HubSettings;
use labhub_core::{HubError, HubMode, Result};
use serde_json::Value;
use tracing::{debug, warn};

use crate::token::TokenProvider;

/// Sends authenticated requests to `<base_url><path>`.
///
/// Each call obtains a fresh token first. Anything but HTTP 200 becomes
/// [`HubError::Http`] with the body kept verbatim.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    http: reqwest::Client,
    base_url: String,
    tokens: TokenProvider,
}

impl HttpGateway {
    pub fn new(settings: &HubSettings, mode: HubMode) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(|e| HubError::transport("failed to build HTTP client", e))?;
        let tokens = TokenProvider::with_client(settings, mode, http.clone())?;
        Ok(Self {
            http,
            base_url: mode
                .select(&settings.testing_url, &settings.production_url)
                .to_string(),
            tokens,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn tokens(&self) -> &TokenProvider {
        &self.tokens
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn request(&self, method: reqwest::Method, path: &str) -> Result<reqwest::RequestBuilder> {
        let token = self.tokens.get_token().await?;
        Ok(self
            .http
            .request(method, self.url(path))
            .bearer_auth(token.access_token)
            .header("Accept", "application/json"))
    }

    pub async fn get(&self, path: &str) -> Result<String> {
        let resp = self
            .request(reqwest::Method::GET, path)
            .await?
            .send()
            .await
            .map_err(|e| HubError::transport(format!("GET {path} failed"), e))?;
        read_body(path, resp).await
    }

    pub async fn post(&self, path: &str, payload: &Value) -> Result<String> {
        let resp = self
            .request(reqwest::Method::POST, path)
            .await?
            .json(payload)
            .send()
            .await
            .map_err(|e| HubError::transport(format!("POST {path} failed"), e))?;
        read_body(path, resp).await
    }

    /// GET that hands back the live response so large bodies can be streamed.
    /// The status has already been checked.
    pub async fn get_response(&self, path: &str) -> Result<reqwest::Response> {
        let resp = self
            .request(reqwest::Method::GET, path)
            .await?
            .send()
            .await
            .map_err(|e| HubError::transport(format!("GET {path} failed"), e))?;
        let status = resp.status().as_u16();
        if status != 200 {
            let body = resp
                .bytes()
                .await
                .map_err(|e| HubError::transport(format!("failed to read response from {path}"), e))?;
            warn!(path, status, body = %String::from_utf8_lossy(&body), "Hub request failed");
            return Err(HubError::http(status, body.to_vec()));
        }
        Ok(resp)
    }
}

async fn read_body(path: &str, resp: reqwest::Response) -> Result<String> {
    let status = resp.status().as_u16();
    let body = resp
        .bytes()
        .await
        .map_err(|e| HubError::transport(format!("failed to read response from {path}"), e))?;

    if status != 200 {
        warn!(path, status, body = %String::from_utf8_lossy(&body), "Hub request failed");
        return Err(HubError::http(status, body.to_vec()));
    }
    debug!(path, bytes = body.len(), "Hub request succeeded");
    Ok(String::from_utf8_lossy(&body).into_owned())
}
