/*
[INPUT]:  HTTP configuration (base URL, timeouts) and injected TokenStore
[OUTPUT]: Configured reqwest client with bearer auth and one-shot refresh
[POS]:    HTTP layer - core client implementation
[UPDATE]: When adding connection options or changing client behavior
[UPDATE]: Replay a request once after refreshing an expired access token
*/

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::auth::TokenStore;
use crate::http::{EngineError, Result};
use crate::types::{ErrorBody, RefreshTokenRequest, TokenResponse};

/// Default engine address used when nothing is configured
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
const API_PREFIX: &str = "api/v1/";

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// HTTP client for the execution engine API
#[derive(Debug, Clone)]
pub struct EngineClient {
    http_client: Client,
    api_base_url: Url,
    tokens: TokenStore,
}

impl EngineClient {
    /// Create a new client with default configuration
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_config(ClientConfig::default(), base_url)
    }

    /// Create a new client with custom configuration
    pub fn with_config(config: ClientConfig, base_url: &str) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self {
            http_client,
            api_base_url: api_base_url(base_url)?,
            tokens: TokenStore::new(),
        })
    }

    /// Share a token store with this client (session state owned by the caller)
    pub fn with_tokens(mut self, tokens: TokenStore) -> Self {
        self.tokens = tokens;
        self
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub fn api_base_url(&self) -> &Url {
        &self.api_base_url
    }

    /// Build full URL for an API endpoint such as `tasks/7/stop`
    pub(crate) fn endpoint_url(&self, endpoint: &str) -> Result<Url> {
        Ok(self.api_base_url.join(endpoint.trim_start_matches('/'))?)
    }

    /// Build a request without credentials (login / refresh)
    pub(crate) fn anonymous_request(&self, method: Method, endpoint: &str) -> Result<RequestBuilder> {
        let url = self.endpoint_url(endpoint)?;
        Ok(self.http_client.request(method, url))
    }

    fn authorized_request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.http_client.request(method, url);
        match self.tokens.access_token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send an authenticated request, refreshing the access token once on 401.
    ///
    /// `customize` is applied to every attempt so query strings and bodies are
    /// rebuilt for the replay.
    pub(crate) async fn send<F>(&self, method: Method, endpoint: &str, customize: F) -> Result<Response>
    where
        F: Fn(RequestBuilder) -> RequestBuilder,
    {
        let url = self.endpoint_url(endpoint)?;
        let response = customize(self.authorized_request(method.clone(), url.clone()))
            .send()
            .await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return check_status(response).await;
        }

        debug!(endpoint, "access token rejected; attempting refresh");
        if !self.refresh_tokens().await? {
            self.tokens.clear();
            return Err(EngineError::Unauthorized);
        }

        let replay = customize(self.authorized_request(method, url)).send().await?;
        if replay.status() == StatusCode::UNAUTHORIZED {
            self.tokens.clear();
            return Err(EngineError::Unauthorized);
        }
        check_status(replay).await
    }

    pub(crate) async fn send_json<T, F>(&self, method: Method, endpoint: &str, customize: F) -> Result<T>
    where
        T: DeserializeOwned,
        F: Fn(RequestBuilder) -> RequestBuilder,
    {
        let response = self.send(method, endpoint, customize).await?;
        decode_json(response).await
    }

    /// Exchange the stored refresh token for a new pair.
    ///
    /// Returns `Ok(false)` when there is nothing to refresh with or the engine
    /// refused the refresh token.
    async fn refresh_tokens(&self) -> Result<bool> {
        let Some(refresh_token) = self.tokens.refresh_token() else {
            return Ok(false);
        };

        let body = RefreshTokenRequest { refresh_token };
        let response = self
            .anonymous_request(Method::POST, "auth/refresh")?
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            warn!(status = %response.status(), "token refresh rejected");
            return Ok(false);
        }

        let tokens: TokenResponse = decode_json(response).await?;
        self.tokens.store(&tokens);
        debug!("access token refreshed");
        Ok(true)
    }
}

fn api_base_url(base_url: &str) -> Result<Url> {
    let mut base = Url::parse(base_url)?;
    if base.cannot_be_a_base() {
        return Err(EngineError::Config(format!(
            "engine base URL cannot carry a path: {base_url}"
        )));
    }
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    Ok(base.join(API_PREFIX)?)
}

/// Turn a non-2xx response into an `EngineError` carrying the engine's detail message.
pub(crate) async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|error| error.message())
        .unwrap_or_else(|_| {
            if body.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            } else {
                body
            }
        });
    Err(EngineError::from_status(status, message))
}

pub(crate) async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_base_url_normalization() {
        let plain = api_base_url("http://engine.local:8000").expect("plain");
        assert_eq!(plain.as_str(), "http://engine.local:8000/api/v1/");

        let nested = api_base_url("https://gateway.local/secprobe").expect("nested");
        assert_eq!(nested.as_str(), "https://gateway.local/secprobe/api/v1/");
    }

    #[test]
    fn test_endpoint_url_join() {
        let client = EngineClient::new("http://engine.local:8000/").expect("client");
        let url = client.endpoint_url("/tasks/7/stop").expect("url");
        assert_eq!(url.as_str(), "http://engine.local:8000/api/v1/tasks/7/stop");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            EngineClient::new("not a url"),
            Err(EngineError::UrlParse(_))
        ));
        assert!(matches!(
            EngineClient::new("mailto:ops@example.com"),
            Err(EngineError::Config(_))
        ));
    }
}
