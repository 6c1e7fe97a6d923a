/*
[INPUT]:  Operator username/password and HTTP client
[OUTPUT]: Authenticated session tokens stored in the client's TokenStore
[POS]:    Auth layer - login flow against the engine
[UPDATE]: When auth endpoints or flow steps change
*/

use reqwest::Method;
use tracing::info;

use crate::http::client::{check_status, decode_json};
use crate::http::{EngineClient, Result};
use crate::types::{LoginRequest, TokenResponse};

impl EngineClient {
    /// Authenticate and store the returned token pair
    ///
    /// POST /api/v1/auth/login
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenResponse> {
        let body = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };

        let response = self
            .anonymous_request(Method::POST, "auth/login")?
            .json(&body)
            .send()
            .await?;
        let tokens: TokenResponse = decode_json(check_status(response).await?).await?;

        self.tokens().store(&tokens);
        info!(username, expires_in = tokens.expires_in, "logged in to execution engine");
        Ok(tokens)
    }
}
