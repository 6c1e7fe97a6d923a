/*
[INPUT]:  Access/refresh token pairs and expiration hints
[OUTPUT]: Token retrieval and expiration status
[POS]:    Auth layer - session token lifecycle management
[UPDATE]: When adding token persistence or changing refresh strategy
*/

use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::types::TokenResponse;

// Upper bound on honoured expiry hints; keeps the timestamp arithmetic in range.
const MAX_TOKEN_LIFETIME_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Stored token data with metadata
#[derive(Debug, Clone, PartialEq)]
pub struct TokenData {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub username: Option<String>,
}

/// Thread-safe session token store shared between clients.
///
/// Cloning shares the same underlying slot.
#[derive(Debug, Clone, Default)]
pub struct TokenStore {
    data: Arc<RwLock<Option<TokenData>>>,
}

impl TokenStore {
    /// Create a new empty token store
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a bare access token (e.g. from configuration) with no refresh capability
    pub fn set_access_token(&self, access_token: impl Into<String>) {
        *self.write() = Some(TokenData {
            access_token: access_token.into(),
            refresh_token: None,
            expires_at: None,
            username: None,
        });
    }

    /// Store an access/refresh pair
    pub fn set_tokens(
        &self,
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        expires_in_seconds: Option<u64>,
    ) {
        let expires_at = expires_in_seconds
            .map(|seconds| Utc::now() + Duration::seconds(seconds.min(MAX_TOKEN_LIFETIME_SECS) as i64));
        let username = self.read().as_ref().and_then(|data| data.username.clone());
        *self.write() = Some(TokenData {
            access_token: access_token.into(),
            refresh_token,
            expires_at,
            username,
        });
    }

    /// Store the pair returned by a login or refresh call
    pub fn store(&self, response: &TokenResponse) {
        self.set_tokens(
            response.access_token.clone(),
            Some(response.refresh_token.clone()),
            Some(response.expires_in),
        );
        if let Some(user) = &response.user {
            if let Some(data) = self.write().as_mut() {
                data.username = Some(user.username.clone());
            }
        }
    }

    /// Get the current access token if available
    pub fn access_token(&self) -> Option<String> {
        self.read().as_ref().map(|data| data.access_token.clone())
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.read()
            .as_ref()
            .and_then(|data| data.refresh_token.clone())
    }

    /// Check if the access token is known to be expired.
    ///
    /// Tokens without an expiry hint are treated as valid until the engine
    /// rejects them.
    pub fn is_expired(&self) -> bool {
        match self.read().as_ref() {
            Some(data) => data
                .expires_at
                .map(|expires_at| Utc::now() > expires_at)
                .unwrap_or(false),
            None => true,
        }
    }

    /// Get token data if available
    pub fn token_data(&self) -> Option<TokenData> {
        self.read().clone()
    }

    /// Clear the stored tokens
    pub fn clear(&self) {
        *self.write() = None;
    }

    fn read(&self) -> RwLockReadGuard<'_, Option<TokenData>> {
        self.data.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<TokenData>> {
        self.data.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UserSummary;

    #[test]
    fn test_new_store_is_empty() {
        let store = TokenStore::new();
        assert!(store.access_token().is_none());
        assert!(store.is_expired());
    }

    #[test]
    fn test_store_login_response() {
        let store = TokenStore::new();
        store.store(&TokenResponse {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            token_type: "bearer".to_string(),
            expires_in: 1800,
            user: Some(UserSummary {
                id: 1,
                username: "auditor".to_string(),
                role: Some("user".to_string()),
            }),
        });

        assert_eq!(store.access_token(), Some("access".to_string()));
        assert_eq!(store.refresh_token(), Some("refresh".to_string()));
        assert!(!store.is_expired());
        assert_eq!(
            store.token_data().and_then(|data| data.username),
            Some("auditor".to_string())
        );
    }

    #[test]
    fn test_clones_share_state() {
        let store = TokenStore::new();
        let shared = store.clone();
        store.set_access_token("static-token");
        assert_eq!(shared.access_token(), Some("static-token".to_string()));
        assert!(!shared.is_expired());

        shared.clear();
        assert!(store.access_token().is_none());
    }
}
