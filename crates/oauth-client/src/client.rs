//! OAuth flow controller
//!
//! `OAuthClient` drives one logical token through its lifecycle:
//!
//! ```text
//! NoToken → Cached (fresh) → NearExpiry → Refreshing → Cached (fresh)
//!                                                   ↘ NoToken (refresh failed)
//! any state --revoke--> NoToken
//! ```
//!
//! Network calls happen only when the cache cannot answer. Refresh is lazy:
//! there is no timer, the next operation that needs a token triggers it.
//! Concurrent callers of `refresh_if_needed` that both see a stale cache will
//! both refresh; there is no single-flight guard.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::cache::TokenCache;
use crate::config::ClientConfig;
use crate::constants::{AUTHORIZE_PATH, REVOKE_PATH, TOKEN_PATH, USERINFO_PATH};
use crate::error::{
    Error, REFRESH_FAILED, REVOKE_FAILED, Result, TOKEN_EXCHANGE_FAILED, USERINFO_FETCH_FAILED,
};
use crate::metrics;
use crate::pkce::PkcePair;
use crate::response::interpret;
use crate::token::{TokenRecord, UserInfo, now_unix_secs};
use crate::transport::{HttpRequest, HttpTransport};

const GRANT_AUTHORIZATION_CODE: &str = "authorization_code";
const GRANT_REFRESH_TOKEN: &str = "refresh_token";

/// Authorization URL plus the PKCE verifier the caller must keep until the
/// redirect returns. `code_verifier` is `None` unless PKCE was requested.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub url: String,
    pub code_verifier: Option<String>,
}

/// Client for a single authorization server and a single cached token.
pub struct OAuthClient {
    config: ClientConfig,
    cache: Arc<TokenCache>,
    transport: Arc<dyn HttpTransport>,
}

impl std::fmt::Debug for OAuthClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthClient")
            .field("config", &self.config)
            .field("has_token", &!self.cache.is_empty())
            .finish_non_exhaustive()
    }
}

impl OAuthClient {
    /// Create a client with its own empty token cache.
    pub fn new(config: ClientConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self::with_cache(config, transport, Arc::new(TokenCache::new()))
    }

    /// Create a client around an existing cache.
    pub fn with_cache(
        config: ClientConfig,
        transport: Arc<dyn HttpTransport>,
        cache: Arc<TokenCache>,
    ) -> Self {
        Self {
            config,
            cache,
            transport,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<TokenCache> {
        &self.cache
    }

    /// Fresh cached token, without touching the network.
    pub fn cached_token(&self) -> Option<TokenRecord> {
        self.cache.get()
    }

    /// Forget the cached token locally (no server call).
    pub fn clear_tokens(&self) {
        self.cache.clear();
    }

    /// Build the browser authorization URL.
    ///
    /// Query parameters are `client_id`, `redirect_uri`, `response_type=code`,
    /// the space-joined `scope` and `state`, plus `code_challenge` and
    /// `code_challenge_method=S256` when `use_pkce` is set.
    pub fn build_authorization_url<S: AsRef<str>>(
        &self,
        scopes: &[S],
        state: &str,
        use_pkce: bool,
    ) -> Result<AuthorizationRequest> {
        let scope = scopes
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(" ");

        let mut params: Vec<(&str, String)> = vec![
            ("client_id", self.config.client_id().to_owned()),
            ("redirect_uri", self.config.redirect_uri().to_owned()),
            ("response_type", "code".to_owned()),
            ("scope", scope),
            ("state", state.to_owned()),
        ];

        let pkce = use_pkce.then(PkcePair::generate);
        if let Some(pair) = &pkce {
            params.push(("code_challenge", pair.code_challenge.clone()));
            params.push(("code_challenge_method", "S256".to_owned()));
        }

        let endpoint = self.config.endpoint(AUTHORIZE_PATH);
        let url = reqwest::Url::parse_with_params(&endpoint, &params)
            .map_err(|e| Error::Config(format!("invalid authorization endpoint {endpoint}: {e}")))?;

        Ok(AuthorizationRequest {
            url: url.to_string(),
            code_verifier: pkce.map(|pair| pair.code_verifier),
        })
    }

    /// Exchange an authorization code for tokens and cache the result.
    ///
    /// Confidential clients authenticate with HTTP Basic. Public clients send
    /// `client_id` and, when given, the PKCE `code_verifier`.
    pub async fn exchange_code(
        &self,
        code: &str,
        code_verifier: Option<&str>,
    ) -> Result<TokenRecord> {
        if code.trim().is_empty() {
            return Err(Error::InvalidRequest(
                "authorization code is required".into(),
            ));
        }

        let mut request = HttpRequest::post_form(self.config.endpoint(TOKEN_PATH))
            .field("grant_type", GRANT_AUTHORIZATION_CODE)
            .field("code", code)
            .field("redirect_uri", self.config.redirect_uri());

        match self.basic_auth() {
            Some(credentials) => request = request.header("Authorization", credentials),
            None => {
                request = request.field("client_id", self.config.client_id());
                if let Some(verifier) = code_verifier.filter(|v| !v.is_empty()) {
                    request = request.field("code_verifier", verifier);
                }
            }
        }

        let result = self.request_token(request, TOKEN_EXCHANGE_FAILED).await;
        metrics::record_token_request(GRANT_AUTHORIZATION_CODE, result.is_ok());

        let record = self.store(result?);
        info!(
            expires_in = record.expires_in,
            has_refresh_token = record.refresh_token().is_some(),
            "authorization code exchanged"
        );
        Ok(record)
    }

    /// Return a usable token, refreshing only when the cached one is stale.
    ///
    /// `None` means the caller has to run the authorization flow again: no
    /// token was ever obtained, there is no refresh token, no client secret
    /// is configured, or the refresh itself failed. Refresh failures are
    /// logged, never returned.
    pub async fn refresh_if_needed(&self) -> Option<TokenRecord> {
        if let Some(record) = self.cache.get() {
            metrics::record_cache_lookup(true);
            return Some(record);
        }
        metrics::record_cache_lookup(false);

        let Some(refresh_token) = self
            .cache
            .peek_raw()
            .and_then(|record| record.refresh_token().map(str::to_owned))
        else {
            debug!("no refresh token available, re-authorization required");
            return None;
        };

        let Some(credentials) = self.basic_auth() else {
            debug!("refresh requires a client secret, re-authorization required");
            return None;
        };

        let request = HttpRequest::post_form(self.config.endpoint(TOKEN_PATH))
            .header("Authorization", credentials)
            .field("grant_type", GRANT_REFRESH_TOKEN)
            .field("refresh_token", refresh_token);

        let result = self.request_token(request, REFRESH_FAILED).await;
        metrics::record_token_request(GRANT_REFRESH_TOKEN, result.is_ok());

        match result {
            Ok(record) => {
                let record = self.store(record);
                info!(expires_in = record.expires_in, "access token refreshed");
                Some(record)
            }
            Err(e) => {
                warn!(kind = e.kind(), error = %e, "token refresh failed, re-authorization required");
                None
            }
        }
    }

    /// Fetch the user's profile.
    ///
    /// Without an explicit (non-empty) access token, one is obtained through
    /// [`refresh_if_needed`](Self::refresh_if_needed).
    pub async fn get_user_info(&self, access_token: Option<&str>) -> Result<UserInfo> {
        let token = match access_token.filter(|t| !t.is_empty()) {
            Some(token) => token.to_owned(),
            None => self
                .refresh_if_needed()
                .await
                .map(|record| record.access_token)
                .ok_or_else(|| {
                    Error::MissingToken(
                        "no access token available, run the authorization flow".into(),
                    )
                })?,
        };

        let request = HttpRequest::get(self.config.endpoint(USERINFO_PATH))
            .header("Authorization", format!("Bearer {token}"));

        let result = self
            .send(request, USERINFO_FETCH_FAILED)
            .await
            .and_then(|payload| {
                serde_json::from_value::<UserInfo>(payload).map_err(|e| {
                    Error::oauth(USERINFO_FETCH_FAILED, format!("invalid userinfo response: {e}"))
                })
            });
        metrics::record_userinfo(result.is_ok());
        result
    }

    /// Revoke `token` at the server and drop the local cache.
    ///
    /// The cache is cleared once the request has been attempted, whatever
    /// the server answered. `Ok` only when the server confirmed.
    pub async fn revoke_token(&self, token: &str) -> Result<()> {
        if token.is_empty() {
            return Err(Error::InvalidRequest("token to revoke is required".into()));
        }
        let Some(credentials) = self.basic_auth() else {
            return Err(Error::UnauthorizedClient(
                "token revocation requires a client secret".into(),
            ));
        };

        let request = HttpRequest::post_form(self.config.endpoint(REVOKE_PATH))
            .header("Authorization", credentials)
            .field("token", token);

        let result = self.send(request, REVOKE_FAILED).await.map(|_| ());
        self.cache.clear();
        metrics::record_revocation(result.is_ok());

        match &result {
            Ok(()) => info!("token revoked"),
            Err(e) => warn!(kind = e.kind(), error = %e, "token revocation failed, local token dropped"),
        }
        result
    }

    /// `Basic base64(client_id:client_secret)`, if a secret is configured.
    fn basic_auth(&self) -> Option<String> {
        let secret = self.config.client_secret()?;
        let raw = format!("{}:{}", self.config.client_id(), secret.expose());
        Some(format!("Basic {}", STANDARD.encode(raw)))
    }

    async fn send(&self, request: HttpRequest, default_kind: &str) -> Result<Value> {
        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| e.with_default_kind(default_kind))?;
        interpret(&response, default_kind)
    }

    async fn request_token(&self, request: HttpRequest, default_kind: &str) -> Result<TokenRecord> {
        let payload = self.send(request, default_kind).await?;
        let record: TokenRecord = serde_json::from_value(payload)
            .map_err(|e| Error::oauth(default_kind, format!("invalid token response: {e}")))?;
        if record.access_token.is_empty() {
            return Err(Error::oauth(
                default_kind,
                "token response has an empty access_token",
            ));
        }
        Ok(record)
    }

    /// Cache `record` stamped with the current time and return the stamped copy.
    fn store(&self, mut record: TokenRecord) -> TokenRecord {
        let now = now_unix_secs();
        record.issued_at = now;
        self.cache.set_at(record.clone(), now);
        record
    }
}
