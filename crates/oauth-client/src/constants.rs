//! OAuth endpoint paths and client defaults
//!
//! Endpoint paths are relative to the configured base URL. None of these
//! values are secrets.

/// Base URL used when the configuration does not name one.
pub const DEFAULT_BASE_URL: &str = "http://localhost:4000";

/// Browser authorization endpoint (never fetched by this crate)
pub const AUTHORIZE_PATH: &str = "/oauth/authorize";

/// Token endpoint for authorization_code and refresh_token grants
pub const TOKEN_PATH: &str = "/oauth/token";

/// Bearer-authenticated profile endpoint
pub const USERINFO_PATH: &str = "/oauth/userinfo";

/// Token revocation endpoint
pub const REVOKE_PATH: &str = "/oauth/revoke";

/// Seconds before actual expiry at which a cached token is treated as stale.
/// Covers clock skew and the latency between the cache check and the token
/// reaching the resource server.
pub const EARLY_REFRESH_MARGIN_SECS: u64 = 30;

/// Scopes requested when the caller has no preference.
pub const DEFAULT_SCOPES: &[&str] = &["openid", "profile", "email"];

/// Token type assumed when the token endpoint omits `token_type`.
pub const DEFAULT_TOKEN_TYPE: &str = "Bearer";
