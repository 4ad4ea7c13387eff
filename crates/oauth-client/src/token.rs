//! Token endpoint and userinfo payloads
//!
//! `TokenRecord` is deserialized straight from the token endpoint response
//! for both the authorization_code and refresh_token grants. `expires_in` is
//! a delta in seconds; the absolute expiry is anchored on `issued_at`, which
//! only the cache assigns.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::constants::DEFAULT_TOKEN_TYPE;

/// One OAuth token grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_type", deserialize_with = "token_type_or_default")]
    pub token_type: String,
    /// Seconds until the access token expires, counted from `issued_at`
    #[serde(default)]
    pub expires_in: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// Local receipt time (unix seconds), assigned by `TokenCache::set`.
    /// Server-sent `issued_at`/`created_at` values are never read.
    #[serde(default, skip_deserializing)]
    pub issued_at: u64,
}

fn default_token_type() -> String {
    DEFAULT_TOKEN_TYPE.to_string()
}

/// `null` and `""` fall back to the default like an absent field does.
fn token_type_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?
        .filter(|t| !t.is_empty())
        .unwrap_or_else(default_token_type))
}

impl TokenRecord {
    /// Minimal bearer record, mostly useful in tests and examples.
    pub fn bearer(access_token: impl Into<String>, expires_in: u64) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            token_type: default_token_type(),
            expires_in,
            scope: None,
            issued_at: 0,
        }
    }

    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    /// Unix second from which the record is treated as expired.
    pub fn expiry_boundary(&self, margin_secs: u64) -> u64 {
        self.issued_at
            .saturating_add(self.expires_in)
            .saturating_sub(margin_secs)
    }

    /// Usable refresh token, if the server issued a non-empty one.
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref().filter(|t| !t.is_empty())
    }
}

/// Profile returned by the userinfo endpoint.
///
/// `id` comes from the `id` claim, else the OIDC `sub` claim; numeric ids
/// are kept as their decimal string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawUserInfo")]
pub struct UserInfo {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    /// Provider-specific claims
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Deserialize)]
struct RawUserInfo {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    sub: Option<Value>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl From<RawUserInfo> for UserInfo {
    fn from(raw: RawUserInfo) -> Self {
        let mut extra = raw.extra;
        let id = match (raw.id.as_ref().and_then(claim_to_string), raw.sub) {
            (Some(id), sub) => {
                // Keep `sub` visible when `id` wins
                if let Some(sub) = sub {
                    extra.insert("sub".into(), sub);
                }
                id
            }
            (None, sub) => sub.as_ref().and_then(claim_to_string).unwrap_or_default(),
        };
        Self {
            id,
            email: raw.email,
            name: raw.name,
            picture: raw.picture,
            extra,
        }
    }
}

fn claim_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Current wall-clock time in unix seconds.
pub fn now_unix_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
