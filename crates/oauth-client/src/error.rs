//! Error taxonomy for OAuth client operations
//!
//! Every failure carries a wire-style kind (`invalid_request`,
//! `token_exchange_failed`, ...) plus a human-readable description. Kinds
//! reported by the authorization server in its `error` field are passed
//! through verbatim via [`Error::OAuth`].

/// Kind used when a token endpoint exchange fails without a server error code.
pub const TOKEN_EXCHANGE_FAILED: &str = "token_exchange_failed";
/// Kind used when a refresh grant fails without a server error code.
pub const REFRESH_FAILED: &str = "refresh_failed";
/// Kind used when the userinfo endpoint fails without a server error code.
pub const USERINFO_FETCH_FAILED: &str = "userinfo_fetch_failed";
/// Kind used when revocation fails without a server error code.
pub const REVOKE_FAILED: &str = "revoke_failed";

/// Errors from OAuth client operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Client configuration rejected at construction
    #[error("configuration error: {0}")]
    Config(String),

    /// A required call argument was missing or empty
    #[error("invalid_request: {0}")]
    InvalidRequest(String),

    /// No usable access token is available
    #[error("missing_token: {0}")]
    MissingToken(String),

    /// The operation needs a client secret that is not configured
    #[error("unauthorized_client: {0}")]
    UnauthorizedClient(String),

    /// The transport could not complete the request
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Protocol failure, either from the server's `error` field or the
    /// operation's default kind
    #[error("{kind}: {description}")]
    OAuth { kind: String, description: String },
}

impl Error {
    pub fn oauth(kind: impl Into<String>, description: impl Into<String>) -> Self {
        Error::OAuth {
            kind: kind.into(),
            description: description.into(),
        }
    }

    /// Wire-style kind of this error.
    pub fn kind(&self) -> &str {
        match self {
            Error::Config(_) => "configuration_error",
            Error::InvalidRequest(_) => "invalid_request",
            Error::MissingToken(_) => "missing_token",
            Error::UnauthorizedClient(_) => "unauthorized_client",
            Error::Http(_) => "http_error",
            Error::OAuth { kind, .. } => kind,
        }
    }

    /// Human-readable description without the kind prefix.
    pub fn description(&self) -> &str {
        match self {
            Error::Config(msg)
            | Error::InvalidRequest(msg)
            | Error::MissingToken(msg)
            | Error::UnauthorizedClient(msg)
            | Error::Http(msg) => msg,
            Error::OAuth { description, .. } => description,
        }
    }

    /// Re-label a transport failure with the calling operation's kind.
    /// Errors that already carry a protocol kind are returned unchanged.
    pub(crate) fn with_default_kind(self, kind: &str) -> Self {
        match self {
            Error::Http(msg) => Error::oauth(kind, msg),
            other => other,
        }
    }
}

/// Result alias for OAuth client operations.
pub type Result<T> = std::result::Result<T, Error>;
