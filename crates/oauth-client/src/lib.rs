//! OAuth 2.0 client helper
//!
//! Builds authorization URLs (optionally with PKCE), exchanges authorization
//! codes, refreshes expired tokens, fetches user info, and revokes tokens
//! against a single authorization server. Tokens live only in memory, in a
//! single-slot cache owned by the client.
//!
//! Flow:
//! 1. Caller calls `OAuthClient::build_authorization_url()` and keeps the returned verifier
//! 2. User authorizes in the browser and is redirected back with a code
//! 3. Caller calls `OAuthClient::exchange_code()`; the token is cached
//! 4. `OAuthClient::refresh_if_needed()` serves the cached token until it
//!    nears expiry, then refreshes it with the refresh token
//! 5. `OAuthClient::revoke_token()` revokes at the server and clears the cache
//!
//! All network I/O goes through an injected [`HttpTransport`]; use
//! [`ReqwestTransport`] in production.

pub mod cache;
pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod metrics;
pub mod pkce;
pub mod response;
pub mod token;
pub mod transport;

pub use cache::TokenCache;
pub use client::{AuthorizationRequest, OAuthClient};
pub use config::ClientConfig;
pub use constants::*;
pub use error::{Error, Result};
pub use pkce::{PkcePair, compute_challenge, generate_state, generate_verifier};
pub use response::interpret;
pub use token::{TokenRecord, UserInfo};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, Method, ReqwestTransport};
