//! PKCE (Proof Key for Code Exchange) per RFC 7636
//!
//! The verifier is generated per authorization request and handed back to
//! the caller, who must keep it until the redirect returns and pass it to
//! the code exchange. Nothing here stores it.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngExt;
use sha2::{Digest, Sha256};

/// Random bytes behind each verifier. 32 bytes encode to 43 base64url
/// characters, the minimum length RFC 7636 allows.
const VERIFIER_BYTES: usize = 32;

/// A verifier and its S256 challenge.
#[derive(Debug, Clone)]
pub struct PkcePair {
    pub code_verifier: String,
    pub code_challenge: String,
}

impl PkcePair {
    pub fn generate() -> Self {
        let code_verifier = generate_verifier();
        let code_challenge = compute_challenge(&code_verifier);
        Self {
            code_verifier,
            code_challenge,
        }
    }
}

/// Generate a cryptographically random code verifier (URL-safe base64, no padding).
pub fn generate_verifier() -> String {
    let mut bytes = [0u8; VERIFIER_BYTES];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// `challenge = BASE64URL(SHA256(verifier))`
pub fn compute_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Random opaque `state` value for CSRF protection.
pub fn generate_state() -> String {
    let mut bytes = [0u8; 16];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
