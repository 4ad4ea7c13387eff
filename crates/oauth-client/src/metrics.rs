//! Token lifecycle counters
//!
//! Emitted through the `metrics` facade; silent no-ops until the embedding
//! binary installs a recorder.
//!
//! - `oauth_token_requests_total` (counter): labels `grant`, `outcome`
//! - `oauth_token_cache_total` (counter): label `result` (`hit` | `miss`)
//! - `oauth_userinfo_requests_total` (counter): label `outcome`
//! - `oauth_revocations_total` (counter): label `outcome`

fn outcome(success: bool) -> &'static str {
    if success { "success" } else { "failure" }
}

/// Record a token endpoint call for `grant` (`authorization_code` or `refresh_token`).
pub fn record_token_request(grant: &'static str, success: bool) {
    metrics::counter!("oauth_token_requests_total", "grant" => grant, "outcome" => outcome(success))
        .increment(1);
}

/// Record whether `refresh_if_needed` was served from the cache.
pub fn record_cache_lookup(hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    metrics::counter!("oauth_token_cache_total", "result" => result).increment(1);
}

pub fn record_userinfo(success: bool) {
    metrics::counter!("oauth_userinfo_requests_total", "outcome" => outcome(success))
        .increment(1);
}

pub fn record_revocation(success: bool) {
    metrics::counter!("oauth_revocations_total", "outcome" => outcome(success)).increment(1);
}
