//! Client registration settings
//!
//! `ClientConfig` is immutable once built. Whether a client secret is present
//! decides the client type: confidential clients authenticate to the token
//! and revoke endpoints with HTTP Basic; public clients rely on PKCE and
//! cannot refresh or revoke.

use common::Secret;

use crate::constants::DEFAULT_BASE_URL;
use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct ClientConfig {
    client_id: String,
    client_secret: Option<Secret<String>>,
    redirect_uri: String,
    base_url: String,
}

impl ClientConfig {
    /// Validate and normalize client settings.
    ///
    /// `base_url` falls back to [`DEFAULT_BASE_URL`] when absent or blank and
    /// loses its trailing slash. An empty secret counts as no secret.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: Option<String>,
        redirect_uri: impl Into<String>,
        base_url: Option<String>,
    ) -> Result<Self> {
        let client_id = client_id.into();
        let redirect_uri = redirect_uri.into();

        if client_id.trim().is_empty() {
            return Err(Error::Config("client_id is required".into()));
        }
        if redirect_uri.trim().is_empty() {
            return Err(Error::Config("redirect_uri is required".into()));
        }

        let base_url = match base_url {
            Some(url) if !url.trim().is_empty() => url.trim().to_owned(),
            _ => DEFAULT_BASE_URL.to_owned(),
        };
        let base_url = base_url.strip_suffix('/').unwrap_or(&base_url).to_owned();

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(Error::Config(format!(
                "base_url must start with http:// or https://, got: {base_url}"
            )));
        }
        reqwest::Url::parse(&base_url)
            .map_err(|e| Error::Config(format!("invalid base_url {base_url}: {e}")))?;

        Ok(Self {
            client_id,
            client_secret: client_secret.and_then(Secret::non_empty),
            redirect_uri,
            base_url,
        })
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_secret(&self) -> Option<&Secret<String>> {
        self.client_secret.as_ref()
    }

    pub fn has_client_secret(&self) -> bool {
        self.client_secret.is_some()
    }

    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an endpoint path such as `/oauth/token`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_stripped() {
        let config = ClientConfig::new(
            "c1",
            None,
            "https://app/cb",
            Some("https://auth.example/".into()),
        )
        .unwrap();
        assert_eq!(config.base_url(), "https://auth.example");
        assert_eq!(
            config.endpoint("/oauth/token"),
            "https://auth.example/oauth/token"
        );
    }

    #[test]
    fn base_url_defaults_when_missing_or_blank() {
        let config = ClientConfig::new("c1", None, "https://app/cb", None).unwrap();
        assert_eq!(config.base_url(), DEFAULT_BASE_URL);

        let config = ClientConfig::new("c1", None, "https://app/cb", Some("  ".into())).unwrap();
        assert_eq!(config.base_url(), DEFAULT_BASE_URL);
    }

    #[test]
    fn missing_client_id_is_rejected() {
        let err = ClientConfig::new("", None, "https://app/cb", None).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("client_id"));
    }

    #[test]
    fn missing_redirect_uri_is_rejected() {
        let err = ClientConfig::new("c1", None, " ", None).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("redirect_uri"));
    }

    #[test]
    fn non_http_base_url_is_rejected() {
        let err = ClientConfig::new("c1", None, "https://app/cb", Some("ftp://auth".into()))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn empty_secret_means_public_client() {
        let config =
            ClientConfig::new("c1", Some(String::new()), "https://app/cb", None).unwrap();
        assert!(!config.has_client_secret());

        let config = ClientConfig::new("c1", Some("s".into()), "https://app/cb", None).unwrap();
        assert_eq!(config.client_secret().unwrap().expose(), "s");
    }

    #[test]
    fn debug_output_redacts_secret() {
        let config =
            ClientConfig::new("c1", Some("topsecret".into()), "https://app/cb", None).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("topsecret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
