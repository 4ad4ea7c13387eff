//! Configuration types and loading
//!
//! Config precedence: CLI args > env vars > config file > defaults.
//! The client secret is loaded from the OAUTH_CLIENT_SECRET env var or
//! client_secret_file, never stored in the TOML directly to avoid leaking it.

use common::Secret;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    pub oauth: OAuthSettings,
}

/// Client registration at the authorization server
#[derive(Debug, Deserialize)]
pub struct OAuthSettings {
    pub client_id: String,
    pub redirect_uri: String,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(skip)]
    pub client_secret: Option<Secret<String>>,
    /// Path to a file containing the client secret (alternative to OAUTH_CLIENT_SECRET)
    #[serde(default)]
    pub client_secret_file: Option<PathBuf>,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    30
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment variables.
    ///
    /// Client secret resolution order:
    /// 1. OAUTH_CLIENT_SECRET env var
    /// 2. client_secret_file path from config
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;

        if config.oauth.client_id.trim().is_empty() {
            return Err(common::Error::Config("client_id must not be empty".into()));
        }
        if config.oauth.redirect_uri.trim().is_empty() {
            return Err(common::Error::Config(
                "redirect_uri must not be empty".into(),
            ));
        }
        if config.oauth.timeout_secs == 0 {
            return Err(common::Error::Config(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        if let Ok(secret) = std::env::var("OAUTH_CLIENT_SECRET") {
            config.oauth.client_secret = Secret::non_empty(secret);
        } else if let Some(ref secret_file) = config.oauth.client_secret_file {
            let secret = std::fs::read_to_string(secret_file).map_err(|e| {
                common::Error::Config(format!(
                    "failed to read client_secret_file {}: {e}",
                    secret_file.display()
                ))
            })?;
            config.oauth.client_secret = Secret::non_empty(secret);
        }

        Ok(config)
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("oauth-helper.toml")
    }

    /// Build the library's validated client configuration.
    pub fn client_config(&self) -> oauth_client::Result<oauth_client::ClientConfig> {
        oauth_client::ClientConfig::new(
            self.oauth.client_id.clone(),
            self.oauth
                .client_secret
                .as_ref()
                .map(|s| s.expose().clone()),
            self.oauth.redirect_uri.clone(),
            self.oauth.base_url.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Serializes tests that touch process environment variables.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// SAFETY: Callers must hold ENV_MUTEX to prevent concurrent env mutation.
    unsafe fn set_env(key: &str, val: &str) {
        unsafe { std::env::set_var(key, val) };
    }

    unsafe fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) };
    }

    fn write_config(dir: &tempfile::TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("oauth-helper.toml");
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn valid_toml() -> &'static str {
        r#"
[oauth]
client_id = "c1"
redirect_uri = "https://app/cb"
base_url = "https://auth.example/"
"#
    }

    #[test]
    fn test_load_valid_config() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { remove_env("OAUTH_CLIENT_SECRET") };
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, valid_toml());

        let config = Config::load(&path).unwrap();
        assert_eq!(config.oauth.client_id, "c1");
        assert_eq!(config.oauth.redirect_uri, "https://app/cb");
        assert_eq!(config.oauth.timeout_secs, 30);
        assert!(config.oauth.client_secret.is_none());

        let client = config.client_config().unwrap();
        assert_eq!(client.base_url(), "https://auth.example");
        assert!(!client.has_client_secret());
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load(Path::new("/nonexistent/path/oauth-helper.toml"));
        assert!(matches!(result, Err(common::Error::Io(_))));
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "not valid {{{{ toml");
        assert!(matches!(Config::load(&path), Err(common::Error::Toml(_))));
    }

    #[test]
    fn test_missing_client_id_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "[oauth]\nredirect_uri = \"https://app/cb\"\n");
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_empty_client_id_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            "[oauth]\nclient_id = \"\"\nredirect_uri = \"https://app/cb\"\n",
        );
        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("client_id"), "got: {err}");
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            "[oauth]\nclient_id = \"c1\"\nredirect_uri = \"https://app/cb\"\ntimeout_secs = 0\n",
        );
        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("timeout_secs"), "got: {err}");
    }

    #[test]
    fn test_secret_from_env_takes_precedence() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let secret_path = dir.path().join("secret");
        std::fs::write(&secret_path, "from-file\n").unwrap();
        let path = write_config(
            &dir,
            &format!(
                "{}client_secret_file = {:?}\n",
                valid_toml(),
                secret_path.display().to_string()
            ),
        );

        unsafe { set_env("OAUTH_CLIENT_SECRET", "from-env") };
        let config = Config::load(&path).unwrap();
        unsafe { remove_env("OAUTH_CLIENT_SECRET") };

        assert_eq!(config.oauth.client_secret.unwrap().expose(), "from-env");
    }

    #[test]
    fn test_secret_from_file_is_trimmed() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { remove_env("OAUTH_CLIENT_SECRET") };
        let dir = tempfile::tempdir().unwrap();
        let secret_path = dir.path().join("secret");
        std::fs::write(&secret_path, "  from-file\n").unwrap();
        let path = write_config(
            &dir,
            &format!(
                "{}client_secret_file = {:?}\n",
                valid_toml(),
                secret_path.display().to_string()
            ),
        );

        let config = Config::load(&path).unwrap();
        assert_eq!(config.oauth.client_secret.as_ref().unwrap().expose(), "from-file");
        assert!(config.client_config().unwrap().has_client_secret());
    }

    #[test]
    fn test_unreadable_secret_file_is_config_error() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { remove_env("OAUTH_CLIENT_SECRET") };
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            &format!("{}client_secret_file = \"/nonexistent/secret\"\n", valid_toml()),
        );

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, common::Error::Config(_)));
        assert!(err.to_string().contains("client_secret_file"));
    }

    #[test]
    fn test_resolve_path_prefers_cli() {
        assert_eq!(
            Config::resolve_path(Some("/etc/oauth.toml")),
            PathBuf::from("/etc/oauth.toml")
        );
    }

    #[test]
    fn test_resolve_path_env_var() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { set_env("CONFIG_PATH", "/srv/oauth/helper.toml") };
        let from_env = Config::resolve_path(None);
        let from_cli = Config::resolve_path(Some("/etc/oauth.toml"));
        unsafe { remove_env("CONFIG_PATH") };

        assert_eq!(from_env, PathBuf::from("/srv/oauth/helper.toml"));
        assert_eq!(from_cli, PathBuf::from("/etc/oauth.toml"));
    }

    #[test]
    fn test_resolve_path_default() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { remove_env("CONFIG_PATH") };
        assert_eq!(Config::resolve_path(None), PathBuf::from("oauth-helper.toml"));
    }
}
