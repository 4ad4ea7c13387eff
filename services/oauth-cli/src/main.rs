//! OAuth helper CLI
//!
//! Thin driver over the `oauth-client` library:
//! 1. Loads the client registration from TOML (+ secret from env/file)
//! 2. Prints an authorization URL, optionally with a PKCE verifier
//! 3. Exchanges a code, fetches the user's profile, or revokes a token
//!
//! Tokens only live for the duration of one invocation.

mod config;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use metrics_exporter_prometheus::PrometheusBuilder;
use oauth_client::{DEFAULT_SCOPES, OAuthClient, ReqwestTransport, generate_state};
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

const USAGE: &str = "\
usage: oauth-helper [--config PATH] [--print-metrics] <command>

commands:
  authorize-url [--scope SCOPE]... [--state STATE] [--pkce]
  exchange --code CODE [--verifier VERIFIER]
  userinfo --token ACCESS_TOKEN
  revoke --token TOKEN";

/// Parsed command line
#[derive(Debug, PartialEq, Eq)]
struct Cli {
    config_path: Option<String>,
    print_metrics: bool,
    command: Command,
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    AuthorizeUrl {
        scopes: Vec<String>,
        state: Option<String>,
        pkce: bool,
    },
    Exchange {
        code: String,
        verifier: Option<String>,
    },
    UserInfo {
        token: String,
    },
    Revoke {
        token: String,
    },
}

/// Simple flag parsing; `args` excludes the program name.
fn parse_args(args: &[String]) -> Result<Cli> {
    let mut config_path = None;
    let mut print_metrics = false;
    let mut command_name = None;
    let mut scopes = Vec::new();
    let mut state = None;
    let mut pkce = false;
    let mut code = None;
    let mut verifier = None;
    let mut token = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let mut value = |flag: &str| {
            iter.next()
                .cloned()
                .with_context(|| format!("{flag} requires a value"))
        };
        match arg.as_str() {
            "--config" => config_path = Some(value("--config")?),
            "--print-metrics" => print_metrics = true,
            "--scope" => scopes.push(value("--scope")?),
            "--state" => state = Some(value("--state")?),
            "--pkce" => pkce = true,
            "--code" => code = Some(value("--code")?),
            "--verifier" => verifier = Some(value("--verifier")?),
            "--token" => token = Some(value("--token")?),
            "-h" | "--help" => bail!("{USAGE}"),
            flag if flag.starts_with('-') => bail!("unknown flag {flag}\n\n{USAGE}"),
            name if command_name.is_none() => command_name = Some(name.to_owned()),
            extra => bail!("unexpected argument {extra}\n\n{USAGE}"),
        }
    }

    let command = match command_name.as_deref() {
        Some("authorize-url") => Command::AuthorizeUrl {
            scopes,
            state,
            pkce,
        },
        Some("exchange") => Command::Exchange {
            code: code.context("exchange requires --code")?,
            verifier,
        },
        Some("userinfo") => Command::UserInfo {
            token: token.context("userinfo requires --token")?,
        },
        Some("revoke") => Command::Revoke {
            token: token.context("revoke requires --token")?,
        },
        Some(other) => bail!("unknown command {other}\n\n{USAGE}"),
        None => bail!("missing command\n\n{USAGE}"),
    };

    Ok(Cli {
        config_path,
        print_metrics,
        command,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let cli = parse_args(&args)?;

    let prometheus = if cli.print_metrics {
        Some(
            PrometheusBuilder::new()
                .install_recorder()
                .context("failed to install Prometheus recorder")?,
        )
    } else {
        None
    };

    let config_path = Config::resolve_path(cli.config_path.as_deref());
    info!(path = %config_path.display(), "loading configuration");
    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    let client_config = config
        .client_config()
        .context("invalid OAuth client configuration")?;
    info!(
        client_id = client_config.client_id(),
        base_url = client_config.base_url(),
        confidential = client_config.has_client_secret(),
        "configuration loaded"
    );

    let transport = ReqwestTransport::with_timeout(Duration::from_secs(config.oauth.timeout_secs))
        .context("failed to build HTTP client")?;
    let client = OAuthClient::new(client_config, Arc::new(transport));

    run(&client, cli.command).await?;

    if let Some(handle) = prometheus {
        eprintln!("{}", handle.render());
    }
    Ok(())
}

async fn run(client: &OAuthClient, command: Command) -> Result<()> {
    match command {
        Command::AuthorizeUrl {
            scopes,
            state,
            pkce,
        } => {
            let scopes = if scopes.is_empty() {
                DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect()
            } else {
                scopes
            };
            let state = state.unwrap_or_else(generate_state);
            let request = client.build_authorization_url(scopes.as_slice(), &state, pkce)?;
            print_json(&json!({
                "url": request.url,
                "state": state,
                "code_verifier": request.code_verifier,
            }))
        }
        Command::Exchange { code, verifier } => {
            let token = client
                .exchange_code(&code, verifier.as_deref())
                .await
                .context("code exchange failed")?;
            let user = client
                .get_user_info(None)
                .await
                .context("fetching user info failed")?;
            print_json(&json!({ "token": token, "user": user }))
        }
        Command::UserInfo { token } => {
            let user = client
                .get_user_info(Some(&token))
                .await
                .context("fetching user info failed")?;
            print_json(&json!(user))
        }
        Command::Revoke { token } => {
            client
                .revoke_token(&token)
                .await
                .context("revocation failed")?;
            print_json(&json!({ "revoked": true }))
        }
    }
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_authorize_url_with_repeated_scopes() {
        let cli = parse_args(&args(&[
            "--config",
            "/etc/oauth.toml",
            "authorize-url",
            "--scope",
            "openid",
            "--scope",
            "email",
            "--pkce",
        ]))
        .unwrap();

        assert_eq!(cli.config_path.as_deref(), Some("/etc/oauth.toml"));
        assert!(!cli.print_metrics);
        assert_eq!(
            cli.command,
            Command::AuthorizeUrl {
                scopes: vec!["openid".into(), "email".into()],
                state: None,
                pkce: true,
            }
        );
    }

    #[test]
    fn parses_exchange_with_verifier() {
        let cli = parse_args(&args(&[
            "exchange",
            "--code",
            "abc",
            "--verifier",
            "v",
            "--print-metrics",
        ]))
        .unwrap();
        assert!(cli.print_metrics);
        assert_eq!(
            cli.command,
            Command::Exchange {
                code: "abc".into(),
                verifier: Some("v".into()),
            }
        );
    }

    #[test]
    fn exchange_requires_code() {
        let err = parse_args(&args(&["exchange"])).unwrap_err();
        assert!(err.to_string().contains("--code"));
    }

    #[test]
    fn flag_without_value_is_rejected() {
        let err = parse_args(&args(&["revoke", "--token"])).unwrap_err();
        assert!(err.to_string().contains("--token requires a value"));
    }

    #[test]
    fn unknown_command_and_flags_are_rejected() {
        assert!(parse_args(&args(&["introspect"])).is_err());
        assert!(parse_args(&args(&["revoke", "--token", "t", "--force"])).is_err());
        assert!(parse_args(&args(&[])).is_err());
    }

    #[test]
    fn parses_userinfo_and_revoke() {
        let cli = parse_args(&args(&["userinfo", "--token", "at"])).unwrap();
        assert_eq!(cli.command, Command::UserInfo { token: "at".into() });

        let cli = parse_args(&args(&["revoke", "--token", "rt"])).unwrap();
        assert_eq!(cli.command, Command::Revoke { token: "rt".into() });
    }
}
