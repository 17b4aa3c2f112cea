//! Environment-derived configuration.
//!
//! The auth variant is a deployment decision: `AUTH_FLOW=oauth` (default)
//! drives the browser OAuth code flow, `AUTH_FLOW=system_token` drives the
//! one-shot system-user-token bootstrap.

use std::time::Duration;

use crate::error::GramError;
use crate::exchange::AuthFlow;

pub const DEFAULT_GRAPH_BASE: &str = "https://graph.facebook.com/v19.0";
pub const DEFAULT_AUTHORIZE_URL: &str = "https://www.instagram.com/oauth/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://api.instagram.com/oauth/access_token";
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    pub flow: AuthFlow,
    pub graph_base: String,
    pub oauth_authorize_url: String,
    pub oauth_token_url: String,
    pub frontend_url: String,
    pub upstream_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, GramError> {
        Self::build(|name| std::env::var(name).ok())
    }

    fn build(get: impl Fn(&str) -> Option<String>) -> Result<Self, GramError> {
        let var = |name: &str| -> Option<String> {
            get(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |name: &str| -> Result<String, GramError> {
            var(name).ok_or_else(|| GramError::Config(format!("{} is not set", name)))
        };

        let mode = var("AUTH_FLOW").unwrap_or_else(|| "oauth".to_string());
        let flow = match mode.as_str() {
            "oauth" => AuthFlow::OAuthCodeFlow {
                app_id: require("INSTAGRAM_APP_ID")?,
                app_secret: require("INSTAGRAM_APP_SECRET")?,
                redirect_uri: require("INSTAGRAM_REDIRECT_URI")?,
            },
            "system_token" => AuthFlow::SystemTokenBootstrap {
                system_token: require("SYSTEM_USER_TOKEN")?,
                page_id: require("PAGE_ID")?,
            },
            other => {
                return Err(GramError::Config(format!(
                    "unknown AUTH_FLOW '{}' (expected 'oauth' or 'system_token')",
                    other
                )))
            }
        };

        let timeout_secs = match var("UPSTREAM_TIMEOUT_SECS") {
            Some(raw) => raw.parse::<u64>().map_err(|_| {
                GramError::Config(format!("UPSTREAM_TIMEOUT_SECS '{}' is not a number", raw))
            })?,
            None => DEFAULT_UPSTREAM_TIMEOUT_SECS,
        };

        Ok(Self {
            flow,
            graph_base: var("GRAPH_API_BASE").unwrap_or_else(|| DEFAULT_GRAPH_BASE.to_string()),
            oauth_authorize_url: var("OAUTH_AUTHORIZE_URL")
                .unwrap_or_else(|| DEFAULT_AUTHORIZE_URL.to_string()),
            oauth_token_url: var("OAUTH_TOKEN_URL")
                .unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string()),
            frontend_url: require("FRONTEND_URL")?,
            upstream_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn build_from(map: &HashMap<String, String>) -> Result<Config, GramError> {
        Config::build(|name| map.get(name).cloned())
    }

    #[test]
    fn oauth_flow_is_the_default() {
        let map = env(&[
            ("INSTAGRAM_APP_ID", "app"),
            ("INSTAGRAM_APP_SECRET", "secret"),
            ("INSTAGRAM_REDIRECT_URI", "https://localhost:8443/auth/instagram/callback"),
            ("FRONTEND_URL", "https://localhost:5173"),
        ]);
        let config = build_from(&map).unwrap();
        assert!(matches!(config.flow, AuthFlow::OAuthCodeFlow { .. }));
        assert_eq!(config.graph_base, DEFAULT_GRAPH_BASE);
        assert_eq!(
            config.upstream_timeout,
            Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECS)
        );
    }

    #[test]
    fn system_token_flow_requires_page_id() {
        let map = env(&[
            ("AUTH_FLOW", "system_token"),
            ("SYSTEM_USER_TOKEN", "T1"),
            ("FRONTEND_URL", "https://localhost:5173"),
        ]);
        let err = build_from(&map).unwrap_err();
        assert!(matches!(err, GramError::Config(_)));
        assert!(err.to_string().contains("PAGE_ID"));
    }

    #[test]
    fn rejects_unknown_flow() {
        let map = env(&[
            ("AUTH_FLOW", "implicit"),
            ("FRONTEND_URL", "https://localhost:5173"),
        ]);
        assert!(build_from(&map).is_err());
    }

    #[test]
    fn blank_values_count_as_unset() {
        let map = env(&[
            ("AUTH_FLOW", "system_token"),
            ("SYSTEM_USER_TOKEN", "  "),
            ("PAGE_ID", "P1"),
            ("FRONTEND_URL", "https://localhost:5173"),
        ]);
        let err = build_from(&map).unwrap_err();
        assert!(err.to_string().contains("SYSTEM_USER_TOKEN"));
    }
}
