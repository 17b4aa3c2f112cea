//! Token Exchange: converts an authorization artifact into a usable
//! [`Credential`].
//!
//! The two historical flows are alternative strategies behind one contract,
//! selected by configuration rather than duplicated endpoints.

use serde_json::Value;

use crate::config::Config;
use crate::credential::Credential;
use crate::error::GramError;
use crate::graph::UpstreamRequest;
use crate::schema::{self, PageLookup, TokenGrant};

/// Scopes requested from the upstream authorization screen.
pub const OAUTH_SCOPES: &[&str] = &[
    "instagram_business_basic",
    "instagram_business_manage_comments",
    "instagram_business_content_publish",
];

#[derive(Debug, Clone)]
pub enum AuthFlow {
    /// Fixed system-user token; the account id is resolved through the
    /// page -> linked business account lookup.
    SystemTokenBootstrap {
        system_token: String,
        page_id: String,
    },
    /// Browser OAuth: authorization code is exchanged for token + user id.
    OAuthCodeFlow {
        app_id: String,
        app_secret: String,
        redirect_uri: String,
    },
}

/// What the caller brings to an exchange.
#[derive(Debug, Clone)]
pub enum AuthArtifact {
    /// No per-request input; the configured system token drives the exchange.
    Bootstrap,
    /// Authorization code from the OAuth redirect.
    Code(String),
}

pub struct TokenExchange {
    http: reqwest::Client,
    flow: AuthFlow,
    graph_base: String,
    token_url: String,
    authorize_url: String,
}

impl TokenExchange {
    pub fn new(config: &Config) -> Result<Self, GramError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("gramgate/", env!("CARGO_PKG_VERSION")))
            .timeout(config.upstream_timeout)
            .build()?;
        Ok(Self {
            http,
            flow: config.flow.clone(),
            graph_base: config.graph_base.clone(),
            token_url: config.oauth_token_url.clone(),
            authorize_url: config.oauth_authorize_url.clone(),
        })
    }

    pub fn flow(&self) -> &AuthFlow {
        &self.flow
    }

    /// Upstream authorization URL for the browser redirect (OAuth flow only).
    pub fn authorize_url(&self) -> Result<String, GramError> {
        match &self.flow {
            AuthFlow::OAuthCodeFlow {
                app_id,
                redirect_uri,
                ..
            } => Ok(format!(
                "{}?client_id={}&redirect_uri={}&scope={}&response_type=code",
                self.authorize_url,
                app_id,
                urlencoding::encode(redirect_uri),
                OAUTH_SCOPES.join(","),
            )),
            AuthFlow::SystemTokenBootstrap { .. } => Err(GramError::Config(
                "authorization redirect requires AUTH_FLOW=oauth".to_string(),
            )),
        }
    }

    /// One-shot exchange. The artifact must match the configured flow.
    pub async fn exchange(&self, artifact: AuthArtifact) -> Result<Credential, GramError> {
        match (&self.flow, artifact) {
            (
                AuthFlow::SystemTokenBootstrap {
                    system_token,
                    page_id,
                },
                AuthArtifact::Bootstrap,
            ) => self.bootstrap(system_token, page_id).await,
            (AuthFlow::OAuthCodeFlow { .. }, AuthArtifact::Code(code)) => {
                self.exchange_code(&code).await
            }
            _ => Err(GramError::InvalidInput(
                "auth artifact does not match the configured flow".to_string(),
            )),
        }
    }

    /// Variant A: resolve the linked business account for the configured page.
    async fn bootstrap(&self, system_token: &str, page_id: &str) -> Result<Credential, GramError> {
        let url = UpstreamRequest::get(page_id)
            .with_fields(&["instagram_business_account"])
            .url(&self.graph_base, system_token)?;

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| GramError::Transport(format!("page lookup failed: {}", e)))?;
        let status = response.status().as_u16();
        let body: Value = response
            .json()
            .await
            .map_err(|e| GramError::Transport(format!("undecodable page lookup body: {}", e)))?;

        let credential = bootstrap_outcome(system_token, page_id, status, &body)?;
        tracing::info!(page_id, account_id = %credential.account_id, "bootstrap exchange succeeded");
        Ok(credential)
    }

    /// Variant B: redeem the authorization code at the token endpoint.
    async fn exchange_code(&self, code: &str) -> Result<Credential, GramError> {
        let AuthFlow::OAuthCodeFlow {
            app_id,
            app_secret,
            redirect_uri,
        } = &self.flow
        else {
            return Err(GramError::Config("oauth flow not configured".to_string()));
        };

        let form = [
            ("client_id", app_id.as_str()),
            ("client_secret", app_secret.as_str()),
            ("grant_type", "authorization_code"),
            ("redirect_uri", redirect_uri.as_str()),
            ("code", code),
        ];
        let response = self
            .http
            .post(&self.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| GramError::Transport(format!("token endpoint unreachable: {}", e)))?;
        let status = response.status().as_u16();
        let body: Value = response
            .json()
            .await
            .map_err(|e| GramError::Transport(format!("undecodable token response: {}", e)))?;

        let credential = grant_outcome(status, &body)?;
        tracing::info!(account_id = %credential.account_id, "code exchange succeeded");
        Ok(credential)
    }
}

/// Variant A decision point, separated from the transport so the lookup
/// semantics stay visible: non-2xx fails the exchange, a 2xx without a linked
/// account id is [`GramError::NoLinkedAccount`].
fn bootstrap_outcome(
    system_token: &str,
    page_id: &str,
    status: u16,
    body: &Value,
) -> Result<Credential, GramError> {
    if !(200..300).contains(&status) {
        return Err(GramError::ExchangeFailed(format!(
            "page lookup returned {}: {}",
            status, body
        )));
    }
    let account_id = resolve_linked_account(page_id, body)?;
    Ok(Credential::new(system_token, account_id))
}

/// Variant B decision point: non-2xx or a malformed grant both fail the
/// exchange.
fn grant_outcome(status: u16, body: &Value) -> Result<Credential, GramError> {
    if !(200..300).contains(&status) {
        return Err(GramError::ExchangeFailed(format!(
            "token endpoint returned {}: {}",
            status, body
        )));
    }
    credential_from_grant(body)
}

/// Distinguishes "page exists but has no linked business account" from every
/// transport-shaped failure.
fn resolve_linked_account(page_id: &str, body: &Value) -> Result<String, GramError> {
    let lookup: PageLookup = schema::require(body)?;
    match lookup.instagram_business_account {
        Some(account) if !account.id.is_empty() => Ok(account.id),
        _ => Err(GramError::NoLinkedAccount(page_id.to_string())),
    }
}

fn credential_from_grant(body: &Value) -> Result<Credential, GramError> {
    let grant: TokenGrant = schema::require(body)
        .map_err(|e| GramError::ExchangeFailed(format!("malformed token response: {}", e)))?;
    if grant.access_token.is_empty() {
        return Err(GramError::ExchangeFailed(
            "token response carried an empty access_token".to_string(),
        ));
    }
    Ok(Credential::new(
        grant.access_token,
        grant.user_id.to_string(),
    ))
}
