//! Graph Proxy: turns local read/write operations into upstream Graph API
//! calls and normalizes every outcome into an [`UpstreamResult`].

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use url::Url;

use crate::credential::Credential;
use crate::error::GramError;
use crate::schema::{self, CommentList, Media, MediaList, Profile, ReplyReceipt};

pub const PROFILE_FIELDS: &[&str] = &[
    "id",
    "username",
    "profile_picture_url",
    "followers_count",
    "follows_count",
    "media_count",
];

pub const FEED_FIELDS: &[&str] = &[
    "id",
    "caption",
    "media_type",
    "media_url",
    "permalink",
    "timestamp",
];

pub const MEDIA_FIELDS: &[&str] = &["id", "owner", "caption"];

/// One nested reply level; replies themselves are not expanded further.
pub const COMMENT_FIELDS: &[&str] = &[
    "id",
    "text",
    "username",
    "timestamp",
    "replies{id,text,username,timestamp}",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamMethod {
    Get,
    Post,
}

/// A single upstream call, built fresh per request and never persisted.
///
/// `fields` is joined with commas into the `fields` query parameter; the
/// access token is appended at send time, parameters stay transport-level
/// and no call carries a request body.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub method: UpstreamMethod,
    pub path: String,
    pub fields: Vec<String>,
    pub params: Vec<(String, String)>,
}

impl UpstreamRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: UpstreamMethod::Get,
            path: path.into(),
            fields: Vec::new(),
            params: Vec::new(),
        }
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self {
            method: UpstreamMethod::Post,
            ..Self::get(path)
        }
    }

    pub fn with_fields(mut self, fields: &[&str]) -> Self {
        self.fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Full upstream URL with field selection and the credential's token.
    pub fn url(&self, base: &str, access_token: &str) -> Result<Url, GramError> {
        let mut url = Url::parse(&format!("{}/{}", base.trim_end_matches('/'), self.path))
            .map_err(|e| GramError::InvalidInput(format!("bad upstream url: {}", e)))?;
        {
            let mut query = url.query_pairs_mut();
            if !self.fields.is_empty() {
                query.append_pair("fields", &self.fields.join(","));
            }
            for (key, value) in &self.params {
                query.append_pair(key, value);
            }
            query.append_pair("access_token", access_token);
        }
        Ok(url)
    }
}

/// Normalized upstream failure: the upstream status and body verbatim when a
/// response was received, or a fixed 502 with a local fallback body when the
/// failure never produced one (connect error, timeout, undecodable payload).
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamError {
    pub status: u16,
    pub body: Value,
}

pub const TRANSPORT_STATUS: u16 = 502;

impl UpstreamError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            status: TRANSPORT_STATUS,
            body: json!({
                "error": {
                    "message": message.into(),
                    "code": "transport_error",
                }
            }),
        }
    }
}

impl fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "upstream error {}: {}", self.status, self.body)
    }
}

impl std::error::Error for UpstreamError {}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            UpstreamError::transport(format!("upstream timeout: {}", err))
        } else {
            UpstreamError::transport(format!("upstream request failed: {}", err))
        }
    }
}

pub type UpstreamResult = Result<Value, UpstreamError>;

fn invalid_payload(endpoint: &str, err: GramError) -> UpstreamError {
    UpstreamError::transport(format!("{} payload failed validation: {}", endpoint, err))
}

/// The logical Graph operations. Implementations only have to provide
/// [`GraphApi::call`]; the typed operations are derived from it, so test
/// doubles can observe or fail individual calls at the request level.
#[async_trait]
pub trait GraphApi: Send + Sync {
    async fn call(&self, request: UpstreamRequest, credential: &Credential) -> UpstreamResult;

    async fn fetch_profile(&self, credential: &Credential) -> UpstreamResult {
        let request = UpstreamRequest::get(&credential.account_id).with_fields(PROFILE_FIELDS);
        let payload = self.call(request, credential).await?;
        schema::require::<Profile>(&payload).map_err(|e| invalid_payload("profile", e))?;
        Ok(payload)
    }

    async fn fetch_feed(&self, credential: &Credential) -> UpstreamResult {
        let request = UpstreamRequest::get(format!("{}/media", credential.account_id))
            .with_fields(FEED_FIELDS);
        let payload = self.call(request, credential).await?;
        schema::require::<MediaList>(&payload).map_err(|e| invalid_payload("feed", e))?;
        Ok(payload)
    }

    async fn fetch_media(&self, media_id: &str, credential: &Credential) -> UpstreamResult {
        let request = UpstreamRequest::get(media_id).with_fields(MEDIA_FIELDS);
        let payload = self.call(request, credential).await?;
        schema::require::<Media>(&payload).map_err(|e| invalid_payload("media", e))?;
        Ok(payload)
    }

    async fn fetch_comments(&self, media_id: &str, credential: &Credential) -> UpstreamResult {
        let request =
            UpstreamRequest::get(format!("{}/comments", media_id)).with_fields(COMMENT_FIELDS);
        let payload = self.call(request, credential).await?;
        schema::require::<CommentList>(&payload).map_err(|e| invalid_payload("comments", e))?;
        Ok(payload)
    }

    /// Single comment with its nested replies; the Reply Coordinator's
    /// refresh read.
    async fn fetch_comment(&self, comment_id: &str, credential: &Credential) -> UpstreamResult {
        let request = UpstreamRequest::get(comment_id).with_fields(COMMENT_FIELDS);
        let payload = self.call(request, credential).await?;
        schema::require::<schema::Comment>(&payload).map_err(|e| invalid_payload("comment", e))?;
        Ok(payload)
    }

    async fn post_reply(
        &self,
        comment_id: &str,
        message: &str,
        credential: &Credential,
    ) -> UpstreamResult {
        let request = UpstreamRequest::post(format!("{}/replies", comment_id))
            .with_param("message", message);
        let payload = self.call(request, credential).await?;
        schema::require::<ReplyReceipt>(&payload).map_err(|e| invalid_payload("reply", e))?;
        Ok(payload)
    }
}

/// Reqwest-backed [`GraphApi`] implementation.
pub struct GraphClient {
    http: reqwest::Client,
    base: String,
}

impl GraphClient {
    pub fn new(base: impl Into<String>, timeout: Duration) -> Result<Self, GramError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("gramgate/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            base: base.into(),
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }
}

#[async_trait]
impl GraphApi for GraphClient {
    async fn call(&self, request: UpstreamRequest, credential: &Credential) -> UpstreamResult {
        let path = request.path.clone();
        let url = request
            .url(&self.base, &credential.access_token)
            .map_err(|e| UpstreamError::transport(e.to_string()))?;

        let builder = match request.method {
            UpstreamMethod::Get => self.http.get(url),
            UpstreamMethod::Post => self.http.post(url),
        };

        let response = builder.send().await.map_err(UpstreamError::from)?;
        let status = response.status();
        let raw = response.text().await.map_err(UpstreamError::from)?;

        if status.is_success() {
            serde_json::from_str(&raw).map_err(|e| {
                UpstreamError::transport(format!("undecodable upstream body: {}", e))
            })
        } else {
            tracing::warn!(status = status.as_u16(), path = %path, "upstream call failed");
            // Keep the upstream error body verbatim; fall back to the raw text
            // when it is not JSON.
            let body = serde_json::from_str(&raw).unwrap_or(Value::String(raw));
            Err(UpstreamError {
                status: status.as_u16(),
                body,
            })
        }
    }
}
