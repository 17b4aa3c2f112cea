//! Typed shapes for the upstream responses we rely on.
//!
//! The proxy relays upstream payloads verbatim, but every payload is checked
//! against the schema of its endpoint first so a missing required field shows
//! up as a parse error instead of leaking downstream as a half-formed success.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::GramError;

/// Graph object ids arrive as JSON strings in most places, but the OAuth token
/// endpoint returns `user_id` as a bare number.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum GraphId {
    Str(String),
    Num(u64),
}

impl fmt::Display for GraphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphId::Str(s) => f.write_str(s),
            GraphId::Num(n) => write!(f, "{}", n),
        }
    }
}

/// `{page_id}?fields=instagram_business_account` response.
#[derive(Debug, Deserialize)]
pub struct PageLookup {
    pub instagram_business_account: Option<AccountRef>,
}

#[derive(Debug, Deserialize)]
pub struct AccountRef {
    pub id: String,
}

/// OAuth code exchange response.
#[derive(Debug, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    pub user_id: GraphId,
}

#[derive(Debug, Deserialize)]
pub struct Profile {
    pub id: String,
    pub username: String,
    pub profile_picture_url: Option<String>,
    pub followers_count: Option<u64>,
    pub follows_count: Option<u64>,
    pub media_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct MediaList {
    pub data: Vec<MediaItem>,
}

#[derive(Debug, Deserialize)]
pub struct MediaItem {
    pub id: String,
    pub caption: Option<String>,
    pub media_type: Option<String>,
    pub media_url: Option<String>,
    pub permalink: Option<String>,
    pub timestamp: Option<String>,
}

/// Single-media lookup (`fields=id,owner,caption`).
#[derive(Debug, Deserialize)]
pub struct Media {
    pub id: String,
    pub owner: Option<Value>,
    pub caption: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CommentList {
    pub data: Vec<Comment>,
}

/// One comment with at most one level of nested replies.
#[derive(Debug, Deserialize)]
pub struct Comment {
    pub id: String,
    pub text: String,
    pub username: Option<String>,
    pub timestamp: Option<String>,
    pub replies: Option<ReplyList>,
}

#[derive(Debug, Deserialize)]
pub struct ReplyList {
    pub data: Vec<ReplyComment>,
}

/// Nested replies carry no further `replies` key.
#[derive(Debug, Deserialize)]
pub struct ReplyComment {
    pub id: String,
    pub text: String,
    pub username: Option<String>,
    pub timestamp: Option<String>,
}

/// Reply submission receipt: upstream returns the new comment id only.
#[derive(Debug, Deserialize)]
pub struct ReplyReceipt {
    pub id: String,
}

/// Checks `value` against the schema `T` without consuming it. Extra fields
/// pass through untouched; missing required fields fail.
pub fn require<T: DeserializeOwned>(value: &Value) -> Result<T, GramError> {
    serde_json::from_value(value.clone()).map_err(|e| GramError::Schema(e.to_string()))
}
