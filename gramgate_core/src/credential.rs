use serde::{Deserialize, Serialize};

/// Access token + linked account id pair authorizing upstream Graph calls.
///
/// A credential only counts as authenticated when both halves are non-empty;
/// anything partial is treated the same as no credential at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    pub account_id: String,
}

impl Credential {
    pub fn new(access_token: impl Into<String>, account_id: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            account_id: account_id.into(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.access_token.is_empty() && !self.account_id.is_empty()
    }
}
