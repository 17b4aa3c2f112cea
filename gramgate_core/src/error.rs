// src/error.rs

#[derive(Debug, thiserror::Error)]
pub enum GramError {
    #[error("no Instagram business account linked to page {0}")]
    NoLinkedAccount(String),

    #[error("token exchange failed: {0}")]
    ExchangeFailed(String),

    #[error("not authenticated")]
    Unauthenticated,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid upstream payload: {0}")]
    Schema(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("HTTP request error: {0}")]
    HttpRequest(#[from] reqwest::Error),
}

impl GramError {
    pub fn code_str(&self) -> &'static str {
        match self {
            GramError::NoLinkedAccount(_) => "no_linked_account",
            GramError::ExchangeFailed(_) => "exchange_failed",
            GramError::Unauthenticated => "unauthenticated",
            GramError::InvalidInput(_) => "invalid_input",
            GramError::Schema(_) => "invalid_payload",
            GramError::Config(_) => "config_error",
            GramError::Transport(_) => "transport_error",
            GramError::HttpRequest(_) => "transport_error",
        }
    }
}
