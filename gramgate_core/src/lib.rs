// src/lib.rs
pub mod config;
pub mod credential;
pub mod error;
pub mod exchange;
pub mod graph;
pub mod guard;
pub mod reply;
pub mod schema;
pub mod session_store;

pub use config::Config;
pub use credential::Credential;
pub use error::GramError;
pub use exchange::{AuthArtifact, AuthFlow, TokenExchange};
pub use graph::{GraphApi, GraphClient, UpstreamError, UpstreamRequest, UpstreamResult};
pub use guard::{auth_context, authorize, AuthContext};
pub use reply::reply_and_refresh;
pub use session_store::{MemorySessionStore, SessionStore, StoreError};
