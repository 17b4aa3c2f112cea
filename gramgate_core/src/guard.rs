//! Session Guard: admits only requests whose session holds a complete
//! credential, before any upstream call is attempted.

use crate::credential::Credential;
use crate::error::GramError;
use crate::session_store::SessionStore;

/// Result of the non-rejecting guard mode: anonymous is a valid state here,
/// not an error.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub authenticated: bool,
    pub credential: Option<Credential>,
}

/// Strict mode: the session must exist and hold a complete credential.
pub fn authorize(
    store: &dyn SessionStore,
    session_id: Option<&str>,
) -> Result<Credential, GramError> {
    let session_id = session_id.ok_or(GramError::Unauthenticated)?;
    match store.read(session_id) {
        Some(credential) if credential.is_complete() => Ok(credential),
        _ => Err(GramError::Unauthenticated),
    }
}

/// Optional mode: annotates instead of rejecting.
pub fn auth_context(store: &dyn SessionStore, session_id: Option<&str>) -> AuthContext {
    match authorize(store, session_id) {
        Ok(credential) => AuthContext {
            authenticated: true,
            credential: Some(credential),
        },
        Err(_) => AuthContext {
            authenticated: false,
            credential: None,
        },
    }
}
