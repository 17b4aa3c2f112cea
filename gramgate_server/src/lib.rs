//! HTTP proxy surface: route wiring, session cookies, and the translation of
//! core outcomes into responses. All domain logic lives in `gramgate_core`.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::header::{HeaderValue, CONTENT_TYPE, SET_COOKIE};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use gramgate_core::graph::GraphApi;
use gramgate_core::{
    auth_context, authorize, reply_and_refresh, AuthArtifact, Config, Credential, GramError,
    GraphClient, MemorySessionStore, SessionStore, TokenExchange, UpstreamError, UpstreamResult,
};

pub mod session;

use session::{clear_session_cookie, session_cookie, session_id};

#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn SessionStore>,
    graph: Arc<dyn GraphApi>,
    exchange: Arc<TokenExchange>,
    frontend_url: String,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self, GramError> {
        let graph = GraphClient::new(config.graph_base.clone(), config.upstream_timeout)?;
        let exchange = TokenExchange::new(config)?;
        Ok(Self::with_parts(
            Arc::new(MemorySessionStore::new()),
            Arc::new(graph),
            Arc::new(exchange),
            config.frontend_url.clone(),
        ))
    }

    /// Assembly seam for tests and alternative store/graph backends.
    pub fn with_parts(
        store: Arc<dyn SessionStore>,
        graph: Arc<dyn GraphApi>,
        exchange: Arc<TokenExchange>,
        frontend_url: String,
    ) -> Self {
        Self {
            store,
            graph,
            exchange,
            frontend_url,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health))
        .route("/auth/instagram", get(begin_login))
        .route("/auth/instagram/callback", get(complete_login))
        .route("/auth/init", post(bootstrap_login))
        .route("/auth/status", get(auth_status))
        .route("/auth/logout", post(logout))
        .route("/instagram/profile", get(profile))
        .route("/instagram/feed", get(feed))
        .route("/instagram/media/:media_id", get(media))
        .route("/instagram/comments/:media_id", get(comments))
        .route("/instagram/comment/:comment_id/reply", post(reply))
        .with_state(state)
}

/// Browser clients send credentials cross-origin, so the allowed origin is
/// pinned to the configured front-end rather than a wildcard.
pub fn cors_layer(frontend_url: &str) -> Result<CorsLayer, GramError> {
    let origin = frontend_url
        .parse::<HeaderValue>()
        .map_err(|e| GramError::Config(format!("FRONTEND_URL is not a valid origin: {}", e)))?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE])
        .allow_credentials(true))
}

// --- error envelope ---

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: Value,
}

impl ApiError {
    fn new(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({
                "error": {
                    "code": code,
                    "message": message.into(),
                }
            }),
        }
    }

    fn invalid(code: &str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }

    fn internal(code: &str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, code, message)
    }

    /// Upstream failures keep their status and body verbatim.
    fn upstream(err: UpstreamError) -> Self {
        Self {
            status: StatusCode::from_u16(err.status).unwrap_or(StatusCode::BAD_GATEWAY),
            body: err.body,
        }
    }
}

impl From<GramError> for ApiError {
    fn from(err: GramError) -> Self {
        let status = match &err {
            GramError::Unauthenticated => StatusCode::UNAUTHORIZED,
            GramError::NoLinkedAccount(_) | GramError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            GramError::Transport(_) | GramError::Schema(_) | GramError::HttpRequest(_) => {
                StatusCode::BAD_GATEWAY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.code_str(), err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

// --- handlers ---

async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

async fn begin_login(State(state): State<AppState>) -> Result<Redirect, ApiError> {
    let url = state.exchange.authorize_url()?;
    Ok(Redirect::temporary(&url))
}

#[derive(Debug, Deserialize)]
struct CallbackQuery {
    code: Option<String>,
}

async fn complete_login(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let code = query
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::invalid("missing_code", "authorization code missing"))?;

    let credential = state.exchange.exchange(AuthArtifact::Code(code)).await?;
    let sid = establish_session(&state, &headers, &credential)?;

    let mut response = Redirect::to(&state.frontend_url).into_response();
    append_cookie(&mut response, &session_cookie(&sid))?;
    Ok(response)
}

async fn bootstrap_login(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let credential = state.exchange.exchange(AuthArtifact::Bootstrap).await?;
    let sid = establish_session(&state, &headers, &credential)?;

    let mut response = Json(json!({
        "success": true,
        "account_id": credential.account_id,
    }))
    .into_response();
    append_cookie(&mut response, &session_cookie(&sid))?;
    Ok(response)
}

async fn auth_status(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let context = auth_context(state.store.as_ref(), session_id(&headers).as_deref());
    Json(json!({
        "authenticated": context.authenticated,
        "account_id": context.credential.map(|c| c.account_id),
    }))
}

async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, ApiError> {
    if let Some(sid) = session_id(&headers) {
        state.store.invalidate(&sid);
    }
    let mut response = Json(json!({"success": true})).into_response();
    append_cookie(&mut response, &clear_session_cookie())?;
    Ok(response)
}

async fn profile(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, ApiError> {
    let credential = require_auth(&state, &headers)?;
    relay(state.graph.fetch_profile(&credential).await)
}

async fn feed(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, ApiError> {
    let credential = require_auth(&state, &headers)?;
    relay(state.graph.fetch_feed(&credential).await)
}

async fn media(
    State(state): State<AppState>,
    Path(media_id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let credential = require_auth(&state, &headers)?;
    relay(state.graph.fetch_media(&media_id, &credential).await)
}

async fn comments(
    State(state): State<AppState>,
    Path(media_id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let credential = require_auth(&state, &headers)?;
    relay(state.graph.fetch_comments(&media_id, &credential).await)
}

#[derive(Debug, Deserialize)]
struct ReplyBody {
    message: String,
}

async fn reply(
    State(state): State<AppState>,
    Path(comment_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<ReplyBody>,
) -> Result<Response, ApiError> {
    let message = body.message.trim();
    if message.is_empty() {
        return Err(ApiError::invalid("missing_message", "reply message missing"));
    }
    let credential = require_auth(&state, &headers)?;
    relay(reply_and_refresh(state.graph.as_ref(), &comment_id, message, &credential).await)
}

// --- helpers ---

/// Strict guard at the route boundary: rejects before any upstream call.
fn require_auth(state: &AppState, headers: &HeaderMap) -> Result<Credential, ApiError> {
    authorize(state.store.as_ref(), session_id(headers).as_deref()).map_err(ApiError::from)
}

/// Reuses the caller's session id when one is present so a fresh exchange
/// overwrites the prior credential instead of leaking a parallel session.
fn establish_session(
    state: &AppState,
    headers: &HeaderMap,
    credential: &Credential,
) -> Result<String, ApiError> {
    let sid = session_id(headers).unwrap_or_else(|| Uuid::new_v4().to_string());
    state
        .store
        .create(&sid, credential)
        .map_err(|e| ApiError::internal("session_store", e.to_string()))?;
    Ok(sid)
}

fn append_cookie(response: &mut Response, cookie: &str) -> Result<(), ApiError> {
    let value = HeaderValue::from_str(cookie)
        .map_err(|e| ApiError::internal("cookie_encode", e.to_string()))?;
    response.headers_mut().append(SET_COOKIE, value);
    Ok(())
}

/// Success payloads pass through untouched; upstream failures keep their
/// status and body.
fn relay(result: UpstreamResult) -> Result<Response, ApiError> {
    match result {
        Ok(payload) => Ok(Json(payload).into_response()),
        Err(err) => Err(ApiError::upstream(err)),
    }
}
