//! End-to-end flow over the core components with a scripted Graph double:
//! guard -> proxy read pass-through -> reply coordination.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use gramgate_core::graph::{GraphApi, UpstreamRequest};
use gramgate_core::{
    auth_context, authorize, reply_and_refresh, Credential, MemorySessionStore, SessionStore,
    UpstreamError, UpstreamResult,
};

/// Replays canned payloads keyed by upstream path and counts every call.
struct ScriptedGraph {
    responses: Mutex<HashMap<String, Value>>,
    calls: AtomicUsize,
}

impl ScriptedGraph {
    fn new() -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
        }
    }

    fn script(&self, path: &str, payload: Value) {
        self.responses
            .lock()
            .unwrap()
            .insert(path.to_string(), payload);
    }
}

#[async_trait]
impl GraphApi for ScriptedGraph {
    async fn call(&self, request: UpstreamRequest, _credential: &Credential) -> UpstreamResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let responses = self.responses.lock().unwrap();
        match responses.get(&request.path) {
            Some(payload) => Ok(payload.clone()),
            None => Err(UpstreamError {
                status: 404,
                body: json!({"error": {"message": format!("unknown path {}", request.path)}}),
            }),
        }
    }
}

fn authenticated_store() -> (MemorySessionStore, Credential) {
    let store = MemorySessionStore::new();
    let credential = Credential::new("T1", "IG1");
    store.create("sess", &credential).unwrap();
    (store, credential)
}

#[tokio::test]
async fn comments_pass_through_unchanged() {
    let (store, _) = authenticated_store();
    let credential = authorize(&store, Some("sess")).unwrap();

    let upstream = json!({
        "data": [
            {"id": "C1", "text": "hi", "username": "u1", "replies": {"data": []}}
        ]
    });
    let graph = ScriptedGraph::new();
    graph.script("M1/comments", upstream.clone());

    let payload = graph.fetch_comments("M1", &credential).await.unwrap();
    assert_eq!(payload, upstream);
}

#[tokio::test]
async fn repeated_profile_fetches_are_byte_identical() {
    let (store, _) = authenticated_store();
    let credential = authorize(&store, Some("sess")).unwrap();

    let graph = ScriptedGraph::new();
    graph.script(
        "IG1",
        json!({
            "id": "IG1",
            "username": "acct",
            "profile_picture_url": "https://cdn.example/p.jpg",
            "followers_count": 42,
            "follows_count": 7,
            "media_count": 3
        }),
    );

    let first = graph.fetch_profile(&credential).await.unwrap();
    let second = graph.fetch_profile(&credential).await.unwrap();
    assert_eq!(
        serde_json::to_vec(&first).unwrap(),
        serde_json::to_vec(&second).unwrap()
    );
}

#[tokio::test]
async fn reply_then_refresh_observes_the_new_reply() {
    let (store, _) = authenticated_store();
    let credential = authorize(&store, Some("sess")).unwrap();

    let refreshed = json!({
        "id": "C1",
        "text": "hi",
        "username": "u1",
        "replies": {"data": [
            {"id": "R1", "text": "thanks", "username": "acct"}
        ]}
    });
    let graph = ScriptedGraph::new();
    graph.script("C1/replies", json!({"id": "R1"}));
    graph.script("C1", refreshed.clone());

    let result = reply_and_refresh(&graph, "C1", "thanks", &credential)
        .await
        .unwrap();
    assert_eq!(result, refreshed);

    let replies = result["replies"]["data"].as_array().unwrap();
    assert!(replies.iter().any(|r| r["text"] == "thanks"));
}

#[tokio::test]
async fn unauthenticated_session_never_reaches_upstream() {
    let store = MemorySessionStore::new();
    let graph = ScriptedGraph::new();

    let err = authorize(&store, Some("sess")).unwrap_err();
    assert_eq!(err.code_str(), "unauthenticated");
    // The guard rejected before any proxy call was constructed.
    assert_eq!(graph.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn logout_invalidates_and_status_degrades_gracefully() {
    let (store, _) = authenticated_store();
    assert!(auth_context(&store, Some("sess")).authenticated);

    store.invalidate("sess");

    assert!(authorize(&store, Some("sess")).is_err());
    let context = auth_context(&store, Some("sess"));
    assert!(!context.authenticated);
    assert!(context.credential.is_none());
}
