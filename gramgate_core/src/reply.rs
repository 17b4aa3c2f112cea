//! Reply Coordinator: post a comment reply, then re-read the parent thread so
//! the caller always observes the reply in place rather than a bare receipt.

use crate::credential::Credential;
use crate::graph::{GraphApi, UpstreamResult};

/// Submits the reply and, only if that succeeds, re-fetches the parent
/// comment with its nested replies and returns the refreshed thread.
///
/// A post failure is returned unchanged and the refresh is never issued.
/// There is no rollback: when the refresh fails after a committed reply, the
/// refresh error is surfaced while the reply stays posted upstream.
pub async fn reply_and_refresh<G: GraphApi + ?Sized>(
    graph: &G,
    comment_id: &str,
    message: &str,
    credential: &Credential,
) -> UpstreamResult {
    graph.post_reply(comment_id, message, credential).await?;
    tracing::debug!(comment_id, "reply posted, refreshing thread");

    graph
        .fetch_comment(comment_id, credential)
        .await
        .map_err(|err| {
            tracing::warn!(
                comment_id,
                status = err.status,
                "thread refresh failed after a committed reply"
            );
            err
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{UpstreamError, UpstreamMethod, UpstreamRequest};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted Graph double: counts posts and fetches at the request level.
    struct FakeGraph {
        posts: AtomicUsize,
        fetches: AtomicUsize,
        fail_post: bool,
        fail_refresh: bool,
        thread: Value,
    }

    impl FakeGraph {
        fn new(thread: Value) -> Self {
            Self {
                posts: AtomicUsize::new(0),
                fetches: AtomicUsize::new(0),
                fail_post: false,
                fail_refresh: false,
                thread,
            }
        }
    }

    #[async_trait]
    impl GraphApi for FakeGraph {
        async fn call(&self, request: UpstreamRequest, _credential: &Credential) -> UpstreamResult {
            match request.method {
                UpstreamMethod::Post => {
                    self.posts.fetch_add(1, Ordering::SeqCst);
                    if self.fail_post {
                        Err(UpstreamError {
                            status: 400,
                            body: json!({"error": {"message": "message rejected"}}),
                        })
                    } else {
                        Ok(json!({"id": "R1"}))
                    }
                }
                UpstreamMethod::Get => {
                    self.fetches.fetch_add(1, Ordering::SeqCst);
                    if self.fail_refresh {
                        Err(UpstreamError::transport("refresh timed out"))
                    } else {
                        Ok(self.thread.clone())
                    }
                }
            }
        }
    }

    fn thread_with_reply() -> Value {
        json!({
            "id": "C1",
            "text": "hi",
            "username": "u1",
            "replies": {"data": [
                {"id": "R1", "text": "thanks", "username": "owner"}
            ]}
        })
    }

    fn credential() -> Credential {
        Credential::new("T1", "IG1")
    }

    #[tokio::test]
    async fn returns_refreshed_thread_not_the_receipt() {
        let graph = FakeGraph::new(thread_with_reply());
        let result = reply_and_refresh(&graph, "C1", "thanks", &credential())
            .await
            .unwrap();

        assert_eq!(result, thread_with_reply());
        assert_eq!(result["replies"]["data"][0]["id"], "R1");
        assert_eq!(graph.posts.load(Ordering::SeqCst), 1);
        assert_eq!(graph.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn post_failure_skips_the_refresh() {
        let mut graph = FakeGraph::new(thread_with_reply());
        graph.fail_post = true;

        let err = reply_and_refresh(&graph, "C1", "thanks", &credential())
            .await
            .unwrap_err();

        assert_eq!(err.status, 400);
        assert_eq!(err.body["error"]["message"], "message rejected");
        assert_eq!(graph.posts.load(Ordering::SeqCst), 1);
        assert_eq!(graph.fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn refresh_failure_surfaces_without_retry() {
        let mut graph = FakeGraph::new(thread_with_reply());
        graph.fail_refresh = true;

        let err = reply_and_refresh(&graph, "C1", "thanks", &credential())
            .await
            .unwrap_err();

        assert_eq!(err.status, crate::graph::TRANSPORT_STATUS);
        assert_eq!(graph.posts.load(Ordering::SeqCst), 1);
        assert_eq!(graph.fetches.load(Ordering::SeqCst), 1);
    }
}
