//! Credential hooks: bearer attachment and refresh-on-401.

use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::error::RefreshError;
use super::pipeline::{Outcome, Pipeline, RequestEnvelope, RequestHook, ResponseHook, Transport};
use super::{ApiError, ApiResponse};
use crate::auth::{Session, SessionEvent, SessionStore};
use crate::models::{RefreshData, RefreshRequest};

/// Path of the token refresh endpoint
pub const REFRESH_PATH: &str = "/auth/refresh";

/// Attaches `Authorization: Bearer <token>` from the session store.
///
/// The store is read on every dispatch, so a replayed request always carries
/// the most recently persisted token. No token means no header.
pub struct BearerAuth {
    store: Arc<dyn SessionStore>,
}

impl BearerAuth {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }
}

impl RequestHook for BearerAuth {
    fn on_request(&self, request: &mut RequestEnvelope) -> Result<(), ApiError> {
        if let Some(token) = self.store.access_token()? {
            let value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
                ApiError::InvalidRequest("stored access token is not a valid header value".into())
            })?;
            request.headers.insert(AUTHORIZATION, value);
        }
        Ok(())
    }
}

/// Recovers a single 401 per request by exchanging the refresh token.
///
/// On a 401 for a request not yet retried: refresh, persist, replay once
/// through the full pipeline. If the refresh fails for any reason both tokens
/// are cleared, `SessionEvent::Expired` is broadcast, and the original 401 is
/// handed back. Concurrent 401s refresh independently; the last write to the
/// store wins.
pub struct RefreshOnUnauthorized {
    store: Arc<dyn SessionStore>,
    events: broadcast::Sender<SessionEvent>,
    sign_in_path: String,
}

impl RefreshOnUnauthorized {
    pub fn new(
        store: Arc<dyn SessionStore>,
        events: broadcast::Sender<SessionEvent>,
        sign_in_path: impl Into<String>,
    ) -> Self {
        Self {
            store,
            events,
            sign_in_path: sign_in_path.into(),
        }
    }

    /// Exchange the stored refresh token for a new access token and persist it.
    /// Sent on the bare transport: no hooks, no bearer.
    async fn refresh(&self, transport: &dyn Transport) -> Result<(), RefreshError> {
        let refresh_token = self
            .store
            .refresh_token()?
            .ok_or(RefreshError::NoRefreshToken)?;

        let request = RequestEnvelope::post(REFRESH_PATH)
            .with_json(&RefreshRequest {
                token: refresh_token,
            })
            .map_err(RefreshError::Transport)?;

        let response = transport
            .send(&request)
            .await
            .map_err(RefreshError::Transport)?;

        if response.status != StatusCode::OK {
            return Err(RefreshError::Status(response.status));
        }

        let envelope: ApiResponse<RefreshData> = serde_json::from_str(&response.body)
            .map_err(|e| RefreshError::Malformed(e.to_string()))?;
        if !envelope.success {
            return Err(RefreshError::Rejected(
                envelope.message.unwrap_or_else(|| "no reason given".to_string()),
            ));
        }
        let data = envelope
            .data
            .filter(|d| !d.token.is_empty())
            .ok_or_else(|| RefreshError::Malformed("missing token".to_string()))?;

        match data.refresh_token {
            Some(rotated) if !rotated.is_empty() => {
                self.store.set_session(&Session::new(data.token, rotated))?
            }
            _ => self.store.set_access_token(&data.token)?,
        }
        Ok(())
    }

    fn expire_session(&self) {
        if let Err(e) = self.store.clear_session() {
            warn!(error = %e, "Failed to clear session after refresh failure");
        }
        // No subscribers is fine
        let _ = self.events.send(SessionEvent::Expired {
            redirect_to: self.sign_in_path.clone(),
        });
    }
}

impl ResponseHook for RefreshOnUnauthorized {
    fn on_response<'a>(
        &'a self,
        pipeline: &'a Pipeline,
        request: &'a RequestEnvelope,
        outcome: Outcome,
    ) -> BoxFuture<'a, Outcome> {
        async move {
            let response = match outcome {
                Ok(response) if response.is_unauthorized() => response,
                other => return other,
            };

            if request.retried {
                debug!(path = %request.path, "Unauthorized after refresh, giving up");
                return Ok(response);
            }

            match self.refresh(pipeline.transport()).await {
                Ok(()) => {
                    info!(path = %request.path, "Access token refreshed, replaying request");
                    let _ = self.events.send(SessionEvent::Refreshed);

                    let mut replay = request.clone();
                    replay.retried = true;
                    replay.headers.remove(AUTHORIZATION);
                    pipeline.dispatch(replay).await
                }
                Err(reason) => {
                    warn!(
                        path = %request.path,
                        reason = %reason,
                        "Token refresh failed, ending session"
                    );
                    self.expire_session();
                    Ok(response)
                }
            }
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::ScriptedTransport;
    use crate::auth::{FileSessionStore, MemorySessionStore};

    struct Harness {
        transport: Arc<ScriptedTransport>,
        store: Arc<MemorySessionStore>,
        pipeline: Pipeline,
        events: broadcast::Receiver<SessionEvent>,
    }

    fn harness(store: MemorySessionStore) -> Harness {
        let transport = Arc::new(ScriptedTransport::new());
        let store = Arc::new(store);
        let (tx, events) = broadcast::channel(8);
        let pipeline = Pipeline::builder(transport.clone())
            .request_hook(BearerAuth::new(store.clone()))
            .response_hook(RefreshOnUnauthorized::new(store.clone(), tx, "/"))
            .build();
        Harness {
            transport,
            store,
            pipeline,
            events,
        }
    }

    fn signed_in(access: &str, refresh: &str) -> MemorySessionStore {
        MemorySessionStore::with_session(&Session::new(access, refresh))
    }

    #[tokio::test]
    async fn test_attaches_stored_token() {
        let h = harness(signed_in("abc", "r1"));
        h.transport.route("/forecasts", StatusCode::OK, "{}");

        h.pipeline
            .dispatch(RequestEnvelope::get("/forecasts"))
            .await
            .unwrap();

        let sent = h.transport.requests_to("/forecasts");
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].headers.get(AUTHORIZATION).unwrap(), "Bearer abc");
    }

    #[tokio::test]
    async fn test_no_token_sends_unauthenticated() {
        let h = harness(MemorySessionStore::new());
        h.transport.route("/forecasts", StatusCode::OK, "{}");

        let response = h
            .pipeline
            .dispatch(RequestEnvelope::get("/forecasts"))
            .await
            .unwrap();

        assert_eq!(response.status, StatusCode::OK);
        let sent = h.transport.requests();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].headers.get(AUTHORIZATION).is_none());
    }

    #[tokio::test]
    async fn test_refresh_and_replay_once() {
        let mut h = harness(signed_in("abc", "r1"));
        h.transport.route("/budgets/1", StatusCode::UNAUTHORIZED, "");
        h.transport.route(
            REFRESH_PATH,
            StatusCode::OK,
            r#"{"success":true,"data":{"token":"abc2"}}"#,
        );
        h.transport
            .route("/budgets/1", StatusCode::OK, r#"{"success":true,"data":{}}"#);

        let response = h
            .pipeline
            .dispatch(RequestEnvelope::get("/budgets/1"))
            .await
            .unwrap();

        // Caller only sees the replay
        assert_eq!(response.status, StatusCode::OK);

        let budget_calls = h.transport.requests_to("/budgets/1");
        assert_eq!(budget_calls.len(), 2);
        assert_eq!(budget_calls[0].bearer_token(), Some("abc"));
        assert_eq!(budget_calls[1].bearer_token(), Some("abc2"));
        assert!(budget_calls[1].retried);

        let refresh_calls = h.transport.requests_to(REFRESH_PATH);
        assert_eq!(refresh_calls.len(), 1);
        assert_eq!(refresh_calls[0].body.as_ref().unwrap()["token"], "r1");
        assert!(refresh_calls[0].headers.get(AUTHORIZATION).is_none());

        assert_eq!(h.store.access_token().unwrap().as_deref(), Some("abc2"));
        assert_eq!(h.store.refresh_token().unwrap().as_deref(), Some("r1"));
        assert_eq!(h.events.try_recv().unwrap(), SessionEvent::Refreshed);
    }

    #[tokio::test]
    async fn test_replay_error_is_returned() {
        let h = harness(signed_in("abc", "r1"));
        h.transport.route("/budgets/1", StatusCode::UNAUTHORIZED, "");
        h.transport.route(
            REFRESH_PATH,
            StatusCode::OK,
            r#"{"success":true,"data":{"token":"abc2"}}"#,
        );
        h.transport.route_network_failure("/budgets/1");

        let outcome = h.pipeline.dispatch(RequestEnvelope::get("/budgets/1")).await;
        assert!(matches!(outcome, Err(ApiError::NetworkError(_))));
        // Session survives: the refresh itself worked
        assert_eq!(h.store.access_token().unwrap().as_deref(), Some("abc2"));
    }

    #[tokio::test]
    async fn test_rotated_refresh_token_is_persisted() {
        let h = harness(signed_in("abc", "r1"));
        h.transport.route("/expenses", StatusCode::UNAUTHORIZED, "");
        h.transport.route(
            REFRESH_PATH,
            StatusCode::OK,
            r#"{"success":true,"data":{"token":"abc2","refreshToken":"r2"}}"#,
        );
        h.transport.route("/expenses", StatusCode::OK, "{}");

        h.pipeline
            .dispatch(RequestEnvelope::get("/expenses"))
            .await
            .unwrap();

        assert_eq!(h.store.session().unwrap(), Some(Session::new("abc2", "r2")));
    }

    #[tokio::test]
    async fn test_refresh_rejected_clears_session() {
        let mut h = harness(signed_in("abc", "r1"));
        h.transport.route("/forecasts", StatusCode::UNAUTHORIZED, "stale");
        h.transport.route(
            REFRESH_PATH,
            StatusCode::OK,
            r#"{"success":false,"message":"expired"}"#,
        );

        let response = h
            .pipeline
            .dispatch(RequestEnvelope::get("/forecasts"))
            .await
            .unwrap();

        // Original 401 comes back untouched
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
        assert_eq!(response.body, "stale");
        assert_eq!(h.transport.requests_to("/forecasts").len(), 1);

        assert_eq!(h.store.access_token().unwrap(), None);
        assert_eq!(h.store.refresh_token().unwrap(), None);
        assert_eq!(
            h.events.try_recv().unwrap(),
            SessionEvent::Expired {
                redirect_to: "/".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_refresh_endpoint_unauthorized_clears_session() {
        let mut h = harness(signed_in("abc", "r1"));
        h.transport.route("/categories", StatusCode::UNAUTHORIZED, "");
        h.transport.route(REFRESH_PATH, StatusCode::UNAUTHORIZED, "");

        let response = h
            .pipeline
            .dispatch(RequestEnvelope::get("/categories"))
            .await
            .unwrap();

        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
        // The refresh call is not itself refreshed
        assert_eq!(h.transport.requests_to(REFRESH_PATH).len(), 1);
        assert_eq!(h.store.session().unwrap(), None);
        assert!(h.events.try_recv().unwrap().is_expired());
    }

    #[tokio::test]
    async fn test_malformed_or_failed_refresh_clears_session() {
        let bodies = [
            (StatusCode::OK, "not json"),
            (StatusCode::OK, r#"{"success":true}"#),
            (StatusCode::OK, r#"{"success":true,"data":{"token":""}}"#),
            (StatusCode::CREATED, r#"{"success":true,"data":{"token":"abc2"}}"#),
            (StatusCode::INTERNAL_SERVER_ERROR, ""),
        ];
        for (status, body) in bodies {
            let mut h = harness(signed_in("abc", "r1"));
            h.transport.route("/subcategories", StatusCode::UNAUTHORIZED, "");
            h.transport.route(REFRESH_PATH, status, body);

            let response = h
                .pipeline
                .dispatch(RequestEnvelope::get("/subcategories"))
                .await
                .unwrap();

            assert_eq!(response.status, StatusCode::UNAUTHORIZED, "case {}", body);
            assert_eq!(h.store.session().unwrap(), None, "case {}", body);
            assert!(h.events.try_recv().unwrap().is_expired(), "case {}", body);
        }
    }

    #[tokio::test]
    async fn test_refresh_network_failure_clears_session() {
        let mut h = harness(signed_in("abc", "r1"));
        h.transport.route("/forecasts", StatusCode::UNAUTHORIZED, "");
        h.transport.route_network_failure(REFRESH_PATH);

        let response = h
            .pipeline
            .dispatch(RequestEnvelope::get("/forecasts"))
            .await
            .unwrap();

        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
        assert_eq!(h.store.session().unwrap(), None);
        assert!(h.events.try_recv().unwrap().is_expired());
    }

    #[tokio::test]
    async fn test_missing_refresh_token_skips_refresh_call() {
        let store = MemorySessionStore::new();
        store.set_access_token("abc").unwrap();
        let mut h = harness(store);
        h.transport.route("/forecasts", StatusCode::UNAUTHORIZED, "");

        let response = h
            .pipeline
            .dispatch(RequestEnvelope::get("/forecasts"))
            .await
            .unwrap();

        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
        assert!(h.transport.requests_to(REFRESH_PATH).is_empty());
        assert_eq!(h.store.access_token().unwrap(), None);
        assert!(h.events.try_recv().unwrap().is_expired());
    }

    #[tokio::test]
    async fn test_already_retried_request_is_terminal() {
        let h = harness(signed_in("abc", "r1"));
        h.transport.route("/forecasts", StatusCode::UNAUTHORIZED, "");

        let mut request = RequestEnvelope::get("/forecasts");
        request.retried = true;
        let response = h.pipeline.dispatch(request).await.unwrap();

        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
        assert!(h.transport.requests_to(REFRESH_PATH).is_empty());
        // Terminal 401 does not end the session
        assert_eq!(h.store.access_token().unwrap().as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn test_replay_unauthorized_does_not_refresh_again() {
        let h = harness(signed_in("abc", "r1"));
        h.transport.route("/budgets/1", StatusCode::UNAUTHORIZED, "");
        h.transport.route(
            REFRESH_PATH,
            StatusCode::OK,
            r#"{"success":true,"data":{"token":"abc2"}}"#,
        );
        h.transport.route("/budgets/1", StatusCode::UNAUTHORIZED, "still no");

        let response = h
            .pipeline
            .dispatch(RequestEnvelope::get("/budgets/1"))
            .await
            .unwrap();

        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
        assert_eq!(response.body, "still no");
        assert_eq!(h.transport.requests_to(REFRESH_PATH).len(), 1);
        assert_eq!(h.transport.requests_to("/budgets/1").len(), 2);
    }

    #[tokio::test]
    async fn test_transport_failure_is_not_retried() {
        let h = harness(signed_in("abc", "r1"));
        h.transport.route_network_failure("/forecasts");

        let outcome = h.pipeline.dispatch(RequestEnvelope::get("/forecasts")).await;

        assert!(matches!(outcome, Err(ApiError::NetworkError(_))));
        assert_eq!(h.transport.requests().len(), 1);
        assert_eq!(h.store.access_token().unwrap().as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn test_other_client_errors_pass_through() {
        let h = harness(signed_in("abc", "r1"));
        h.transport.route("/forecasts/9", StatusCode::NOT_FOUND, "nope");
        h.transport.route("/forecasts/9", StatusCode::FORBIDDEN, "no");

        let first = h
            .pipeline
            .dispatch(RequestEnvelope::get("/forecasts/9"))
            .await
            .unwrap();
        let second = h
            .pipeline
            .dispatch(RequestEnvelope::get("/forecasts/9"))
            .await
            .unwrap();

        assert_eq!(first.status, StatusCode::NOT_FOUND);
        assert_eq!(second.status, StatusCode::FORBIDDEN);
        assert!(h.transport.requests_to(REFRESH_PATH).is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_unauthorized_refresh_independently() {
        let h = harness(signed_in("abc", "r1"));
        h.transport.route("/forecasts", StatusCode::UNAUTHORIZED, "");
        h.transport.route("/forecasts", StatusCode::OK, "{}");
        h.transport.route("/budgets", StatusCode::UNAUTHORIZED, "");
        h.transport.route("/budgets", StatusCode::OK, "{}");
        h.transport.route(
            REFRESH_PATH,
            StatusCode::OK,
            r#"{"success":true,"data":{"token":"abc2"}}"#,
        );
        h.transport.route(
            REFRESH_PATH,
            StatusCode::OK,
            r#"{"success":true,"data":{"token":"abc3"}}"#,
        );

        let (a, b) = futures::join!(
            h.pipeline.dispatch(RequestEnvelope::get("/forecasts")),
            h.pipeline.dispatch(RequestEnvelope::get("/budgets")),
        );

        assert_eq!(a.unwrap().status, StatusCode::OK);
        assert_eq!(b.unwrap().status, StatusCode::OK);
        assert_eq!(h.transport.requests_to(REFRESH_PATH).len(), 2);
        // Last write wins
        assert_eq!(h.store.access_token().unwrap().as_deref(), Some("abc3"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_parallel_refresh_with_file_store_keeps_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FileSessionStore::new(dir.path().to_path_buf()));
        store.set_session(&Session::new("stale", "r1")).unwrap();

        let transport = Arc::new(ScriptedTransport::new());
        let (tx, mut events) = broadcast::channel(64);
        let pipeline = Arc::new(
            Pipeline::builder(transport.clone())
                .request_hook(BearerAuth::new(store.clone()))
                .response_hook(RefreshOnUnauthorized::new(store.clone(), tx, "/"))
                .build(),
        );

        for round in 0..10 {
            let mut handles = Vec::new();
            for i in 0..16 {
                let path = format!("/forecasts/{}/{}", round, i);
                transport.route(&path, StatusCode::UNAUTHORIZED, "");
                transport.route(&path, StatusCode::OK, "{}");
                transport.route(
                    REFRESH_PATH,
                    StatusCode::OK,
                    r#"{"success":true,"data":{"token":"fresh"}}"#,
                );
                let pipeline = pipeline.clone();
                handles.push(tokio::spawn(async move {
                    pipeline.dispatch(RequestEnvelope::get(path)).await
                }));
            }
            for handle in handles {
                let response = handle.await.unwrap().unwrap();
                assert_eq!(response.status, StatusCode::OK, "round {}", round);
            }
            while let Ok(event) = events.try_recv() {
                assert_eq!(event, SessionEvent::Refreshed, "round {}", round);
            }
            assert_eq!(store.refresh_token().unwrap().as_deref(), Some("r1"));
        }
    }
}
