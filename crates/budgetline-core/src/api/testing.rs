//! In-memory transport for exercising the pipeline without a server.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use futures::future::{BoxFuture, FutureExt};
use reqwest::StatusCode;

use super::pipeline::{HttpResponse, Outcome, RequestEnvelope, Transport};
use super::ApiError;

enum Scripted {
    Response(HttpResponse),
    NetworkFailure,
}

/// Answers from per-path queues (falling back to a shared queue) and
/// records every request it was handed, headers as sent.
#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<HashMap<String, VecDeque<Scripted>>>,
    fallback: Mutex<VecDeque<Scripted>>,
    sent: Mutex<Vec<RequestEnvelope>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_response(&self, status: StatusCode, body: &str) {
        self.fallback
            .lock()
            .unwrap()
            .push_back(Scripted::Response(HttpResponse::new(status, body)));
    }

    pub fn route(&self, path: &str, status: StatusCode, body: &str) {
        self.routes
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(Scripted::Response(HttpResponse::new(status, body)));
    }

    pub fn route_network_failure(&self, path: &str) {
        self.routes
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(Scripted::NetworkFailure);
    }

    pub fn requests(&self) -> Vec<RequestEnvelope> {
        self.sent.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<RequestEnvelope> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }

    fn next(&self, path: &str) -> Option<Scripted> {
        let routed = self
            .routes
            .lock()
            .unwrap()
            .get_mut(path)
            .and_then(|q| q.pop_front());
        routed.or_else(|| self.fallback.lock().unwrap().pop_front())
    }
}

/// A genuine `reqwest::Error`, produced without touching the network.
pub fn network_error() -> reqwest::Error {
    reqwest::Client::new()
        .get("http://")
        .build()
        .expect_err("empty host must not parse")
}

impl Transport for ScriptedTransport {
    fn send<'a>(&'a self, request: &'a RequestEnvelope) -> BoxFuture<'a, Outcome> {
        async move {
            self.sent.lock().unwrap().push(request.clone());
            // Give concurrently dispatched requests a chance to interleave
            tokio::task::yield_now().await;
            match self.next(&request.path) {
                Some(Scripted::Response(response)) => Ok(response),
                Some(Scripted::NetworkFailure) => Err(ApiError::NetworkError(network_error())),
                None => Err(ApiError::InvalidResponse(format!(
                    "no scripted response for {}",
                    request.path
                ))),
            }
        }
        .boxed()
    }
}
