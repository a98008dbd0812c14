//! Request pipeline: ordered request hooks, a transport, ordered response hooks.
//!
//! `Pipeline::dispatch` is the single path every API call takes. Request
//! hooks mutate the outgoing `RequestEnvelope` (credentials, headers);
//! response hooks see the transport outcome and may substitute it, including
//! by replaying the request through the same pipeline.

use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use reqwest::header::{HeaderMap, AUTHORIZATION};
use reqwest::{Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};

use super::ApiError;

/// What the transport produced: a response of any status, or a failure
/// before one arrived.
pub type Outcome = Result<HttpResponse, ApiError>;

/// An outgoing request, relative to the transport's base URL.
#[derive(Debug, Clone)]
pub struct RequestEnvelope {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: HeaderMap,
    pub body: Option<serde_json::Value>,
    /// Set once a refresh-and-replay has happened for this request
    pub retried: bool,
}

impl RequestEnvelope {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
            retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::InvalidRequest(format!("Failed to serialize body: {}", e)))?;
        self.body = Some(value);
        Ok(self)
    }

    /// The bearer token currently attached, if any
    pub fn bearer_token(&self) -> Option<&str> {
        self.headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
    }
}

/// A fully-read HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == StatusCode::UNAUTHORIZED
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_str(&self.body)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse JSON body: {}", e)))
    }
}

/// Moves a request over the wire.
///
/// Any HTTP status is `Ok`; `Err` is reserved for failures before a response
/// was received (connect, timeout, reading the body).
pub trait Transport: Send + Sync {
    fn send<'a>(&'a self, request: &'a RequestEnvelope) -> BoxFuture<'a, Outcome>;
}

/// Runs before transmission, in registration order.
pub trait RequestHook: Send + Sync {
    fn on_request(&self, request: &mut RequestEnvelope) -> Result<(), ApiError>;
}

/// Runs over the transport outcome, in registration order.
///
/// A hook that replays `request` through `pipeline.dispatch` returns the
/// replay's outcome, which has already been through every response hook.
pub trait ResponseHook: Send + Sync {
    fn on_response<'a>(
        &'a self,
        pipeline: &'a Pipeline,
        request: &'a RequestEnvelope,
        outcome: Outcome,
    ) -> BoxFuture<'a, Outcome>;
}

pub struct Pipeline {
    transport: Arc<dyn Transport>,
    request_hooks: Vec<Arc<dyn RequestHook>>,
    response_hooks: Vec<Arc<dyn ResponseHook>>,
}

impl Pipeline {
    pub fn builder(transport: Arc<dyn Transport>) -> PipelineBuilder {
        PipelineBuilder {
            transport,
            request_hooks: Vec::new(),
            response_hooks: Vec::new(),
        }
    }

    /// The bare transport, for calls that must bypass the hooks
    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    pub fn dispatch(&self, mut request: RequestEnvelope) -> BoxFuture<'_, Outcome> {
        async move {
            for hook in &self.request_hooks {
                hook.on_request(&mut request)?;
            }

            let mut outcome = self.transport.send(&request).await;

            for hook in &self.response_hooks {
                outcome = hook.on_response(self, &request, outcome).await;
            }
            outcome
        }
        .boxed()
    }
}

pub struct PipelineBuilder {
    transport: Arc<dyn Transport>,
    request_hooks: Vec<Arc<dyn RequestHook>>,
    response_hooks: Vec<Arc<dyn ResponseHook>>,
}

impl PipelineBuilder {
    pub fn request_hook(mut self, hook: impl RequestHook + 'static) -> Self {
        self.request_hooks.push(Arc::new(hook));
        self
    }

    pub fn response_hook(mut self, hook: impl ResponseHook + 'static) -> Self {
        self.response_hooks.push(Arc::new(hook));
        self
    }

    pub fn build(self) -> Pipeline {
        Pipeline {
            transport: self.transport,
            request_hooks: self.request_hooks,
            response_hooks: self.response_hooks,
        }
    }
}
