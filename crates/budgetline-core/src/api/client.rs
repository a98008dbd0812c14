//! API client for the budgeting backend.
//!
//! `ApiClient` owns the request pipeline, the session store it reads tokens
//! from, and the channel `SessionEvent`s are broadcast on.

use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info};

use super::auth::{BearerAuth, RefreshOnUnauthorized};
use super::pipeline::{HttpResponse, Pipeline, RequestEnvelope, Transport};
use super::transport::ReqwestTransport;
use super::{ApiError, ApiResponse};
use crate::auth::{Session, SessionEvent, SessionStore};
use crate::config::Config;
use crate::models::{LoginRequest, LoginResponse, RegisterRequest};

/// Capacity of the session event channel.
/// Events are rare; a slow subscriber only misses stale ones.
const EVENT_CHANNEL_CAPACITY: usize = 16;

const LOGIN_PATH: &str = "/auth/login";
const REGISTER_PATH: &str = "/auth/register";

/// Clone is cheap - the pipeline and store are shared.
#[derive(Clone)]
pub struct ApiClient {
    pipeline: Arc<Pipeline>,
    store: Arc<dyn SessionStore>,
    events: broadcast::Sender<SessionEvent>,
}

impl ApiClient {
    /// Create a client talking HTTP to `config.api_base_url`
    pub fn new(config: &Config, store: Arc<dyn SessionStore>) -> Result<Self, ApiError> {
        let transport = ReqwestTransport::new(
            config.api_base_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )?;
        Ok(Self::with_transport(
            Arc::new(transport),
            store,
            &config.sign_in_path,
        ))
    }

    /// Create a client over any transport, composing the credential hooks
    pub fn with_transport(
        transport: Arc<dyn Transport>,
        store: Arc<dyn SessionStore>,
        sign_in_path: &str,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let pipeline = Pipeline::builder(transport)
            .request_hook(BearerAuth::new(store.clone()))
            .response_hook(RefreshOnUnauthorized::new(
                store.clone(),
                events.clone(),
                sign_in_path,
            ))
            .build();

        Self {
            pipeline: Arc::new(pipeline),
            store,
            events,
        }
    }

    /// Subscribe to session lifecycle events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Send a request through the pipeline, returning the raw response.
    /// Non-success statuses are not errors here; a 401 has already been
    /// through refresh-and-replay.
    pub async fn send(&self, request: RequestEnvelope) -> Result<HttpResponse, ApiError> {
        self.pipeline.dispatch(request).await
    }

    // ===== Auth =====

    /// Sign in and persist the returned token pair
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, ApiError> {
        // Straight to the transport: stale credentials must not be attached
        // and a failed login must not trigger a refresh.
        let request =
            RequestEnvelope::post(LOGIN_PATH).with_json(&LoginRequest { email, password })?;
        let response = self.pipeline.transport().send(&request).await?;
        let response = Self::check_response(response)?;
        let login: LoginResponse = response.json()?;

        let session = Session::new(login.token, login.refresh_token);
        self.store.set_session(&session)?;
        info!(email = email, "Signed in");
        let _ = self.events.send(SessionEvent::SignedIn);
        Ok(session)
    }

    /// Forget both tokens
    pub fn logout(&self) -> Result<(), ApiError> {
        self.store.clear_session()?;
        info!("Signed out");
        let _ = self.events.send(SessionEvent::SignedOut);
        Ok(())
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<serde_json::Value, ApiError> {
        let request = RequestEnvelope::post(REGISTER_PATH).with_json(request)?;
        let response = self.pipeline.transport().send(&request).await?;
        let envelope: ApiResponse<serde_json::Value> = Self::check_response(response)?.json()?;
        envelope.into_result()
    }

    /// True when an access token is stored. Says nothing about whether the
    /// backend still accepts it.
    pub fn is_authenticated(&self) -> bool {
        matches!(self.store.access_token(), Ok(Some(_)))
    }

    // ===== Typed helpers =====

    fn check_response(response: HttpResponse) -> Result<HttpResponse, ApiError> {
        if response.status.is_success() {
            Ok(response)
        } else {
            Err(ApiError::from_status(response.status, &response.body))
        }
    }

    async fn fetch(&self, request: RequestEnvelope) -> Result<HttpResponse, ApiError> {
        debug!(method = %request.method, path = %request.path, "API request");
        let response = self.send(request).await?;
        Self::check_response(response)
    }

    pub(crate) async fn request<T: DeserializeOwned>(
        &self,
        request: RequestEnvelope,
    ) -> Result<T, ApiError> {
        let envelope: ApiResponse<T> = self.fetch(request).await?.json()?;
        envelope.into_result()
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(RequestEnvelope::get(path)).await
    }

    pub(crate) async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        key: &str,
        value: &str,
    ) -> Result<T, ApiError> {
        self.request(RequestEnvelope::get(path).with_query(key, value))
            .await
    }

    pub(crate) async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.request(RequestEnvelope::post(path).with_json(body)?)
            .await
    }

    pub(crate) async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.request(RequestEnvelope::put(path).with_json(body)?)
            .await
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let envelope: ApiResponse<serde_json::Value> =
            self.fetch(RequestEnvelope::delete(path)).await?.json()?;
        envelope.into_unit()
    }
}
