//! REST API client module for the budgeting backend.
//!
//! Every call goes through a `Pipeline`: `BearerAuth` attaches the stored
//! access token, the transport sends it, and `RefreshOnUnauthorized` turns a
//! single 401 into refresh-and-replay. `ApiClient` layers typed helpers and
//! the resource services (forecasts, budgets, categories, subcategories,
//! expenses, users) over that pipeline.

pub mod auth;
pub mod client;
pub mod envelope;
pub mod error;
pub mod pipeline;
pub mod resources;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use auth::{BearerAuth, RefreshOnUnauthorized, REFRESH_PATH};
pub use client::ApiClient;
pub use envelope::ApiResponse;
pub use error::{ApiError, RefreshError};
pub use pipeline::{
    HttpResponse, Outcome, Pipeline, PipelineBuilder, RequestEnvelope, RequestHook, ResponseHook,
    Transport,
};
pub use transport::ReqwestTransport;
