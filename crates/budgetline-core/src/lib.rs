//! budgetline core - authenticated client for the budgeting REST API.
//!
//! The crate is organised around a single request pipeline:
//!
//! - [`auth`]: session stores holding the access/refresh token pair, and the
//!   session events broadcast to the hosting application
//! - [`api`]: the hook-based pipeline with transparent token refresh, the
//!   typed `ApiClient`, and the resource services built on top of it
//! - [`models`]: forecasts, budgets, categories, subcategories, expenses
//! - [`config`]: base URL, sign-in path, timeouts, session backend

pub mod api;
pub mod auth;
pub mod config;
pub mod models;

pub use api::{ApiClient, ApiError, ApiResponse};
pub use auth::{Session, SessionEvent, SessionStore};
pub use config::Config;
