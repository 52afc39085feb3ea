//! Client library for the task manager REST backend.
//!
//! One [`ApiClient`] per application carries the interceptor pipeline and
//! token refresh protocol; the domain services and [`AuthService`] all share
//! it through `Arc`, together with the persisted [`SessionStore`].

pub mod api;
pub mod auth;
pub mod config;
pub mod errors;
pub mod models;
pub mod services;
pub mod session;

pub use api::{ApiClient, ApiRequest, ApiResponse, Notifier, TracingNotifier};
pub use auth::AuthService;
pub use config::ClientConfig;
pub use errors::{ApiError, ApiResult};
pub use session::{FileStorage, MemoryStorage, Session, SessionStore, Storage};
