pub mod claims;
pub mod models;
pub mod service;

pub use service::AuthService;
