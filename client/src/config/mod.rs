//! Central module for client-wide configuration settings.
//!
//! This module handles loading the backend base URL, request timeout, the
//! optional on-disk session storage path and the login redirect delay.

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Default backend location used when `TASK_API_URL` is not set.
pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub storage_path: Option<PathBuf>,
    pub login_redirect_delay: Duration,
}

impl ClientConfig {
    /// Creates a configuration for the given backend with default settings.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(10),
            storage_path: None,
            login_redirect_delay: Duration::from_millis(1000),
        }
    }

    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let base_url = env::var("TASK_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let timeout_seconds = env::var("TASK_API_TIMEOUT_SECONDS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u64>()
            .context("TASK_API_TIMEOUT_SECONDS must be a valid number")?;

        let redirect_delay_ms = env::var("TASK_LOGIN_REDIRECT_DELAY_MS")
            .unwrap_or_else(|_| "1000".to_string())
            .parse::<u64>()
            .context("TASK_LOGIN_REDIRECT_DELAY_MS must be a valid number")?;

        let storage_path = env::var("TASK_STORAGE_PATH").ok().map(PathBuf::from);

        Ok(Self::new(base_url)
            .with_timeout(Duration::from_secs(timeout_seconds))
            .with_login_redirect_delay(Duration::from_millis(redirect_delay_ms))
            .with_storage_path(storage_path))
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_login_redirect_delay(mut self, delay: Duration) -> Self {
        self.login_redirect_delay = delay;
        self
    }

    #[must_use]
    pub fn with_storage_path(mut self, path: Option<PathBuf>) -> Self {
        self.storage_path = path;
        self
    }

    /// Joins an endpoint path onto the base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joining() {
        let config = ClientConfig::new("http://localhost:8080/api/");
        assert_eq!(config.base_url, "http://localhost:8080/api");
        assert_eq!(config.endpoint("/tasks/1"), "http://localhost:8080/api/tasks/1");
        assert_eq!(config.endpoint("tags"), "http://localhost:8080/api/tags");
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.login_redirect_delay, Duration::from_millis(1000));
        assert!(config.storage_path.is_none());
    }
}
