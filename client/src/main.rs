//! Command-line dashboard for the task manager backend.
//!
//! Logs in with `TASK_USERNAME` / `TASK_PASSWORD` unless a stored session is
//! still valid, then prints the dashboard summary as JSON.

use anyhow::{Context, Result};
use std::env;
use std::sync::Arc;
use task_manager_client::services::{DashboardService, NotificationService};
use task_manager_client::{
    ApiClient, AuthService, ClientConfig, FileStorage, MemoryStorage, SessionStore, Storage,
    TracingNotifier,
};
use tracing::info;
use tracing_subscriber::fmt::init;

#[tokio::main]
async fn main() -> Result<()> {
    init();

    let config = ClientConfig::from_env()?;

    let storage: Arc<dyn Storage> = match &config.storage_path {
        Some(path) => Arc::new(FileStorage::open(path)?),
        None => Arc::new(MemoryStorage::new()),
    };
    let session = Arc::new(SessionStore::new(storage));
    let client = Arc::new(ApiClient::new(
        config.clone(),
        session,
        Arc::new(TracingNotifier),
    )?);
    let auth = AuthService::new(client.clone());

    if auth.is_authenticated() {
        info!("Reusing stored session");
    } else {
        let username = env::var("TASK_USERNAME").context("TASK_USERNAME must be set")?;
        let password = env::var("TASK_PASSWORD").context("TASK_PASSWORD must be set")?;
        auth.login(&username, &password).await?;
    }

    let summary = DashboardService::new(client.clone()).load_summary().await?;
    let unread = NotificationService::new(client).get_unread_count().await;

    info!(
        "Connected to {}: {} unread notification(s)",
        config.base_url, unread
    );
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
