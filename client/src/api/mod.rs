pub mod client;
pub mod common;
pub mod notifier;
pub mod refresh;
pub mod transport;

pub use client::{ApiClient, ApiRequest};
pub use common::{ApiResponse, Page, PageRequest, SortDirection};
pub use notifier::{Notifier, TracingNotifier};
