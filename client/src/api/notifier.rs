//! User-facing side effects of the response pipeline.

use std::time::Duration;
use tracing::{error, info};

/// Receives the notifications the client raises on behalf of the user.
///
/// The client decides *what* to tell the user; implementors decide how it is
/// shown and how the login redirect is performed.
pub trait Notifier: Send + Sync {
    /// Shows an error message to the user.
    fn error(&self, message: &str);

    /// Sends the user back to the login screen once `after` has elapsed.
    fn redirect_to_login(&self, after: Duration);
}

/// Notifier that only writes to the tracing log.
#[derive(Debug, Default, Clone)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn error(&self, message: &str) {
        error!("{}", message);
    }

    fn redirect_to_login(&self, after: Duration) {
        info!("Login required, redirecting in {} ms", after.as_millis());
    }
}
