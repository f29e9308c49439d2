use std::sync::Arc;

use bookeasy_db::Database;
use bookeasy_mail::Mailer;

use crate::cars::Catalog;
use crate::error::{ApiError, internal};
use crate::storage::Storage;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub mailer: Arc<dyn Mailer>,
    pub uploads: Storage,
    pub catalog: Catalog,
    /// Base URL placed in confirmation links.
    pub public_url: String,
    /// Recipient of support form submissions.
    pub support_mailbox: String,
}

/// Runs a blocking DB call off the async runtime.
pub async fn run_db<F, T>(state: &AppState, f: F) -> anyhow::Result<T>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))?
}

/// [`run_db`] with the failure already mapped to a 500.
pub async fn query<F, T>(state: &AppState, public: &'static str, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    run_db(state, f).await.map_err(internal(public))
}
