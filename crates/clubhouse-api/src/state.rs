use std::sync::Arc;

use tracing::error;

use clubhouse_db::{Database, StoreResult};
use clubhouse_types::{PrincipalKind, PrincipalRef};

use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
}

impl AppStateInner {
    pub fn new(db: Database) -> AppState {
        Arc::new(Self { db })
    }
}

/// Run a store call off the async runtime. SQLite calls block, so every
/// handler goes through here.
pub async fn run_blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> StoreResult<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(e.to_string())
        })?
        .map_err(ApiError::from)
}

/// Build a principal from a `kind` path/query segment and an id.
pub fn principal(kind: &str, id: i64) -> Result<PrincipalRef, ApiError> {
    let kind: PrincipalKind = kind.parse()?;
    Ok(PrincipalRef { kind, id })
}
