mod handlers;
mod middleware;
mod params;
pub mod response;
pub mod shaping;

use axum::middleware::from_fn_with_state;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tracing::Span;

use crate::store::BalanceQuery;
use crate::store::BalanceStorage;
use crate::store::StoreError;
use crate::types::BalanceRecord;

pub use middleware::install_panic_hook;

/// State shared by all request handlers.
#[derive(Clone)]
pub struct AppState {
    storage: Arc<dyn BalanceStorage>,
    /// Max duration of a storage query, including wait for a connection.
    timeout: Option<Duration>,
    /// Logging context of handlers
    span: Span,
}

impl AppState {
    pub fn new(storage: Arc<dyn BalanceStorage>, timeout: Option<Duration>, span: Span) -> Self {
        Self {
            storage,
            timeout,
            span,
        }
    }

    /// Run `query` against storage, within the configured timeout.
    ///
    /// Dropping the storage future on expiry cancels the query and releases
    /// the connection.
    async fn fetch(&self, query: &BalanceQuery) -> Result<Vec<BalanceRecord>, StoreError> {
        match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.storage.balance_updates(query))
                .await
                .map_err(|_| StoreError::Timeout(timeout))?,
            None => self.storage.balance_updates(query).await,
        }
    }
}

/// Build the api router.
///
/// * `log_http`: log every request
pub fn router(state: AppState, log_http: bool) -> Router {
    let mut router = Router::new()
        .route(
            "/balances/:pkh",
            get(handlers::get_balances).fallback(handlers::endpoint_not_found),
        )
        .fallback(handlers::endpoint_not_found)
        .with_state(state.clone());
    if log_http {
        router = router.layer(middleware::trace_layer());
    }
    router
        .layer(middleware::catch_panic_layer())
        .layer(from_fn_with_state(state, middleware::request_span))
}
