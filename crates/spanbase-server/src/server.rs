use std::sync::Arc;

use spanbase_store::{SpanStore, SqliteSpanStore};
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;
use crate::state::AppState;

/// Spanbase HTTP server.
pub struct SpanbaseServer {
    config: ServerConfig,
    store: Arc<dyn SpanStore>,
}

impl SpanbaseServer {
    pub fn new(config: ServerConfig, store: Arc<dyn SpanStore>) -> Self {
        Self { config, store }
    }

    /// Open the SQLite store named in `config.store` and wrap it in a server.
    pub fn open(config: ServerConfig) -> ServerResult<Self> {
        let store = SqliteSpanStore::open(config.store.clone())?;
        Ok(Self::new(config, Arc::new(store)))
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        let state = AppState::new(Arc::clone(&self.store), self.config.store.list_limit);
        build_router(state, self.config.max_upload_size)
    }

    /// Start serving requests.
    pub async fn serve(self) -> ServerResult<()> {
        let app = self.router();
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!("Spanbase server listening on {}", self.config.bind_addr);
        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}
