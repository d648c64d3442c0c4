use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;
use crate::state::AppState;

/// Fallback endpoint server.
pub struct RosterServer {
    config: ServerConfig,
    state: AppState,
}

impl RosterServer {
    /// Open the configured storage. Fails if the data directory cannot be
    /// created.
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        let state = match &config.data_dir {
            Some(dir) => AppState::on_disk(dir)?,
            None => AppState::in_memory(),
        };
        Ok(Self { config, state })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.state.clone(), self.config.max_body_bytes)
    }

    /// Serve until Ctrl-C.
    pub async fn serve(self) -> ServerResult<()> {
        let app = self.router();
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!(
            addr = %self.config.bind_addr,
            persistent = self.config.data_dir.is_some(),
            "roster server listening"
        );
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                tracing::info!("shutting down");
            })
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}
