//! Gateway server

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

use super::router::{AppState, create_router};
use crate::config::Config;
use crate::controller::{Controllers, MemoryControllers};
use crate::{Error, Result};

/// Admin HTTP gateway
pub struct Gateway {
    /// Configuration
    config: Config,
    /// Shared application state
    state: Arc<AppState>,
}

impl Gateway {
    /// Create a gateway over the in-memory controllers
    pub fn new(config: Config) -> Result<Self> {
        let controllers = MemoryControllers::new(config.catalogue.clone())
            .with_max_queue(config.admin.max_queue);
        let controllers = Arc::new(controllers);
        Self::with_controllers(config, controllers)
    }

    /// Create a gateway over the given controllers
    pub fn with_controllers(config: Config, controllers: Arc<dyn Controllers>) -> Result<Self> {
        let state = Arc::new(AppState::new(&config.admin, controllers)?);
        Ok(Self { config, state })
    }

    /// Run the gateway until Ctrl-C or SIGTERM
    pub async fn run(self) -> Result<()> {
        let addr = SocketAddr::new(
            self.config
                .server
                .host
                .parse()
                .map_err(|e| Error::Config(format!("Invalid host: {e}")))?,
            self.config.server.port,
        );

        let app = create_router(Arc::clone(&self.state))
            .layer(DefaultBodyLimit::max(self.config.server.max_body_size));

        let listener = TcpListener::bind(addr).await?;

        info!("============================================================");
        info!("BGMI ADMIN v{}", env!("CARGO_PKG_VERSION"));
        info!("============================================================");
        info!(host = %self.config.server.host, port = %self.config.server.port, "Listening");
        info!(
            get = ?self.state.registry.get_actions(),
            post = ?self.state.registry.post_actions(),
            "Actions registered"
        );
        info!("  /api/{{action}}  (admin API)");
        info!("  /admin/{{path}}  (admin UI)");

        if self.state.dev_mode {
            warn!(
                path = %self.state.admin_path.display(),
                "DEVELOPMENT mode - serving admin UI from disk with CORS enabled"
            );
        } else {
            info!(
                path = %self.state.admin_path.display(),
                "Admin UI expected behind a reverse proxy"
            );
        }
        info!("============================================================");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| Error::Internal(e.to_string()))?;

        Ok(())
    }
}

/// Shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
}
