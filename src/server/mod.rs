//! HTTP server: upload page, results page and a JSON API.
//!
//! | Route | Method | Response |
//! |-------|--------|----------|
//! | `/` | GET | upload page |
//! | `/convert` | POST multipart | HTML results, one preview per file |
//! | `/api/convert` | POST multipart | JSON [`crate::BatchReport`] |
//! | `/api/export` | POST multipart | `application/zip` of every success |
//! | `/health` | GET | `{ status, engine, version }` |
//!
//! # Example
//!
//! ```rust,no_run
//! use docreader::server::{serve, ServerConfig};
//! use docreader::{Converter, ReaderConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let converter = Converter::new(ReaderConfig::default())?;
//! serve(converter, &ServerConfig::default()).await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod page;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;

use crate::convert::Converter;
use axum::extract::DefaultBodyLimit;
use axum::Router;
use std::net::SocketAddr;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Listener and request limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Largest accepted request body, across all files of one upload.
    pub max_request_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            max_request_bytes: 512 * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

/// Create the server with all routes and middleware.
pub fn create_server(state: AppState, config: &ServerConfig) -> Router {
    create_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(DefaultBodyLimit::disable())
            .layer(RequestBodyLimitLayer::new(config.max_request_bytes)),
    )
}

/// Bind and serve until Ctrl+C / SIGTERM.
pub async fn serve(converter: Converter, config: &ServerConfig) -> std::io::Result<()> {
    let addr = config
        .addr()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
    let app = create_server(AppState::new(converter), config);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Starting docreader on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_signal().await;
            info!("Shutdown signal received");
        })
        .await?;

    info!("Server stopped cleanly");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = ServerConfig::default();
        assert_eq!(c.port, 8080);
        assert_eq!(c.max_request_bytes, 512 * 1024 * 1024);
        assert_eq!(c.addr().unwrap().to_string(), "127.0.0.1:8080");
    }

    #[test]
    fn bad_host_is_an_error() {
        let c = ServerConfig {
            host: "not a host".into(),
            ..ServerConfig::default()
        };
        assert!(c.addr().is_err());
    }
}
