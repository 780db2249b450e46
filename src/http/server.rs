//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the catch-all mock handler
//! - Wire up middleware (request ID, tracing, timeout)
//! - Serve every configured port, with TLS where requested
//! - Drain all ports together on shutdown
//! - Dispatch requests to the rule engine and render the result

use std::net::SocketAddr;
use std::path::Path;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
    Router,
};
use axum_server::Handle;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::{JoinError, JoinSet};
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{PortConfig, ServerConfig};
use crate::http::request::{MakeRequestUuid, RequestTarget, X_REQUEST_ID};
use crate::http::response::{internal_error_response, render};
use crate::net::tls::{load_tls_config, TlsError};
use crate::observability::metrics;
use crate::rules::Resolver;

/// Error type for serving.
#[derive(Debug, Error)]
pub enum ServeError {
    #[error("TLS setup failed for port {port}: {source}")]
    Tls {
        port: u16,
        #[source]
        source: TlsError,
    },

    #[error("Server on port {port} failed: {source}")]
    Serve {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("Server task failed: {0}")]
    Task(#[from] JoinError),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub resolver: Resolver,
}

/// The mock HTTP server.
pub struct MockServer {
    router: Router,
    config: ServerConfig,
}

impl MockServer {
    /// Create a new server answering from `resolver`.
    pub fn new(config: ServerConfig, resolver: Resolver) -> Self {
        let state = AppState { resolver };
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServerConfig, state: AppState) -> Router {
        Router::new()
            .fallback(mock_handler)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get(X_REQUEST_ID)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");
                tracing::info_span!(
                    "request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }))
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The router, for serving on a custom listener or testing in-process.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Serve every configured port until `shutdown` fires or a port fails.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) -> Result<(), ServeError> {
        let grace = Duration::from_secs(self.config.timeouts.shutdown_secs);
        let mut handles = Vec::with_capacity(self.config.ports.len());
        let mut servers = JoinSet::new();

        for port in &self.config.ports {
            let handle = Handle::new();
            handles.push(handle.clone());
            let tls = if port.https {
                let tls = load_tls_config(Path::new(&port.cert), Path::new(&port.key))
                    .await
                    .map_err(|source| ServeError::Tls {
                        port: port.port,
                        source,
                    });
                match tls {
                    Ok(tls) => Some(tls),
                    Err(e) => {
                        shutdown_all(&handles, grace);
                        return Err(e);
                    }
                }
            } else {
                None
            };
            servers.spawn(serve_port(port.clone(), tls, self.router.clone(), handle));
        }

        let mut first_error = None;
        tokio::select! {
            _ = shutdown.recv() => {
                tracing::info!("Shutdown signal received, draining connections");
            }
            Some(result) = servers.join_next() => {
                first_error = flatten(result).err();
                tracing::warn!("A listener stopped unexpectedly, shutting down the others");
            }
        }
        shutdown_all(&handles, grace);

        while let Some(result) = servers.join_next().await {
            if let Err(e) = flatten(result) {
                tracing::error!(error = %e, "Server stopped with error");
                first_error.get_or_insert(e);
            }
        }

        tracing::info!("All servers stopped");
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

fn flatten(result: Result<Result<(), ServeError>, JoinError>) -> Result<(), ServeError> {
    result?
}

fn shutdown_all(handles: &[Handle], grace: Duration) {
    for handle in handles {
        handle.graceful_shutdown(Some(grace));
    }
}

async fn serve_port(
    port: PortConfig,
    tls: Option<axum_server::tls_rustls::RustlsConfig>,
    app: Router,
    handle: Handle,
) -> Result<(), ServeError> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port.port));
    let serve_err = |source| ServeError::Serve {
        port: port.port,
        source,
    };

    match tls {
        Some(tls) => {
            tracing::info!(port = port.port, "Starting HTTPS server");
            axum_server::bind_rustls(addr, tls)
                .handle(handle)
                .serve(app.into_make_service())
                .await
                .map_err(serve_err)
        }
        None => {
            tracing::info!(port = port.port, "Starting HTTP server");
            axum_server::bind(addr)
                .handle(handle)
                .serve(app.into_make_service())
                .await
                .map_err(serve_err)
        }
    }
}

/// Catch-all handler: resolve the request against the rules and render it.
async fn mock_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let target = RequestTarget::from_request(&request);

    tracing::info!(
        host = %target.host,
        method = %target.method,
        path = %target.raw_path,
        query = target.query.as_deref().unwrap_or(""),
        "Request received"
    );

    let resolver = state.resolver.clone();
    let lookup = target.clone();
    let resolved = tokio::task::spawn_blocking(move || resolver.resolve(&lookup.view())).await;

    let response = match resolved {
        Ok(Ok(template)) => render(&template).await,
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Failed to resolve response");
            internal_error_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Rule lookup task failed");
            internal_error_response()
        }
    };

    tracing::info!(status = response.status().as_u16(), "Response sent");
    metrics::record_request(&target.method, response.status().as_u16(), start_time);
    response
}
