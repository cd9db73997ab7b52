pub mod admission_request;
pub mod admission_response;
pub mod api;
mod certs;
pub mod cli;
pub mod config;
pub mod errors;
pub mod mutator;
pub mod tracing;

#[cfg(test)]
mod test_utils;

use ::tracing::{info, warn};
use anyhow::Result;
use axum::{
    Router,
    routing::{get, post},
};
use axum_server::{Handle, tls_rustls::RustlsConfig};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tower_http::trace::{self, TraceLayer};

use crate::api::{
    handlers::{mutate_handler, readiness_handler},
    state::ApiServerState,
};
use crate::config::{Config, MUTATE_PATH};
use crate::mutator::{HostAliasMutator, JsonDecoder};

/// In-flight requests are given this long to complete once a shutdown signal is received
const GRACEFUL_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

pub struct WebhookServer {
    router: Router,
    addr: SocketAddr,
    tls_config: Option<RustlsConfig>,
}

impl WebhookServer {
    pub async fn new_from_config(config: Config) -> Result<Self> {
        let state = Arc::new(ApiServerState {
            mutator: HostAliasMutator::new(JsonDecoder::new()),
        });

        let tls_config = match &config.tls_config {
            Some(tls_config) => Some(certs::create_tls_config(tls_config).await?),
            None => None,
        };

        let router = Router::new()
            .route(MUTATE_PATH, post(mutate_handler))
            .route("/readiness", get(readiness_handler))
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(trace::DefaultMakeSpan::new().level(::tracing::Level::DEBUG)),
            )
            .with_state(state);

        Ok(Self {
            router,
            addr: config.addr,
            tls_config,
        })
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve requests until SIGINT or SIGTERM is received.
    pub async fn run(self) -> Result<()> {
        let handle = Handle::new();
        tokio::spawn(shutdown_on_signal(handle.clone()));

        match self.tls_config {
            None => {
                info!(address = self.addr.to_string().as_str(), "started HTTP server");
                axum_server::bind(self.addr)
                    .handle(handle)
                    .serve(self.router.into_make_service())
                    .await?;
            }
            Some(tls_config) => {
                info!(address = self.addr.to_string().as_str(), "started HTTPS server");
                axum_server::bind_rustls(self.addr, tls_config)
                    .handle(handle)
                    .serve(self.router.into_make_service())
                    .await?;
            }
        }

        info!("server stopped");
        Ok(())
    }
}

/// Log the build information, useful when triaging issues
pub fn log_version() {
    info!(
        version = clap::crate_version!(),
        git_commit = cli::git_commit(),
        git_branch = cli::git_branch(),
        os = std::env::consts::OS,
        arch = std::env::consts::ARCH,
        "{}",
        config::SERVICE_NAME
    );
}

async fn shutdown_on_signal(handle: Handle) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = e.to_string().as_str(), "cannot listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = e.to_string().as_str(), "cannot listen for SIGTERM");
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

    info!("shutdown signal received, draining connections");
    handle.graceful_shutdown(Some(GRACEFUL_SHUTDOWN_TIMEOUT));
}
