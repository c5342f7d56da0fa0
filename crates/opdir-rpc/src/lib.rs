//! JSON-RPC 2.0 server for an authoritative [`RecordLog`].
//!
//! A single route, `POST /jsonrpc`, serves:
//!
//! - `getRecords {after}` → `{records: [...]}` (the full chain when `after`
//!   is empty or unknown)
//! - `getTip {}` → the tip record or `null`
//! - `submitRecords {records}` → `"ok"`
//!
//! Log calls run on the blocking pool; the log's datastore I/O and
//! verification are synchronous.

mod error;
mod handlers;


use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::post;
use opdir_log::RecordLog;

pub use error::RpcError;

/// Largest accepted request body.
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

#[derive(Clone)]
pub(crate) struct AppState {
    pub log: Arc<RecordLog>,
}

/// HTTP server exposing a [`RecordLog`] over JSON-RPC.
pub struct RpcServer {
    router: Router,
}

impl RpcServer {
    pub fn new(log: Arc<RecordLog>) -> Self {
        let router = Self::build_router(AppState { log });
        Self { router }
    }

    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/jsonrpc", post(handlers::jsonrpc))
            .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
            .with_state(state)
    }

    /// Return the inner [`Router`] (useful for testing with `tower::ServiceExt`).
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Serve on the given TCP address.
    pub async fn serve(self, addr: &str) -> Result<(), std::io::Error> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!(addr, "JSON-RPC server listening");
        axum::serve(listener, self.router).await
    }

    /// Serve on an already bound listener until `shutdown` completes.
    pub async fn serve_with_shutdown(
        self,
        listener: tokio::net::TcpListener,
        shutdown: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> Result<(), std::io::Error> {
        if let Ok(addr) = listener.local_addr() {
            tracing::info!(%addr, "JSON-RPC server listening");
        }
        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await
    }
}
