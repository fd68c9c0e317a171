//! HTTP surface of the sync server.

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::handler::{HandlerContext, RequestHandler};
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use std::future::Future;
use std::sync::Arc;
use tillsync_store::{ModelRegistry, Store};
use tillsync_sync_protocol::{
    PingResponse, PullRequest, PullResponse, PushPayload, PushResponse, StatusResponse,
    AUTHORIZATION_HEADER, EDGE_TOKEN_HEADER, PING_PATH, PULL_PATH, PUSH_PATH, STATUS_PATH,
};
use tokio::net::TcpListener;
use tracing::{info, warn};

/// The Cloud sync server.
///
/// Owns the Cloud store and serves the push, pull, ping and status
/// endpoints over HTTP.
///
/// # Example
///
/// ```
/// use tillsync_sync_server::{ServerConfig, SyncServer};
///
/// let server = SyncServer::in_memory(ServerConfig::default().with_token("secret")).unwrap();
/// let status = server.handler().handle_status();
/// assert!(status.models_available.iter().any(|m| m == "Order"));
/// ```
pub struct SyncServer {
    handler: RequestHandler,
}

impl SyncServer {
    /// Opens the store at `config.database_path` and builds the server.
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        let store = Store::open(&config.database_path)?;
        Ok(Self::with_store(config, Arc::new(store)))
    }

    /// Builds a server over a fresh in-memory store.
    pub fn in_memory(config: ServerConfig) -> ServerResult<Self> {
        Ok(Self::with_store(config, Arc::new(Store::open_in_memory()?)))
    }

    /// Builds a server over an existing store.
    pub fn with_store(config: ServerConfig, store: Arc<Store>) -> Self {
        let context = Arc::new(HandlerContext::new(
            config,
            store,
            ModelRegistry::with_defaults(),
        ));
        Self {
            handler: RequestHandler::new(context),
        }
    }

    /// Returns the request handler.
    pub fn handler(&self) -> &RequestHandler {
        &self.handler
    }

    /// Returns the axum router for the sync endpoints.
    pub fn router(&self) -> Router {
        router(self.handler.clone())
    }

    /// Binds `config.bind_addr` and serves until `shutdown` resolves.
    pub async fn serve<F>(self, shutdown: F) -> ServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.handler.context().config.bind_addr).await?;
        self.serve_on(listener, shutdown).await
    }

    /// Serves on an already bound listener until `shutdown` resolves.
    pub async fn serve_on<F>(self, listener: TcpListener, shutdown: F) -> ServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let context = self.handler.context();
        if context.config.token.is_none() {
            warn!("no sync token configured, every authenticated request will be denied");
        }
        info!(
            addr = %listener.local_addr()?,
            database = %context.config.database_path.display(),
            "sync server listening"
        );

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;
        info!("sync server stopped");
        Ok(())
    }
}

/// Builds the router for `handler`.
pub fn router(handler: RequestHandler) -> Router {
    Router::new()
        .route(PUSH_PATH, post(push))
        .route(PULL_PATH, get(pull))
        .route(PING_PATH, get(ping))
        .route(STATUS_PATH, get(status))
        .with_state(handler)
}

#[derive(Debug, Deserialize)]
struct PullParams {
    model: Option<String>,
    since: Option<String>,
}

fn authorize(handler: &RequestHandler, headers: &HeaderMap) -> ServerResult<()> {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
    handler.authorize(header(EDGE_TOKEN_HEADER), header(AUTHORIZATION_HEADER))
}

/// Runs store work off the async executor.
async fn blocking<T, F>(f: F) -> ServerResult<T>
where
    F: FnOnce() -> ServerResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ServerError::Internal(format!("handler task failed: {e}")))?
}

async fn push(
    State(handler): State<RequestHandler>,
    headers: HeaderMap,
    body: Bytes,
) -> ServerResult<Json<PushResponse>> {
    authorize(&handler, &headers)?;
    let payload: PushPayload = serde_json::from_slice(&body)
        .map_err(|e| ServerError::InvalidRequest(format!("malformed push body: {e}")))?;
    let response = blocking(move || handler.handle_push(payload)).await?;
    Ok(Json(response))
}

async fn pull(
    State(handler): State<RequestHandler>,
    headers: HeaderMap,
    Query(params): Query<PullParams>,
) -> ServerResult<Json<PullResponse>> {
    authorize(&handler, &headers)?;
    let model = params.model.unwrap_or_default();
    let request = match PullRequest::from_query(&model, params.since.as_deref()) {
        Ok(request) => request,
        Err(err) => {
            warn!(model = %model, error = %err, "ignoring unparseable since");
            PullRequest::new(model, None)
        }
    };
    let response = blocking(move || handler.handle_pull(&request)).await?;
    Ok(Json(response))
}

async fn ping(
    State(handler): State<RequestHandler>,
    headers: HeaderMap,
) -> ServerResult<Json<PingResponse>> {
    authorize(&handler, &headers)?;
    Ok(Json(handler.handle_ping()))
}

async fn status(State(handler): State<RequestHandler>) -> Json<StatusResponse> {
    Json(handler.handle_status())
}
