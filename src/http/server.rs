//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router and bind the proxy handler to it
//! - Wire up middleware (request id, tracing)
//! - Dispatch each request to the validator and then the forwarder
//! - Serve on a listener until shutdown is signalled

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Method, Request},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::{validate_config, ConfigError, ProxyConfig};
use crate::cors::forward::{build_client, forward};
use crate::cors::{classify, CorsPolicy, Inbound};
use crate::error::{ErrorKind, ProxyError};
use crate::http::request::{RequestIdExt, UuidRequestId, X_REQUEST_ID};
use crate::observability::metrics;

/// Application state injected into handlers. Read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub policy: Arc<CorsPolicy>,
    pub client: reqwest::Client,
    /// Largest request body buffered for forwarding.
    pub max_body_size: usize,
}

/// Build the proxy router.
///
/// The handler answers on every path; only the query string matters. Embed
/// the returned router with `Router::merge` or `Router::nest` to mount the
/// proxy inside another application.
///
/// `max_body_size` is enforced only on forwarded requests, after the preflight
/// branch, so oversized bodies are rejected with the CORS headers attached.
pub fn cors_proxy_router(policy: CorsPolicy, client: reqwest::Client, max_body_size: usize) -> Router {
    let state = AppState {
        policy: Arc::new(policy),
        client,
        max_body_size,
    };

    Router::new()
        .route("/", any(proxy_handler))
        .route("/{*path}", any(proxy_handler))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(X_REQUEST_ID, UuidRequestId))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::new(X_REQUEST_ID)),
        )
}

/// HTTP server for the CORS proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Validate the configuration and build the server.
    ///
    /// Fails on any invalid setting, so a misconfigured proxy never serves.
    pub fn new(config: ProxyConfig) -> Result<Self, ConfigError> {
        validate_config(&config).map_err(ConfigError::Validation)?;

        let policy = CorsPolicy::from_config(&config.cors)
            .map_err(|e| ConfigError::Validation(vec![e]))?;
        let client = build_client(&config.upstream)?;

        let router = cors_proxy_router(policy, client, config.security.max_body_size);
        Ok(Self { router, config })
    }

    /// The router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

/// Main proxy handler.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request.request_id().to_string();
    let method = request.method().clone();
    let client_ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    let target = match classify(&method, request.uri(), request.headers()) {
        Ok(Inbound::Preflight) => {
            tracing::debug!(request_id = %request_id, "Answering preflight");
            let response = state.policy.preflight_response();
            metrics::record_request(method.as_str(), response.status().as_u16(), "preflight", start_time);
            return response;
        }
        Ok(Inbound::Forward(target)) => target,
        Err(e) => return reject(&state, &request_id, &method, e, start_time),
    };

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        target = %target.url(),
        "Proxying request"
    );

    let forwarded = forward(
        &state.client,
        &state.policy,
        &target,
        request,
        client_ip,
        state.max_body_size,
    )
    .await;

    match forwarded {
        Ok(response) => {
            metrics::record_request(method.as_str(), response.status().as_u16(), "forwarded", start_time);
            response
        }
        Err(e) => reject(&state, &request_id, &method, e, start_time),
    }
}

/// Log, count and render a per-request error.
fn reject(
    state: &AppState,
    request_id: &str,
    method: &Method,
    err: ProxyError,
    start_time: Instant,
) -> Response {
    match err.kind() {
        ErrorKind::BadRequest => {
            tracing::warn!(request_id = %request_id, reason = err.reason(), "Rejected request: {}", err);
        }
        ErrorKind::UpstreamUnreachable => {
            tracing::error!(
                request_id = %request_id,
                error = ?std::error::Error::source(&err),
                "Upstream request failed"
            );
        }
    }

    let status = err.status_code();
    metrics::record_rejection(err.reason());
    metrics::record_request(method.as_str(), status.as_u16(), "rejected", start_time);

    let mut response = err.into_response();
    state.policy.stamp(response.headers_mut());
    response
}
