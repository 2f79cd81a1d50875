//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the proxy handler on every path and method
//! - Wire up middleware (tracing, request ID)
//! - Bind server to listener
//! - Extract the request context, forward to the fetcher, dispatch the response
//! - Observability (logs, metrics)

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::ProxyConfig;
use crate::http::context::{Inbound, ProxyRequestContext};
use crate::http::dispatch::build_response;
use crate::http::error::ProxyError;
use crate::http::landing::landing_page;
use crate::lifecycle::shutdown_signal;
use crate::observability::metrics;
use crate::rewrite::ProxyOrigin;
use crate::upstream::{Fetcher, FetcherError};

/// Errors raised while assembling the server at startup.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Fetcher(#[from] FetcherError),

    #[error("invalid public origin `{origin}`: {source}")]
    PublicOrigin {
        origin: String,
        #[source]
        source: url::ParseError,
    },
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub fetcher: Arc<Fetcher>,
    pub public_origin: Option<ProxyOrigin>,
    pub landing_page: bool,
}

/// HTTP server for the rewriting proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, ServerError> {
        let fetcher = Fetcher::from_config(&config.fetcher, &config.timeouts)?;
        let public_origin = config
            .listener
            .public_origin
            .as_deref()
            .map(|origin| {
                ProxyOrigin::parse(origin).map_err(|source| ServerError::PublicOrigin {
                    origin: origin.to_string(),
                    source,
                })
            })
            .transpose()?;

        let state = AppState {
            fetcher: Arc::new(fetcher),
            public_origin,
            landing_page: config.listener.landing_page,
        };

        let router = Self::build_router(state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Upstream timeouts are enforced by the fetcher, not by a layer.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/", any(proxy_handler))
            .route("/{*path}", any(proxy_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(PropagateRequestIdLayer::x_request_id()),
            )
    }

    /// Run the server until Ctrl+C or until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            fetcher = %self.config.fetcher.endpoint,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

/// Main proxy handler.
/// Extracts the target, forwards to the fetcher and dispatches the response.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    match handle(&state, request).await {
        Ok((route, response)) => {
            let status = response.status();
            tracing::info!(
                method = %method,
                path = %path,
                route = route,
                status = status.as_u16(),
                "Proxied request"
            );
            metrics::record_request(route, status.as_u16(), start_time);
            response
        }
        Err(e) => {
            let status = e.status();
            tracing::warn!(
                method = %method,
                path = %path,
                status = status.as_u16(),
                error = %e,
                "Request failed"
            );
            metrics::record_request("error", status.as_u16(), start_time);
            e.into_response()
        }
    }
}

async fn handle(
    state: &AppState,
    request: Request<Body>,
) -> Result<(&'static str, Response), ProxyError> {
    let (parts, body) = request.into_parts();

    let ctx = match ProxyRequestContext::from_request(
        &parts.uri,
        &parts.headers,
        state.public_origin.as_ref(),
    )? {
        Inbound::Landing if state.landing_page => {
            return Ok(("landing", landing_page().into_response()));
        }
        Inbound::Landing => return Err(ProxyError::MissingTarget),
        Inbound::Proxy(ctx) => ctx,
    };

    tracing::debug!(
        target_url = %ctx.target_url,
        force_download = ctx.force_download,
        "Resolved proxy target"
    );

    let upstream = state
        .fetcher
        .fetch(parts.method, &parts.headers, body, &ctx.target_url)
        .await?;
    let (route, response) = build_response(&ctx, upstream).await?;
    Ok((route.as_str(), response))
}
