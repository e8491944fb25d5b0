//! HTTP server setup and lifecycle.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, timeout, request ID, metrics)
//! - Bind and serve until a stop is requested
//! - Report listener state transitions to the lifecycle

use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::{
    extract::{MatchedPath, Request},
    middleware::{self, Next},
    response::Response,
    routing::get,
    Router,
};
use tokio::sync::watch;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{RegistryConfig, VersionInfo};
use crate::http::handlers;
use crate::net::listener::{
    bind, ListenerError, ListenerFactory, ListenerState, ServiceContext, ServiceListener,
};
use crate::observability::{metrics, MetricsHandle};
use crate::registry::RegistryService;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<RegistryService>,
    pub metrics: MetricsHandle,
    pub version: VersionInfo,
}

/// HTTP listener for the registry API.
pub struct HttpServer {
    router: Router,
    bind_address: String,
    state: watch::Sender<ListenerState>,
    stop: watch::Sender<bool>,
    local_addr: OnceLock<SocketAddr>,
}

impl HttpServer {
    /// Create a new HTTP server from the startup context.
    pub fn new(ctx: ServiceContext) -> Self {
        let router = Self::build_router(
            &ctx.config,
            AppState {
                service: ctx.service,
                metrics: ctx.metrics,
                version: ctx.version,
            },
        );
        let (state, _) = watch::channel(ListenerState::Stopped);
        let (stop, _) = watch::channel(false);

        Self {
            router,
            bind_address: ctx.config.listener.bind_address.clone(),
            state,
            stop,
            local_addr: OnceLock::new(),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    pub fn build_router(config: &RegistryConfig, state: AppState) -> Router {
        Router::new()
            .route("/v0/health", get(handlers::health))
            .route("/v0/ping", get(handlers::ping))
            .route("/v0/version", get(handlers::version))
            .route("/v0/servers", get(handlers::list_servers))
            .route("/v0/servers/{id}", get(handlers::get_server))
            .route("/metrics", get(handlers::metrics))
            .route_layer(middleware::from_fn(track_metrics))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
            )
    }

    /// Address actually bound, once `start` has bound the socket.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr.get().copied()
    }
}

#[async_trait]
impl ServiceListener for HttpServer {
    async fn start(&self) -> Result<(), ListenerError> {
        if *self.stop.borrow() {
            return Err(ListenerError::Closed);
        }
        if *self.state.borrow() != ListenerState::Stopped {
            return Err(ListenerError::Setup("listener already started".into()));
        }

        let listener = bind(&self.bind_address).await?;
        if let Ok(addr) = listener.local_addr() {
            let _ = self.local_addr.set(addr);
        }

        self.state.send_replace(ListenerState::Running);
        tracing::info!(address = %self.bind_address, "HTTP server starting");

        let mut stop_rx = self.stop.subscribe();
        let result = axum::serve(listener, self.router.clone())
            .with_graceful_shutdown(async move {
                let _ = stop_rx.wait_for(|stop| *stop).await;
            })
            .await;

        self.state.send_replace(ListenerState::Stopped);
        tracing::info!("HTTP server stopped");
        result.map_err(|e| ListenerError::Serve(e.to_string()))
    }

    async fn stop(&self, deadline: Duration) -> Result<(), ListenerError> {
        self.stop.send_replace(true);

        let mut state_rx = self.state.subscribe();
        if *state_rx.borrow() == ListenerState::Stopped {
            return Ok(());
        }
        self.state.send_if_modified(|s| {
            if *s == ListenerState::Running {
                *s = ListenerState::Draining;
                true
            } else {
                false
            }
        });

        tracing::info!(deadline = ?deadline, "Draining HTTP server");
        let drained = state_rx.wait_for(|s| *s == ListenerState::Stopped);
        let stopped = tokio::time::timeout(deadline, async { drained.await.map(|_| ()) }).await;
        match stopped {
            Ok(_) => Ok(()),
            Err(_) => Err(ListenerError::StopTimeout(deadline)),
        }
    }

    fn state(&self) -> ListenerState {
        *self.state.borrow()
    }
}

/// Builds [`HttpServer`] listeners.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpServerFactory;

impl ListenerFactory for HttpServerFactory {
    fn build(&self, ctx: ServiceContext) -> Result<Arc<dyn ServiceListener>, ListenerError> {
        Ok(Arc::new(HttpServer::new(ctx)))
    }
}

async fn track_metrics(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let method = request.method().to_string();

    let response = next.run(request).await;
    metrics::record_request(&method, &route, response.status().as_u16(), start);
    response
}
