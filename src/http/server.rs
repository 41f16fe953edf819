//! HTTP server adapter.
//!
//! # Responsibilities
//! - Bind the listener (plain or mutual TLS) through `axum-server`
//! - Report readiness with the bound address once the bind succeeded
//! - Serve the supplied router until a stop request arrives
//! - Drain in-flight requests for a bounded period, then return
//!
//! Any bind failure is returned without readiness ever being reported.

use axum::{middleware, Router};
use axum_server::tls_rustls::RustlsConfig;
use axum_server::Handle;
use futures_util::future::BoxFuture;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tower_http::trace::TraceLayer;

use crate::http::request::{track_requests, with_request_id};
use crate::lifecycle::{Ready, RunError, RunResult, Runnable, StopSignal};

/// Default grace period for in-flight requests.
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// A supervised HTTP(S) server.
pub struct HttpServer {
    name: &'static str,
    addr: SocketAddr,
    router: Router,
    tls: Option<RustlsConfig>,
    drain_timeout: Duration,
}

impl HttpServer {
    /// Create a plain HTTP server for `router` on `addr`.
    ///
    /// `name` labels the server's logs and request metrics.
    pub fn new(name: &'static str, addr: SocketAddr, router: Router) -> Self {
        let router = with_request_id(router.layer(middleware::from_fn_with_state(name, track_requests)))
            .layer(TraceLayer::new_for_http());

        Self {
            name,
            addr,
            router,
            tls: None,
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
        }
    }

    /// Serve over TLS using `tls`.
    pub fn with_tls(mut self, tls: RustlsConfig) -> Self {
        self.tls = Some(tls);
        self
    }

    /// How long in-flight requests may run once the server is stopping.
    pub fn drain_timeout(mut self, drain_timeout: Duration) -> Self {
        self.drain_timeout = drain_timeout;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    async fn serve(self, ready: Ready, mut stop: StopSignal) -> RunResult {
        let HttpServer {
            name,
            addr,
            router,
            tls,
            drain_timeout,
        } = self;

        let secure = tls.is_some();
        let handle = Handle::new();
        let app = router.into_make_service();
        let mut server: BoxFuture<'static, io::Result<()>> = match tls {
            Some(tls) => Box::pin(
                axum_server::bind_rustls(addr, tls)
                    .handle(handle.clone())
                    .serve(app),
            ),
            None => Box::pin(axum_server::bind(addr).handle(handle.clone()).serve(app)),
        };

        let bound = tokio::select! {
            bound = handle.listening() => bound,
            result = &mut server => return Err(bind_failure(addr, result)),
        };
        let Some(local_addr) = bound else {
            return Err(bind_failure(addr, server.await));
        };

        tracing::info!(
            server = name,
            address = %local_addr,
            tls = secure,
            "HTTP server listening"
        );
        ready.notify_listening(local_addr);

        tokio::select! {
            result = &mut server => {
                tracing::error!(server = name, "HTTP server exited without a stop request");
                return match result {
                    Ok(()) => Err(RunError::UnexpectedExit),
                    Err(err) => Err(RunError::Serve(err)),
                };
            }
            _ = stop.recv() => {}
        }

        tracing::info!(
            server = name,
            drain_timeout = ?drain_timeout,
            connections = handle.connection_count(),
            "HTTP server draining"
        );
        handle.graceful_shutdown(Some(drain_timeout));
        server.await.map_err(RunError::Serve)?;

        tracing::info!(server = name, "HTTP server stopped");
        Ok(())
    }
}

impl Runnable for HttpServer {
    fn run(self: Box<Self>, ready: Ready, stop: StopSignal) -> BoxFuture<'static, RunResult> {
        Box::pin((*self).serve(ready, stop))
    }
}

fn bind_failure(addr: SocketAddr, result: io::Result<()>) -> RunError {
    match result {
        Err(source) => RunError::Bind { addr, source },
        Ok(()) => RunError::UnexpectedExit,
    }
}
