//! Web server module

mod chart;
mod middleware;
mod page;
mod routes;

use anyhow::{Context, Result};
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use std::{net::SocketAddr, sync::Arc};
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::info;

use crate::chrome::Logo;
use crate::config::{Config, DashboardConfig};
use crate::db::Warehouse;

pub struct AppState {
    pub warehouse: Warehouse,
    pub logo: Logo,
    pub dashboard: DashboardConfig,
}

/// Any failure while serving a request. Renders as a bare 500.
pub struct AppError(anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!("Render failed: {:#}", self.0);
        (StatusCode::INTERNAL_SERVER_ERROR, "Dashboard unavailable").into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(routes::index))
        .route("/api/views", get(routes::api_views))
        .route("/api/dashboard", get(routes::api_dashboard))
        .route("/healthz", get(routes::healthz))
        // Tables are recomputed on every load
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(middleware::RequestLoggingLayer::new())
        .with_state(state)
}

/// Resolve `host:port`, accepting hostnames and bare IPv6 literals
async fn resolve_addr(host: &str, port: u16) -> Result<SocketAddr> {
    tokio::net::lookup_host((host, port))
        .await
        .with_context(|| format!("Cannot resolve listen address {}", host))?
        .next()
        .with_context(|| format!("No address found for {}", host))
}

pub async fn start_server(config: &Config, warehouse: Warehouse, logo: Logo) -> Result<()> {
    let state = Arc::new(AppState {
        warehouse,
        logo,
        dashboard: config.dashboard.clone(),
    });
    let app = router(state);

    let addr = resolve_addr(&config.server.host, config.server.http_port).await?;

    if config.tls_enabled() {
        let tls = RustlsConfig::from_pem_file(&config.server.tls_cert, &config.server.tls_key).await?;
        info!("Dashboard starting on https://{}", addr);
        axum_server::bind_rustls(addr, tls)
            .serve(app.into_make_service())
            .await?;
    } else {
        info!("Dashboard starting on http://{}", addr);
        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;
    }

    Ok(())
}
