//! Request logging middleware
//!
//! Tags every request with a fresh id, returns it as `x-request-id`, and
//! logs method, path, status and latency once the response is ready.

use axum::{
    body::Body,
    http::{HeaderValue, Request},
    response::Response,
};
use futures::future::BoxFuture;
use std::{
    task::{Context, Poll},
    time::Instant,
};
use tower::{Layer, Service};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Paths to exclude from logging (health checks)
const EXCLUDED_PATHS: &[&str] = &["/healthz"];

/// Layer for HTTP request logging
#[derive(Clone, Default)]
pub struct RequestLoggingLayer;

impl RequestLoggingLayer {
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for RequestLoggingLayer {
    type Service = RequestLoggingMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestLoggingMiddleware { inner }
    }
}

/// Middleware service for HTTP request logging
#[derive(Clone)]
pub struct RequestLoggingMiddleware<S> {
    inner: S,
}

impl<S> Service<Request<Body>> for RequestLoggingMiddleware<S>
where
    S: Service<Request<Body>, Response = Response> + Send + Clone + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let started = Instant::now();
            let request_id = Uuid::new_v4().to_string();
            let method = request.method().to_string();
            let path = request.uri().path().to_string();
            let query = request.uri().query().map(str::to_string).unwrap_or_default();

            let mut response = inner.call(request).await?;

            if let Ok(value) = HeaderValue::from_str(&request_id) {
                response.headers_mut().insert(REQUEST_ID_HEADER, value);
            }

            if !EXCLUDED_PATHS.contains(&path.as_str()) {
                let status = response.status();
                let elapsed_ms = started.elapsed().as_millis() as u64;
                if status.is_server_error() {
                    tracing::warn!(%request_id, %method, %path, %query, status = status.as_u16(), elapsed_ms, "Request failed");
                } else {
                    tracing::info!(%request_id, %method, %path, %query, status = status.as_u16(), elapsed_ms, "Request served");
                }
            }

            Ok(response)
        })
    }
}
