//! Outbound API interception.
//!
//! `ApiInterceptor` wraps the application's HTTP transport. For requests to
//! the application's own API origin it injects the bearer token and a JSON
//! content type, times the call and records an `api_call` entry. The audit
//! sink uses its own client and never passes through here.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Instant;

use async_trait::async_trait;
use tracing::debug;
use uarwatch_core::{AuditError, AuditResult, Details, LogCategory};
use uarwatch_logging::{LogRecord, LoggingService};

// ---------------------------------------------------------------------------
// Request / response
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiRequest {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl ApiRequest {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new("GET", url)
    }

    pub fn post(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new("POST", url).with_body(body)
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_header(name, value);
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Replace any header with the same name.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

// ---------------------------------------------------------------------------
// Transport seam
// ---------------------------------------------------------------------------

#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> AuditResult<ApiResponse>;
}

#[async_trait]
impl HttpTransport for reqwest::Client {
    async fn send(&self, request: ApiRequest) -> AuditResult<ApiResponse> {
        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|e| AuditError::Transport(format!("invalid method {}: {e}", request.method)))?;

        let mut builder = self.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let resp = builder
            .send()
            .await
            .map_err(|e| AuditError::Transport(e.to_string()))?;
        let status = resp.status().as_u16();
        let headers = resp
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
            .collect();
        let body = resp
            .text()
            .await
            .map_err(|e| AuditError::Transport(e.to_string()))?;

        Ok(ApiResponse { status, headers, body })
    }
}

// ---------------------------------------------------------------------------
// Auth token
// ---------------------------------------------------------------------------

/// Shared slot holding the current session token.
#[derive(Debug, Clone, Default)]
pub struct AuthToken(Arc<RwLock<Option<String>>>);

impl AuthToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, token: impl Into<String>) {
        *self.0.write().unwrap_or_else(|e| e.into_inner()) = Some(token.into());
    }

    pub fn clear(&self) {
        *self.0.write().unwrap_or_else(|e| e.into_inner()) = None;
    }

    pub fn get(&self) -> Option<String> {
        self.0.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

// ---------------------------------------------------------------------------
// Interceptor
// ---------------------------------------------------------------------------

pub struct ApiInterceptor {
    inner: Arc<dyn HttpTransport>,
    logger: Arc<LoggingService>,
    origin: String,
    token: AuthToken,
    attached: AtomicBool,
}

impl ApiInterceptor {
    /// An empty `origin` treats every request as an application API call.
    pub fn new(
        inner: Arc<dyn HttpTransport>,
        logger: Arc<LoggingService>,
        origin: impl Into<String>,
        token: AuthToken,
    ) -> Self {
        Self {
            inner,
            logger,
            origin: origin.into().trim_end_matches('/').to_string(),
            token,
            attached: AtomicBool::new(false),
        }
    }

    pub fn attach(&self) {
        if !self.attached.swap(true, Ordering::SeqCst) {
            debug!(origin = %self.origin, "API interceptor attached");
        }
    }

    pub fn detach(&self) {
        if self.attached.swap(false, Ordering::SeqCst) {
            debug!(origin = %self.origin, "API interceptor detached");
        }
    }

    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::SeqCst)
    }

    pub fn token(&self) -> &AuthToken {
        &self.token
    }

    fn is_own_api(&self, url: &str) -> bool {
        if self.origin.is_empty() {
            return true;
        }
        match url.strip_prefix(self.origin.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with(['/', '?', '#']),
            None => false,
        }
    }

    fn prepare(&self, request: &mut ApiRequest) {
        if request.header("authorization").is_none() {
            if let Some(token) = self.token.get().filter(|t| !t.is_empty()) {
                request.set_header("Authorization", format!("Bearer {token}"));
            }
        }
        if request.body.is_some() && request.header("content-type").is_none() {
            request.set_header("Content-Type", "application/json");
        }
    }
}

#[async_trait]
impl HttpTransport for ApiInterceptor {
    async fn send(&self, mut request: ApiRequest) -> AuditResult<ApiResponse> {
        if !self.is_attached() || !self.is_own_api(&request.url) {
            return self.inner.send(request).await;
        }

        self.prepare(&mut request);
        let method = request.method.to_ascii_uppercase();
        let url = request.url.clone();

        let started = Instant::now();
        let result = self.inner.send(request).await;
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        match &result {
            Ok(resp) => {
                self.logger
                    .log_api_call(&method, &url, Some(resp.status), Some(elapsed_ms), Details::new());
            }
            Err(e) => {
                self.logger.log(
                    LogRecord::error(LogCategory::ApiCall, format!("{method} {url}"))
                        .module("API")
                        .function(method.clone())
                        .detail("method", method.as_str())
                        .detail("url", url.as_str())
                        .detail("error", e.to_string())
                        .duration_ms(elapsed_ms),
                );
            }
        }
        result
    }
}
