//! Outbound HTTP transports
//!
//! The dispatcher only sees [`HttpTransport`]. The default is a reqwest client;
//! tests and embedders can inject any async function instead.

use super::types::{HttpRequest, HttpResponse};
use crate::error::{BridgeError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tokio::time::timeout as tokio_timeout;
use tracing::debug;

/// Executes one assembled request. Errors are transport failures and are
/// never retried by the caller.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// Default transport backed by a shared reqwest client
///
/// Dropping the returned future aborts the in-flight request.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    default_timeout: Option<Duration>,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .use_rustls_tls()
            .tls_built_in_root_certs(true)
            .build()
            .map_err(|e| BridgeError::transport(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            default_timeout: None,
        })
    }

    /// Transport whose calls time out after `timeout` unless the request
    /// carries its own deadline
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let mut transport = Self::new()?;
        transport.default_timeout = Some(timeout);
        Ok(transport)
    }

    pub fn from_client(client: Client) -> Self {
        Self {
            client,
            default_timeout: None,
        }
    }

    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut builder = self
            .client
            .request(request.method.to_reqwest(), request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| BridgeError::transport(format!("HTTP request failed: {}", e)))?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| BridgeError::transport(format!("Failed to read response body: {}", e)))?;

        Ok(HttpResponse::new(status, headers, body.to_vec()))
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        debug!("Sending {} {}", request.method, request.url);

        match request.timeout.or(self.default_timeout) {
            Some(limit) => tokio_timeout(limit, self.execute(request))
                .await
                .map_err(|_| BridgeError::timeout(format!("request exceeded {:?}", limit)))?,
            None => self.execute(request).await,
        }
    }
}

/// Boxed future returned by function transports
pub type TransportFuture = Pin<Box<dyn Future<Output = Result<HttpResponse>> + Send>>;

/// Transport backed by an async function
pub struct FnTransport<F> {
    func: F,
}

impl<F> FnTransport<F>
where
    F: Fn(HttpRequest) -> TransportFuture + Send + Sync,
{
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

#[async_trait]
impl<F> HttpTransport for FnTransport<F>
where
    F: Fn(HttpRequest) -> TransportFuture + Send + Sync,
{
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        (self.func)(request).await
    }
}
