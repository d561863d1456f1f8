//! Types shared by the dispatcher and transports

use crate::config::Credentials;
use crate::registry::types::HttpMethod;
use reqwest::header::{HeaderMap, CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::StatusCode;
use std::time::Duration;
use url::Url;

/// Request-scoped values threaded through one tool invocation
#[derive(Debug, Clone, Default)]
pub struct InvocationContext {
    /// Overlaid per channel on the process credentials for this call only
    pub credentials: Credentials,
    /// Deadline for this call, overriding the transport default
    pub timeout: Option<Duration>,
}

impl InvocationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Fully assembled outbound request
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Value of one query pair, if present
    pub fn query_param(&self, name: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    pub fn body_text(&self) -> Option<String> {
        self.body.as_ref().map(|b| String::from_utf8_lossy(b).into_owned())
    }
}

/// Upstream response, body fully read
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: Vec<u8>) -> Self {
        Self { status, headers, body }
    }

    pub fn content_type(&self) -> &str {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
    }

    pub fn content_disposition(&self) -> Option<&str> {
        self.headers.get(CONTENT_DISPOSITION).and_then(|v| v.to_str().ok())
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// How a response body is rendered back to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    Json,
    Text,
    Binary,
}

impl PayloadKind {
    /// Bucket a `Content-Type` value. Anything that is neither JSON nor
    /// `text/*`, including a missing type, is binary.
    pub fn classify(content_type: &str) -> Self {
        let lowered = content_type.trim().to_ascii_lowercase();
        if lowered.starts_with("application/json") || lowered.starts_with("application/vnd.api+json") {
            PayloadKind::Json
        } else if lowered.starts_with("text/") {
            PayloadKind::Text
        } else {
            PayloadKind::Binary
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_content_types() {
        assert_eq!(PayloadKind::classify("application/json; charset=utf-8"), PayloadKind::Json);
        assert_eq!(PayloadKind::classify("application/vnd.api+json"), PayloadKind::Json);
        assert_eq!(PayloadKind::classify("text/plain"), PayloadKind::Text);
        assert_eq!(PayloadKind::classify("application/octet-stream"), PayloadKind::Binary);
        assert_eq!(PayloadKind::classify("image/png"), PayloadKind::Binary);
        assert_eq!(PayloadKind::classify(""), PayloadKind::Binary);
    }
}
