//! Credential channels consulted when authenticating outbound calls
//!
//! Three channels exist: an API key (plus the header name used by the legacy
//! fallback), a bearer token and a `user:pass` basic credential. Process-wide
//! values are resolved once at startup. Per-request values are carried in the
//! invocation context and overlaid on them for a single call.

use super::environment::EnvVars;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::{HeaderMap, AUTHORIZATION};
use secrecy::{ExposeSecret, Secret};
use std::env;
use std::fmt;
use tracing::{debug, warn};

/// Header names checked for a request-scoped API key, in order
pub const API_KEY_REQUEST_HEADERS: [&str; 2] = ["X-API-Key", "Api-Key"];

/// Credential set
#[derive(Clone, Default)]
pub struct Credentials {
    pub api_key: Option<Secret<String>>,
    /// Header used for the API key when no security scheme names one
    pub api_key_header: Option<String>,
    pub bearer_token: Option<Secret<String>>,
    /// `user:pass`, encoded only when placed on the wire
    pub basic_auth: Option<Secret<String>>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = |s: &Option<Secret<String>>| if s.is_some() { "[REDACTED]" } else { "None" };
        f.debug_struct("Credentials")
            .field("api_key", &mark(&self.api_key))
            .field("api_key_header", &self.api_key_header)
            .field("bearer_token", &mark(&self.bearer_token))
            .field("basic_auth", &mark(&self.basic_auth))
            .finish()
    }
}

fn non_empty_secret(value: Option<String>) -> Option<Secret<String>> {
    value.filter(|v| !v.is_empty()).map(Secret::new)
}

impl Credentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_api_key<S: Into<String>>(mut self, key: S) -> Self {
        self.api_key = non_empty_secret(Some(key.into()));
        self
    }

    pub fn with_api_key_header<S: Into<String>>(mut self, header: S) -> Self {
        self.api_key_header = Some(header.into()).filter(|h| !h.is_empty());
        self
    }

    pub fn with_bearer_token<S: Into<String>>(mut self, token: S) -> Self {
        self.bearer_token = non_empty_secret(Some(token.into()));
        self
    }

    pub fn with_basic_auth<S: Into<String>>(mut self, user_pass: S) -> Self {
        self.basic_auth = non_empty_secret(Some(user_pass.into()));
        self
    }

    /// Read `API_KEY`, `API_KEY_HEADER`, `BEARER_TOKEN` and `BASIC_AUTH`
    pub fn from_env() -> Self {
        let credentials = Self {
            api_key: non_empty_secret(env::var(EnvVars::API_KEY).ok()),
            api_key_header: env::var(EnvVars::API_KEY_HEADER).ok().filter(|h| !h.is_empty()),
            bearer_token: non_empty_secret(env::var(EnvVars::BEARER_TOKEN).ok()),
            basic_auth: non_empty_secret(env::var(EnvVars::BASIC_AUTH).ok()),
        };
        debug!("Resolved process credentials: {:?}", credentials);
        credentials
    }

    /// Build request-scoped credentials from inbound HTTP headers.
    ///
    /// `X-API-Key` (or `Api-Key`) supplies the API key; `Authorization`
    /// supplies either a bearer token or a basic credential, the latter decoded
    /// back to `user:pass`.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mut credentials = Self::default();

        credentials.api_key = API_KEY_REQUEST_HEADERS
            .iter()
            .filter_map(|name| headers.get(*name))
            .filter_map(|value| value.to_str().ok())
            .find(|value| !value.is_empty())
            .map(|value| Secret::new(value.to_string()));

        if let Some(authorization) = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
            if let Some(token) = strip_scheme(authorization, "Bearer") {
                credentials.bearer_token = non_empty_secret(Some(token.to_string()));
            } else if let Some(encoded) = strip_scheme(authorization, "Basic") {
                match STANDARD.decode(encoded.trim()) {
                    Ok(bytes) => match String::from_utf8(bytes) {
                        Ok(user_pass) => credentials.basic_auth = non_empty_secret(Some(user_pass)),
                        Err(_) => warn!("Ignoring basic credential that is not valid UTF-8"),
                    },
                    Err(e) => warn!("Ignoring malformed basic credential: {}", e),
                }
            }
        }

        credentials
    }

    /// Per-field overlay: every channel set in `request` replaces the one here
    pub fn overlay(&self, request: &Credentials) -> Credentials {
        Credentials {
            api_key: request.api_key.clone().or_else(|| self.api_key.clone()),
            api_key_header: request.api_key_header.clone().or_else(|| self.api_key_header.clone()),
            bearer_token: request.bearer_token.clone().or_else(|| self.bearer_token.clone()),
            basic_auth: request.basic_auth.clone().or_else(|| self.basic_auth.clone()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.api_key.is_none() && self.bearer_token.is_none() && self.basic_auth.is_none()
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_ref().map(|s| s.expose_secret().as_str())
    }

    pub fn bearer_token(&self) -> Option<&str> {
        self.bearer_token.as_ref().map(|s| s.expose_secret().as_str())
    }

    pub fn basic_auth(&self) -> Option<&str> {
        self.basic_auth.as_ref().map(|s| s.expose_secret().as_str())
    }

    /// `Authorization` value for the basic credential
    pub fn basic_authorization(&self) -> Option<String> {
        self.basic_auth()
            .map(|user_pass| format!("Basic {}", STANDARD.encode(user_pass.as_bytes())))
    }

    /// `Authorization` value for the bearer credential
    pub fn bearer_authorization(&self) -> Option<String> {
        self.bearer_token().map(|token| format!("Bearer {}", token))
    }
}

/// Case-insensitive `"<scheme> <rest>"` split
fn strip_scheme<'a>(value: &'a str, scheme: &str) -> Option<&'a str> {
    let (head, rest) = value.split_once(' ')?;
    head.eq_ignore_ascii_case(scheme).then(|| rest.trim())
}
