//! Logging setup and outbound HTTP logging

use crate::config::{BridgeConfig, LoggingConfig};
use crate::error::{BridgeError, Result};
use crate::routing::types::{HttpRequest, HttpResponse, PayloadKind};
use reqwest::header::{HeaderMap, AUTHORIZATION, CONTENT_LENGTH, COOKIE};
use tracing::info;

/// Bodies longer than this are truncated in HTTP logs
pub const MAX_LOGGED_BODY: usize = 1000;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. Logs go to stderr
/// so stdout stays free for the hosting protocol.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let json = config.is_json();

    tracing_subscriber::registry()
        .with(json.then(|| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_target(false)
                .with_writer(std::io::stderr)
        }))
        .with((!json).then(|| {
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
        }))
        .with(env_filter)
        .try_init()
        .map_err(|e| BridgeError::config(format!("Failed to initialize logging: {}", e)))
}

/// Header list with credentials masked
pub fn redacted_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let shown = if *name == AUTHORIZATION || *name == COOKIE {
                "[REDACTED]".to_string()
            } else {
                value.to_str().unwrap_or("[non-ascii]").to_string()
            };
            (name.as_str().to_string(), shown)
        })
        .collect()
}

/// Body as text, cut at [`MAX_LOGGED_BODY`] bytes with the full size noted
pub fn truncated_body(body: &[u8]) -> String {
    if body.len() > MAX_LOGGED_BODY {
        format!(
            "{}... ({} bytes)",
            String::from_utf8_lossy(&body[..MAX_LOGGED_BODY]),
            body.len()
        )
    } else {
        String::from_utf8_lossy(body).into_owned()
    }
}

pub fn log_http_request(request: &HttpRequest) {
    info!("HTTP request: {} {}", request.method, request.url);
    for (name, value) in redacted_headers(&request.headers) {
        info!("  {}: {}", name, value);
    }
    if let Some(body) = request.body.as_deref().filter(|b| !b.is_empty()) {
        info!("  body: {}", truncated_body(body));
    }
}

pub fn log_http_response(response: &HttpResponse) {
    let content_type = response.content_type();
    info!("HTTP response: {}", response.status);
    if !content_type.is_empty() {
        info!("  content-type: {}", content_type);
    }
    if let Some(length) = response.headers.get(CONTENT_LENGTH).and_then(|v| v.to_str().ok()) {
        info!("  content-length: {}", length);
    }
    if response.body.is_empty() {
        return;
    }
    match PayloadKind::classify(content_type) {
        PayloadKind::Binary => info!(
            "  body: [binary content, {} bytes, type: {}]",
            response.body.len(),
            content_type
        ),
        _ => info!("  body: {}", truncated_body(&response.body)),
    }
}

/// Startup summary of what was registered
pub struct StartupLogger;

impl StartupLogger {
    pub fn display_registration_summary(tool_names: &[String], config: &BridgeConfig, base_urls: &[String]) {
        info!("OpenAPI bridge registered {} tool(s)", tool_names.len());
        info!("   Base URLs: {}", base_urls.join(", "));
        if !config.tags.is_empty() {
            info!("   Tag filter: {}", config.tags.join(", "));
        }
        if let Some(format) = config.tool_name_format {
            info!("   Tool name format: {}", format);
        }
        info!(
            "   Dangerous-action confirmation: {}",
            if config.confirm_dangerous_actions { "enabled" } else { "disabled" }
        );
        if config.log_http {
            info!("   HTTP logging: enabled");
        }
    }
}
