//! Process startup helpers: logging installation and summaries

pub mod logger;

pub use logger::{init_logging, log_http_request, log_http_response, StartupLogger};
