//! Call-time path: request assembly, authentication, transport and
//! response rendering

pub mod auth;
pub mod dispatcher;
pub mod guidance;
pub mod transport;
pub mod types;

pub use dispatcher::{format_parameter_value, DispatchEnvironment, DispatcherOptions, RequestDispatcher};
pub use transport::{FnTransport, HttpTransport, ReqwestTransport, TransportFuture};
pub use types::*;
