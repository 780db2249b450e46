//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection (one axum-server per configured port)
//!     → server.rs (router, request ID, tracing, timeout)
//!     → request.rs (request ID, RequestTarget: method, host, path)
//!     → rules engine resolves a ResponseTemplate
//!     → response.rs (headers, status, body or file)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{MakeRequestUuid, RequestTarget, X_REQUEST_ID};
pub use server::{MockServer, ServeError};
