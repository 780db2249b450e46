//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! PortConfig (port, https, cert, key)
//!     → tls.rs (validate PEM files, build rustls config)
//!     → handed to the HTTP server for that port
//! ```
//!
//! # Design Decisions
//! - TLS is optional per port and handled transparently
//! - TLS material is checked up front so a bad path fails startup clearly

pub mod tls;
