//! Abusive-request throttle with escalating blocking.
//!
//! Attempts are counted per (client, path) in a fixed Redis-backed window;
//! crossing the threshold blocks the client across all paths for a fixed
//! duration. Cache loss always fails open to "no record".

pub mod config;
pub mod error;
pub mod ip;
pub mod limiter;
pub mod middleware;
pub mod types;

pub use config::*;
pub use error::*;
pub use ip::client_identifier;
pub use limiter::*;
pub use middleware::throttle_by_ip;
pub use types::*;
