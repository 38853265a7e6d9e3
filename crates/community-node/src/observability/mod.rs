//! # Observability
//!
//! - **Structured logging**: pretty or JSON output filtered by `RUST_LOG`
//!   or the configured level
//! - **Request tracing**: every request runs inside a span carrying its
//!   request id, which is echoed back in the `x-request-id` header
//!
//! ## Usage
//!
//! ```rust,ignore
//! use community_node::observability::{init_logging, LogFormat};
//!
//! init_logging("info", LogFormat::parse("json"));
//! ```

mod logging;
mod middleware;

pub use logging::{init_logging, LogFormat};
pub use middleware::{request_id_middleware, REQUEST_ID_HEADER};
