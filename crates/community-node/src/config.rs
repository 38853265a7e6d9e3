//! Node configuration.
//!
//! Every setting is a command-line flag with an environment fallback, so the
//! node runs unchanged under a process manager that only sets variables.

use axum::http::{HeaderValue, Method};
use clap::{Parser, ValueEnum};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

/// Origin of the web client allowed by default.
pub const DEFAULT_CORS_ORIGIN: &str = "https://project-community-next-client.vercel.app";

/// Which document store backs the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreBackend {
    /// Cloud Firestore (or its emulator).
    Firestore,
    /// In-process store; data is lost on exit.
    Memory,
}

/// Community gateway - REST API for posts and Q&A threads
#[derive(Parser, Debug, Clone)]
#[command(name = "community-node")]
#[command(author, version, about, long_about = None)]
pub struct NodeConfig {
    /// Listen port
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Listen address
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Allowed CORS origin, or `*` to allow any origin
    #[arg(long, env = "CORS_ORIGIN", default_value = DEFAULT_CORS_ORIGIN)]
    pub cors_origin: String,

    /// Document store backend
    #[arg(long = "store", env = "STORE_BACKEND", value_enum, default_value_t = StoreBackend::Firestore)]
    pub store_backend: StoreBackend,

    /// Base64-encoded service-account key JSON
    #[arg(long, env = "FIREBASE_KEY", hide_env_values = true)]
    pub firebase_key: Option<String>,

    /// Path to a service-account key JSON file
    #[arg(long = "credentials-file", env = "FIREBASE_KEY_PATH")]
    pub credentials_file: Option<PathBuf>,

    /// Firestore emulator address (host:port); disables real authentication
    #[arg(long, env = "FIRESTORE_EMULATOR_HOST")]
    pub emulator_host: Option<String>,

    /// Project id, overriding the one in the service-account key
    #[arg(long, env = "FIRESTORE_PROJECT_ID")]
    pub project_id: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log format (pretty, json)
    #[arg(long, env = "LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,
}

impl NodeConfig {
    /// Address the HTTP listener binds.
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// CORS policy derived from `cors_origin`.
    pub fn cors_policy(&self) -> anyhow::Result<CorsPolicy> {
        CorsPolicy::parse(&self.cors_origin)
    }
}

/// Cross-origin policy applied to every route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsPolicy {
    /// A single origin, with credentials allowed. Other origins get no CORS
    /// headers.
    AllowOrigin(HeaderValue),
    /// Any origin, no credentials.
    Permissive,
}

impl CorsPolicy {
    /// Parses an origin setting. `*` selects [`CorsPolicy::Permissive`].
    pub fn parse(origin: &str) -> anyhow::Result<Self> {
        let origin = origin.trim();
        if origin == "*" {
            return Ok(CorsPolicy::Permissive);
        }

        let value = HeaderValue::from_str(origin)
            .map_err(|e| anyhow::anyhow!("invalid CORS origin {origin:?}: {e}"))?;
        Ok(CorsPolicy::AllowOrigin(value))
    }

    /// Builds the tower-http layer.
    pub fn layer(&self) -> CorsLayer {
        match self {
            CorsPolicy::AllowOrigin(origin) => CorsLayer::new()
                .allow_origin(AllowOrigin::list([origin.clone()]))
                .allow_credentials(true)
                .allow_methods(AllowMethods::list([
                    Method::GET,
                    Method::HEAD,
                    Method::PUT,
                    Method::PATCH,
                    Method::POST,
                    Method::DELETE,
                ]))
                .allow_headers(AllowHeaders::mirror_request()),
            CorsPolicy::Permissive => CorsLayer::permissive(),
        }
    }
}

impl Default for CorsPolicy {
    fn default() -> Self {
        CorsPolicy::AllowOrigin(HeaderValue::from_static(DEFAULT_CORS_ORIGIN))
    }
}
