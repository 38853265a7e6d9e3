//! # Community Node
//!
//! REST gateway for a community site: posts, question/answer threads, and
//! the comments nested under them.
//!
//! Every request is translated into a single operation against a
//! [`DocumentStore`](community_store::DocumentStore) and answered with JSON.
//! The node keeps no state of its own between requests.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────┐
//! │                  Community Node                    │
//! ├────────────────────────────────────────────────────┤
//! │  request id → trace → CORS                         │
//! │  ┌──────────────────────────────────────────────┐  │
//! │  │  HTTP API Layer                              │  │
//! │  │  • Posts (list, comment count)               │  │
//! │  │  • Q&A threads (CRUD)                        │  │
//! │  │  • Q&A comments (list, create, delete)       │  │
//! │  └──────────────────────────────────────────────┘  │
//! │                        │                           │
//! │  ┌──────────────────────────────────────────────┐  │
//! │  │  Document Store (Firestore or in-memory)     │  │
//! │  └──────────────────────────────────────────────┘  │
//! └────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! FIREBASE_KEY=$(base64 -w0 service-account.json) cargo run --bin community-node
//!
//! # or without any credentials
//! cargo run --bin community-node -- --store memory --cors-origin '*'
//! ```
//!
//! ## Modules
//!
//! - [`api`] - Shared state, error mapping, and the root router
//! - [`posts_api`] - Post listing and comment counts
//! - [`qna_api`] - Question threads and their comments
//! - [`config`] - Command-line and environment configuration
//! - [`credentials`] - Service-account loading and store bootstrap
//! - [`observability`] - Structured logging and request ids
//!
//! ## Example: Building the Router
//!
//! ```rust
//! use std::sync::Arc;
//! use community_store::MemoryStore;
//! use community_node::api::{create_router, AppState};
//! use community_node::config::CorsPolicy;
//!
//! let state = AppState::new(Arc::new(MemoryStore::new()));
//! let app = create_router(state, &CorsPolicy::Permissive);
//! # let _ = app;
//! ```

pub mod api;
pub mod config;
pub mod credentials;
pub mod observability;
pub mod posts_api;
pub mod qna_api;
