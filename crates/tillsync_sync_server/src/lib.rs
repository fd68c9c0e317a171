//! # TillSync Sync Server
//!
//! Cloud side of TillSync: accepts transactional rows pushed by Edge
//! nodes and serves reference data back to them.
//!
//! This crate provides:
//! - HTTP endpoints (push, pull, ping, status) on axum
//! - Idempotent upsert of pushed records by `external_id`
//! - Per-record error isolation inside one committed batch
//! - Shared-secret authentication via `X-Edge-Token` or a bearer header
//!
//! # Authentication
//!
//! Every endpoint except status requires the shared secret. A server
//! started without one answers 401 to all of them:
//!
//! ```
//! use tillsync_sync_server::{ServerConfig, SyncServer};
//!
//! let server = SyncServer::in_memory(ServerConfig::default()).unwrap();
//! assert!(server.handler().authorize(Some("anything"), None).is_err());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod auth;
mod config;
mod error;
mod handler;
mod server;

pub use auth::{normalize_token, presented_token, TokenValidator};
pub use config::{
    ServerConfig, BIND_ADDR_VAR, DATABASE_PATH_VAR, DEFAULT_MAX_PUSH_RECORDS, TOKEN_VAR,
};
pub use error::{ServerError, ServerResult};
pub use handler::{HandlerContext, RequestHandler};
pub use server::{router, SyncServer};
