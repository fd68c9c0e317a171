//! # TillSync Sync Protocol
//!
//! JSON message types exchanged between Edge and Cloud.
//!
//! This crate provides:
//! - Push, pull, ping and status bodies
//! - The legacy `{"orders": [...]}` push shape
//! - Endpoint paths, header names and batch limits
//!
//! This is a pure protocol crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod messages;
pub mod timestamp;

pub use messages::{
    ErrorResponse, PingResponse, PullRequest, PullResponse, PushPayload, PushRequest,
    PushResponse, RecordError, StatusResponse,
};

/// Push endpoint path.
pub const PUSH_PATH: &str = "/api/sync/push";

/// Pull endpoint path.
pub const PULL_PATH: &str = "/api/sync/pull";

/// Token check endpoint path.
pub const PING_PATH: &str = "/api/sync/ping";

/// Unauthenticated status endpoint path.
pub const STATUS_PATH: &str = "/api/sync/status";

/// Header carrying the shared secret.
pub const EDGE_TOKEN_HEADER: &str = "X-Edge-Token";

/// Alternative header carrying `Bearer <token>`.
pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// Scheme prefix of the authorization header.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Most records an Edge sends per push.
pub const PUSH_BATCH_LIMIT: usize = 50;

/// Most records the Cloud returns per pull.
pub const PULL_BATCH_LIMIT: usize = 500;

/// Model name of legacy `{"orders": [...]}` pushes.
pub const LEGACY_PUSH_MODEL: &str = "Order";
