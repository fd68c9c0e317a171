//! # TillSync Sync Engine
//!
//! Edge side of TillSync: pushes locally created transactional rows to the
//! Cloud and pulls reference data back.
//!
//! This crate provides:
//! - Push of dirty rows in batches of 50, stamped only after the Cloud acks
//! - Pull with a persisted per-model cursor and per-record isolation
//! - One cycle runner with an overlap guard and an aggregated report
//! - A background worker with a cooperative, bounded stop
//! - HTTP transport abstraction
//!
//! ## Delivery
//!
//! Delivery is at-least-once. A batch whose acknowledgement is lost goes
//! out again with the same `external_id`s and the Cloud upserts it, so a
//! repeat never duplicates rows.
//!
//! ## Direction
//!
//! Transactional models only flow Edge to Cloud, reference models only
//! Cloud to Edge. Asking the engine for the other direction is a
//! validation error.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod engine;
mod error;
mod http;
mod transport;
mod worker;

pub use config::{
    EdgeConfig, WorkerConfig, BASE_URL_VAR, DATABASE_PATH_VAR, EDGE_MODE_VAR, INTERVAL_VAR,
    PULL_EVERY_VAR, TOKEN_VAR,
};
pub use engine::{CycleError, CycleReport, EdgeSync, PullOutcome, PushOutcome};
pub use error::{SyncError, SyncResult};
pub use http::HttpTransport;
pub use transport::{MockTransport, SyncTransport};
pub use worker::{SyncWorker, WorkerStatus};
