//! # TillSync Testkit
//!
//! Test utilities for TillSync.
//!
//! This crate provides:
//! - Temporary stores that clean up after themselves
//! - Sample orders and reference rows, seeded or as wire records
//! - Property-based generators using proptest
//!
//! ## Usage
//!
//! ```rust
//! use tillsync_testkit::prelude::*;
//!
//! with_temp_store(|store| {
//!     seed_order(store, "A-1", 2_500);
//!     assert_eq!(store.count("Order").unwrap(), 1);
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
