//! # TillSync Store
//!
//! Node-local persistence for syncable entities.
//!
//! Every node (Edge or Cloud) keeps its rows in one SQLite database. Rows
//! are addressed by a node-local integer id; the cross-node `external_id`
//! is unique per model and assigned lazily. Sync bookkeeping
//! (`updated_at`, `synced_at`) lives beside the mapped columns so the
//! dirty predicate and pull cursors are plain indexed queries.
//!
//! The [`ModelRegistry`] maps wire model names to [`SyncModel`]
//! implementations, which is how the push, pull and server code reach the
//! typed entities without knowing them statically.
//!
//! ```rust,no_run
//! use tillsync_model::{Category, Entity};
//! use tillsync_store::{Store, StoreError};
//!
//! let store = Store::open("edge.sqlite3")?;
//! store.transaction(|txn| {
//!     txn.insert(&mut Entity::new(Category {
//!         name: "Drinks".into(),
//!         ..Default::default()
//!     }))
//! })?;
//! # Ok::<(), StoreError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod registry;
mod schema;
mod store;

pub use error::{StoreError, StoreResult};
pub use registry::{
    MergeOutcome, ModelRegistry, OrderModel, PreparedBatch, SyncModel, SyncStamp, TypedModel,
    ITEMS_KEY, ORDER_LINK_KEY, PAYMENTS_KEY,
};
pub use schema::SCHEMA_VERSION;
pub use store::{Store, StoreTxn};
