//! # TillSync Model
//!
//! Syncable entities and the record codec shared by Edge and Cloud.
//!
//! This crate provides:
//! - [`Syncable`], implemented once per entity type
//! - [`Entity`], a row with its [`SyncMeta`] bookkeeping
//! - [`encode`] / [`decode`] between entities and wire records
//! - The closed enumerations used by entity columns
//!
//! ## Dirty predicate
//!
//! A row needs pushing when it has never been synced or was mutated after
//! its last sync: `synced_at.is_none() || updated_at > synced_at`.
//!
//! ## Example
//!
//! ```
//! use tillsync_model::{decode, encode, Category, Entity};
//!
//! let mut drinks = Entity::new(Category {
//!     name: "Drinks".into(),
//!     ..Default::default()
//! });
//! let record = encode(&mut drinks);
//! assert!(drinks.external_id().is_some());
//!
//! let copy = decode::<Category>(&record, None).unwrap();
//! assert_eq!(copy.data, drinks.data);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod entities;
mod enums;
mod meta;
mod syncable;

pub use entities::{
    AdminPinCode, AppSettings, Branch, CashierPin, CashierSession, Category,
    CategoryKitchenAssignment, CategorySpecialItemAssignment, Customer, DeliveryCompany,
    InventoryItem, Kitchen, KitchenOrder, KitchenOrderItem, ManualCardPayment, MenuItem, Order,
    OrderEditHistory, OrderItem, Payment, Table, User, UserBranchAssignment,
    WaiterCashierAssignment,
};
pub use enums::{KitchenOrderStatus, OrderStatus, PaymentMethod, ServiceType, UserRole};
pub use meta::{EntityClass, ExternalId, SyncMeta, MAX_EXTERNAL_ID_LEN};
pub use syncable::{decode, encode, encode_assigned, record_external_id, Entity, Syncable};
