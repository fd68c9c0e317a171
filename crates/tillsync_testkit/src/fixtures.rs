//! Test fixtures and store helpers.
//!
//! Provides temporary stores and the rows most sync tests start from: a
//! paid order with one item and one payment on the Edge side, menu
//! categories on the Cloud side.

use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tillsync_codec::{Money, WireRecord};
use tillsync_model::{
    Category, Entity, ExternalId, Order, OrderItem, OrderStatus, Payment, PaymentMethod,
    ServiceType,
};
use tillsync_store::{Store, StoreError};

/// A test store with automatic cleanup.
pub struct TestStore {
    store: Arc<Store>,
    /// Kept alive so the file outlives the store.
    temp_dir: Option<TempDir>,
}

impl TestStore {
    /// Creates a new in-memory test store.
    pub fn memory() -> Self {
        Self {
            store: Arc::new(Store::open_in_memory().expect("Failed to open in-memory store")),
            temp_dir: None,
        }
    }

    /// Creates a new file-backed test store in a temporary directory.
    pub fn file() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = Store::open(temp_dir.path().join("test.sqlite3"))
            .expect("Failed to open file store");
        Self {
            store: Arc::new(store),
            temp_dir: Some(temp_dir),
        }
    }

    /// Returns the temporary directory if file-backed.
    pub fn dir(&self) -> Option<&Path> {
        self.temp_dir.as_ref().map(TempDir::path)
    }

    /// Returns the database path if file-backed.
    pub fn path(&self) -> Option<PathBuf> {
        self.dir().map(|d| d.join("test.sqlite3"))
    }

    /// Returns a shared handle to the store.
    pub fn shared(&self) -> Arc<Store> {
        Arc::clone(&self.store)
    }
}

impl std::ops::Deref for TestStore {
    type Target = Store;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

/// Runs a test with a temporary in-memory store.
pub fn with_temp_store<F, R>(f: F) -> R
where
    F: FnOnce(&Store) -> R,
{
    let store = TestStore::memory();
    f(&store)
}

/// Runs a test with a temporary file-backed store.
pub fn with_temp_file_store<F, R>(f: F) -> R
where
    F: FnOnce(&Store) -> R,
{
    let store = TestStore::file();
    f(&store)
}

/// A paid take-away order on branch 1.
pub fn sample_order(order_number: &str, total_cents: i64) -> Order {
    Order {
        order_number: order_number.to_string(),
        total_amount: Money::from_cents(total_cents),
        payment_method: Some(PaymentMethod::Cash),
        service_type: ServiceType::TakeAway,
        status: OrderStatus::Paid,
        branch_id: 1,
        ..Default::default()
    }
}

/// Inserts [`sample_order`] with one item and one cash payment covering the
/// total. Returns the order's local id.
pub fn seed_order(store: &Store, order_number: &str, total_cents: i64) -> i64 {
    store
        .transaction(|txn| {
            let order_id = txn.insert(&mut Entity::new(sample_order(order_number, total_cents)))?;
            txn.insert(&mut Entity::new(OrderItem {
                quantity: 1,
                unit_price: Money::from_cents(total_cents),
                total_price: Money::from_cents(total_cents),
                menu_item_id: 1,
                order_id: Some(order_id),
                ..Default::default()
            }))?;
            txn.insert(&mut Entity::new(Payment {
                amount: Money::from_cents(total_cents),
                payment_method: PaymentMethod::Cash,
                status: "completed".into(),
                order_id: Some(order_id),
                ..Default::default()
            }))?;
            Ok::<_, StoreError>(order_id)
        })
        .expect("Failed to seed order")
}

/// Inserts an active category with a fresh external id. Returns the
/// stored entity.
pub fn seed_category(store: &Store, name: &str) -> Entity<Category> {
    let mut category = Entity::new(Category {
        name: name.to_string(),
        is_active: true,
        branch_id: 1,
        ..Default::default()
    });
    category.meta.external_id = Some(ExternalId::generate());
    store
        .transaction(|txn| txn.insert(&mut category))
        .expect("Failed to seed category");
    category
}

/// A category as the Cloud sends it.
pub fn category_record(external_id: &str, name: &str) -> WireRecord {
    record(json!({
        "external_id": external_id,
        "name": name,
        "is_active": true,
        "order_index": 0,
        "branch_id": 1,
    }))
}

/// A menu item as the Cloud sends it.
pub fn menu_item_record(external_id: &str, name: &str, price: f64) -> WireRecord {
    record(json!({
        "external_id": external_id,
        "name": name,
        "price": price,
        "is_active": true,
        "category_id": 1,
        "branch_id": 1,
    }))
}

/// Converts a JSON object literal into a wire record.
///
/// # Panics
///
/// Panics if `value` is not an object.
pub fn record(value: Value) -> WireRecord {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_has_no_path() {
        let store = TestStore::memory();
        assert!(store.path().is_none());
    }

    #[test]
    fn file_store_lives_in_temp_dir() {
        let store = TestStore::file();
        let path = store.path().unwrap();
        assert!(path.exists());
    }

    #[test]
    fn seeded_order_has_children() {
        with_temp_store(|store| {
            seed_order(store, "A-1", 1_250);
            assert_eq!(store.count("Order").unwrap(), 1);
            assert_eq!(store.count("OrderItem").unwrap(), 1);
            assert_eq!(store.count("Payment").unwrap(), 1);
        });
    }

    #[test]
    fn seeded_category_gets_an_id() {
        with_temp_file_store(|store| {
            let category = seed_category(store, "Drinks");
            assert!(category.id().is_some());
            assert!(category.external_id().is_some());
        });
    }
}
