//! Runtime lookup from model names to typed sync behavior.
//!
//! Each [`Syncable`] type is registered once at startup. Push, pull and the
//! server handlers find models by wire name and drive them through the
//! object-safe [`SyncModel`] face, so the same encode/merge code runs on
//! both Edge and Cloud.

use crate::error::{StoreError, StoreResult};
use crate::store::StoreTxn;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;
use tillsync_codec::{get, put, WireRecord};
use tillsync_model::{
    decode, encode_assigned, record_external_id, AdminPinCode, AppSettings, Branch, CashierPin,
    CashierSession, Category, CategoryKitchenAssignment, CategorySpecialItemAssignment, Customer,
    DeliveryCompany, Entity, EntityClass, ExternalId, InventoryItem, Kitchen, KitchenOrder,
    KitchenOrderItem, ManualCardPayment, MenuItem, Order, OrderEditHistory, OrderItem, Payment,
    Syncable, Table, User, UserBranchAssignment, WaiterCashierAssignment,
};
use tracing::warn;

/// Wire key carrying a child's parent `external_id`.
pub const ORDER_LINK_KEY: &str = "order_external_id";

/// Wire key of inline order items.
pub const ITEMS_KEY: &str = "items";

/// Wire key of inline order payments.
pub const PAYMENTS_KEY: &str = "payments";

/// A `(local id, updated_at)` pair read for a push.
pub type SyncStamp = (i64, DateTime<Utc>);

/// Records selected for a push, with the rows to stamp once acknowledged.
#[derive(Debug, Clone, Default)]
pub struct PreparedBatch {
    /// Encoded records, oldest first.
    pub records: Vec<WireRecord>,
    /// Every row the records were read from, owned children included.
    pub stamps: Vec<SyncStamp>,
}

impl PreparedBatch {
    /// Returns true if there is nothing to push.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Whether a merge created a row or updated one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// No row had the record's external id.
    Created,
    /// An existing row was overwritten.
    Updated,
}

/// Object-safe sync behavior of one model.
pub trait SyncModel: Send + Sync {
    /// Wire name of the model.
    fn type_name(&self) -> &'static str;

    /// Direction the model flows in.
    fn class(&self) -> EntityClass;

    /// Selects up to `limit` dirty rows, assigns and persists missing
    /// external ids, and encodes them.
    fn prepare_push(&self, txn: &StoreTxn<'_>, limit: usize) -> StoreResult<PreparedBatch>;

    /// Upserts one received record by external id, stamping `synced_at`.
    fn merge(&self, txn: &StoreTxn<'_>, record: &WireRecord, at: DateTime<Utc>)
        -> StoreResult<MergeOutcome>;

    /// Encodes up to `limit` rows updated strictly after `since`, oldest first.
    fn export_since(
        &self,
        txn: &StoreTxn<'_>,
        since: Option<DateTime<Utc>>,
        limit: usize,
    ) -> StoreResult<Vec<WireRecord>>;
}

/// [`SyncModel`] for a plain [`Syncable`] type.
///
/// An owned child can be linked to its parent model; the link travels as
/// the parent's external id under `link_key` and is resolved back to a
/// local id on merge.
pub struct TypedModel<T> {
    parent: Option<ParentLink>,
    _marker: PhantomData<fn() -> T>,
}

#[derive(Debug, Clone, Copy)]
struct ParentLink {
    model: &'static str,
    key: &'static str,
}

impl<T: Syncable> TypedModel<T> {
    /// Creates a model with no parent.
    pub fn new() -> Self {
        Self {
            parent: None,
            _marker: PhantomData,
        }
    }

    /// Creates a model for an owned child of `parent_model`.
    pub fn owned_by(parent_model: &'static str, link_key: &'static str) -> Self {
        Self {
            parent: Some(ParentLink {
                model: parent_model,
                key: link_key,
            }),
            _marker: PhantomData,
        }
    }

    fn encode_row(&self, txn: &StoreTxn<'_>, entity: &mut Entity<T>) -> StoreResult<WireRecord> {
        txn.assign_external_id(entity)?;
        let mut record = encode_assigned(entity);

        if let (Some(link), Some(parent_id)) = (self.parent, entity.data.parent_id()) {
            if let Some(parent) = txn.ensure_external_id_of(link.model, parent_id)? {
                put(&mut record, link.key, &parent);
            }
        }
        Ok(record)
    }

    /// Merges a record, re-parenting it under `parent_id` when given.
    ///
    /// Without an explicit parent, a linked child is re-parented from its
    /// link key if the parent row exists locally.
    fn merge_under(
        &self,
        txn: &StoreTxn<'_>,
        record: &WireRecord,
        at: DateTime<Utc>,
        parent_id: Option<i64>,
    ) -> StoreResult<(MergeOutcome, i64)> {
        let external_id = record_external_id(record)?;
        let existing = txn.find_by_external_id::<T>(&external_id)?;
        let outcome = if existing.is_some() {
            MergeOutcome::Updated
        } else {
            MergeOutcome::Created
        };

        let mut entity = decode::<T>(record, existing)?;
        let parent_id = match (parent_id, self.parent) {
            (Some(id), _) => Some(id),
            (None, Some(link)) => match get::<ExternalId>(record, link.key)? {
                Some(parent) => txn.find_id(link.model, &parent)?,
                None => None,
            },
            (None, None) => None,
        };
        if parent_id.is_some() {
            entity.data.set_parent_id(parent_id);
        }

        let id = txn.save_merged(&mut entity, at)?;
        Ok((outcome, id))
    }
}

impl<T: Syncable> Default for TypedModel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Syncable> SyncModel for TypedModel<T> {
    fn type_name(&self) -> &'static str {
        T::TYPE_NAME
    }

    fn class(&self) -> EntityClass {
        T::CLASS
    }

    fn prepare_push(&self, txn: &StoreTxn<'_>, limit: usize) -> StoreResult<PreparedBatch> {
        let mut batch = PreparedBatch::default();
        for mut entity in txn.dirty::<T>(limit)? {
            let record = self.encode_row(txn, &mut entity)?;
            batch.records.push(record);
            batch.stamps.push(stamp_of(&entity)?);
        }
        Ok(batch)
    }

    fn merge(
        &self,
        txn: &StoreTxn<'_>,
        record: &WireRecord,
        at: DateTime<Utc>,
    ) -> StoreResult<MergeOutcome> {
        self.merge_under(txn, record, at, None).map(|(outcome, _)| outcome)
    }

    fn export_since(
        &self,
        txn: &StoreTxn<'_>,
        since: Option<DateTime<Utc>>,
        limit: usize,
    ) -> StoreResult<Vec<WireRecord>> {
        txn.updated_since::<T>(since, limit)?
            .iter_mut()
            .map(|entity| self.encode_row(txn, entity))
            .collect()
    }
}

fn stamp_of<T: Syncable>(entity: &Entity<T>) -> StoreResult<SyncStamp> {
    entity
        .id()
        .map(|id| (id, entity.meta.updated_at))
        .ok_or_else(|| StoreError::invalid(T::TYPE_NAME, "row has not been stored"))
}

/// [`SyncModel`] for orders, which carry their items and payments inline.
pub struct OrderModel {
    orders: TypedModel<Order>,
    items: TypedModel<OrderItem>,
    payments: TypedModel<Payment>,
}

impl OrderModel {
    /// Creates the order model.
    pub fn new() -> Self {
        Self {
            orders: TypedModel::new(),
            items: TypedModel::owned_by(Order::TYPE_NAME, ORDER_LINK_KEY),
            payments: TypedModel::owned_by(Order::TYPE_NAME, ORDER_LINK_KEY),
        }
    }

    fn encode_order(
        &self,
        txn: &StoreTxn<'_>,
        order: &mut Entity<Order>,
        stamps: &mut Vec<SyncStamp>,
    ) -> StoreResult<WireRecord> {
        let mut record = self.orders.encode_row(txn, order)?;
        let order_id = stamp_of(order)?.0;

        let mut items = Vec::new();
        for mut item in txn.children::<OrderItem>(order_id)? {
            items.push(Value::Object(self.items.encode_row(txn, &mut item)?));
            stamps.push(stamp_of(&item)?);
        }
        let mut payments = Vec::new();
        for mut payment in txn.children::<Payment>(order_id)? {
            payments.push(Value::Object(self.payments.encode_row(txn, &mut payment)?));
            stamps.push(stamp_of(&payment)?);
        }

        record.insert(ITEMS_KEY.into(), Value::Array(items));
        record.insert(PAYMENTS_KEY.into(), Value::Array(payments));
        stamps.push(stamp_of(order)?);
        Ok(record)
    }
}

impl Default for OrderModel {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncModel for OrderModel {
    fn type_name(&self) -> &'static str {
        Order::TYPE_NAME
    }

    fn class(&self) -> EntityClass {
        Order::CLASS
    }

    fn prepare_push(&self, txn: &StoreTxn<'_>, limit: usize) -> StoreResult<PreparedBatch> {
        let mut batch = PreparedBatch::default();
        for mut order in txn.dirty::<Order>(limit)? {
            let record = self.encode_order(txn, &mut order, &mut batch.stamps)?;
            batch.records.push(record);
        }
        Ok(batch)
    }

    fn merge(
        &self,
        txn: &StoreTxn<'_>,
        record: &WireRecord,
        at: DateTime<Utc>,
    ) -> StoreResult<MergeOutcome> {
        let (outcome, order_id) = self.orders.merge_under(txn, record, at, None)?;
        merge_children(&self.items, txn, record, ITEMS_KEY, at, order_id)?;
        merge_children(&self.payments, txn, record, PAYMENTS_KEY, at, order_id)?;
        Ok(outcome)
    }

    fn export_since(
        &self,
        txn: &StoreTxn<'_>,
        since: Option<DateTime<Utc>>,
        limit: usize,
    ) -> StoreResult<Vec<WireRecord>> {
        let mut stamps = Vec::new();
        txn.updated_since::<Order>(since, limit)?
            .iter_mut()
            .map(|order| self.encode_order(txn, order, &mut stamps))
            .collect()
    }
}

fn merge_children<T: Syncable>(
    model: &TypedModel<T>,
    txn: &StoreTxn<'_>,
    record: &WireRecord,
    key: &str,
    at: DateTime<Utc>,
    parent_id: i64,
) -> StoreResult<()> {
    let children = match record.get(key) {
        None | Some(Value::Null) => return Ok(()),
        Some(Value::Array(children)) => children,
        Some(other) => {
            return Err(tillsync_codec::CodecError::InvalidField {
                field: key.to_string(),
                message: format!("expected a list, got {other}"),
            }
            .into())
        }
    };

    for child in children {
        let Some(child) = child.as_object() else {
            warn!(model = T::TYPE_NAME, "skipping non-object child record");
            continue;
        };
        if !child.contains_key("external_id") {
            warn!(model = T::TYPE_NAME, "skipping child record without external_id");
            continue;
        }
        model.merge_under(txn, child, at, Some(parent_id))?;
    }
    Ok(())
}

/// Name-keyed table of registered models, in registration order.
#[derive(Clone, Default)]
pub struct ModelRegistry {
    models: Vec<Arc<dyn SyncModel>>,
}

impl ModelRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with every TillSync model.
    ///
    /// Transactional models come first, parents before their children.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry
            .register(Arc::new(OrderModel::new()))
            .register(Arc::new(TypedModel::<OrderItem>::owned_by(
                Order::TYPE_NAME,
                ORDER_LINK_KEY,
            )))
            .register(Arc::new(TypedModel::<Payment>::owned_by(
                Order::TYPE_NAME,
                ORDER_LINK_KEY,
            )))
            .register(typed::<KitchenOrder>())
            .register(typed::<KitchenOrderItem>())
            .register(typed::<CashierSession>())
            .register(typed::<Customer>())
            .register(typed::<ManualCardPayment>())
            .register(typed::<OrderEditHistory>())
            .register(typed::<WaiterCashierAssignment>())
            .register(typed::<Branch>())
            .register(typed::<User>())
            .register(typed::<UserBranchAssignment>())
            .register(typed::<Category>())
            .register(typed::<MenuItem>())
            .register(typed::<Table>())
            .register(typed::<DeliveryCompany>())
            .register(typed::<Kitchen>())
            .register(typed::<CategoryKitchenAssignment>())
            .register(typed::<CategorySpecialItemAssignment>())
            .register(typed::<AdminPinCode>())
            .register(typed::<CashierPin>())
            .register(typed::<AppSettings>())
            .register(typed::<InventoryItem>());
        registry
    }

    /// Registers a model, replacing any model with the same name.
    pub fn register(&mut self, model: Arc<dyn SyncModel>) -> &mut Self {
        match self
            .models
            .iter()
            .position(|m| m.type_name() == model.type_name())
        {
            Some(index) => self.models[index] = model,
            None => self.models.push(model),
        }
        self
    }

    /// Looks up a model by wire name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn SyncModel>> {
        self.models
            .iter()
            .find(|m| m.type_name() == name)
            .cloned()
    }

    /// Returns the models of one class, in registration order.
    pub fn of_class(&self, class: EntityClass) -> Vec<Arc<dyn SyncModel>> {
        self.models
            .iter()
            .filter(|m| m.class() == class)
            .cloned()
            .collect()
    }

    /// Returns every registered model name.
    pub fn names(&self) -> Vec<&'static str> {
        self.models.iter().map(|m| m.type_name()).collect()
    }

    /// Returns the number of registered models.
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Returns true if no model is registered.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl std::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

fn typed<T: Syncable>() -> Arc<dyn SyncModel> {
    Arc::new(TypedModel::<T>::new())
}
