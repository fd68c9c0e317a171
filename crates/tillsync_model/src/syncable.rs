//! The `Syncable` trait and the record codec built on it.

use crate::meta::{EntityClass, ExternalId, SyncMeta};
use chrono::{DateTime, Utc};
use tillsync_codec::{get, put, require, CodecResult, WireRecord};

/// A row type that can cross the Edge↔Cloud link.
///
/// Implementations list their mapped columns once: `encode_fields` writes
/// them, `apply_update` reads back whichever are present. Sync metadata
/// (`external_id`, `updated_at`) is handled by [`encode`] and [`decode`].
pub trait Syncable: Default + Clone + Send + Sync + 'static {
    /// Model name used on the wire and in the store.
    const TYPE_NAME: &'static str;

    /// Direction this model flows in.
    const CLASS: EntityClass;

    /// Writes every mapped field into `record`.
    fn encode_fields(&self, record: &mut WireRecord);

    /// Overwrites the mapped fields present in `record`.
    fn apply_update(&mut self, record: &WireRecord) -> CodecResult<()>;

    /// Local id of the owning row, for owned children.
    fn parent_id(&self) -> Option<i64> {
        None
    }

    /// Re-parents an owned child.
    fn set_parent_id(&mut self, _id: Option<i64>) {}
}

/// A syncable row: metadata plus the model's own columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Entity<T> {
    /// Sync bookkeeping.
    pub meta: SyncMeta,
    /// Model columns.
    pub data: T,
}

impl<T: Syncable> Entity<T> {
    /// Wraps freshly created data.
    pub fn new(data: T) -> Self {
        Self {
            meta: SyncMeta::new(),
            data,
        }
    }

    /// Returns the local id, if the row has been stored.
    pub fn id(&self) -> Option<i64> {
        self.meta.id
    }

    /// Returns the external id, if assigned.
    pub fn external_id(&self) -> Option<&ExternalId> {
        self.meta.external_id.as_ref()
    }

    /// Returns true if the row has local changes not yet pushed.
    pub fn needs_push(&self) -> bool {
        self.meta.needs_push()
    }
}

/// Encodes an entity for the wire.
///
/// Assigns an `external_id` first if the entity has none; calling this
/// again on the same instance reuses it. The local `id` and `synced_at`
/// are never written.
pub fn encode<T: Syncable>(entity: &mut Entity<T>) -> WireRecord {
    entity.meta.ensure_external_id();
    encode_assigned(entity)
}

/// Encodes an entity whose `external_id` has already been settled.
///
/// An entity without one encodes without the key.
pub fn encode_assigned<T: Syncable>(entity: &Entity<T>) -> WireRecord {
    let mut record = WireRecord::new();
    if let Some(external_id) = &entity.meta.external_id {
        put(&mut record, "external_id", external_id);
    }
    put(&mut record, "updated_at", &entity.meta.updated_at);
    entity.data.encode_fields(&mut record);
    record
}

/// Decodes a wire record, starting from `existing` when there is one.
///
/// `external_id` is required. Every mapped field present in the record
/// overwrites the current value; unknown keys and `id` are ignored.
pub fn decode<T: Syncable>(
    record: &WireRecord,
    existing: Option<Entity<T>>,
) -> CodecResult<Entity<T>> {
    let external_id: ExternalId = require(record, "external_id")?;
    let mut entity = existing.unwrap_or_default();

    entity.meta.external_id = Some(external_id);
    if let Some(updated_at) = get::<DateTime<Utc>>(record, "updated_at")? {
        entity.meta.updated_at = updated_at;
    }
    entity.data.apply_update(record)?;
    Ok(entity)
}

/// Reads just the `external_id` of a wire record.
pub fn record_external_id(record: &WireRecord) -> CodecResult<ExternalId> {
    require(record, "external_id")
}
