//! SQLite-backed entity store.

use crate::error::{StoreError, StoreResult};
use crate::schema::{SCHEMA, SCHEMA_VERSION};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Params, Row, TransactionBehavior};
use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tillsync_codec::{from_micros, WireRecord};
use tillsync_model::{Entity, ExternalId, SyncMeta, Syncable};
use tracing::{debug, info, warn};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const ENTITY_COLUMNS: &str = "id, external_id, parent_id, updated_at, synced_at, body";

/// A relational store for syncable entities.
///
/// All access goes through [`Store::transaction`]. The connection is
/// guarded by a mutex, so the worker thread and request handlers can share
/// one `Arc<Store>`; transactions on the same store are serialized.
pub struct Store {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl Store {
    /// Opens or creates a database file.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.pragma_update(None, "foreign_keys", true)?;
        Self::initialize(&conn)?;

        info!(path = %path.display(), "opened store");
        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        })
    }

    /// Creates an in-memory database (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", true)?;
        Self::initialize(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    /// Returns the database file path, if file-backed.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn initialize(conn: &Connection) -> StoreResult<()> {
        conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)")?;

        let version: Option<u32> = conn
            .query_row(
                "SELECT version FROM schema_version ORDER BY version DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;

        match version {
            None => {
                info!(version = SCHEMA_VERSION, "initializing store schema");
                conn.execute_batch(SCHEMA)?;
                conn.execute(
                    "INSERT INTO schema_version (version) VALUES (?1)",
                    params![SCHEMA_VERSION],
                )?;
            }
            Some(v) if v != SCHEMA_VERSION => {
                return Err(StoreError::SchemaVersionMismatch {
                    expected: SCHEMA_VERSION,
                    actual: v,
                });
            }
            Some(_) => {
                debug!(version = SCHEMA_VERSION, "store schema up to date");
            }
        }
        Ok(())
    }

    /// Runs `f` inside one transaction.
    ///
    /// Commits if `f` returns `Ok`, rolls back if it returns `Err`. The
    /// store lock is held for the duration, so `f` must not open another
    /// transaction on the same store.
    pub fn transaction<R, E, F>(&self, f: F) -> Result<R, E>
    where
        F: FnOnce(&StoreTxn<'_>) -> Result<R, E>,
        E: From<StoreError>,
    {
        let mut conn = self.conn.lock();
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(StoreError::from)?;
        let txn = StoreTxn {
            tx,
            depth: Cell::new(0),
        };

        match f(&txn) {
            Ok(value) => {
                txn.tx.commit().map_err(StoreError::from)?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback) = txn.tx.rollback() {
                    warn!(error = %rollback, "rollback failed");
                }
                Err(err)
            }
        }
    }

    /// Counts stored rows of a model.
    pub fn count(&self, model: &str) -> StoreResult<usize> {
        self.transaction(|txn| txn.count(model))
    }

    /// Returns the persisted pull cursor of a model.
    pub fn cursor(&self, model: &str) -> StoreResult<Option<DateTime<Utc>>> {
        self.transaction(|txn| txn.cursor(model))
    }
}

/// An open store transaction.
pub struct StoreTxn<'conn> {
    tx: rusqlite::Transaction<'conn>,
    depth: Cell<u32>,
}

struct RawRow {
    id: i64,
    external_id: Option<String>,
    parent_id: Option<i64>,
    updated_at: i64,
    synced_at: Option<i64>,
    body: String,
}

impl RawRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            external_id: row.get(1)?,
            parent_id: row.get(2)?,
            updated_at: row.get(3)?,
            synced_at: row.get(4)?,
            body: row.get(5)?,
        })
    }

    fn into_entity<T: Syncable>(self) -> StoreResult<Entity<T>> {
        let body: WireRecord = serde_json::from_str(&self.body)
            .map_err(|e| StoreError::corrupt(format!("{} row {}: {e}", T::TYPE_NAME, self.id)))?;

        let mut data = T::default();
        data.apply_update(&body)?;
        data.set_parent_id(self.parent_id);

        let meta = SyncMeta {
            id: Some(self.id),
            external_id: self.external_id.as_deref().map(ExternalId::parse).transpose()?,
            updated_at: from_micros(self.updated_at)?,
            synced_at: self.synced_at.map(from_micros).transpose()?,
        };
        Ok(Entity { meta, data })
    }
}

impl StoreTxn<'_> {
    /// Runs `f` inside a savepoint.
    ///
    /// Changes made by `f` are kept if it returns `Ok` and undone if it
    /// returns `Err`; the enclosing transaction continues either way.
    pub fn savepoint<R, E, F>(&self, f: F) -> Result<R, E>
    where
        F: FnOnce(&StoreTxn<'_>) -> Result<R, E>,
        E: From<StoreError>,
    {
        let depth = self.depth.get();
        let name = format!("sp_{depth}");
        self.tx
            .execute_batch(&format!("SAVEPOINT {name}"))
            .map_err(StoreError::from)?;

        self.depth.set(depth + 1);
        let result = f(self);
        self.depth.set(depth);

        match result {
            Ok(value) => {
                self.tx
                    .execute_batch(&format!("RELEASE {name}"))
                    .map_err(StoreError::from)?;
                Ok(value)
            }
            Err(err) => {
                self.tx
                    .execute_batch(&format!("ROLLBACK TO {name}; RELEASE {name}"))
                    .map_err(StoreError::from)?;
                Err(err)
            }
        }
    }

    /// Inserts a new row and stores its local id in `entity`.
    pub fn insert<T: Syncable>(&self, entity: &mut Entity<T>) -> StoreResult<i64> {
        if entity.meta.id.is_some() {
            return Err(StoreError::invalid(T::TYPE_NAME, "row is already stored"));
        }
        let id = self.write(entity)?;
        entity.meta.id = Some(id);
        Ok(id)
    }

    /// Saves a local mutation, bumping `updated_at`.
    pub fn update<T: Syncable>(&self, entity: &mut Entity<T>) -> StoreResult<()> {
        if entity.meta.id.is_none() {
            return Err(StoreError::invalid(T::TYPE_NAME, "row has not been stored"));
        }
        entity.meta.touch();
        self.write(entity)?;
        Ok(())
    }

    /// Saves a row received from the peer.
    ///
    /// Inserts or overwrites without bumping `updated_at` and stamps
    /// `synced_at`, never earlier than `updated_at`, so the row is clean.
    pub fn save_merged<T: Syncable>(
        &self,
        entity: &mut Entity<T>,
        at: DateTime<Utc>,
    ) -> StoreResult<i64> {
        entity.meta.synced_at = Some(at.max(entity.meta.updated_at));
        let id = self.write(entity)?;
        entity.meta.id = Some(id);
        Ok(id)
    }

    /// Persists an `external_id` for the row if it has none.
    ///
    /// Does not bump `updated_at`. Returns true if one was assigned.
    pub fn assign_external_id<T: Syncable>(&self, entity: &mut Entity<T>) -> StoreResult<bool> {
        let Some(id) = entity.meta.id else {
            return Err(StoreError::invalid(T::TYPE_NAME, "row has not been stored"));
        };
        if !entity.meta.ensure_external_id() {
            return Ok(false);
        }

        let external_id = entity.meta.external_id.as_ref().map(ExternalId::as_str);
        let changed = self.tx.execute(
            "UPDATE entities SET external_id = ?1 WHERE id = ?2 AND model = ?3 AND external_id IS NULL",
            params![external_id, id, T::TYPE_NAME],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound {
                model: T::TYPE_NAME,
                id,
            });
        }
        debug!(model = T::TYPE_NAME, id, "assigned external id");
        Ok(true)
    }

    /// Returns the `external_id` of any row, assigning one if it has none.
    pub fn ensure_external_id_of(&self, model: &'static str, id: i64) -> StoreResult<Option<ExternalId>> {
        let current: Option<Option<String>> = self
            .tx
            .query_row(
                "SELECT external_id FROM entities WHERE id = ?1 AND model = ?2",
                params![id, model],
                |row| row.get(0),
            )
            .optional()?;

        match current {
            None => Ok(None),
            Some(Some(text)) => Ok(Some(ExternalId::parse(&text)?)),
            Some(None) => {
                let assigned = ExternalId::generate();
                self.tx.execute(
                    "UPDATE entities SET external_id = ?1 WHERE id = ?2",
                    params![assigned.as_str(), id],
                )?;
                Ok(Some(assigned))
            }
        }
    }

    /// Stamps `synced_at = at` on rows that still carry the `updated_at`
    /// they were pushed with.
    ///
    /// A row mutated after it was read for the push keeps its newer
    /// `updated_at` and stays dirty. Returns the number of rows stamped.
    pub fn mark_synced(&self, rows: &[(i64, DateTime<Utc>)], at: DateTime<Utc>) -> StoreResult<usize> {
        let mut stmt = self.tx.prepare_cached(
            "UPDATE entities SET synced_at = MAX(?1, updated_at) WHERE id = ?2 AND updated_at = ?3",
        )?;
        let mut stamped = 0;
        for &(id, updated_at) in rows {
            stamped += stmt.execute(params![
                at.timestamp_micros(),
                id,
                updated_at.timestamp_micros()
            ])?;
        }
        Ok(stamped)
    }

    /// Loads a row by local id.
    pub fn get<T: Syncable>(&self, id: i64) -> StoreResult<Option<Entity<T>>> {
        let sql = format!("SELECT {ENTITY_COLUMNS} FROM entities WHERE model = ?1 AND id = ?2");
        Ok(self.query::<T, _>(&sql, params![T::TYPE_NAME, id])?.pop())
    }

    /// Loads a row by external id.
    pub fn find_by_external_id<T: Syncable>(
        &self,
        external_id: &ExternalId,
    ) -> StoreResult<Option<Entity<T>>> {
        let sql =
            format!("SELECT {ENTITY_COLUMNS} FROM entities WHERE model = ?1 AND external_id = ?2");
        Ok(self
            .query::<T, _>(&sql, params![T::TYPE_NAME, external_id.as_str()])?
            .pop())
    }

    /// Returns the local id of a row by external id, for any model.
    pub fn find_id(&self, model: &str, external_id: &ExternalId) -> StoreResult<Option<i64>> {
        Ok(self
            .tx
            .query_row(
                "SELECT id FROM entities WHERE model = ?1 AND external_id = ?2",
                params![model, external_id.as_str()],
                |row| row.get(0),
            )
            .optional()?)
    }

    /// Returns up to `limit` rows needing a push, oldest `updated_at` first.
    pub fn dirty<T: Syncable>(&self, limit: usize) -> StoreResult<Vec<Entity<T>>> {
        let sql = format!(
            "SELECT {ENTITY_COLUMNS} FROM entities \
             WHERE model = ?1 AND (synced_at IS NULL OR updated_at > synced_at) \
             ORDER BY updated_at, id LIMIT ?2"
        );
        self.query(&sql, params![T::TYPE_NAME, limit as i64])
    }

    /// Returns the children of a parent row.
    pub fn children<T: Syncable>(&self, parent_id: i64) -> StoreResult<Vec<Entity<T>>> {
        let sql = format!(
            "SELECT {ENTITY_COLUMNS} FROM entities WHERE model = ?1 AND parent_id = ?2 ORDER BY id"
        );
        self.query(&sql, params![T::TYPE_NAME, parent_id])
    }

    /// Returns up to `limit` rows updated strictly after `since` (all rows
    /// if `None`), oldest first.
    pub fn updated_since<T: Syncable>(
        &self,
        since: Option<DateTime<Utc>>,
        limit: usize,
    ) -> StoreResult<Vec<Entity<T>>> {
        let sql = format!(
            "SELECT {ENTITY_COLUMNS} FROM entities \
             WHERE model = ?1 AND (?2 IS NULL OR updated_at > ?2) \
             ORDER BY updated_at, id LIMIT ?3"
        );
        self.query(
            &sql,
            params![
                T::TYPE_NAME,
                since.map(|t| t.timestamp_micros()),
                limit as i64
            ],
        )
    }

    /// Counts stored rows of a model.
    pub fn count(&self, model: &str) -> StoreResult<usize> {
        let count: i64 = self.tx.query_row(
            "SELECT COUNT(*) FROM entities WHERE model = ?1",
            params![model],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Returns the persisted pull cursor of a model.
    pub fn cursor(&self, model: &str) -> StoreResult<Option<DateTime<Utc>>> {
        let micros: Option<i64> = self
            .tx
            .query_row(
                "SELECT cursor FROM sync_cursors WHERE model = ?1",
                params![model],
                |row| row.get(0),
            )
            .optional()?;
        Ok(micros.map(from_micros).transpose()?)
    }

    /// Persists the pull cursor of a model.
    pub fn set_cursor(&self, model: &str, cursor: DateTime<Utc>) -> StoreResult<()> {
        self.tx.execute(
            "INSERT INTO sync_cursors (model, cursor) VALUES (?1, ?2) \
             ON CONFLICT(model) DO UPDATE SET cursor = excluded.cursor",
            params![model, cursor.timestamp_micros()],
        )?;
        Ok(())
    }

    fn write<T: Syncable>(&self, entity: &Entity<T>) -> StoreResult<i64> {
        let mut body = WireRecord::new();
        entity.data.encode_fields(&mut body);
        let body = serde_json::to_string(&body)
            .map_err(|e| StoreError::corrupt(format!("{}: {e}", T::TYPE_NAME)))?;

        let external_id = entity.meta.external_id.as_ref().map(ExternalId::as_str);
        let parent_id = entity.data.parent_id();
        let updated_at = entity.meta.updated_at.timestamp_micros();
        let synced_at = entity.meta.synced_at.map(|t| t.timestamp_micros());

        match entity.meta.id {
            None => {
                self.tx.execute(
                    "INSERT INTO entities (model, external_id, parent_id, updated_at, synced_at, body) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![T::TYPE_NAME, external_id, parent_id, updated_at, synced_at, body],
                )?;
                Ok(self.tx.last_insert_rowid())
            }
            Some(id) => {
                let changed = self.tx.execute(
                    "UPDATE entities SET external_id = ?1, parent_id = ?2, updated_at = ?3, \
                     synced_at = ?4, body = ?5 WHERE id = ?6 AND model = ?7",
                    params![external_id, parent_id, updated_at, synced_at, body, id, T::TYPE_NAME],
                )?;
                if changed == 0 {
                    return Err(StoreError::NotFound {
                        model: T::TYPE_NAME,
                        id,
                    });
                }
                Ok(id)
            }
        }
    }

    fn query<T: Syncable, P: Params>(&self, sql: &str, params: P) -> StoreResult<Vec<Entity<T>>> {
        let mut stmt = self.tx.prepare_cached(sql)?;
        let rows = stmt
            .query_map(params, RawRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(RawRow::into_entity).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tillsync_codec::Money;
    use tillsync_model::{Category, Customer, OrderItem};

    fn customer(name: &str) -> Entity<Customer> {
        Entity::new(Customer {
            name: name.into(),
            total_spent: Money::from_cents(1_999),
            branch_id: 1,
            ..Default::default()
        })
    }

    #[test]
    fn insert_and_get() {
        let store = Store::open_in_memory().unwrap();
        let mut alice = customer("Alice");

        let id = store.transaction(|txn| txn.insert(&mut alice)).unwrap();
        assert_eq!(alice.id(), Some(id));

        let loaded = store
            .transaction(|txn| txn.get::<Customer>(id))
            .unwrap()
            .unwrap();
        assert_eq!(loaded.data, alice.data);
        assert_eq!(loaded.meta.updated_at, alice.meta.updated_at);
        assert!(loaded.meta.external_id.is_none());
    }

    #[test]
    fn models_do_not_see_each_other() {
        let store = Store::open_in_memory().unwrap();
        let mut alice = customer("Alice");
        let id = store.transaction(|txn| txn.insert(&mut alice)).unwrap();

        assert!(store
            .transaction(|txn| txn.get::<Category>(id))
            .unwrap()
            .is_none());
        assert_eq!(store.count("Customer").unwrap(), 1);
        assert_eq!(store.count("Category").unwrap(), 0);
    }

    #[test]
    fn failed_transaction_rolls_back() {
        let store = Store::open_in_memory().unwrap();
        let result: StoreResult<()> = store.transaction(|txn| {
            txn.insert(&mut customer("Alice"))?;
            Err(StoreError::corrupt("abort"))
        });
        assert!(result.is_err());
        assert_eq!(store.count("Customer").unwrap(), 0);
    }

    #[test]
    fn savepoint_isolates_one_record() {
        let store = Store::open_in_memory().unwrap();
        store
            .transaction(|txn| {
                txn.insert(&mut customer("kept"))?;
                let failed: StoreResult<()> = txn.savepoint(|txn| {
                    txn.insert(&mut customer("discarded"))?;
                    Err(StoreError::corrupt("bad record"))
                });
                assert!(failed.is_err());
                txn.savepoint(|txn| txn.insert(&mut customer("also kept")))?;
                Ok::<_, StoreError>(())
            })
            .unwrap();
        assert_eq!(store.count("Customer").unwrap(), 2);
    }

    #[test]
    fn dirty_rows_come_oldest_first() {
        let store = Store::open_in_memory().unwrap();
        let mut newer = customer("newer");
        let mut older = customer("older");
        older.meta.updated_at = newer.meta.updated_at - Duration::seconds(10);

        store
            .transaction(|txn| {
                txn.insert(&mut newer)?;
                txn.insert(&mut older)
            })
            .unwrap();

        let dirty = store.transaction(|txn| txn.dirty::<Customer>(10)).unwrap();
        let names: Vec<_> = dirty.iter().map(|c| c.data.name.as_str()).collect();
        assert_eq!(names, ["older", "newer"]);

        let capped = store.transaction(|txn| txn.dirty::<Customer>(1)).unwrap();
        assert_eq!(capped.len(), 1);
    }

    #[test]
    fn mark_synced_skips_rows_mutated_since_read() {
        let store = Store::open_in_memory().unwrap();
        let mut a = customer("a");
        let mut b = customer("b");
        store
            .transaction(|txn| {
                txn.insert(&mut a)?;
                txn.insert(&mut b)
            })
            .unwrap();

        let read = store.transaction(|txn| txn.dirty::<Customer>(10)).unwrap();
        let stamps: Vec<_> = read
            .iter()
            .map(|e| (e.id().unwrap(), e.meta.updated_at))
            .collect();

        store
            .transaction(|txn| {
                let mut edited = txn.get::<Customer>(b.id().unwrap())?.unwrap();
                edited.data.name = "b2".into();
                txn.update(&mut edited)
            })
            .unwrap();

        let stamped = store
            .transaction(|txn| txn.mark_synced(&stamps, tillsync_codec::now()))
            .unwrap();
        assert_eq!(stamped, 1);

        let dirty = store.transaction(|txn| txn.dirty::<Customer>(10)).unwrap();
        let names: Vec<_> = dirty.iter().map(|c| c.data.name.as_str()).collect();
        assert_eq!(names, ["b2"]);
    }

    #[test]
    fn assign_external_id_does_not_bump_updated_at() {
        let store = Store::open_in_memory().unwrap();
        let mut alice = customer("Alice");
        store.transaction(|txn| txn.insert(&mut alice)).unwrap();
        let before = alice.meta.updated_at;

        let assigned = store
            .transaction(|txn| txn.assign_external_id(&mut alice))
            .unwrap();
        assert!(assigned);
        let again = store
            .transaction(|txn| txn.assign_external_id(&mut alice))
            .unwrap();
        assert!(!again);

        let loaded = store
            .transaction(|txn| txn.get::<Customer>(alice.id().unwrap()))
            .unwrap()
            .unwrap();
        assert_eq!(loaded.meta.updated_at, before);
        assert_eq!(loaded.meta.external_id, alice.meta.external_id);
    }

    #[test]
    fn external_ids_are_unique_per_model() {
        let store = Store::open_in_memory().unwrap();
        let shared = ExternalId::parse("dup-1").unwrap();

        let mut first = customer("first");
        first.meta.external_id = Some(shared.clone());
        store.transaction(|txn| txn.insert(&mut first)).unwrap();

        let mut second = customer("second");
        second.meta.external_id = Some(shared.clone());
        let err = store
            .transaction(|txn| txn.insert(&mut second))
            .unwrap_err();
        assert!(err.is_constraint_violation());

        let mut other_model = Entity::new(Category::default());
        other_model.meta.external_id = Some(shared);
        store
            .transaction(|txn| txn.insert(&mut other_model))
            .unwrap();
    }

    #[test]
    fn save_merged_leaves_row_clean() {
        let store = Store::open_in_memory().unwrap();
        let mut incoming = Entity::new(Category {
            name: "Drinks".into(),
            ..Default::default()
        });
        incoming.meta.external_id = Some(ExternalId::parse("cat-123").unwrap());
        let future = incoming.meta.updated_at + Duration::hours(1);
        incoming.meta.updated_at = future;

        store
            .transaction(|txn| txn.save_merged(&mut incoming, tillsync_codec::now()))
            .unwrap();

        let found = store
            .transaction(|txn| {
                txn.find_by_external_id::<Category>(&ExternalId::parse("cat-123").unwrap())
            })
            .unwrap()
            .unwrap();
        assert_eq!(found.meta.updated_at, future);
        assert!(!found.needs_push());
    }

    #[test]
    fn updated_since_is_strict() {
        let store = Store::open_in_memory().unwrap();
        let mut a = customer("a");
        let mut b = customer("b");
        b.meta.updated_at = a.meta.updated_at + Duration::seconds(1);
        store
            .transaction(|txn| {
                txn.insert(&mut a)?;
                txn.insert(&mut b)
            })
            .unwrap();

        let all = store
            .transaction(|txn| txn.updated_since::<Customer>(None, 500))
            .unwrap();
        assert_eq!(all.len(), 2);

        let after_a = store
            .transaction(|txn| txn.updated_since::<Customer>(Some(a.meta.updated_at), 500))
            .unwrap();
        assert_eq!(after_a.len(), 1);
        assert_eq!(after_a[0].data.name, "b");
    }

    #[test]
    fn children_are_found_by_parent() {
        let store = Store::open_in_memory().unwrap();
        let mut item = Entity::new(OrderItem {
            quantity: 1,
            order_id: Some(77),
            ..Default::default()
        });
        store.transaction(|txn| txn.insert(&mut item)).unwrap();

        let children = store
            .transaction(|txn| txn.children::<OrderItem>(77))
            .unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].data.order_id, Some(77));
    }

    #[test]
    fn cursors_persist_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("edge.sqlite3");
        let at = tillsync_codec::now();

        {
            let store = Store::open(&path).unwrap();
            assert!(store.cursor("Category").unwrap().is_none());
            store
                .transaction(|txn| txn.set_cursor("Category", at))
                .unwrap();
        }

        let store = Store::open(&path).unwrap();
        assert_eq!(store.cursor("Category").unwrap(), Some(at));
        assert_eq!(store.path(), Some(path.as_path()));
    }
}
