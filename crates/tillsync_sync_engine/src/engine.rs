//! Push, pull and one full sync cycle.

use crate::error::{SyncError, SyncResult};
use crate::transport::SyncTransport;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tillsync_codec::{get, WireRecord};
use tillsync_model::EntityClass;
use tillsync_store::{ModelRegistry, Store, SyncModel};
use tillsync_sync_protocol::{
    PullRequest, PushRequest, RecordError, PULL_BATCH_LIMIT, PUSH_BATCH_LIMIT,
};
use tracing::{debug, info, warn};

/// Result of pushing one model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PushOutcome {
    /// Records sent and stamped.
    pub pushed: usize,
    /// Rows the Cloud created.
    pub created: u32,
    /// Rows the Cloud updated.
    pub updated: u32,
    /// Records the Cloud reported as skipped.
    pub rejected: Vec<RecordError>,
}

/// Result of pulling one model.
#[derive(Debug, Clone, PartialEq)]
pub struct PullOutcome {
    /// Records merged.
    pub pulled: usize,
    /// Records that could not be merged.
    pub skipped: Vec<RecordError>,
    /// Cursor persisted for the next pull.
    pub cursor: DateTime<Utc>,
}

/// A failure of one model within a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleError {
    /// Model name.
    pub model: String,
    /// Error category, see [`SyncError::kind`].
    pub kind: &'static str,
    /// Error message.
    pub message: String,
    /// Whether the next cycle may succeed.
    pub retryable: bool,
}

impl CycleError {
    fn new(model: &str, error: &SyncError) -> Self {
        Self {
            model: model.to_string(),
            kind: error.kind(),
            message: error.to_string(),
            retryable: error.is_retryable(),
        }
    }
}

/// Aggregated result of one sync cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleReport {
    /// When the cycle started.
    pub started_at: DateTime<Utc>,
    /// Records pushed, per model, for models that pushed anything.
    pub pushed: Vec<(String, usize)>,
    /// Records pulled, per model, for models that pulled anything.
    pub pulled: Vec<(String, usize)>,
    /// Whether the pull phase ran.
    pub pull_ran: bool,
    /// Per-model failures.
    pub errors: Vec<CycleError>,
    /// Wall time of the cycle.
    pub duration: std::time::Duration,
}

impl CycleReport {
    fn new() -> Self {
        Self {
            started_at: tillsync_codec::now(),
            pushed: Vec::new(),
            pulled: Vec::new(),
            pull_ran: false,
            errors: Vec::new(),
            duration: std::time::Duration::ZERO,
        }
    }

    /// Total records pushed.
    pub fn total_pushed(&self) -> usize {
        self.pushed.iter().map(|(_, n)| n).sum()
    }

    /// Total records pulled.
    pub fn total_pulled(&self) -> usize {
        self.pulled.iter().map(|(_, n)| n).sum()
    }

    /// Returns true if no model failed.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Edge side of sync: pushes transactional rows and pulls reference rows.
///
/// Each push and pull uses its own store transactions. [`EdgeSync::run_cycle`]
/// refuses to start while another cycle is running.
pub struct EdgeSync<T: SyncTransport> {
    store: Arc<Store>,
    registry: ModelRegistry,
    transport: T,
    cycle_guard: Mutex<()>,
}

impl<T: SyncTransport> EdgeSync<T> {
    /// Creates an engine over a store, a model registry and a transport.
    pub fn new(store: Arc<Store>, registry: ModelRegistry, transport: T) -> Self {
        Self {
            store,
            registry,
            transport,
            cycle_guard: Mutex::new(()),
        }
    }

    /// Returns the local store.
    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// Returns the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Returns the model registry.
    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    fn model(&self, name: &str, class: EntityClass) -> SyncResult<Arc<dyn SyncModel>> {
        let model = self
            .registry
            .get(name)
            .ok_or_else(|| SyncError::validation(format!("unknown model: {name}")))?;
        if model.class() != class {
            return Err(SyncError::validation(format!(
                "{name} is a {} model",
                model.class().as_str()
            )));
        }
        Ok(model)
    }

    /// Pushes up to one batch of dirty rows of a transactional model.
    ///
    /// Rows are stamped only after the Cloud acknowledges the batch; on any
    /// failure they stay dirty and go out again next time.
    pub fn push_model(&self, name: &str) -> SyncResult<PushOutcome> {
        let model = self.model(name, EntityClass::Transactional)?;
        let batch = self
            .store
            .transaction(|txn| model.prepare_push(txn, PUSH_BATCH_LIMIT))?;
        if batch.is_empty() {
            debug!(model = name, "nothing to push");
            return Ok(PushOutcome::default());
        }

        let pushed = batch.records.len();
        let response = self
            .transport
            .push(&PushRequest::new(name, batch.records))?;
        if !response.success {
            return Err(SyncError::Rejected(
                response.error.unwrap_or_else(|| "push rejected".into()),
            ));
        }

        let stamped = self
            .store
            .transaction(|txn| txn.mark_synced(&batch.stamps, tillsync_codec::now()))?;
        for error in &response.errors {
            warn!(
                model = name,
                external_id = error.external_id.as_deref().unwrap_or("-"),
                error = %error.error,
                "record skipped by cloud"
            );
        }
        info!(
            model = name,
            pushed,
            stamped,
            created = response.created,
            updated = response.updated,
            "pushed"
        );

        Ok(PushOutcome {
            pushed,
            created: response.created,
            updated: response.updated,
            rejected: response.errors,
        })
    }

    /// Pulls one batch of a reference model.
    ///
    /// `since` defaults to the persisted cursor. Every record is merged in
    /// its own savepoint; bad records are skipped and reported while the
    /// rest of the batch and the new cursor commit together.
    pub fn pull_model(&self, name: &str, since: Option<DateTime<Utc>>) -> SyncResult<PullOutcome> {
        let model = self.model(name, EntityClass::Reference)?;
        let stored = self.store.cursor(name)?;
        let since = since.or(stored);

        let response = self.transport.pull(&PullRequest::new(name, since))?;
        if !response.success {
            return Err(SyncError::Rejected(
                response.error.unwrap_or_else(|| "pull rejected".into()),
            ));
        }

        let at = tillsync_codec::now();
        let capped = response.records.len() >= PULL_BATCH_LIMIT;
        let next = next_cursor(&response.records, response.timestamp, since, capped);
        let cursor = stored.map_or(next, |stored| stored.max(next));

        let outcome = self.store.transaction(|txn| {
            let mut pulled = 0;
            let mut skipped = Vec::new();
            for record in &response.records {
                match txn.savepoint(|txn| model.merge(txn, record, at)) {
                    Ok(_) => pulled += 1,
                    Err(err) if err.is_record_error() => {
                        let external_id = record
                            .get("external_id")
                            .and_then(|v| v.as_str())
                            .map(str::to_string);
                        warn!(
                            model = name,
                            external_id = external_id.as_deref().unwrap_or("-"),
                            error = %err,
                            "skipping pulled record"
                        );
                        skipped.push(RecordError::new(external_id, err.to_string()));
                    }
                    Err(err) => return Err(SyncError::from(err)),
                }
            }
            txn.set_cursor(name, cursor)?;
            Ok(PullOutcome {
                pulled,
                skipped,
                cursor,
            })
        })?;

        info!(
            model = name,
            pulled = outcome.pulled,
            skipped = outcome.skipped.len(),
            capped,
            "pulled"
        );
        Ok(outcome)
    }

    /// Runs one cycle: push every transactional model, then, if
    /// `include_pull`, pull every reference model.
    ///
    /// Model failures are collected in the report and do not stop the
    /// cycle, except an authentication failure, which ends it.
    pub fn run_cycle(&self, include_pull: bool) -> SyncResult<CycleReport> {
        let Some(_guard) = self.cycle_guard.try_lock() else {
            return Err(SyncError::CycleInProgress);
        };
        let start = Instant::now();
        let mut report = CycleReport::new();

        for model in self.registry.of_class(EntityClass::Transactional) {
            let name = model.type_name();
            match self.push_model(name) {
                Ok(outcome) if outcome.pushed > 0 => {
                    report.pushed.push((name.to_string(), outcome.pushed))
                }
                Ok(_) => {}
                Err(err) => {
                    warn!(model = name, kind = err.kind(), error = %err, "push failed");
                    let fatal = matches!(err, SyncError::Auth(_));
                    report.errors.push(CycleError::new(name, &err));
                    if fatal {
                        report.duration = start.elapsed();
                        return Ok(report);
                    }
                }
            }
        }

        if include_pull {
            report.pull_ran = true;
            for model in self.registry.of_class(EntityClass::Reference) {
                let name = model.type_name();
                match self.pull_model(name, None) {
                    Ok(outcome) if outcome.pulled > 0 => {
                        report.pulled.push((name.to_string(), outcome.pulled))
                    }
                    Ok(_) => {}
                    Err(err) => {
                        warn!(model = name, kind = err.kind(), error = %err, "pull failed");
                        let fatal = matches!(err, SyncError::Auth(_));
                        report.errors.push(CycleError::new(name, &err));
                        if fatal {
                            break;
                        }
                    }
                }
            }
        }

        report.duration = start.elapsed();
        info!(
            pushed = report.total_pushed(),
            pulled = report.total_pulled(),
            errors = report.errors.len(),
            elapsed_ms = report.duration.as_millis() as u64,
            "sync cycle finished"
        );
        Ok(report)
    }
}

/// Picks the cursor for the next pull.
///
/// A full batch may have left rows behind, so the cursor only moves to the
/// newest returned `updated_at`, less one microsecond so rows sharing that
/// instant are fetched again. When that would not move past `since`, the
/// newest instant itself is used.
fn next_cursor(
    records: &[WireRecord],
    timestamp: DateTime<Utc>,
    since: Option<DateTime<Utc>>,
    capped: bool,
) -> DateTime<Utc> {
    if !capped {
        return timestamp;
    }
    let newest = records
        .iter()
        .filter_map(|record| get::<DateTime<Utc>>(record, "updated_at").ok().flatten())
        .max();
    let Some(newest) = newest else {
        return timestamp;
    };

    let behind = newest - Duration::microseconds(1);
    match since {
        Some(since) if behind <= since => newest,
        _ => behind,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;
    use chrono::TimeZone;
    use proptest::prelude::*;
    use serde_json::json;
    use tillsync_codec::{put, Money};
    use tillsync_model::{Category, Customer, Entity, ExternalId};
    use tillsync_sync_protocol::{PullResponse, PushResponse};

    fn engine() -> EdgeSync<Arc<MockTransport>> {
        let store = Arc::new(Store::open_in_memory().unwrap());
        EdgeSync::new(
            store,
            ModelRegistry::with_defaults(),
            Arc::new(MockTransport::new()),
        )
    }

    fn add_customer(sync: &EdgeSync<Arc<MockTransport>>, name: &str) {
        sync.store()
            .transaction(|txn| {
                txn.insert(&mut Entity::new(Customer {
                    name: name.into(),
                    total_spent: Money::from_cents(500),
                    branch_id: 1,
                    ..Default::default()
                }))
            })
            .unwrap();
    }

    fn record(value: serde_json::Value) -> WireRecord {
        value.as_object().cloned().unwrap()
    }

    fn at(secs: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, secs).unwrap()
    }

    #[test]
    fn push_without_dirty_rows_skips_network() {
        let sync = engine();
        let outcome = sync.push_model("Customer").unwrap();
        assert_eq!(outcome.pushed, 0);
        assert_eq!(sync.transport().push_calls(), 0);
    }

    #[test]
    fn push_stamps_rows_after_ack() {
        let sync = engine();
        add_customer(&sync, "Alice");
        add_customer(&sync, "Bob");
        sync.transport()
            .set_push_response(PushResponse::success("Customer", 2, 0, Vec::new()));

        let outcome = sync.push_model("Customer").unwrap();
        assert_eq!(outcome.pushed, 2);
        assert_eq!(outcome.created, 2);

        let sent = &sync.transport().pushes()[0];
        assert_eq!(sent.model, "Customer");
        assert!(sent.records.iter().all(|r| r["external_id"].is_string()));

        let again = sync.push_model("Customer").unwrap();
        assert_eq!(again.pushed, 0);
        assert_eq!(sync.transport().push_calls(), 1);
    }

    #[test]
    fn failed_push_leaves_rows_dirty_with_same_ids() {
        let sync = engine();
        add_customer(&sync, "Alice");
        sync.transport().set_online(false);

        let err = sync.push_model("Customer").unwrap_err();
        assert!(err.is_retryable());

        sync.transport().set_online(true);
        sync.transport()
            .set_push_response(PushResponse::success("Customer", 1, 0, Vec::new()));
        sync.push_model("Customer").unwrap();

        let pushes = sync.transport().pushes();
        assert_eq!(pushes.len(), 2);
        assert_eq!(
            pushes[0].records[0]["external_id"],
            pushes[1].records[0]["external_id"]
        );
    }

    #[test]
    fn rejected_push_leaves_rows_dirty() {
        let sync = engine();
        add_customer(&sync, "Alice");
        sync.transport()
            .set_push_response(PushResponse::error("database is locked"));

        assert!(matches!(
            sync.push_model("Customer"),
            Err(SyncError::Rejected(_))
        ));
        let dirty = sync
            .store()
            .transaction(|txn| txn.dirty::<Customer>(10))
            .unwrap();
        assert_eq!(dirty.len(), 1);
    }

    #[test]
    fn direction_is_enforced() {
        let sync = engine();
        assert_eq!(sync.push_model("Category").unwrap_err().kind(), "validation");
        assert_eq!(sync.pull_model("Order", None).unwrap_err().kind(), "validation");
        assert_eq!(sync.push_model("Nope").unwrap_err().kind(), "validation");
        assert_eq!(sync.transport().push_calls(), 0);
        assert_eq!(sync.transport().pull_calls(), 0);
    }

    #[test]
    fn pull_merges_and_persists_cursor() {
        let sync = engine();
        sync.transport().set_pull_response(PullResponse::new(
            "Category",
            vec![
                record(json!({"external_id": "cat-123", "name": "Drinks", "updated_at": "2026-03-01T07:00:00Z"})),
                record(json!({"name": "no id"})),
            ],
            at(0),
        ));

        let outcome = sync.pull_model("Category", None).unwrap();
        assert_eq!(outcome.pulled, 1);
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.cursor, at(0));
        assert_eq!(sync.store().cursor("Category").unwrap(), Some(at(0)));

        let stored = sync
            .store()
            .transaction(|txn| {
                txn.find_by_external_id::<Category>(&ExternalId::parse("cat-123").unwrap())
            })
            .unwrap()
            .unwrap();
        assert_eq!(stored.data.name, "Drinks");
        assert!(!stored.needs_push());

        sync.pull_model("Category", None).unwrap();
        assert_eq!(sync.transport().pulls()[1].since, Some(at(0)));
    }

    #[test]
    fn cursor_never_moves_backward() {
        let sync = engine();
        sync.transport()
            .set_pull_response(PullResponse::new("Category", Vec::new(), at(30)));
        sync.pull_model("Category", None).unwrap();

        sync.transport()
            .set_pull_response(PullResponse::new("Category", Vec::new(), at(10)));
        let outcome = sync.pull_model("Category", Some(at(5))).unwrap();
        assert_eq!(outcome.cursor, at(30));
    }

    #[test]
    fn capped_batch_resumes_from_newest_record() {
        let rows: Vec<_> = (0..PULL_BATCH_LIMIT)
            .map(|i| record(json!({"updated_at": format!("2026-03-01T08:00:{:02}Z", i % 20)})))
            .collect();
        let cursor = next_cursor(&rows, at(59), None, true);
        assert_eq!(cursor, at(19) - Duration::microseconds(1));

        let same_instant = vec![record(json!({"updated_at": "2026-03-01T08:00:19Z"}))];
        let stuck_since = Some(at(19) - Duration::microseconds(1));
        assert_eq!(next_cursor(&same_instant, at(59), stuck_since, true), at(19));

        assert_eq!(next_cursor(&rows, at(59), None, false), at(59));
    }

    proptest! {
        #[test]
        fn capped_cursor_advances_within_the_batch(
            offsets in prop::collection::vec(1i64..5_000_000, 1..64)
        ) {
            let since = at(0);
            let rows: Vec<WireRecord> = offsets
                .iter()
                .map(|micros| {
                    let mut row = WireRecord::new();
                    put(&mut row, "updated_at", &(since + Duration::microseconds(*micros)));
                    row
                })
                .collect();
            let newest = since + Duration::microseconds(offsets.iter().copied().max().unwrap());

            let cursor = next_cursor(&rows, at(59), Some(since), true);
            prop_assert!(cursor > since);
            prop_assert!(cursor <= newest);
        }
    }

    #[test]
    fn cycle_collects_errors_and_keeps_going() {
        let sync = engine();
        add_customer(&sync, "Alice");
        sync.transport()
            .set_push_response(PushResponse::success("Customer", 1, 0, Vec::new()));
        sync.transport()
            .set_pull_response(PullResponse::new("Category", Vec::new(), at(0)));

        let report = sync.run_cycle(true).unwrap();
        assert_eq!(report.pushed, vec![("Customer".to_string(), 1)]);
        assert!(report.pull_ran);
        assert!(report.is_clean());

        let report = sync.run_cycle(false).unwrap();
        assert!(!report.pull_ran);
        assert_eq!(report.total_pushed(), 0);
    }

    #[test]
    fn auth_failure_ends_the_cycle() {
        let sync = engine();
        add_customer(&sync, "Alice");
        sync.transport()
            .fail_next(SyncError::Auth("Invalid or missing token".into()));

        let report = sync.run_cycle(true).unwrap();
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].kind, "auth");
        assert!(!report.pull_ran);
        assert_eq!(sync.transport().pull_calls(), 0);
    }

    #[test]
    fn cycles_do_not_overlap() {
        let sync = engine();
        let _held = sync.cycle_guard.lock();
        assert!(matches!(
            sync.run_cycle(true),
            Err(SyncError::CycleInProgress)
        ));
    }
}
