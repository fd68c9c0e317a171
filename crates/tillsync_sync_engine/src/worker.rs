//! Background sync worker.
//!
//! One dedicated thread runs cycles back to back with a wait in between.
//! `stop` wakes the wait immediately; a cycle already talking to the Cloud
//! finishes first. Panics inside a cycle are caught and counted.

use crate::config::WorkerConfig;
use crate::engine::{CycleReport, EdgeSync};
use crate::error::{SyncError, SyncResult};
use crate::transport::SyncTransport;
use chrono::{DateTime, Utc};
use parking_lot::{Condvar, Mutex};
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, warn};

/// Snapshot of the worker state.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerStatus {
    /// Whether the worker thread is alive.
    pub running: bool,
    /// When the last cycle finished.
    pub last_sync: Option<DateTime<Utc>>,
    /// Cycles run since start.
    pub cycle_count: u64,
    /// Model failures and panics since start.
    pub error_count: u64,
    /// Seconds between cycles.
    pub interval_secs: u64,
    /// Message of the most recent failure.
    pub last_error: Option<String>,
}

#[derive(Default)]
struct Stats {
    last_sync: Option<DateTime<Utc>>,
    cycle_count: u64,
    error_count: u64,
    last_error: Option<String>,
    last_report: Option<CycleReport>,
}

/// Stop flag and liveness of one worker thread. Each `start` gets a fresh
/// one, so a thread detached by a timed-out `stop` never sees a restart.
#[derive(Default)]
struct RunControl {
    stopped: Mutex<bool>,
    wake: Condvar,
    alive: Mutex<bool>,
}

impl RunControl {
    fn is_stopped(&self) -> bool {
        *self.stopped.lock()
    }

    fn is_alive(&self) -> bool {
        *self.alive.lock()
    }

    fn stop(&self) {
        *self.stopped.lock() = true;
        self.wake.notify_all();
    }
}

struct Running {
    thread: JoinHandle<()>,
    done: mpsc::Receiver<()>,
    control: Arc<RunControl>,
}

/// Runs [`EdgeSync::run_cycle`] on a schedule in a background thread.
///
/// Owned by whoever composes the Edge process; there is no global
/// instance. Starting twice is a no-op, and dropping the worker stops it.
pub struct SyncWorker<T: SyncTransport + 'static> {
    sync: Arc<EdgeSync<T>>,
    config: WorkerConfig,
    stats: Arc<Mutex<Stats>>,
    handle: Mutex<Option<Running>>,
}

impl<T: SyncTransport + 'static> SyncWorker<T> {
    /// Creates a stopped worker.
    pub fn new(sync: Arc<EdgeSync<T>>, config: WorkerConfig) -> Self {
        Self {
            sync,
            config,
            stats: Arc::new(Mutex::new(Stats::default())),
            handle: Mutex::new(None),
        }
    }

    /// Returns the engine the worker drives.
    pub fn sync(&self) -> &Arc<EdgeSync<T>> {
        &self.sync
    }

    /// Starts the worker thread.
    ///
    /// Returns `Ok(false)` without starting when edge mode is off, and
    /// `Ok(true)` if the worker is running afterwards.
    pub fn start(&self) -> SyncResult<bool> {
        if !self.config.edge_mode {
            info!("edge mode is off, sync worker not started");
            return Ok(false);
        }

        let mut handle = self.handle.lock();
        if handle.as_ref().is_some_and(|running| running.control.is_alive()) {
            debug!("sync worker already running");
            return Ok(true);
        }

        let control = Arc::new(RunControl::default());
        *control.alive.lock() = true;
        let (done_tx, done_rx) = mpsc::channel();
        let sync = Arc::clone(&self.sync);
        let stats = Arc::clone(&self.stats);
        let run = Arc::clone(&control);
        let config = self.config.clone();

        let spawned = thread::Builder::new()
            .name("tillsync-worker".into())
            .spawn(move || {
                run_loop(&sync, &run, &stats, &config);
                *run.alive.lock() = false;
                let _ = done_tx.send(());
            });
        let thread = match spawned {
            Ok(thread) => thread,
            Err(e) => {
                return Err(SyncError::configuration(format!(
                    "failed to spawn sync worker: {e}"
                )));
            }
        };

        *handle = Some(Running {
            thread,
            done: done_rx,
            control,
        });
        info!(
            interval_secs = self.config.interval.as_secs(),
            pull_every = self.config.pull_every,
            "sync worker started"
        );
        Ok(true)
    }

    /// Stops the worker and waits up to the join timeout.
    ///
    /// Returns true if the thread exited in time (or was not running).
    pub fn stop(&self) -> bool {
        let Some(running) = self.handle.lock().take() else {
            return true;
        };

        running.control.stop();

        match running.done.recv_timeout(self.config.join_timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if running.thread.join().is_err() {
                    warn!("sync worker thread panicked");
                }
                info!("sync worker stopped");
                true
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    timeout_secs = self.config.join_timeout.as_secs(),
                    "sync worker did not stop in time, detaching"
                );
                false
            }
        }
    }

    /// Returns true if the worker thread is alive.
    pub fn is_running(&self) -> bool {
        self.handle
            .lock()
            .as_ref()
            .is_some_and(|running| running.control.is_alive())
    }

    /// Returns a snapshot of the worker state.
    pub fn status(&self) -> WorkerStatus {
        let running = self.is_running();
        let stats = self.stats.lock();
        WorkerStatus {
            running,
            last_sync: stats.last_sync,
            cycle_count: stats.cycle_count,
            error_count: stats.error_count,
            interval_secs: self.config.interval.as_secs(),
            last_error: stats.last_error.clone(),
        }
    }

    /// Returns the report of the most recent completed cycle.
    pub fn last_report(&self) -> Option<CycleReport> {
        self.stats.lock().last_report.clone()
    }
}

impl<T: SyncTransport + 'static> Drop for SyncWorker<T> {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_loop<T: SyncTransport>(
    sync: &EdgeSync<T>,
    control: &RunControl,
    stats: &Mutex<Stats>,
    config: &WorkerConfig,
) {
    let mut cycle: u64 = 0;
    loop {
        if control.is_stopped() {
            break;
        }
        cycle += 1;
        // The first cycle always pulls so a fresh Edge gets reference data.
        let include_pull = (cycle - 1) % u64::from(config.pull_every.max(1)) == 0;

        let result = panic::catch_unwind(AssertUnwindSafe(|| sync.run_cycle(include_pull)));
        record(stats, cycle, result);

        let mut stopped = control.stopped.lock();
        if !*stopped {
            control
                .wake
                .wait_while_for(&mut stopped, |stopped| !*stopped, config.interval);
        }
        if *stopped {
            break;
        }
    }
    debug!(cycles = cycle, "sync worker loop exited");
}

fn record(
    stats: &Mutex<Stats>,
    cycle: u64,
    result: std::thread::Result<SyncResult<CycleReport>>,
) {
    let mut stats = stats.lock();
    stats.cycle_count += 1;
    match result {
        Ok(Ok(report)) => {
            stats.last_sync = Some(tillsync_codec::now());
            stats.error_count += report.errors.len() as u64;
            if let Some(last) = report.errors.last() {
                stats.last_error = Some(format!("{}: {}", last.model, last.message));
            }
            stats.last_report = Some(report);
        }
        Ok(Err(err)) => {
            warn!(cycle, kind = err.kind(), error = %err, "sync cycle failed");
            stats.error_count += 1;
            stats.last_error = Some(err.to_string());
        }
        Err(panic) => {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".into());
            error!(cycle, panic = %message, "sync cycle panicked");
            stats.error_count += 1;
            stats.last_error = Some(format!("panic: {message}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};
    use tillsync_store::{ModelRegistry, Store};
    use tillsync_sync_protocol::{PingResponse, PullRequest, PullResponse, PushRequest, PushResponse};

    fn engine() -> Arc<EdgeSync<Arc<MockTransport>>> {
        let store = Arc::new(Store::open_in_memory().unwrap());
        Arc::new(EdgeSync::new(
            store,
            ModelRegistry::with_defaults(),
            Arc::new(MockTransport::new()),
        ))
    }

    fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(10));
        }
        false
    }

    #[test]
    fn does_not_start_outside_edge_mode() {
        let worker = SyncWorker::new(engine(), WorkerConfig::new(false));
        assert!(!worker.start().unwrap());
        assert!(!worker.is_running());
        assert!(worker.stop());
    }

    #[test]
    fn start_is_idempotent_and_stop_is_prompt() {
        let sync = engine();
        sync.transport()
            .set_pull_response(PullResponse::new("x", Vec::new(), tillsync_codec::now()));
        let worker = SyncWorker::new(
            Arc::clone(&sync),
            WorkerConfig::new(true).with_interval(Duration::from_secs(3600)),
        );

        assert!(worker.start().unwrap());
        assert!(worker.start().unwrap());
        assert!(wait_for(|| worker.status().cycle_count >= 1));

        let begun = Instant::now();
        assert!(worker.stop());
        assert!(begun.elapsed() < Duration::from_secs(2));
        assert!(!worker.is_running());
        assert_eq!(worker.status().cycle_count, 1);
    }

    #[test]
    fn pull_runs_on_its_cadence() {
        let sync = engine();
        sync.transport()
            .set_pull_response(PullResponse::new("x", Vec::new(), tillsync_codec::now()));
        let worker = SyncWorker::new(
            Arc::clone(&sync),
            WorkerConfig::new(true)
                .with_interval(Duration::from_millis(10))
                .with_pull_every(2),
        );

        worker.start().unwrap();
        assert!(wait_for(|| worker.status().cycle_count >= 4));
        worker.stop();

        let cycles = worker.status().cycle_count as usize;
        assert_eq!(
            sync.transport().pull_calls(),
            cycles.div_ceil(2) * reference_models(&sync)
        );
    }

    fn reference_models<T: SyncTransport>(sync: &EdgeSync<T>) -> usize {
        sync.registry()
            .of_class(tillsync_model::EntityClass::Reference)
            .len()
    }

    #[test]
    fn first_cycle_pulls_reference_data() {
        let sync = engine();
        sync.transport()
            .set_pull_response(PullResponse::new("x", Vec::new(), tillsync_codec::now()));
        let worker = SyncWorker::new(
            Arc::clone(&sync),
            WorkerConfig::new(true)
                .with_interval(Duration::from_secs(3600))
                .with_pull_every(5),
        );

        worker.start().unwrap();
        assert!(wait_for(|| worker.status().cycle_count >= 1));
        assert!(worker.stop());

        assert_eq!(worker.status().cycle_count, 1);
        assert_eq!(sync.transport().pull_calls(), reference_models(&sync));
    }

    /// Pulls block until `open` is called.
    #[derive(Default)]
    struct GatedTransport {
        open: Mutex<bool>,
        opened: Condvar,
        pulls: AtomicUsize,
    }

    impl GatedTransport {
        fn open(&self) {
            *self.open.lock() = true;
            self.opened.notify_all();
        }

        fn pulls(&self) -> usize {
            self.pulls.load(Ordering::SeqCst)
        }
    }

    impl SyncTransport for GatedTransport {
        fn push(&self, request: &PushRequest) -> SyncResult<PushResponse> {
            Ok(PushResponse::success(request.model.as_str(), 0, 0, Vec::new()))
        }

        fn pull(&self, request: &PullRequest) -> SyncResult<PullResponse> {
            self.pulls.fetch_add(1, Ordering::SeqCst);
            let mut open = self.open.lock();
            self.opened.wait_while(&mut open, |open| !*open);
            Ok(PullResponse::new(
                request.model.as_str(),
                Vec::new(),
                tillsync_codec::now(),
            ))
        }

        fn ping(&self) -> SyncResult<PingResponse> {
            Ok(PingResponse::ok())
        }
    }

    #[test]
    fn detached_thread_does_not_outlive_its_stop() {
        let transport = Arc::new(GatedTransport::default());
        let sync = Arc::new(EdgeSync::new(
            Arc::new(Store::open_in_memory().unwrap()),
            ModelRegistry::with_defaults(),
            Arc::clone(&transport),
        ));
        let per_cycle = reference_models(&sync);
        let worker = SyncWorker::new(
            sync,
            WorkerConfig::new(true)
                .with_interval(Duration::from_millis(10))
                .with_join_timeout(Duration::from_millis(50)),
        );

        worker.start().unwrap();
        assert!(wait_for(|| transport.pulls() >= 1));
        assert!(!worker.stop());

        assert!(worker.start().unwrap());
        assert!(worker.is_running());
        transport.open();

        // Cycles never overlap, so pulls past the first cycle come from the
        // new thread after the detached one has finished.
        assert!(wait_for(|| transport.pulls() > 2 * per_cycle));
        assert!(worker.is_running());
        assert!(worker.stop());

        let pulls = transport.pulls();
        thread::sleep(Duration::from_millis(100));
        assert_eq!(transport.pulls(), pulls);
    }

    struct PanickingTransport;

    impl SyncTransport for PanickingTransport {
        fn push(&self, _request: &PushRequest) -> SyncResult<PushResponse> {
            panic!("transport exploded")
        }

        fn pull(&self, _request: &PullRequest) -> SyncResult<PullResponse> {
            panic!("transport exploded")
        }

        fn ping(&self) -> SyncResult<PingResponse> {
            panic!("transport exploded")
        }
    }

    #[test]
    fn panics_are_contained() {
        let store = Arc::new(Store::open_in_memory().unwrap());
        let sync = Arc::new(EdgeSync::new(
            store,
            ModelRegistry::with_defaults(),
            PanickingTransport,
        ));
        let worker = SyncWorker::new(
            sync,
            WorkerConfig::new(true).with_interval(Duration::from_millis(10)),
        );

        worker.start().unwrap();
        assert!(wait_for(|| worker.status().cycle_count >= 2));
        let status = worker.status();
        assert!(status.running);
        assert!(status.error_count >= 2);
        assert!(status.last_error.unwrap().contains("transport exploded"));
        assert!(worker.stop());
    }

    #[test]
    fn restart_after_stop() {
        let sync = engine();
        sync.transport()
            .set_pull_response(PullResponse::new("x", Vec::new(), tillsync_codec::now()));
        let worker = SyncWorker::new(
            sync,
            WorkerConfig::new(true).with_interval(Duration::from_secs(3600)),
        );

        worker.start().unwrap();
        assert!(worker.stop());
        assert!(worker.start().unwrap());
        assert!(worker.is_running());
        assert!(worker.stop());
    }
}
