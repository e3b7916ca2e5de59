//! # Recurring Job Scheduler
//!
//! Runs named periodic jobs on a per-node timer. Three registration modes:
//!
//! - `register` — every node runs the job on its own cadence; used when
//!   duplication is harmless (read-only metrics collection).
//! - `register_external_trigger_schedule` — every-node trigger with no initial
//!   delay, for cheap idempotent kicks whose work is internally deduplicated.
//! - `register_single_instance` — every node's timer fires, but the job runs
//!   only on the node that wins the cluster-wide lease for that tick; losers
//!   skip silently. Used for destructive singleton maintenance.
//!
//! A job returns a success flag; a job that fails or panics is caught and
//! logged and the schedule stays registered — the next tick still fires. Ticks
//! for one job never overlap on one node: the job runs to completion before
//! the next interval starts.

pub mod lease;

use crate::error::Result;
use chrono::Duration as ChronoDuration;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use std::future::Future;
use std::pin::pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

pub use lease::{InMemoryLeaseStore, LeaseStore, PgLeaseStore};

use crate::constants::HOUR;

pub type JobResult = Result<bool>;

/// A registered job: zero-argument async callable returning a success flag.
pub type ScheduledJob = Arc<dyn Fn() -> BoxFuture<'static, JobResult> + Send + Sync>;

/// Box an async closure into a [`ScheduledJob`].
pub fn job<F, Fut>(f: F) -> ScheduledJob
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = JobResult> + Send + 'static,
{
    Arc::new(move || Box::pin(f()))
}

pub struct Scheduler {
    node_id: String,
    lease_store: Arc<dyn LeaseStore>,
    running: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Scheduler {
    pub fn new(node_id: String, lease_store: Arc<dyn LeaseStore>) -> Self {
        Self {
            node_id,
            lease_store,
            running: Arc::new(AtomicBool::new(true)),
            shutdown: Arc::new(Notify::new()),
            handles: Mutex::new(Vec::new()),
        }
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// Every-node execution on a fixed cadence.
    pub fn register(&self, name: &str, initial_delay_ms: u64, interval_ms: u64, job: ScheduledJob) {
        self.spawn_loop(name.to_string(), initial_delay_ms, interval_ms, job, false);
    }

    /// Every-node trigger with no initial delay, for idempotent kicks that are
    /// cheap to duplicate.
    pub fn register_external_trigger_schedule(
        &self,
        name: &str,
        interval_ms: u64,
        job: ScheduledJob,
    ) {
        self.spawn_loop(name.to_string(), 0, interval_ms, job, false);
    }

    /// Single execution per tick across the whole deployment, serialized via a
    /// shared-store lease.
    pub fn register_single_instance(
        &self,
        name: &str,
        initial_delay_ms: u64,
        interval_ms: u64,
        job: ScheduledJob,
    ) {
        self.spawn_loop(name.to_string(), initial_delay_ms, interval_ms, job, true);
    }

    /// Stop all schedule loops. In-flight ticks are aborted.
    pub fn shutdown(&self) {
        info!(node_id = %self.node_id, "Scheduler shutdown requested");
        self.running.store(false, Ordering::SeqCst);
        self.shutdown.notify_waiters();
        for handle in self.handles.lock().drain(..) {
            handle.abort();
        }
    }

    fn spawn_loop(
        &self,
        name: String,
        initial_delay_ms: u64,
        interval_ms: u64,
        job: ScheduledJob,
        single_instance: bool,
    ) {
        let node_id = self.node_id.clone();
        let lease_store = self.lease_store.clone();
        let running = self.running.clone();
        let shutdown = self.shutdown.clone();

        debug!(
            schedule = %name,
            node_id = %node_id,
            interval_ms,
            single_instance,
            "Registering schedule"
        );

        let handle = tokio::spawn(async move {
            if initial_delay_ms > 0 {
                tokio::select! {
                    _ = shutdown.notified() => return,
                    _ = tokio::time::sleep(Duration::from_millis(initial_delay_ms)) => {}
                }
            }

            while running.load(Ordering::SeqCst) {
                if single_instance {
                    Self::run_single_instance_tick(
                        &name,
                        &node_id,
                        lease_store.as_ref(),
                        interval_ms,
                        &job,
                    )
                    .await;
                } else {
                    Self::run_tick(&name, &job).await;
                }

                tokio::select! {
                    _ = shutdown.notified() => break,
                    _ = tokio::time::sleep(Duration::from_millis(interval_ms)) => {}
                }
            }
        });

        self.handles.lock().push(handle);
    }

    /// Run one tick; failures and panics are contained to the tick.
    async fn run_tick(name: &str, job: &ScheduledJob) {
        let job = job.clone();
        match tokio::spawn(job()).await {
            Ok(Ok(true)) => debug!(schedule = %name, "Schedule tick completed"),
            Ok(Ok(false)) => warn!(schedule = %name, "Schedule tick reported failure"),
            Ok(Err(e)) => error!(schedule = %name, "Schedule tick failed: {}", e),
            Err(e) => error!(schedule = %name, "Schedule tick panicked: {}", e),
        }
    }

    async fn run_single_instance_tick(
        name: &str,
        node_id: &str,
        lease_store: &dyn LeaseStore,
        interval_ms: u64,
        job: &ScheduledJob,
    ) {
        // The lease spans the tick window and is left to expire rather than
        // released: releasing right after a short job would let the other
        // node's slightly-later timer win the same tick. The cap keeps a dead
        // holder from blocking a day-cadence sweep for a full interval.
        let ttl_ms = interval_ms.min(HOUR);
        let ttl = ChronoDuration::milliseconds(ttl_ms as i64);

        match lease_store.try_acquire(name, node_id, ttl).await {
            Ok(true) => {}
            Ok(false) => {
                // Contention is a normal skip, not an error.
                debug!(schedule = %name, node_id = %node_id, "Lease held elsewhere, skipping tick");
                return;
            }
            Err(e) => {
                error!(schedule = %name, "Lease claim failed, skipping tick: {}", e);
                return;
            }
        }

        // Renew the lease while the job runs so a long sweep keeps its claim;
        // afterwards the lease is retained until it expires on its own.
        let mut tick_future = pin!(Self::run_tick(name, job));
        let mut renew_timer = tokio::time::interval(Duration::from_millis((ttl_ms / 2).max(1)));
        renew_timer.tick().await; // first tick fires immediately
        loop {
            tokio::select! {
                () = &mut tick_future => break,
                _ = renew_timer.tick() => {
                    match lease_store.renew(name, node_id, ttl).await {
                        Ok(true) => {}
                        Ok(false) => warn!(
                            schedule = %name,
                            node_id = %node_id,
                            "Lease lost mid-tick, another node may now run this schedule"
                        ),
                        Err(e) => warn!(schedule = %name, "Lease renewal failed: {}", e),
                    }
                }
            }
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        for handle in self.handles.lock().drain(..) {
            handle.abort();
        }
    }
}
