//! Per-domain periodic refresh.
//!
//! Each registered domain gets its own ticker. A tick spawns a guarded run
//! of the domain's fetch-and-render function; the guard keeps at most one
//! run per domain outstanding. Scheduled firings that hit a busy domain are
//! dropped. Manual firings ([`PollScheduler::refresh_now`]) that hit a busy
//! domain are folded into a single follow-up run.

use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use homeboard_protocol::Domain;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::errors::{RefreshError, SchedulerError};

pub type RefreshFuture = BoxFuture<'static, Result<(), RefreshError>>;

/// Fetch one domain and apply the result to its widget.
pub type RefreshFn = Arc<dyn Fn() -> RefreshFuture + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Scheduled,
    Manual,
}

/// What a call to the guarded run path did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Failed,
    /// Scheduled firing dropped because a run was in flight.
    Skipped,
    /// Manual firing folded into a follow-up of the in-flight run.
    Deferred,
}

struct DomainRefreshTask {
    domain: Domain,
    interval: Duration,
    fetch_and_render: RefreshFn,
    last_run_at: Mutex<Option<Instant>>,
    in_flight: AtomicBool,
    rerun: AtomicBool,
}

pub struct PollScheduler {
    tasks: BTreeMap<Domain, Arc<DomainRefreshTask>>,
    started: AtomicBool,
    cancel: CancellationToken,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Default for PollScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl PollScheduler {
    pub fn new() -> Self {
        Self {
            tasks: BTreeMap::new(),
            started: AtomicBool::new(false),
            cancel: CancellationToken::new(),
            handles: Mutex::new(Vec::new()),
        }
    }

    pub fn register(
        &mut self,
        domain: Domain,
        interval: Duration,
        fetch_and_render: RefreshFn,
    ) -> Result<(), SchedulerError> {
        if self.started.load(Ordering::Acquire) {
            return Err(SchedulerError::AlreadyStarted);
        }
        if interval.is_zero() {
            return Err(SchedulerError::ZeroInterval { domain });
        }
        if self.tasks.contains_key(&domain) {
            return Err(SchedulerError::DuplicateDomain { domain });
        }
        self.tasks.insert(
            domain,
            Arc::new(DomainRefreshTask {
                domain,
                interval,
                fetch_and_render,
                last_run_at: Mutex::new(None),
                in_flight: AtomicBool::new(false),
                rerun: AtomicBool::new(false),
            }),
        );
        Ok(())
    }

    pub fn domains(&self) -> impl Iterator<Item = (Domain, Duration)> + '_ {
        self.tasks.values().map(|t| (t.domain, t.interval))
    }

    /// Run every domain once, concurrently, and arm each domain's ticker.
    /// Must be called from within a tokio runtime.
    pub fn start(&self) -> Result<(), SchedulerError> {
        if self.started.swap(true, Ordering::AcqRel) {
            return Err(SchedulerError::AlreadyStarted);
        }

        let mut handles = self.handles.lock().unwrap_or_else(|e| e.into_inner());
        for task in self.tasks.values() {
            handles.push(tokio::spawn(tick_loop(task.clone(), self.cancel.clone())));
        }
        info!(event = "core.scheduler.started", domains = self.tasks.len());
        Ok(())
    }

    /// Out-of-cycle refresh of one domain through the same guard as the
    /// ticker. Resolves once the run (or the follow-up it was folded into)
    /// has been arranged; a `Deferred` outcome means the in-flight run will
    /// repeat once it finishes.
    pub async fn refresh_now(&self, domain: Domain) -> Result<RunOutcome, SchedulerError> {
        let task = self
            .tasks
            .get(&domain)
            .ok_or(SchedulerError::UnknownDomain { domain })?;
        Ok(try_run(task.clone(), Trigger::Manual).await)
    }

    pub fn is_in_flight(&self, domain: Domain) -> bool {
        self.tasks
            .get(&domain)
            .is_some_and(|t| t.in_flight.load(Ordering::Acquire))
    }

    pub fn last_run_at(&self, domain: Domain) -> Option<Instant> {
        self.tasks
            .get(&domain)
            .and_then(|t| *t.last_run_at.lock().unwrap_or_else(|e| e.into_inner()))
    }

    /// Stop all tickers. Runs already in flight are left to finish.
    pub fn shutdown(&self) {
        self.cancel.cancel();
        let handles = std::mem::take(&mut *self.handles.lock().unwrap_or_else(|e| e.into_inner()));
        debug!(event = "core.scheduler.shutdown", tickers = handles.len());
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn tick_loop(task: Arc<DomainRefreshTask>, cancel: CancellationToken) {
    tokio::spawn(try_run(task.clone(), Trigger::Scheduled));

    let mut ticker = tokio::time::interval_at(Instant::now() + task.interval, task.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                // Spawned so the ticker keeps firing while a run is slow.
                tokio::spawn(try_run(task.clone(), Trigger::Scheduled));
            }
        }
    }
}

async fn try_run(task: Arc<DomainRefreshTask>, trigger: Trigger) -> RunOutcome {
    if task
        .in_flight
        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        .is_err()
    {
        return match trigger {
            Trigger::Scheduled => {
                debug!(
                    event = "core.scheduler.run_skipped",
                    domain = %task.domain,
                );
                RunOutcome::Skipped
            }
            Trigger::Manual => {
                task.rerun.store(true, Ordering::Release);
                debug!(
                    event = "core.scheduler.run_deferred",
                    domain = %task.domain,
                );
                RunOutcome::Deferred
            }
        };
    }

    loop {
        // Requests that arrived before this run starts are satisfied by it.
        task.rerun.store(false, Ordering::Release);
        let outcome = run_once(&task).await;

        if task.rerun.load(Ordering::Acquire) {
            continue;
        }
        task.in_flight.store(false, Ordering::Release);

        // A manual request can land between the check and the release.
        if !task.rerun.load(Ordering::Acquire)
            || task
                .in_flight
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
        {
            return outcome;
        }
    }
}

async fn run_once(task: &DomainRefreshTask) -> RunOutcome {
    *task.last_run_at.lock().unwrap_or_else(|e| e.into_inner()) = Some(Instant::now());
    let started = Instant::now();

    let result = AssertUnwindSafe(async { (task.fetch_and_render)().await })
        .catch_unwind()
        .await
        .unwrap_or(Err(RefreshError::Panicked));

    match result {
        Ok(()) => {
            debug!(
                event = "core.scheduler.run_completed",
                domain = %task.domain,
                duration_ms = started.elapsed().as_millis() as u64,
            );
            RunOutcome::Completed
        }
        Err(e) => {
            warn!(
                event = "core.scheduler.run_failed",
                domain = %task.domain,
                error = %e,
                error_code = e.error_code(),
            );
            RunOutcome::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    use tokio::sync::Semaphore;

    use crate::errors::FetchError;

    fn counting(counter: Arc<AtomicUsize>) -> RefreshFn {
        Arc::new(move || -> RefreshFuture {
            counter.fetch_add(1, Ordering::SeqCst);
            Box::pin(async { Ok(()) })
        })
    }

    /// Each run takes a permit from `gate` before finishing.
    fn gated(counter: Arc<AtomicUsize>, gate: Arc<Semaphore>) -> RefreshFn {
        Arc::new(move || -> RefreshFuture {
            counter.fetch_add(1, Ordering::SeqCst);
            let gate = gate.clone();
            Box::pin(async move {
                if let Ok(permit) = gate.acquire().await {
                    permit.forget();
                }
                Ok(())
            })
        })
    }

    #[test]
    fn test_register_rejects_zero_interval_and_duplicates() {
        let mut scheduler = PollScheduler::new();
        let counter = Arc::new(AtomicUsize::new(0));
        assert!(matches!(
            scheduler.register(Domain::Lights, Duration::ZERO, counting(counter.clone())),
            Err(SchedulerError::ZeroInterval { .. })
        ));
        scheduler
            .register(Domain::Lights, Duration::from_secs(10), counting(counter.clone()))
            .unwrap();
        assert!(matches!(
            scheduler.register(Domain::Lights, Duration::from_secs(5), counting(counter)),
            Err(SchedulerError::DuplicateDomain { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_runs_every_domain_immediately_then_on_cadence() {
        let mut scheduler = PollScheduler::new();
        let fast = Arc::new(AtomicUsize::new(0));
        let slow = Arc::new(AtomicUsize::new(0));
        scheduler
            .register(Domain::Lights, Duration::from_secs(10), counting(fast.clone()))
            .unwrap();
        scheduler
            .register(Domain::Weather, Duration::from_secs(600), counting(slow.clone()))
            .unwrap();
        scheduler.start().unwrap();

        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(fast.load(Ordering::SeqCst), 1);
        assert_eq!(slow.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(fast.load(Ordering::SeqCst), 4);
        assert_eq!(slow.load(Ordering::SeqCst), 1);
        assert!(scheduler.start().is_err());
        scheduler.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_domain_does_not_block_others() {
        let mut scheduler = PollScheduler::new();
        let stuck = Arc::new(AtomicUsize::new(0));
        let healthy = Arc::new(AtomicUsize::new(0));
        scheduler
            .register(
                Domain::Cameras,
                Duration::from_secs(15),
                gated(stuck.clone(), Arc::new(Semaphore::new(0))),
            )
            .unwrap();
        scheduler
            .register(Domain::Media, Duration::from_secs(10), counting(healthy.clone()))
            .unwrap();
        scheduler.start().unwrap();

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(healthy.load(Ordering::SeqCst), 7);
        // One run started and never finished; every later tick was dropped.
        assert_eq!(stuck.load(Ordering::SeqCst), 1);
        assert!(scheduler.is_in_flight(Domain::Cameras));
        scheduler.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduled_firing_during_flight_is_dropped_not_queued() {
        let mut scheduler = PollScheduler::new();
        let runs = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(Semaphore::new(0));
        scheduler
            .register(Domain::Kanban, Duration::from_secs(10), gated(runs.clone(), gate.clone()))
            .unwrap();
        scheduler.start().unwrap();

        // Immediate run is in flight across three ticks.
        tokio::time::sleep(Duration::from_secs(35)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        gate.add_permits(1);
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(!scheduler.is_in_flight(Domain::Kanban));
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        // The next tick at 40s runs normally; nothing was queued.
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 2);
        scheduler.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_does_not_delay_next_run() {
        let mut scheduler = PollScheduler::new();
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();
        let failing: RefreshFn = Arc::new(move || -> RefreshFuture {
            counter.fetch_add(1, Ordering::SeqCst);
            Box::pin(async {
                Err(RefreshError::Fetch(FetchError::Status {
                    url: "http://h/api/news".to_string(),
                    status: 502,
                }))
            })
        });
        scheduler
            .register(Domain::News, Duration::from_secs(60), failing)
            .unwrap();
        scheduler.start().unwrap();

        tokio::time::sleep(Duration::from_secs(121)).await;
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        scheduler.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_refresh_is_contained() {
        let mut scheduler = PollScheduler::new();
        fn explode() -> Result<(), RefreshError> {
            panic!("render exploded")
        }
        let panicking: RefreshFn = Arc::new(|| -> RefreshFuture { Box::pin(async { explode() }) });
        scheduler
            .register(Domain::Topology, Duration::from_secs(60), panicking)
            .unwrap();
        assert_eq!(
            scheduler.refresh_now(Domain::Topology).await.unwrap(),
            RunOutcome::Failed
        );
        assert!(!scheduler.is_in_flight(Domain::Topology));
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_refresh_during_flight_runs_exactly_one_follow_up() {
        let mut scheduler = PollScheduler::new();
        let runs = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(Semaphore::new(0));
        scheduler
            .register(Domain::Lights, Duration::from_secs(3600), gated(runs.clone(), gate.clone()))
            .unwrap();
        let scheduler = Arc::new(scheduler);

        let first = tokio::spawn({
            let scheduler = scheduler.clone();
            async move { scheduler.refresh_now(Domain::Lights).await }
        });
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        // Two manual requests while busy coalesce into one follow-up.
        assert_eq!(
            scheduler.refresh_now(Domain::Lights).await.unwrap(),
            RunOutcome::Deferred
        );
        assert_eq!(
            scheduler.refresh_now(Domain::Lights).await.unwrap(),
            RunOutcome::Deferred
        );

        gate.add_permits(1);
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 2);
        assert!(scheduler.is_in_flight(Domain::Lights));

        gate.add_permits(1);
        assert_eq!(first.await.unwrap().unwrap(), RunOutcome::Completed);
        assert_eq!(runs.load(Ordering::SeqCst), 2);
        assert!(!scheduler.is_in_flight(Domain::Lights));
        assert!(scheduler.last_run_at(Domain::Lights).is_some());
    }

    #[tokio::test]
    async fn test_refresh_now_unknown_domain() {
        let scheduler = PollScheduler::new();
        assert!(matches!(
            scheduler.refresh_now(Domain::Chat).await,
            Err(SchedulerError::UnknownDomain { .. })
        ));
    }
}
