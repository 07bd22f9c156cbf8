//! Per-repository timers and the reconciliation sweep.
//!
//! The scheduler keeps one timer task per automation-enabled repository.
//! A timer sleeps until the next local fire time, spawns a scheduled run
//! and computes the following fire time; cancelling the timer never
//! interrupts a run it already spawned. Jobs live only in memory. The
//! periodic reconciliation sweep recreates any enabled repository's job
//! that is missing or whose timer died, and tears down jobs whose
//! configuration is gone or disabled.
//!
//! Sweeps and [`RepositoryScheduler::sync_repository`] are serialized and
//! the latter always schedules from a fresh read, so a sweep working from
//! a listing taken before a concurrent change is corrected by the sync
//! that follows the change.

use super::{AutomationResult, RepositoryRunner, SchedulerError};
use crate::automation::domain::RunReport;
use crate::proposal::domain::RunTrigger;
use crate::repository::{
    domain::{RepositoryAutomationConfig, RepositoryId},
    ports::AutomationConfigRepository,
};
use crate::schedule::{DailyTime, RecurrenceRule, ScheduleTimeZone, next_fire_instant};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{Mutex as AsyncMutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const MIN_RECONCILE_INTERVAL: Duration = Duration::from_secs(1);

/// Read-only view of a registered job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSnapshot {
    /// Repository the job fires for.
    pub repository_id: RepositoryId,
    /// Local time of day.
    pub scheduled_time: DailyTime,
    /// Zone the time is interpreted in.
    pub timezone: ScheduleTimeZone,
    /// Derived recurrence rule.
    pub recurrence_rule: RecurrenceRule,
    /// Next fire instant.
    pub next_fire: DateTime<Utc>,
    /// Whether the timer task is still alive.
    pub live: bool,
}

struct ScheduledJob {
    scheduled_time: DailyTime,
    timezone: ScheduleTimeZone,
    cancel: CancellationToken,
    timer: JoinHandle<()>,
    next_fire: watch::Receiver<DateTime<Utc>>,
}

impl ScheduledJob {
    fn is_live(&self) -> bool {
        !self.cancel.is_cancelled() && !self.timer.is_finished()
    }

    fn stop(&self) {
        self.cancel.cancel();
    }

    fn snapshot(&self, repository_id: RepositoryId) -> JobSnapshot {
        JobSnapshot {
            repository_id,
            scheduled_time: self.scheduled_time,
            timezone: self.timezone.clone(),
            recurrence_rule: self.scheduled_time.recurrence_rule(),
            next_fire: *self.next_fire.borrow(),
            live: self.is_live(),
        }
    }
}

struct Reconciler {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Owns the timers of every automation-enabled repository.
pub struct RepositoryScheduler<S, N, C>
where
    S: AutomationConfigRepository + 'static,
    N: RepositoryRunner + 'static,
    C: Clock + Send + Sync + 'static,
{
    configs: Arc<S>,
    runner: Arc<N>,
    clock: Arc<C>,
    reconcile_interval: Duration,
    jobs: Mutex<HashMap<RepositoryId, ScheduledJob>>,
    reconciler: Mutex<Option<Reconciler>>,
    sync: AsyncMutex<()>,
}

impl<S, N, C> RepositoryScheduler<S, N, C>
where
    S: AutomationConfigRepository + 'static,
    N: RepositoryRunner + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a stopped scheduler with no jobs.
    #[must_use]
    pub fn new(
        configs: Arc<S>,
        runner: Arc<N>,
        clock: Arc<C>,
        reconcile_interval: Duration,
    ) -> Self {
        Self {
            configs,
            runner,
            clock,
            reconcile_interval: reconcile_interval.max(MIN_RECONCILE_INTERVAL),
            jobs: Mutex::new(HashMap::new()),
            reconciler: Mutex::new(None),
            sync: AsyncMutex::new(()),
        }
    }

    /// Replaces the job of a repository according to its configuration.
    ///
    /// Any existing job is stopped first. A disabled configuration leaves
    /// the repository unscheduled. The job follows the given snapshot;
    /// callers reacting to a stored change use
    /// [`sync_repository`](Self::sync_repository) instead. Must be called
    /// within a Tokio runtime.
    pub fn schedule_repository(&self, config: &RepositoryAutomationConfig) {
        let repository_id = config.id();
        let mut jobs = self.lock_jobs();
        if let Some(previous) = jobs.remove(&repository_id) {
            previous.stop();
            debug!(repository_id = %repository_id, "stopped previous job");
        }

        if !config.automation_enabled() {
            info!(
                repository_id = %repository_id,
                repository = %config.full_name(),
                "automation disabled; not scheduling"
            );
            return;
        }

        let job = self.spawn_job(config);
        info!(
            repository_id = %repository_id,
            repository = %config.full_name(),
            rule = %config.recurrence_rule(),
            time = %config.scheduled_time(),
            timezone = config.timezone().name(),
            next_fire = %*job.next_fire.borrow(),
            "scheduled repository"
        );
        jobs.insert(repository_id, job);
    }

    /// Stops and removes the job of a repository, if any.
    pub fn unschedule_repository(&self, repository_id: RepositoryId) {
        if let Some(job) = self.lock_jobs().remove(&repository_id) {
            job.stop();
            info!(repository_id = %repository_id, "unscheduled repository");
        }
    }

    /// Brings the job of a repository in line with its stored
    /// configuration.
    ///
    /// The configuration is re-read after any sweep in progress has
    /// finished. A missing or disabled configuration leaves the repository
    /// unscheduled. Returns the configuration that was read.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Config`] when the lookup fails; the
    /// existing job is left untouched in that case.
    pub async fn sync_repository(
        &self,
        repository_id: RepositoryId,
    ) -> Result<Option<RepositoryAutomationConfig>, SchedulerError> {
        let _guard = self.sync.lock().await;
        let Some(config) = self.configs.find_by_id(repository_id).await? else {
            self.unschedule_repository(repository_id);
            return Ok(None);
        };
        self.schedule_repository(&config);
        Ok(Some(config))
    }

    /// Rebuilds the job of a repository from its stored configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::RepositoryNotFound`] when the
    /// configuration no longer exists; its job is removed in that case.
    /// Returns [`SchedulerError::Config`] when the lookup fails.
    pub async fn update_repository_schedule(
        &self,
        repository_id: RepositoryId,
    ) -> Result<(), SchedulerError> {
        self.sync_repository(repository_id)
            .await?
            .map(|_| ())
            .ok_or(SchedulerError::RepositoryNotFound(repository_id))
    }

    /// Schedules every enabled repository without a live job and
    /// unschedules every job without an enabled configuration.
    ///
    /// Returns the number of jobs created.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Config`] when enabled configurations
    /// cannot be listed.
    pub async fn run_reconciliation_sweep(&self) -> Result<usize, SchedulerError> {
        let _guard = self.sync.lock().await;
        let enabled = self.configs.list_enabled().await?;
        let enabled_ids: HashSet<RepositoryId> =
            enabled.iter().map(RepositoryAutomationConfig::id).collect();

        let orphans: Vec<RepositoryId> = self
            .lock_jobs()
            .keys()
            .filter(|repository_id| !enabled_ids.contains(*repository_id))
            .copied()
            .collect();
        for repository_id in &orphans {
            warn!(
                repository_id = %repository_id,
                "job has no enabled configuration; unscheduling"
            );
            self.unschedule_repository(*repository_id);
        }

        let mut rescheduled = 0_usize;
        for config in &enabled {
            let live = self
                .lock_jobs()
                .get(&config.id())
                .is_some_and(ScheduledJob::is_live);
            if !live {
                warn!(
                    repository_id = %config.id(),
                    repository = %config.full_name(),
                    "enabled repository has no live job; rescheduling"
                );
                self.schedule_repository(config);
                rescheduled = rescheduled.saturating_add(1);
            }
        }
        debug!(
            enabled = enabled.len(),
            rescheduled,
            unscheduled = orphans.len(),
            "reconciliation sweep finished"
        );
        Ok(rescheduled)
    }

    /// Schedules all enabled repositories and starts the periodic
    /// reconciliation sweep.
    ///
    /// Calling `start` on a running scheduler only runs a sweep.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Config`] when the initial sweep cannot
    /// list configurations; the scheduler is not started in that case.
    pub async fn start(self: &Arc<Self>) -> Result<usize, SchedulerError> {
        let scheduled = self.run_reconciliation_sweep().await?;
        let mut reconciler = self.lock_reconciler();
        if reconciler.is_some() {
            return Ok(scheduled);
        }

        let cancel = CancellationToken::new();
        let task = tokio::spawn(Arc::clone(self).reconcile_periodically(cancel.clone()));
        *reconciler = Some(Reconciler { cancel, task });
        info!(
            scheduled,
            interval_secs = self.reconcile_interval.as_secs(),
            "repository scheduler started"
        );
        Ok(scheduled)
    }

    /// Stops the reconciliation sweep and every job.
    ///
    /// Runs already in flight complete on their own.
    pub fn stop(&self) {
        if let Some(reconciler) = self.lock_reconciler().take() {
            reconciler.cancel.cancel();
            reconciler.task.abort();
        }
        let mut jobs = self.lock_jobs();
        for job in jobs.values() {
            job.stop();
        }
        let stopped = jobs.len();
        jobs.clear();
        info!(stopped, "repository scheduler stopped");
    }

    /// Returns whether the periodic sweep is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.lock_reconciler().is_some()
    }

    /// Runs the pipeline once for a repository, outside any timer.
    ///
    /// The schedule is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns the pipeline error of a failed run.
    pub async fn process_repository_manually(
        &self,
        repository_id: RepositoryId,
    ) -> AutomationResult<RunReport> {
        info!(repository_id = %repository_id, "manual run requested");
        self.runner.run(repository_id, RunTrigger::Manual).await
    }

    /// Returns a snapshot of every registered job.
    #[must_use]
    pub fn jobs(&self) -> Vec<JobSnapshot> {
        let mut snapshots: Vec<JobSnapshot> = self
            .lock_jobs()
            .iter()
            .map(|(repository_id, job)| job.snapshot(*repository_id))
            .collect();
        snapshots.sort_by_key(|snapshot| snapshot.next_fire);
        snapshots
    }

    /// Returns the job of a repository, if one is registered.
    #[must_use]
    pub fn job(&self, repository_id: RepositoryId) -> Option<JobSnapshot> {
        self.lock_jobs()
            .get(&repository_id)
            .map(|job| job.snapshot(repository_id))
    }

    /// Drops a job from the registry the way a lost timer would, without
    /// the logging of an orderly unschedule.
    #[cfg(test)]
    pub(crate) fn forget_job(&self, repository_id: RepositoryId) {
        if let Some(job) = self.lock_jobs().remove(&repository_id) {
            job.stop();
        }
    }

    fn spawn_job(&self, config: &RepositoryAutomationConfig) -> ScheduledJob {
        let scheduled_time = config.scheduled_time();
        let timezone = config.timezone().clone();
        let first_fire = next_fire_instant(scheduled_time, &timezone, self.clock.utc());
        let (next_tx, next_rx) = watch::channel(first_fire);
        let cancel = CancellationToken::new();
        let timer = JobTimer {
            repository_id: config.id(),
            scheduled_time,
            timezone: timezone.clone(),
            runner: Arc::clone(&self.runner),
            clock: Arc::clone(&self.clock),
            cancel: cancel.clone(),
            next_fire: next_tx,
        };
        ScheduledJob {
            scheduled_time,
            timezone,
            cancel,
            timer: tokio::spawn(timer.run()),
            next_fire: next_rx,
        }
    }

    async fn reconcile_periodically(self: Arc<Self>, cancel: CancellationToken) {
        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(self.reconcile_interval) => {}
            }
            if let Err(err) = self.run_reconciliation_sweep().await {
                error!(error = %err, "reconciliation sweep failed");
            }
        }
        debug!("reconciliation loop stopped");
    }

    // The registry holds plain handles, so a poisoned lock is still usable.
    fn lock_jobs(&self) -> MutexGuard<'_, HashMap<RepositoryId, ScheduledJob>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_reconciler(&self) -> MutexGuard<'_, Option<Reconciler>> {
        self.reconciler.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// State moved into a job's timer task.
struct JobTimer<N, C> {
    repository_id: RepositoryId,
    scheduled_time: DailyTime,
    timezone: ScheduleTimeZone,
    runner: Arc<N>,
    clock: Arc<C>,
    cancel: CancellationToken,
    next_fire: watch::Sender<DateTime<Utc>>,
}

impl<N, C> JobTimer<N, C>
where
    N: RepositoryRunner + 'static,
    C: Clock + Send + Sync + 'static,
{
    async fn run(self) {
        loop {
            let fire_at = *self.next_fire.borrow();
            let delay = (fire_at - self.clock.utc())
                .to_std()
                .unwrap_or(Duration::ZERO);
            tokio::select! {
                () = self.cancel.cancelled() => break,
                () = tokio::time::sleep(delay) => {}
            }

            info!(
                repository_id = %self.repository_id,
                fire_at = %fire_at,
                "scheduled automation fired"
            );
            self.spawn_run();

            let after = self.clock.utc().max(fire_at);
            self.next_fire
                .send_replace(next_fire_instant(self.scheduled_time, &self.timezone, after));
        }
        debug!(repository_id = %self.repository_id, "job timer stopped");
    }

    fn spawn_run(&self) {
        let repository_id = self.repository_id;
        let runner = Arc::clone(&self.runner);
        let run = tokio::spawn(async move {
            runner.run(repository_id, RunTrigger::Scheduled).await
        });
        tokio::spawn(async move {
            match run.await {
                Ok(Ok(report)) => {
                    debug!(
                        repository_id = %repository_id,
                        report = ?report,
                        "scheduled run finished"
                    );
                }
                Ok(Err(err)) => {
                    warn!(repository_id = %repository_id, error = %err, "scheduled run failed");
                }
                Err(join_error) => {
                    error!(
                        repository_id = %repository_id,
                        error = %join_error,
                        "scheduled run panicked"
                    );
                }
            }
        });
    }
}
