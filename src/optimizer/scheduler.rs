//! # Job Scheduler
//!
//! Fans out one task per input file, bounded by a counting limiter, and
//! stops the whole batch as soon as any job fails or the user interrupts.
//!
//! Every task races "acquire a slot" against the shared cancellation
//! signal, so nothing waits past a cancellation request. Jobs already
//! running observe the same signal inside the replacer.

use crate::{
    error::RecompressError,
    optimizer::replacer::AtomicReplacer,
    progress::{FileSavings, ProgressManager, RunSummary},
};
use futures::future::join_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// One source file to recompress
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    path: PathBuf,
}

impl Job {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Terminal state of a job
#[derive(Debug)]
pub enum JobOutcome {
    Succeeded(FileSavings),
    Failed(RecompressError),
    /// Cancellation won the race before a slot was held
    CancelledBeforeStart,
    /// Cancellation aborted the recompression
    CancelledDuringRun,
}

/// Shared run state: the cancellation signal and the concurrency limiter
#[derive(Debug, Clone)]
pub struct RunState {
    cancel: CancellationToken,
    limiter: Arc<Semaphore>,
}

impl RunState {
    pub fn new(concurrency_limit: usize) -> Self {
        Self {
            cancel: CancellationToken::new(),
            limiter: Arc::new(Semaphore::new(
                concurrency_limit.clamp(1, Semaphore::MAX_PERMITS),
            )),
        }
    }

    /// Token to hand to anything that should be able to stop the run
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Idempotent; once cancelled the run stays cancelled
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn available_slots(&self) -> usize {
        self.limiter.available_permits()
    }
}

/// Runs a batch of jobs over the shared run state
pub struct JobScheduler {
    replacer: Arc<AtomicReplacer>,
    state: RunState,
}

impl JobScheduler {
    pub fn new(replacer: AtomicReplacer, state: RunState) -> Self {
        Self {
            replacer: Arc::new(replacer),
            state,
        }
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// Launch every job and wait for all of them to settle
    pub async fn run(&self, jobs: Vec<Job>, progress: &ProgressManager) -> RunSummary {
        debug!(
            "Scheduling {} jobs over {} slots",
            jobs.len(),
            self.state.available_slots()
        );

        let tasks: Vec<_> = jobs
            .into_iter()
            .map(|job| {
                let replacer = Arc::clone(&self.replacer);
                let state = self.state.clone();
                let progress = progress.clone();
                tokio::spawn(async move {
                    let outcome = Self::run_job(&replacer, &state, &job).await;
                    progress.update(&Self::progress_message(&job, &outcome));
                    (job, outcome)
                })
            })
            .collect();

        let mut summary = RunSummary::new();
        for joined in join_all(tasks).await {
            match joined {
                Ok((_, JobOutcome::Succeeded(savings))) => summary.add_succeeded(&savings),
                Ok((_, JobOutcome::Failed(_))) => summary.add_failed(),
                Ok((_, JobOutcome::CancelledBeforeStart | JobOutcome::CancelledDuringRun)) => {
                    summary.add_cancelled()
                }
                Err(e) => {
                    error!("Recompression task panicked: {}", e);
                    self.state.cancel();
                    summary.add_failed();
                }
            }
        }

        info!("{}", summary.format_summary());
        summary
    }

    /// Pending -> Acquiring -> Running -> terminal state
    async fn run_job(replacer: &AtomicReplacer, state: &RunState, job: &Job) -> JobOutcome {
        let permit = tokio::select! {
            biased;
            _ = state.cancel.cancelled() => return JobOutcome::CancelledBeforeStart,
            permit = Arc::clone(&state.limiter).acquire_owned() => match permit {
                Ok(permit) => permit,
                // The limiter is never closed while jobs are pending
                Err(_) => return JobOutcome::CancelledBeforeStart,
            },
        };

        // Cancellation may have fired while this task was queued for the slot
        if state.is_cancelled() {
            drop(permit);
            return JobOutcome::CancelledBeforeStart;
        }

        let outcome = match replacer.replace(&state.cancel, job.path()).await {
            Ok(savings) => JobOutcome::Succeeded(savings),
            Err(e) if e.is_cancelled() => {
                debug!("Aborted {}: {}", job.path().display(), e);
                JobOutcome::CancelledDuringRun
            }
            Err(e) => {
                error!("E: [{}] {}", job.path().display(), e);
                state.cancel();
                JobOutcome::Failed(e)
            }
        };

        // The slot is released only after cancellation has been raised
        drop(permit);
        outcome
    }

    fn progress_message(job: &Job, outcome: &JobOutcome) -> String {
        let name = job
            .path()
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .into_owned();
        match outcome {
            JobOutcome::Succeeded(savings) => format!("[OK] {}: {:.1}% saved", name, savings.percent()),
            JobOutcome::Failed(_) => format!("[ERROR] {}", name),
            JobOutcome::CancelledBeforeStart | JobOutcome::CancelledDuringRun => {
                format!("[CANCELLED] {}", name)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RecompressOptions;
    use crate::recompress::stub::{StubBehavior, StubRecompressor};
    use std::time::Duration;
    use tempfile::TempDir;

    fn write_file(dir: &Path, name: &str, len: usize) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, vec![7u8; len]).unwrap();
        path
    }

    fn scheduler(stub: &Arc<StubRecompressor>, limit: usize) -> JobScheduler {
        let replacer = AtomicReplacer::new(stub.clone(), RecompressOptions::default());
        JobScheduler::new(replacer, RunState::new(limit))
    }

    fn jobs_for(dir: &Path, count: usize, len: usize) -> Vec<Job> {
        (0..count)
            .map(|i| Job::new(write_file(dir, &format!("img{:02}.jpg", i), len)))
            .collect()
    }

    fn dir_len(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_bounded_concurrency() {
        let temp_dir = TempDir::new().unwrap();
        let stub = Arc::new(
            StubRecompressor::new(StubBehavior::Shrink(10)).with_delay(Duration::from_millis(40)),
        );
        let scheduler = scheduler(&stub, 2);
        let jobs = jobs_for(temp_dir.path(), 8, 100);

        let summary = scheduler.run(jobs, &ProgressManager::new(8, false)).await;

        assert_eq!(summary.succeeded, 8);
        assert_eq!(stub.calls(), 8);
        assert!(stub.max_active() <= 2, "peak concurrency {}", stub.max_active());
        assert_eq!(scheduler.state().available_slots(), 2);
        assert!(!scheduler.state().is_cancelled());
        assert_eq!(dir_len(temp_dir.path()), 8);
    }

    #[test]
    fn test_run_state_clamps_slot_count() {
        assert_eq!(RunState::new(0).available_slots(), 1);
        assert_eq!(RunState::new(usize::MAX).available_slots(), Semaphore::MAX_PERMITS);
    }

    #[tokio::test]
    async fn test_failure_cancels_pending_jobs() {
        let temp_dir = TempDir::new().unwrap();
        let stub = Arc::new(StubRecompressor::new(StubBehavior::Fail("corrupt".to_string())));
        let scheduler = scheduler(&stub, 1);
        let jobs = jobs_for(temp_dir.path(), 5, 64);
        let originals: Vec<Vec<u8>> = jobs.iter().map(|j| std::fs::read(j.path()).unwrap()).collect();

        let summary = scheduler.run(jobs.clone(), &ProgressManager::new(5, false)).await;

        assert_eq!(stub.calls(), 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.cancelled, 4);
        assert!(scheduler.state().is_cancelled());
        for (job, original) in jobs.iter().zip(originals) {
            assert_eq!(std::fs::read(job.path()).unwrap(), original);
        }
        assert_eq!(dir_len(temp_dir.path()), 5);
    }

    #[tokio::test]
    async fn test_pre_cancelled_run_never_invokes_service() {
        let temp_dir = TempDir::new().unwrap();
        let stub = Arc::new(StubRecompressor::new(StubBehavior::Shrink(1)));
        let scheduler = scheduler(&stub, 4);
        scheduler.state().cancel();

        let summary = scheduler
            .run(jobs_for(temp_dir.path(), 6, 32), &ProgressManager::new(6, false))
            .await;

        assert_eq!(stub.calls(), 0);
        assert_eq!(summary.cancelled, 6);
        assert_eq!(summary.succeeded, 0);
    }

    #[tokio::test]
    async fn test_interrupt_stops_pending_jobs() {
        let temp_dir = TempDir::new().unwrap();
        let stub = Arc::new(
            StubRecompressor::new(StubBehavior::Shrink(1)).with_delay(Duration::from_millis(500)),
        );
        let scheduler = scheduler(&stub, 1);
        let token = scheduler.state().cancellation_token();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            token.cancel();
        });

        let summary = scheduler
            .run(jobs_for(temp_dir.path(), 4, 32), &ProgressManager::new(4, false))
            .await;

        assert_eq!(stub.calls(), 1);
        assert_eq!(summary.succeeded, 0);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.cancelled, 4);
        assert_eq!(dir_len(temp_dir.path()), 4);
    }

    #[tokio::test]
    async fn test_directory_scenario_processes_two_jpegs() {
        let temp_dir = TempDir::new().unwrap();
        write_file(temp_dir.path(), "a.jpg", 100_000);
        write_file(temp_dir.path(), "b.JPG", 50_000);
        write_file(temp_dir.path(), "c.png", 10_000);

        let files = crate::file_manager::FileManager::find_jpegs(temp_dir.path()).unwrap();
        let stub = Arc::new(StubRecompressor::new(StubBehavior::Shrink(1000)));
        let scheduler = scheduler(&stub, 2);
        let jobs = files.into_iter().map(Job::new).collect();

        let summary = scheduler.run(jobs, &ProgressManager::new(2, false)).await;

        assert_eq!(stub.calls(), 2);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.total_bytes_saved, 2000);
        assert_eq!(std::fs::metadata(temp_dir.path().join("a.jpg")).unwrap().len(), 99_000);
        assert_eq!(std::fs::metadata(temp_dir.path().join("b.JPG")).unwrap().len(), 49_000);
        assert_eq!(std::fs::metadata(temp_dir.path().join("c.png")).unwrap().len(), 10_000);
    }

    #[tokio::test]
    async fn test_failed_file_in_mixed_batch_is_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let good = write_file(temp_dir.path(), "good.jpg", 300);
        let bad = write_file(temp_dir.path(), "bad.jpg", 300);
        let stub = Arc::new(StubRecompressor::new(StubBehavior::FailFor("bad.jpg".to_string())));
        let scheduler = scheduler(&stub, 1);

        let summary = scheduler
            .run(
                vec![Job::new(good.clone()), Job::new(bad.clone())],
                &ProgressManager::new(2, false),
            )
            .await;

        assert_eq!(stub.calls(), 2);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(std::fs::metadata(&good).unwrap().len(), 299);
        assert_eq!(std::fs::metadata(&bad).unwrap().len(), 300);
        assert_eq!(dir_len(temp_dir.path()), 2);
    }
}
