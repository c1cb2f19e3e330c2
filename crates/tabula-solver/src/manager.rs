//! Background-thread solver manager.
//!
//! Each generation request (one problem repository plus one parameter
//! set) runs to completion on its own worker thread; a fixed-size permit
//! counter bounds how many run concurrently. Cancellation is cooperative:
//! the caller flips a shared flag that the phases poll at well-defined
//! points. Progress is a plain atomic the owning worker updates; readers
//! must tolerate transiently stale values and await [`JobHandle::join`]
//! for the actual result rather than watching for `progress() == 1.0`.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use tabula_model::{ProblemRepository, Result, TabulaError, Timetable};
use tracing::info;

use crate::annealing::SimulatedAnnealing;
use crate::config::SolverConfig;
use crate::construction::ConstructionHeuristic;

/// Shared cancellation flag and progress cell of one generation request.
#[derive(Debug, Default)]
pub struct SolverControl {
    cancelled: AtomicBool,
    progress: AtomicU64,
}

impl SolverControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cooperative cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Progress of the currently running phase in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        f64::from_bits(self.progress.load(Ordering::Relaxed))
    }

    pub(crate) fn set_progress(&self, progress: f64) {
        self.progress.store(progress.to_bits(), Ordering::Relaxed);
    }
}

/// Lifecycle of one generation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    Solving,
    Terminated,
}

/// How one generation request ended.
#[derive(Debug, Clone)]
pub enum SolveOutcome {
    /// Construction reached feasibility and annealing finished.
    Completed(Timetable),
    /// The construction budget ran out with classes still unassigned;
    /// the best partial schedule is returned as-is.
    Exhausted(Timetable),
    /// Cancellation was observed before a result existed.
    Cancelled,
}

/// Runs the full pipeline synchronously: construction, then annealing.
pub fn solve(
    repo: &ProblemRepository,
    config: &SolverConfig,
    control: &SolverControl,
) -> Result<SolveOutcome> {
    let started = Instant::now();
    let construction = ConstructionHeuristic::new(
        config.construction.clone(),
        config.selector.clone(),
        config.random_seed,
    );
    let Some(schedule) = construction.build(repo, control) else {
        return Ok(SolveOutcome::Cancelled);
    };
    // cancellation after the first snapshot still discards partial state
    if control.is_cancelled() {
        return Ok(SolveOutcome::Cancelled);
    }
    if !schedule.unassigned().is_empty() {
        info!(
            unassigned = schedule.unassigned().len(),
            "construction budget exhausted, returning partial schedule"
        );
        return Ok(SolveOutcome::Exhausted(
            schedule.into_timetable(started.elapsed()),
        ));
    }

    control.set_progress(0.0);
    let annealing = SimulatedAnnealing::new(config.annealing.clone(), config.random_seed);
    match annealing.optimize(schedule, control)? {
        Some(schedule) => Ok(SolveOutcome::Completed(
            schedule.into_timetable(started.elapsed()),
        )),
        None => Ok(SolveOutcome::Cancelled),
    }
}

/// Handle to a background generation request.
#[derive(Debug)]
pub struct JobHandle {
    control: Arc<SolverControl>,
    status: Arc<Mutex<SolveStatus>>,
    result: Arc<Mutex<Option<Result<SolveOutcome>>>>,
    handle: Option<JoinHandle<()>>,
}

impl JobHandle {
    /// Shared control cell; usable for cancellation from other threads.
    pub fn control(&self) -> Arc<SolverControl> {
        Arc::clone(&self.control)
    }

    pub fn cancel(&self) {
        self.control.cancel();
    }

    /// Non-blocking progress read of the currently running phase.
    pub fn progress(&self) -> f64 {
        self.control.progress()
    }

    pub fn status(&self) -> SolveStatus {
        *self.status.lock().unwrap()
    }

    /// Waits for the worker and takes its outcome.
    ///
    /// A worker that panicked surfaces as [`TabulaError::InvalidState`]
    /// rather than masquerading as a cancellation.
    pub fn join(mut self) -> Result<SolveOutcome> {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                return Err(TabulaError::InvalidState(
                    "solver worker thread panicked".into(),
                ));
            }
        }
        self.result
            .lock()
            .unwrap()
            .take()
            .unwrap_or(Ok(SolveOutcome::Cancelled))
    }
}

/// Hosts independent timetable-generation requests on a bounded pool of
/// worker threads. Requests share nothing; each owns its schedule graph.
#[derive(Debug)]
pub struct SolverManager {
    permits: Arc<(Mutex<usize>, Condvar)>,
}

impl SolverManager {
    /// Creates a manager running at most `workers` requests at once.
    pub fn new(workers: usize) -> Self {
        Self {
            permits: Arc::new((Mutex::new(workers.max(1)), Condvar::new())),
        }
    }

    /// Starts a generation request on a background thread, blocking while
    /// every worker slot is busy.
    pub fn solve_async(&self, repo: Arc<ProblemRepository>, config: SolverConfig) -> JobHandle {
        let (slots, available) = &*self.permits;
        let mut free = slots.lock().unwrap();
        while *free == 0 {
            free = available.wait(free).unwrap();
        }
        *free -= 1;
        drop(free);

        let control = Arc::new(SolverControl::new());
        let status = Arc::new(Mutex::new(SolveStatus::Solving));
        let result: Arc<Mutex<Option<Result<SolveOutcome>>>> = Arc::new(Mutex::new(None));

        let worker_control = Arc::clone(&control);
        let worker_status = Arc::clone(&status);
        let worker_result = Arc::clone(&result);
        let permits = Arc::clone(&self.permits);
        let handle = thread::spawn(move || {
            let outcome = solve(&repo, &config, &worker_control);
            *worker_result.lock().unwrap() = Some(outcome);
            *worker_status.lock().unwrap() = SolveStatus::Terminated;
            let (slots, available) = &*permits;
            *slots.lock().unwrap() += 1;
            available.notify_one();
        });

        JobHandle {
            control,
            status,
            result,
            handle: Some(handle),
        }
    }
}

impl Default for SolverManager {
    fn default() -> Self {
        Self::new(2)
    }
}
